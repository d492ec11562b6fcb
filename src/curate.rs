//! Catalog clean-ups applied to parsed documents before statistics are
//! computed, plus the data-file breakdown used to review them.

use crate::structs::DocumentRecord;
use log::debug;
use std::collections::BTreeMap;

/// Document type given to every data file by [`reclassify_datasets`].
pub const DATASET_TYPE: &str = "Dataset";
/// Document type data files are expected to carry already.
pub const DATA_TYPE: &str = "Data";
/// Examples listed per unexpected document type in the breakdown.
pub const EXAMPLES_PER_TYPE: usize = 5;

/// Which clean-ups to run on a freshly parsed catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurationOptions {
    pub proper_case_types: bool,
    pub datasets: bool,
}

/// Counts of data files moved to [`DATASET_TYPE`], per file type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetUpdate {
    pub xpt: usize,
    pub jmp: usize,
}

impl DatasetUpdate {
    pub fn total(&self) -> usize {
        self.xpt + self.jmp
    }
}

/// Capitalizes the first letter of each word and lowercases the rest.
///
/// Runs of whitespace collapse to a single space.
pub fn proper_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Proper-cases every non-empty `documentType`, returning how many changed.
pub fn proper_case_document_types(documents: &mut [DocumentRecord]) -> usize {
    let mut changed = 0;
    for doc in documents.iter_mut().filter(|d| !d.document_type.is_empty()) {
        let cased = proper_case(&doc.document_type);
        if cased != doc.document_type {
            doc.document_type = cased;
            changed += 1;
        }
    }
    changed
}

/// Sets the document type of every XPT and JMP file to [`DATASET_TYPE`].
///
/// File types are matched exactly, so `"xpt"` is left alone.
pub fn reclassify_datasets(documents: &mut [DocumentRecord]) -> DatasetUpdate {
    let mut update = DatasetUpdate::default();

    for doc in documents.iter_mut() {
        let counter = match doc.file_type.as_str() {
            "XPT" => &mut update.xpt,
            "JMP" => &mut update.jmp,
            _ => continue,
        };
        debug!(
            "Updated: {} from '{}' to '{}'",
            doc.filename, doc.document_type, DATASET_TYPE
        );
        doc.document_type = DATASET_TYPE.to_string();
        *counter += 1;
    }

    update
}

/// Runs the clean-ups selected in `options`, proper-casing first.
pub fn curate(documents: &mut [DocumentRecord], options: &CurationOptions) -> Option<DatasetUpdate> {
    if options.proper_case_types {
        let changed = proper_case_document_types(documents);
        debug!("Proper-cased {} document types", changed);
    }
    options.datasets.then(|| reclassify_datasets(documents))
}

/// A data file as listed in the breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileEntry {
    pub filename: String,
    pub document_type: String,
    pub module: String,
}

/// XPT files grouped by document type (sorted by type), and all JMP files
/// in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFileReport {
    pub xpt_by_type: BTreeMap<String, Vec<DataFileEntry>>,
    pub jmp: Vec<DataFileEntry>,
}

impl DataFileReport {
    pub fn xpt_total(&self) -> usize {
        self.xpt_by_type.values().map(Vec::len).sum()
    }
}

pub fn analyze_data_files(documents: &[DocumentRecord]) -> DataFileReport {
    let mut report = DataFileReport::default();

    for doc in documents {
        let entry = DataFileEntry {
            filename: doc.filename.clone(),
            document_type: doc.document_type.clone(),
            module: doc.module.clone(),
        };
        match doc.file_type.as_str() {
            "XPT" => report
                .xpt_by_type
                .entry(doc.document_type.clone())
                .or_default()
                .push(entry),
            "JMP" => report.jmp.push(entry),
            _ => {}
        }
    }

    report
}
