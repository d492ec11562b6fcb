use crate::curate::{CurationOptions, DatasetUpdate, curate};
use crate::structs::{
    CatalogMetadata, DefinitionsMetadata, DocumentCatalog, DocumentRecord, FieldInput,
    FlatDefinitions, FlatField, OrderedMap, Section, SectionedDefinitions, Statistics,
};
use crate::tokenize::tokenize_line;
use chrono::NaiveDate;
use log::debug;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const BOM: char = '\u{feff}';
pub const DEFINITIONS_VERSION: &str = "1.0";
/// Only this exact spelling of a flag cell counts as set.
pub const TRUE_TOKEN: &str = "True";

/// Header names of the tagged-documents CSV, in column order.
pub const DOCUMENT_COLUMNS: [&str; 15] = [
    "filename",
    "title",
    "date",
    "link",
    "folder",
    "fileType",
    "pageCount",
    "module",
    "documentType",
    "peopleMentioned",
    "tags",
    "hasExemption",
    "hasExclusion",
    "passwordProtected",
    "processed",
];

/// Header, records and the number of rows dropped for a column-count mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocuments {
    pub headers: Vec<String>,
    pub records: Vec<DocumentRecord>,
    pub skipped_rows: usize,
}

/// Converts the text of a tagged-documents CSV into the document catalog.
///
/// # Arguments
///
/// * `content` - Whole CSV file contents, header line first
/// * `source_file` - Name recorded as `metadata.sourceFile`
/// * `today` - Date recorded as `metadata.lastUpdated`
///
/// Rows whose field count differs from the header are left out without
/// affecting anything but `totalDocuments`.
pub fn convert_documents(content: &str, source_file: &str, today: NaiveDate) -> DocumentCatalog {
    convert_documents_with(content, source_file, today, &CurationOptions::default()).0
}

/// Same as [`convert_documents`], running the selected clean-ups on the
/// parsed records before statistics are computed.
///
/// Returns the dataset reclassification counts when that step ran.
pub fn convert_documents_with(
    content: &str,
    source_file: &str,
    today: NaiveDate,
    options: &CurationOptions,
) -> (DocumentCatalog, Option<DatasetUpdate>) {
    let mut parsed = parse_documents(content);
    if parsed.skipped_rows > 0 {
        debug!(
            "Skipped {} rows with a column count other than {}",
            parsed.skipped_rows,
            parsed.headers.len()
        );
    }

    // Clean up categories here; the aggregator counts keys verbatim
    let update = curate(&mut parsed.records, options);

    let statistics = compute_statistics(&parsed.records);
    let catalog = DocumentCatalog {
        metadata: CatalogMetadata {
            total_documents: parsed.records.len(),
            last_updated: today.format(DATE_FORMAT).to_string(),
            source_file: source_file.to_string(),
            columns: parsed.headers,
            statistics,
        },
        documents: parsed.records,
    };
    (catalog, update)
}

/// Tokenizes every line and maps the well-formed ones to records.
pub fn parse_documents(content: &str) -> ParsedDocuments {
    // Drop a leading byte order mark
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let mut lines = content.trim().split('\n');
    let headers = tokenize_line(lines.next().unwrap_or_default());
    debug!("Header has {} columns", headers.len());

    // Rows that don't line up with the header are dropped
    let mut records = Vec::new();
    let mut skipped_rows = 0;
    for line in lines {
        let values = tokenize_line(line);
        match map_record(&headers, &values) {
            Some(record) => records.push(record),
            None => skipped_rows += 1,
        }
    }

    ParsedDocuments {
        headers,
        records,
        skipped_rows,
    }
}

/// Builds a record from one tokenized row.
///
/// Returns `None` unless the row has exactly as many values as the header
/// has columns. Values are read by position, not by header name.
pub fn map_record(headers: &[String], values: &[String]) -> Option<DocumentRecord> {
    if values.len() != headers.len() {
        return None;
    }
    let cell = |i: usize| values.get(i).map(String::as_str).unwrap_or_default();

    Some(DocumentRecord {
        filename: cell(0).to_string(),
        title: cell(1).to_string(),
        date: cell(2).to_string(),
        external_link: cell(3).to_string(),
        folder: cell(4).to_string(),
        file_type: cell(5).to_string(),
        page_count: parse_page_count(cell(6)),
        module: cell(7).to_string(),
        document_type: cell(8).to_string(),
        people_mentioned: parse_list(cell(9)),
        tags: parse_list(cell(10)),
        has_exemption: parse_flag(cell(11)),
        has_exclusion: parse_flag(cell(12)),
        password_protected: parse_flag(cell(13)),
        processed: parse_flag(cell(14)),
    })
}

/// Reads the leading integer of a cell, or 0 when there is none.
///
/// An optional sign followed by digits is taken; anything after the digits
/// is ignored, so `"12 pages"` is 12 and `"3.7"` is 3. A `0x` prefix reads
/// the digits as hexadecimal (`"0x1A"` is 26).
pub fn parse_page_count(cell: &str) -> i64 {
    let s = cell.trim_start();
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());

    match i64::from_str_radix(&digits[..end], radix) {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => 0,
    }
}

pub fn parse_flag(cell: &str) -> bool {
    cell == TRUE_TOKEN
}

/// Splits a comma-joined cell, trimming parts and dropping empty ones.
pub fn parse_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Counts records per module, file type and document type, and per set flag.
///
/// Category values are used verbatim: `"Mod"` and `"mod "` are different
/// categories.
pub fn compute_statistics(records: &[DocumentRecord]) -> Statistics {
    let mut stats = Statistics::default();

    for record in records {
        stats.by_module.increment(&record.module);
        stats.by_file_type.increment(&record.file_type);
        stats.by_document_type.increment(&record.document_type);
    }

    // Flag counts
    stats.with_exemptions = records.iter().filter(|r| r.has_exemption).count();
    stats.with_exclusions = records.iter().filter(|r| r.has_exclusion).count();
    stats.password_protected = records.iter().filter(|r| r.password_protected).count();
    stats.processed = records.iter().filter(|r| r.processed).count();

    stats
}

/// Flattens sectioned definitions into one field map with metadata.
///
/// # Arguments
///
/// * `input` - Sections in file order
/// * `today` - Date recorded as `metadata.lastUpdated`
pub fn flatten_definitions(input: &SectionedDefinitions, today: NaiveDate) -> FlatDefinitions {
    let fields = flatten_sections(&input.sections);

    // Distinct section names, first-seen order
    let mut sections: Vec<String> = Vec::new();
    for section in &input.sections {
        if !sections.contains(&section.name) {
            sections.push(section.name.clone());
        }
    }
    debug!(
        "Flattened {} sections into {} fields",
        input.sections.len(),
        fields.len()
    );

    FlatDefinitions {
        metadata: DefinitionsMetadata {
            total_fields: fields.len(),
            last_updated: today.format(DATE_FORMAT).to_string(),
            version: DEFINITIONS_VERSION.to_string(),
            sections,
        },
        fields,
    }
}

/// Merges every section's fields into one map keyed by field name.
///
/// Sections are visited in order; when a name repeats, the later section's
/// definition replaces the earlier one.
pub fn flatten_sections(sections: &[Section]) -> OrderedMap<FlatField> {
    let mut flat = OrderedMap::new();

    for section in sections {
        for (name, field) in section.fields.iter() {
            if flat.insert(name.to_string(), flat_field(field, &section.name)).is_some() {
                debug!("Field {} redefined by section {}", name, section.name);
            }
        }
    }

    flat
}

fn flat_field(field: &FieldInput, section: &str) -> FlatField {
    FlatField {
        definition: field.definition.clone(),
        comment: field.comment.clone().filter(|c| !c.is_empty()),
        section: section.to_string(),
        mandatory: None,
        code_list: None,
        data_type: None,
        domain: None,
        origin: None,
    }
}

/// Rebuilds sectioned input from a flattened file.
///
/// Fields are grouped by their `section` attribute, sections in the order
/// they are first seen. Placeholder attributes are not carried back.
pub fn regroup_sections(flat: &FlatDefinitions) -> SectionedDefinitions {
    let mut grouped: OrderedMap<OrderedMap<FieldInput>> = OrderedMap::new();

    for (name, field) in flat.fields.iter() {
        let input = FieldInput {
            definition: field.definition.clone(),
            comment: field.comment.clone(),
        };
        match grouped.get_mut(&field.section) {
            Some(fields) => {
                fields.insert(name.to_string(), input);
            }
            None => {
                let mut fields = OrderedMap::new();
                fields.insert(name.to_string(), input);
                grouped.insert(field.section.clone(), fields);
            }
        }
    }

    SectionedDefinitions {
        sections: grouped
            .iter()
            .map(|(name, fields)| Section {
                name: name.to_string(),
                fields: fields.clone(),
            })
            .collect(),
    }
}
