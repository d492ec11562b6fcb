use crate::error::{PipelineError, Result};
use crate::structs::{DocumentRecord, FlatDefinitions, SectionedDefinitions};
use crate::transform::DOCUMENT_COLUMNS;
use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{ArrayRef, BooleanArray, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use csv::Writer;
use log::{debug, warn};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{fs, fs::File, path::Path, sync::Arc};

/// Reads a whole text file into memory.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// failing the run.
///
/// # Errors
/// Returns `PipelineError::Read` if the file cannot be opened or read.
pub fn read_text(input_path: &Path) -> Result<String> {
    debug!("Reading {}", input_path.display());
    let bytes = fs::read(input_path).map_err(|source| PipelineError::Read {
        path: input_path.to_path_buf(),
        source,
    })?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!("{} is not valid UTF-8, replacing bad bytes", input_path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Reads and parses a sectioned field-definitions file.
///
/// # Errors
/// Returns `PipelineError::Read` if the file cannot be read and
/// `PipelineError::Definitions` if it does not have the expected shape.
pub fn read_sections(input_path: &Path) -> Result<SectionedDefinitions> {
    let content = read_text(input_path)?;
    serde_json::from_str(&content).map_err(|source| PipelineError::Definitions {
        path: input_path.to_path_buf(),
        source,
    })
}

/// Writes any serializable value as two-space indented JSON.
///
/// The document is rendered in memory first, so nothing is written when
/// serialization fails.
///
/// # Errors
/// Returns error if serialization fails or the file cannot be written.
pub fn write_json<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    fs::write(output_path, rendered).map_err(|source| PipelineError::Write {
        path: output_path.to_path_buf(),
        source,
    })
}

/// Writes one CSV row per document. List columns are joined with `", "`.
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_documents_csv(documents: &[DocumentRecord], output_path: &Path) -> Result<()> {
    let file = create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(DOCUMENT_COLUMNS)?;

    for doc in documents {
        writer.write_record(&[
            doc.filename.clone(),
            doc.title.clone(),
            doc.date.clone(),
            doc.external_link.clone(),
            doc.folder.clone(),
            doc.file_type.clone(),
            doc.page_count.to_string(),
            doc.module.clone(),
            doc.document_type.clone(),
            doc.people_mentioned.join(", "),
            doc.tags.join(", "),
            flag_cell(doc.has_exemption).to_string(),
            flag_cell(doc.has_exclusion).to_string(),
            flag_cell(doc.password_protected).to_string(),
            flag_cell(doc.processed).to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the flattened field table, one row per field, as CSV.
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_fields_csv(flat: &FlatDefinitions, output_path: &Path) -> Result<()> {
    let file = create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["field", "definition", "comment", "section"])?;
    for (name, field) in flat.fields.iter() {
        writer.write_record([
            name,
            field.definition.as_str(),
            field.comment.as_deref().unwrap_or_default(),
            field.section.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the documents to a Parquet file.
///
/// `peopleMentioned` and `tags` are stored as list-of-string columns.
///
/// # Errors
/// Returns error if file cannot be created, the batch does not match its
/// schema, or Arrow operations fail.
pub fn write_documents_parquet(documents: &[DocumentRecord], output_path: &Path) -> Result<()> {
    let string_list = DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)));
    let schema = Arc::new(Schema::new(vec![
        Field::new("filename", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("date", DataType::Utf8, false),
        Field::new("externalLink", DataType::Utf8, false),
        Field::new("folder", DataType::Utf8, false),
        Field::new("fileType", DataType::Utf8, false),
        Field::new("pageCount", DataType::Int64, false),
        Field::new("module", DataType::Utf8, false),
        Field::new("documentType", DataType::Utf8, false),
        Field::new("peopleMentioned", string_list.clone(), false),
        Field::new("tags", string_list, false),
        Field::new("hasExemption", DataType::Boolean, false),
        Field::new("hasExclusion", DataType::Boolean, false),
        Field::new("passwordProtected", DataType::Boolean, false),
        Field::new("processed", DataType::Boolean, false),
    ]));

    let page_counts: Int64Array = documents.iter().map(|d| d.page_count).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text_column(documents, |d| d.filename.as_str()),
            text_column(documents, |d| d.title.as_str()),
            text_column(documents, |d| d.date.as_str()),
            text_column(documents, |d| d.external_link.as_str()),
            text_column(documents, |d| d.folder.as_str()),
            text_column(documents, |d| d.file_type.as_str()),
            Arc::new(page_counts),
            text_column(documents, |d| d.module.as_str()),
            text_column(documents, |d| d.document_type.as_str()),
            list_column(documents, |d| d.people_mentioned.as_slice()),
            list_column(documents, |d| d.tags.as_slice()),
            flag_column(documents, |d| d.has_exemption),
            flag_column(documents, |d| d.has_exclusion),
            flag_column(documents, |d| d.password_protected),
            flag_column(documents, |d| d.processed),
        ],
    )?;

    let file = create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn text_column(documents: &[DocumentRecord], f: impl Fn(&DocumentRecord) -> &str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(documents.iter().map(f)))
}

fn flag_column(documents: &[DocumentRecord], f: impl Fn(&DocumentRecord) -> bool) -> ArrayRef {
    Arc::new(BooleanArray::from(documents.iter().map(f).collect::<Vec<_>>()))
}

fn list_column(documents: &[DocumentRecord], f: impl Fn(&DocumentRecord) -> &[String]) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for doc in documents {
        for value in f(doc) {
            builder.values().append_value(value);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}

fn create(output_path: &Path) -> Result<File> {
    File::create(output_path).map_err(|source| PipelineError::Write {
        path: output_path.to_path_buf(),
        source,
    })
}

fn flag_cell(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
