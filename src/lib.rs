pub mod curate;
pub mod error;
pub mod load;
pub mod report;
pub mod structs;
pub mod tokenize;
pub mod transform;

// Re-export public API
pub use curate::{
    CurationOptions, DataFileReport, DatasetUpdate, analyze_data_files, proper_case_document_types,
    reclassify_datasets,
};
pub use error::{PipelineError, Result};
pub use load::{
    read_sections, read_text, write_documents_csv, write_documents_parquet, write_fields_csv,
    write_json,
};
pub use report::{
    data_files_summary, dataset_update_summary, definitions_summary, documents_summary,
    module_breakdown,
};
pub use structs::{
    DocumentCatalog, DocumentRecord, FlatDefinitions, FlatField, OrderedMap, PipelineConfig,
    Section, SectionedDefinitions, SimpleLogger, Statistics,
};
pub use tokenize::tokenize_line;
pub use transform::{
    compute_statistics, convert_documents, convert_documents_with, flatten_definitions,
    map_record, parse_documents, regroup_sections,
};
