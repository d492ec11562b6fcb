use crate::curate::{DATA_TYPE, DATASET_TYPE, DataFileReport, DatasetUpdate, EXAMPLES_PER_TYPE};
use crate::structs::{DocumentCatalog, FlatDefinitions, Statistics};

/// Module counts from highest to lowest; equal counts keep encounter order.
pub fn module_breakdown(stats: &Statistics) -> Vec<(String, usize)> {
    let mut modules: Vec<(String, usize)> = stats
        .by_module
        .iter()
        .map(|(module, &count)| (module.to_string(), count))
        .collect();
    modules.sort_by(|a, b| b.1.cmp(&a.1));
    modules
}

/// Console summary of a finished document conversion.
pub fn documents_summary(catalog: &DocumentCatalog, output_name: &str) -> Vec<String> {
    let stats = &catalog.metadata.statistics;
    let mut lines = vec![
        format!("Successfully created {}", output_name),
        format!("Total documents: {}", catalog.metadata.total_documents),
        String::new(),
        "Statistics:".to_string(),
        format!("- Documents with exemptions: {}", stats.with_exemptions),
        format!("- Documents with exclusions: {}", stats.with_exclusions),
        format!("- Password protected: {}", stats.password_protected),
        format!("- Processed: {}", stats.processed),
        String::new(),
        "By Module:".to_string(),
    ];
    lines.extend(
        module_breakdown(stats)
            .into_iter()
            .map(|(module, count)| format!("  {}: {}", module, count)),
    );
    lines
}

/// Console summary of a finished definitions flattening.
pub fn definitions_summary(flat: &FlatDefinitions, output_name: &str) -> Vec<String> {
    vec![
        format!("Successfully created {}", output_name),
        format!("Total fields: {}", flat.metadata.total_fields),
        format!("Total sections: {}", flat.metadata.sections.len()),
    ]
}

/// Console lines for a dataset reclassification.
pub fn dataset_update_summary(update: &DatasetUpdate) -> Vec<String> {
    vec![
        format!(
            "Updated {} files to documentType: '{}'",
            update.total(),
            DATASET_TYPE
        ),
        format!("  - XPT files: {}", update.xpt),
        format!("  - JMP files: {}", update.jmp),
    ]
}

/// Console breakdown of XPT and JMP files by document type.
///
/// XPT types other than `Data` list their first few files as examples.
pub fn data_files_summary(report: &DataFileReport) -> Vec<String> {
    let mut lines = vec![
        format!("Total XPT files: {}", report.xpt_total()),
        String::new(),
        "XPT files by documentType:".to_string(),
    ];
    for (doc_type, files) in &report.xpt_by_type {
        lines.push(format!("  {}: {} files", doc_type, files.len()));
    }

    lines.push(String::new());
    lines.push(format!("XPT files NOT tagged as {}:", DATA_TYPE));
    for (doc_type, files) in report.xpt_by_type.iter().filter(|(t, _)| *t != DATA_TYPE) {
        lines.push(String::new());
        lines.push(format!("{} ({} files):", doc_type, files.len()));
        for file in files.iter().take(EXAMPLES_PER_TYPE) {
            lines.push(format!("  - {} (Module: {})", file.filename, file.module));
        }
        if files.len() > EXAMPLES_PER_TYPE {
            lines.push(format!("  ... and {} more", files.len() - EXAMPLES_PER_TYPE));
        }
    }

    lines.push(String::new());
    lines.push(format!("Total JMP files: {}", report.jmp.len()));
    lines.push("JMP files:".to_string());
    for file in &report.jmp {
        lines.push(format!(
            "  - {} -> documentType: {}",
            file.filename, file.document_type
        ));
    }
    lines
}
