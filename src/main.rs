use chrono::Utc;
use clap::{Parser, Subcommand};
use lib::{
    CurationOptions, PipelineConfig, PipelineError, SimpleLogger, analyze_data_files,
    convert_documents_with, data_files_summary, dataset_update_summary, definitions_summary,
    documents_summary, flatten_definitions, read_sections, read_text, write_documents_csv,
    write_documents_parquet, write_fields_csv, write_json,
};
use log::debug;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level for output
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten sectioned field definitions into a single field map
    Flatten {
        /// Sectioned definitions JSON (default: field-definitions.json)
        #[arg(short, long)]
        input_path: Option<PathBuf>,

        /// Flattened JSON output (default: field-definitions-flat.json)
        #[arg(short, long)]
        output_path: Option<PathBuf>,

        /// Also write the field table as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Convert a tagged-documents CSV into a JSON catalog with statistics
    Documents {
        /// Tagged documents CSV (default: eua_tagged_files.csv)
        #[arg(short, long)]
        input_path: Option<PathBuf>,

        /// Catalog JSON output (default: eua-tagged-files.json)
        #[arg(short, long)]
        output_path: Option<PathBuf>,

        /// Also write the parsed documents as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write the parsed documents as Parquet to this path
        #[arg(long)]
        parquet: Option<PathBuf>,

        /// Proper-case every documentType (e.g. "clinical review" -> "Clinical Review")
        #[arg(long, default_value_t = false)]
        proper_case_types: bool,

        /// Set the documentType of XPT and JMP files to "Dataset"
        #[arg(long, default_value_t = false)]
        datasets: bool,

        /// Print a breakdown of XPT and JMP files by documentType
        #[arg(long, default_value_t = false)]
        analyze_data_files: bool,
    },
}

/// Optional extras of a document conversion run
struct DocumentsRun {
    curation: CurationOptions,
    csv: Option<PathBuf>,
    parquet: Option<PathBuf>,
    analyze_data_files: bool,
}

fn main() -> Result<(), PipelineError> {
    // Initialize timer and logger
    let total_start = Instant::now();
    if let Err(e) = log::set_logger(&LOGGER) {
        eprintln!("Logger unavailable: {}", e);
    }

    // Acquire CLI args
    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    match args.command {
        Command::Flatten {
            input_path,
            output_path,
            csv,
        } => {
            let config = with_overrides(PipelineConfig::flatten_defaults(), input_path, output_path);
            run_flatten(&config, csv)?;
        }
        Command::Documents {
            input_path,
            output_path,
            csv,
            parquet,
            proper_case_types,
            datasets,
            analyze_data_files,
        } => {
            let config =
                with_overrides(PipelineConfig::documents_defaults(), input_path, output_path);
            let run = DocumentsRun {
                curation: CurationOptions {
                    proper_case_types,
                    datasets,
                },
                csv,
                parquet,
                analyze_data_files,
            };
            run_documents(&config, run)?;
        }
    }

    debug!("Total runtime: {:.2?}", total_start.elapsed());
    Ok(())
}

fn with_overrides(
    defaults: PipelineConfig,
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> PipelineConfig {
    PipelineConfig {
        input_path: input_path.unwrap_or(defaults.input_path),
        output_path: output_path.unwrap_or(defaults.output_path),
    }
}

fn run_flatten(config: &PipelineConfig, csv: Option<PathBuf>) -> Result<(), PipelineError> {
    debug!(
        "Flattening {} -> {}",
        config.input_path.display(),
        config.output_path.display()
    );

    // Load and flatten
    let input = read_sections(&config.input_path)?;
    let flat = flatten_definitions(&input, Utc::now().date_naive());

    // Write output files
    write_json(&flat, &config.output_path)?;
    if let Some(csv_path) = csv {
        write_fields_csv(&flat, &csv_path)?;
        debug!("  - {}", csv_path.display());
    }

    // Show summary
    for line in definitions_summary(&flat, &config.output_path.display().to_string()) {
        println!("{}", line);
    }
    Ok(())
}

fn run_documents(config: &PipelineConfig, run: DocumentsRun) -> Result<(), PipelineError> {
    debug!(
        "Converting {} -> {} | {:?}",
        config.input_path.display(),
        config.output_path.display(),
        run.curation
    );

    // Parse, clean up and aggregate
    let content = read_text(&config.input_path)?;
    let processing_start = Instant::now();
    let (catalog, update) = convert_documents_with(
        &content,
        &config.source_file(),
        Utc::now().date_naive(),
        &run.curation,
    );
    debug!("Data processing completed in {:.2?}", processing_start.elapsed());

    // Write output files
    let io_start = Instant::now();
    write_json(&catalog, &config.output_path)?;
    if let Some(csv_path) = run.csv {
        write_documents_csv(&catalog.documents, &csv_path)?;
        debug!("  - {}", csv_path.display());
    }
    if let Some(parquet_path) = run.parquet {
        write_documents_parquet(&catalog.documents, &parquet_path)?;
        debug!("  - {}", parquet_path.display());
    }
    debug!("All files took {:.2?}", io_start.elapsed());

    // Show summary
    for line in documents_summary(&catalog, &config.output_path.display().to_string()) {
        println!("{}", line);
    }
    if let Some(update) = update {
        println!();
        for line in dataset_update_summary(&update) {
            println!("{}", line);
        }
    }
    if run.analyze_data_files {
        println!();
        for line in data_files_summary(&analyze_data_files(&catalog.documents)) {
            println!("{}", line);
        }
    }
    Ok(())
}
