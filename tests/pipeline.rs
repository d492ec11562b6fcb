//! End-to-end runs of both conversions through the file loader and writers.

use chrono::NaiveDate;
use lib::transform::DOCUMENT_COLUMNS;
use lib::{
    CurationOptions, DatasetUpdate, DocumentCatalog, FlatDefinitions, PipelineError,
    analyze_data_files, compute_statistics, convert_documents, convert_documents_with,
    flatten_definitions, map_record, read_sections, read_text, regroup_sections, tokenize_line,
    write_documents_csv, write_documents_parquet, write_fields_csv, write_json,
};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

const DEFINITIONS: &str = r#"{
  "sections": [
    {
      "name": "Identifiers",
      "fields": {
        "STUDYID": { "definition": "Study identifier", "comment": "Sponsor assigned" },
        "USUBJID": { "definition": "Unique subject identifier" }
      }
    },
    {
      "name": "Timing",
      "fields": {
        "VISITNUM": { "definition": "Visit number", "comment": "" },
        "STUDYID": { "definition": "Study identifier (timing)" }
      }
    }
  ]
}"#;

const TAGGED_CSV: &str = "\
filename,title,date,link,folder,fileType,pageCount,module,documentType,peopleMentioned,tags,hasExemption,hasExclusion,passwordProtected,processed
a.pdf,\"Letter, signed\",2020-12-11,https://example.org/a,EUA,PDF,12,1.1,Letter,\"Jane Doe, John Roe\",\"approval, eua\",True,False,False,True
b.pdf,Memo,2020-12-12,https://example.org/b,EUA,PDF,n/a,2.5,Memo,,,False,True,True,True
c.docx,Review,2020-12-13,https://example.org/c,EUA,DOCX,3,1.1,Review,Jane Doe,clinical,true,False,False,False
d.pdf,Broken row,2020-12-14,https://example.org/d,EUA,PDF,1,5.3,Memo
e.pdf,Form,2020-12-15,https://example.org/e,EUA,PDF,4,5.3,Form,,,False,False,False,True
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 22).unwrap()
}

#[test]
fn definitions_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("field-definitions.json");
    let output = dir.path().join("field-definitions-flat.json");
    fs::write(&input, DEFINITIONS).unwrap();

    let sections = read_sections(&input).unwrap();
    let flat = flatten_definitions(&sections, today());
    write_json(&flat, &output).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        written["fields"]["STUDYID"],
        json!({
            "definition": "Study identifier (timing)",
            "comment": null,
            "section": "Timing",
            "mandatory": null,
            "codeList": null,
            "dataType": null,
            "domain": null,
            "origin": null
        })
    );
    assert_eq!(written["fields"]["VISITNUM"]["comment"], Value::Null);
    assert_eq!(
        written["metadata"],
        json!({
            "totalFields": 3,
            "lastUpdated": "2025-07-22",
            "version": "1.0",
            "sections": ["Identifiers", "Timing"]
        })
    );

    let reread: FlatDefinitions = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let keys: Vec<&str> = reread.fields.keys().collect();
    assert_eq!(keys, vec!["STUDYID", "USUBJID", "VISITNUM"]);
    assert_eq!(reread, flat);
}

#[test]
fn flattened_file_can_be_fed_back() {
    let sections = serde_json::from_str(DEFINITIONS).unwrap();
    let once = flatten_definitions(&sections, today());
    let twice = flatten_definitions(&regroup_sections(&once), today());

    // Regrouping by section reorders keys; content is what must match
    let keys: Vec<&str> = twice.fields.keys().collect();
    assert_eq!(keys, vec!["STUDYID", "VISITNUM", "USUBJID"]);
    assert_eq!(once.fields, twice.fields);
    for (name, field) in once.fields.iter() {
        assert_eq!(twice.fields.get(name), Some(field));
    }
    assert_eq!(twice.metadata.total_fields, 3);
}

#[test]
fn documents_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("eua_tagged_files.csv");
    let output = dir.path().join("eua-tagged-files.json");
    fs::write(&input, TAGGED_CSV).unwrap();

    let content = read_text(&input).unwrap();
    let catalog = convert_documents(&content, "eua_tagged_files.csv", today());
    write_json(&catalog, &output).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let meta = &written["metadata"];
    assert_eq!(meta["totalDocuments"], 4);
    assert_eq!(meta["sourceFile"], "eua_tagged_files.csv");
    assert_eq!(meta["columns"].as_array().unwrap().len(), 15);
    assert_eq!(
        meta["statistics"],
        json!({
            "byModule": { "1.1": 2, "2.5": 1, "5.3": 1 },
            "byFileType": { "PDF": 3, "DOCX": 1 },
            "byDocumentType": { "Letter": 1, "Memo": 1, "Review": 1, "Form": 1 },
            "withExemptions": 1,
            "withExclusions": 1,
            "passwordProtected": 1,
            "processed": 3
        })
    );

    let first = &written["documents"][0];
    assert_eq!(first["title"], "Letter, signed");
    assert_eq!(first["externalLink"], "https://example.org/a");
    assert_eq!(first["pageCount"], 12);
    assert_eq!(first["peopleMentioned"], json!(["Jane Doe", "John Roe"]));
    assert_eq!(first["tags"], json!(["approval", "eua"]));

    let second = &written["documents"][1];
    assert_eq!(second["pageCount"], 0);
    assert_eq!(second["peopleMentioned"], json!([]));

    let reread: DocumentCatalog = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(reread, catalog);
}

#[test]
fn invalid_utf8_is_converted_not_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("latin1.csv");
    let mut bytes = DOCUMENT_COLUMNS.join(",").into_bytes();
    bytes.extend_from_slice(b"\nmemo.pdf,Caf\xe9 memo,2021-01-01,L,F,PDF,2,1.1,Memo,,,False,False,False,True\n");
    fs::write(&input, bytes).unwrap();

    let content = read_text(&input).unwrap();
    let catalog = convert_documents(&content, "latin1.csv", today());

    assert_eq!(catalog.metadata.total_documents, 1);
    assert_eq!(catalog.documents[0].title, "Caf\u{fffd} memo");
}

#[test]
fn byte_order_mark_is_not_part_of_the_header() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bom.csv");
    fs::write(&input, format!("\u{feff}{}", TAGGED_CSV)).unwrap();

    let catalog = convert_documents(&read_text(&input).unwrap(), "bom.csv", today());
    assert_eq!(catalog.metadata.columns[0], "filename");
    assert_eq!(catalog.metadata.total_documents, 4);
}

#[test]
fn curated_catalog_counts_cleaned_types() {
    let content = TAGGED_CSV
        .replace(",PDF,4,5.3,Form,", ",XPT,4,5.3,data,")
        .replace(",Memo,,,", ",internal memo,,,");
    let options = CurationOptions {
        proper_case_types: true,
        datasets: true,
    };
    let (catalog, update) = convert_documents_with(&content, "t.csv", today(), &options);
    let stats = &catalog.metadata.statistics;

    assert_eq!(update, Some(DatasetUpdate { xpt: 1, jmp: 0 }));
    assert_eq!(stats.by_document_type.get("Dataset"), Some(&1));
    assert_eq!(stats.by_document_type.get("Internal Memo"), Some(&1));
    assert_eq!(stats.by_file_type.get("XPT"), Some(&1));
    assert_eq!(
        stats.by_document_type.values().sum::<usize>(),
        catalog.metadata.total_documents
    );

    let report = analyze_data_files(&catalog.documents);
    assert_eq!(report.xpt_total(), 1);
    assert!(report.xpt_by_type.contains_key("Dataset"));
}

#[test]
fn missing_input_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.csv");

    match read_text(&missing) {
        Err(PipelineError::Read { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected read error, got {:?}", other),
    }
}

#[test]
fn malformed_definitions_are_reported_with_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("defs.json");
    fs::write(&input, r#"{ "sections": [ { "name": "S", "fields": { "A": {} } } ] }"#).unwrap();

    assert!(matches!(
        read_sections(&input),
        Err(PipelineError::Definitions { .. })
    ));
}

#[test]
fn unwritable_output_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing-dir").join("out.json");
    let catalog = convert_documents(TAGGED_CSV, "t.csv", today());

    assert!(matches!(
        write_json(&catalog, &output),
        Err(PipelineError::Write { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn csv_exports() {
    let dir = TempDir::new().unwrap();
    let catalog = convert_documents(TAGGED_CSV, "t.csv", today());
    let documents_csv = dir.path().join("documents.csv");
    write_documents_csv(&catalog.documents, &documents_csv).unwrap();

    let exported = fs::read_to_string(&documents_csv).unwrap();
    let reparsed = convert_documents(&exported, "documents.csv", today());
    assert_eq!(reparsed.documents, catalog.documents);

    let sections = serde_json::from_str(DEFINITIONS).unwrap();
    let flat = flatten_definitions(&sections, today());
    let fields_csv = dir.path().join("fields.csv");
    write_fields_csv(&flat, &fields_csv).unwrap();

    let mut reader = csv::Reader::from_path(&fields_csv).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "STUDYID");
    assert_eq!(&rows[0][3], "Timing");
}

#[test]
fn parquet_export() {
    use parquet::file::reader::{FileReader, SerializedFileReader};

    let dir = TempDir::new().unwrap();
    let catalog = convert_documents(TAGGED_CSV, "t.csv", today());
    let path = dir.path().join("documents.parquet");
    write_documents_parquet(&catalog.documents, &path).unwrap();

    let reader = SerializedFileReader::new(fs::File::open(&path).unwrap()).unwrap();
    let metadata = reader.metadata().file_metadata();
    assert_eq!(metadata.num_rows(), 4);
    assert_eq!(metadata.schema_descr().root_schema().get_fields().len(), 15);
}

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("1.1".to_string()),
        Just("2.5".to_string()),
        Just("PDF".to_string()),
        Just("".to_string()),
        "[A-Za-z ]{1,8}",
    ]
}

proptest! {
    #[test]
    fn category_counts_sum_to_total(rows in prop::collection::vec((cell(), cell(), cell()), 0..40)) {
        let header: Vec<String> = DOCUMENT_COLUMNS.iter().map(|c| c.to_string()).collect();
        let records: Vec<_> = rows
            .iter()
            .map(|(module, file_type, document_type)| {
                let line = format!(
                    "f,t,d,l,fo,{file_type},1,{module},{document_type},,,True,False,True,False"
                );
                map_record(&header, &tokenize_line(&line)).unwrap()
            })
            .collect();
        let stats = compute_statistics(&records);

        prop_assert_eq!(stats.by_module.values().sum::<usize>(), records.len());
        prop_assert_eq!(stats.by_file_type.values().sum::<usize>(), records.len());
        prop_assert_eq!(stats.by_document_type.values().sum::<usize>(), records.len());
        prop_assert_eq!(stats.with_exemptions, records.len());
        prop_assert_eq!(stats.with_exclusions, 0);
    }

    #[test]
    fn well_formed_rows_are_all_kept(count in 0usize..30) {
        let mut content = DOCUMENT_COLUMNS.join(",");
        for i in 0..count {
            content.push_str(&format!("\nf{i}.pdf,T,D,L,F,PDF,{i},M,DT,\"a, b\",x,True,True,True,True"));
        }
        let catalog = convert_documents(&content, "t.csv", today());
        prop_assert_eq!(catalog.metadata.total_documents, count);
    }
}
