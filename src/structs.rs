use log::{Level, Log, Metadata, Record as LogRecord};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Console logger: warnings and errors go to stderr, everything else to stdout.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("[{}] {}", record.level(), record.args()),
            _ => println!("[{}] {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// String-keyed map that serializes as a JSON object in insertion order.
///
/// Re-inserting an existing key replaces the value but keeps the key's
/// original position. Equality ignores order, like two JSON objects with
/// the same members.
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<V: Eq> Eq for OrderedMap<V> {}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl OrderedMap<usize> {
    /// Adds one to the counter for `key`, creating it at zero first.
    pub fn increment(&mut self, key: &str) {
        match self.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.insert(key.to_string(), 1);
            }
        }
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Input of the flattening pipeline: field definitions grouped into sections.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SectionedDefinitions {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Section {
    pub name: String,
    pub fields: OrderedMap<FieldInput>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldInput {
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One flattened field definition.
///
/// The five attributes after `section` are placeholders that are always
/// emitted as `null`; later curation fills them in.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatField {
    pub definition: String,
    pub comment: Option<String>,
    pub section: String,
    pub mandatory: Option<String>,
    pub code_list: Option<String>,
    pub data_type: Option<String>,
    pub domain: Option<String>,
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionsMetadata {
    pub total_fields: usize,
    pub last_updated: String,
    pub version: String,
    pub sections: Vec<String>,
}

/// Output of the flattening pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlatDefinitions {
    pub fields: OrderedMap<FlatField>,
    pub metadata: DefinitionsMetadata,
}

/// One tagged document, built from one CSV row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub filename: String,
    pub title: String,
    pub date: String,
    pub external_link: String,
    pub folder: String,
    pub file_type: String,
    pub page_count: i64,
    pub module: String,
    pub document_type: String,
    pub people_mentioned: Vec<String>,
    pub tags: Vec<String>,
    pub has_exemption: bool,
    pub has_exclusion: bool,
    pub password_protected: bool,
    pub processed: bool,
}

/// Counts derived from the full document set.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub by_module: OrderedMap<usize>,
    pub by_file_type: OrderedMap<usize>,
    pub by_document_type: OrderedMap<usize>,
    pub with_exemptions: usize,
    pub with_exclusions: usize,
    pub password_protected: usize,
    pub processed: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    pub total_documents: usize,
    pub last_updated: String,
    pub source_file: String,
    pub columns: Vec<String>,
    pub statistics: Statistics,
}

/// Output of the CSV pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentCatalog {
    pub documents: Vec<DocumentRecord>,
    pub metadata: CatalogMetadata,
}

/// Input and output locations for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl PipelineConfig {
    /// File names the definitions pipeline uses when none are given.
    pub fn flatten_defaults() -> Self {
        Self {
            input_path: PathBuf::from("field-definitions.json"),
            output_path: PathBuf::from("field-definitions-flat.json"),
        }
    }

    /// File names the document pipeline uses when none are given.
    pub fn documents_defaults() -> Self {
        Self {
            input_path: PathBuf::from("eua_tagged_files.csv"),
            output_path: PathBuf::from("eua-tagged-files.json"),
        }
    }

    /// Bare file name of the input, as recorded in output metadata.
    pub fn source_file(&self) -> String {
        self.input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }
}
