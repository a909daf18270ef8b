// src/store.rs

use crate::error::{Error, Result};
use crate::model::InteractionRecord;
use log::{debug, warn};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Records of one dataset, keyed by image id
pub type DatasetRecords = BTreeMap<String, InteractionRecord>;

/// All annotations of a dataset folder: `test_id -> image_id -> record`.
///
/// Serializes to the nested object stored in `interactions.json`. Entries
/// that could not be parsed are kept verbatim and written back on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionStore {
    datasets: BTreeMap<String, DatasetRecords>,
    raw_datasets: BTreeMap<String, Value>,
    raw_records: BTreeMap<String, BTreeMap<String, Value>>,
}

impl InteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses persisted interactions.
    ///
    /// Never fails: text that is not a JSON object yields an empty store.
    /// Dataset values that are not objects, and records that cannot be
    /// understood, are skipped with a warning but retained for the next save.
    pub fn load(raw: &str) -> Self {
        let parsed: Map<String, Value> = match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Ignoring unreadable interaction data: {}", e);
                return Self::default();
            }
        };

        let mut store = Self::default();
        for (test_id, images) in parsed {
            let images = match images {
                Value::Object(images) => images,
                other => {
                    warn!("Skipping dataset {}: not an object", test_id);
                    store.raw_datasets.insert(test_id, other);
                    continue;
                }
            };
            let records = store.datasets.entry(test_id.clone()).or_default();
            for (image_id, value) in images {
                match serde_json::from_value::<InteractionRecord>(value.clone()) {
                    Ok(record) => {
                        records.insert(image_id, record);
                    }
                    Err(e) => {
                        warn!("Skipping record {}/{}: {}", test_id, image_id, e);
                        store
                            .raw_records
                            .entry(test_id.clone())
                            .or_default()
                            .insert(image_id, value);
                    }
                }
            }
        }
        store
    }

    /// Loads `path`, treating a missing or unreadable file as no prior annotations
    pub fn load_file(path: &Path) -> Self {
        if !path.is_file() {
            debug!("No interactions file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(raw) => Self::load(&raw),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn get(&self, test_id: &str, image_id: &str) -> Option<&InteractionRecord> {
        self.datasets.get(test_id)?.get(image_id)
    }

    pub fn set(&mut self, test_id: &str, image_id: &str, record: InteractionRecord) {
        if self.raw_datasets.remove(test_id).is_some() {
            warn!("Replacing unreadable dataset entry {}", test_id);
        }
        if let Some(raw) = self.raw_records.get_mut(test_id) {
            raw.remove(image_id);
        }
        self.datasets
            .entry(test_id.to_string())
            .or_default()
            .insert(image_id.to_string(), record);
    }

    /// Records of one dataset, iterated in lexical image id order
    pub fn records(&self, test_id: &str) -> Option<&DatasetRecords> {
        self.datasets.get(test_id)
    }

    pub fn test_ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Number of parsed records across all datasets
    pub fn len(&self) -> usize {
        self.datasets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Writes the store as pretty-printed JSON.
    ///
    /// The file is written next to `path` first and renamed over it, so a
    /// failed save leaves the previous file intact. A store without parsed
    /// records is refused.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.is_empty() {
            return Err(Error::NothingToExport);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(Error::io(parent))?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &buf).map_err(Error::io(&tmp_path))?;
        if let Err(source) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        debug!("Saved {} interactions to {}", self.len(), path.display());
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum EntryOut<'a> {
    Parsed(&'a InteractionRecord),
    Raw(&'a Value),
}

#[derive(Serialize)]
#[serde(untagged)]
enum DatasetOut<'a> {
    Records(BTreeMap<&'a str, EntryOut<'a>>),
    Raw(&'a Value),
}

impl Serialize for InteractionStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out: BTreeMap<&str, DatasetOut<'_>> = BTreeMap::new();
        for (test_id, value) in &self.raw_datasets {
            out.insert(test_id, DatasetOut::Raw(value));
        }
        let test_ids = self.datasets.keys().chain(self.raw_records.keys());
        for test_id in test_ids {
            if out.contains_key(test_id.as_str()) {
                continue;
            }
            let mut entries = BTreeMap::new();
            for (image_id, value) in self.raw_records.get(test_id).into_iter().flatten() {
                entries.insert(image_id.as_str(), EntryOut::Raw(value));
            }
            for (image_id, record) in self.datasets.get(test_id).into_iter().flatten() {
                entries.insert(image_id.as_str(), EntryOut::Parsed(record));
            }
            out.insert(test_id, DatasetOut::Records(entries));
        }
        out.serialize(serializer)
    }
}
