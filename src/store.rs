use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::attainment::{clamp_weight, WeightageMap};

pub const MAPPINGS_KEY: &str = "copo_mappings_v5";
pub const COURSE_OUTCOMES_KEY: &str = "course_outcomes";
pub const ASSESSMENTS_KEY: &str = "co_assessments";
pub const COURSES_KEY: &str = "courses";
pub const OUTPUTS_KEY: &str = "program_outputs";
pub const SESSION_KEY: &str = "session";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A JSON object file of string values, rewritten in full on every `set`.
///
/// A file that does not decode opens as an empty store; it is copied to
/// `<name>.corrupt` before the first write replaces it.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    corrupt: bool,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "store file missing, starting empty");
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
                corrupt: false,
            });
        }

        let raw = fs::read(&path).with_context(|| format!("failed to read store {}", path.display()))?;
        let (entries, corrupt) = match serde_json::from_slice(&raw) {
            Ok(entries) => (entries, false),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "store is not a JSON object, starting empty");
                (BTreeMap::new(), true)
            }
        };

        Ok(Self {
            path,
            entries,
            corrupt,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("corrupt")
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        if self.corrupt {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup)
                .with_context(|| format!("failed to back up {}", self.path.display()))?;
            warn!(backup = %backup.display(), "kept a copy of the unreadable store");
            self.corrupt = false;
        }

        let body = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value);
        self.persist()
    }
}

/// Reads the weightage table, normalising every stored value into `0..=3`.
/// Unreadable payloads load as an empty table.
pub fn load_mappings(store: &dyn KeyValueStore) -> anyhow::Result<WeightageMap> {
    let mut mappings = WeightageMap::new();
    let Some(raw) = store.get(MAPPINGS_KEY)? else {
        return Ok(mappings);
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "stored mappings are not valid JSON, ignoring");
            return Ok(mappings);
        }
    };

    let Value::Object(rows) = parsed else {
        warn!("stored mappings are not an object, ignoring");
        return Ok(mappings);
    };

    for (co_id, row) in rows {
        mappings.ensure_row(&co_id);
        let Value::Object(cells) = row else {
            continue;
        };
        for (po_code, cell) in cells {
            mappings.set(&co_id, &po_code, i64::from(coerce_weight(&cell)));
        }
    }

    Ok(mappings)
}

pub fn save_mappings(store: &mut dyn KeyValueStore, mappings: &WeightageMap) -> anyhow::Result<()> {
    let body = serde_json::to_string(mappings)?;
    store.set(MAPPINGS_KEY, body)
}

fn coerce_weight(value: &Value) -> u8 {
    let number = match value {
        Value::Null => 0.0,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        // out-of-range literals such as 1e400 stay unparsed and read as NaN
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_number_text(s),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    };

    if !number.is_finite() {
        return 0;
    }
    clamp_weight(number.trunc().clamp(-1.0, 4.0) as i64)
}

/// String-to-number conversion with the same accepted forms as a browser's
/// `Number(text)`, including `0x`/`0o`/`0b` integer prefixes.
fn parse_number_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }
        return digits.chars().fold(0.0, |acc, c| {
            acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
        });
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Loads a JSON-encoded value stored under `key`, falling back to the default
/// when the key is absent or the payload does not decode.
pub fn load_json<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    key: &str,
) -> anyhow::Result<T> {
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(key, error = %err, "stored value does not decode, using default");
            Ok(T::default())
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    store.set(key, serde_json::to_string(value)?)
}

/// Applies `co_id,po_code,weight` rows on top of `mappings`. Weights are
/// normalised the same way stored values are.
pub fn import_csv<R: std::io::Read>(reader: R, mappings: &mut WeightageMap) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        co_id: String,
        po_code: String,
        weight: String,
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut applied = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let weight = coerce_weight(&Value::String(row.weight));
        mappings.set(&row.co_id, &row.po_code, i64::from(weight));
        applied += 1;
    }

    Ok(applied)
}
