use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::fs::operations::{ensure_json_file, read_json_or_default, write_json};

use super::{
    entities::{rate_from_value, CourseRates, StoredRates, TimeEntry},
    repository::{EntryStorage, RateStorage},
};

pub const ENTRIES_FILE_NAME: &str = "timesheet.json";
pub const RATES_FILE_NAME: &str = "courseRates.json";

/// A json file that is always read and written as a whole.
pub struct JsonDocument<T> {
    path: PathBuf,
    // Read-modify-write cycles inside the process are applied one at a time.
    write_lock: Mutex<()>,
    _value: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned + Default> JsonDocument<T> {
    /// Opens a document, creating it with default content if it's missing.
    pub async fn open(path: PathBuf) -> Result<Self> {
        ensure_json_file(&path, &T::default()).await?;
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            _value: PhantomData,
        })
    }

    pub async fn read(&self) -> T {
        read_json_or_default(&self.path).await
    }

    /// Applies `change` to the current content. The document is only rewritten if `change`
    /// returns a value.
    pub async fn update<R>(&self, change: impl FnOnce(&mut T) -> Option<R>) -> Result<Option<R>> {
        let _guard = self.write_lock.lock().await;
        let mut value = self.read().await;
        let Some(result) = change(&mut value) else {
            return Ok(None);
        };
        debug!("Rewriting {:?}", self.path);
        write_json(&self.path, &value).await?;
        Ok(Some(result))
    }
}

/// Content of the entries document. Items that aren't entries are dropped instead of failing the
/// whole document.
#[derive(Default, Serialize)]
#[serde(transparent)]
struct EntryList(Vec<TimeEntry>);

impl<'de> Deserialize<'de> for EntryList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Value>::deserialize(deserializer)?;
        let entries = values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<TimeEntry>(v.clone()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping illegal entry {v}: {e}");
                    None
                }
            })
            .collect();
        Ok(EntryList(entries))
    }
}

/// The main realization of [EntryStorage].
pub struct JsonEntryStorage {
    document: JsonDocument<EntryList>,
}

impl JsonEntryStorage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            document: JsonDocument::open(data_dir.join(ENTRIES_FILE_NAME)).await?,
        })
    }
}

fn has_id(entry: &TimeEntry, id: &str) -> bool {
    !id.is_empty() && entry.id == id
}

#[async_trait]
impl EntryStorage for JsonEntryStorage {
    async fn list(&self) -> Result<Vec<TimeEntry>> {
        Ok(self.document.read().await.0)
    }

    async fn get(&self, id: &str) -> Result<Option<TimeEntry>> {
        Ok(self
            .document
            .read()
            .await
            .0
            .into_iter()
            .find(|v| has_id(v, id)))
    }

    async fn insert(&self, entry: TimeEntry) -> Result<bool> {
        let inserted = self
            .document
            .update(|EntryList(entries)| {
                if entries.iter().any(|v| v.id == entry.id) {
                    return None;
                }
                entries.push(entry);
                Some(())
            })
            .await?;
        Ok(inserted.is_some())
    }

    async fn replace(&self, entry: TimeEntry) -> Result<bool> {
        let replaced = self
            .document
            .update(|EntryList(entries)| {
                let existing = entries.iter_mut().find(|v| has_id(v, &entry.id))?;
                *existing = entry;
                Some(())
            })
            .await?;
        Ok(replaced.is_some())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .document
            .update(|EntryList(entries)| {
                let before = entries.len();
                entries.retain(|v| !has_id(v, id));
                (entries.len() != before).then_some(())
            })
            .await?;
        Ok(removed.is_some())
    }
}

/// The main realization of [RateStorage].
pub struct JsonRateStorage {
    document: JsonDocument<StoredRates>,
}

impl JsonRateStorage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            document: JsonDocument::open(data_dir.join(RATES_FILE_NAME)).await?,
        })
    }
}

/// Rates that can be used for computations. Anything else stays on disk but is skipped here.
fn usable_rates(stored: &StoredRates) -> CourseRates {
    stored
        .iter()
        .filter_map(|(course_name, value)| match rate_from_value(value) {
            Some(rate) => Some((course_name.clone(), rate)),
            None => {
                warn!("Ignoring illegal rate of {course_name}: {value}");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RateStorage for JsonRateStorage {
    async fn list(&self) -> Result<CourseRates> {
        Ok(usable_rates(&self.document.read().await))
    }

    async fn get(&self, course_name: &str) -> Result<Option<f64>> {
        Ok(self
            .document
            .read()
            .await
            .get(course_name.trim())
            .and_then(rate_from_value))
    }

    async fn put(&self, course_name: &str, rate: f64) -> Result<CourseRates> {
        let rates = self
            .document
            .update(|rates| {
                rates.insert(course_name.trim().to_string(), Value::from(rate));
                Some(usable_rates(rates))
            })
            .await?;
        Ok(rates.unwrap_or_default())
    }

    async fn delete(&self, course_name: &str) -> Result<bool> {
        let removed = self
            .document
            .update(|rates| rates.remove(course_name.trim()).map(|_| ()))
            .await?;
        Ok(removed.is_some())
    }
}
