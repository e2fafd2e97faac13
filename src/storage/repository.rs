use anyhow::Result;
use async_trait::async_trait;

use super::entities::{CourseRates, TimeEntry};

/// Interface for abstracting storage of time entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryStorage: Send + Sync {
    /// All entries in the order they were stored.
    async fn list(&self) -> Result<Vec<TimeEntry>>;

    /// Entries with an empty id can't be looked up, replaced or deleted.
    async fn get(&self, id: &str) -> Result<Option<TimeEntry>>;

    /// Appends an entry unless its id is already taken. Returns `false` if nothing was stored.
    async fn insert(&self, entry: TimeEntry) -> Result<bool>;

    /// Replaces the entry with the same id in place. Returns `false` if there is no such entry.
    async fn replace(&self, entry: TimeEntry) -> Result<bool>;

    /// Returns `false` if there was no entry with that id.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Interface for abstracting storage of course rates. Course names are trimmed before being used
/// as keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateStorage: Send + Sync {
    async fn list(&self) -> Result<CourseRates>;

    async fn get(&self, course_name: &str) -> Result<Option<f64>>;

    /// Upserts a rate and returns the whole updated mapping.
    async fn put(&self, course_name: &str, rate: f64) -> Result<CourseRates>;

    /// Returns `false` if the course had no rate.
    async fn delete(&self, course_name: &str) -> Result<bool>;
}
