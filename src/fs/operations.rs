use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

/// Creates a json document with `default` content if nothing exists at `path` yet. Existing files
/// are never touched.
pub async fn ensure_json_file<T: Serialize>(path: &Path, default: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            debug!("Creating {path:?} with default content");
            write_json(path, default).await
        }
        Err(e) => Err(e).with_context(|| format!("Can't access {path:?}")),
    }
}

/// Reads a whole file under a shared lock. A missing file is reported as `None`.
pub async fn read_text(path: &Path) -> Result<Option<String>, std::io::Error> {
    async fn extract(path: &Path) -> Result<String, std::io::Error> {
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        result.map(|_| content)
    }

    match extract(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Reads a json document, falling back to `T::default()` if the file is missing or broken.
/// Failures are only logged, since a damaged document shouldn't stop the application.
pub async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match read_text(path).await {
        Ok(Some(content)) => content,
        Ok(None) => {
            warn!("Document {path:?} doesn't exist, using default value");
            return T::default();
        }
        Err(e) => {
            warn!("Failed to read {path:?}: {e}");
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Found illegal json in {path:?}: {e}");
            T::default()
        }
    }
}

/// Replaces the whole content of `path` with pretty printed json.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buffer = serde_json::to_vec_pretty(value)?;
    buffer.push(b'\n');

    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await
        .with_context(|| format!("Can't open {path:?} for writing"))?;

    // Truncating only after the lock is acquired keeps readers from seeing a half empty file.
    file.lock_exclusive()?;
    let result = write_locked(&mut file, &buffer).await;
    file.unlock_async().await?;
    result.with_context(|| format!("Failed to write {path:?}"))
}

async fn write_locked(file: &mut File, buffer: &[u8]) -> Result<(), std::io::Error> {
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(buffer).await?;
    file.flush().await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::fs::operations::{ensure_json_file, read_json_or_default, read_text, write_json};

    #[tokio::test]
    async fn test_ensure_creates_default_document() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("doc.json");

        ensure_json_file(&path, &Vec::<String>::new()).await?;

        assert_eq!(read_text(&path).await?.as_deref(), Some("[]\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_keeps_existing_document() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("doc.json");
        write_json(&path, &vec!["kept"]).await?;

        ensure_json_file(&path, &Vec::<String>::new()).await?;

        let value: Vec<String> = read_json_or_default(&path).await;
        assert_eq!(value, vec!["kept".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_replaces_longer_content() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("doc.json");
        write_json(&path, &vec!["a very long value that takes space"; 10]).await?;
        write_json(&path, &vec!["short"]).await?;

        let value: Vec<String> = read_json_or_default(&path).await;
        assert_eq!(value, vec!["short".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_is_pretty_printed() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("doc.json");
        write_json(&path, &BTreeMap::from([("Algebra", 20.0)])).await?;

        assert_eq!(
            read_text(&path).await?.as_deref(),
            Some("{\n  \"Algebra\": 20.0\n}\n")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_read_falls_back_to_default() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing.json");
        let value: Vec<String> = read_json_or_default(&missing).await;
        assert!(value.is_empty());

        let corrupt = dir.path().join("corrupt.json");
        tokio::fs::write(&corrupt, "[{\"id\": ").await?;
        let value: BTreeMap<String, f64> = read_json_or_default(&corrupt).await;
        assert!(value.is_empty());
        Ok(())
    }
}
