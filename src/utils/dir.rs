use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

/// Directory holding the json documents and logs. Created if it doesn't exist yet.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = env::var("APPDATA")
                .map(PathBuf::from)
                .context("APPDATA should be present on Windows")?;
            path.push("timesheet");
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .context("Couldn't find neither XDG_STATE_HOME nor HOME")?;
            path.push("timesheet");
            path
        }
    };

    create_dir(path)
}

/// Resolves `--dir`, falling back to [create_application_default_path].
pub fn resolve_data_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => create_dir(dir),
        None => create_application_default_path(),
    }
}

fn create_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v).with_context(|| format!("Can't create data directory {path:?}")),
    }
}
