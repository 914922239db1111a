//! JSON-file credential store
//!
//! Keeps every value in memory and rewrites the whole file on each
//! change, so a reload of the process sees the last written state.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::CredentialStore;
use crate::error::Result;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading whatever it already holds.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is
    /// logged and treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let values = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    log::warn!(
                        "[store:file] Ignoring corrupt credentials file {}: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::debug!("[store:file] Loaded {} value(s) from {}", values.len(), path.display());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = write_file(&self.path, values) {
            log::warn!(
                "[store:file] Failed to write credentials to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Write to a sibling temp file and rename it over the target
fn write_file(path: &Path, values: &BTreeMap<String, String>) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(values).map_err(std::io::Error::other)?;
    let tmp_path = path.with_extension("json.tmp");

    // A leftover temp file would keep its old mode
    match fs::remove_file(&tmp_path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => return Err(err),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

impl CredentialStore for FileStore {
    fn get(&self, name: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(name.to_string(), value.to_string());
        self.persist(&values);
    }

    fn clear(&self, name: &str) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        if values.remove(name).is_some() {
            self.persist(&values);
        }
    }
}
