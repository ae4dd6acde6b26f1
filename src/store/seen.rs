use crate::error::StoreError;
use crate::store::write_atomic;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ids of records that have already been alerted (or deliberately not).
///
/// Loaded whole at run start and rewritten whole at run end, one id per
/// line.
#[derive(Debug)]
pub struct SeenIdStore {
    path: PathBuf,
    ids: BTreeSet<String>,
    added: usize,
}

impl SeenIdStore {
    /// Missing or unreadable files load as an empty set
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let ids = match std::fs::read_to_string(&path) {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No seen-id file at {}, starting empty", path.display());
                BTreeSet::new()
            }
            Err(e) => {
                warn!("Unreadable seen-id file {} ({}), starting empty", path.display(), e);
                BTreeSet::new()
            }
        };

        Self { path, ids, added: 0 }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false when the id was already present
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let inserted = self.ids.insert(id.into());
        if inserted {
            self.added += 1;
        }
        inserted
    }

    /// Ids added since load
    pub fn added(&self) -> usize {
        self.added
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with the full set
    pub fn persist(&self) -> Result<(), StoreError> {
        let mut contents = String::with_capacity(self.ids.len() * 32);
        for id in &self.ids {
            contents.push_str(id);
            contents.push('\n');
        }
        write_atomic(&self.path, contents.as_bytes())
    }
}
