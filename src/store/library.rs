//! The user's library and recently-read list, kept in `library.props`.

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::app::Result;
use crate::store::record::{join_list, Record};

pub const LIBRARY_FILE: &str = "library.props";

const LIBRARY_KEY: &str = "library";
const LAST_READ_KEY: &str = "lastRead";

#[derive(Debug)]
pub struct LibraryFile {
    path: PathBuf,
    library: Vec<Uuid>,
    last_read: Vec<Uuid>,
}

impl LibraryFile {
    /// Load the library from `root`, creating an empty file if needed.
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(LIBRARY_FILE);
        if !path.exists() {
            let file = Self {
                path,
                library: Vec::new(),
                last_read: Vec::new(),
            };
            file.save()?;
            return Ok(file);
        }

        let record = Record::read(&path)?;
        Ok(Self {
            library: parse_ids(&record, LIBRARY_KEY),
            last_read: parse_ids(&record, LAST_READ_KEY),
            path,
        })
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.library.contains(&id)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.library
    }

    pub fn last_read(&self) -> &[Uuid] {
        &self.last_read
    }

    /// Returns false when the id was already a member.
    pub fn add(&mut self, id: Uuid) -> Result<bool> {
        if self.contains(id) {
            return Ok(false);
        }
        self.library.push(id);
        self.save()?;
        Ok(true)
    }

    /// Returns false when the id was not a member.
    pub fn remove(&mut self, id: Uuid) -> Result<bool> {
        let Some(index) = self.library.iter().position(|x| *x == id) else {
            return Ok(false);
        };
        self.library.remove(index);
        self.save()?;
        Ok(true)
    }

    /// Move `id` to the front of the recently-read list.
    pub fn touch_last_read(&mut self, id: Uuid) -> Result<()> {
        if self.last_read.first() == Some(&id) {
            return Ok(());
        }
        self.last_read.retain(|x| *x != id);
        self.last_read.insert(0, id);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let mut record = Record::new();
        record.set(LIBRARY_KEY, join_ids(&self.library));
        record.set(LAST_READ_KEY, join_ids(&self.last_read));
        record.write(&self.path, "Library file")
    }
}

fn parse_ids(record: &Record, key: &str) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for raw in record.get_list(key) {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(e) => warn!("Skipping malformed {} entry {:?}: {}", key, raw, e),
        }
    }
    ids
}

fn join_ids(ids: &[Uuid]) -> String {
    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    join_list(&ids)
}
