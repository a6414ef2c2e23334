use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{ArchiveError, ArchiveResult};

/// One named entry in a container.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    data: Vec<u8>,
}

/// A project container: an in-memory, order-preserving view of a ZIP-format
/// archive.
///
/// Containers are small (one program graph, two JSON documents, a handful of
/// assets), so the whole archive is decompressed on open and recompressed on
/// [`Container::serialize`]. Entry order is preserved across a round-trip;
/// [`Container::put_entry`] replaces in place so repeated saves never
/// accumulate duplicate entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Container {
    entries: Vec<Entry>,
}

impl Container {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a container from archive bytes.
    ///
    /// Fails with [`ArchiveError::Corrupt`] if the bytes are not a readable
    /// archive. Duplicate entry names (produced by legacy writers that
    /// appended instead of replacing) resolve to the last occurrence, which
    /// matches how ZIP central directories are read in practice.
    pub fn open(bytes: &[u8]) -> ArchiveResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        let mut container = Self::new();
        for index in 0..zip.len() {
            let mut file = zip
                .by_index(index)
                .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| ArchiveError::Corrupt(format!("entry {name:?}: {e}")))?;
            // Last occurrence wins.
            container.put_entry(&name, data);
        }
        debug!(entries = container.len(), "opened container");
        Ok(container)
    }

    /// Entry names in container order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Read an entry's bytes. `None` if no entry has that name — callers
    /// distinguish "document absent" from "container corrupt", so a missing
    /// entry is never an error here.
    pub fn read_entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Insert or overwrite an entry. An existing entry with the same name is
    /// replaced in place (its position is kept); otherwise the entry is
    /// appended.
    pub fn put_entry(&mut self, name: &str, data: Vec<u8>) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
            existing.data = data;
        } else {
            self.entries.push(Entry {
                name: name.to_string(),
                data,
            });
        }
    }

    /// Remove an entry. Returns `true` if it existed.
    pub fn remove_entry(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the container back to archive bytes.
    pub fn serialize(&self) -> ArchiveResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for entry in &self.entries {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| ArchiveError::Serialize(format!("entry {:?}: {e}", entry.name)))?;
            writer.write_all(&entry.data)?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| ArchiveError::Serialize(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
