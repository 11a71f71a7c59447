//! Durable JSON store for scraped records and provenance statistics.

use crate::error::Result;
use crate::models::{EmailStats, ListingRecord, StoreData};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Append-only collection of listing records, persisted as one JSON
/// document next to its statistics. Records are deduplicated on the
/// (name, address) pair: a duplicate is dropped, never merged.
pub(crate) struct ResultStore {
    path: PathBuf,
    data: StoreData,
    keys: HashSet<(String, String)>,
}

impl ResultStore {
    /// Opens an existing store, or starts an empty one when the file does
    /// not exist yet.
    pub(crate) fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str::<StoreData>(&raw)?
        } else {
            StoreData::default()
        };
        let keys = data.records.iter().map(|r| r.key()).collect();
        tracing::debug!(
            target: "store",
            "Opened store {} with {} records",
            path.display(),
            data.records.len()
        );
        Ok(Self { path, data, keys })
    }

    pub(crate) fn records(&self) -> &[ListingRecord] {
        &self.data.records
    }

    pub(crate) fn stats(&self) -> &EmailStats {
        &self.data.stats
    }

    pub(crate) fn contains(&self, name: &str, address: Option<&str>) -> bool {
        self.keys.contains(&(
            name.to_string(),
            address.map(|a| a.to_string()).unwrap_or_default(),
        ))
    }

    /// Appends a record and persists the store. Returns false when the
    /// (name, address) pair is already present; the store is untouched in
    /// that case. Exactly one stats counter is bumped per stored record
    /// that carries a primary email.
    pub(crate) fn append(&mut self, record: ListingRecord) -> Result<bool> {
        if !self.keys.insert(record.key()) {
            tracing::debug!(target: "store", "Dropping duplicate record for '{}'", record.name);
            return Ok(false);
        }
        if record.email.is_some() {
            if let Some(provenance) = record.email_source {
                self.data.stats.record(provenance);
            }
        }
        self.data.records.push(record);
        self.save()?;
        Ok(true)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn record(name: &str, address: &str, email: Option<&str>) -> ListingRecord {
        ListingRecord {
            name: name.to_string(),
            address: Some(address.to_string()),
            phone: None,
            additional_phones: Vec::new(),
            website: None,
            rating: None,
            email: email.map(|e| e.to_string()),
            additional_emails: Vec::new(),
            social_media: Vec::new(),
            additional_contacts: Vec::new(),
            email_source: email.map(|_| Provenance::Direct),
        }
    }

    fn temp_store(name: &str) -> ResultStore {
        let path = std::env::temp_dir().join(format!("lead-sleuth-test-{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        ResultStore::open(path).unwrap()
    }

    #[test]
    fn test_append_and_dedup() {
        let mut store = temp_store("dedup");
        assert!(store
            .append(record("Acme", "1 Main St", Some("info@acme.com")))
            .unwrap());
        // Same (name, address) with a different email: dropped, not merged.
        assert!(!store
            .append(record("Acme", "1 Main St", Some("sales@acme.com")))
            .unwrap());
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].email.as_deref(), Some("info@acme.com"));
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_stats_bumped_once_per_stored_primary() {
        let mut store = temp_store("stats");
        store
            .append(record("A", "addr1", Some("info@a.com")))
            .unwrap();
        store.append(record("B", "addr2", None)).unwrap();
        store
            .append(record("A", "addr1", Some("other@a.com")))
            .unwrap();
        assert_eq!(store.stats().direct, 1);
        assert_eq!(store.stats().total(), 1);
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_reload_round_trip() {
        let mut store = temp_store("reload");
        store
            .append(record("Acme", "1 Main St", Some("info@acme.com")))
            .unwrap();
        let path = store.path().to_path_buf();
        drop(store);

        let reloaded = ResultStore::open(&path).unwrap();
        assert_eq!(reloaded.records().len(), 1);
        assert!(reloaded.contains("Acme", Some("1 Main St")));
        assert_eq!(reloaded.stats().direct, 1);
        let _ = std::fs::remove_file(&path);
    }
}
