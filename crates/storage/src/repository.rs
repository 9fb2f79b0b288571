//! Repository Implementation

use crate::StorageError;
use organism_record::OrganismRecord;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

const ID_FIELD: &str = "bacteria_id";

/// Repository of known organisms (in-memory implementation)
pub struct Repository {
    organisms: Mutex<Vec<OrganismRecord>>,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory organism repository");
        Self {
            organisms: Mutex::new(Vec::with_capacity(1000)),
        }
    }

    /// Load a repository from a JSON array of organism records
    pub fn load_json(path: &Path) -> Result<Self, StorageError> {
        let raw = std::fs::read_to_string(path).map_err(|e| StorageError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let records = OrganismRecord::many_from_json_str(&raw)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let repo = Self::new();
        let inserted = repo.extend(records)?;
        info!("Loaded {} organisms from {}", inserted, path.display());
        Ok(repo)
    }

    /// Insert an organism; `bacteria_id` must be unique when present
    pub fn insert(&self, record: OrganismRecord) -> Result<usize, StorageError> {
        let mut organisms = self.organisms.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        if let Some(id) = record.get(ID_FIELD) {
            if organisms.iter().any(|o| o.get(ID_FIELD) == Some(id)) {
                return Err(StorageError::Duplicate(id.to_string()));
            }
        }

        organisms.push(record);
        let position = organisms.len() - 1;
        debug!("Inserted organism at position {}", position);
        Ok(position)
    }

    /// Insert many organisms, stopping at the first failure
    pub fn extend(&self, records: impl IntoIterator<Item = OrganismRecord>) -> Result<usize, StorageError> {
        let mut inserted = 0;
        for record in records {
            self.insert(record)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Bounded candidate sample: the first `limit` organisms in insertion order
    pub fn sample(&self, limit: usize) -> Result<Vec<OrganismRecord>, StorageError> {
        let organisms = self.organisms.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        Ok(organisms.iter().take(limit).cloned().collect())
    }

    /// Get total organism count
    pub fn len(&self) -> Result<usize, StorageError> {
        let organisms = self.organisms.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;
        Ok(organisms.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organism(id: &str, shape: &str) -> OrganismRecord {
        OrganismRecord::new().with(ID_FIELD, id).with("shape", shape)
    }

    #[test]
    fn test_insert_and_sample() {
        let repo = Repository::new();
        for i in 0..5 {
            repo.insert(organism(&format!("B{i}"), "Rod")).unwrap();
        }

        let sample = repo.sample(3).unwrap();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample[0].identity(), "B0");
        assert_eq!(repo.sample(100).unwrap().len(), 5);
        assert_eq!(repo.len().unwrap(), 5);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let repo = Repository::new();
        repo.insert(organism("B1", "Rod")).unwrap();
        let err = repo.insert(organism("B1", "Coccus")).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(id) if id == "B1"));

        // records without an id are not constrained
        repo.insert(OrganismRecord::new().with("shape", "Rod")).unwrap();
        repo.insert(OrganismRecord::new().with("shape", "Rod")).unwrap();
        assert_eq!(repo.len().unwrap(), 3);
    }

    #[test]
    fn test_poisoned_lock_is_an_error() {
        let repo = Repository::new();
        repo.insert(organism("B1", "Rod")).unwrap();

        let poisoned = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = repo.organisms.lock().unwrap();
                    panic!("writer died holding the lock");
                })
                .join()
        });
        assert!(poisoned.is_err());

        assert!(matches!(repo.len(), Err(StorageError::DatabaseError(_))));
        assert!(matches!(repo.is_empty(), Err(StorageError::DatabaseError(_))));
        assert!(matches!(repo.sample(1), Err(StorageError::DatabaseError(_))));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("organisms.json");
        std::fs::write(
            &path,
            r#"[{"bacteria_id": "B1", "shape": "Rod"}, {"bacteria_id": "B2", "mobility": true}]"#,
        )
        .unwrap();

        let repo = Repository::load_json(&path).unwrap();
        assert_eq!(repo.len().unwrap(), 2);
        assert!(!repo.is_empty().unwrap());

        let missing = Repository::load_json(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(StorageError::Read { .. })));
    }
}
