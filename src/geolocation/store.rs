//! Persisted last-known location.
//!
//! A small JSON record holding the last granted coordinates and the marker of
//! the session that wrote them. Opening the store with a different session
//! marker is a fresh load: the cached coordinates are discarded.

use crate::error::Result;
use crate::models::{CachedCoordinate, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    coordinate: Option<CachedCoordinate>,
    #[serde(default)]
    accuracy: Option<f64>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// File-backed store for the last known coordinates of a session.
#[derive(Debug, Clone)]
pub struct LocationStore {
    path: PathBuf,
    session: String,
}

impl LocationStore {
    /// Opens (or creates) the record at `path` for `session`.
    pub fn open(path: impl Into<PathBuf>, session: &str) -> Result<Self> {
        let store = Self {
            path: path.into(),
            session: session.to_string(),
        };

        let record = store.read()?;
        if record.session.as_deref() != Some(session) {
            if record.coordinate.is_some() {
                info!("New session, discarding cached coordinates");
            }
            store.write(&StoredRecord {
                session: Some(session.to_string()),
                ..StoredRecord::default()
            })?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached position of this session, if any.
    pub fn load(&self) -> Option<Position> {
        let record = match self.read() {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not read location store {}: {}", self.path.display(), e);
                return None;
            },
        };
        if record.session.as_deref() != Some(self.session.as_str()) {
            return None;
        }
        record.coordinate.map(|c| Position {
            latitude: c.lat,
            longitude: c.lon,
            accuracy: record.accuracy.unwrap_or(0.0),
        })
    }

    pub fn save(&self, position: &Position) -> Result<()> {
        self.write(&StoredRecord {
            session: Some(self.session.clone()),
            coordinate: Some(CachedCoordinate {
                lat: position.latitude,
                lon: position.longitude,
            }),
            accuracy: Some(position.accuracy),
            saved_at: Some(Utc::now()),
        })
    }

    /// Forgets the coordinates but keeps the session marker.
    pub fn clear(&self) -> Result<()> {
        self.write(&StoredRecord {
            session: Some(self.session.clone()),
            ..StoredRecord::default()
        })
    }

    fn read(&self) -> Result<StoredRecord> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(record) => Ok(record),
                Err(e) => {
                    warn!("Ignoring corrupt location store {}: {}", self.path.display(), e);
                    Ok(StoredRecord::default())
                },
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoredRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes via a temporary file and rename so readers never see a partial record.
    fn write(&self, record: &StoredRecord) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Location store written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn temp_store_path(name: &str) -> PathBuf {
    let suffix: u64 = rand::random();
    std::env::temp_dir().join(format!("nefes-{}-{:x}.json", name, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: Position = Position {
        latitude: 39.9334,
        longitude: 32.8597,
        accuracy: 30.0,
    };

    #[test]
    fn test_save_and_load_within_session() {
        let path = temp_store_path("same-session");
        let store = LocationStore::open(&path, "s1").unwrap();
        assert_eq!(store.load(), None);

        store.save(&HOME).unwrap();
        assert_eq!(store.load(), Some(HOME));

        let reopened = LocationStore::open(&path, "s1").unwrap();
        assert_eq!(reopened.load(), Some(HOME));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_new_session_discards_coordinates() {
        let path = temp_store_path("new-session");
        LocationStore::open(&path, "s1").unwrap().save(&HOME).unwrap();

        let fresh = LocationStore::open(&path, "s2").unwrap();
        assert_eq!(fresh.load(), None);

        // The old session's view is gone too.
        let old = LocationStore::open(&path, "s1").unwrap();
        assert_eq!(old.load(), None);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_clear_keeps_session() {
        let path = temp_store_path("clear");
        let store = LocationStore::open(&path, "s1").unwrap();
        store.save(&HOME).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);

        store.save(&HOME).unwrap();
        assert_eq!(LocationStore::open(&path, "s1").unwrap().load(), Some(HOME));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let path = temp_store_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let store = LocationStore::open(&path, "s1").unwrap();
        assert_eq!(store.load(), None);
        let _ = fs::remove_file(path);
    }
}
