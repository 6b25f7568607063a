//! Saving, loading and clearing the persisted session.
//!
//! A session is three independent records: the cache snapshot list under
//! [`CACHES_KEY`], the collected coins under [`COINS_KEY`] and the trail
//! under [`POLYLINE_KEY`]. Every save rewrites all three in one batch.

use geocache_core::{
    CellKey, Coin, KeyValueStore, Memento, MementoError, Point, StoreError, StoreWrite,
    CACHES_KEY, COINS_KEY, POLYLINE_KEY, SESSION_KEYS,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{cache::Cache, player::PlayerState};

/// Outcome of [`PlayerState::load_session`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Keys that held a record which was read successfully.
    pub loaded: Vec<&'static str>,
    /// Keys whose record was corrupt and fell back to an empty default.
    pub discarded: Vec<&'static str>,
}

impl LoadReport {
    /// Reports whether every present record was read successfully.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discarded.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    key: CellKey,
    value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct CachesRecord {
    entries: Vec<CacheEntry>,
}

impl Memento for CachesRecord {}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct CoinsRecord {
    coins: Vec<Coin>,
}

impl Memento for CoinsRecord {}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct PolylineRecord {
    points: Vec<String>,
}

impl Memento for PolylineRecord {}

impl PlayerState {
    /// Persists cache snapshots, collected coins and the trail as one batch.
    pub fn save_session(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let caches = CachesRecord {
            entries: self
                .caches
                .entries()
                .map(|(key, value)| CacheEntry {
                    key: key.clone(),
                    value: value.to_owned(),
                })
                .collect(),
        };
        let coins = CoinsRecord {
            coins: self.collected.clone(),
        };
        let polyline = PolylineRecord {
            points: self.path.entries().to_vec(),
        };

        store.write(vec![
            StoreWrite::Set {
                key: CACHES_KEY.to_owned(),
                value: caches.to_memento(),
            },
            StoreWrite::Set {
                key: COINS_KEY.to_owned(),
                value: coins.to_memento(),
            },
            StoreWrite::Set {
                key: POLYLINE_KEY.to_owned(),
                value: polyline.to_memento(),
            },
        ])?;

        info!(
            caches = caches.entries.len(),
            coins = coins.coins.len(),
            points = polyline.points.len(),
            "saved session"
        );
        Ok(())
    }

    /// Replaces in-memory state with the persisted session.
    ///
    /// Missing keys load as empty. A corrupt record is discarded and listed in
    /// the returned report while the remaining records still load. Only a
    /// failure to read the store itself is an error.
    pub fn load_session(&mut self, store: &dyn KeyValueStore) -> Result<LoadReport, StoreError> {
        let caches = store.get(CACHES_KEY)?;
        let coins = store.get(COINS_KEY)?;
        let polyline = store.get(POLYLINE_KEY)?;

        let mut report = LoadReport::default();

        let snapshots = decode_record(CACHES_KEY, caches, &mut report, decode_caches);
        self.caches.replace(snapshots.unwrap_or_default());

        let collected = decode_record(COINS_KEY, coins, &mut report, |raw| {
            CoinsRecord::from_memento(raw).map(|record| record.coins)
        });
        self.collected = collected.unwrap_or_default();

        let points = decode_record(POLYLINE_KEY, polyline, &mut report, decode_polyline);
        self.path.replace(points.unwrap_or_default());

        info!(
            caches = self.caches.len(),
            coins = self.collected.len(),
            points = self.path.len(),
            discarded = report.discarded.len(),
            "loaded session"
        );
        Ok(report)
    }

    /// Removes the session from `store` and resets in-memory state.
    ///
    /// In-memory state is only reset once the store accepted the removal.
    pub fn clear_session(&mut self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let batch = SESSION_KEYS
            .iter()
            .map(|key| StoreWrite::Remove {
                key: (*key).to_owned(),
            })
            .collect();
        store.write(batch)?;
        self.reset();
        info!("cleared session");
        Ok(())
    }
}

fn decode_record<T>(
    key: &'static str,
    raw: Option<String>,
    report: &mut LoadReport,
    decode: impl FnOnce(&str) -> Result<T, MementoError>,
) -> Option<T> {
    let raw = raw?;
    match decode(&raw) {
        Ok(value) => {
            report.loaded.push(key);
            Some(value)
        }
        Err(error) => {
            warn!(key, %error, "discarding corrupt session record");
            report.discarded.push(key);
            None
        }
    }
}

fn decode_caches(raw: &str) -> Result<Vec<(CellKey, String)>, MementoError> {
    let record = CachesRecord::from_memento(raw)?;
    let mut snapshots = Vec::with_capacity(record.entries.len());
    for entry in record.entries {
        let cache = Cache::from_memento(&entry.value)?;
        if cache.cell().key() != entry.key {
            return Err(MementoError::Shape(serde::de::Error::custom(format!(
                "snapshot under {} describes cell {}",
                entry.key,
                cache.cell().key()
            ))));
        }
        snapshots.push((entry.key, entry.value));
    }
    Ok(snapshots)
}

fn decode_polyline(raw: &str) -> Result<Vec<String>, MementoError> {
    let record = PolylineRecord::from_memento(raw)?;
    for entry in &record.points {
        let _ = Point::from_memento(entry)?;
    }
    Ok(record.points)
}
