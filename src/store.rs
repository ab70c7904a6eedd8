//! Persistent key-value storage for small pieces of JSON state.
//!
//! A missing or unreadable key always means "use the defaults".

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::errors::StoreError;

/// Key of the saved bridge design.
pub const DESIGN_KEY: &str = "bridgeBuilder_design";
/// Key of the best score reached so far.
pub const BEST_SCORE_KEY: &str = "bridgeBuilder_bestScore";
/// Key set once the tutorial was dismissed.
pub const TUTORIAL_KEY: &str = "bridgeBuilder_hasSeenTutorial";

/// String values stored by key.
pub trait KeyValueStore {
    /// Value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the value cannot be persisted.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Volatile store, handy for tests and throwaway sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every `set`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store; a corrupt one is logged and treated
    /// as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "ignoring corrupt store");
                BTreeMap::new()
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };
        Ok(Self { path, entries })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Decode the JSON value under `key`, falling back to `T::default()`.
pub fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(text) = store.get(key) else {
        return T::default();
    };
    serde_json::from_str(&text).unwrap_or_else(|error| {
        warn!(key, %error, "stored value is malformed; using defaults");
        T::default()
    })
}

/// Encode `value` as JSON under `key`.
///
/// # Errors
///
/// Returns [`StoreError`] when encoding or persisting fails.
pub fn save<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let text = serde_json::to_string(value)?;
    store.set(key, text)
}

/// Record `score` if it beats the stored best; returns the best after the update.
///
/// # Errors
///
/// Returns [`StoreError`] when the new best cannot be persisted.
pub fn record_best_score<S: KeyValueStore + ?Sized>(
    store: &mut S,
    score: u32,
) -> Result<u32, StoreError> {
    let best: u32 = load_or_default(store, BEST_SCORE_KEY);
    if score > best {
        save(store, BEST_SCORE_KEY, &score)?;
        Ok(score)
    } else {
        Ok(best)
    }
}

/// Whether the player has already been shown the tutorial.
pub fn has_seen_tutorial<S: KeyValueStore + ?Sized>(store: &S) -> bool {
    load_or_default(store, TUTORIAL_KEY)
}

/// Remember that the tutorial was shown.
///
/// # Errors
///
/// Returns [`StoreError`] when the flag cannot be persisted.
pub fn mark_tutorial_seen<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    save(store, TUTORIAL_KEY, &true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_means_defaults() {
        let store = MemoryStore::default();
        let seen: bool = load_or_default(&store, TUTORIAL_KEY);
        assert!(!seen);
    }

    #[test]
    fn tutorial_is_shown_once() {
        let mut store = MemoryStore::default();
        assert!(!has_seen_tutorial(&store));
        mark_tutorial_seen(&mut store).expect("memory store accepts writes");
        assert!(has_seen_tutorial(&store));
        assert_eq!(store.get(TUTORIAL_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn malformed_value_means_defaults() {
        let mut store = MemoryStore::default();
        store
            .set(BEST_SCORE_KEY, "not json".to_string())
            .expect("memory store accepts writes");
        let best: u32 = load_or_default(&store, BEST_SCORE_KEY);
        assert_eq!(best, 0);
    }

    #[test]
    fn best_score_only_increases() {
        let mut store = MemoryStore::default();
        assert_eq!(record_best_score(&mut store, 800).expect("saved"), 800);
        assert_eq!(record_best_score(&mut store, 500).expect("saved"), 800);
        assert_eq!(record_best_score(&mut store, 12_760).expect("saved"), 12_760);
        assert_eq!(store.get(BEST_SCORE_KEY).as_deref(), Some("12760"));
    }

    #[test]
    fn file_store_persists_across_opens() {
        let path = std::env::temp_dir().join(format!(
            "bridgesim-store-{}-{}.json",
            std::process::id(),
            line!()
        ));
        let _ = fs::remove_file(&path);

        let mut store = FileStore::open(&path).expect("missing file is empty");
        mark_tutorial_seen(&mut store).expect("saved");

        let reopened = FileStore::open(&path).expect("file readable");
        assert!(has_seen_tutorial(&reopened));
        assert_eq!(reopened.path(), path.as_path());

        fs::remove_file(&path).expect("cleanup");
    }
}
