use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::store::{SharedStore, StoreError};
use crate::ops::reducer::Reducer;

/// Where a loaded value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from the store
    Stored,
    /// No value, or JSON `null`
    Missing,
    /// The store could not be read; the blob may still be intact
    Unreadable,
    /// The blob did not decode and was copied to the recovery log
    Corrupt,
}

/// Read and decode the blob under `key`. Anything but `Stored` comes back
/// with `None`; corrupt blobs are copied to the recovery log first.
fn load_value<T: DeserializeOwned>(store: &SharedStore, key: &str) -> (Option<T>, LoadSource) {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "no stored value, using default");
            return (None, LoadSource::Missing);
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read stored value, using default");
            return (None, LoadSource::Unreadable);
        }
    };

    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(Some(value)) => (Some(value), LoadSource::Stored),
        Ok(None) => (None, LoadSource::Missing),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value is corrupt, using default");
            if let Some(dir) = store.data_dir() {
                log_recovery(
                    dir,
                    RecoveryEntry::new(RecoveryCategory::Load, "corrupt value replaced by default")
                        .field("Key", key)
                        .field("Error", e.to_string())
                        .body(raw),
                );
            }
            (None, LoadSource::Corrupt)
        }
    }
}

/// Encode and store `value` under `key`. Failed writes go to the recovery log.
fn write_value<T: Serialize>(store: &SharedStore, key: &str, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::SerializeError {
        key: key.to_string(),
        source: e,
    })?;

    if let Err(e) = store.set_item(key, &content) {
        tracing::error!(key, error = %e, "could not persist value");
        if let Some(dir) = store.data_dir() {
            log_recovery(
                dir,
                RecoveryEntry::new(RecoveryCategory::Write, "value write failed")
                    .field("Key", key)
                    .field("Error", e.to_string())
                    .body(content),
            );
        }
        return Err(e);
    }
    tracing::trace!(key, bytes = content.len(), "persisted value");
    Ok(())
}

// ---------------------------------------------------------------------------
// PersistedState
// ---------------------------------------------------------------------------

/// A value mirrored to the store on every `set`.
pub struct PersistedState<T> {
    store: SharedStore,
    key: String,
    value: T,
}

impl<T: Serialize + DeserializeOwned> PersistedState<T> {
    /// Load `key`, falling back to `initial` when nothing usable is stored.
    pub fn load(store: SharedStore, key: &str, initial: T) -> Self {
        let value = load_value(&store, key).0.unwrap_or(initial);
        PersistedState {
            store,
            key: key.to_string(),
            value,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value and write it. The in-memory value changes even when
    /// the write fails.
    pub fn set(&mut self, value: T) -> Result<(), StoreError> {
        self.value = value;
        write_value(&self.store, &self.key, &self.value)
    }

    /// Compute the next value from the current one, then `set` it.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) -> Result<(), StoreError> {
        let next = f(&self.value);
        self.set(next)
    }
}

// ---------------------------------------------------------------------------
// PersistedReducer
// ---------------------------------------------------------------------------

/// Reducer-driven state, written to the store whenever a dispatch changes it.
pub struct PersistedReducer<R: Reducer> {
    store: SharedStore,
    key: String,
    reducer: R,
    state: R::State,
    source: LoadSource,
}

impl<R> PersistedReducer<R>
where
    R: Reducer,
    R::State: Serialize + DeserializeOwned + PartialEq,
{
    /// Load `key` (or `initial`), then let the reducer repair what it loaded.
    pub fn load(store: SharedStore, key: &str, reducer: R, initial: R::State) -> Self {
        let (loaded, source) = load_value::<R::State>(&store, key);
        let mut state = loaded.unwrap_or(initial);

        let repairs = reducer.normalize(&mut state);
        if source == LoadSource::Stored && !repairs.is_empty() {
            tracing::warn!(key, count = repairs.len(), "repaired stored state");
            if let Some(dir) = store.data_dir() {
                log_recovery(
                    dir,
                    RecoveryEntry::new(RecoveryCategory::Repair, "stored state repaired on load")
                        .field("Key", key)
                        .body(repairs.join("\n")),
                );
            }
            // best effort: the repaired state is rewritten on the next change anyway
            let _ = write_value(&store, key, &state);
        }

        PersistedReducer {
            store,
            key: key.to_string(),
            reducer,
            state,
            source,
        }
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Where the state came from when it was loaded
    pub fn source(&self) -> LoadSource {
        self.source
    }

    /// Write the current state whether or not it changed.
    pub fn persist(&self) -> Result<(), StoreError> {
        write_value(&self.store, &self.key, &self.state)
    }

    /// Apply `action`. Writes only when the state actually changed.
    /// Returns whether it changed.
    pub fn dispatch(&mut self, action: R::Action) -> Result<bool, StoreError> {
        let next = self.reducer.reduce(&self.state, action);
        if next == self.state {
            return Ok(false);
        }
        self.state = next;
        write_value(&self.store, &self.key, &self.state)?;
        Ok(true)
    }

    /// Re-read the stored value (e.g. after another process wrote it).
    /// Keeps the current state when nothing usable is stored.
    pub fn reload(&mut self) -> bool {
        let (Some(mut loaded), _) = load_value::<R::State>(&self.store, &self.key) else {
            return false;
        };
        self.reducer.normalize(&mut loaded);
        if loaded == self.state {
            return false;
        }
        tracing::debug!(key = %self.key, "reloaded state from store");
        self.state = loaded;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::io::store::{FileStore, KeyValueStore, MemoryStore};
    use crate::model::state::{PageState, ProMode};
    use crate::model::task::Task;
    use crate::ops::reducer::{PageAction, PageReducer, SequentialIds};

    fn page(store: SharedStore) -> PersistedReducer<PageReducer> {
        PersistedReducer::load(
            store,
            "state",
            PageReducer::new(SequentialIds::new("n"), true),
            PageState::default(),
        )
    }

    #[test]
    fn state_falls_back_on_missing_null_and_corrupt() {
        let mem = MemoryStore::shared();
        let store: SharedStore = mem.clone();

        let s = PersistedState::load(store.clone(), "ui", 7u32);
        assert_eq!(*s.get(), 7);

        mem.set_item("ui", "null").unwrap();
        let s = PersistedState::load(store.clone(), "ui", 7u32);
        assert_eq!(*s.get(), 7);

        mem.set_item("ui", "{not json").unwrap();
        let s = PersistedState::load(store.clone(), "ui", 7u32);
        assert_eq!(*s.get(), 7);

        mem.set_item("ui", "42").unwrap();
        let s = PersistedState::load(store, "ui", 7u32);
        assert_eq!(*s.get(), 42);
    }

    #[test]
    fn state_set_and_update_write_through() {
        let mem = MemoryStore::shared();
        let mut s = PersistedState::load(mem.clone(), "count", 1u32);
        s.set(2).unwrap();
        assert_eq!(mem.get_item("count").unwrap().as_deref(), Some("2"));
        s.update(|v| v * 10).unwrap();
        assert_eq!(*s.get(), 20);
        assert_eq!(mem.get_item("count").unwrap().as_deref(), Some("20"));
    }

    #[test]
    fn failed_write_still_updates_memory() {
        let mem = MemoryStore::shared();
        let mut s = PersistedState::load(mem.clone(), "count", 1u32);
        mem.set_read_only(true);
        assert!(s.set(5).is_err());
        assert_eq!(*s.get(), 5);
        assert_eq!(mem.get_item("count").unwrap(), None);
    }

    #[test]
    fn reducer_writes_only_on_change() {
        let mem = MemoryStore::shared();
        let mut p = page(mem.clone());
        assert_eq!(mem.get_item("state").unwrap(), None);

        // no-op action: nothing written
        let changed = p.dispatch(PageAction::EnableProMode).unwrap();
        assert!(!changed);
        assert_eq!(mem.get_item("state").unwrap(), None);

        let changed = p
            .dispatch(PageAction::AppendTask {
                new_title: "Buy milk".into(),
            })
            .unwrap();
        assert!(changed);
        let stored: PageState =
            serde_json::from_str(&mem.get_item("state").unwrap().unwrap()).unwrap();
        assert_eq!(stored.tasks, vec![Task::new("n-1", "Buy milk")]);
    }

    /// Rejects every write but reports a directory for the recovery log
    struct RejectingStore {
        dir: std::path::PathBuf,
    }

    impl KeyValueStore for RejectingStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::ReadOnly)
        }
        fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::ReadOnly)
        }
        fn data_dir(&self) -> Option<&std::path::Path> {
            Some(&self.dir)
        }
    }

    #[test]
    fn failed_dispatch_write_still_changes_state() {
        let mem = MemoryStore::shared();
        let mut p = page(mem.clone());
        mem.set_read_only(true);

        let result = p.dispatch(PageAction::AppendTask {
            new_title: "Buy milk".into(),
        });
        assert!(matches!(result, Err(StoreError::ReadOnly)));
        assert_eq!(p.state().tasks, vec![Task::new("n-1", "Buy milk")]);
        assert_eq!(mem.get_item("state").unwrap(), None);
    }

    #[test]
    fn failed_dispatch_write_is_logged_to_recovery() {
        let dir = tempfile::TempDir::new().unwrap();
        let store: SharedStore = Arc::new(RejectingStore {
            dir: dir.path().to_path_buf(),
        });
        let mut p = page(store);
        assert!(
            p.dispatch(PageAction::AppendTask {
                new_title: "Buy milk".into(),
            })
            .is_err()
        );

        let entries = crate::io::recovery::read_recovery_entries(dir.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert!(entries[0].body.contains("Buy milk"));
    }

    #[test]
    fn load_reports_where_state_came_from() {
        let mem = MemoryStore::shared();
        assert_eq!(page(mem.clone()).source(), LoadSource::Missing);

        mem.set_item("state", "null").unwrap();
        assert_eq!(page(mem.clone()).source(), LoadSource::Missing);

        mem.set_item("state", "{ this is not json").unwrap();
        assert_eq!(page(mem.clone()).source(), LoadSource::Corrupt);

        mem.set_item("state", r#"{"tasks":[]}"#).unwrap();
        assert_eq!(page(mem).source(), LoadSource::Stored);
    }

    #[test]
    fn reducer_loads_stored_state() {
        let mem = MemoryStore::shared();
        mem.set_item(
            "state",
            r#"{"tasks":[{"id":"a","title":"A","status":"done"}],"parentTaskIdForCreate":null,"proMode":"disabled"}"#,
        )
        .unwrap();
        let p = page(mem);
        assert_eq!(p.state().tasks.len(), 1);
        assert!(p.state().tasks[0].is_done());
        assert_eq!(p.state().pro_mode, ProMode::Disabled);
    }

    #[test]
    fn corrupt_state_is_logged_to_recovery() {
        let dir = tempfile::TempDir::new().unwrap();
        let store: SharedStore = Arc::new(FileStore::new(dir.path()));
        store.set_item("state", "{\"tasks\": [oops").unwrap();

        let p = page(store);
        assert!(p.state().tasks.is_empty());

        let entries = crate::io::recovery::read_recovery_entries(dir.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Load);
        assert_eq!(entries[0].body, "{\"tasks\": [oops");
    }

    #[test]
    fn invalid_state_is_repaired_on_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let store: SharedStore = Arc::new(FileStore::new(dir.path()));
        store
            .set_item(
                "state",
                r#"{"tasks":[{"id":"a","title":"A","status":"notDone"},{"id":"a","title":"dup","status":"notDone"}],"parentTaskIdForCreate":"gone"}"#,
            )
            .unwrap();

        let p = page(store.clone());
        assert_eq!(p.state().tasks.len(), 1);
        assert!(p.state().parent_task_id_for_create.is_none());

        let entries = crate::io::recovery::read_recovery_entries(dir.path(), None);
        assert_eq!(entries[0].category, RecoveryCategory::Repair);

        // repaired state was written back
        let stored: PageState =
            serde_json::from_str(&store.get_item("state").unwrap().unwrap()).unwrap();
        assert_eq!(stored.tasks.len(), 1);
    }

    #[test]
    fn persist_writes_unchanged_state() {
        let mem = MemoryStore::shared();
        let p = PersistedReducer::load(
            mem.clone(),
            "state",
            PageReducer::new(SequentialIds::new("n"), true),
            PageState::seeded({
                let mut n = 0;
                move || {
                    n += 1;
                    format!("s-{}", n)
                }
            }),
        );
        assert_eq!(mem.get_item("state").unwrap(), None);
        p.persist().unwrap();
        let stored: PageState =
            serde_json::from_str(&mem.get_item("state").unwrap().unwrap()).unwrap();
        assert_eq!(&stored, p.state());
    }

    #[test]
    fn reload_picks_up_external_writes() {
        let mem = MemoryStore::shared();
        let mut p = page(mem.clone());
        assert!(!p.reload());

        let mut other = page(mem.clone());
        other
            .dispatch(PageAction::AppendTask {
                new_title: "From elsewhere".into(),
            })
            .unwrap();

        assert!(p.reload());
        assert_eq!(p.state().tasks[0].title, "From elsewhere");
        assert!(!p.reload());
    }
}
