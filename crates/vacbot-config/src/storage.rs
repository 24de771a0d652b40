// ── File-backed key-value storage ──
//
// One file per key under a state directory. Writes go to a sibling temp
// file that is then renamed over the target, so readers see either the
// old value or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use vacbot_core::KeyValueStorage;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key '{key}'"),
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        debug!(path = %path.display(), bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use vacbot_core::{ConnectionPreference, ConnectionPreferenceStore};

    use super::*;

    #[test]
    fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));

        assert_eq!(storage.get("robotConnection").unwrap(), None);
        storage.set("robotConnection", "{\"kind\":\"none\"}").unwrap();
        assert_eq!(
            storage.get("robotConnection").unwrap().as_deref(),
            Some("{\"kind\":\"none\"}")
        );
        storage.set("robotConnection", "second").unwrap();
        assert_eq!(storage.get("robotConnection").unwrap().as_deref(), Some("second"));

        storage.remove("robotConnection").unwrap();
        storage.remove("robotConnection").unwrap();
        assert_eq!(storage.get("robotConnection").unwrap(), None);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("robotConnection", "x").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["robotConnection.json".to_owned()]);
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let err = storage.set("../escape", "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn preference_survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let pref = ConnectionPreference::ble("C3:11:9A:00:42:7E");
        ConnectionPreferenceStore::new(Arc::new(FileStorage::new(dir.path())))
            .save(&pref)
            .unwrap();

        let reopened = ConnectionPreferenceStore::new(Arc::new(FileStorage::new(dir.path())));
        assert_eq!(reopened.load(), pref);
    }
}
