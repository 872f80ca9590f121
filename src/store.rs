// Storage of sets and the prune protocol that keeps a one time backup of the original.

use crate::error::StoreError;
use crate::set::Set;
use crate::traits::SetStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Suffix appended to a key to name its backup.
pub const BACKUP_SUFFIX: &str = "_original";

/// Key of the backup belonging to this key.
pub fn backup_key(key: &str) -> String {
    format!("{key}{BACKUP_SUFFIX}")
}

/// Whether this key names a backup.
pub fn is_backup_key(key: &str) -> bool {
    key.ends_with(BACKUP_SUFFIX)
}

/// The live key a backup belongs to, `None` if the key is not a backup or has no name left.
pub fn live_key(key: &str) -> Option<&str> {
    key.strip_suffix(BACKUP_SUFFIX).filter(|k| !k.is_empty())
}

/// On disk encoding of a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetFormat {
    #[default]
    Json,
    Yaml,
}

impl SetFormat {
    pub fn encode(&self, set: &Set) -> Result<Vec<u8>, String> {
        match self {
            SetFormat::Json => serde_json::to_vec_pretty(set).map_err(|e| e.to_string()),
            SetFormat::Yaml => serde_yaml::to_vec(set).map_err(|e| e.to_string()),
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<Set, String> {
        match self {
            SetFormat::Json => serde_json::from_slice(data).map_err(|e| e.to_string()),
            SetFormat::Yaml => serde_yaml::from_slice(data).map_err(|e| e.to_string()),
        }
    }
}

/// Store that only keeps sets in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    sets: BTreeMap<String, Set>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            sets: Default::default(),
        }
    }
}

impl SetStore for MemoryStore {
    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.sets.keys().cloned().collect())
    }

    fn exists(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    fn load(&self, key: &str) -> Result<Set, StoreError> {
        self.sets.get(key).cloned().ok_or_else(|| StoreError::NotFound {
            key: key.to_owned(),
        })
    }

    fn save(&mut self, key: &str, set: &Set) -> Result<(), StoreError> {
        self.sets.insert(key.to_owned(), set.clone());
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        let set = self.sets.remove(from).ok_or_else(|| StoreError::Rename {
            from: from.to_owned(),
            to: to.to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such set"),
        })?;
        self.sets.insert(to.to_owned(), set);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.sets
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })
    }
}

/// A store that keeps one file per set inside a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    format: SetFormat,
}

impl FileStore {
    pub fn new(dir: &Path, format: SetFormat) -> Self {
        FileStore {
            dir: dir.to_owned(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(|c: char| c == '/' || c == '\\');
        if !valid {
            return Err(StoreError::PathResolution {
                key: key.to_owned(),
            });
        }
        Ok(self.dir.join(key))
    }
}

impl SetStore for FileStore {
    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let read_error = |source: std::io::Error| StoreError::Read {
            key: self.dir.display().to_string(),
            source,
        };
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut keys = vec![];
        for entry in std::fs::read_dir(&self.dir).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            if !entry.path().is_file() {
                continue;
            }
            // Leftover temporary files from an interrupted save start with a dot.
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    keys.push(name.to_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> bool {
        self.path(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn load(&self, key: &str) -> Result<Set, StoreError> {
        let path = self.path(key)?;
        let data = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    key: key.to_owned(),
                }
            } else {
                StoreError::Read {
                    key: key.to_owned(),
                    source,
                }
            }
        })?;
        self.format
            .decode(&data)
            .map_err(|message| StoreError::Parse {
                key: key.to_owned(),
                message,
            })
    }

    fn save(&mut self, key: &str, set: &Set) -> Result<(), StoreError> {
        use std::io::Write;
        let path = self.path(key)?;
        let write_error = |source: std::io::Error| StoreError::Write {
            key: key.to_owned(),
            source,
        };

        let data = self.format.encode(set).map_err(|e| {
            write_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        std::fs::create_dir_all(&self.dir).map_err(write_error)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        temp_file.write_all(&data).map_err(write_error)?;
        temp_file.as_file().sync_all().map_err(write_error)?;
        temp_file.persist(&path).map_err(|e| write_error(e.error))?;
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        let rename_error = |source: std::io::Error| StoreError::Rename {
            from: from.to_owned(),
            to: to.to_owned(),
            source,
        };
        let from_path = self.path(from)?;
        let to_path = self.path(to)?;
        std::fs::rename(from_path, to_path).map_err(rename_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path(key)?;
        std::fs::remove_file(path).map_err(|source| StoreError::Remove {
            key: key.to_owned(),
            source,
        })
    }
}

/// What a prune ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The pruned set was written to `key`.
    Persisted {
        key: String,
        backup_created: bool,
        remaining: usize,
    },
    /// A subset of this backup already exists at `key`, nothing was written.
    SubsetAlreadyExists { key: String },
}

/// A resolved prune, split into the backup phase and the write phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunePlan {
    /// Key the pruned set is written to.
    pub target: String,
    /// Rename `target` to its backup key before writing, only when no backup exists yet.
    pub backup: Option<(String, String)>,
    /// The pruned set.
    pub pruned: Set,
}

impl PrunePlan {
    /// Work out where a pruned copy of the set loaded from `key` goes.
    ///
    /// Returns `Ok(Err(outcome))` when the prune is refused because the derived subset exists.
    pub fn resolve(
        store: &dyn SetStore,
        key: &str,
        current: &Set,
        removal: &BTreeSet<usize>,
    ) -> Result<Result<PrunePlan, PruneOutcome>, StoreError> {
        let target = if is_backup_key(key) {
            let live = live_key(key).ok_or_else(|| StoreError::PathResolution {
                key: key.to_owned(),
            })?;
            if store.exists(live) {
                return Ok(Err(PruneOutcome::SubsetAlreadyExists {
                    key: live.to_owned(),
                }));
            }
            live.to_owned()
        } else {
            key.to_owned()
        };

        let backup = backup_key(&target);
        let backup = if store.exists(&backup) {
            None
        } else {
            Some((target.clone(), backup))
        };

        Ok(Ok(PrunePlan {
            target,
            backup,
            pruned: current.without(removal),
        }))
    }

    /// Phase one, move the live record to its backup key if there is no backup yet.
    pub fn backup(&self, store: &mut dyn SetStore) -> Result<bool, StoreError> {
        match &self.backup {
            Some((from, to)) => {
                store.rename(from, to)?;
                tracing::info!(from = from.as_str(), to = to.as_str(), "backed up set");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Phase two, write the pruned set over the live record.
    pub fn write(&self, store: &mut dyn SetStore) -> Result<(), StoreError> {
        store.save(&self.target, &self.pruned)
    }
}

/// Drop the pairs at `removal` from the set loaded from `key` and persist the result.
///
/// The first prune of a set renames its record to the backup key, so the original content is
/// kept exactly once. If the write fails after that rename the live record is missing until
/// the next successful save, the backup still holds the original.
pub fn persist_pruned_set(
    store: &mut dyn SetStore,
    key: &str,
    current: &Set,
    removal: &BTreeSet<usize>,
) -> Result<PruneOutcome, StoreError> {
    let plan = match PrunePlan::resolve(&*store, key, current, removal)? {
        Ok(plan) => plan,
        Err(refused) => {
            tracing::warn!(key, "subset of this set already exists, not pruning");
            return Ok(refused);
        }
    };
    let backup_created = plan.backup(store)?;
    plan.write(store).map_err(|e| {
        if backup_created {
            tracing::warn!(key = plan.target.as_str(), "write failed after backup: {e}");
        }
        e
    })?;
    tracing::info!(
        key = plan.target.as_str(),
        remaining = plan.pruned.len(),
        "persisted pruned set"
    );
    Ok(PruneOutcome::Persisted {
        key: plan.target,
        backup_created,
        remaining: plan.pruned.len(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::set::WordPair;

    pub(crate) fn sample_set() -> Set {
        let mut set = Set::new("english", "swedish");
        set.push(WordPair::new(&["ball", "sphere"], &["boll"]).unwrap());
        set.push(WordPair::new(&["spear"], &["spjut"]).unwrap());
        set.push(WordPair::new(&["house"], &["hus"]).unwrap());
        set
    }

    /// Store that fails on request, for the individual prune phases.
    #[derive(Debug, Default)]
    pub(crate) struct FaultyStore {
        pub inner: MemoryStore,
        pub fail_rename: bool,
        pub fail_save: bool,
    }

    fn injected() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, "injected")
    }

    impl SetStore for FaultyStore {
        fn list_keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_keys()
        }
        fn exists(&self, key: &str) -> bool {
            self.inner.exists(key)
        }
        fn load(&self, key: &str) -> Result<Set, StoreError> {
            self.inner.load(key)
        }
        fn save(&mut self, key: &str, set: &Set) -> Result<(), StoreError> {
            if self.fail_save {
                return Err(StoreError::Write {
                    key: key.to_owned(),
                    source: injected(),
                });
            }
            self.inner.save(key, set)
        }
        fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
            if self.fail_rename {
                return Err(StoreError::Rename {
                    from: from.to_owned(),
                    to: to.to_owned(),
                    source: injected(),
                });
            }
            self.inner.rename(from, to)
        }
        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    fn removal(indices: &[usize]) -> BTreeSet<usize> {
        indices.iter().copied().collect()
    }

    #[test]
    fn test_backup_keys() {
        assert_eq!(backup_key("words"), "words_original");
        assert!(is_backup_key("words_original"));
        assert!(!is_backup_key("words"));
        assert_eq!(live_key("words_original"), Some("words"));
        assert_eq!(live_key("_original"), None);
        assert_eq!(live_key("words"), None);
    }

    #[test]
    fn test_first_prune_creates_backup() {
        let mut store = MemoryStore::new();
        let set = sample_set();
        store.save("words", &set).unwrap();

        let outcome = persist_pruned_set(&mut store, "words", &set, &removal(&[1])).unwrap();
        assert_eq!(
            outcome,
            PruneOutcome::Persisted {
                key: "words".to_owned(),
                backup_created: true,
                remaining: 2
            }
        );
        assert_eq!(store.load("words_original").unwrap(), set);
        let live = store.load("words").unwrap();
        assert_eq!(live.len(), 2);
        assert_eq!(live.pairs()[1].forward(), &["house".to_owned()]);
    }

    #[test]
    fn test_second_prune_keeps_first_backup() {
        let mut store = MemoryStore::new();
        let set = sample_set();
        store.save("words", &set).unwrap();
        persist_pruned_set(&mut store, "words", &set, &removal(&[0])).unwrap();

        let live = store.load("words").unwrap();
        let outcome = persist_pruned_set(&mut store, "words", &live, &removal(&[0])).unwrap();
        assert_eq!(
            outcome,
            PruneOutcome::Persisted {
                key: "words".to_owned(),
                backup_created: false,
                remaining: 1
            }
        );
        assert_eq!(store.load("words_original").unwrap(), set);
        assert_eq!(store.load("words").unwrap().len(), 1);
    }

    #[test]
    fn test_prune_from_backup_once() {
        let mut store = MemoryStore::new();
        let set = sample_set();
        store.save("words_original", &set).unwrap();

        let outcome =
            persist_pruned_set(&mut store, "words_original", &set, &removal(&[2])).unwrap();
        assert_eq!(
            outcome,
            PruneOutcome::Persisted {
                key: "words".to_owned(),
                backup_created: false,
                remaining: 2
            }
        );
        assert_eq!(store.load("words_original").unwrap(), set);

        let outcome =
            persist_pruned_set(&mut store, "words_original", &set, &removal(&[0])).unwrap();
        assert_eq!(
            outcome,
            PruneOutcome::SubsetAlreadyExists {
                key: "words".to_owned()
            }
        );
        assert_eq!(store.load("words").unwrap().len(), 2);
    }

    #[test]
    fn test_bare_suffix_cannot_resolve() {
        let mut store = MemoryStore::new();
        let set = sample_set();
        store.save("_original", &set).unwrap();
        let res = persist_pruned_set(&mut store, "_original", &set, &removal(&[0]));
        assert!(matches!(res, Err(StoreError::PathResolution { .. })));
    }

    #[test]
    fn test_rename_failure_leaves_original() {
        let mut store = FaultyStore {
            fail_rename: true,
            ..Default::default()
        };
        let set = sample_set();
        store.inner.save("words", &set).unwrap();
        let res = persist_pruned_set(&mut store, "words", &set, &removal(&[0]));
        assert!(matches!(res, Err(StoreError::Rename { .. })));
        assert_eq!(store.load("words").unwrap(), set);
        assert!(!store.exists("words_original"));
    }

    #[test]
    fn test_write_failure_after_backup() {
        let mut store = FaultyStore {
            fail_save: true,
            ..Default::default()
        };
        let set = sample_set();
        store.inner.save("words", &set).unwrap();

        let plan = PrunePlan::resolve(&store, "words", &set, &removal(&[0]))
            .unwrap()
            .unwrap();
        assert!(plan.backup(&mut store).unwrap());
        assert!(matches!(plan.write(&mut store), Err(StoreError::Write { .. })));

        // The live record is gone until the next save, the backup has the original.
        assert!(!store.exists("words"));
        assert_eq!(store.load("words_original").unwrap(), set);

        store.fail_save = false;
        plan.write(&mut store).unwrap();
        assert_eq!(store.load("words").unwrap().len(), 2);
    }

    #[test]
    fn test_plan_skips_backup_when_present() {
        let mut store = MemoryStore::new();
        let set = sample_set();
        store.save("words", &set).unwrap();
        store.save("words_original", &set).unwrap();
        let plan = PrunePlan::resolve(&store, "words", &set, &removal(&[0]))
            .unwrap()
            .unwrap();
        assert_eq!(plan.backup, None);
        assert_eq!(plan.target, "words");
    }

    #[test]
    fn test_memory_store_basics() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.load("nope"),
            Err(StoreError::NotFound { .. })
        ));
        store.save("b", &sample_set()).unwrap();
        store.save("a", &sample_set()).unwrap();
        assert_eq!(store.list_keys().unwrap(), vec!["a", "b"]);
        store.remove("a").unwrap();
        assert!(!store.exists("a"));
    }

    #[test]
    fn test_file_store_round_trip() {
        for format in [SetFormat::Json, SetFormat::Yaml] {
            let dir = tempfile::TempDir::new().unwrap();
            let mut store = FileStore::new(&dir.path().join("Sets"), format);
            let set = sample_set();
            store.save("words", &set).unwrap();
            assert_eq!(store.list_keys().unwrap(), vec!["words"]);
            assert_eq!(store.load("words").unwrap(), set);
        }
    }

    #[test]
    fn test_file_store_prune() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path(), SetFormat::Json);
        let set = sample_set();
        store.save("words", &set).unwrap();
        persist_pruned_set(&mut store, "words", &set, &removal(&[0, 2])).unwrap();
        assert_eq!(
            store.list_keys().unwrap(),
            vec!["words", "words_original"]
        );
        assert_eq!(store.load("words_original").unwrap(), set);
        assert_eq!(store.load("words").unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_rejects_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path(), SetFormat::Json);
        assert!(matches!(
            store.save("../escape", &sample_set()),
            Err(StoreError::PathResolution { .. })
        ));
        assert!(matches!(
            store.load("missing"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_record_field_names() {
        let set = sample_set();
        let json = String::from_utf8(SetFormat::Json.encode(&set).unwrap()).unwrap();
        assert!(json.contains("\"languageA\": \"english\""));
        assert!(json.contains("\"languageB\": \"swedish\""));
        assert!(json.contains("\"pairs\""));
        assert!(json.contains("\"forward\""));
        assert!(json.contains("\"backward\""));
    }

    #[test]
    fn test_invalid_pairs_fail_to_load() {
        let records = [
            r#"{"languageA": "a", "languageB": "b", "pairs": [{"forward": [], "backward": ["boll"]}]}"#,
            r#"{"languageA": "a", "languageB": "b", "pairs": [{"forward": ["ball", " "], "backward": ["boll"]}]}"#,
            r#"{"languageA": "a", "languageB": "b", "pairs": [{"forward": ["Ball", "ball"], "backward": ["boll"]}]}"#,
            r#"{"languageA": "a", "languageB": "b"}"#,
        ];
        for record in records.iter() {
            assert!(SetFormat::Json.decode(record.as_bytes()).is_err(), "{record}");
        }

        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken"), records[0]).unwrap();
        let store = FileStore::new(dir.path(), SetFormat::Json);
        match store.load("broken") {
            Err(StoreError::Parse { message, .. }) => {
                assert!(message.contains("a pair needs words on both sides"), "{message}")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_loaded_pairs_are_normalized() {
        let json = r#"{"languageA": "a", "languageB": "b",
            "pairs": [{"forward": [" Ball "], "backward": ["BOLL"]}]}"#;
        let set = SetFormat::Json.decode(json.as_bytes()).unwrap();
        assert_eq!(set.pairs()[0].forward(), &["ball".to_owned()]);
        assert_eq!(set.pairs()[0].backward(), &["boll".to_owned()]);
    }

    #[test]
    fn test_reads_unknown_and_legacy_fields() {
        let json = r#"{
            "languageA": "english", "languageB": "swedish", "comment": "extra",
            "pairs": [{"forward": ["ball"], "backward": ["boll"], "score": 3}]
        }"#;
        let set = SetFormat::Json.decode(json.as_bytes()).unwrap();
        assert_eq!(set.len(), 1);

        let legacy = r#"{"random": {}, "AnswerPairs": [{"question": ["sphere", "ball"], "answer": ["boll"]}],
            "questionLanguage": "english", "answerLanguage": "swedish"}"#;
        let set = SetFormat::Json.decode(legacy.as_bytes()).unwrap();
        assert_eq!(set.language_a, "english");
        assert_eq!(set.language_b, "swedish");
        assert_eq!(set.pairs()[0].forward(), &["sphere".to_owned(), "ball".to_owned()]);
    }
}
