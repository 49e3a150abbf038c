use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tt_types::{
    Identification, IdentificationId, PlanterDetail, PlanterId, TreeCapture, TreeCaptureId,
};

use crate::change::{ChangeSet, CommitSummary};
use crate::error::{RecordError, RecordResult};
use crate::state::RecordState;
use crate::traits::RecordStore;

/// Current on-disk snapshot format.
const SNAPSHOT_VERSION: u32 = 1;

/// On-disk format: the full record set as one JSON document.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    planters: Vec<PlanterDetail>,
    identifications: Vec<Identification>,
    tree_captures: Vec<TreeCapture>,
}

impl Snapshot {
    fn of(state: &RecordState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            planters: state.planters().cloned().collect(),
            identifications: state.identifications().cloned().collect(),
            tree_captures: state.tree_captures().cloned().collect(),
        }
    }

    fn into_state(self) -> RecordResult<RecordState> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RecordError::Serialization(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        RecordState::from_records(self.planters, self.identifications, self.tree_captures)
    }
}

/// Record store persisted as a single JSON snapshot file.
///
/// Every commit applies the change set to a copy of the state, writes the
/// whole copy to a temporary file next to the target and renames it into
/// place. The in-memory state is swapped only after the rename succeeded, so
/// a failed commit leaves both the file and the readers' view unchanged.
/// Commits are serialized; reads never wait for file I/O.
pub struct JsonFileRecordStore {
    path: PathBuf,
    inner: RwLock<RecordState>,
    commit_lock: tokio::sync::Mutex<()>,
}

impl JsonFileRecordStore {
    /// Open the snapshot at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> RecordResult<Self> {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| RecordError::Serialization(e.to_string()))?;
                snapshot.into_state()?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => RecordState::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), records = state.len(), "record store opened");
        Ok(Self {
            path,
            inner: RwLock::new(state),
            commit_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&RecordState) -> T) -> RecordResult<T> {
        let state = self.inner.read().map_err(|_| RecordError::LockPoisoned)?;
        Ok(f(&state))
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    fn planter(&self, id: &PlanterId) -> RecordResult<Option<PlanterDetail>> {
        self.read(|state| state.planter(id).cloned())
    }

    fn identification(&self, id: &IdentificationId) -> RecordResult<Option<Identification>> {
        self.read(|state| state.identification(id).cloned())
    }

    fn tree_capture(&self, id: &TreeCaptureId) -> RecordResult<Option<TreeCapture>> {
        self.read(|state| state.tree_capture(id).cloned())
    }

    fn planters(&self) -> RecordResult<Vec<PlanterDetail>> {
        self.read(|state| state.planters().cloned().collect())
    }

    fn tree_captures(&self) -> RecordResult<Vec<TreeCapture>> {
        self.read(|state| state.tree_captures().cloned().collect())
    }

    fn identifications_of(&self, planter: &PlanterId) -> RecordResult<Vec<Identification>> {
        self.read(|state| {
            state
                .identifications_of(planter)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    async fn commit(&self, changes: ChangeSet) -> RecordResult<CommitSummary> {
        let _serialized = self.commit_lock.lock().await;

        let (next, summary) = {
            let state = self.inner.read().map_err(|_| RecordError::LockPoisoned)?;
            let mut next = state.clone();
            let summary = next.apply(&changes)?;
            (next, summary)
        };

        let encoded = serde_json::to_vec_pretty(&Snapshot::of(&next))
            .map_err(|e| RecordError::Serialization(e.to_string()))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &encoded))
            .await
            .map_err(|e| io::Error::other(e.to_string()))??;

        *self.inner.write().map_err(|_| RecordError::LockPoisoned)? = next;
        debug!(path = %self.path.display(), mutations = changes.len(), "records committed");
        Ok(summary)
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl std::fmt::Debug for JsonFileRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileRecordStore")
            .field("path", &self.path)
            .field(
                "record_count",
                &self.inner.read().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Mutation;
    use tt_types::{DocumentRef, Location, PlanterProfile};

    fn seed_changes() -> (PlanterDetail, Identification, TreeCapture, ChangeSet) {
        let planter = PlanterDetail::new(PlanterProfile {
            email: Some("p@example.org".into()),
            ..Default::default()
        });
        let identification = Identification::new(planter.id.clone());
        let tree = TreeCapture::new(
            TreeCaptureId::new(),
            &Location::new(1.0, 2.0, 5.0),
            DocumentRef::new("/photos/t.png"),
            identification.id.clone(),
        );
        let changes = vec![
            Mutation::InsertPlanter(planter.clone()),
            Mutation::InsertIdentification(identification.clone()),
            Mutation::InsertTreeCapture(tree.clone()),
            Mutation::LinkTreeCapture {
                identification: identification.id.clone(),
                tree: tree.id.clone(),
            },
        ]
        .into_iter()
        .collect();
        (planter, identification, tree, changes)
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRecordStore::open(dir.path().join("records.json")).unwrap();
        assert!(store.planters().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.json");
        let (planter, identification, tree, changes) = seed_changes();

        let store = JsonFileRecordStore::open(&path).unwrap();
        store.commit(changes).await.unwrap();
        drop(store);

        let reopened = JsonFileRecordStore::open(&path).unwrap();
        let stored_planter = reopened.planter(&planter.id).unwrap().unwrap();
        assert!(stored_planter.identifications.contains(&identification.id));
        let stored_tree = reopened.tree_capture(&tree.id).unwrap().unwrap();
        assert_eq!(stored_tree, tree);
        assert_eq!(reopened.identifications_of(&planter.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_commit_does_not_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = JsonFileRecordStore::open(&path).unwrap();
        let (planter, _, _, changes) = seed_changes();
        store.commit(changes).await.unwrap();
        let before = fs::read(&path).unwrap();

        let mut duplicate = planter.clone();
        duplicate.identifications.clear();
        let bad: ChangeSet = vec![Mutation::InsertPlanter(duplicate)].into_iter().collect();
        assert!(store.commit(bad).await.is_err());

        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = JsonFileRecordStore::open(&path).unwrap_err();
        assert!(matches!(err, RecordError::Serialization(_)));
    }

    #[tokio::test]
    async fn repeated_ids_in_snapshot_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let (planter, _, _, changes) = seed_changes();
        JsonFileRecordStore::open(&path)
            .unwrap()
            .commit(changes)
            .await
            .unwrap();

        let mut snapshot: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let mut twin = serde_json::to_value(&planter).unwrap();
        twin["profile"]["email"] = "twin@example.org".into();
        snapshot["planters"].as_array_mut().unwrap().push(twin);
        fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let err = JsonFileRecordStore::open(&path).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateKey { .. }));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(
            &path,
            br#"{"version":99,"planters":[],"identifications":[],"tree_captures":[]}"#,
        )
        .unwrap();
        let err = JsonFileRecordStore::open(&path).unwrap_err();
        assert!(matches!(err, RecordError::Serialization(_)));
    }
}
