use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tt_documents::DocumentStore;
use tt_records::{RecordStore, UnitOfWork};
use tt_types::{Planter, TreeCapture, TreeCaptureId, TreeServiceData};

use crate::config::TreeServiceConfig;
use crate::error::{TreeServiceError, TreeServiceResult};
use crate::resolver::resolve_latest;

/// Records new tree captures for a planter.
#[async_trait]
pub trait TreeService: Send + Sync {
    /// Store the photo, create a tree capture linked to the planter's latest
    /// identification, and commit it.
    async fn save_tree(
        &self,
        data: TreeServiceData,
        planter: &dyn Planter,
    ) -> TreeServiceResult<TreeCapture>;
}

/// Tree service backed by a local record store and document store.
pub struct LocalTreeService {
    records: Arc<dyn RecordStore>,
    documents: Arc<dyn DocumentStore>,
    config: TreeServiceConfig,
}

impl LocalTreeService {
    pub fn new(records: Arc<dyn RecordStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            records,
            documents,
            config: TreeServiceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TreeServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TreeServiceConfig {
        &self.config
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }
}

#[async_trait]
impl TreeService for LocalTreeService {
    async fn save_tree(
        &self,
        data: TreeServiceData,
        planter: &dyn Planter,
    ) -> TreeServiceResult<TreeCapture> {
        let planter = planter.as_persisted().ok_or(TreeServiceError::Planter)?;
        let mut work = UnitOfWork::new(self.records.as_ref());
        if work.planter(&planter.id)?.is_none() {
            return Err(TreeServiceError::Planter);
        }

        let identifications = work.identifications_of(&planter.id)?;
        let identification = resolve_latest(&identifications)
            .map(|latest| latest.id.clone())
            .ok_or(TreeServiceError::Identification)?;

        let id = TreeCaptureId::new();
        let photo = self
            .documents
            .store(&data.image, &id.as_key())
            .await
            .map_err(TreeServiceError::DocumentStorage)?;

        let tree = TreeCapture::new(
            id.clone(),
            &data.location,
            photo.clone(),
            identification.clone(),
        );
        work.insert_tree_capture(tree.clone());
        work.link_tree_capture(&identification, &id);

        if let Err(e) = work.commit().await {
            self.config
                .orphaned_photos
                .discard(self.documents.as_ref(), &photo)
                .await;
            return Err(e.into());
        }

        info!(
            tree = %tree.id,
            planter = %planter.id,
            identification = %identification,
            "tree capture saved"
        );
        Ok(tree)
    }
}

impl std::fmt::Debug for LocalTreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTreeService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tt_documents::{DocumentError, DocumentResult, FsDocumentStore, InMemoryDocumentStore};
    use tt_records::{
        ChangeSet, CommitSummary, InMemoryRecordStore, JsonFileRecordStore, RecordError,
        RecordResult,
    };
    use tt_types::{
        DetachedPlanter, DocumentRef, Identification, IdentificationId, Location, PlanterDetail,
        PlanterId, PlanterProfile,
    };

    use crate::config::OrphanedPhotoPolicy;

    const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    fn capture_data() -> TreeServiceData {
        TreeServiceData::new(IMAGE.to_vec(), Location::new(1.0, 2.0, 5.0))
    }

    /// Commit a planter with one identification per entry of `dates`.
    async fn seed_planter(
        records: &dyn RecordStore,
        dates: &[Option<DateTime<Utc>>],
    ) -> (PlanterDetail, Vec<IdentificationId>) {
        let mut work = UnitOfWork::new(records);
        let planter_id = work.insert_planter(PlanterDetail::new(PlanterProfile {
            first_name: Some("Ana".into()),
            ..Default::default()
        }));
        let ids = dates
            .iter()
            .map(|date| {
                work.insert_identification(Identification {
                    created_at: *date,
                    ..Identification::new(planter_id.clone())
                })
            })
            .collect();
        work.commit().await.unwrap();
        (records.planter(&planter_id).unwrap().unwrap(), ids)
    }

    struct FailingDocuments;

    #[async_trait]
    impl DocumentStore for FailingDocuments {
        async fn store(&self, _data: &[u8], _key: &str) -> DocumentResult<DocumentRef> {
            Err(DocumentError::Io(io::Error::other("disk full")))
        }

        async fn read(&self, _reference: &DocumentRef) -> DocumentResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn remove(&self, _reference: &DocumentRef) -> DocumentResult<bool> {
            Ok(false)
        }
    }

    /// Reads from a real store; every commit fails.
    struct RejectingRecords {
        inner: InMemoryRecordStore,
        attempts: AtomicU64,
    }

    impl RejectingRecords {
        fn new() -> Self {
            Self {
                inner: InMemoryRecordStore::new(),
                attempts: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl RecordStore for RejectingRecords {
        fn planter(&self, id: &PlanterId) -> RecordResult<Option<PlanterDetail>> {
            self.inner.planter(id)
        }

        fn identification(&self, id: &IdentificationId) -> RecordResult<Option<Identification>> {
            self.inner.identification(id)
        }

        fn tree_capture(&self, id: &TreeCaptureId) -> RecordResult<Option<TreeCapture>> {
            self.inner.tree_capture(id)
        }

        fn planters(&self) -> RecordResult<Vec<PlanterDetail>> {
            self.inner.planters()
        }

        fn tree_captures(&self) -> RecordResult<Vec<TreeCapture>> {
            self.inner.tree_captures()
        }

        fn identifications_of(&self, planter: &PlanterId) -> RecordResult<Vec<Identification>> {
            self.inner.identifications_of(planter)
        }

        async fn commit(&self, _changes: ChangeSet) -> RecordResult<CommitSummary> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RecordError::ConstraintViolation("store is full".into()))
        }
    }

    /// Reads from a fixed store; commits are counted and dropped.
    struct DiscardingRecords {
        inner: InMemoryRecordStore,
        commits: AtomicU64,
    }

    #[async_trait]
    impl RecordStore for DiscardingRecords {
        fn planter(&self, id: &PlanterId) -> RecordResult<Option<PlanterDetail>> {
            self.inner.planter(id)
        }

        fn identification(&self, id: &IdentificationId) -> RecordResult<Option<Identification>> {
            self.inner.identification(id)
        }

        fn tree_capture(&self, id: &TreeCaptureId) -> RecordResult<Option<TreeCapture>> {
            self.inner.tree_capture(id)
        }

        fn planters(&self) -> RecordResult<Vec<PlanterDetail>> {
            self.inner.planters()
        }

        fn tree_captures(&self) -> RecordResult<Vec<TreeCapture>> {
            self.inner.tree_captures()
        }

        fn identifications_of(&self, planter: &PlanterId) -> RecordResult<Vec<Identification>> {
            self.inner.identifications_of(planter)
        }

        async fn commit(&self, changes: ChangeSet) -> RecordResult<CommitSummary> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(CommitSummary {
                inserted: changes.len(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn saves_to_latest_identification() {
        let records = Arc::new(InMemoryRecordStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let (planter, ids) = seed_planter(&*records, &[Some(day(1)), Some(day(3))]).await;
        let service = LocalTreeService::new(records.clone(), documents.clone());

        let tree = service.save_tree(capture_data(), &planter).await.unwrap();

        assert_eq!(tree.identification, ids[1]);
        assert!(!tree.uploaded);
        assert_eq!(tree.location(), Location::new(1.0, 2.0, 5.0));
        assert!(!tree.photo.is_empty());

        let latest = records.identification(&ids[1]).unwrap().unwrap();
        assert!(latest.trees.contains(&tree.id));
        let earlier = records.identification(&ids[0]).unwrap().unwrap();
        assert!(earlier.trees.is_empty());
        assert_eq!(records.tree_capture(&tree.id).unwrap(), Some(tree.clone()));
        assert_eq!(
            documents.read(&tree.photo).await.unwrap().as_deref(),
            Some(IMAGE)
        );
    }

    #[tokio::test]
    async fn undated_identifications_are_ignored() {
        let records = Arc::new(InMemoryRecordStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let (planter, ids) = seed_planter(&*records, &[None, Some(day(0)), None]).await;
        let service = LocalTreeService::new(records, documents);

        let tree = service.save_tree(capture_data(), &planter).await.unwrap();
        assert_eq!(tree.identification, ids[1]);
    }

    #[tokio::test]
    async fn planter_without_identifications_writes_nothing() {
        let records = Arc::new(InMemoryRecordStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let (planter, _) = seed_planter(&*records, &[]).await;
        let commits_before = records.commit_count();
        let service = LocalTreeService::new(records.clone(), documents.clone());

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();

        assert!(matches!(err, TreeServiceError::Identification));
        assert!(documents.is_empty());
        assert_eq!(records.commit_count(), commits_before);
    }

    #[tokio::test]
    async fn only_undated_identifications_is_an_identification_error() {
        let records = Arc::new(InMemoryRecordStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let (planter, _) = seed_planter(&*records, &[None, None]).await;
        let service = LocalTreeService::new(records, documents.clone());

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::Identification));
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn document_failure_commits_nothing() {
        let records = Arc::new(InMemoryRecordStore::new());
        let (planter, _) = seed_planter(&*records, &[Some(day(1))]).await;
        let commits_before = records.commit_count();
        let service = LocalTreeService::new(records.clone(), Arc::new(FailingDocuments));

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();

        match err {
            TreeServiceError::DocumentStorage(DocumentError::Io(source)) => {
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(records.commit_count(), commits_before);
        assert!(records.tree_captures().unwrap().is_empty());
    }

    #[tokio::test]
    async fn detached_planter_is_rejected() {
        let records = Arc::new(InMemoryRecordStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let service = LocalTreeService::new(records, documents.clone());
        let planter = DetachedPlanter::new(PlanterProfile::default());

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::Planter));
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn unknown_persisted_planter_is_rejected() {
        let records = Arc::new(InMemoryRecordStore::new());
        let documents = Arc::new(InMemoryDocumentStore::new());
        let service = LocalTreeService::new(records.clone(), documents.clone());
        let planter = PlanterDetail::new(PlanterProfile::default());

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::Planter));
        assert!(documents.is_empty());
        assert_eq!(records.commit_count(), 0);
    }

    #[tokio::test]
    async fn commit_error_surfaces_unmodified() {
        let records = Arc::new(RejectingRecords::new());
        let (planter, _) = seed_planter(&records.inner, &[Some(day(1))]).await;
        let documents = Arc::new(InMemoryDocumentStore::new());
        let service = LocalTreeService::new(records.clone(), documents.clone());

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();

        assert_eq!(err.to_string(), "constraint violation: store is full");
        match err {
            TreeServiceError::Record(RecordError::ConstraintViolation(message)) => {
                assert_eq!(message, "store is full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(records.attempts.load(Ordering::SeqCst), 1);
        // Default policy keeps the photo.
        assert_eq!(documents.len(), 1);
    }

    #[tokio::test]
    async fn remove_policy_cleans_up_orphaned_photo() {
        let records = Arc::new(RejectingRecords::new());
        let (planter, _) = seed_planter(&records.inner, &[Some(day(1))]).await;
        let documents = Arc::new(InMemoryDocumentStore::new());
        let service = LocalTreeService::new(records, documents.clone()).with_config(
            TreeServiceConfig {
                orphaned_photos: OrphanedPhotoPolicy::Remove,
            },
        );

        let err = service.save_tree(capture_data(), &planter).await.unwrap_err();
        assert!(matches!(err, TreeServiceError::Record(_)));
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn ten_thousand_saves_have_unique_ids() {
        let inner = InMemoryRecordStore::new();
        let (planter, _) = seed_planter(&inner, &[Some(day(1))]).await;
        let records = Arc::new(DiscardingRecords {
            inner,
            commits: AtomicU64::new(0),
        });
        let documents = Arc::new(InMemoryDocumentStore::new());
        let service = LocalTreeService::new(records.clone(), documents.clone());

        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let tree = service.save_tree(capture_data(), &planter).await.unwrap();
            assert!(!tree.photo.is_empty());
            assert!(ids.insert(tree.id));
        }
        assert_eq!(documents.len(), 10_000);
        assert_eq!(records.commits.load(Ordering::SeqCst), 10_000);
    }

    #[tokio::test]
    async fn file_backed_save_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let records_path = dir.path().join("records.json");
        let photos = dir.path().join("photos");

        let records = Arc::new(JsonFileRecordStore::open(&records_path).unwrap());
        let (planter, ids) = seed_planter(&*records, &[Some(day(2))]).await;
        let service = LocalTreeService::new(records, Arc::new(FsDocumentStore::new(&photos)));
        let tree = service.save_tree(capture_data(), &planter).await.unwrap();
        drop(service);

        let reopened = JsonFileRecordStore::open(&records_path).unwrap();
        let stored = reopened.tree_capture(&tree.id).unwrap().unwrap();
        assert_eq!(stored.identification, ids[0]);
        assert_eq!(std::fs::read(stored.photo.as_str()).unwrap(), IMAGE);
    }
}
