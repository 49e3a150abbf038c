use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tt_documents::DocumentStore;
use tt_types::DocumentRef;

/// What to do with a freshly stored photo when the record commit fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanedPhotoPolicy {
    /// Leave the photo in the document store.
    #[default]
    Keep,
    /// Remove it on a best-effort basis. Cleanup failures are only logged.
    Remove,
}

impl OrphanedPhotoPolicy {
    /// Apply the policy to a photo whose record never got committed.
    pub async fn discard(self, documents: &dyn DocumentStore, photo: &DocumentRef) {
        if self != Self::Remove {
            return;
        }
        match documents.remove(photo).await {
            Ok(removed) => debug!(%photo, removed, "orphaned photo cleaned up"),
            Err(e) => warn!(%photo, error = %e, "failed to remove orphaned photo"),
        }
    }
}

/// Tree service configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeServiceConfig {
    pub orphaned_photos: OrphanedPhotoPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tt_documents::InMemoryDocumentStore;

    #[test]
    fn default_keeps_orphans() {
        assert_eq!(
            TreeServiceConfig::default().orphaned_photos,
            OrphanedPhotoPolicy::Keep
        );
    }

    #[tokio::test]
    async fn discard_follows_policy() {
        let documents = InMemoryDocumentStore::new();
        let photo = documents.store(b"img", "orphan").await.unwrap();

        OrphanedPhotoPolicy::Keep.discard(&documents, &photo).await;
        assert!(documents.exists(&photo).await.unwrap());

        OrphanedPhotoPolicy::Remove.discard(&documents, &photo).await;
        assert!(documents.is_empty());

        // Already gone: nothing to do, nothing to fail.
        OrphanedPhotoPolicy::Remove.discard(&documents, &photo).await;
    }

    #[test]
    fn parses_from_toml() {
        let config: TreeServiceConfig = toml::from_str(r#"orphaned_photos = "remove""#).unwrap();
        assert_eq!(config.orphaned_photos, OrphanedPhotoPolicy::Remove);

        let empty: TreeServiceConfig = toml::from_str("").unwrap();
        assert_eq!(empty, TreeServiceConfig::default());
    }
}
