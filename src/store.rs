use crate::models::{FeedStatus, Status, Violation};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct StoreData {
    violations: Vec<Violation>,
    status: FeedStatus,
}

/// In-memory canonical violation list.
///
/// Only the fetcher (`replace_batch`, `record_failure`) and `mark_paid` write
/// to it; everything else reads cloned snapshots. A paid override lives only
/// until the next fetched batch replaces the list.
#[derive(Clone, Debug)]
pub struct ViolationStore {
    data: Arc<Mutex<StoreData>>,
}

impl Default for ViolationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViolationStore {
    pub fn new() -> Self {
        let data = StoreData {
            violations: Vec::new(),
            status: FeedStatus {
                loading: true,
                ..FeedStatus::default()
            },
        };
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn snapshot(&self) -> Vec<Violation> {
        self.data.lock().await.violations.clone()
    }

    pub async fn find(&self, id: &str) -> Option<Violation> {
        let data = self.data.lock().await;
        data.violations.iter().find(|v| v.id.matches(id)).cloned()
    }

    pub async fn feed_status(&self) -> FeedStatus {
        self.data.lock().await.status.clone()
    }

    pub async fn replace_batch(&self, violations: Vec<Violation>) {
        let mut data = self.data.lock().await;
        data.status = FeedStatus {
            loading: false,
            last_error: None,
            last_updated: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            count: violations.len(),
        };
        data.violations = violations;
    }

    pub async fn record_failure(&self, message: impl Into<String>) {
        let mut data = self.data.lock().await;
        data.status.loading = false;
        data.status.last_error = Some(message.into());
    }

    /// Marks the matching record as paid. Returns `false` when no record has
    /// that id; repeating the call leaves the record paid.
    pub async fn mark_paid(&self, id: &str) -> bool {
        let mut data = self.data.lock().await;
        match data.violations.iter_mut().find(|v| v.id.matches(id)) {
            Some(violation) => {
                violation.status = Status::Paid;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Proof, ViolationId, ViolationType};

    fn record(id: ViolationId, status: Status) -> Violation {
        Violation {
            id,
            name: "N/A".to_string(),
            vehicle: "N/A".to_string(),
            kind: ViolationType::Other,
            area: "Unknown Area".to_string(),
            date: "2026-01-01".to_string(),
            fine: 500,
            status,
            speed: None,
            camera: None,
            proof: Proof::default(),
        }
    }

    #[tokio::test]
    async fn mark_paid_touches_only_the_target() {
        let store = ViolationStore::new();
        store
            .replace_batch(vec![
                record(ViolationId::Number(1), Status::Pending),
                record(ViolationId::Text("V-2".to_string()), Status::Overdue),
            ])
            .await;

        assert!(store.mark_paid("V-2").await);
        assert!(store.mark_paid("V-2").await);

        let list = store.snapshot().await;
        assert_eq!(list[0], record(ViolationId::Number(1), Status::Pending));
        assert_eq!(list[1], record(ViolationId::Text("V-2".to_string()), Status::Paid));
    }

    #[tokio::test]
    async fn mark_paid_unknown_id_is_noop() {
        let store = ViolationStore::new();
        store.replace_batch(vec![record(ViolationId::Number(1), Status::Pending)]).await;

        assert!(!store.mark_paid("99").await);
        assert_eq!(store.snapshot().await[0].status, Status::Pending);
    }

    #[tokio::test]
    async fn next_batch_overwrites_local_override() {
        let store = ViolationStore::new();
        store.replace_batch(vec![record(ViolationId::Number(1), Status::Pending)]).await;
        store.mark_paid("1").await;
        store.replace_batch(vec![record(ViolationId::Number(1), Status::Pending)]).await;

        assert_eq!(store.find("1").await.map(|v| v.status), Some(Status::Pending));
    }

    #[tokio::test]
    async fn failure_keeps_last_good_list() {
        let store = ViolationStore::new();
        assert!(store.feed_status().await.loading);
        store.replace_batch(vec![record(ViolationId::Number(1), Status::Pending)]).await;
        store.record_failure("HTTP error! status: 500").await;

        let status = store.feed_status().await;
        assert!(!status.loading);
        assert_eq!(status.last_error.as_deref(), Some("HTTP error! status: 500"));
        assert_eq!(store.snapshot().await.len(), 1);

        store.replace_batch(Vec::new()).await;
        assert!(store.feed_status().await.last_error.is_none());
    }
}
