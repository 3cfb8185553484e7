//! In-memory records behind the development backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualTest {
    pub id: i64,
    pub description: String,
    pub createdat: DateTime<Utc>,
    pub updatedat: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub revrequestid: i64,
    pub instrument: String,
    pub requestedby: String,
    pub status: RevisionStatus,
    pub reason: Option<String>,
    pub remark: Option<String>,
    pub decidedat: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Allotted,
    Accepted,
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: i64,
    pub title: String,
    pub status: ItemStatus,
    pub updatedat: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct StoreInner {
    visual_tests: BTreeMap<i64, VisualTest>,
    revision_requests: BTreeMap<i64, RevisionRequest>,
    action_items: BTreeMap<i64, ActionItem>,
    next_visual_test_id: i64,
}

#[derive(Default)]
pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of records so the console has something to act on.
    pub async fn seeded() -> Self {
        let store = Self::new();
        store.insert_visual_test("Surface finish free of scratches").await;
        store.insert_visual_test("Markings legible").await;
        for (id, instrument, by) in [
            (1, "Pressure gauge PG-100", "lab-a"),
            (2, "Vernier caliper VC-150", "lab-b"),
        ] {
            store
                .insert_revision_request(RevisionRequest {
                    revrequestid: id,
                    instrument: instrument.into(),
                    requestedby: by.into(),
                    status: RevisionStatus::Pending,
                    reason: None,
                    remark: None,
                    decidedat: None,
                })
                .await;
        }
        for (id, title) in [(7, "Torque wrench TW-20"), (8, "Micrometer MM-25")] {
            store
                .insert_action_item(ActionItem {
                    id,
                    title: title.into(),
                    status: ItemStatus::Allotted,
                    updatedat: None,
                })
                .await;
        }
        store
    }

    pub async fn insert_visual_test(&self, description: &str) -> VisualTest {
        let mut inner = self.inner.lock().await;
        inner.next_visual_test_id += 1;
        let test = VisualTest {
            id: inner.next_visual_test_id,
            description: description.to_string(),
            createdat: Utc::now(),
            updatedat: None,
        };
        inner.visual_tests.insert(test.id, test.clone());
        test
    }

    pub async fn visual_test(&self, id: i64) -> Option<VisualTest> {
        self.inner.lock().await.visual_tests.get(&id).cloned()
    }

    pub async fn visual_tests(&self) -> Vec<VisualTest> {
        self.inner.lock().await.visual_tests.values().cloned().collect()
    }

    pub async fn find_visual_test_by_description(&self, description: &str) -> Option<VisualTest> {
        self.inner
            .lock()
            .await
            .visual_tests
            .values()
            .find(|t| t.description.eq_ignore_ascii_case(description))
            .cloned()
    }

    pub async fn update_visual_test(&self, id: i64, description: &str) -> Option<VisualTest> {
        let mut inner = self.inner.lock().await;
        let test = inner.visual_tests.get_mut(&id)?;
        test.description = description.to_string();
        test.updatedat = Some(Utc::now());
        Some(test.clone())
    }

    pub async fn insert_revision_request(&self, request: RevisionRequest) {
        self.inner
            .lock()
            .await
            .revision_requests
            .insert(request.revrequestid, request);
    }

    pub async fn revision_request(&self, id: i64) -> Option<RevisionRequest> {
        self.inner.lock().await.revision_requests.get(&id).cloned()
    }

    pub async fn revision_requests(&self) -> Vec<RevisionRequest> {
        self.inner
            .lock()
            .await
            .revision_requests
            .values()
            .cloned()
            .collect()
    }

    /// Applies `decide` to the request under the store lock.
    pub async fn modify_revision_request<T>(
        &self,
        id: i64,
        decide: impl FnOnce(&mut RevisionRequest) -> T,
    ) -> Option<T> {
        let mut inner = self.inner.lock().await;
        inner.revision_requests.get_mut(&id).map(decide)
    }

    pub async fn insert_action_item(&self, item: ActionItem) {
        self.inner.lock().await.action_items.insert(item.id, item);
    }

    pub async fn action_item(&self, id: i64) -> Option<ActionItem> {
        self.inner.lock().await.action_items.get(&id).cloned()
    }

    pub async fn action_items(&self) -> Vec<ActionItem> {
        self.inner
            .lock()
            .await
            .action_items
            .values()
            .cloned()
            .collect()
    }

    pub async fn modify_action_item<T>(
        &self,
        id: i64,
        change: impl FnOnce(&mut ActionItem) -> T,
    ) -> Option<T> {
        let mut inner = self.inner.lock().await;
        inner.action_items.get_mut(&id).map(change)
    }
}
