// In-memory provider shared by the controller and synchronizer tests.
#![allow(dead_code)]

use clientline::client::ProviderApi;
use clientline::config::ConfigResolver;
use clientline::controller::TimelineController;
use clientline::model::raw::{PostedComment, RawComment, RawStatus, RawUser};
use clientline::model::{DateStyle, ListMetadata, Normalizer, RawTask, StatusRules};
use clientline::storage::{KEY_API_KEY, KEY_LIST_ID, MemoryStore, SharedStore};
use clientline::visibility::VisibilityStore;
use clientline::{Result, TimelineError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct FakeProvider {
    pub tasks: Mutex<Vec<RawTask>>,
    pub metadata: Mutex<ListMetadata>,
    pub comments: Mutex<HashMap<String, Vec<RawComment>>>,
    /// (task id, body) of every accepted post.
    pub posted: Mutex<Vec<(String, String)>>,
    /// When set, task listing answers with this HTTP status.
    pub fail_tasks: Mutex<Option<u16>>,
    pub fail_comment_listing: AtomicBool,
    pub fail_posts: AtomicBool,
    pub requests: AtomicUsize,
}

impl FakeProvider {
    pub fn with_tasks(tasks: Vec<RawTask>) -> Self {
        let provider = Self::default();
        *provider.tasks.lock().unwrap() = tasks;
        *provider.metadata.lock().unwrap() = ListMetadata {
            name: "Website Redesign".to_string(),
            content: Some("Phase 1".to_string()),
        };
        provider
    }

    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn check(&self, credential: &str) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if credential.is_empty() {
            return Err(TimelineError::Config("credential is empty".into()));
        }
        Ok(())
    }
}

impl ProviderApi for FakeProvider {
    async fn list_tasks(&self, credential: &str, _list_id: &str) -> Result<Vec<RawTask>> {
        self.check(credential)?;
        if let Some(status) = *self.fail_tasks.lock().unwrap() {
            return Err(TimelineError::Provider {
                status,
                body: "unavailable".into(),
            });
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn get_list_metadata(&self, credential: &str, _list_id: &str) -> Result<ListMetadata> {
        self.check(credential)?;
        Ok(self.metadata.lock().unwrap().clone())
    }

    async fn list_comments(&self, credential: &str, task_id: &str) -> Result<Vec<RawComment>> {
        self.check(credential)?;
        if self.fail_comment_listing.load(Ordering::SeqCst) {
            return Err(TimelineError::Transport("connection reset".into()));
        }
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn post_comment(
        &self,
        credential: &str,
        task_id: &str,
        text: &str,
    ) -> Result<PostedComment> {
        self.check(credential)?;
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(TimelineError::Provider {
                status: 500,
                body: "boom".into(),
            });
        }
        let mut posted = self.posted.lock().unwrap();
        posted.push((task_id.to_string(), text.to_string()));
        let id = format!("c{}", posted.len());
        self.comments
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .push(RawComment {
                id: id.clone(),
                comment_text: text.to_string(),
                user: RawUser {
                    username: "api-user".to_string(),
                    ..Default::default()
                },
                date: "1700000000000".to_string(),
            });
        Ok(PostedComment {
            id: Some(id),
            date: Some("1700000000000".to_string()),
        })
    }
}

pub fn task(id: &str, label: &str, due: Option<i64>) -> RawTask {
    RawTask {
        id: id.to_string(),
        name: format!("Stage {id}"),
        status: RawStatus {
            status: label.to_string(),
            color: None,
        },
        due_date: due.map(|d| d.to_string()),
        ..Default::default()
    }
}

pub fn normalizer() -> Normalizer {
    Normalizer::new(StatusRules::default(), DateStyle::utc("%d/%m/%Y"))
}

pub fn configured_store() -> SharedStore {
    Arc::new(MemoryStore::with_entries([
        (KEY_API_KEY, "pk_test"),
        (KEY_LIST_ID, "901"),
    ]))
}

pub fn controller_with(
    provider: FakeProvider,
    store: SharedStore,
) -> TimelineController<FakeProvider> {
    let config = ConfigResolver::load(store.clone(), None, None).unwrap();
    let visibility = VisibilityStore::load(store).unwrap();
    TimelineController::new(provider, config, visibility, normalizer())
}

pub fn controller(provider: FakeProvider) -> TimelineController<FakeProvider> {
    controller_with(provider, configured_store())
}
