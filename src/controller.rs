// File: src/controller.rs
//! Orchestration for the client timeline.
//! Front-ends delegate every action here: loading the list, posting comments
//! and approvals, and curating which stages the client sees.
//!
//! Each fetch is tagged with a generation number. A result whose generation
//! is older than the latest request is discarded, so a slow response can
//! never overwrite a newer one.
use crate::client::ProviderApi;
use crate::config::{Config, ConfigResolver};
use crate::error::{Result, TimelineError};
use crate::model::adapter::Normalizer;
use crate::model::display::TimelineSummary;
use crate::model::item::{Comment, TimelineItem};
use crate::model::raw::{ListMetadata, RawTask};
use crate::sync::{CommentSynchronizer, Submission};
use crate::visibility::VisibilityStore;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// The single user-visible notification an operation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(title: &str, err: &TimelineError) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            message: err.to_string(),
        }
    }
}

/// What the timeline page displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineView {
    pub list_name: String,
    pub list_content: Option<String>,
    /// Every task, ordered, with visibility resolved.
    pub items: Vec<TimelineItem>,
}

impl TimelineView {
    pub fn visible_items(&self) -> impl Iterator<Item = &TimelineItem> {
        self.items.iter().filter(|item| item.visible)
    }

    pub fn summary(&self) -> TimelineSummary {
        TimelineSummary::from_items(self.visible_items())
    }

    pub fn item(&self, id: &str) -> Option<&TimelineItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(TimelineView),
    Failed(String),
}

/// One row of the administrator listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTask {
    pub id: String,
    pub name: String,
    pub status: String,
    /// Plain membership in the visibility set.
    pub visible: bool,
}

#[derive(Debug, Clone)]
struct Snapshot {
    metadata: ListMetadata,
    tasks: Vec<RawTask>,
}

/// Handle for one in-flight timeline fetch.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    config: Config,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tasks and list metadata are requested concurrently.
    pub async fn fetch<P: ProviderApi>(self, provider: &P) -> LoadOutcome {
        let Config {
            credential,
            list_id,
        } = &self.config;
        let result = futures::try_join!(
            provider.list_tasks(credential, list_id),
            provider.get_list_metadata(credential, list_id)
        );
        LoadOutcome {
            generation: self.generation,
            result: result.map(|(tasks, metadata)| (metadata, tasks)),
        }
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    generation: u64,
    result: Result<(ListMetadata, Vec<RawTask>)>,
}

/// Handle for one in-flight comment refresh.
#[derive(Debug)]
pub struct RefreshTicket {
    task_id: String,
    generation: u64,
    view_generation: u64,
    credential: String,
}

impl RefreshTicket {
    pub async fn fetch<P: ProviderApi>(
        self,
        provider: &P,
        normalizer: &Normalizer,
    ) -> RefreshOutcome {
        let result = CommentSynchronizer::new(provider, normalizer)
            .refresh_comments(&self.credential, &self.task_id)
            .await;
        RefreshOutcome {
            task_id: self.task_id,
            generation: self.generation,
            view_generation: self.view_generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct RefreshOutcome {
    task_id: String,
    generation: u64,
    view_generation: u64,
    result: Result<Vec<Comment>>,
}

#[derive(Debug)]
pub struct TimelineController<P> {
    provider: P,
    config: ConfigResolver,
    visibility: VisibilityStore,
    normalizer: Normalizer,
    state: LoadState,
    snapshot: Option<Snapshot>,
    /// Comments fetched after the snapshot, replacing the snapshot's per task.
    comment_overrides: HashMap<String, Vec<Comment>>,
    load_generation: u64,
    /// Generation of the fetch that produced `snapshot`.
    view_generation: u64,
    comment_generations: HashMap<String, u64>,
    notices: Vec<Notice>,
}

impl<P: ProviderApi> TimelineController<P> {
    pub fn new(
        provider: P,
        config: ConfigResolver,
        visibility: VisibilityStore,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            provider,
            config,
            visibility,
            normalizer,
            state: LoadState::Loading,
            snapshot: None,
            comment_overrides: HashMap::new(),
            load_generation: 0,
            view_generation: 0,
            comment_generations: HashMap::new(),
            notices: Vec::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &ConfigResolver {
        &self.config
    }

    pub fn visibility(&self) -> &VisibilityStore {
        &self.visibility
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn view(&self) -> Option<&TimelineView> {
        match &self.state {
            LoadState::Ready(view) => Some(view),
            _ => None,
        }
    }

    /// Drains the notices produced since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn record_load_failure(&mut self, err: &TimelineError) {
        log::warn!("Timeline load failed ({}): {}", err.kind(), err);
        self.notices.push(Notice::error("Could not load timeline", err));
        if !matches!(self.state, LoadState::Ready(_)) {
            self.state = LoadState::Failed(err.to_string());
        }
    }

    /// Starts a fetch. Any fetch started earlier becomes stale.
    ///
    /// Fails with a configuration error, before any I/O, when the credential
    /// or the list id is missing.
    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        let config = self.config.current();
        if let Err(e) = config.require() {
            self.record_load_failure(&e);
            return Err(e);
        }
        self.load_generation += 1;
        if self.snapshot.is_none() {
            self.state = LoadState::Loading;
        }
        log::debug!("Starting load generation {}", self.load_generation);
        Ok(LoadTicket {
            generation: self.load_generation,
            config,
        })
    }

    /// Applies a fetch result. Returns `Ok(false)` when the outcome was
    /// superseded by a newer request and has been dropped.
    ///
    /// A failure on the first load moves to [`LoadState::Failed`]; after
    /// that, failures keep the previous view and only raise a notice.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> Result<bool> {
        if outcome.generation != self.load_generation {
            log::debug!(
                "Discarding stale load generation {} (latest {})",
                outcome.generation,
                self.load_generation
            );
            return Ok(false);
        }
        match outcome.result {
            Ok((metadata, tasks)) => {
                log::info!("Loaded {} task(s) from '{}'", tasks.len(), metadata.name);
                self.snapshot = Some(Snapshot { metadata, tasks });
                self.comment_overrides.clear();
                self.view_generation = outcome.generation;
                self.rebuild_view();
                Ok(true)
            }
            Err(e) => {
                self.record_load_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        let ticket = self.begin_load()?;
        let outcome = ticket.fetch(&self.provider).await;
        self.finish_load(outcome).map(|_| ())
    }

    /// Re-derives the displayed items from the last snapshot, the current
    /// visibility set and any refreshed comments.
    fn rebuild_view(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let mut items = self
            .normalizer
            .normalize(&snapshot.tasks, self.visibility.set());
        for item in &mut items {
            if let Some(comments) = self.comment_overrides.get(&item.id) {
                item.comments = comments.clone();
            }
        }
        self.state = LoadState::Ready(TimelineView {
            list_name: snapshot.metadata.name.clone(),
            list_content: snapshot.metadata.content.clone(),
            items,
        });
    }

    pub fn begin_refresh(&mut self, task_id: &str) -> RefreshTicket {
        let generation = self
            .comment_generations
            .entry(task_id.to_string())
            .or_insert(0);
        *generation += 1;
        RefreshTicket {
            task_id: task_id.to_string(),
            generation: *generation,
            view_generation: self.view_generation,
            credential: self.config.current().credential,
        }
    }

    /// Replaces only the task's comments. Dropped (`Ok(false)`) when a newer
    /// refresh for the same task was started, or when a full reload replaced
    /// the view in the meantime.
    pub fn finish_refresh(&mut self, outcome: RefreshOutcome) -> Result<bool> {
        let latest = self
            .comment_generations
            .get(&outcome.task_id)
            .copied()
            .unwrap_or_default();
        if outcome.generation != latest || outcome.view_generation != self.view_generation {
            log::debug!("Discarding stale comment refresh for {}", outcome.task_id);
            return Ok(false);
        }
        let comments = outcome.result?;
        self.comment_overrides.insert(outcome.task_id, comments);
        self.rebuild_view();
        Ok(true)
    }

    /// Reloads one task's comments. A failure raises an error notice.
    pub async fn refresh_comments(&mut self, task_id: &str) -> Result<bool> {
        let ticket = self.begin_refresh(task_id);
        let outcome = ticket.fetch(&self.provider, &self.normalizer).await;
        match self.finish_refresh(outcome) {
            Ok(applied) => Ok(applied),
            Err(e) => {
                self.notices
                    .push(Notice::error("Could not refresh comments", &e));
                Err(e)
            }
        }
    }

    /// Comments fetched for a task since the last full load, if any.
    pub fn refreshed_comments(&self, task_id: &str) -> Option<&[Comment]> {
        self.comment_overrides.get(task_id).map(Vec::as_slice)
    }

    async fn after_submission(&mut self, submission: &Submission) {
        if let Err(e) = self.refresh_comments(&submission.task_id).await {
            log::warn!("Comment refresh for {} failed: {}", submission.task_id, e);
        }
    }

    /// Posts a comment, then reloads the task's comments from the provider.
    /// A failed reload raises a notice but the submission still succeeds.
    pub async fn submit_comment(
        &mut self,
        task_id: &str,
        text: &str,
        author: &str,
    ) -> Result<Submission> {
        let credential = self.config.current().credential;
        let result = CommentSynchronizer::new(&self.provider, &self.normalizer)
            .submit_comment(&credential, task_id, text, author)
            .await;
        match result {
            Ok(submission) => {
                self.notices
                    .push(Notice::success("Comment sent", "Your comment was added."));
                self.after_submission(&submission).await;
                Ok(submission)
            }
            Err(e) => {
                self.notices.push(Notice::error("Could not send comment", &e));
                Err(e)
            }
        }
    }

    pub async fn approve(&mut self, task_id: &str) -> Result<Submission> {
        let credential = self.config.current().credential;
        let result = CommentSynchronizer::new(&self.provider, &self.normalizer)
            .submit_approval(&credential, task_id)
            .await;
        match result {
            Ok(submission) => {
                self.notices
                    .push(Notice::success("Stage approved", "The approval was recorded."));
                self.after_submission(&submission).await;
                Ok(submission)
            }
            Err(e) => {
                self.notices.push(Notice::error("Could not approve stage", &e));
                Err(e)
            }
        }
    }

    /// Flips a task's membership in the visibility set and re-resolves the view.
    pub fn toggle_visibility(&mut self, task_id: &str) -> Result<bool> {
        match self.visibility.toggle(task_id) {
            Ok(visible) => {
                self.rebuild_view();
                Ok(visible)
            }
            Err(e) => {
                self.notices
                    .push(Notice::error("Could not update visibility", &e));
                Err(e)
            }
        }
    }

    pub fn reset_visibility(&mut self) -> Result<()> {
        match self.visibility.reset() {
            Ok(()) => {
                self.rebuild_view();
                Ok(())
            }
            Err(e) => {
                self.notices
                    .push(Notice::error("Could not update visibility", &e));
                Err(e)
            }
        }
    }

    /// Every loaded task in provider order, flagged by plain membership.
    pub fn admin_tasks(&self) -> Vec<AdminTask> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        snapshot
            .tasks
            .iter()
            .map(|task| AdminTask {
                id: task.id.clone(),
                name: task.name.clone(),
                status: task.status_label().to_string(),
                visible: self.visibility.is_visible(&task.id),
            })
            .collect()
    }
}
