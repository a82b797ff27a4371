// Load, comment and visibility flows through the timeline controller.
mod common;

use clientline::TimelineError;
use clientline::controller::{LoadState, NoticeLevel};
use clientline::storage::{KEY_VISIBLE_ITEMS, KeyValueStore, MemoryStore, SharedStore};
use common::{FakeProvider, controller, controller_with, task};
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn two_stage_provider() -> FakeProvider {
    FakeProvider::with_tasks(vec![
        task("todo", "To Do", Some(1_710_000_000_000)),
        task("done", "Complete", Some(1_700_000_000_000)),
    ])
}

#[tokio::test]
async fn initial_load_builds_the_view() {
    let mut c = controller(two_stage_provider());
    assert_eq!(c.state(), &LoadState::Loading);

    c.load().await.unwrap();

    let view = c.view().expect("ready");
    assert_eq!(view.list_name, "Website Redesign");
    assert_eq!(view.list_content.as_deref(), Some("Phase 1"));
    let ids: Vec<&str> = view.visible_items().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["done", "todo"]);

    let summary = view.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.completion_percentage, 50);
    assert!(c.take_notices().is_empty());
}

#[tokio::test]
async fn missing_config_fails_before_any_request() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let mut c = controller_with(two_stage_provider(), store);

    let err = c.load().await.unwrap_err();

    assert!(matches!(err, TimelineError::Config(_)));
    assert!(matches!(c.state(), LoadState::Failed(_)));
    assert_eq!(c.provider().request_count(), 0);
    let notices = c.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn initial_failure_has_no_content_but_later_failure_keeps_view() {
    let mut c = controller(two_stage_provider());
    *c.provider().fail_tasks.lock().unwrap() = Some(503);

    let err = c.load().await.unwrap_err();
    assert!(matches!(err, TimelineError::Provider { status: 503, .. }));
    assert!(matches!(c.state(), LoadState::Failed(_)));
    assert!(c.view().is_none());
    assert_eq!(c.take_notices().len(), 1);

    *c.provider().fail_tasks.lock().unwrap() = None;
    c.load().await.unwrap();
    let before = c.view().cloned().expect("ready");

    *c.provider().fail_tasks.lock().unwrap() = Some(500);
    assert!(c.load().await.is_err());
    assert_eq!(c.view(), Some(&before));
    let notices = c.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn stale_load_is_discarded() {
    let mut c = controller(FakeProvider::with_tasks(vec![task("old", "To Do", None)]));

    let first = c.begin_load().unwrap();
    let first_outcome = first.fetch(c.provider()).await;

    *c.provider().tasks.lock().unwrap() = vec![task("new", "To Do", None)];
    let second = c.begin_load().unwrap();
    assert!(second.generation() > 1);
    let second_outcome = second.fetch(c.provider()).await;

    assert!(c.finish_load(second_outcome).unwrap());
    assert!(!c.finish_load(first_outcome).unwrap());

    let ids: Vec<&str> = c
        .view()
        .expect("ready")
        .items
        .iter()
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(ids, vec!["new"]);
}

#[tokio::test]
async fn comment_is_posted_then_refreshed_into_the_item() {
    let mut c = controller(two_stage_provider());
    c.load().await.unwrap();

    let submission = c.submit_comment("todo", "hi", "Bob").await.unwrap();
    assert_eq!(submission.body, "[From Bob]: hi");
    assert_eq!(
        c.provider().posted(),
        vec![("todo".to_string(), "[From Bob]: hi".to_string())]
    );

    let view = c.view().expect("ready");
    let item = view.item("todo").expect("item");
    assert_eq!(item.comments.len(), 1);
    assert_eq!(item.comments[0].text, "[From Bob]: hi");
    assert!(view.item("done").expect("item").comments.is_empty());

    let notices = c.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn approval_marks_the_item() {
    let mut c = controller(two_stage_provider());
    c.load().await.unwrap();

    c.approve("todo").await.unwrap();

    let item = c.view().and_then(|v| v.item("todo")).expect("item");
    assert!(item.is_approved());
    assert_eq!(
        c.provider().posted()[0].1,
        "[From Cliente]: Etapa aprovada pelo cliente"
    );
}

#[tokio::test]
async fn validation_failure_becomes_a_notice() {
    let mut c = controller(two_stage_provider());
    c.load().await.unwrap();

    let err = c.submit_comment("todo", "", "Bob").await.unwrap_err();
    assert!(matches!(err, TimelineError::Validation(_)));
    assert!(c.provider().posted().is_empty());
    let notices = c.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn refresh_failure_still_reports_the_submission() {
    let mut c = controller(two_stage_provider());
    c.load().await.unwrap();
    c.provider()
        .fail_comment_listing
        .store(true, Ordering::SeqCst);

    let result = c.submit_comment("todo", "hi", "Bob").await;

    assert!(result.is_ok());
    assert_eq!(c.provider().posted().len(), 1);
    // Remote state is ahead of the view.
    assert!(c.view().and_then(|v| v.item("todo")).expect("item").comments.is_empty());
    let levels: Vec<NoticeLevel> = c.take_notices().iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Success, NoticeLevel::Error]);
}

#[tokio::test]
async fn direct_refresh_failure_raises_one_notice() {
    let mut c = controller(two_stage_provider());
    c.load().await.unwrap();
    c.provider()
        .fail_comment_listing
        .store(true, Ordering::SeqCst);

    let err = c.refresh_comments("todo").await.unwrap_err();

    assert!(matches!(err, TimelineError::Transport(_)));
    let notices = c.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].title, "Could not refresh comments");
}

#[tokio::test]
async fn submission_without_a_load_keeps_the_refreshed_comments() {
    let mut c = controller(two_stage_provider());
    assert!(c.refreshed_comments("todo").is_none());

    c.submit_comment("todo", "hi", "Bob").await.unwrap();

    assert!(c.view().is_none());
    let comments = c.refreshed_comments("todo").expect("refreshed");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "[From Bob]: hi");
    assert!(c.refreshed_comments("done").is_none());
}

#[tokio::test]
async fn stale_comment_refresh_is_discarded() {
    let mut c = controller(two_stage_provider());
    c.load().await.unwrap();

    let older = c.begin_refresh("todo");
    let older_outcome = older.fetch(c.provider(), c.normalizer()).await;

    c.submit_comment("todo", "hi", "Bob").await.unwrap();
    assert!(!c.finish_refresh(older_outcome).unwrap());

    let item = c.view().and_then(|v| v.item("todo")).expect("item");
    assert_eq!(item.comments.len(), 1);
}

#[tokio::test]
async fn toggling_curates_the_visible_projection() {
    let store: SharedStore = Arc::new(MemoryStore::with_entries([
        ("clickup_api_key", "pk_test"),
        ("clickup_list_id", "901"),
    ]));
    let mut c = controller_with(two_stage_provider(), store.clone());
    c.load().await.unwrap();

    // Empty set: everything shown, but the admin listing reports plain membership.
    assert!(c.admin_tasks().iter().all(|t| !t.visible));
    assert_eq!(c.view().expect("ready").visible_items().count(), 2);

    assert!(c.toggle_visibility("done").unwrap());
    let visible: Vec<String> = c
        .view()
        .expect("ready")
        .visible_items()
        .map(|i| i.id.clone())
        .collect();
    assert_eq!(visible, vec!["done".to_string()]);
    assert_eq!(c.view().expect("ready").summary().completion_percentage, 100);
    assert_eq!(
        store.get(KEY_VISIBLE_ITEMS).unwrap().as_deref(),
        Some(r#"["done"]"#)
    );

    let admin: Vec<(String, bool)> = c
        .admin_tasks()
        .into_iter()
        .map(|t| (t.id, t.visible))
        .collect();
    assert_eq!(
        admin,
        vec![("todo".to_string(), false), ("done".to_string(), true)]
    );

    // Toggling back empties the set, which shows everything again.
    assert!(!c.toggle_visibility("done").unwrap());
    assert_eq!(c.view().expect("ready").visible_items().count(), 2);

    c.toggle_visibility("todo").unwrap();
    c.reset_visibility().unwrap();
    assert_eq!(c.view().expect("ready").visible_items().count(), 2);
    assert!(c.visibility().set().is_empty());
}
