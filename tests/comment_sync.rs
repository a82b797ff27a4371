// Comment submission and refresh through the synchronizer.
mod common;

use clientline::TimelineError;
use clientline::model::CommentKind;
use clientline::sync::CommentSynchronizer;
use common::{FakeProvider, normalizer};

#[tokio::test]
async fn submit_comment_transmits_attributed_body() {
    let provider = FakeProvider::default();
    let normalizer = normalizer();
    let sync = CommentSynchronizer::new(&provider, &normalizer);

    let submission = sync
        .submit_comment("pk_test", "task1", "hi", "Bob")
        .await
        .unwrap();

    assert_eq!(
        provider.posted(),
        vec![("task1".to_string(), "[From Bob]: hi".to_string())]
    );
    assert_eq!(submission.body, "[From Bob]: hi");
    assert_eq!(submission.kind, CommentKind::Normal);
    assert_eq!(submission.remote_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn submit_comment_trims_fields() {
    let provider = FakeProvider::default();
    let normalizer = normalizer();
    let sync = CommentSynchronizer::new(&provider, &normalizer);

    sync.submit_comment("pk_test", "task1", "  looks good \n", " Ana ")
        .await
        .unwrap();
    assert_eq!(provider.posted()[0].1, "[From Ana]: looks good");
}

#[tokio::test]
async fn empty_fields_are_rejected_without_a_request() {
    let provider = FakeProvider::default();
    let normalizer = normalizer();
    let sync = CommentSynchronizer::new(&provider, &normalizer);

    let err = sync
        .submit_comment("pk_test", "task1", "   ", "Bob")
        .await
        .unwrap_err();
    assert!(matches!(err, TimelineError::Validation(_)));

    let err = sync
        .submit_comment("pk_test", "task1", "hi", "")
        .await
        .unwrap_err();
    assert!(matches!(err, TimelineError::Validation(_)));

    assert_eq!(provider.request_count(), 0);
    assert!(provider.posted().is_empty());
}

#[tokio::test]
async fn submit_approval_uses_sentinel_text_and_client_author() {
    let provider = FakeProvider::default();
    let normalizer = normalizer();
    let sync = CommentSynchronizer::new(&provider, &normalizer);

    let submission = sync.submit_approval("pk_test", "task1").await.unwrap();

    assert_eq!(submission.text, "Etapa aprovada pelo cliente");
    assert_eq!(submission.author, "Cliente");
    assert_eq!(submission.kind, CommentKind::Approval);
    assert_eq!(
        provider.posted()[0].1,
        "[From Cliente]: Etapa aprovada pelo cliente"
    );
}

#[tokio::test]
async fn provider_failure_propagates() {
    let provider = FakeProvider::default();
    provider
        .fail_posts
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let normalizer = normalizer();
    let sync = CommentSynchronizer::new(&provider, &normalizer);

    let err = sync
        .submit_comment("pk_test", "task1", "hi", "Bob")
        .await
        .unwrap_err();
    assert!(matches!(err, TimelineError::Provider { status: 500, .. }));
}

#[tokio::test]
async fn refresh_returns_current_remote_comments() {
    let provider = FakeProvider::default();
    let normalizer = normalizer();
    let sync = CommentSynchronizer::new(&provider, &normalizer);

    assert!(sync.refresh_comments("pk_test", "task1").await.unwrap().is_empty());

    sync.submit_comment("pk_test", "task1", "hi", "Bob")
        .await
        .unwrap();
    sync.submit_approval("pk_test", "task1").await.unwrap();

    let comments = sync.refresh_comments("pk_test", "task1").await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, "[From Bob]: hi");
    assert!(!comments[0].is_approval());
    assert!(comments[1].is_approval());
    assert_eq!(comments[1].author, "api-user");
    assert_eq!(comments[1].date, "14/11/2023");
}
