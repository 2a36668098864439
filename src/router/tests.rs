use super::*;
use std::sync::Mutex;

/// Records every handler call as "<capability>:<name>"
#[derive(Default)]
struct RecordingHandler {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingHandler {
    fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn record(&self, capability: &str, emoji: &EmojiRecord) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", capability, emoji.name()));
        if self.fail {
            anyhow::bail!("sink unavailable");
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn emoji_added(&self, emoji: &EmojiRecord) -> Result<()> {
        self.record("added", emoji)
    }

    async fn emoji_updated(&self, emoji: &EmojiRecord) -> Result<()> {
        self.record("updated", emoji)
    }

    async fn emoji_deleted(&self, emoji: &EmojiRecord) -> Result<()> {
        self.record("deleted", emoji)
    }
}

fn make_router() -> (Router, Arc<RecordingHandler>) {
    let handler = Arc::new(RecordingHandler::default());
    (Router::new(handler.clone()), handler)
}

#[tokio::test]
async fn test_emoji_added_dispatches() {
    let (router, handler) = make_router();

    let outcome = router
        .route_frame(br#"{"type":"emojiAdded","body":{"emoji":{"name":"blob","category":"cat","license":null,"localOnly":true}}}"#)
        .await;

    assert_eq!(outcome, RouteOutcome::Dispatched("emojiAdded"));
    assert_eq!(handler.calls(), vec!["added:blob".to_string()]);
}

#[tokio::test]
async fn test_updated_and_deleted_use_first_record_only() {
    let (router, handler) = make_router();

    let updated = router
        .route_frame(br#"{"type":"emojiUpdated","body":{"emojis":[{"name":"a"},{"name":"b"}]}}"#)
        .await;
    let deleted = router
        .route_frame(br#"{"type":"emojiDeleted","body":{"emojis":[{"name":"c"},{"name":"d"}]}}"#)
        .await;

    assert_eq!(updated, RouteOutcome::Dispatched("emojiUpdated"));
    assert_eq!(deleted, RouteOutcome::Dispatched("emojiDeleted"));
    assert_eq!(
        handler.calls(),
        vec!["updated:a".to_string(), "deleted:c".to_string()]
    );
}

#[tokio::test]
async fn test_empty_batch_is_not_dispatched() {
    let (router, handler) = make_router();

    let outcome = router
        .route_frame(br#"{"type":"emojiDeleted","body":{"emojis":[]}}"#)
        .await;

    assert_eq!(outcome, RouteOutcome::Empty("emojiDeleted"));
    assert!(!outcome.is_dispatch());
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_unrecognized_type_is_not_dispatched() {
    let (router, handler) = make_router();

    let outcome = router.route_frame(br#"{"type":"pong","body":{}}"#).await;

    assert_eq!(outcome, RouteOutcome::Unrecognized("pong".to_string()));
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_missing_or_non_string_type_is_undecodable() {
    let (router, handler) = make_router();

    let frames: [&[u8]; 4] = [
        br#"{"body":{"emoji":{"name":"blob"}}}"#,
        br#"{"type":42,"body":{"emoji":{"name":"blob"}}}"#,
        br#"{"type":["emojiAdded"],"body":{}}"#,
        b"not json at all",
    ];

    for frame in frames {
        let outcome = router.route_frame(frame).await;
        assert!(
            matches!(outcome, RouteOutcome::Undecodable(_)),
            "unexpected outcome {:?}",
            outcome
        );
    }
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_shape_is_not_dispatched() {
    let (router, handler) = make_router();

    let outcome = router
        .route_frame(br#"{"type":"emojiAdded","body":{"emojis":[{"name":"blob"}]}}"#)
        .await;

    match outcome {
        RouteOutcome::InvalidShape(e) => {
            assert_eq!(e.event_type, "emojiAdded");
            assert_eq!(e.field, "emoji");
        }
        other => panic!("Expected InvalidShape, got {:?}", other),
    }
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_handler_error_is_contained() {
    let handler = Arc::new(RecordingHandler::failing());
    let router = Router::new(handler.clone());

    let outcome = router
        .dispatch(EventKind::Added(EmojiRecord {
            name: Some("blob".to_string()),
            ..Default::default()
        }))
        .await;

    assert_eq!(outcome, RouteOutcome::HandlerFailed("emojiAdded"));
    assert!(outcome.is_dispatch());
    assert_eq!(handler.calls(), vec!["added:blob".to_string()]);
}
