use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use streamchat::api::{StaticToken, TokenSupplier, TransportFactory, Trigger};
use streamchat::error::Result;
use streamchat::models::{Location, Message};

/// Hands out a different token on every call.
#[derive(Default)]
struct RotatingToken {
    calls: AtomicUsize,
}

#[async_trait]
impl TokenSupplier for RotatingToken {
    async fn token(&self) -> Result<Option<String>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(format!("token-{}", n)))
    }
}

#[test]
fn test_endpoint_is_derived_from_session_id() {
    let factory = TransportFactory::new("https://api.example.com/");
    let transport = factory.build("abc", Arc::new(StaticToken::anonymous()), None);

    assert_eq!(factory.base_url(), "https://api.example.com");
    assert_eq!(transport.endpoint(), "https://api.example.com/api/v1/chat/abc");
    assert_eq!(transport.session_id(), "abc");
    assert_eq!(transport.generation(), 0);
}

#[tokio::test]
async fn test_token_is_fetched_for_every_request() {
    let supplier = Arc::new(RotatingToken::default());
    let transport = TransportFactory::new("http://backend.test").build("S1", supplier.clone(), None);

    let first = transport.headers().await.unwrap();
    let second = transport.headers().await.unwrap();

    assert_eq!(first[AUTHORIZATION], "Bearer token-1");
    assert_eq!(second[AUTHORIZATION], "Bearer token-2");
    assert_eq!(first[CONTENT_TYPE], "application/json");
    assert_eq!(supplier.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_token_sends_no_authorization() {
    let transport =
        TransportFactory::new("http://backend.test").build("S1", Arc::new(StaticToken::anonymous()), None);

    let headers = transport.headers().await.unwrap();
    assert!(headers.get(AUTHORIZATION).is_none());
    assert_eq!(headers[CONTENT_TYPE], "application/json");
}

#[test]
fn test_body_shape_without_location() {
    let transport =
        TransportFactory::new("http://backend.test").build("S1", Arc::new(StaticToken::anonymous()), None);
    let messages = vec![Message::user_text("hello")];

    let body = serde_json::to_value(transport.body(&messages, Trigger::SubmitMessage)).unwrap();

    assert_eq!(body["id"], "S1");
    assert_eq!(body["trigger"], "submit-message");
    assert!(body["location"].is_null());
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["parts"][0]["type"], "text");
    assert_eq!(body["messages"][0]["parts"][0]["text"], "hello");
}

#[test]
fn test_body_carries_location() {
    let location = Location::new(51.5, -0.12, 10.0).unwrap();
    let transport = TransportFactory::new("http://backend.test").build(
        "S1",
        Arc::new(StaticToken::new("t")),
        Some(location),
    );

    let body =
        serde_json::to_value(transport.body(&[Message::user_text("hi")], Trigger::RegenerateMessage))
            .unwrap();

    assert_eq!(body["trigger"], "regenerate-message");
    assert_eq!(body["location"]["latitude"], 51.5);
    assert_eq!(body["location"]["longitude"], -0.12);
    assert_eq!(body["location"]["accuracy"], 10.0);
}

#[test]
fn test_body_keeps_most_recent_messages() {
    let transport = TransportFactory::new("http://backend.test")
        .with_context_limit(3)
        .build("S1", Arc::new(StaticToken::anonymous()), None);
    let messages: Vec<Message> = (0..5).map(|i| Message::user_text(format!("m{}", i))).collect();

    let body = transport.body(&messages, Trigger::SubmitMessage);

    let texts: Vec<String> = body.messages.iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["m2", "m3", "m4"]);
}

#[test]
fn test_default_context_limit_is_fifty() {
    let transport =
        TransportFactory::new("http://backend.test").build("S1", Arc::new(StaticToken::anonymous()), None);
    let messages: Vec<Message> = (0..60).map(|i| Message::user_text(format!("m{}", i))).collect();

    let body = transport.body(&messages, Trigger::SubmitMessage);
    assert_eq!(body.messages.len(), 50);
    assert_eq!(body.messages[0].text(), "m10");
}

#[test]
fn test_matches_compares_inputs() {
    let supplier: Arc<dyn TokenSupplier> = Arc::new(StaticToken::new("t"));
    let other: Arc<dyn TokenSupplier> = Arc::new(StaticToken::new("t"));
    let transport = TransportFactory::new("http://backend.test").build("S1", supplier.clone(), None);

    assert!(transport.matches("S1", &supplier, None));
    assert!(!transport.matches("S2", &supplier, None));
    assert!(!transport.matches("S1", &other, None));
    assert!(!transport.matches("S1", &supplier, Some(Location::new(0.0, 0.0, 0.0).unwrap())));
}
