use chrono::{TimeZone, Utc};
use model_framework::mock::MockTransport;
use model_framework::{Method, ModelConfig, ModelOptions, SaveOptions, TransportError, TypedModel};
use model_sample::model::{post_definition, user_definition, AppError, Post, User};
use serde_json::json;

/// Typed wrappers against a scripted transport.
/// Exercises the request shapes the wrappers produce without any backend.
#[tokio::test]
async fn test_user_save_posts_then_puts() {
    let mock = MockTransport::new();
    mock.expect(Method::Post, "users").return_ok(json!({"id": "abc"}));
    mock.expect(Method::Put, "users/abc").return_ok(json!({"id": "abc", "email": "jd@example.com"}));

    let mut user = User::new(
        &user_definition(),
        json!({"first_name": "Jane", "last_name": "Doe"}),
        ModelOptions::default(),
        ModelConfig::default(),
    )
    .unwrap();

    user.save(&mock, None, SaveOptions::default()).await.unwrap();
    assert!(!user.inner().is_new());
    assert_eq!(user.inner().url(), "users/abc");

    user.set_email("jd@example.com").unwrap();
    user.save(&mock, None, SaveOptions::default()).await.unwrap();

    let calls = mock.calls();
    assert_eq!(calls[0].body.as_ref().unwrap()["full_name"], "Jane Doe");
    assert_eq!(calls[1].body.as_ref().unwrap()["email"], "jd@example.com");
    mock.verify();
}

#[tokio::test]
async fn test_fetch_rewraps_dates() {
    let mock = MockTransport::new();
    mock.expect(Method::Get, "users/1").return_ok(json!({
        "id": "1",
        "created_at": {"$date": "2022-02-02T10:00:00.5Z"}
    }));

    let mut user = User::new(
        &user_definition(),
        json!({"id": "1"}),
        ModelOptions::default(),
        ModelConfig::default(),
    )
    .unwrap();
    user.fetch(&mock).await.unwrap();

    assert_eq!(
        user.inner().to_json()["created_at"],
        "2022-02-02T10:00:00.500Z"
    );
    assert!(user.created_at().is_some());
}

#[tokio::test]
async fn test_request_errors_map_to_app_error() {
    let mock = MockTransport::new();
    mock.expect(Method::Put, "blog/posts/5")
        .return_err(TransportError::Network("connection reset".into()));

    let mut post = Post::new(
        &post_definition().unwrap(),
        json!({"id": "5", "body": "text"}),
        ModelOptions::default(),
        ModelConfig::default(),
    )
    .unwrap();
    post.publish(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        .unwrap();

    let err = post
        .save(&mock, None, SaveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Model(ref e) if e.is_request_error()));
    // local state survives the failed request
    assert!(!post.is_draft());
}

#[tokio::test]
async fn test_destroy_new_post_makes_no_call() {
    let mock = MockTransport::new();
    let post = Post::new(
        &post_definition().unwrap(),
        json!({}),
        ModelOptions::default(),
        ModelConfig::default(),
    )
    .unwrap();

    let err = post.destroy(&mock).await.unwrap_err();
    assert!(matches!(err, AppError::Model(ref e) if e.is_invalid_state()));
    assert!(mock.calls().is_empty());
}
