// File: adhdscreen-core/tests/screening_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;

use adhdscreen_common::error::{ScoreError, ValidationError};
use adhdscreen_common::models::{
    ActivityLogEntry, Gender, NewActivityLogEntry, NewUser, Principal, RiskLevel,
};
use adhdscreen_common::traits::{ActivityLogRepository, UserRepository};
use adhdscreen_core::repositories::MemoryStore;
use adhdscreen_core::scoring::{ModelHandle, RawPayload};
use adhdscreen_core::services::{ActivityLog, ScreeningService};
use adhdscreen_core::test_utils::fixtures::{constant_bundle, memory_app};
use adhdscreen_core::Error;

mock! {
    ActivityRepo {}
    #[async_trait]
    impl ActivityLogRepository for ActivityRepo {
        async fn insert_entry(&self, entry: &NewActivityLogEntry) -> Result<(), Error>;
        async fn get_entries_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>, Error>;
    }
}

fn payload(value: serde_json::Value) -> RawPayload {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

async fn seed_user(store: &MemoryStore, email: &str) -> Result<Principal, Error> {
    let id = store
        .create(&NewUser {
            name: "Seeded".into(),
            email: email.into(),
            password_hash: "unused".into(),
            age: None,
            gender: Gender::Other,
            phone: None,
            address: None,
        })
        .await?;
    Ok(Principal { id, name: "Seeded".into(), email: email.into() })
}

#[tokio::test]
async fn test_submit_scores_stores_and_logs() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a", "b"], 0.8)?);
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;

    let outcome = app
        .state
        .screening
        .submit(&principal, payload(json!({ "a": "1.5", "b": "2" })))
        .await?;

    assert_eq!(outcome.score.percentage, 80.0);
    assert_eq!(outcome.score.score, 80);
    assert_eq!(outcome.score.risk_level, RiskLevel::High);

    let stored = app
        .state
        .screening
        .result(&principal, outcome.result_id)
        .await?
        .expect("result should be readable by its owner");
    assert_eq!(stored.user_id, principal.id);
    assert_eq!(stored.percentage, 80.0);
    assert_eq!(stored.score, 80);
    assert_eq!(stored.risk_level, RiskLevel::High);
    assert_eq!(stored.responses["a"], json!("1.5"));
    assert!(stored.message.starts_with("ADHD Confidence Score: 0.80."));

    let log = app.store.get_entries_for_user(principal.id, 10).await?;
    assert_eq!(log[0].action, "prediction");
    assert_eq!(log[0].details.as_deref(), Some("Predicted ADHD Confidence Score: 80.0"));
    Ok(())
}

#[tokio::test]
async fn test_missing_feature_writes_nothing() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a", "b"], 0.8)?);
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;
    let logs_before = app.store.log_count().await;

    let err = app
        .state
        .screening
        .submit(&principal, payload(json!({ "a": "1.5" })))
        .await
        .expect_err("submission without b must fail");

    match err {
        Error::Validation(ValidationError::MissingFeature(name)) => assert_eq!(name, "b"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(app.store.result_count().await, 0);
    assert_eq!(app.store.log_count().await, logs_before);
    Ok(())
}

#[tokio::test]
async fn test_unparseable_value_names_the_field() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a", "b"], 0.8)?);
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;

    let err = app
        .state
        .screening
        .submit(&principal, payload(json!({ "a": "often", "b": 1 })))
        .await
        .expect_err("non-numeric value must fail");

    match err {
        Error::Validation(v) => assert_eq!(v.field(), "a"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(app.store.result_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_results_are_owner_scoped() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a"], 0.5)?);
    let (_t1, alice) = app.login_as("Alice", "alice@example.com").await?;
    let (_t2, bob) = app.login_as("Bob", "bob@example.com").await?;

    let outcome = app.state.screening.submit(&alice, payload(json!({ "a": 1 }))).await?;

    assert!(app.state.screening.result(&bob, outcome.result_id).await?.is_none());
    assert!(app.state.screening.result(&alice, outcome.result_id).await?.is_some());
    assert!(app.state.screening.dashboard(&bob).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dashboard_shows_five_newest_first() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a"], 0.2)?);
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;

    let mut ids = Vec::new();
    for _ in 0..7 {
        let outcome = app.state.screening.submit(&principal, payload(json!({ "a": 0 }))).await?;
        ids.push(outcome.result_id);
    }

    let recent = app.state.screening.dashboard(&principal).await?;
    assert_eq!(recent.len(), 5);
    for pair in recent.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
        assert!(pair[0].id > pair[1].id);
    }
    assert_eq!(recent[0].id, *ids.last().unwrap());
    assert!(recent.iter().all(|r| r.risk_level == RiskLevel::Low));
    Ok(())
}

#[tokio::test]
async fn test_unavailable_model_rejects_without_writing() -> Result<(), Error> {
    let app = memory_app(ModelHandle::Unavailable("no bundle found".into()));
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;

    let err = app
        .state
        .screening
        .submit(&principal, payload(json!({ "a": 1 })))
        .await
        .expect_err("scoring needs a model");

    assert!(matches!(err, Error::Score(ScoreError::ModelUnavailable(_))));
    assert!(app.state.screening.features().is_err());
    assert_eq!(app.store.result_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_store_outage_is_retryable_and_leaves_no_partial_write() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a"], 0.5)?);
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;
    let logs_before = app.store.log_count().await;

    app.store.set_offline(true);
    let err = app
        .state
        .screening
        .submit(&principal, payload(json!({ "a": 1 })))
        .await
        .expect_err("offline store must fail the submission");
    assert!(matches!(err, Error::StoreUnavailable(_)));
    app.store.set_offline(false);

    assert_eq!(app.store.result_count().await, 0);
    assert_eq!(app.store.log_count().await, logs_before);

    // Same submission succeeds once the store is back.
    app.state.screening.submit(&principal, payload(json!({ "a": 1 }))).await?;
    assert_eq!(app.store.result_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_activity_log_failure_does_not_fail_submission() -> Result<(), Error> {
    let store = MemoryStore::new();
    let principal = seed_user(&store, "ana@example.com").await?;

    let mut logs = MockActivityRepo::new();
    logs.expect_insert_entry()
        .times(1)
        .returning(|_| Err(Error::StoreUnavailable("log table locked".into())));

    let service = ScreeningService::new(
        constant_bundle(&["a"], 0.9)?,
        Arc::new(store.clone()),
        ActivityLog::new(Arc::new(logs)),
        5,
    );

    let outcome = service.submit(&principal, payload(json!({ "a": 3 }))).await?;
    assert_eq!(outcome.score.risk_level, RiskLevel::High);
    assert!(service.result(&principal, outcome.result_id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_prediction_log_carries_the_percentage() -> Result<(), Error> {
    let store = MemoryStore::new();
    let principal = seed_user(&store, "ana@example.com").await?;

    let mut logs = MockActivityRepo::new();
    logs.expect_insert_entry()
        .withf(|entry| {
            entry.action == "prediction"
                && entry.details.as_deref() == Some("Predicted ADHD Confidence Score: 50.0")
        })
        .times(1)
        .returning(|_| Ok(()));

    let service = ScreeningService::new(
        constant_bundle(&["a"], 0.5)?,
        Arc::new(store),
        ActivityLog::new(Arc::new(logs)),
        5,
    );

    let outcome = service.submit(&principal, payload(json!({ "a": 3 }))).await?;
    assert_eq!(outcome.score.score, 50);
    assert_eq!(outcome.score.risk_level, RiskLevel::Medium);
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_model_output_writes_nothing() -> Result<(), Error> {
    let app = memory_app(constant_bundle(&["a"], 25.0)?);
    let (_token, principal) = app.login_as("Ana", "ana@example.com").await?;
    let logs_before = app.store.log_count().await;

    let err = app
        .state
        .screening
        .submit(&principal, payload(json!({ "a": 1 })))
        .await
        .expect_err("a confidence above 1 cannot be stored");

    assert!(matches!(err, Error::Score(ScoreError::OutputOutOfRange(_))));
    assert_eq!(app.store.result_count().await, 0);
    assert_eq!(app.store.log_count().await, logs_before);
    Ok(())
}
