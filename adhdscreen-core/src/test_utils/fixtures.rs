// File: adhdscreen-core/src/test_utils/fixtures.rs
//
// Deterministic models and a fully wired in-memory app for tests and demos.

use std::sync::Arc;

use chrono::Duration;

use adhdscreen_common::models::Principal;
use crate::Error;
use crate::app::{build_state, Repositories};
use crate::auth::SessionStore;
use crate::config::{AppConfig, StoreKind};
use crate::repositories::MemoryStore;
use crate::scoring::bundle::IdentityNormalizer;
use crate::scoring::{FeatureSchema, FrozenClassifier, ModelBundle, ModelHandle};
use crate::services::Registration;
use crate::web::AppState;

/// Ignores its input and always answers `output`.
#[derive(Debug, Clone)]
pub struct ConstantClassifier {
    pub width: usize,
    pub output: f64,
}

impl FrozenClassifier for ConstantClassifier {
    fn input_width(&self) -> usize {
        self.width
    }

    fn predict(&self, _x: &[f64]) -> f64 {
        self.output
    }
}

/// Identity normalizer + constant classifier over `features`.
pub fn constant_bundle(features: &[&str], output: f64) -> Result<ModelHandle, Error> {
    let schema = FeatureSchema::new(features.iter().map(|f| f.to_string()).collect())?;
    let width = schema.len();
    let bundle = ModelBundle::new(
        schema,
        Arc::new(IdentityNormalizer::new(width)),
        Arc::new(ConstantClassifier { width, output }),
    )?;
    Ok(bundle.into())
}

pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    pub sessions: Arc<SessionStore>,
}

/// A complete app over the memory store.
pub fn memory_app(model: ModelHandle) -> TestApp {
    let config = AppConfig {
        store: StoreKind::Memory,
        model_bundles: vec![],
        ..AppConfig::default()
    };
    let store = MemoryStore::new();
    let sessions = Arc::new(SessionStore::new(Duration::hours(config.session_ttl_hours)));
    let state = build_state(&config, model, Repositories::memory(&store), sessions.clone());
    TestApp { state, store, sessions }
}

impl TestApp {
    /// Registers `email` with password `secret1` and opens a session.
    pub async fn login_as(&self, name: &str, email: &str) -> Result<(String, Principal), Error> {
        self.state
            .accounts
            .register(Registration {
                name: name.to_string(),
                email: email.to_string(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
                ..Registration::default()
            })
            .await?;
        self.state.accounts.login(email, "secret1").await
    }
}
