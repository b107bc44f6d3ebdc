//! The scoring pipeline: raw submission -> ordered vector -> frozen model -> tier.

pub mod validator;
pub mod scorer;
pub mod bundle;

pub use validator::{validate, FeatureSchema, RawPayload};
pub use scorer::{score, FrozenClassifier, FrozenNormalizer, ScoreResult};
pub use bundle::{load_first, ModelBundle, ModelHandle};
