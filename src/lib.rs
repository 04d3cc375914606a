//! Player market-value and match-outcome inference over exported
//! scikit-learn models.
//!
//! Feature assembly ([`player_features`], [`match_features`]) produces named
//! rows that are aligned by column name against each artifact's own feature
//! list before scoring ([`model_store`]). [`inference`] decodes the scores:
//! `exp` for log-space values, the artifact's class order for outcomes.

pub mod batch;
pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod features;
pub mod inference;
pub mod match_features;
pub mod model_store;
pub mod outcome;
pub mod player_features;
pub mod presets;
pub mod recommend;
pub mod reference;
pub mod sanitize;

pub use error::PredictError;
pub use inference::{MatchPredictor, OutcomePrediction, ValuePrediction, ValuePredictor};
pub use match_features::{HalfTimeGoals, OddsTriple};
pub use model_store::{Classifier, ModelStore, Regressor};
pub use outcome::{Outcome, OutcomeProbs};
pub use player_features::{PlayerAttributes, Position};
