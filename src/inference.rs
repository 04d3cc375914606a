use tracing::{debug, warn};

use crate::error::PredictError;
use crate::match_features::{
    HalfTimeGoals, MatchFeatureRow, MatchSchema, OddsTriple, assemble_match_features,
};
use crate::model_store::{Classifier, Regressor, Scaler};
use crate::outcome::{Outcome, OutcomeProbs};
use crate::player_features::{PlayerAttributes, PlayerSchema, assemble_player_row};
use crate::reference::ReferenceTables;

/// Values above this are almost certainly a unit-scale mismatch between the
/// artifact and the features. They are reported, not rescaled.
pub const SUSPECT_VALUE_THRESHOLD: f64 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Assembling,
    Scoring,
    Decoded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePrediction {
    /// Estimated market value in currency units.
    pub value: f64,
    /// Raw model output (natural log of `value`).
    pub log_value: f64,
}

impl ValuePrediction {
    pub fn from_log(log_value: f64) -> Result<Self, PredictError> {
        let value = log_value.exp();
        if !value.is_finite() {
            return Err(PredictError::NonFiniteScore { value: log_value });
        }
        Ok(Self { value, log_value })
    }

    pub fn is_suspect_scale(&self) -> bool {
        self.value > SUSPECT_VALUE_THRESHOLD
    }
}

pub struct ValuePredictor<'a> {
    model: &'a dyn Regressor,
    schema: PlayerSchema,
}

impl<'a> ValuePredictor<'a> {
    pub fn new(model: &'a dyn Regressor) -> Self {
        Self::with_schema(model, PlayerSchema::default())
    }

    pub fn with_schema(model: &'a dyn Regressor, schema: PlayerSchema) -> Self {
        Self { model, schema }
    }

    /// Assemble -> score -> `exp`. Exactly one unit transform is applied.
    pub fn predict_player_value(
        &self,
        attrs: &PlayerAttributes,
    ) -> Result<ValuePrediction, PredictError> {
        debug!("value inference: {:?}", Stage::Assembling);
        let row = assemble_player_row(attrs, &self.schema)?;
        let aligned = row.align(self.model.feature_names());

        debug!("value inference: {:?}", Stage::Scoring);
        let log_value = self.model.predict(&aligned.values)?;
        if !log_value.is_finite() {
            return Err(PredictError::NonFiniteScore { value: log_value });
        }

        let prediction = ValuePrediction::from_log(log_value)?;
        debug!("value inference: {:?} -> {:.2}", Stage::Decoded, prediction.value);
        if prediction.is_suspect_scale() {
            warn!(
                "value estimate {:.0} for {} exceeds {:.0}; check the model's unit convention",
                prediction.value,
                attrs.name.as_deref().unwrap_or("unnamed player"),
                SUSPECT_VALUE_THRESHOLD
            );
        }
        debug!("value inference: {:?}", Stage::Idle);
        Ok(prediction)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomePrediction {
    pub outcome: Outcome,
    pub probs: OutcomeProbs,
    pub features: MatchFeatureRow,
}

impl OutcomePrediction {
    pub fn home_win_rate(&self) -> f64 {
        self.features.home.win_rate
    }

    pub fn away_win_rate(&self) -> f64 {
        self.features.away.win_rate
    }
}

pub struct MatchPredictor<'a> {
    model: &'a dyn Classifier,
    scaler: &'a Scaler,
    tables: &'a ReferenceTables,
    schema: MatchSchema,
}

impl<'a> MatchPredictor<'a> {
    pub fn new(
        model: &'a dyn Classifier,
        scaler: &'a Scaler,
        tables: &'a ReferenceTables,
    ) -> Result<Self, PredictError> {
        Self::with_schema(model, scaler, tables, MatchSchema::default())
    }

    /// Fails when the scaler was fitted on a different column layout than the model.
    pub fn with_schema(
        model: &'a dyn Classifier,
        scaler: &'a Scaler,
        tables: &'a ReferenceTables,
        schema: MatchSchema,
    ) -> Result<Self, PredictError> {
        let columns = model.feature_names();
        if scaler.width() != columns.len() {
            return Err(PredictError::WidthMismatch {
                expected: columns.len(),
                found: scaler.width(),
            });
        }
        if let Some(names) = &scaler.feature_names
            && let Some((index, (found, expected))) = names
                .iter()
                .zip(columns)
                .enumerate()
                .find(|(_, (s, m))| s != m)
        {
            return Err(PredictError::ScalerMismatch {
                index,
                scaler: found.clone(),
                model: expected.clone(),
            });
        }
        Ok(Self {
            model,
            scaler,
            tables,
            schema,
        })
    }

    pub fn predict_match_outcome(
        &self,
        home_team: &str,
        away_team: &str,
        odds: OddsTriple,
        half_time: HalfTimeGoals,
    ) -> Result<OutcomePrediction, PredictError> {
        debug!("match inference: {:?}", Stage::Assembling);
        let features = assemble_match_features(self.tables, home_team, away_team, odds, half_time)?;
        let aligned = features.to_row(&self.schema).align(self.model.feature_names());
        let scaled = self.scaler.transform(&aligned.values)?;

        debug!("match inference: {:?}", Stage::Scoring);
        let raw = self.model.predict_proba(&scaled)?;
        let classes = self.model.classes();
        if raw.len() != classes.len() {
            return Err(PredictError::WidthMismatch {
                expected: classes.len(),
                found: raw.len(),
            });
        }

        let probs = OutcomeProbs::from_class_order(classes, &raw);
        let outcome = probs.most_likely();
        debug!(
            "match inference: {:?} -> {outcome} ({:.3}/{:.3}/{:.3})",
            Stage::Decoded,
            probs.home,
            probs.draw,
            probs.away
        );
        debug!("match inference: {:?}", Stage::Idle);
        Ok(OutcomePrediction {
            outcome,
            probs,
            features,
        })
    }
}
