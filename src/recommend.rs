use std::fmt;

use crate::inference::OutcomePrediction;
use crate::outcome::Outcome;

pub const DEFAULT_DRAW_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetAction {
    Back(Outcome),
    Avoid,
}

/// Historical-form read of a fixture checked against the model's pick.
/// Business rule only; it carries no statistical guarantee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub form_lean: Outcome,
    pub predicted: Outcome,
    pub action: BetAction,
}

/// Form leans to a draw when the two win rates are within `draw_threshold`.
pub fn form_lean(home_win_rate: f64, away_win_rate: f64, draw_threshold: f64) -> Outcome {
    let diff = home_win_rate - away_win_rate;
    if diff.abs() < draw_threshold {
        Outcome::Draw
    } else if diff > 0.0 {
        Outcome::HomeWin
    } else {
        Outcome::AwayWin
    }
}

pub fn recommend(prediction: &OutcomePrediction, draw_threshold: f64) -> Recommendation {
    let lean = form_lean(
        prediction.home_win_rate(),
        prediction.away_win_rate(),
        draw_threshold,
    );
    let action = if lean == prediction.outcome {
        BetAction::Back(prediction.outcome)
    } else {
        BetAction::Avoid
    };
    Recommendation {
        form_lean: lean,
        predicted: prediction.outcome,
        action,
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            BetAction::Back(outcome) => {
                write!(f, "Back {outcome}: model and historical form agree")
            }
            BetAction::Avoid => write!(
                f,
                "No bet: model predicts {} but historical form favours {}",
                self.predicted, self.form_lean
            ),
        }
    }
}
