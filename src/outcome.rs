use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::HomeWin, Outcome::Draw, Outcome::AwayWin];

    pub fn label(self) -> &'static str {
        match self {
            Outcome::HomeWin => "Home Win",
            Outcome::Draw => "Draw",
            Outcome::AwayWin => "Away Win",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Home/draw/away distribution, always keyed by outcome rather than by a
/// model's class index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbs {
    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    /// Re-keys `probs` (in model class order) by the decoded `classes`.
    /// The result is renormalized so it is a simplex even after float drift.
    pub fn from_class_order(classes: &[Outcome], probs: &[f64]) -> Self {
        let mut out = Self {
            home: 0.0,
            draw: 0.0,
            away: 0.0,
        };
        for (outcome, p) in classes.iter().zip(probs) {
            let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
            match outcome {
                Outcome::HomeWin => out.home += p,
                Outcome::Draw => out.draw += p,
                Outcome::AwayWin => out.away += p,
            }
        }
        let sum = out.sum();
        if sum <= 0.0 {
            return Self::uniform();
        }
        out.home /= sum;
        out.draw /= sum;
        out.away /= sum;
        out
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::HomeWin => self.home,
            Outcome::Draw => self.draw,
            Outcome::AwayWin => self.away,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    /// Most likely outcome; ties resolve home, then draw, then away.
    pub fn most_likely(&self) -> Outcome {
        let mut best = Outcome::HomeWin;
        for outcome in [Outcome::Draw, Outcome::AwayWin] {
            if self.get(outcome) > self.get(best) {
                best = outcome;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_order_is_respected() {
        let classes = [Outcome::AwayWin, Outcome::Draw, Outcome::HomeWin];
        let probs = OutcomeProbs::from_class_order(&classes, &[0.6, 0.3, 0.1]);
        assert!((probs.away - 0.6).abs() < 1e-12);
        assert!((probs.home - 0.1).abs() < 1e-12);
        assert_eq!(probs.most_likely(), Outcome::AwayWin);
    }

    #[test]
    fn degenerate_distribution_falls_back_to_uniform() {
        let probs = OutcomeProbs::from_class_order(&Outcome::ALL, &[0.0, f64::NAN, 0.0]);
        assert_eq!(probs, OutcomeProbs::uniform());
    }

    #[test]
    fn renormalizes_drift() {
        let probs = OutcomeProbs::from_class_order(&Outcome::ALL, &[0.5, 0.3, 0.3]);
        assert!((probs.sum() - 1.0).abs() < 1e-12);
    }
}
