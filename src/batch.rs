use rayon::prelude::*;
use tracing::warn;

use crate::inference::{ValuePrediction, ValuePredictor};
use crate::player_features::PlayerAttributes;

#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub player: PlayerAttributes,
    pub prediction: ValuePrediction,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Sorted by value, highest first.
    pub valuations: Vec<Valuation>,
    pub errors: Vec<String>,
}

/// Values every player against the shared, read-only model. Failures are
/// collected per player instead of aborting the batch.
pub fn value_players(
    predictor: &ValuePredictor<'_>,
    players: &[&PlayerAttributes],
    threads: Option<usize>,
) -> BatchReport {
    let run = || {
        players
            .par_iter()
            .map(|player| {
                predictor
                    .predict_player_value(player)
                    .map(|prediction| Valuation {
                        player: (*player).clone(),
                        prediction,
                    })
                    .map_err(|err| {
                        format!(
                            "{}: {err}",
                            player.name.as_deref().unwrap_or("unnamed player")
                        )
                    })
            })
            .collect::<Vec<_>>()
    };

    let results = match threads {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(run),
            Err(err) => {
                warn!("failed to build {n}-thread pool ({err}); using the global pool");
                run()
            }
        },
        None => run(),
    };

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(v) => report.valuations.push(v),
            Err(e) => report.errors.push(e),
        }
    }
    report.valuations.sort_by(|a, b| {
        b.prediction
            .value
            .total_cmp(&a.prediction.value)
            .then_with(|| a.player.name.cmp(&b.player.name))
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictError;
    use crate::model_store::Regressor;
    use crate::player_features::Position;

    /// log-value = Potential / 10
    struct PotentialModel {
        names: Vec<String>,
    }

    impl Regressor for PotentialModel {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, row: &[f64]) -> Result<f64, PredictError> {
            Ok(row[0] / 10.0)
        }
    }

    fn player(name: &str, potential: f64) -> PlayerAttributes {
        PlayerAttributes {
            name: Some(name.to_string()),
            age: 22,
            height_cm: 180,
            weight_kg: 75,
            potential,
            best_position: Position::CM,
            stamina: 60.0,
            dribbling: 60.0,
            short_passing: 60.0,
        }
    }

    #[test]
    fn batch_sorts_and_collects_errors() {
        let model = PotentialModel {
            names: vec!["Potential".to_string()],
        };
        let predictor = ValuePredictor::new(&model);
        let a = player("A", 70.0);
        let b = player("B", 90.0);
        let bad = player("Bad", 150.0);
        let report = value_players(&predictor, &[&a, &b, &bad], Some(2));
        assert_eq!(report.valuations.len(), 2);
        assert_eq!(report.valuations[0].player.name.as_deref(), Some("B"));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Bad:"));
    }
}
