use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use pitch_predict::model_store::{Scaler, load_outcome_model, load_scaler};
use pitch_predict::recommend::{BetAction, DEFAULT_DRAW_THRESHOLD, recommend};
use pitch_predict::reference::{CLUB_STATS_TABLE, ReferenceTables, WIN_RATE_TABLE};
use pitch_predict::{
    Classifier, HalfTimeGoals, MatchPredictor, OddsTriple, Outcome, PredictError,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn tables() -> ReferenceTables {
    ReferenceTables::load(
        &fixture_path("club_stats.csv"),
        &fixture_path("win_rates.csv"),
    )
    .expect("reference fixtures should load")
}

fn odds() -> OddsTriple {
    OddsTriple::new(1.5, 4.0, 6.0)
}

fn ht(home: u32, away: u32) -> HalfTimeGoals {
    HalfTimeGoals { home, away }
}

/// Uniform scores; counts how often it is asked.
struct CountingClassifier {
    names: Vec<String>,
    classes: Vec<Outcome>,
    calls: AtomicUsize,
}

impl CountingClassifier {
    fn new() -> Self {
        Self {
            names: vec!["HTHG".to_string()],
            classes: Outcome::ALL.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Classifier for CountingClassifier {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn classes(&self) -> &[Outcome] {
        &self.classes
    }

    fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1.0 / 3.0; 3])
    }
}

fn unit_scaler(width: usize) -> Scaler {
    Scaler {
        feature_names: None,
        mean: vec![0.0; width],
        scale: vec![1.0; width],
    }
}

#[test]
fn teams_are_those_in_both_tables() {
    assert_eq!(
        tables().teams(),
        vec!["Arsenal", "Burnley", "Newcastle", "Promoted FC"]
    );
}

#[test]
fn permuted_class_order_is_decoded_by_label() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let scaler = load_scaler(&fixture_path("outcome_scaler.json")).unwrap();
    assert_eq!(
        model.classes(),
        &[Outcome::AwayWin, Outcome::Draw, Outcome::HomeWin]
    );
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();

    let home_lead = predictor
        .predict_match_outcome("Arsenal", "Burnley", odds(), ht(3, 0))
        .unwrap();
    let denom = (-3f64).exp() + 1.0 + 3f64.exp();
    assert_eq!(home_lead.outcome, Outcome::HomeWin);
    assert!((home_lead.probs.home - 3f64.exp() / denom).abs() < 1e-9);
    assert!((home_lead.probs.away - (-3f64).exp() / denom).abs() < 1e-9);

    let away_lead = predictor
        .predict_match_outcome("Arsenal", "Burnley", odds(), ht(0, 3))
        .unwrap();
    assert_eq!(away_lead.outcome, Outcome::AwayWin);
    assert!((away_lead.probs.away - home_lead.probs.home).abs() < 1e-9);
}

#[test]
fn probabilities_form_a_simplex() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let scaler = load_scaler(&fixture_path("outcome_scaler.json")).unwrap();
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();

    for (home, away) in [("Arsenal", "Newcastle"), ("Burnley", "Arsenal"), ("Newcastle", "Burnley")] {
        for score in [ht(0, 0), ht(1, 2), ht(4, 1)] {
            let p = predictor
                .predict_match_outcome(home, away, odds(), score)
                .unwrap()
                .probs;
            assert!((p.sum() - 1.0).abs() < 1e-6);
            for outcome in Outcome::ALL {
                assert!((0.0..=1.0).contains(&p.get(outcome)));
            }
        }
    }
}

#[test]
fn derived_features_use_latest_season_and_last_win_rate() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let scaler = load_scaler(&fixture_path("outcome_scaler.json")).unwrap();
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();
    let prediction = predictor
        .predict_match_outcome("Arsenal", "Burnley", odds(), ht(1, 0))
        .unwrap();

    let f = &prediction.features;
    assert_eq!(f.home.won, 28.0);
    assert!((f.home.draw_rate - 5.0 / 38.0).abs() < 1e-6);
    assert!((f.away.loss_rate - 24.0 / 38.0).abs() < 1e-6);
    assert_eq!(f.pos_diff, 17.0);
    assert!((f.pos_ratio - 2.0 / 19.0).abs() < 1e-4);
    assert!((f.hd_ratio - 0.375).abs() < 1e-4);
    assert!((f.ha_ratio - 0.25).abs() < 1e-4);
    assert!((f.da_ratio - 0.6667).abs() < 1e-4);
    assert_eq!(prediction.home_win_rate(), 0.70);
    assert_eq!(prediction.away_win_rate(), 0.10);
}

#[test]
fn zero_games_played_still_predicts() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let scaler = load_scaler(&fixture_path("outcome_scaler.json")).unwrap();
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();
    let prediction = predictor
        .predict_match_outcome("Promoted FC", "Arsenal", odds(), ht(0, 0))
        .unwrap();
    assert_eq!(prediction.features.home.draw_rate, 0.0);
    assert_eq!(prediction.features.home.loss_rate, 0.0);
    assert!(prediction.features.pos_ratio.is_finite());
    assert!((prediction.probs.sum() - 1.0).abs() < 1e-6);
}

#[test]
fn missing_team_fails_before_scoring() {
    let tables = tables();
    let model = CountingClassifier::new();
    let scaler = unit_scaler(1);
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();

    let err = predictor
        .predict_match_outcome("Atlantis", "Arsenal", odds(), ht(0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        PredictError::MissingReferenceRow { table, ref team } if table == CLUB_STATS_TABLE && team == "Atlantis"
    ));

    let err = predictor
        .predict_match_outcome("Arsenal", "Orphan Town", odds(), ht(0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        PredictError::MissingReferenceRow { table, .. } if table == WIN_RATE_TABLE
    ));

    let err = predictor
        .predict_match_outcome("Ghost United", "Arsenal", odds(), ht(0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        PredictError::MissingReferenceRow { table, .. } if table == CLUB_STATS_TABLE
    ));

    assert_eq!(model.calls.load(Ordering::SeqCst), 0);

    predictor
        .predict_match_outcome("Arsenal", "Burnley", odds(), ht(0, 0))
        .unwrap();
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn invalid_odds_fail_before_scoring() {
    let tables = tables();
    let model = CountingClassifier::new();
    let scaler = unit_scaler(1);
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();
    let err = predictor
        .predict_match_outcome("Arsenal", "Burnley", OddsTriple::new(0.5, 3.0, 4.0), ht(0, 0))
        .unwrap_err();
    assert!(matches!(err, PredictError::OutOfRange { .. }));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn scaler_width_must_match_model() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let scaler = unit_scaler(2);
    assert!(matches!(
        MatchPredictor::new(&model, &scaler, &tables),
        Err(PredictError::WidthMismatch { expected: 4, found: 2 })
    ));
}

#[test]
fn integer_labels_decode_through_class_names() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_forest.json")).unwrap();
    assert_eq!(
        model.classes(),
        &[Outcome::AwayWin, Outcome::Draw, Outcome::HomeWin]
    );
    let scaler = unit_scaler(1);
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();

    let level = predictor
        .predict_match_outcome("Newcastle", "Burnley", odds(), ht(0, 0))
        .unwrap();
    assert_eq!(level.outcome, Outcome::Draw);
    assert!((level.probs.home - 0.2).abs() < 1e-9);
    assert!((level.probs.draw - 0.5).abs() < 1e-9);
    assert!((level.probs.away - 0.3).abs() < 1e-9);

    let ahead = predictor
        .predict_match_outcome("Newcastle", "Burnley", odds(), ht(1, 0))
        .unwrap();
    assert_eq!(ahead.outcome, Outcome::HomeWin);
    assert!((ahead.probs.home - 0.8).abs() < 1e-9);
}

#[test]
fn integer_labels_without_class_names_are_rejected() {
    let err = load_outcome_model(&fixture_path("outcome_unmapped_ints.json")).unwrap_err();
    match err {
        PredictError::InvalidArtifact { path, reason } => {
            assert!(path.ends_with("outcome_unmapped_ints.json"));
            assert!(reason.contains("class_names"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn scaler_columns_must_match_model_by_name() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let mut scaler = load_scaler(&fixture_path("outcome_scaler.json")).unwrap();
    scaler.feature_names = Some(
        ["HTHG", "HTAG", "HDRatio", "PosDiff"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    match MatchPredictor::new(&model, &scaler, &tables) {
        Err(PredictError::ScalerMismatch { index, scaler, model }) => {
            assert_eq!(index, 2);
            assert_eq!(scaler, "HDRatio");
            assert_eq!(model, "PosDiff");
        }
        Err(other) => panic!("unexpected {other:?}"),
        Ok(_) => panic!("mismatched scaler was accepted"),
    }
}

#[test]
fn recommendation_backs_only_when_form_agrees() {
    let tables = tables();
    let model = load_outcome_model(&fixture_path("outcome_model.json")).unwrap();
    let scaler = load_scaler(&fixture_path("outcome_scaler.json")).unwrap();
    let predictor = MatchPredictor::new(&model, &scaler, &tables).unwrap();

    let agree = predictor
        .predict_match_outcome("Arsenal", "Burnley", odds(), ht(2, 0))
        .unwrap();
    let rec = recommend(&agree, DEFAULT_DRAW_THRESHOLD);
    assert_eq!(rec.form_lean, Outcome::HomeWin);
    assert_eq!(rec.action, BetAction::Back(Outcome::HomeWin));

    let disagree = predictor
        .predict_match_outcome("Arsenal", "Burnley", odds(), ht(0, 2))
        .unwrap();
    let rec = recommend(&disagree, DEFAULT_DRAW_THRESHOLD);
    assert_eq!(rec.predicted, Outcome::AwayWin);
    assert_eq!(rec.action, BetAction::Avoid);
}
