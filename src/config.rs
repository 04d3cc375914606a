use std::env;
use std::path::{Path, PathBuf};

use crate::model_store::{ModelPaths, OUTCOME_MODEL_FILE, OUTCOME_SCALER_FILE, VALUE_MODEL_FILE};
use crate::recommend::DEFAULT_DRAW_THRESHOLD;

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_DATA_DIR: &str = "data";
const CLUB_STATS_FILE: &str = "club_stats.csv";
const WIN_RATES_FILE: &str = "win_rates.csv";
const PLAYERS_FILE: &str = "players_stats.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub models: ModelPaths,
    pub club_stats: PathBuf,
    pub win_rates: PathBuf,
    pub players: PathBuf,
    pub draw_threshold: f64,
    pub batch_threads: Option<usize>,
}

impl Settings {
    /// Resolves every path and knob from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_dir = var("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));
        let data_dir = var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let path_or = |key: &str, dir: &Path, file: &str| {
            var(key).map(PathBuf::from).unwrap_or_else(|| dir.join(file))
        };

        let draw_threshold = var("DRAW_THRESHOLD")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_DRAW_THRESHOLD)
            .clamp(0.0, 1.0);
        let batch_threads = var("BATCH_THREADS")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0);

        Self {
            models: ModelPaths {
                value_model: path_or("VALUE_MODEL_PATH", &model_dir, VALUE_MODEL_FILE),
                outcome_model: path_or("OUTCOME_MODEL_PATH", &model_dir, OUTCOME_MODEL_FILE),
                outcome_scaler: path_or("OUTCOME_SCALER_PATH", &model_dir, OUTCOME_SCALER_FILE),
            },
            club_stats: path_or("CLUB_STATS_PATH", &data_dir, CLUB_STATS_FILE),
            win_rates: path_or("WIN_RATES_PATH", &data_dir, WIN_RATES_FILE),
            players: path_or("PLAYERS_PATH", &data_dir, PLAYERS_FILE),
            draw_threshold,
            batch_threads,
        }
    }
}
