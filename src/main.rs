use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pitch_predict::batch::value_players;
use pitch_predict::config::Settings;
use pitch_predict::export::{export_valuations, format_eur};
use pitch_predict::model_store::ModelStore;
use pitch_predict::presets::PresetCatalogue;
use pitch_predict::recommend::recommend;
use pitch_predict::reference::ReferenceTables;
use pitch_predict::{
    HalfTimeGoals, MatchPredictor, OddsTriple, Outcome, PlayerAttributes, Position, ValuePredictor,
};

#[derive(Debug, Parser)]
#[command(name = "pitch_predict", about = "Player value and match outcome predictions")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Estimate the market value of a custom player
    Value {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 24)]
        age: u32,
        /// height in cm
        #[arg(long, default_value_t = 180)]
        height: u32,
        /// weight in kg
        #[arg(long, default_value_t = 75)]
        weight: u32,
        #[arg(long, default_value_t = 80.0)]
        potential: f64,
        #[arg(long, value_parser = parse_position)]
        position: Position,
        #[arg(long, default_value_t = 70.0)]
        stamina: f64,
        #[arg(long, default_value_t = 70.0)]
        dribbling: f64,
        #[arg(long, default_value_t = 70.0)]
        short_passing: f64,
    },
    /// Search the preset player catalogue and value the matches
    Preset {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "position", value_parser = parse_position)]
        positions: Vec<Position>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        players: Option<PathBuf>,
    },
    /// Value every preset player and write an xlsx workbook
    Batch {
        #[arg(long)]
        out: PathBuf,
        #[arg(long = "position", value_parser = parse_position)]
        positions: Vec<Position>,
        #[arg(long)]
        players: Option<PathBuf>,
    },
    /// List teams available for match prediction
    Teams,
    /// Predict home/draw/away for a fixture
    Match {
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        /// home,draw,away decimal odds
        #[arg(long, value_parser = parse_odds)]
        odds: OddsTriple,
        /// home,away goals at half time
        #[arg(long, value_parser = parse_half_time, default_value = "0,0")]
        half_time: HalfTimeGoals,
        #[arg(long)]
        draw_threshold: Option<f64>,
    },
}

fn parse_position(s: &str) -> Result<Position, String> {
    s.parse::<Position>().map_err(|e| e.to_string())
}

fn parse_triple(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{part}' is not a number"))
        })
        .collect()
}

fn parse_odds(s: &str) -> Result<OddsTriple, String> {
    match parse_triple(s)?.as_slice() {
        [h, d, a] => Ok(OddsTriple::new(*h, *d, *a)),
        _ => Err(format!("expected home,draw,away odds, got '{s}'")),
    }
}

fn parse_half_time(s: &str) -> Result<HalfTimeGoals, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid half-time score '{s}': {e}"))?;
    match parts.as_slice() {
        [home, away] => Ok(HalfTimeGoals {
            home: *home,
            away: *away,
        }),
        _ => Err(format!("expected home,away goals, got '{s}'")),
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::from_env();
    debug!("settings: {settings:?}");
    let store = ModelStore::new(settings.models.clone());

    match args.command {
        Command::Value {
            name,
            age,
            height,
            weight,
            potential,
            position,
            stamina,
            dribbling,
            short_passing,
        } => {
            let attrs = PlayerAttributes {
                name,
                age,
                height_cm: height,
                weight_kg: weight,
                potential,
                best_position: position,
                stamina,
                dribbling,
                short_passing,
            };
            let model = store.value_model()?;
            let prediction = ValuePredictor::new(model).predict_player_value(&attrs)?;
            println!("Estimated value: {}", format_eur(prediction.value));
            if prediction.is_suspect_scale() {
                println!("[WARN] estimate is implausibly large; the model's units may not match");
            }
        }
        Command::Preset {
            search,
            positions,
            limit,
            players,
        } => {
            let path = players.unwrap_or_else(|| settings.players.clone());
            let catalogue = PresetCatalogue::load(&path)?;
            let matches = catalogue.search(&search, &positions);
            println!(
                "Available preset players: {}",
                PresetCatalogue::distinct_names(matches.iter().copied())
            );
            if matches.is_empty() {
                return Err(anyhow!("no players match '{search}' with the selected positions"));
            }
            let model = store.value_model()?;
            let predictor = ValuePredictor::new(model);
            for player in matches.into_iter().take(limit) {
                let label = player.name.as_deref().unwrap_or("unnamed player");
                match predictor.predict_player_value(player) {
                    Ok(p) => println!(
                        "{label:<28} {:<4} age {:>2}  {}",
                        player.best_position,
                        player.age,
                        format_eur(p.value)
                    ),
                    Err(err) => println!("{label:<28} [ERR] {err}"),
                }
            }
        }
        Command::Batch {
            out,
            positions,
            players,
        } => {
            let path = players.unwrap_or_else(|| settings.players.clone());
            let catalogue = PresetCatalogue::load(&path)?;
            let selected = catalogue.search("", &positions);
            let model = store.value_model()?;
            let predictor = ValuePredictor::new(model);
            let report = value_players(&predictor, &selected, settings.batch_threads);
            export_valuations(&out, &report, model.path())
                .with_context(|| format!("export valuations to {}", out.display()))?;
            println!(
                "Valued {} players ({} errors) -> {}",
                report.valuations.len(),
                report.errors.len(),
                out.display()
            );
        }
        Command::Teams => {
            let tables = ReferenceTables::load(&settings.club_stats, &settings.win_rates)?;
            for team in tables.teams() {
                println!("{team}");
            }
        }
        Command::Match {
            home,
            away,
            odds,
            half_time,
            draw_threshold,
        } => {
            let tables = ReferenceTables::load(&settings.club_stats, &settings.win_rates)?;
            let model = store.outcome_model()?;
            let scaler = store.scaler()?;
            let predictor = MatchPredictor::new(model, scaler, &tables)?;
            let prediction = predictor.predict_match_outcome(&home, &away, odds, half_time)?;

            println!("{home} vs {away}");
            println!("Prediction: {}", prediction.outcome);
            for outcome in Outcome::ALL {
                println!(
                    "  {:<9} {:>5.1}%",
                    outcome.label(),
                    prediction.probs.get(outcome) * 100.0
                );
            }
            let threshold = draw_threshold
                .map(|t| t.clamp(0.0, 1.0))
                .unwrap_or(settings.draw_threshold);
            println!("Recommendation: {}", recommend(&prediction, threshold));
        }
    }

    Ok(())
}
