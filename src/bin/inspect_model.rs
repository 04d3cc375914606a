use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use pitch_predict::model_store::{load_outcome_model, load_scaler, load_value_model};
use pitch_predict::{Classifier, Regressor};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: inspect_model <artifact.json>"))?;

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    println!("Artifact: {}", path.display());
    if value.get("classes").is_some() {
        let model = load_outcome_model(&path)?;
        println!("Type: outcome classifier ({})", model.kind());
        println!("Classes (model order): {:?}", model.classes());
        print_columns(model.feature_names());
    } else if value.get("mean").is_some() {
        let scaler = load_scaler(&path)?;
        println!("Type: scaler");
        println!("Width: {}", scaler.width());
        match &scaler.feature_names {
            Some(names) => print_columns(names),
            None => println!("Columns: (unnamed)"),
        }
    } else {
        let model = load_value_model(&path)?;
        println!("Type: value regressor ({})", model.kind());
        print_columns(model.feature_names());
    }

    Ok(())
}

fn print_columns(names: &[String]) {
    println!("Columns: {}", names.len());
    for (idx, name) in names.iter().enumerate() {
        println!("  {idx:>3}  {name}");
    }
}
