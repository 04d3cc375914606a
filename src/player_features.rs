use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::features::FeatureRow;
use crate::sanitize::check_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    GK,
    CB,
    LB,
    RB,
    LWB,
    RWB,
    CDM,
    CM,
    CAM,
    LM,
    RM,
    LW,
    RW,
    CF,
    ST,
}

impl Position {
    pub const ALL: [Position; 15] = [
        Position::GK,
        Position::CB,
        Position::LB,
        Position::RB,
        Position::LWB,
        Position::RWB,
        Position::CDM,
        Position::CM,
        Position::CAM,
        Position::LM,
        Position::RM,
        Position::LW,
        Position::RW,
        Position::CF,
        Position::ST,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Position::GK => "GK",
            Position::CB => "CB",
            Position::LB => "LB",
            Position::RB => "RB",
            Position::LWB => "LWB",
            Position::RWB => "RWB",
            Position::CDM => "CDM",
            Position::CM => "CM",
            Position::CAM => "CAM",
            Position::LM => "LM",
            Position::RM => "RM",
            Position::LW => "LW",
            Position::RW => "RW",
            Position::CF => "CF",
            Position::ST => "ST",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Position::ALL
            .into_iter()
            .find(|p| p.code() == code)
            .ok_or_else(|| PredictError::MalformedField {
                field: "Best position",
                raw: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    #[serde(default)]
    pub name: Option<String>,
    pub age: u32,
    pub height_cm: u32,
    pub weight_kg: u32,
    pub potential: f64,
    pub best_position: Position,
    pub stamina: f64,
    pub dribbling: f64,
    pub short_passing: f64,
}

impl PlayerAttributes {
    pub fn validate(&self) -> Result<(), PredictError> {
        check_range("Age", self.age as f64, 10.0, 60.0)?;
        check_range("Height", self.height_cm as f64, 100.0, 250.0)?;
        check_range("Weight", self.weight_kg as f64, 30.0, 200.0)?;
        check_range("Potential", self.potential, 0.0, 100.0)?;
        check_range("Stamina", self.stamina, 0.0, 100.0)?;
        check_range("Dribbling", self.dribbling, 0.0, 100.0)?;
        check_range("Short passing", self.short_passing, 0.0, 100.0)?;
        Ok(())
    }
}

/// Column naming a value model was trained with. The default matches the
/// scraped ratings export: plain attribute headers plus `get_dummies`-style
/// position indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSchema {
    pub age: String,
    pub height: String,
    pub weight: String,
    pub potential: String,
    pub stamina: String,
    pub dribbling: String,
    pub short_passing: String,
    pub position_prefix: String,
}

impl Default for PlayerSchema {
    fn default() -> Self {
        Self {
            age: "Age".to_string(),
            height: "Height".to_string(),
            weight: "Weight".to_string(),
            potential: "Potential".to_string(),
            stamina: "Stamina".to_string(),
            dribbling: "Dribbling".to_string(),
            short_passing: "Short passing".to_string(),
            position_prefix: "Best position_".to_string(),
        }
    }
}

impl PlayerSchema {
    pub fn position_column(&self, position: Position) -> String {
        format!("{}{}", self.position_prefix, position.code())
    }
}

pub fn assemble_player_row(
    attrs: &PlayerAttributes,
    schema: &PlayerSchema,
) -> Result<FeatureRow, PredictError> {
    attrs.validate()?;

    let mut row = FeatureRow::with_capacity(7 + Position::ALL.len());
    row.set(schema.age.clone(), attrs.age as f64);
    row.set(schema.height.clone(), attrs.height_cm as f64);
    row.set(schema.weight.clone(), attrs.weight_kg as f64);
    row.set(schema.potential.clone(), attrs.potential);
    row.set(schema.stamina.clone(), attrs.stamina);
    row.set(schema.dribbling.clone(), attrs.dribbling);
    row.set(schema.short_passing.clone(), attrs.short_passing);
    for position in Position::ALL {
        let hot = if position == attrs.best_position { 1.0 } else { 0.0 };
        row.set(schema.position_column(position), hot);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striker() -> PlayerAttributes {
        PlayerAttributes {
            name: None,
            age: 24,
            height_cm: 180,
            weight_kg: 75,
            potential: 80.0,
            best_position: Position::ST,
            stamina: 70.0,
            dribbling: 70.0,
            short_passing: 70.0,
        }
    }

    #[test]
    fn position_parses_case_insensitively() {
        assert_eq!(" cam ".parse::<Position>().unwrap(), Position::CAM);
        assert!("XX".parse::<Position>().is_err());
    }

    #[test]
    fn row_carries_one_hot_position() {
        let row = assemble_player_row(&striker(), &PlayerSchema::default()).unwrap();
        assert_eq!(row.get("Best position_ST"), Some(1.0));
        assert_eq!(row.get("Best position_GK"), Some(0.0));
        assert_eq!(row.get("Short passing"), Some(70.0));
        assert_eq!(row.len(), 7 + Position::ALL.len());
    }

    #[test]
    fn unseen_position_contributes_nothing_after_align() {
        let mut attrs = striker();
        attrs.best_position = Position::LWB;
        let row = assemble_player_row(&attrs, &PlayerSchema::default()).unwrap();
        let columns = vec![
            "Age".to_string(),
            "Best position_ST".to_string(),
            "Best position_CB".to_string(),
        ];
        let aligned = row.align(&columns);
        assert_eq!(aligned.values, vec![24.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_rating_above_hundred() {
        let mut attrs = striker();
        attrs.dribbling = 140.0;
        assert!(matches!(
            assemble_player_row(&attrs, &PlayerSchema::default()),
            Err(PredictError::OutOfRange { field: "Dribbling", .. })
        ));
    }
}
