use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::PredictError;
use crate::player_features::{PlayerAttributes, Position};
use crate::reference::require_columns;
use crate::sanitize::{parse_field, parse_rating};

pub const PLAYERS_TABLE: &str = "players";
pub const PLAYER_COLUMNS: [&str; 9] = [
    "Full Name",
    "Age",
    "Height",
    "Weight",
    "Potential",
    "Best position",
    "Stamina",
    "Dribbling",
    "Short passing",
];

/// One row of the scraped ratings export. Cells keep their scraped text
/// ("180cm", "75kg", "70\n+2") until [`RawPlayerRecord::to_attributes`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayerRecord {
    #[serde(rename = "Full Name", default)]
    pub full_name: Option<String>,
    #[serde(rename = "Age", default)]
    pub age: Option<String>,
    #[serde(rename = "Height", default)]
    pub height: Option<String>,
    #[serde(rename = "Weight", default)]
    pub weight: Option<String>,
    #[serde(rename = "Potential", default)]
    pub potential: Option<String>,
    #[serde(rename = "Best position", default)]
    pub best_position: Option<String>,
    #[serde(rename = "Stamina", default)]
    pub stamina: Option<String>,
    #[serde(rename = "Dribbling", default)]
    pub dribbling: Option<String>,
    #[serde(rename = "Short passing", default)]
    pub short_passing: Option<String>,
}

impl RawPlayerRecord {
    /// True when any required cell is absent or blank.
    pub fn has_gaps(&self) -> bool {
        [
            &self.full_name,
            &self.age,
            &self.height,
            &self.weight,
            &self.potential,
            &self.best_position,
            &self.stamina,
            &self.dribbling,
            &self.short_passing,
        ]
        .iter()
        .any(|cell| cell.as_deref().is_none_or(|s| s.trim().is_empty()))
    }

    pub fn to_attributes(&self) -> Result<PlayerAttributes, PredictError> {
        let cell = |v: &Option<String>| v.clone().unwrap_or_default();
        let attrs = PlayerAttributes {
            name: self.full_name.as_ref().map(|n| n.trim().to_string()),
            age: parse_field("Age", &cell(&self.age))?.round() as u32,
            height_cm: parse_field("Height", &cell(&self.height))?.round() as u32,
            weight_kg: parse_field("Weight", &cell(&self.weight))?.round() as u32,
            potential: parse_rating("Potential", &cell(&self.potential))?,
            best_position: cell(&self.best_position).parse()?,
            stamina: parse_rating("Stamina", &cell(&self.stamina))?,
            dribbling: parse_rating("Dribbling", &cell(&self.dribbling))?,
            short_passing: parse_rating("Short passing", &cell(&self.short_passing))?,
        };
        attrs.validate()?;
        Ok(attrs)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresetCatalogue {
    players: Vec<PlayerAttributes>,
}

impl PresetCatalogue {
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let file = File::open(path).map_err(|e| PredictError::ReferenceTable {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
        let catalogue = Self::from_reader_at(file, path)?;
        info!(
            "loaded {} preset players from {}",
            catalogue.players.len(),
            path.display()
        );
        Ok(catalogue)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, PredictError> {
        Self::from_reader_at(rdr, Path::new(PLAYERS_TABLE))
    }

    fn from_reader_at<R: Read>(rdr: R, origin: &Path) -> Result<Self, PredictError> {
        let mut reader = csv::Reader::from_reader(rdr);
        let headers = reader.headers().map_err(|source| PredictError::ReferenceTable {
            path: origin.to_path_buf(),
            source,
        })?;
        require_columns(headers, origin, PLAYERS_TABLE, &PLAYER_COLUMNS)?;

        let mut players = Vec::new();
        let mut gaps = 0usize;
        for (idx, result) in reader.deserialize::<RawPlayerRecord>().enumerate() {
            let raw = match result {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("skipping player row {}: {err}", idx + 1);
                    continue;
                }
            };
            if raw.has_gaps() {
                gaps += 1;
                continue;
            }
            match raw.to_attributes() {
                Ok(attrs) => players.push(attrs),
                Err(err) => warn!("skipping player row {}: {err}", idx + 1),
            }
        }
        if gaps > 0 {
            debug!("dropped {gaps} player rows with blank cells");
        }
        Ok(Self { players })
    }

    pub fn players(&self) -> &[PlayerAttributes] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Case-insensitive name substring match, restricted to `positions` when
    /// that is non-empty.
    pub fn search(&self, name: &str, positions: &[Position]) -> Vec<&PlayerAttributes> {
        let needle = name.trim().to_lowercase();
        self.players
            .iter()
            .filter(|p| positions.is_empty() || positions.contains(&p.best_position))
            .filter(|p| {
                needle.is_empty()
                    || p.name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.players
            .iter()
            .map(|p| p.best_position)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn distinct_names<'a>(players: impl IntoIterator<Item = &'a PlayerAttributes>) -> usize {
        players
            .into_iter()
            .filter_map(|p| p.name.as_deref())
            .collect::<BTreeSet<_>>()
            .len()
    }
}
