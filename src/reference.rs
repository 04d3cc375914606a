use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::PredictError;
use crate::sanitize::season_start_year;

pub const CLUB_STATS_TABLE: &str = "club stats";
pub const WIN_RATE_TABLE: &str = "win rate";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClubStatsRow {
    #[serde(rename = "Club")]
    pub club: String,
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Position")]
    pub position: f64,
    #[serde(rename = "Played")]
    pub played: f64,
    #[serde(rename = "Won")]
    pub won: f64,
    #[serde(rename = "Drawn")]
    pub drawn: f64,
    #[serde(rename = "Lost")]
    pub lost: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WinRateRow {
    #[serde(rename = "HomeTeam")]
    pub team: String,
    #[serde(rename = "HomeWinRate")]
    pub home_win_rate: f64,
    #[serde(rename = "AwayWinRate")]
    pub away_win_rate: f64,
}

pub const CLUB_STATS_COLUMNS: [&str; 7] =
    ["Club", "Season", "Position", "Played", "Won", "Drawn", "Lost"];
pub const WIN_RATE_COLUMNS: [&str; 3] = ["HomeTeam", "HomeWinRate", "AwayWinRate"];

/// A row whose team is known but one of whose numeric cells is not.
#[derive(Debug, Clone, PartialEq)]
struct RejectedRow {
    table: &'static str,
    team: String,
    field: &'static str,
    raw: String,
}

/// League-table and win-rate rows the match assembler joins against.
/// Loaded once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    clubs: Vec<ClubStatsRow>,
    win_rates: Vec<WinRateRow>,
    rejected: Vec<RejectedRow>,
}

impl ReferenceTables {
    pub fn load(club_stats: &Path, win_rates: &Path) -> Result<Self, PredictError> {
        let tables = Self::from_readers_at(
            open_table(club_stats)?,
            club_stats,
            open_table(win_rates)?,
            win_rates,
        )?;
        info!(
            "loaded reference tables: {} club rows, {} win-rate rows",
            tables.clubs.len(),
            tables.win_rates.len()
        );
        Ok(tables)
    }

    pub fn from_readers<A: Read, B: Read>(clubs: A, win_rates: B) -> Result<Self, PredictError> {
        Self::from_readers_at(
            clubs,
            Path::new(CLUB_STATS_TABLE),
            win_rates,
            Path::new(WIN_RATE_TABLE),
        )
    }

    fn from_readers_at<A: Read, B: Read>(
        clubs: A,
        clubs_origin: &Path,
        win_rates: B,
        win_rates_origin: &Path,
    ) -> Result<Self, PredictError> {
        let (clubs, mut rejected) =
            rows_from_reader(clubs, clubs_origin, CLUB_STATS_TABLE, &CLUB_STATS_COLUMNS)?;
        let (win_rates, rejected_rates) =
            rows_from_reader(win_rates, win_rates_origin, WIN_RATE_TABLE, &WIN_RATE_COLUMNS)?;
        rejected.extend(rejected_rates);
        Ok(Self {
            clubs,
            win_rates,
            rejected,
        })
    }

    /// Most recent season row for `team`; ties go to the later row.
    pub fn latest_club_row(&self, team: &str) -> Result<&ClubStatsRow, PredictError> {
        let mut best: Option<(&ClubStatsRow, Option<u32>)> = None;
        for row in self.clubs.iter().filter(|r| same_team(&r.club, team)) {
            let year = season_start_year(&row.season);
            match best {
                Some((_, best_year)) if year < best_year => {}
                _ => best = Some((row, year)),
            }
        }
        best.map(|(row, _)| row)
            .ok_or_else(|| self.missing(CLUB_STATS_TABLE, team))
    }

    /// Last win-rate row for `team` in file order.
    pub fn win_rate_row(&self, team: &str) -> Result<&WinRateRow, PredictError> {
        self.win_rates
            .iter()
            .rev()
            .find(|r| same_team(&r.team, team))
            .ok_or_else(|| self.missing(WIN_RATE_TABLE, team))
    }

    /// Teams that can be selected for a match: present in both tables.
    pub fn teams(&self) -> Vec<String> {
        let with_rates: BTreeSet<String> = self
            .win_rates
            .iter()
            .map(|r| r.team.trim().to_ascii_lowercase())
            .collect();
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for row in &self.clubs {
            let name = row.club.trim();
            let key = name.to_ascii_lowercase();
            if with_rates.contains(&key) && seen.insert(key) {
                out.push(name.to_string());
            }
        }
        out.sort();
        out
    }

    /// A team with no usable row is reported as malformed when one of its rows
    /// was rejected, otherwise as missing.
    fn missing(&self, table: &'static str, team: &str) -> PredictError {
        match self
            .rejected
            .iter()
            .rev()
            .find(|r| r.table == table && same_team(&r.team, team))
        {
            Some(r) => PredictError::MalformedField {
                field: r.field,
                raw: r.raw.clone(),
            },
            None => PredictError::MissingReferenceRow {
                table,
                team: team.to_string(),
            },
        }
    }
}

fn same_team(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn open_table(path: &Path) -> Result<File, PredictError> {
    File::open(path).map_err(|e| PredictError::ReferenceTable {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })
}

/// Fails unless every `required` column is present in `headers`.
pub(crate) fn require_columns(
    headers: &csv::StringRecord,
    origin: &Path,
    table: &'static str,
    required: &[&'static str],
) -> Result<(), PredictError> {
    for column in required.iter().copied() {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(PredictError::MissingColumn {
                path: origin.to_path_buf(),
                table,
                column,
            });
        }
    }
    Ok(())
}

/// Rows that deserialize, plus the rows whose key cell parsed but some
/// other cell did not. The key is the first `required` column.
fn rows_from_reader<T: for<'de> Deserialize<'de>, R: Read>(
    rdr: R,
    origin: &Path,
    table: &'static str,
    required: &[&'static str],
) -> Result<(Vec<T>, Vec<RejectedRow>), PredictError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let headers = reader
        .headers()
        .map_err(|source| PredictError::ReferenceTable {
            path: origin.to_path_buf(),
            source,
        })?
        .clone();
    require_columns(&headers, origin, table, required)?;
    let key_idx = headers.iter().position(|h| Some(&h) == required.first());

    let mut rows = Vec::new();
    let mut rejected = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping {table} row {}: {err}", idx + 1);
                continue;
            }
        };
        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => rows.push(row),
            Err(err) => {
                warn!("skipping {table} row {}: {err}", idx + 1);
                if let Some(row) = reject(table, &headers, &record, key_idx, required, &err) {
                    rejected.push(row);
                }
            }
        }
    }
    Ok((rows, rejected))
}

fn reject(
    table: &'static str,
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
    key_idx: Option<usize>,
    required: &[&'static str],
    err: &csv::Error,
) -> Option<RejectedRow> {
    let csv::ErrorKind::Deserialize { err, .. } = err.kind() else {
        return None;
    };
    let field_idx = err.field()? as usize;
    let name = headers.get(field_idx)?;
    let field = required.iter().copied().find(|c| *c == name)?;
    let team = record.get(key_idx?)?.to_string();
    if team.is_empty() {
        return None;
    }
    Some(RejectedRow {
        table,
        team,
        field,
        raw: record.get(field_idx).unwrap_or_default().to_string(),
    })
}
