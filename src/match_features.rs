use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::features::{FeatureRow, safe_div};
use crate::reference::{ClubStatsRow, ReferenceTables};
use crate::sanitize::check_range;

/// Bookmaker column prefixes in the historical results files.
pub const BOOKMAKERS: [&str; 6] = ["B365", "BW", "PS", "WH", "Avg", "Max"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsTriple {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OddsTriple {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        check_range("home odds", self.home, 1.0, 1000.0)?;
        check_range("draw odds", self.draw, 1.0, 1000.0)?;
        check_range("away odds", self.away, 1.0, 1000.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfTimeGoals {
    pub home: u32,
    pub away: u32,
}

/// Which derived columns a classifier variant was trained on, and under which
/// names. One assembler serves every variant through this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSchema {
    pub bookmakers: Vec<String>,
    pub half_time_goals: bool,
    pub table_fields: bool,
    pub rates: bool,
    pub position_features: bool,
    pub odds_ratios: bool,
}

impl Default for MatchSchema {
    fn default() -> Self {
        Self {
            bookmakers: BOOKMAKERS.iter().map(|b| b.to_string()).collect(),
            half_time_goals: true,
            table_fields: true,
            rates: true,
            position_features: true,
            odds_ratios: true,
        }
    }
}

/// Everything the classifier can see for one fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFeatureRow {
    pub half_time: HalfTimeGoals,
    pub odds: OddsTriple,
    pub home: SideFeatures,
    pub away: SideFeatures,
    pub pos_diff: f64,
    pub pos_ratio: f64,
    pub hd_ratio: f64,
    pub ha_ratio: f64,
    pub da_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideFeatures {
    pub position: f64,
    pub played: f64,
    pub won: f64,
    pub drawn: f64,
    pub lost: f64,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
}

impl SideFeatures {
    pub fn from_table(row: &ClubStatsRow, win_rate: f64) -> Self {
        Self {
            position: row.position,
            played: row.played,
            won: row.won,
            drawn: row.drawn,
            lost: row.lost,
            win_rate,
            draw_rate: safe_div(row.drawn, row.played),
            loss_rate: safe_div(row.lost, row.played),
        }
    }
}

impl MatchFeatureRow {
    pub fn derive(
        home: SideFeatures,
        away: SideFeatures,
        odds: OddsTriple,
        half_time: HalfTimeGoals,
    ) -> Self {
        Self {
            half_time,
            odds,
            home,
            away,
            pos_diff: away.position - home.position,
            pos_ratio: safe_div(home.position, away.position),
            hd_ratio: safe_div(odds.home, odds.draw),
            ha_ratio: safe_div(odds.home, odds.away),
            da_ratio: safe_div(odds.draw, odds.away),
        }
    }

    pub fn to_row(&self, schema: &MatchSchema) -> FeatureRow {
        let mut row = FeatureRow::with_capacity(48);
        if schema.half_time_goals {
            row.set("HTHG", self.half_time.home as f64);
            row.set("HTAG", self.half_time.away as f64);
        }
        // One odds triple is entered; every bookmaker column gets the same one.
        for bookie in &schema.bookmakers {
            row.set(format!("{bookie}H"), self.odds.home);
            row.set(format!("{bookie}D"), self.odds.draw);
            row.set(format!("{bookie}A"), self.odds.away);
        }
        if schema.table_fields {
            push_side(&mut row, "H", &self.home);
            push_side(&mut row, "A", &self.away);
        }
        if schema.rates {
            row.set("HWinRate", self.home.win_rate);
            row.set("AWinRate", self.away.win_rate);
            row.set("HDrawRate", self.home.draw_rate);
            row.set("ADrawRate", self.away.draw_rate);
            row.set("HLossRate", self.home.loss_rate);
            row.set("ALossRate", self.away.loss_rate);
        }
        if schema.position_features {
            row.set("PosDiff", self.pos_diff);
            row.set("PosRatio", self.pos_ratio);
        }
        if schema.odds_ratios {
            row.set("HDRatio", self.hd_ratio);
            row.set("HARatio", self.ha_ratio);
            row.set("DARatio", self.da_ratio);
        }
        row
    }
}

fn push_side(row: &mut FeatureRow, prefix: &str, side: &SideFeatures) {
    row.set(format!("{prefix}Pos"), side.position);
    row.set(format!("{prefix}Played"), side.played);
    row.set(format!("{prefix}Won"), side.won);
    row.set(format!("{prefix}Drawn"), side.drawn);
    row.set(format!("{prefix}Lost"), side.lost);
}

/// Joins both teams against the reference tables. Fails before any scoring
/// when either team is missing from either table.
pub fn assemble_match_features(
    tables: &ReferenceTables,
    home_team: &str,
    away_team: &str,
    odds: OddsTriple,
    half_time: HalfTimeGoals,
) -> Result<MatchFeatureRow, PredictError> {
    odds.validate()?;

    let home_row = tables.latest_club_row(home_team)?;
    let away_row = tables.latest_club_row(away_team)?;
    let home_rate = tables.win_rate_row(home_team)?.home_win_rate;
    let away_rate = tables.win_rate_row(away_team)?.away_win_rate;

    Ok(MatchFeatureRow::derive(
        SideFeatures::from_table(home_row, home_rate),
        SideFeatures::from_table(away_row, away_rate),
        odds,
        half_time,
    ))
}
