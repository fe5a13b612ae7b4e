// Roster reports
// Filter and aggregate computations over the player catalog

#[cfg(test)]
mod tests;

use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use crate::catalog::{Catalog, Entity};
use crate::config::CatalogConfig;
use crate::features::{MissingValues, Scaling};
use crate::index::Metric;
use crate::search::{Match, SimilaritySearch};
use crate::{Result, ScoutError};

pub const PTS: &str = "PTS";
pub const REB: &str = "REB";
pub const AST: &str = "AST";
pub const AGE: &str = "AGE";
pub const FG2_PCT: &str = "FG2_PCT";
pub const PTS_RANK: &str = "PTS_RANK";
pub const AST_RANK: &str = "AST_RANK";
pub const BLK_RANK: &str = "BLK_RANK";
pub const STL_RANK: &str = "STL_RANK";

const SEVEN_FEET: f64 = 84.0;
const FRONTCOURT_HEIGHT: f64 = 77.0;
const FRONTCOURT_POSITIONS: [&str; 3] = ["C", "PF", "SF"];
const RANK_CUTOFF: f64 = 150.0;

/// Roster shape of one team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStructure {
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Total Players")]
    pub total_players: usize,
    #[serde(rename = "Players Under 27")]
    pub players_under_27: usize,
    #[serde(rename = "7-Footers")]
    pub seven_footers: usize,
    #[serde(rename = "Frontcourt Avg Height")]
    pub frontcourt_avg_height: Option<f64>,
    #[serde(rename = "Top Scorers")]
    pub top_scorers: Vec<String>,
    #[serde(rename = "Top Rebounders")]
    pub top_rebounders: Vec<String>,
    #[serde(rename = "Top Playmakers")]
    pub top_playmakers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

impl CheckStatus {
    #[inline]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Pass => "✅",
            Self::Fail => "❌",
            Self::Warn => "⚠️",
        }
    }

    fn from_check(passed: bool, soft: bool) -> Self {
        match (passed, soft) {
            (true, _) => Self::Pass,
            (false, true) => Self::Warn,
            (false, false) => Self::Fail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub status: CheckStatus,
    pub message: String,
}

/// Seven roster checks for one team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamEvaluation {
    pub team: String,
    pub checks: Vec<Check>,
}

impl fmt::Display for TeamEvaluation {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Team: {}", self.team)?;
        for check in &self.checks {
            writeln!(f, "{} {}", check.status.symbol(), check.message)?;
        }
        Ok(())
    }
}

/// Player from another team and how far their line is from the team average
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeCandidate<'a> {
    pub entity: &'a Entity,
    /// Sum of absolute differences to the team's PTS, REB and AST means
    pub score_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    /// SF/SG scoring over 10 with more than 3 rebounds
    #[value(name = "3-and-d")]
    ThreeAndDWing,
    /// More than 5 assists
    Playmaker,
    /// PF/C scoring over 10
    StretchBig,
}

impl fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ThreeAndDWing => "3&D Wing",
            Self::Playmaker => "Playmaker",
            Self::StretchBig => "Stretch Big",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopLists<'a> {
    /// Ten best scorers under 25
    pub young_scorers: Vec<&'a Entity>,
    /// Best rebounder of each position, positions sorted
    pub rebounders_by_position: Vec<&'a Entity>,
    /// Tallest player of each team, teams sorted
    pub tallest_by_team: Vec<&'a Entity>,
}

/// Jittered stat line for a player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParlayForecast {
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Predicted Points")]
    pub points: Option<f64>,
    #[serde(rename = "Predicted Rebounds")]
    pub rebounds: Option<f64>,
    #[serde(rename = "Predicted Assists")]
    pub assists: Option<f64>,
}

/// Team and player reports over a loaded catalog
#[derive(Debug, Clone, Copy)]
pub struct RosterAnalyzer<'a> {
    catalog: &'a Catalog,
    columns: &'a CatalogConfig,
}

impl<'a> RosterAnalyzer<'a> {
    #[inline]
    pub fn new(catalog: &'a Catalog, columns: &'a CatalogConfig) -> Self {
        Self { catalog, columns }
    }

    #[inline]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Sorted unique team abbreviations
    #[inline]
    pub fn teams(&self) -> Vec<String> {
        self.catalog
            .entities()
            .iter()
            .filter_map(|entity| self.team_of(entity))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Players of `team`, catalog order; the match ignores ASCII case
    #[inline]
    pub fn roster(&self, team: &str) -> Result<Vec<&'a Entity>> {
        let team = team.trim();
        let roster: Vec<&Entity> = self
            .catalog
            .entities()
            .iter()
            .filter(|entity| {
                self.team_of(entity)
                    .is_some_and(|t| t.eq_ignore_ascii_case(team))
            })
            .collect();

        if roster.is_empty() {
            return Err(ScoutError::NotFound(format!("Team '{}'", team)));
        }
        debug!("{} has {} players", team, roster.len());
        Ok(roster)
    }

    #[inline]
    pub fn player(&self, name: &str) -> Result<&'a Entity> {
        self.catalog
            .find(name.trim())
            .ok_or_else(|| ScoutError::NotFound(format!("Player '{}'", name.trim())))
    }

    #[inline]
    pub fn team_structure(&self, team: &str) -> Result<TeamStructure> {
        let roster = self.roster(team)?;

        let frontcourt_heights = roster
            .iter()
            .filter(|entity| {
                self.position_of(entity)
                    .is_some_and(|p| FRONTCOURT_POSITIONS.contains(&p))
            })
            .filter_map(|entity| self.height_of(entity));

        let names = |column: &str| {
            top_by(&roster, column, 3)
                .into_iter()
                .map(|entity| entity.id.clone())
                .collect::<Vec<_>>()
        };

        Ok(TeamStructure {
            team: self.canonical_team(&roster, team),
            total_players: roster.len(),
            players_under_27: count(&roster, |e| below(e, AGE, 27.0)),
            seven_footers: count(&roster, |e| self.height_at_least(e, SEVEN_FEET)),
            frontcourt_avg_height: mean(frontcourt_heights).map(|h| round_to(h, 2)),
            top_scorers: names(PTS),
            top_rebounders: names(REB),
            top_playmakers: names(AST),
        })
    }

    #[inline]
    pub fn compare_teams(&self, first: &str, second: &str) -> Result<[TeamStructure; 2]> {
        Ok([self.team_structure(first)?, self.team_structure(second)?])
    }

    /// Positional and statistical gaps in a roster
    #[inline]
    pub fn team_needs(&self, team: &str) -> Result<Vec<String>> {
        let roster = self.roster(team)?;
        let mut needs = Vec::new();

        let at_position =
            |pos: &str| count(&roster, |e| self.position_of(e).is_some_and(|p| p == pos));

        if at_position("PG") < 2 {
            needs.push("Needs more point guards".to_string());
        }
        if at_position("C") < 1 {
            needs.push("Needs at least 1 true center".to_string());
        }
        if column_mean(&roster, AST).is_some_and(|m| m < 3.0) {
            needs.push("Low playmaking".to_string());
        }
        if column_mean(&roster, REB).is_some_and(|m| m < 4.0) {
            needs.push("Low rebounding".to_string());
        }

        if needs.is_empty() {
            needs.push("Well-balanced roster".to_string());
        }
        Ok(needs)
    }

    #[inline]
    pub fn evaluate_team(&self, team: &str) -> Result<TeamEvaluation> {
        let roster = self.roster(team)?;
        let mut checks = Vec::with_capacity(7);
        let mut check = |passed: bool, soft: bool, message: String| {
            checks.push(Check {
                status: CheckStatus::from_check(passed, soft),
                message,
            });
        };

        let seven_footers = count(&roster, |e| self.height_at_least(e, SEVEN_FEET));
        check(
            seven_footers >= 2,
            false,
            format!("Has {} 7-footers", seven_footers),
        );

        let frontcourt = mean(
            roster
                .iter()
                .filter_map(|e| self.height_of(e))
                .filter(|h| *h >= FRONTCOURT_HEIGHT),
        );
        check(
            frontcourt.is_some_and(|h| h >= FRONTCOURT_HEIGHT),
            false,
            match frontcourt {
                Some(height) => format!("Avg frontcourt height: {:.1} in", height),
                None => "Avg frontcourt height: n/a".to_string(),
            },
        );

        let under_27 = count(&roster, |e| below(e, AGE, 27.0));
        check(
            under_27 >= 7,
            false,
            format!("{} players under age 27", under_27),
        );

        let defensive = count(&roster, |e| {
            below(e, BLK_RANK, RANK_CUTOFF) || below(e, STL_RANK, RANK_CUTOFF)
        });
        check(
            defensive >= 3,
            false,
            format!("{} defensive players", defensive),
        );

        let offensive = count(&roster, |e| {
            below(e, PTS_RANK, RANK_CUTOFF) || below(e, AST_RANK, RANK_CUTOFF)
        });
        check(
            offensive >= 5,
            false,
            format!("{} offensive players", offensive),
        );

        let midrange = count(&roster, |e| above(e, FG2_PCT, 0.50));
        check(
            midrange >= 3,
            true,
            format!("{} strong midrange shooters", midrange),
        );

        let veterans = count(&roster, |e| above(e, AGE, 30.0) && above(e, FG2_PCT, 0.50));
        check(
            veterans >= 2,
            true,
            format!("{} confident veterans", veterans),
        );

        Ok(TeamEvaluation {
            team: self.canonical_team(&roster, team),
            checks,
        })
    }

    /// Young players elsewhere whose line sits closest to this team's averages
    #[inline]
    pub fn suggest_trade(&self, team: &str, limit: usize) -> Result<Vec<TradeCandidate<'a>>> {
        let roster = self.roster(team)?;
        let means: Vec<f64> = [PTS, REB, AST]
            .iter()
            .map(|column| column_mean(&roster, column))
            .collect::<Option<_>>()
            .ok_or_else(|| {
                ScoutError::NotFound(format!("Scoring averages for team '{}'", team.trim()))
            })?;

        let mut candidates: Vec<TradeCandidate<'a>> = self
            .catalog
            .entities()
            .iter()
            .filter(|e| !self.on_team(e, team) && below(e, AGE, 27.0))
            .filter_map(|entity| {
                let score_delta = [PTS, REB, AST]
                    .iter()
                    .zip(&means)
                    .map(|(column, mean)| entity.attribute(column).map(|v| (v - mean).abs()))
                    .sum::<Option<f64>>()?;
                Some(TradeCandidate {
                    entity,
                    score_delta,
                })
            })
            .collect();

        candidates.sort_by(|a, b| a.score_delta.total_cmp(&b.score_delta));
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Young tall scorers on other teams
    #[inline]
    pub fn trade_targets(&self, team: &str, limit: usize) -> Result<Vec<&'a Entity>> {
        self.roster(team)?;
        let pool: Vec<&Entity> = self
            .catalog
            .entities()
            .iter()
            .filter(|e| {
                !self.on_team(e, team)
                    && below(e, AGE, 25.0)
                    && self.height_at_least(e, 81.0)
                    && e.attribute(PTS).is_some()
            })
            .collect();
        Ok(top_by(&pool, PTS, limit))
    }

    /// Players under 27 who are at least seven feet, best scoring rank first
    #[inline]
    pub fn young_bigs(&self, limit: usize) -> Vec<&'a Entity> {
        let mut bigs: Vec<&Entity> = self
            .catalog
            .entities()
            .iter()
            .filter(|e| below(e, AGE, 27.0) && self.height_at_least(e, SEVEN_FEET))
            .collect();
        bigs.sort_by(|a, b| by_stat(a, b, PTS_RANK, false));
        bigs.truncate(limit);
        bigs
    }

    #[inline]
    pub fn role_finder(&self, role: Role) -> Vec<&'a Entity> {
        let in_positions = |entity: &Entity, positions: &[&str]| {
            self.position_of(entity)
                .is_some_and(|p| positions.contains(&p))
        };

        let mut players: Vec<&Entity> = self
            .catalog
            .entities()
            .iter()
            .filter(|e| match role {
                Role::ThreeAndDWing => {
                    in_positions(e, &["SF", "SG"]) && above(e, PTS, 10.0) && above(e, REB, 3.0)
                }
                Role::Playmaker => above(e, AST, 5.0),
                Role::StretchBig => in_positions(e, &["PF", "C"]) && above(e, PTS, 10.0),
            })
            .collect();

        players.sort_by(|a, b| by_stat(a, b, PTS, true));
        debug!("{} players fit the {} role", players.len(), role);
        players
    }

    /// Nearest players by manhattan distance over raw `columns`
    ///
    /// Rows missing any of the columns are left out, so a player without them is not found.
    #[inline]
    pub fn archetype_matches(
        &self,
        player: &str,
        columns: &[String],
        k: usize,
    ) -> Result<Vec<Match<'a>>> {
        let player = self.player(player)?;
        let search = SimilaritySearch::stats(
            self.catalog,
            columns,
            Scaling::Raw,
            Metric::Manhattan,
            MissingValues::Drop,
        )?;
        search.similar_to(&player.id, k)
    }

    #[inline]
    pub fn top_lists(&self) -> TopLists<'a> {
        let young: Vec<&Entity> = self
            .catalog
            .entities()
            .iter()
            .filter(|e| below(e, AGE, 25.0))
            .collect();

        let mut by_position: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
        let mut by_team: BTreeMap<&str, Vec<&Entity>> = BTreeMap::new();
        for entity in self.catalog.entities() {
            if let Some(position) = self.position_of(entity) {
                by_position.entry(position).or_default().push(entity);
            }
            if let Some(team) = self.team_of(entity) {
                by_team.entry(team).or_default().push(entity);
            }
        }

        let height_column = self.columns.height_column.as_str();
        TopLists {
            young_scorers: top_by(&young, PTS, 10),
            rebounders_by_position: by_position
                .values()
                .filter_map(|group| top_by(group, REB, 1).into_iter().next())
                .collect(),
            tallest_by_team: by_team
                .values()
                .filter_map(|group| {
                    let measured: Vec<&Entity> = group
                        .iter()
                        .copied()
                        .filter(|e| e.attribute(height_column).is_some())
                        .collect();
                    top_by(&measured, height_column, 1).into_iter().next()
                })
                .collect(),
        }
    }

    /// Current averages plus uniform noise: PTS ±2, REB ±1, AST ±1
    #[inline]
    pub fn predict_parlay<R: Rng>(
        &self,
        player: &str,
        rng: &mut R,
    ) -> Result<ParlayForecast> {
        let player = self.player(player)?;

        let points_noise = rng.gen_range(-2.0..=2.0);
        let rebounds_noise = rng.gen_range(-1.0..=1.0);
        let assists_noise = rng.gen_range(-1.0..=1.0);
        let jitter = |column: &str, noise: f64| {
            player
                .attribute(column)
                .map(|value| round_to(value + noise, 1))
        };

        Ok(ParlayForecast {
            player: player.id.clone(),
            points: jitter(PTS, points_noise),
            rebounds: jitter(REB, rebounds_noise),
            assists: jitter(AST, assists_noise),
        })
    }

    fn team_of<'e>(&self, entity: &'e Entity) -> Option<&'e str> {
        entity.label(&self.columns.team_column)
    }

    fn position_of<'e>(&self, entity: &'e Entity) -> Option<&'e str> {
        entity.label(&self.columns.position_column)
    }

    fn height_of(&self, entity: &Entity) -> Option<f64> {
        entity.attribute(&self.columns.height_column)
    }

    fn height_at_least(&self, entity: &Entity, inches: f64) -> bool {
        self.height_of(entity).is_some_and(|h| h >= inches)
    }

    fn on_team(&self, entity: &Entity, team: &str) -> bool {
        self.team_of(entity)
            .is_some_and(|t| t.eq_ignore_ascii_case(team.trim()))
    }

    /// Team abbreviation as written in the catalog
    fn canonical_team(&self, roster: &[&'a Entity], requested: &str) -> String {
        roster
            .first()
            .and_then(|entity| self.team_of(entity))
            .unwrap_or(requested)
            .to_string()
    }
}

fn below(entity: &Entity, column: &str, limit: f64) -> bool {
    entity.attribute(column).is_some_and(|v| v < limit)
}

fn above(entity: &Entity, column: &str, limit: f64) -> bool {
    entity.attribute(column).is_some_and(|v| v > limit)
}

fn count(entities: &[&Entity], predicate: impl Fn(&Entity) -> bool) -> usize {
    entities.iter().filter(|e| predicate(e)).count()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean over the players that have a value
fn column_mean(entities: &[&Entity], column: &str) -> Option<f64> {
    mean(entities.iter().filter_map(|e| e.attribute(column)))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Order by a stat with missing values last
fn by_stat(a: &Entity, b: &Entity, column: &str, descending: bool) -> Ordering {
    match (a.attribute(column), b.attribute(column)) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Highest `n` by `column`, stable on ties, missing values last
fn top_by<'a>(entities: &[&'a Entity], column: &str, n: usize) -> Vec<&'a Entity> {
    let mut sorted = entities.to_vec();
    sorted.sort_by(|a, b| by_stat(a, b, column, true));
    sorted.truncate(n);
    sorted
}
