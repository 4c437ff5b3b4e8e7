// Player data loading: roster and stat CSVs plus the optional forecast JSON.
//
// The roster is the source of truth for who exists. Stat files are keyed by
// player name, optionally narrowed by side; a row without a side applies to
// any rostered player of that name.

use crate::config::DataPaths;
use lineup_core::player::{BattingStats, BowlingStats};
use lineup_core::valuation::contributors::PredictionWeights;
use lineup_core::valuation::{ExternalPrediction, ExternalPredictionContributor};
use lineup_core::{LineupError, MatchContext, Player, RawStats, Role};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One roster line: who the player is, what they do and what they cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub side: String,
    pub name: String,
    pub role: Role,
    pub cost: f64,
}

/// Recent-form and consistency indices for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormEntry {
    pub recent_form: Option<f64>,
    pub consistency: Option<f64>,
}

/// Venue and opposition ratings for one player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ratings {
    pub venue: HashMap<String, f64>,
    pub opposition: HashMap<String, f64>,
}

/// Stat rows keyed by name, with an optional side qualifier.
#[derive(Debug, Clone)]
pub struct StatIndex<T> {
    by_side: HashMap<(String, String), T>,
    by_name: HashMap<String, T>,
}

impl<T> Default for StatIndex<T> {
    fn default() -> Self {
        StatIndex {
            by_side: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T> StatIndex<T> {
    /// Insert a row, returning the row it replaced.
    pub fn insert(&mut self, side: Option<&str>, name: &str, value: T) -> Option<T> {
        match side {
            Some(side) => self
                .by_side
                .insert((side.to_string(), name.to_string()), value),
            None => self.by_name.insert(name.to_string(), value),
        }
    }

    /// Side-qualified rows win over name-only rows.
    pub fn get(&self, side: &str, name: &str) -> Option<&T> {
        self.by_side
            .get(&(side.to_string(), name.to_string()))
            .or_else(|| self.by_name.get(name))
    }

    pub fn len(&self) -> usize {
        self.by_side.len() + self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_or_default(&mut self, side: Option<&str>, name: &str) -> &mut T
    where
        T: Default,
    {
        match side {
            Some(side) => self
                .by_side
                .entry((side.to_string(), name.to_string()))
                .or_default(),
            None => self.by_name.entry(name.to_string()).or_default(),
        }
    }
}

/// Every stat table the valuation engine can draw on.
#[derive(Debug, Clone, Default)]
pub struct StatTables {
    pub batting: StatIndex<BattingStats>,
    pub bowling: StatIndex<BowlingStats>,
    pub form: StatIndex<FormEntry>,
    pub ratings: StatIndex<Ratings>,
}

/// Players for one fixture plus any external forecasts that name them.
#[derive(Debug, Clone)]
pub struct MatchData {
    pub players: Vec<Player>,
    /// Forecasts keyed by player name; applied to every side with that name.
    pub predictions: HashMap<String, ExternalPrediction>,
}

impl MatchData {
    /// Build the forecast blender for the loaded players. Forecasts naming
    /// no rostered player are dropped with a warning.
    pub fn prediction_contributor(
        &self,
        blend_weight: f64,
        weights: PredictionWeights,
    ) -> Result<ExternalPredictionContributor, LineupError> {
        let mut contributor = ExternalPredictionContributor::new(blend_weight)?.with_weights(weights);
        let mut used = HashSet::new();
        for player in &self.players {
            if let Some(pred) = self.predictions.get(&player.name) {
                contributor.insert(&player.side, &player.name, *pred);
                used.insert(player.name.as_str());
            }
        }
        for name in self.predictions.keys() {
            if !used.contains(name.as_str()) {
                warn!("forecast for '{}' matches no rostered player", name);
            }
        }
        Ok(contributor)
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRosterRow {
    #[serde(alias = "team")]
    side: String,
    #[serde(alias = "player")]
    name: String,
    role: String,
    #[serde(alias = "price")]
    cost: f64,
}

#[derive(Debug, Deserialize)]
struct RawPickRow {
    #[serde(alias = "team")]
    side: String,
    #[serde(alias = "player")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawBattingRow {
    #[serde(alias = "player")]
    name: String,
    #[serde(default, alias = "team")]
    side: Option<String>,
    matches: u32,
    runs: u32,
    average: f64,
    strike_rate: f64,
}

#[derive(Debug, Deserialize)]
struct RawBowlingRow {
    #[serde(alias = "player")]
    name: String,
    #[serde(default, alias = "team")]
    side: Option<String>,
    matches: u32,
    wickets: u32,
    economy: f64,
    average: f64,
}

#[derive(Debug, Deserialize)]
struct RawFormRow {
    #[serde(alias = "player")]
    name: String,
    #[serde(default, alias = "team")]
    side: Option<String>,
    #[serde(default)]
    recent_form: Option<f64>,
    #[serde(default)]
    consistency: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRatingRow {
    #[serde(alias = "player")]
    name: String,
    #[serde(default, alias = "team")]
    side: Option<String>,
    kind: String,
    key: String,
    rating: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Trimmed side, with blanks treated as "any side".
fn side_key(side: &Option<String>) -> Option<&str> {
    side.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn warn_replaced<T>(what: &str, name: &str, previous: Option<T>) {
    if previous.is_some() {
        warn!("duplicate {} row for '{}', using latest value", what, name);
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_roster_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterEntry>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut roster: Vec<RosterEntry> = Vec::new();
    let mut seen = HashSet::new();
    for result in reader.deserialize::<RawRosterRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim().to_string();
                let side = raw.side.trim().to_string();
                let Some(role) = Role::from_str_role(&raw.role) else {
                    warn!("skipping player '{}': unknown role '{}'", name, raw.role);
                    continue;
                };
                if !raw.cost.is_finite() || raw.cost < 0.0 {
                    warn!("skipping player '{}': invalid cost {}", name, raw.cost);
                    continue;
                }
                if name.is_empty() || side.is_empty() {
                    warn!("skipping roster row with blank name or side");
                    continue;
                }
                if !seen.insert((side.clone(), name.clone())) {
                    warn!("duplicate roster entry for '{}' ({}), keeping first", name, side);
                    continue;
                }
                roster.push(RosterEntry {
                    side,
                    name,
                    role,
                    cost: raw.cost,
                });
            }
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
            }
        }
    }
    Ok(roster)
}

/// Hand-picked squad rows (`side,name`), trimmed, in file order.
fn load_picks_from_reader<R: Read>(rdr: R) -> Result<Vec<(String, String)>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut picks = Vec::new();
    for result in reader.deserialize::<RawPickRow>() {
        match result {
            Ok(raw) => picks.push((raw.side.trim().to_string(), raw.name.trim().to_string())),
            Err(e) => {
                warn!("skipping malformed pick row: {}", e);
            }
        }
    }
    Ok(picks)
}

fn load_batting_from_reader<R: Read>(rdr: R) -> Result<StatIndex<BattingStats>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut index = StatIndex::default();
    for result in reader.deserialize::<RawBattingRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim();
                if !all_finite(&[raw.average, raw.strike_rate]) {
                    warn!("skipping batting for '{}': non-finite average/strike rate", name);
                    continue;
                }
                let stats = BattingStats {
                    matches: raw.matches,
                    runs: raw.runs,
                    average: raw.average,
                    strike_rate: raw.strike_rate,
                };
                let previous = index.insert(side_key(&raw.side), name, stats);
                warn_replaced("batting", name, previous);
            }
            Err(e) => {
                warn!("skipping malformed batting row: {}", e);
            }
        }
    }
    Ok(index)
}

fn load_bowling_from_reader<R: Read>(rdr: R) -> Result<StatIndex<BowlingStats>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut index = StatIndex::default();
    for result in reader.deserialize::<RawBowlingRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim();
                if !all_finite(&[raw.economy, raw.average]) {
                    warn!("skipping bowling for '{}': non-finite economy/average", name);
                    continue;
                }
                let stats = BowlingStats {
                    matches: raw.matches,
                    wickets: raw.wickets,
                    economy: raw.economy,
                    average: raw.average,
                };
                let previous = index.insert(side_key(&raw.side), name, stats);
                warn_replaced("bowling", name, previous);
            }
            Err(e) => {
                warn!("skipping malformed bowling row: {}", e);
            }
        }
    }
    Ok(index)
}

fn load_form_from_reader<R: Read>(rdr: R) -> Result<StatIndex<FormEntry>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut index = StatIndex::default();
    for result in reader.deserialize::<RawFormRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim();
                let entry = FormEntry {
                    recent_form: raw.recent_form.filter(|v| v.is_finite()),
                    consistency: raw.consistency.filter(|v| v.is_finite()),
                };
                let previous = index.insert(side_key(&raw.side), name, entry);
                warn_replaced("form", name, previous);
            }
            Err(e) => {
                warn!("skipping malformed form row: {}", e);
            }
        }
    }
    Ok(index)
}

fn load_ratings_from_reader<R: Read>(rdr: R) -> Result<StatIndex<Ratings>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut index: StatIndex<Ratings> = StatIndex::default();
    for result in reader.deserialize::<RawRatingRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim();
                let key = raw.key.trim().to_string();
                if !raw.rating.is_finite() {
                    warn!("skipping rating for '{}': non-finite value", name);
                    continue;
                }
                let ratings = index.entry_or_default(side_key(&raw.side), name);
                match raw.kind.trim().to_ascii_lowercase().as_str() {
                    "venue" => {
                        ratings.venue.insert(key, raw.rating);
                    }
                    "opposition" | "opponent" => {
                        ratings.opposition.insert(key, raw.rating);
                    }
                    other => {
                        warn!("skipping rating for '{}': unknown kind '{}'", name, other);
                    }
                }
            }
            Err(e) => {
                warn!("skipping malformed rating row: {}", e);
            }
        }
    }
    Ok(index)
}

fn load_predictions_from_reader<R: Read>(
    rdr: R,
) -> Result<HashMap<String, ExternalPrediction>, serde_json::Error> {
    let raw: HashMap<String, ExternalPrediction> = serde_json::from_reader(rdr)?;
    Ok(raw
        .into_iter()
        .map(|(name, pred)| (name.trim().to_string(), pred))
        .collect())
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> DataError + '_ {
    move |e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load the roster CSV (`side,name,role,cost`).
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>, DataError> {
    load_roster_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load a hand-picked squad for auditing.
pub fn load_picks(path: &Path) -> Result<Vec<(String, String)>, DataError> {
    load_picks_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load career batting aggregates.
pub fn load_batting(path: &Path) -> Result<StatIndex<BattingStats>, DataError> {
    load_batting_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load career bowling aggregates.
pub fn load_bowling(path: &Path) -> Result<StatIndex<BowlingStats>, DataError> {
    load_bowling_from_reader(open(path)?).map_err(csv_error(path))
}

pub fn load_form(path: &Path) -> Result<StatIndex<FormEntry>, DataError> {
    load_form_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load venue / opposition ratings (`name,side,kind,key,rating`).
pub fn load_ratings(path: &Path) -> Result<StatIndex<Ratings>, DataError> {
    load_ratings_from_reader(open(path)?).map_err(csv_error(path))
}

/// Load a forecast file: a JSON object of player name -> forecast.
pub fn load_predictions(path: &Path) -> Result<HashMap<String, ExternalPrediction>, DataError> {
    load_predictions_from_reader(open(path)?).map_err(|e| DataError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Optional inputs that are configured but absent are skipped with a warning.
fn load_optional<T: Default>(
    base_dir: &Path,
    configured: &Option<String>,
    what: &str,
    load: impl FnOnce(&Path) -> Result<T, DataError>,
) -> Result<T, DataError> {
    let Some(rel) = configured else {
        return Ok(T::default());
    };
    let path = base_dir.join(rel);
    if !path.exists() {
        warn!("{} file {} not found, continuing without it", what, path.display());
        return Ok(T::default());
    }
    load(&path)
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Join roster entries for the fixture's two sides with their stats.
///
/// Entries for other sides are ignored. Each side must end up with at least
/// one player.
pub fn assemble_players(
    roster: &[RosterEntry],
    tables: &StatTables,
    ctx: &MatchContext,
) -> Result<Vec<Player>, DataError> {
    let mut players = Vec::new();
    let mut skipped = 0usize;
    for entry in roster {
        if entry.side != ctx.home && entry.side != ctx.away {
            skipped += 1;
            continue;
        }
        let form = tables
            .form
            .get(&entry.side, &entry.name)
            .copied()
            .unwrap_or_default();
        let ratings = tables
            .ratings
            .get(&entry.side, &entry.name)
            .cloned()
            .unwrap_or_default();
        let stats = RawStats {
            batting: tables.batting.get(&entry.side, &entry.name).copied(),
            bowling: tables.bowling.get(&entry.side, &entry.name).copied(),
            recent_form: form.recent_form,
            consistency: form.consistency,
            venue_ratings: ratings.venue,
            opposition_ratings: ratings.opposition,
        };
        if stats.batting.is_none() && stats.bowling.is_none() {
            debug!("no batting or bowling record for '{}' ({})", entry.name, entry.side);
        }
        players.push(Player::new(&entry.name, &entry.side, entry.role, entry.cost).with_stats(stats));
    }
    if skipped > 0 {
        debug!(skipped, "ignored roster entries from other sides");
    }

    for side in [&ctx.home, &ctx.away] {
        if !players.iter().any(|p| &p.side == side) {
            return Err(DataError::Validation(format!(
                "roster has no players for side '{side}'"
            )));
        }
    }
    Ok(players)
}

/// Load everything needed to value one fixture. Relative paths resolve
/// against `base_dir`.
pub fn load_match(
    paths: &DataPaths,
    base_dir: &Path,
    ctx: &MatchContext,
) -> Result<MatchData, DataError> {
    let roster = load_roster(&base_dir.join(&paths.roster))?;
    if roster.is_empty() {
        return Err(DataError::Validation(
            "roster CSV produced zero valid rows".into(),
        ));
    }

    let tables = StatTables {
        batting: load_batting(&base_dir.join(&paths.batting))?,
        bowling: load_bowling(&base_dir.join(&paths.bowling))?,
        form: load_optional(base_dir, &paths.form, "form", load_form)?,
        ratings: load_optional(base_dir, &paths.ratings, "ratings", load_ratings)?,
    };
    let predictions = load_optional(base_dir, &paths.predictions, "predictions", load_predictions)?;

    let players = assemble_players(&roster, &tables, ctx)?;
    info!(
        players = players.len(),
        batting = tables.batting.len(),
        bowling = tables.bowling.len(),
        forecasts = predictions.len(),
        "loaded match data"
    );

    Ok(MatchData {
        players,
        predictions,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
