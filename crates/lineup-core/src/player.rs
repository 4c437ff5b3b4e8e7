// Player identity, role vocabulary, and raw statistics.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four canonical playing roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Batter,
    Bowler,
    AllRounder,
    WicketKeeper,
}

impl Role {
    /// Every role, in deterministic display order.
    pub const ALL: [Role; 4] = [
        Role::WicketKeeper,
        Role::Batter,
        Role::AllRounder,
        Role::Bowler,
    ];

    /// Parse a role label into a canonical Role.
    ///
    /// Stat feeds disagree on spelling, so matching ignores case, spaces,
    /// hyphens and underscores:
    /// - "Batsman", "Batter", "BAT" -> Batter
    /// - "Bowler", "BWL", "BOWL" -> Bowler
    /// - "All-Rounder", "AllRounder", "AR" -> AllRounder
    /// - "Wicket Keeper", "Wicket-Keeper", "WK", "Keeper" -> WicketKeeper
    pub fn from_str_role(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "bat" | "batter" | "batsman" | "batsmen" | "batswoman" => Some(Role::Batter),
            "bwl" | "bowl" | "bowler" => Some(Role::Bowler),
            "ar" | "allrounder" | "allround" => Some(Role::AllRounder),
            "wk" | "wicketkeeper" | "keeper" | "wicketkeeperbatter" | "wkbat" => {
                Some(Role::WicketKeeper)
            }
            _ => None,
        }
    }

    /// Short display label.
    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Batter => "BAT",
            Role::Bowler => "BWL",
            Role::AllRounder => "AR",
            Role::WicketKeeper => "WK",
        }
    }

    /// Whether batting output is expected from this role.
    pub fn bats(&self) -> bool {
        matches!(self, Role::Batter | Role::AllRounder | Role::WicketKeeper)
    }

    /// Whether bowling output is expected from this role.
    pub fn bowls(&self) -> bool {
        matches!(self, Role::Bowler | Role::AllRounder)
    }

    /// Deterministic ordering index, matching `Role::ALL`.
    pub fn sort_order(&self) -> u8 {
        match self {
            Role::WicketKeeper => 0,
            Role::Batter => 1,
            Role::AllRounder => 2,
            Role::Bowler => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Raw statistics
// ---------------------------------------------------------------------------

/// Career batting aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BattingStats {
    pub matches: u32,
    pub runs: u32,
    pub average: f64,
    pub strike_rate: f64,
}

impl BattingStats {
    /// Average runs per match, or `None` when no matches were played.
    pub fn runs_per_match(&self) -> Option<f64> {
        (self.matches > 0).then(|| self.runs as f64 / self.matches as f64)
    }
}

/// Career bowling aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BowlingStats {
    pub matches: u32,
    pub wickets: u32,
    pub economy: f64,
    pub average: f64,
}

impl BowlingStats {
    /// Average wickets per match, or `None` when no matches were played.
    pub fn wickets_per_match(&self) -> Option<f64> {
        (self.matches > 0).then(|| self.wickets as f64 / self.matches as f64)
    }
}

/// Everything a stat source may know about a player. Every field is
/// optional; missing signals contribute nothing to valuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    #[serde(default)]
    pub batting: Option<BattingStats>,
    #[serde(default)]
    pub bowling: Option<BowlingStats>,
    /// Recent-form index on the same scale as the batting average.
    #[serde(default)]
    pub recent_form: Option<f64>,
    /// Consistency index on a 0-10 scale.
    #[serde(default)]
    pub consistency: Option<f64>,
    /// Venue identifier -> performance rating (0-1).
    #[serde(default)]
    pub venue_ratings: HashMap<String, f64>,
    /// Opponent side name -> performance rating (0-1).
    #[serde(default)]
    pub opposition_ratings: HashMap<String, f64>,
}

impl RawStats {
    /// Matches played, taking the larger of the batting and bowling records.
    pub fn matches(&self) -> u32 {
        let bat = self.batting.map_or(0, |b| b.matches);
        let bowl = self.bowling.map_or(0, |b| b.matches);
        bat.max(bowl)
    }

    /// Consistency index, treating non-positive values as absent.
    pub fn consistency_index(&self) -> Option<f64> {
        self.consistency.filter(|c| c.is_finite() && *c > 0.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A rostered player as supplied by the stat source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique within a side.
    pub name: String,
    pub side: String,
    pub role: Role,
    /// Acquisition cost (e.g. auction price). Must be >= 0.
    pub cost: f64,
    #[serde(default)]
    pub stats: RawStats,
}

impl Player {
    pub fn new(name: &str, side: &str, role: Role, cost: f64) -> Self {
        Player {
            name: name.to_string(),
            side: side.to_string(),
            role,
            cost,
            stats: RawStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: RawStats) -> Self {
        self.stats = stats;
        self
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
