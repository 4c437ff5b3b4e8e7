// Run orchestration: config + data on disk -> engine -> recommendation ->
// report. Kept out of main so integration tests drive the same path.

use crate::config::Config;
use crate::report::{build_report, Report};
use crate::sources::{self, MatchData};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use lineup_core::valuation::{
    JitterSource, MatchupContributor, NoJitter, PitchCondition, SeededJitter,
};
use lineup_core::{
    recommend, validate_squad, LineupError, MatchContext, RecommendRequest, SelectionMode,
    SelectionStatus, Squad, Strategy, ValuationEngine, Violation,
};
use std::path::Path;
use tracing::{info, warn};

/// Per-run choices from the command line. `None` falls back to config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub home: String,
    pub away: String,
    pub venue: Option<String>,
    pub pitch: Option<PitchCondition>,
    pub mode: Option<SelectionMode>,
    pub strategy: Option<Strategy>,
    pub seed: Option<u64>,
    pub no_jitter: bool,
}

impl RunOptions {
    pub fn new(home: &str, away: &str) -> Self {
        RunOptions {
            home: home.to_string(),
            away: away.to_string(),
            ..Default::default()
        }
    }

    pub fn match_context(&self) -> Result<MatchContext, LineupError> {
        let mut ctx = MatchContext::new(self.home.trim(), self.away.trim())?;
        if let Some(venue) = &self.venue {
            ctx = ctx.at_venue(venue.trim());
        }
        if let Some(pitch) = self.pitch {
            ctx = ctx.on_pitch(pitch);
        }
        Ok(ctx)
    }
}

/// Engine with the contributors the config and data call for.
pub fn build_engine(config: &Config, data: &MatchData) -> Result<ValuationEngine, LineupError> {
    let mut engine = ValuationEngine::new(config.valuation.clone())?;
    if config.matchup.enabled {
        engine = engine.with_contributor(MatchupContributor {
            venue_weight: config.matchup.venue_weight,
            opposition_weight: config.matchup.opposition_weight,
        });
    }
    if !data.predictions.is_empty() {
        let external =
            data.prediction_contributor(config.external.blend_weight, config.external.weights)?;
        info!(forecasts = external.len(), "blending external forecasts");
        engine = engine.with_contributor(external);
    }
    Ok(engine)
}

/// A seed on the command line turns jitter on; `--no-jitter` always wins.
pub fn jitter_source(config: &Config, opts: &RunOptions) -> Box<dyn JitterSource> {
    if opts.no_jitter {
        return Box::new(NoJitter);
    }
    match (opts.seed, config.jitter.enabled) {
        (Some(seed), _) => Box::new(SeededJitter::new(seed)),
        (None, true) => Box::new(SeededJitter::new(config.jitter.seed)),
        (None, false) => Box::new(NoJitter),
    }
}

/// Load data, value both sides and build the report.
pub fn run(
    config: &Config,
    base_dir: &Path,
    opts: &RunOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<Report> {
    let ctx = opts.match_context().context("invalid match context")?;
    let data = sources::load_match(&config.data_paths, base_dir, &ctx)
        .context("failed to load match data")?;
    let engine = build_engine(config, &data).context("failed to build valuation engine")?;

    let request = RecommendRequest::new(ctx, data.players, config.constraints)
        .with_mode(opts.mode.unwrap_or(config.selection_mode))
        .with_strategy_params(config.strategy);
    let mut jitter = jitter_source(config, opts);
    let rec = recommend(&engine, &request, jitter.as_mut()).context("recommendation failed")?;

    if !rec.any_feasible() {
        warn!("no strategy produced a legal squad");
    }
    Ok(build_report(&rec, opts.strategy, now))
}

/// A hand-picked squad and every rule it breaks.
#[derive(Debug)]
pub struct AuditOutcome {
    pub squad: Squad,
    pub violations: Vec<Violation>,
}

impl AuditOutcome {
    pub fn is_legal(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check a hand-picked squad against the configured constraints.
///
/// Picks are `(side, name)` pairs; every pick must be on the roster.
pub fn audit(
    config: &Config,
    base_dir: &Path,
    opts: &RunOptions,
    picks: &[(String, String)],
) -> anyhow::Result<AuditOutcome> {
    let ctx = opts.match_context().context("invalid match context")?;
    let data = sources::load_match(&config.data_paths, base_dir, &ctx)
        .context("failed to load match data")?;
    let engine = build_engine(config, &data).context("failed to build valuation engine")?;
    let valued = engine
        .value_players(&data.players, &ctx, &mut NoJitter)
        .context("valuation failed")?;

    let mut members = Vec::with_capacity(picks.len());
    for (side, name) in picks {
        let Some(vp) = valued.iter().find(|vp| vp.side() == side && vp.name() == name) else {
            bail!("pick '{name}' ({side}) is not on the roster");
        };
        members.push(vp.clone());
    }

    let squad = Squad::from_players(members, SelectionStatus::Manual, config.constraints.budget);
    let violations = validate_squad(&squad, &config.constraints);
    info!(
        picks = picks.len(),
        violations = violations.len(),
        cost = squad.total_cost,
        "audited squad"
    );
    Ok(AuditOutcome { squad, violations })
}
