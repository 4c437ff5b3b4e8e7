// Serializable run report: one entry per strategy plus the raw valuations.

use chrono::{DateTime, Utc};
use lineup_core::selection::SquadMember;
use lineup_core::{MatchContext, Recommendation, SquadSummary, Strategy, ValuedPlayer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub context: MatchContext,
    pub strategies: BTreeMap<Strategy, StrategyReport>,
    pub valuations: Vec<ValuationRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub summary: SquadSummary,
    pub members: Vec<MemberRow>,
}

/// One selected player as shown in the report.
#[derive(Debug, Clone, Serialize)]
pub struct MemberRow {
    pub name: String,
    pub side: String,
    pub role: String,
    pub cost: f64,
    pub value: f64,
    pub base_value: f64,
    pub captain: bool,
    pub vice_captain: bool,
    pub expected_points: f64,
}

impl From<&SquadMember> for MemberRow {
    fn from(m: &SquadMember) -> Self {
        MemberRow {
            name: m.name().to_string(),
            side: m.side().to_string(),
            role: m.role().display_str().to_string(),
            cost: m.cost(),
            value: m.value(),
            base_value: m.player.base_value,
            captain: m.is_captain,
            vice_captain: m.is_vice_captain,
            expected_points: m.expected_points(),
        }
    }
}

/// Engine output for one player, with the component breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationRow {
    pub name: String,
    pub side: String,
    pub role: String,
    pub cost: f64,
    pub value: f64,
    pub value_per_cost: Option<f64>,
    pub batting: f64,
    pub bowling: f64,
    pub fielding: f64,
    pub jitter_factor: f64,
    pub home_factor: f64,
    pub adjustments: BTreeMap<String, f64>,
}

impl From<&ValuedPlayer> for ValuationRow {
    fn from(vp: &ValuedPlayer) -> Self {
        let b = &vp.breakdown;
        let mut adjustments = BTreeMap::new();
        for adj in &b.adjustments {
            *adjustments.entry(adj.source.clone()).or_insert(0.0) += adj.delta;
        }
        let vpc = vp.value_per_cost();
        ValuationRow {
            name: vp.name().to_string(),
            side: vp.side().to_string(),
            role: vp.player.role.display_str().to_string(),
            cost: vp.player.cost,
            value: vp.base_value,
            // JSON has no infinity; free players get null
            value_per_cost: vpc.is_finite().then_some(vpc),
            batting: b.batting,
            bowling: b.bowling,
            fielding: b.fielding,
            jitter_factor: b.jitter_factor,
            home_factor: b.home_factor,
            adjustments,
        }
    }
}

/// Build the report, optionally restricted to one strategy.
pub fn build_report(
    rec: &Recommendation,
    only: Option<Strategy>,
    generated_at: DateTime<Utc>,
) -> Report {
    let strategies = rec
        .squads
        .iter()
        .filter(|(strategy, _)| only.map_or(true, |o| o == **strategy))
        .map(|(strategy, squad)| {
            let report = StrategyReport {
                summary: squad.summary(),
                members: squad.members.iter().map(MemberRow::from).collect(),
            };
            (*strategy, report)
        })
        .collect();

    let mut valuations: Vec<ValuationRow> = rec.valued.iter().map(ValuationRow::from).collect();
    valuations.sort_by(|a, b| b.value.total_cmp(&a.value));

    Report {
        generated_at,
        context: rec.context.clone(),
        strategies,
        valuations,
    }
}

pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Plain-text squad listing for terminals.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let ctx = &report.context;
    let _ = writeln!(out, "{} vs {}", ctx.home, ctx.away);
    if let Some(venue) = &ctx.venue {
        let _ = writeln!(out, "venue: {venue}");
    }

    for (strategy, sr) in &report.strategies {
        let s = &sr.summary;
        let _ = writeln!(out);
        let _ = writeln!(out, "== {strategy} ({}) ==", s.method);
        if !s.reasons.is_empty() {
            for reason in &s.reasons {
                let _ = writeln!(out, "  infeasible: {reason}");
            }
            continue;
        }
        for m in &sr.members {
            let tag = if m.captain {
                "(C)"
            } else if m.vice_captain {
                "(VC)"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  {:<24} {:<4} {:<12} {:>6.1} {:>7.1} {}",
                m.name, m.role, m.side, m.cost, m.value, tag
            );
        }
        let _ = writeln!(
            out,
            "  cost {:.1} / remaining {:.1} / score {:.1}",
            s.budget_used, s.budget_remaining, s.score
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
