// Integration tests for the lineup CLI.
//
// Each test stages the fixture config and data into its own temp dir, then
// drives the same load -> value -> select -> report path the binary uses.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use lineup_cli::app::{self, RunOptions};
use lineup_cli::config::{self, Config};
use lineup_cli::report::Report;
use lineup_cli::sources::{self, DataError};
use lineup_core::valuation::PitchCondition;
use lineup_core::{SelectionMode, SelectionStatus, Strategy, Violation};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

/// Copy the fixture config into `defaults/` and the data files into `data/`
/// under a fresh temp dir.
fn stage(name: &str) -> PathBuf {
    let src = Path::new(FIXTURES);
    let tmp = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&tmp);
    fs::create_dir_all(tmp.join("defaults")).unwrap();
    fs::create_dir_all(tmp.join("data")).unwrap();
    fs::copy(src.join("lineup.toml"), tmp.join("defaults").join("lineup.toml")).unwrap();
    for entry in fs::read_dir(src.join("data")).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), tmp.join("data").join(entry.file_name())).unwrap();
    }
    tmp
}

fn load(base: &Path) -> Config {
    config::load_config_in(base).expect("fixture config should load")
}

fn options() -> RunOptions {
    RunOptions {
        no_jitter: true,
        ..RunOptions::new("Lions", "Tigers")
    }
}

fn run(base: &Path, opts: &RunOptions) -> Report {
    let stamp = Utc.with_ymd_and_hms(2026, 3, 14, 19, 30, 0).unwrap();
    app::run(&load(base), base, opts, stamp).expect("run should succeed")
}

fn value_of(report: &Report, name: &str) -> f64 {
    report
        .valuations
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no valuation for {name}"))
        .value
}

fn picks(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(s, n)| (s.to_string(), n.to_string()))
        .collect()
}

// ===========================================================================
// Shipped defaults
// ===========================================================================

#[test]
fn shipped_defaults_are_valid_toml() {
    let content = fs::read_to_string("defaults/lineup.toml").expect("defaults/lineup.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "defaults/lineup.toml is not valid TOML: {:?}", parsed.err());
}

// ===========================================================================
// Recommend pipeline
// ===========================================================================

#[test]
fn recommends_a_legal_squad_per_strategy() {
    let base = stage("lineup_it_recommend");
    let report = run(&base, &options());

    // 16 valid roster rows; Bears, the umpire and the malformed cost are dropped
    assert_eq!(report.valuations.len(), 16);
    assert!(report.valuations.iter().all(|r| r.side != "Bears"));

    assert_eq!(report.strategies.len(), 3);
    for (strategy, sr) in &report.strategies {
        let s = &sr.summary;
        assert_eq!(s.method, "optimal", "{strategy}");
        assert_eq!(s.players, 11);
        assert!(s.budget_used <= 100.0 + 1e-9);
        assert!(s.side_counts.values().all(|&n| n <= 7));
        assert_eq!(s.role_counts.values().sum::<usize>(), 11);
        assert!(s.captain.is_some() && s.vice_captain.is_some());
        assert_ne!(s.captain, s.vice_captain);
        assert!(s.reasons.is_empty());
    }
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn strategy_flag_narrows_report() {
    let base = stage("lineup_it_strategy");
    let opts = RunOptions {
        strategy: Some(Strategy::Aggressive),
        ..options()
    };
    let report = run(&base, &opts);
    assert_eq!(report.strategies.len(), 1);
    assert!(report.strategies.contains_key(&Strategy::Aggressive));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn greedy_mode_is_reported() {
    let base = stage("lineup_it_greedy");
    let opts = RunOptions {
        mode: Some(SelectionMode::Greedy),
        ..options()
    };
    let report = run(&base, &opts);
    for sr in report.strategies.values() {
        assert_eq!(sr.summary.method, "greedy");
        assert_eq!(sr.summary.players, 11);
    }
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn seeded_runs_repeat_exactly() {
    let base = stage("lineup_it_seeded");
    let opts = RunOptions {
        seed: Some(7),
        no_jitter: false,
        ..RunOptions::new("Lions", "Tigers")
    };
    let first = run(&base, &opts);
    let second = run(&base, &opts);
    for (a, b) in first.valuations.iter().zip(&second.valuations) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.value, b.value);
        assert!((0.9..=1.1).contains(&a.jitter_factor));
    }
    assert!(first.valuations.iter().any(|r| r.jitter_factor != 1.0));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn no_jitter_leaves_factor_at_one() {
    let base = stage("lineup_it_nojitter");
    let report = run(&base, &options());
    assert!(report.valuations.iter().all(|r| r.jitter_factor == 1.0));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn venue_rating_lifts_rated_player() {
    let base = stage("lineup_it_venue");
    let plain = run(&base, &options());
    let at_venue = run(
        &base,
        &RunOptions {
            venue: Some("Eden Park".into()),
            ..options()
        },
    );
    // 0.6 venue rating * weight 20
    let lift = value_of(&at_venue, "Owen Price") - value_of(&plain, "Owen Price");
    assert!((lift - 12.0).abs() < 1e-9, "lift was {lift}");
    assert_eq!(value_of(&at_venue, "Chris Adair"), value_of(&plain, "Chris Adair"));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn batting_pitch_favors_batters_over_bowlers() {
    let base = stage("lineup_it_pitch");
    let plain = run(&base, &options());
    let flat = run(
        &base,
        &RunOptions {
            pitch: Some(PitchCondition::Batting),
            ..options()
        },
    );
    assert!(value_of(&flat, "Chris Adair") > value_of(&plain, "Chris Adair"));
    assert!(value_of(&flat, "Gareth Lowe") < value_of(&plain, "Gareth Lowe"));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn forecast_moves_only_its_player() {
    let base = stage("lineup_it_forecast");
    let with = run(&base, &options());
    fs::remove_file(base.join("data").join("predictions.json")).unwrap();
    let without = run(&base, &options());

    assert_ne!(value_of(&with, "Brendan Kerr"), value_of(&without, "Brendan Kerr"));
    for row in &without.valuations {
        if row.name != "Brendan Kerr" {
            assert_eq!(value_of(&with, &row.name), row.value, "{}", row.name);
        }
    }
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn missing_optional_files_are_tolerated() {
    let base = stage("lineup_it_sparse");
    for file in ["form.csv", "ratings.csv", "predictions.json"] {
        fs::remove_file(base.join("data").join(file)).unwrap();
    }
    let report = run(&base, &options());
    assert_eq!(report.strategies.len(), 3);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn missing_roster_is_an_error() {
    let base = stage("lineup_it_no_roster");
    fs::remove_file(base.join("data").join("roster.csv")).unwrap();
    let err = app::run(&load(&base), &base, &options(), Utc::now()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::Io { .. })
    ));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn unknown_side_is_an_error() {
    let base = stage("lineup_it_unknown_side");
    let opts = RunOptions {
        no_jitter: true,
        ..RunOptions::new("Lions", "Sharks")
    };
    let err = app::run(&load(&base), &base, &opts, Utc::now()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::Validation(_))
    ));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn tiny_budget_reports_infeasible_squads() {
    let base = stage("lineup_it_budget");
    let defaults = base.join("defaults").join("lineup.toml");
    let text = fs::read_to_string(&defaults).unwrap().replace("budget = 100.0", "budget = 10.0");
    fs::write(&defaults, text).unwrap();

    let report = run(&base, &options());
    for sr in report.strategies.values() {
        assert_eq!(sr.summary.method, "infeasible");
        assert!(sr.members.is_empty());
        assert!(!sr.summary.reasons.is_empty());
        assert_eq!(sr.summary.score, 0.0);
    }
    let _ = fs::remove_dir_all(&base);
}

// ===========================================================================
// Audit
// ===========================================================================

const LEGAL_PICKS: &[(&str, &str)] = &[
    ("Lions", "Arun Mehta"),
    ("Lions", "Brendan Kerr"),
    ("Lions", "Chris Adair"),
    ("Lions", "Ethan Roy"),
    ("Lions", "Gareth Lowe"),
    ("Lions", "Hamish Reid"),
    ("Tigers", "Jason Holt"),
    ("Tigers", "Kieran Moss"),
    ("Tigers", "Marcus Vale"),
    ("Tigers", "Owen Price"),
    ("Tigers", "Pravin Das"),
];

#[test]
fn audit_accepts_legal_picks() {
    let base = stage("lineup_it_audit_ok");
    let picks_csv = base.join("picks.csv");
    let mut text = String::from("side,name\n");
    for (side, name) in LEGAL_PICKS {
        text.push_str(&format!("{side},{name}\n"));
    }
    fs::write(&picks_csv, text).unwrap();

    let loaded = sources::load_picks(&picks_csv).unwrap();
    let outcome = app::audit(&load(&base), &base, &options(), &loaded).unwrap();
    assert!(outcome.is_legal(), "{:?}", outcome.violations);
    assert_eq!(outcome.squad.len(), 11);
    assert_eq!(outcome.squad.status, SelectionStatus::Manual);
    assert_eq!(outcome.squad.summary().method, "manual");
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn audit_flags_side_cap() {
    let base = stage("lineup_it_audit_cap");
    let list = picks(&[
        ("Lions", "Arun Mehta"),
        ("Lions", "Brendan Kerr"),
        ("Lions", "Chris Adair"),
        ("Lions", "Dilan Perera"),
        ("Lions", "Ethan Roy"),
        ("Lions", "Farid Khan"),
        ("Lions", "Gareth Lowe"),
        ("Lions", "Hamish Reid"),
        ("Tigers", "Jason Holt"),
        ("Tigers", "Owen Price"),
        ("Tigers", "Pravin Das"),
    ]);
    let outcome = app::audit(&load(&base), &base, &options(), &list).unwrap();
    assert!(!outcome.is_legal());
    assert_eq!(
        outcome.violations,
        vec![Violation::SideCap {
            side: "Lions".into(),
            count: 8,
            max: 7
        }]
    );
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn audit_rejects_unknown_pick() {
    let base = stage("lineup_it_audit_unknown");
    let list = picks(&[("Lions", "Nobody Special")]);
    let err = app::audit(&load(&base), &base, &options(), &list).unwrap_err();
    assert!(err.to_string().contains("Nobody Special"));
    let _ = fs::remove_dir_all(&base);
}
