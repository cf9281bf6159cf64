use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use maze_chase::config::GameConfig;
use maze_chase::engine::movement::covered_cells;
use maze_chase::engine::{autopilot, GameEngine};
use maze_chase::logging::init_tracing;
use maze_chase::server_utils::load_game_config;
use maze_chase::types::{OutcomeSignal, RuntimeEvent, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_RUNS: usize = 3;
const MAX_RUNS: usize = 100;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless autopilot runs of the maze")]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = DEFAULT_RUNS)]
    runs: usize,
    /// Give up on a run after this many ticks.
    #[arg(long, default_value_t = 30 * 60 * 5)]
    max_ticks: u64,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    outcome: String,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: u32,
    #[serde(rename = "pelletTotal")]
    pellet_total: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

/// Values that must only move one way during a session.
#[derive(Clone, Copy, Debug)]
struct Progress {
    score: u32,
    lives: u32,
}

fn main() -> anyhow::Result<()> {
    init_tracing("info");
    let cli = Cli::parse();
    let started_at = Utc::now();
    let config = load_game_config(cli.config.as_deref(), None)
        .context("failed to load game config")?;
    let scenarios = resolve_scenarios(&cli, started_at);
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, started_at.timestamp_millis()));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            max_ticks = scenario.max_ticks,
            "scenario started"
        );
        let scenario_run = run_scenario(&config, &scenario)?;

        for anomaly in &scenario_run.anomaly_records {
            warn!(
                match_id = %match_id,
                scenario = %scenario.name,
                tick = anomaly.tick,
                message = %anomaly.message,
                "anomaly detected"
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *outcome_counts
            .entry(scenario_run.result.outcome.clone())
            .or_insert(0) += 1;

        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            outcome = %scenario_run.result.outcome,
            ticks = scenario_run.result.ticks,
            score = scenario_run.result.score,
            anomalies = scenario_run.anomaly_records.len(),
            "scenario finished"
        );

        println!("{}", serde_json::to_string(&scenario_run.result)?);
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        started_at,
        Utc::now(),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_duration_ms,
    );

    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }

    info!(
        match_id = %match_id,
        scenarios = summary.scenario_count,
        anomalies = summary.anomaly_count,
        average_duration_ms = summary.average_duration_ms,
        summary_out = ?cli.summary_out,
        "run finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
    Ok(())
}

fn run_scenario(base: &GameConfig, scenario: &Scenario) -> anyhow::Result<ScenarioRunResult> {
    let config = GameConfig {
        seed: scenario.seed,
        ..base.clone()
    };
    let cell_size = config.cell_size;
    let mut engine = GameEngine::new(config)
        .with_context(|| format!("invalid config for scenario {}", scenario.name))?;

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut pellets_eaten = 0u32;
    let mut progress = Progress {
        score: engine.session().score(),
        lives: engine.session().lives(),
    };

    while !engine.is_ended() && engine.tick_count() < scenario.max_ticks {
        let body = engine.player().body().clone();
        let grid = engine.grid().clone();
        if let Some(dir) = autopilot::choose_direction(&body, &grid, cell_size, engine.rng_mut()) {
            engine.request_direction(dir);
        }
        engine.tick();

        let mut messages = collect_wall_anomalies(&engine, cell_size);
        let snapshot = engine.build_snapshot(true);
        messages.extend(collect_snapshot_anomalies(&snapshot, progress));
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        pellets_eaten += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::PelletEaten { .. }))
            .count() as u32;
        progress = Progress {
            score: snapshot.score,
            lives: snapshot.lives,
        };
    }

    let summary = engine.build_summary();
    if summary.score != pellets_eaten {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            summary.ticks,
            format!(
                "score {} does not match {} pellet events",
                summary.score, pellets_eaten
            ),
        );
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome: outcome_key(summary.outcome).to_string(),
            ticks: summary.ticks,
            duration_ms: summary.duration_ms,
            score: summary.score,
            pellet_total: summary.pellet_total,
            pellets_eaten,
            lives_lost: summary.lives_lost,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_wall_anomalies(engine: &GameEngine, cell_size: i32) -> Vec<String> {
    let grid = engine.grid();
    let mut anomalies = Vec::new();
    for (row, col) in covered_cells(engine.player().position(), cell_size) {
        if !grid.is_walkable(row, col) {
            anomalies.push(format!("player inside wall at ({row}, {col})"));
        }
    }
    for ghost in engine.ghosts().as_slice() {
        for (row, col) in covered_cells(ghost.position(), cell_size) {
            if !grid.is_walkable(row, col) {
                anomalies.push(format!("ghost {} inside wall at ({row}, {col})", ghost.id()));
            }
        }
    }
    anomalies
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, previous: Progress) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < previous.score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            previous.score, snapshot.score
        ));
    }
    if snapshot.lives > previous.lives {
        anomalies.push(format!(
            "lives increased: {} -> {}",
            previous.lives, snapshot.lives
        ));
    }
    if snapshot.score > snapshot.pellet_total {
        anomalies.push(format!(
            "score {} exceeds pellet total {}",
            snapshot.score, snapshot.pellet_total
        ));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli, started_at: DateTime<Utc>) -> Vec<Scenario> {
    let seed = cli
        .seed
        .unwrap_or_else(|| normalize_seed(started_at.timestamp_millis()));
    let runs = cli.runs.clamp(1, MAX_RUNS);
    (0..runs)
        .map(|idx| Scenario {
            name: format!("autopilot-{}", idx + 1),
            seed: seed.wrapping_add(idx as u32),
            max_ticks: cli.max_ticks.max(1),
        })
        .collect()
}

fn normalize_seed(timestamp_ms: i64) -> u32 {
    timestamp_ms as u32
}

fn outcome_key(outcome: Option<OutcomeSignal>) -> &'static str {
    match outcome {
        Some(signal) => signal.name(),
        None => "timeout",
    }
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        scenario_count,
        anomaly_count,
        average_duration_ms,
        outcome_counts,
        scenarios,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(outcome: &str, duration_ms: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            outcome: outcome.to_string(),
            ticks: duration_ms * 30 / 1000,
            duration_ms,
            score: 0,
            pellet_total: 282,
            pellets_eaten: 0,
            lives_lost: 0,
            anomalies: Vec::new(),
        }
    }

    fn cli(seed: Option<u32>, runs: usize) -> Cli {
        Cli {
            seed,
            runs,
            max_ticks: 100,
            config: None,
            match_id: None,
            summary_out: None,
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let now = Utc::now();
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            now,
            now,
            vec![
                make_scenario_result("timeout", 60_000),
                make_scenario_result("win", 90_000),
            ],
            BTreeMap::from([("timeout".to_string(), 1usize), ("win".to_string(), 1usize)]),
            1,
            150_000,
        );
        assert_eq!(summary.average_duration_ms, 75_000);
        assert_eq!(summary.scenario_count, 2);
        assert_eq!(summary.started_at, now.to_rfc3339());
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = Utc::now().timestamp_millis();
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            Utc::now(),
            Utc::now(),
            vec![make_scenario_result("timeout", 60_000)],
            BTreeMap::from([("timeout".to_string(), 1usize)]),
            0,
            60_000,
        );
        let result = write_summary(&target, &summary);
        assert!(result.is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn scenarios_use_consecutive_seeds_and_clamp_runs() {
        let scenarios = resolve_scenarios(&cli(Some(u32::MAX), 2), Utc::now());
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].seed, u32::MAX);
        assert_eq!(scenarios[1].seed, 0);
        assert_eq!(scenarios[1].name, "autopilot-2");

        assert_eq!(resolve_scenarios(&cli(Some(1), 0), Utc::now()).len(), 1);
        assert_eq!(resolve_scenarios(&cli(Some(1), 500), Utc::now()).len(), MAX_RUNS);
    }

    #[test]
    fn outcome_keys_cover_timeout() {
        assert_eq!(outcome_key(Some(OutcomeSignal::Win)), "win");
        assert_eq!(outcome_key(Some(OutcomeSignal::Loose)), "loose");
        assert_eq!(outcome_key(None), "timeout");
    }

    #[test]
    fn short_autopilot_run_is_clean() {
        let scenario = Scenario {
            name: "short".to_string(),
            seed: 5,
            max_ticks: 600,
        };
        let run = run_scenario(&GameConfig::default(), &scenario).expect("scenario runs");
        assert!(run.anomaly_records.is_empty(), "{:?}", run.anomaly_records);
        assert!(run.result.score > 0);
        assert_eq!(run.result.score, run.result.pellets_eaten);
        assert!(run.result.ticks <= 600);
    }

    #[test]
    fn progress_regressions_are_reported() {
        let config = GameConfig::default();
        let mut engine = GameEngine::new(config).expect("engine");
        let snapshot = engine.build_snapshot(false);
        let anomalies = collect_snapshot_anomalies(
            &snapshot,
            Progress {
                score: 5,
                lives: 1,
            },
        );
        assert_eq!(anomalies.len(), 2);
        assert!(collect_snapshot_anomalies(
            &snapshot,
            Progress {
                score: 0,
                lives: 3,
            }
        )
        .is_empty());
    }
}
