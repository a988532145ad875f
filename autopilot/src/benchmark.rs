use crate::arena::{run_race, ArenaConfig, Finish, RaceResult, Team};
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub arena: ArenaConfig,
    pub seeds: Vec<u32>,
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub planner: String,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_passed: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub max_turns: u32,
    pub generations: u32,
    pub jobs: Option<usize>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub completed: usize,
    pub draws: usize,
    pub avg_turns: f64,
    pub avg_completed_turns: Option<f64>,
    pub home: TeamAggregate,
    pub away: TeamAggregate,
    pub runs: Vec<RaceResult>,
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }

    let arena = &config.arena;
    let run_one = |seed: &u32| -> Result<RaceResult> {
        run_race(*seed, arena).with_context(|| format!("benchmark race failed for seed={seed:#x}"))
    };

    info!(
        races = config.seeds.len(),
        home = %arena.home.id,
        away = %arena.away.id,
        "benchmark started"
    );
    let results: Vec<Result<RaceResult>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| config.seeds.par_iter().map(run_one).collect())
    } else {
        config.seeds.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(results.len());
    for result in results {
        runs.push(result?);
    }

    let report = summarize(&config, runs);
    if let Some(out_dir) = &config.out_dir {
        write_summary(out_dir, &report)?;
    }
    info!(
        runs = report.run_count,
        home_win_rate = report.home.win_rate,
        away_win_rate = report.away.win_rate,
        "benchmark finished"
    );
    Ok(report)
}

fn summarize(config: &BenchmarkConfig, runs: Vec<RaceResult>) -> BenchmarkReport {
    let count = runs.len();
    let completed: Vec<&RaceResult> = runs
        .iter()
        .filter(|r| r.finish == Finish::Completed)
        .collect();
    let draws = runs.iter().filter(|r| r.winner.is_none()).count();
    let avg_turns = runs.iter().map(|r| r.turns as f64).sum::<f64>() / count.max(1) as f64;
    let avg_completed_turns = (!completed.is_empty()).then(|| {
        completed.iter().map(|r| r.turns as f64).sum::<f64>() / completed.len() as f64
    });

    let aggregate = |team: Team, planner: &str| {
        let wins = runs.iter().filter(|r| r.winner == Some(team)).count();
        let pods = match team {
            Team::Home => 0..2,
            Team::Away => 2..4,
        };
        let passed: u64 = runs
            .iter()
            .flat_map(|r| r.passed.get(pods.clone()).unwrap_or_default())
            .map(|&p| p as u64)
            .sum();
        TeamAggregate {
            planner: planner.to_string(),
            wins,
            win_rate: wins as f64 / count.max(1) as f64,
            avg_passed: passed as f64 / (count.max(1) * 2) as f64,
        }
    };

    BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        max_turns: config.arena.max_turns,
        generations: config.arena.generations,
        jobs: config.jobs,
        seeds: config.seeds.clone(),
        run_count: count,
        completed: completed.len(),
        draws,
        avg_turns,
        avg_completed_turns,
        home: aggregate(Team::Home, &config.arena.home.id),
        away: aggregate(Team::Away, &config.arena.away.id),
        runs,
    }
}

fn write_summary(out_dir: &Path, report: &BenchmarkReport) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed creating {}", out_dir.display()))?;

    let mut csv = String::from("seed_hex,seed,checkpoints,turns,finish,winner,collisions\n");
    for run in &report.runs {
        csv.push_str(&format!(
            "{},{},{},{},{:?},{},{}\n",
            run.seed_hex,
            run.seed,
            run.checkpoints,
            run.turns,
            run.finish,
            run.winner
                .map(|team| format!("{team:?}").to_lowercase())
                .unwrap_or_else(|| "draw".to_string()),
            run.collisions
        ));
    }
    let csv_path = out_dir.join("runs.csv");
    fs::write(&csv_path, csv).with_context(|| format!("failed writing {}", csv_path.display()))?;

    let report_path = out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))
}
