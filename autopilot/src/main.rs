use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pod_autopilot::arena::{run_race, ArenaConfig};
use pod_autopilot::benchmark::{run_benchmark, BenchmarkConfig};
use pod_autopilot::config::PlannerConfig;
use pod_autopilot::driver::run_session;
use pod_autopilot::util::{parse_seed, parse_seed_csv, parse_seed_file, seed_sequence};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pod-autopilot")]
#[command(about = "Anytime plan-search autopilot for two-on-two pod races")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct PlannerArgs {
    /// Planner config JSON; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Named preset (default, cautious, aggressive)
    #[arg(long)]
    preset: Option<String>,
    /// Overrides the planner's RNG seed
    #[arg(long)]
    seed: Option<String>,
}

impl PlannerArgs {
    fn resolve(&self) -> Result<PlannerConfig> {
        let mut cfg = PlannerConfig::resolve(self.config.as_deref(), self.preset.as_deref())?;
        if let Some(seed) = &self.seed {
            cfg.seed = parse_seed(seed)?;
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Home planner preset
    #[arg(long, default_value = "default")]
    home: String,
    /// Away planner preset
    #[arg(long, default_value = "default")]
    away: String,
    #[arg(long, default_value_t = 400)]
    max_turns: u32,
    /// Search generations per decision
    #[arg(long, default_value_t = 40)]
    generations: u32,
}

impl MatchArgs {
    fn arena(&self) -> Result<ArenaConfig> {
        Ok(ArenaConfig {
            home: PlannerConfig::resolve(None, Some(self.home.as_str()))?,
            away: PlannerConfig::resolve(None, Some(self.away.as_str()))?,
            max_turns: self.max_turns,
            generations: self.generations,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one race over stdin/stdout
    Play {
        #[command(flatten)]
        planner: PlannerArgs,
    },
    /// Run one offline race between two planners and print the result as JSON
    Race {
        #[arg(long)]
        seed: String,
        #[command(flatten)]
        matchup: MatchArgs,
    },
    /// Run many offline races in parallel
    Benchmark {
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[command(flatten)]
        matchup: MatchArgs,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Print the resolved planner config
    ShowConfig {
        #[command(flatten)]
        planner: PlannerArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Play { planner } => {
            let cfg = planner.resolve()?;
            let stdin = io::stdin().lock();
            let stdout = BufWriter::new(io::stdout().lock());
            run_session(cfg, stdin, stdout)?;
        }
        Commands::Race { seed, matchup } => {
            let seed = parse_seed(&seed)?;
            let result = run_race(seed, &matchup.arena()?)?;
            let encoded =
                serde_json::to_string_pretty(&result).context("failed to serialize race result")?;
            println!("{encoded}");
        }
        Commands::Benchmark {
            seeds,
            seed_file,
            seed_start,
            seed_count,
            matchup,
            out_dir,
            jobs,
        } => {
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let out_dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "benchmarks/{}-vs-{}-{}",
                    matchup.home,
                    matchup.away,
                    timestamp_suffix()
                ))
            });

            let report = run_benchmark(BenchmarkConfig {
                arena: matchup.arena()?,
                seeds,
                out_dir: Some(out_dir.clone()),
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("completed={}", report.completed);
            println!("draws={}", report.draws);
            println!("avg_turns={:.1}", report.avg_turns);
            for side in [&report.home, &report.away] {
                println!(
                    "  {:12} wins={} win_rate={:.0}% avg_passed={:.1}",
                    side.planner,
                    side.wins,
                    side.win_rate * 100.0,
                    side.avg_passed
                );
            }
            println!("out_dir={}", out_dir.display());
        }
        Commands::ShowConfig { planner } => {
            let cfg = planner.resolve()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}

fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }
    let start = match seed_start {
        Some(start) => parse_seed(start)?,
        None => 0x5EED_0001,
    };
    Ok(seed_sequence(start, seed_count))
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
