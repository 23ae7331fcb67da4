mod config;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use omeval_core::{EquivalenceGrader, Problem, ProblemRecord};
use omeval_harness::{run_pool, HttpClient, PoolConfig, RunReport, SamplingConfig};
use omeval_kb::{JsonStore, SymbolRetriever};

use crate::config::{load_config, show_config_path, Config};

#[derive(Parser)]
#[command(
    name = "omeval",
    version,
    about = "Knowledge-augmented math benchmark evaluation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a problem set against the configured backend
    Run {
        /// Path to the benchmark JSON (array of problem records)
        #[arg(short, long)]
        problems: PathBuf,

        /// Path to the knowledge base JSON
        #[arg(long)]
        kb: PathBuf,

        /// Path to the keyword index JSON
        #[arg(long)]
        index: PathBuf,

        /// Evaluate at most this many problems
        #[arg(short, long)]
        limit: Option<usize>,

        /// Override the configured relevance threshold
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Override the configured model name
        #[arg(short, long)]
        model: Option<String>,

        /// Report file (default: <output.dir>/run-<id>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Grade a single candidate answer against a ground truth
    Grade {
        /// Candidate answer (e.g. from a model completion)
        candidate: String,

        /// Ground-truth answer
        truth: String,
    },

    /// Show the knowledge entries retrieved for a problem statement
    Retrieve {
        /// Problem statement
        statement: String,

        /// Path to the knowledge base JSON
        #[arg(long)]
        kb: PathBuf,

        /// Path to the keyword index JSON
        #[arg(long)]
        index: PathBuf,

        /// Maximum entries to show
        #[arg(short, long, default_value = "20")]
        k: usize,
    },

    /// Show the active configuration path
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Commands::Run {
            problems,
            kb,
            index,
            limit,
            threshold,
            model,
            output,
        } => cmd_run(&config, problems, kb, index, limit, threshold, model, output),
        Commands::Grade { candidate, truth } => cmd_grade(&candidate, &truth),
        Commands::Retrieve {
            statement,
            kb,
            index,
            k,
        } => cmd_retrieve(&config, &statement, kb, index, k),
        Commands::Config => {
            println!("config: {}", show_config_path());
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    config: &Config,
    problems_path: PathBuf,
    kb_path: PathBuf,
    index_path: PathBuf,
    limit: Option<usize>,
    threshold: Option<f32>,
    model: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let threshold = threshold.unwrap_or(config.retrieval.relevance_threshold);
    let model = model.unwrap_or_else(|| config.model.name.clone());

    let problems = load_problems(&problems_path, threshold, limit)?;
    if problems.is_empty() {
        bail!("no problems in {}", problems_path.display());
    }
    println!("Loaded {} problems", problems.len());

    let store = JsonStore::open(&kb_path, &index_path)?;
    let retriever = SymbolRetriever::new(&store);
    let client = HttpClient::new(&config.model.endpoint, &model, config.model.timeout_secs);

    let sampling = SamplingConfig {
        max_attempts: config.sampling.max_attempts,
        temperature: config.sampling.temperature,
        max_tokens: config.model.max_tokens,
        base_seed: config.sampling.seed,
        transport_retries: config.harness.transport_retries,
        backoff: std::time::Duration::from_millis(config.harness.backoff_ms),
    };
    let pool = PoolConfig {
        concurrency: config.harness.concurrency,
        ..PoolConfig::default()
    };

    let started_at = Utc::now();
    let wall = Instant::now();
    let cancel = AtomicBool::new(false);
    let result = run_pool(
        &problems,
        &client,
        &pool,
        &sampling,
        |p| retriever.retrieve(p, config.retrieval.top_k).symbols,
        &cancel,
    );
    println!("Completed in {:.1}s", wall.elapsed().as_secs_f64());

    let report = RunReport::assemble(&model, &sampling, started_at, &result);
    print_summary(&report);

    let path = match output {
        Some(p) => p,
        None => {
            let dir = PathBuf::from(&config.output.dir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            dir.join(format!("run-{}.json", report.run_id))
        }
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("\nReport written to {}", path.display());
    Ok(())
}

fn cmd_grade(candidate: &str, truth: &str) -> Result<()> {
    let grader = EquivalenceGrader::default();
    let equivalent = grader
        .equivalent(Some(candidate), truth)
        .with_context(|| format!("grading against {truth:?}"))?;
    println!("{}", if equivalent { "equivalent" } else { "not equivalent" });
    Ok(())
}

fn cmd_retrieve(
    config: &Config,
    statement: &str,
    kb_path: PathBuf,
    index_path: PathBuf,
    k: usize,
) -> Result<()> {
    let store = JsonStore::open(&kb_path, &index_path)?;
    let mut problem = Problem::new("adhoc".into(), statement.into(), String::new());
    problem.relevance_threshold = config.retrieval.relevance_threshold;

    let result = SymbolRetriever::new(&store).retrieve(&problem, k);
    if result.is_empty() {
        println!("no entries above threshold {}", problem.relevance_threshold);
        return Ok(());
    }
    for scored in &result.symbols {
        println!(
            "{:.3}  {:<24} {}",
            scored.score, scored.entry.id, scored.entry.description
        );
    }
    Ok(())
}

fn load_problems(path: &Path, threshold: f32, limit: Option<usize>) -> Result<Vec<Problem>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<ProblemRecord> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let mut problems: Vec<Problem> = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| record.into_problem(idx, threshold))
        .collect();
    if let Some(limit) = limit {
        problems.truncate(limit);
    }
    debug!(count = problems.len(), "loaded problem records");
    Ok(problems)
}

fn print_summary(report: &RunReport) {
    let s = &report.summary;
    match s.accuracy {
        Some(acc) => println!(
            "\nOverall: {}/{} ({:.1}%)",
            s.correct,
            s.total - s.errored,
            acc * 100.0
        ),
        None => println!("\nOverall: no graded problems"),
    }
    if s.errored > 0 {
        println!("Errored: {}", s.errored);
    }
    if !report.failures.is_empty() {
        println!("Failed to evaluate: {}", report.failures.len());
    }
    if let Some(mean) = s.mean_attempts {
        println!("Avg attempts: {mean:.2}");
    }

    if !s.by_level.is_empty() {
        println!("\nBy Level:");
        for (level, group) in &s.by_level {
            let pct = group.accuracy.map(|a| a * 100.0).unwrap_or(0.0);
            println!(
                "  Level {}: {}/{} ({:.1}%)",
                level,
                group.correct,
                group.total - group.errored,
                pct
            );
        }
    }
    if !s.by_type.is_empty() {
        println!("\nBy Type:");
        for (ty, group) in &s.by_type {
            let pct = group.accuracy.map(|a| a * 100.0).unwrap_or(0.0);
            println!(
                "  {}: {}/{} ({:.1}%)",
                ty,
                group.correct,
                group.total - group.errored,
                pct
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_problems_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problems.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"[
                {{"problem": "1+1?", "answer": "2", "level": "Level 1", "type": "Prealgebra"}},
                {{"problem": "2+2?", "answer": "4", "level": 2, "subject": "Number Theory"}},
                {{"problem": "3+3?", "solution": "It is \\boxed{{6}}."}}
            ]"#
        )
        .unwrap();

        let problems = load_problems(&path, 0.3, None).unwrap();
        assert_eq!(problems.len(), 3);
        assert_eq!(problems[0].id, "math_00000");
        assert_eq!(problems[0].level, 1);
        assert_eq!(problems[0].problem_type, "prealgebra");
        assert_eq!(problems[1].problem_type, "number_theory");
        assert_eq!(problems[2].ground_truth, "6");

        let limited = load_problems(&path, 0.3, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_load_problems_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_problems(&path, 0.3, None).is_err());
    }
}
