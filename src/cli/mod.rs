//! tabcost CLI Module
//!
//! Command-line interface for running the pipeline and inspecting inputs.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::pipeline::{Pipeline, PipelineReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tabcost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tabular cost regression: preprocess, train and write a submission")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on train.csv and write predictions for test.csv
    Run(PipelineArgs),

    /// Show table sizes, column roles and split sizes without training
    Inspect(PipelineArgs),
}

/// Flags shared by every command; each one overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Directory holding train.csv, test.csv and sample_submission.csv
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Submission output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target column name
    #[arg(short, long)]
    pub target: Option<String>,

    /// Integer columns with more distinct values are continuous
    #[arg(long)]
    pub max_card: Option<usize>,

    /// Fraction of train rows held out for validation
    #[arg(long)]
    pub valid_pct: Option<f64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub epochs: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub lr: Option<f64>,
}

impl PipelineArgs {
    /// Config file (or defaults) with the given flags applied on top
    pub fn to_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(max_card) = self.max_card {
            config.max_card = max_card;
        }
        if let Some(valid_pct) = self.valid_pct {
            config.valid_pct = valid_pct;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(lr) = self.lr {
            config.learning_rate = lr;
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(args: &PipelineArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(args.to_config()?)?;
    let config = pipeline.config();
    section("Run");
    kv("Data", &config.data_dir.display().to_string());
    kv("Epochs", &config.epochs.to_string());

    step_run("Training");
    let start = Instant::now();
    let report = pipeline.run()?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);
    Ok(())
}

fn print_report(report: &PipelineReport) {
    section("Data");
    kv("Rows", &format!("{} train, {} test", report.n_train, report.n_test));
    kv("Split", &format!("{} train / {} valid", report.n_train_split, report.n_valid_split));
    kv("Categorical", &list(&report.cat_names));
    kv("Continuous", &list(&report.cont_names));

    if !report.history.is_empty() {
        println!();
        println!("  {:<8} {:>14} {:>14} {:>12}", muted("Epoch"), muted("Train loss"), muted("Valid loss"), muted("RMSE"));
        println!("  {}", dim(&"─".repeat(52)));
        for stats in &report.history {
            let fmt = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<8} {:>14.4} {:>14} {:>12}",
                stats.epoch,
                stats.train_loss,
                fmt(stats.valid_loss),
                fmt(stats.rmse)
            );
        }
    }

    println!();
    if let Some(rmse) = report.valid_rmse {
        println!("  {:<16} {}", muted("Valid RMSE"), format!("{:.4}", rmse).white().bold());
    }
    println!("  {} {}", ok("✓"), report.submission_path.display());
    println!();
}

pub fn cmd_inspect(args: &PipelineArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(args.to_config()?)?;
    section("Inspect");

    let inputs = pipeline.load_inputs()?;
    kv("Train", &format!("{} rows × {} cols", inputs.train.nrows(), inputs.train.ncols()));
    kv("Test", &format!("{} rows × {} cols", inputs.test.nrows(), inputs.test.ncols()));
    kv(
        "Submission",
        &format!("{} rows × {} cols", inputs.sample_submission.nrows(), inputs.sample_submission.ncols()),
    );

    let prepared = pipeline.prepare(&inputs)?;
    section("Columns");
    kv("Target", &pipeline.config().target);
    kv("Categorical", &list(&prepared.roles.cat_names));
    kv("Continuous", &list(&prepared.roles.cont_names));
    kv("Added", &list(
        &prepared
            .tabular
            .cat_names()
            .iter()
            .filter(|n| !prepared.roles.contains(n))
            .cloned()
            .collect::<Vec<_>>(),
    ));
    let cards: Vec<String> = prepared
        .tabular
        .cat_names()
        .iter()
        .zip(prepared.tabular.cardinalities())
        .map(|(n, c)| format!("{}={}", n, c))
        .collect();
    kv("Cardinality", &list(&cards));

    section("Split");
    kv("Train rows", &prepared.split.train.len().to_string());
    kv("Valid rows", &prepared.split.valid.len().to_string());
    println!();
    Ok(())
}
