//! `codeqc` — run the quality gate over a source tree
//!
//! The gate never runs build, test or packaging tools. Run them first and pass
//! their outcomes in a JSON sidecar (`codeqc schema` prints its shape).
//!
//! # Usage
//!
//! ```bash
//! # Gate a tree with results collected by CI
//! codeqc run . --input ci-results.json --write-evidence
//!
//! # DeepTech grade, fixed nonce, JSON output
//! codeqc run . --input ci-results.json --grade deeptech --nonce "$CI_RUN_ID" --json
//!
//! # List the rule catalogue
//! codeqc rules
//! ```
//!
//! Configuration: `codeqc.toml` in the tree root (or `--config`), then
//! `CODEQC_*` environment overrides, then flags.

mod evidence_writer;
mod walker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codeqc::rules::catalogue::{AXIOMS, PROHIBITIONS, REDLINES};
use codeqc::{ProductGrade, QcConfig, QualityGate, RunInput, RunResult, SourceFile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ten-step gate over a source tree
    Run(RunArgs),
    /// Print the rule catalogue
    Rules {
        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the JSON schema of the run input sidecar
    Schema,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Root of the tree to scan
    #[arg(default_value = ".")]
    root: PathBuf,

    /// JSON file with external tool results, spec metadata and proof judgements
    #[arg(long)]
    input: Option<PathBuf>,

    /// Product grade (overrides the input file)
    #[arg(long, value_enum)]
    grade: Option<GradeArg>,

    /// Anti-replay nonce (overrides the input file; generated when absent)
    #[arg(long)]
    nonce: Option<String>,

    /// Path to a TOML config (default: <root>/codeqc.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evidence directory (overrides the input file)
    #[arg(long)]
    evidence_dir: Option<String>,

    /// Write the evidence logs after the run
    #[arg(long, default_value_t = false)]
    write_evidence: bool,

    /// Print the full result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// File whose contents are folded into the evidence hash
    #[arg(long)]
    proof_log: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GradeArg {
    Commercial,
    Deeptech,
}

impl From<GradeArg> for ProductGrade {
    fn from(arg: GradeArg) -> Self {
        match arg {
            GradeArg::Commercial => ProductGrade::Commercial,
            GradeArg::Deeptech => ProductGrade::DeepTech,
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("codeqc=info".parse()?)
                .add_directive("codeqc_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Run(run_args) => run(run_args),
        Command::Rules { json } => {
            print_rules(json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Schema => {
            let schema = schemars::schema_for!(RunInput);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(args: RunArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let input = build_input(&args)?;

    let result = QualityGate::new(config).run(&input);

    if args.write_evidence {
        evidence_writer::write_evidence(&result, Path::new("."))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    Ok(if result.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn load_config(args: &RunArgs) -> Result<QcConfig> {
    let default_path = args.root.join("codeqc.toml");
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None if default_path.is_file() => Some(default_path),
        None => None,
    };

    let config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading config");
            let mut config = QcConfig::from_file(&path)?;
            config.apply_env();
            config
        }
        None => QcConfig::from_env(),
    };
    Ok(config)
}

fn build_input(args: &RunArgs) -> Result<RunInput> {
    let mut input = match &args.input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input {}", path.display()))?;
            serde_json::from_str::<RunInput>(&text)
                .with_context(|| format!("Invalid run input {}", path.display()))?
        }
        None => RunInput::default(),
    };

    let files = walker::SourceWalker::new(&args.root)
        .collect()
        .with_context(|| format!("Failed to walk {}", args.root.display()))?;
    tracing::info!(root = %args.root.display(), files = files.len(), "Collected source files");
    merge_files(&mut input.files, files);

    if let Some(grade) = args.grade {
        input.grade = grade.into();
    }
    if let Some(nonce) = &args.nonce {
        input.nonce = Some(nonce.clone());
    }
    if let Some(dir) = &args.evidence_dir {
        input.evidence_dir = dir.clone();
    }
    if let Some(path) = &args.proof_log {
        input.proof_log = Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read proof log {}", path.display()))?,
        );
    }
    Ok(input)
}

/// Add walked files to the sidecar's list. A walked file replaces a sidecar
/// entry with the same path.
fn merge_files(files: &mut Vec<SourceFile>, walked: Vec<SourceFile>) {
    let walked_paths: HashSet<&str> = walked.iter().map(|f| f.path.as_str()).collect();
    let before = files.len();
    files.retain(|f| !walked_paths.contains(f.path.as_str()));
    if files.len() < before {
        tracing::debug!(replaced = before - files.len(), "Sidecar files shadowed by walked files");
    }
    files.extend(walked);
}

fn print_report(result: &RunResult) {
    println!("CodeQC {} run  nonce {}", result.grade, result.nonce);
    println!();
    for step in &result.steps {
        println!(
            "  {:>2}. {:<18} {} {:<16} {}",
            step.step,
            step.name,
            if step.passed { "PASS" } else { "FAIL" },
            if step.fatal { "" } else { "(non-fatal)" },
            step.details
        );
    }
    let failed = result.failed_steps();
    if !failed.is_empty() {
        println!();
        for step in failed {
            if let Some(fault) = step.fault_mode {
                println!("  {}. {} fault: {fault} ({})", step.step, step.name, fault.description());
            }
        }
    }
    println!();
    for gate in result.gates.gates() {
        println!(
            "  {} {} {}",
            gate.gate,
            if gate.passed { "PASS" } else { "FAIL" },
            gate.detail
        );
    }
    println!();
    println!(
        "  DoD {}/8{}",
        result.dod.passed_count(),
        if result.dod.mission_complete { " (mission complete)" } else { "" }
    );
    for item in result.dod.items.iter().filter(|i| !i.passed) {
        println!("    [{}] {}: {}", item.id, item.name, item.verification);
    }
    println!(
        "  Integrity LV{}/{}  Score {:.2} (functional {:.2} {}, quality {:.2} {}, authenticity {:.2} {})",
        result.achieved_level,
        result.target_level,
        result.score.composite,
        result.score.functional.score,
        result.score.functional.status,
        result.score.quality.score,
        result.score.quality.status,
        result.score.authenticity.score,
        result.score.authenticity.status,
    );
    println!("  Evidence hash {}", result.evidence_hash);
    println!();
    println!("{}", result.summary());
}

fn print_rules(json: bool) -> Result<()> {
    if json {
        let catalogue = serde_json::json!({
            "redlines": REDLINES,
            "prohibitions": PROHIBITIONS,
            "axioms": AXIOMS,
        });
        println!("{}", serde_json::to_string_pretty(&catalogue)?);
        return Ok(());
    }

    println!("Redlines (must be zero)");
    for r in REDLINES {
        println!("  {} {:<28} {}", r.rule.id, r.rule.name, r.rule.message);
    }
    println!("Prohibitions");
    for p in PROHIBITIONS {
        println!("  {} {:<28} {:<7} {}", p.id, p.name, p.severity, p.message);
    }
    println!("Axioms (not automatable)");
    for a in AXIOMS {
        println!("  {} {:<28} {}", a.id, a.name, a.principle);
    }
    Ok(())
}
