mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod scorer;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::input::ground_truth::GroundTruth;
use crate::input::predictions::load_predictions;
use crate::pipeline::stage1_normalize::{DuplicatePolicy, KeyMode, Stage1Params};
use crate::pipeline::stage4_report::{OutputPlan, print_results, write_reports};
use crate::pipeline::summary::summarize;
use crate::pipeline::{EvalConfig, run_evaluation};
use crate::report::delimited::write_summary_csv;
use crate::report::text::render_summary;
use crate::scorer::CommandScorer;
use crate::scorer::command::{DEFAULT_PROGRAM, default_bridge};

const DEFAULT_GT: &str = "evaluation/DLC-bench/annotations.json";
const DEFAULT_SUMMARY_CSV: &str = "caption_summary.csv";

#[derive(Debug, Parser)]
#[command(name = "capeval", version, about = "Score caption predictions with standard captioning metrics")]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score predictions against ground truth.
    Eval(EvalArgs),
    /// Caption statistics for a predictions file.
    Summary(SummaryArgs),
}

#[derive(Debug, Args)]
struct EvalArgs {
    /// Ground-truth annotations (COCO format).
    #[arg(long, env = "CAPEVAL_GT", default_value = DEFAULT_GT)]
    gt: PathBuf,

    /// Predictions JSON: {"<imageId>_<annId>": "caption", ...}.
    #[arg(long)]
    pred: PathBuf,

    /// Write the raw metric map here.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the canonical metrics table here.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Directory for metrics_results.{json,csv} when --output/--csv are not given.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Fail on malformed prediction keys instead of dropping them.
    #[arg(long)]
    strict: bool,

    /// Handling of several predictions for one image id.
    #[arg(long, value_enum, default_value_t = DuplicatesArg::Keep)]
    duplicates: DuplicatesArg,

    /// Scorer program.
    #[arg(long, env = "CAPEVAL_SCORER", default_value = DEFAULT_PROGRAM)]
    scorer: String,

    /// Arguments passed to the scorer before --gt/--res (repeatable).
    /// With the default scorer and none given, the bundled bridge script.
    #[arg(long = "scorer-arg", allow_hyphen_values = true)]
    scorer_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DuplicatesArg {
    Keep,
    First,
    Reject,
}

impl From<DuplicatesArg> for DuplicatePolicy {
    fn from(value: DuplicatesArg) -> Self {
        match value {
            DuplicatesArg::Keep => DuplicatePolicy::Keep,
            DuplicatesArg::First => DuplicatePolicy::First,
            DuplicatesArg::Reject => DuplicatePolicy::Reject,
        }
    }
}

#[derive(Debug, Args)]
struct SummaryArgs {
    /// Predictions JSON.
    #[arg(long)]
    pred: PathBuf,

    /// Optional ground truth, for image/annotation counts.
    #[arg(long)]
    gt: Option<PathBuf>,

    /// Summary table destination.
    #[arg(long, default_value = DEFAULT_SUMMARY_CSV)]
    out: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli.command) {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Eval(args) => run_eval(args),
        Command::Summary(args) => run_summary(args),
    }
}

fn run_eval(args: EvalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, plan) = resolve_eval(&args);
    let (program, scorer_args) = resolve_scorer(&args);
    let scorer = CommandScorer::new(program, scorer_args);

    let outcome = run_evaluation(&config, &scorer)?;
    tracing::info!(
        scored = outcome.n_records,
        predictions = outcome.n_predictions,
        "evaluation finished"
    );
    if let Some(first) = outcome.dropped.first() {
        tracing::warn!(
            dropped = outcome.dropped.len(),
            of = outcome.n_predictions,
            first = %first.key,
            reason = %first.reason,
            "predictions were excluded because of malformed keys"
        );
    }

    print_results(&outcome.scores, &mut std::io::stdout().lock())?;
    let written = write_reports(&outcome.scores, &plan);
    if !written.failures.is_empty() {
        tracing::warn!(
            saved = ?written.written,
            failed = written.failures.len(),
            "some artifacts were not saved; scores above are complete"
        );
    } else if written.written.is_empty() {
        tracing::debug!("no artifacts requested");
    }
    Ok(())
}

/// The bridge script is only implied for the default interpreter; any other
/// scorer gets exactly the arguments it was given.
fn resolve_scorer(args: &EvalArgs) -> (String, Vec<String>) {
    let mut scorer_args = args.scorer_args.clone();
    if scorer_args.is_empty() && args.scorer == DEFAULT_PROGRAM {
        let bridge = default_bridge();
        tracing::debug!(bridge = %bridge.display(), "using bundled scorer bridge");
        scorer_args.push(bridge.to_string_lossy().into_owned());
    }
    (args.scorer.clone(), scorer_args)
}

fn resolve_eval(args: &EvalArgs) -> (EvalConfig, OutputPlan) {
    let config = EvalConfig {
        gt_path: args.gt.clone(),
        pred_path: args.pred.clone(),
        normalize: Stage1Params {
            key_mode: if args.strict {
                KeyMode::Strict
            } else {
                KeyMode::Lenient
            },
            duplicates: args.duplicates.into(),
        },
    };
    let plan = OutputPlan::resolve(args.output.clone(), args.csv.clone(), args.out_dir.as_deref());
    (config, plan)
}

fn run_summary(args: SummaryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let predictions = load_predictions(&args.pred)?;
    let ground_truth = args.gt.as_deref().map(GroundTruth::load).transpose()?;

    let summary = summarize(&predictions, ground_truth.as_ref());
    print!("{}", render_summary(&summary));

    match write_summary_csv(&summary, &args.out) {
        Ok(()) => tracing::info!(path = %args.out.display(), "saved summary"),
        Err(err) => tracing::error!(%err, "could not save summary"),
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
