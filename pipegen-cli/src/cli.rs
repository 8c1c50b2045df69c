//! Command-line orchestration for the pipegen instance generator.
//!
//! Offers three commands: `generate` for one instance, `batch` for a set of
//! instances per size category, and `stress` for the adversarial variants.
//! The batch drivers isolate per-instance failures: the offending parameters
//! are logged and the run continues with the next instance.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use pipegen_core::{
    dzn, report, GeneratorBuilder, GeneratorError, Instance, LayerSizes, RngStreams, SizeCategory,
    StressVariant, DEFAULT_TARGET_SLACK,
};
use thiserror::Error;
use tracing::{error, info};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "pipegen",
    about = "Generate pipe-network design instances for the external solver."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate a single instance.
    Generate(GenerateArgs),
    /// Generate a batch of instances per size category.
    Batch(BatchArgs),
    /// Generate adversarial stress instances.
    Stress(StressArgs),
}

/// Size categories selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    /// Small instances.
    Small,
    /// Medium instances.
    Medium,
    /// Large instances.
    Large,
}

impl fmt::Display for CategoryArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(name)
    }
}

impl From<CategoryArg> for SizeCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Small => Self::Small,
            CategoryArg::Medium => Self::Medium,
            CategoryArg::Large => Self::Large,
        }
    }
}

/// Stress variants selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// Demand above the theoretical deliverable maximum.
    DemandOverload,
    /// All flow through a single tank.
    Bottleneck,
    /// Economically implausible transport costs.
    ProhibitiveCost,
    /// Arcs removed to isolate final nodes.
    FragmentedTopology,
    /// Near-zero supply headroom.
    NearExactBalance,
    /// Mismatched capacity requirements on a shared topology.
    ConflictingCapacity,
}

impl From<VariantArg> for StressVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::DemandOverload => Self::DemandOverload,
            VariantArg::Bottleneck => Self::Bottleneck,
            VariantArg::ProhibitiveCost => Self::ProhibitiveCost,
            VariantArg::FragmentedTopology => Self::FragmentedTopology,
            VariantArg::NearExactBalance => Self::NearExactBalance,
            VariantArg::ConflictingCapacity => Self::ConflictingCapacity,
        }
    }
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Number of plant nodes (explicit sizes need all four).
    #[arg(long)]
    pub plants: Option<usize>,

    /// Number of tank nodes.
    #[arg(long)]
    pub tanks: Option<usize>,

    /// Number of transfer nodes.
    #[arg(long)]
    pub transfers: Option<usize>,

    /// Number of final demand nodes.
    #[arg(long)]
    pub finals: Option<usize>,

    /// Size category; selects envelopes, and sizes when none are given.
    #[arg(long, value_enum, default_value_t = CategoryArg::Small)]
    pub category: CategoryArg,

    /// Seed pinning both RNG streams for a reproducible draw.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Target slack factor (total supply over total demand).
    #[arg(long, default_value_t = DEFAULT_TARGET_SLACK)]
    pub slack: f64,

    /// Output path for the parameter file.
    #[arg(long)]
    pub out: PathBuf,

    /// Also write a plain-text diagnostic report here.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Also write the metadata record as JSON here.
    #[arg(long)]
    pub metadata: Option<PathBuf>,
}

/// Options accepted by the `batch` command.
#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Instances per category.
    #[arg(long, default_value_t = 5)]
    pub count: usize,

    /// Categories to generate (defaults to all three).
    #[arg(long, value_enum)]
    pub category: Vec<CategoryArg>,

    /// Base seed; instance k uses seed + k so the whole batch is pinned.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory receiving the artifacts.
    #[arg(long)]
    pub out_dir: PathBuf,
}

/// Options accepted by the `stress` command.
#[derive(Debug, Args, Clone)]
pub struct StressArgs {
    /// Variants to generate (defaults to all six).
    #[arg(long, value_enum)]
    pub variant: Vec<VariantArg>,

    /// Instances per variant.
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// Base seed; instance k uses seed + k so the whole run is pinned.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory receiving the artifacts.
    #[arg(long)]
    pub out_dir: PathBuf,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Explicit sizes were given only partially.
    #[error("explicit sizes need all of --plants, --tanks, --transfers and --finals")]
    PartialSizes,
    /// File I/O outside the serializer failed.
    #[error("failed to write `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Metadata could not be encoded as JSON.
    #[error("failed to encode metadata: {source}")]
    Json {
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },
    /// Core generation or serialization failed.
    #[error(transparent)]
    Core(#[from] GeneratorError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    /// Parameter files written, in generation order.
    pub written: Vec<PathBuf>,
    /// Number of instances that failed and were skipped.
    pub failed: usize,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when generation or an artifact write fails. Batch
/// commands only fail as a whole on I/O errors for the output directory;
/// per-instance failures, write failures included, are logged and counted
/// instead.
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Batch(args) => run_batch(args),
        Command::Stress(args) => run_stress(args),
    }
}

/// Renders the execution summary to the given writer.
///
/// # Errors
/// Propagates I/O errors from the writer.
pub fn render_summary(summary: &ExecutionSummary, out: &mut impl Write) -> io::Result<()> {
    for path in &summary.written {
        writeln!(out, "{}", path.display())?;
    }
    writeln!(
        out,
        "{} instance(s) written, {} failed",
        summary.written.len(),
        summary.failed
    )
}

fn run_generate(args: GenerateArgs) -> Result<ExecutionSummary, CliError> {
    let category = SizeCategory::from(args.category);
    let sizes = explicit_sizes(&args)?;
    let instance = generate_one(sizes, category, args.slack, args.seed)?;

    dzn::write(&instance, &args.out)?;
    if let Some(path) = &args.report {
        report::write(&instance, None, path)?;
    }
    if let Some(path) = &args.metadata {
        write_metadata(&instance, path)?;
    }

    Ok(ExecutionSummary {
        written: vec![args.out],
        failed: 0,
    })
}

fn run_batch(args: BatchArgs) -> Result<ExecutionSummary, CliError> {
    let categories: Vec<SizeCategory> = if args.category.is_empty() {
        vec![SizeCategory::Small, SizeCategory::Medium, SizeCategory::Large]
    } else {
        args.category.iter().copied().map(Into::into).collect()
    };
    ensure_dir(&args.out_dir)?;

    let mut summary = ExecutionSummary::default();
    let mut draw = 0u64;
    for category in categories {
        for k in 1..=args.count {
            let seed = args.seed.map(|base| base.wrapping_add(draw));
            draw += 1;

            let outcome = generate_one(None, category, DEFAULT_TARGET_SLACK, seed)
                .and_then(|instance| {
                    let stem = format!("inst_{category}_{k:02}");
                    write_artifacts(&instance, &args.out_dir, &stem, false)
                });
            match outcome {
                Ok(path) => summary.written.push(path),
                Err(err) => {
                    error!(
                        %category,
                        index = k,
                        ?seed,
                        error = %err,
                        "instance failed; continuing with the next one"
                    );
                    summary.failed += 1;
                }
            }
        }
    }
    Ok(summary)
}

fn run_stress(args: StressArgs) -> Result<ExecutionSummary, CliError> {
    let variants: Vec<StressVariant> = if args.variant.is_empty() {
        StressVariant::ALL.to_vec()
    } else {
        args.variant.iter().copied().map(Into::into).collect()
    };
    ensure_dir(&args.out_dir)?;

    let mut summary = ExecutionSummary::default();
    let mut draw = 0u64;
    for variant in variants {
        for k in 1..=args.count {
            let seed = args.seed.map(|base| base.wrapping_add(draw));
            draw += 1;

            let result = match seed {
                Some(seed) => variant.generate_seeded(seed),
                None => {
                    let mut streams = RngStreams::from_entropy();
                    variant.generate(None, &mut streams)
                }
            };
            let outcome = result.map_err(CliError::Core).and_then(|instance| {
                let stem = format!("{variant}_{k}");
                write_artifacts(&instance, &args.out_dir, &stem, true)
            });
            match outcome {
                Ok(path) => summary.written.push(path),
                Err(err) => {
                    error!(
                        %variant,
                        index = k,
                        ?seed,
                        error = %err,
                        "stress instance failed; continuing with the next one"
                    );
                    summary.failed += 1;
                }
            }
        }
    }
    Ok(summary)
}

fn generate_one(
    sizes: Option<LayerSizes>,
    category: SizeCategory,
    slack: f64,
    seed: Option<u64>,
) -> Result<Instance, CliError> {
    let builder = match sizes {
        Some(sizes) => GeneratorBuilder::new(sizes),
        None => GeneratorBuilder::sampled(category, seed),
    };
    let builder = builder.with_category(category).with_target_slack(slack);
    let builder = match seed {
        Some(seed) => builder.with_seed(seed),
        None => builder,
    };
    let instance = builder.build().generate()?;
    info!(
        size_class = %instance.metadata().size_class,
        arcs = instance.metadata().arc_count,
        "generated instance"
    );
    Ok(instance)
}

fn write_artifacts(
    instance: &Instance,
    dir: &Path,
    stem: &str,
    with_report: bool,
) -> Result<PathBuf, CliError> {
    let dzn_path = dir.join(format!("{stem}.dzn"));
    dzn::write(instance, &dzn_path)?;
    write_metadata(instance, &dir.join(format!("{stem}.json")))?;
    if with_report {
        report::write(instance, None, &dir.join(format!("{stem}_report.txt")))?;
    }
    Ok(dzn_path)
}

fn write_metadata(instance: &Instance, path: &Path) -> Result<(), CliError> {
    let encoded = serde_json::to_vec_pretty(instance.metadata())
        .map_err(|source| CliError::Json { source })?;
    fs::write(path, encoded).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_dir(dir: &Path) -> Result<(), CliError> {
    fs::create_dir_all(dir).map_err(|source| CliError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn explicit_sizes(args: &GenerateArgs) -> Result<Option<LayerSizes>, CliError> {
    match (args.plants, args.tanks, args.transfers, args.finals) {
        (Some(p), Some(t), Some(c1), Some(c2)) => {
            Ok(Some(LayerSizes::new(p, t, c1, c2).map_err(CliError::Core)?))
        }
        (None, None, None, None) => Ok(None),
        _ => Err(CliError::PartialSizes),
    }
}
