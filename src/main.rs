use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use schedulability::codec;
use schedulability::generate::{random_model, GenerateConfig};
use schedulability::models::Time;
use schedulability::scheduler::{Schedule, ScheduleFactory, ScheduleGenerator};

/// Exhaustive multicore schedulability analysis: count and enumerate every
/// feasible schedule of a dependent task set on identical cores.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the schedule set of a task model
    Compute {
        /// Path to a task model (either JSON schema)
        model: PathBuf,

        /// The number of available cores
        #[arg(long, default_value_t = 2)]
        core_count: usize,

        /// Global deadline; defaults to the latest completion bound in the
        /// model
        #[arg(long)]
        global_deadline: Option<Time>,

        /// Pretty-print all found schedules
        #[arg(long)]
        show: bool,
    },

    /// Generate a random task model
    Generate {
        /// The number of tasks in the model
        task_count: usize,

        /// The path to the output file
        output: PathBuf,

        /// Maximum number of dependencies per task
        #[arg(long, default_value_t = 4)]
        max_deps: usize,

        /// Probability of a task being a dependency of another
        #[arg(long, default_value_t = 0.1)]
        dep_prob: f32,

        /// Seed for deterministic output
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("schedulability={level}"))),
        )
        .init();

    match cli.command {
        Commands::Compute {
            model,
            core_count,
            global_deadline,
            show,
        } => compute(&model, core_count, global_deadline, show),
        Commands::Generate {
            task_count,
            output,
            max_deps,
            dep_prob,
            seed,
        } => generate(task_count, &output, max_deps, dep_prob, seed),
    }
}

fn compute(
    path: &Path,
    core_count: usize,
    global_deadline: Option<Time>,
    show: bool,
) -> Result<()> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("couldn't read '{}'", path.display()))?;
    let model = codec::model_from_json(&input)?;
    let deadline = global_deadline.unwrap_or_else(|| model.default_global_deadline());

    let generator = ScheduleGenerator::new(core_count).with_global_deadline(deadline);
    let mut factory = ScheduleFactory::new();

    let started = Instant::now();
    let space = generator.generate(&model, &mut factory);
    // Schedulings are consistent by construction; only completeness is
    // left to check.
    let schedules = generator.complete_schedules(&model, &mut factory, space);
    let elapsed = started.elapsed();

    println!(
        "Possible schedules: {} ({} nodes created in {:.2?})",
        factory.count(schedules),
        factory.created_count(),
        elapsed
    );

    if show {
        for mapping in factory.mappings(schedules) {
            println!("{}\n", Schedule::from_mapping(&mapping));
        }
    }
    Ok(())
}

fn generate(
    task_count: usize,
    output: &Path,
    max_deps: usize,
    dep_prob: f32,
    seed: Option<u64>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let config = GenerateConfig::new(task_count)
        .with_max_deps(max_deps)
        .with_dep_prob(dep_prob);
    let model = random_model(&config, &mut rng)?;

    let json = codec::model_to_json(&model)?;
    fs::write(output, json)
        .with_context(|| format!("couldn't write '{}'", output.display()))?;
    Ok(())
}
