//! CLI argument parsing for the run generators.
//!
//! Each subcommand prepares one stage of the workflow; global flags feed the
//! shared settings object.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "mdprep",
    version,
    about = "Generate mdp, run-input, JSON and task-list files for multi-walker MD runs",
    after_help = "Examples:\n  mdprep npt 300 320 2 -s template -o npt\n  mdprep pre-elastic -t template -s npt -o preelastic --percent 0.8\n  mdprep elastic -t template -s preelastic --frac 0.2\n  mdprep --config mdprep.json --fail-fast npt 300 302 1",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// JSON settings file (schema_version 1)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Engine executable, a path or a name on PATH [default: gmx]
    #[arg(long, global = true, value_name = "PATH")]
    pub gmx: Option<PathBuf>,

    /// Topology passed to every grompp call [default: forcefield/topol.top]
    #[arg(long, global = true, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Number of walkers per work item [default: 4]
    #[arg(long, global = true, value_name = "N")]
    pub walkers: Option<usize>,

    /// Task list file name written into each output directory [default: args.list]
    #[arg(long, global = true, value_name = "NAME")]
    pub task_file: Option<String>,

    /// Let the engine back up files it overwrites
    #[arg(long, global = true)]
    pub keep_backups: bool,

    /// Stop at the first failed engine call
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Temperature sweep of NPT runs from a template mdp
    Npt(NptArgs),
    /// NVT umbrella runs at the average box length of finished NPT runs
    PreElastic(PreElasticArgs),
    /// Splay, twist and bend basis-function runs from pre-elastic output
    Elastic(ElasticArgs),
}

#[derive(Args, Debug)]
pub struct NptArgs {
    /// Minimum temperature
    #[arg(value_name = "TMIN", allow_negative_numbers = true)]
    pub tmin: f64,

    /// Maximum temperature (exclusive)
    #[arg(value_name = "TMAX", allow_negative_numbers = true)]
    pub tmax: f64,

    /// Temperature increment
    #[arg(value_name = "DT", allow_negative_numbers = true)]
    pub dt: f64,

    /// Source directory holding the template mdp and gro
    #[arg(short, long, value_name = "DIR", default_value = "template")]
    pub source: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "npt")]
    pub output: PathBuf,

    /// Prefix of generated work items
    #[arg(short, long, default_value = "npt")]
    pub prefix: String,
}

#[derive(Args, Debug)]
pub struct PreElasticArgs {
    /// Template directory holding the JSON template
    #[arg(short, long, value_name = "DIR", default_value = "template")]
    pub template: PathBuf,

    /// Directory of finished NPT runs (.dat, .mdp, .gro, .tpr)
    #[arg(short, long, value_name = "DIR", default_value = "npt")]
    pub source: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "preelastic")]
    pub output: PathBuf,

    /// Processors per walker
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub nproc: u32,

    /// Trailing fraction of samples averaged for the box length
    #[arg(long, value_name = "FRACTION", default_value_t = 0.8)]
    pub percent: f64,

    /// MD steps per walker
    #[arg(long, value_name = "STEPS", default_value_t = 100_000_000)]
    pub runtime: u64,
}

#[derive(Args, Debug)]
pub struct ElasticArgs {
    /// Template directory holding the JSON template
    #[arg(short, long, value_name = "DIR", default_value = "template")]
    pub template: PathBuf,

    /// Directory of pre-elastic output (task list, .mdp, .gro files)
    #[arg(short, long, value_name = "DIR", default_value = "preelastic")]
    pub source: PathBuf,

    /// Directory receiving one sub-directory per elastic mode
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Processors per walker
    #[arg(long, value_name = "N", default_value_t = 6)]
    pub nproc: u32,

    /// MD steps per walker
    #[arg(long, value_name = "STEPS", default_value_t = 700_000_000)]
    pub runtime: u64,

    /// Fraction of the box length used for the restriction regions
    #[arg(long, value_name = "FRACTION", default_value_t = 0.2)]
    pub frac: f64,
}
