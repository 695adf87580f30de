use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The treefold developers",
    version,
    about = "treefold - Monte Carlo backbone sampling over secondary-structure fold trees.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of threads used when running several trajectories.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run Monte Carlo sampling on a structure with a secondary-structure fold tree.
    Sample(SampleArgs),
    /// Print the secondary-structure spans and the fold tree built from them.
    FoldTree(FoldTreeArgs),
}

/// Arguments for the `sample` subcommand.
#[derive(Args, Debug, Default)]
pub struct SampleArgs {
    /// Path to the input structure (PDB).
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Path for the final structure. With several trajectories, the
    /// trajectory number is appended to the file stem.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of Monte Carlo trials.
    #[arg(short = 'n', long, value_name = "INT")]
    pub iterations: Option<usize>,

    /// Metropolis temperature kT.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Seed for the random stream. Omit for a non-reproducible run.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Secondary-structure string (H, E, L or blank per residue). Assigned
    /// from the input torsions when omitted.
    #[arg(long, value_name = "STRING")]
    pub ss: Option<String>,

    /// Number of independent trajectories.
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub trajectories: usize,

    /// Standard deviation of the phi/psi perturbation, in degrees.
    #[arg(long, value_name = "DEG")]
    pub step_size: Option<f64>,

    /// Minimizer algorithm (lbfgs_armijo_atol, lbfgs_armijo, steepest_descent).
    #[arg(long, value_name = "NAME")]
    pub minimizer: Option<String>,

    /// Minimizer convergence tolerance.
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Refuse secondary structure that leaves trailing residues uncovered
    /// instead of extending the last segment.
    #[arg(long)]
    pub no_extend: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S sampling.temperature=0.8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `fold-tree` subcommand.
#[derive(Args, Debug)]
pub struct FoldTreeArgs {
    #[command(flatten)]
    pub source: FoldTreeSource,

    /// Refuse trailing residues not covered by a span.
    #[arg(long)]
    pub no_extend: bool,
}

/// Where the secondary structure comes from; exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct FoldTreeSource {
    /// Secondary-structure string to segment.
    #[arg(long, value_name = "STRING")]
    pub ss: Option<String>,

    /// Structure whose secondary structure is assigned from its torsions.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sample_arguments_parse() {
        let cli = Cli::parse_from([
            "treefold",
            "-vv",
            "sample",
            "--input",
            "in.pdb",
            "-n",
            "50",
            "--temperature",
            "0.5",
            "--ss",
            "  HHHH  ",
            "-S",
            "sampling.seed=3",
            "-S",
            "repack.max-passes=1",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.input, Some(PathBuf::from("in.pdb")));
        assert_eq!(args.iterations, Some(50));
        assert_eq!(args.temperature, Some(0.5));
        assert_eq!(args.ss.as_deref(), Some("  HHHH  "));
        assert_eq!(args.trajectories, 1);
        assert_eq!(args.set_values.len(), 2);
    }

    #[test]
    fn sample_input_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["treefold", "sample"]).unwrap();
        let Commands::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert!(args.input.is_none());
    }

    #[test]
    fn fold_tree_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["treefold", "fold-tree"]).is_err());
        assert!(
            Cli::try_parse_from(["treefold", "fold-tree", "--ss", "HH", "--input", "a.pdb"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["treefold", "fold-tree", "--ss", " HHH EEE ", "--no-extend"])
                .is_ok()
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["treefold", "-q", "-v", "fold-tree", "--ss", "H"]).is_err());
    }
}
