//! CLI argument parsing for the pattern builder.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "cpat",
    version,
    about = "Build CPE match-feed regex patterns from package descriptions",
    after_help = "Examples:\n  cpat pattern '[{\"name\":\"busybox\",\"versions\":[{\"version\":\"1.31.0\"}]}]'\n  cpat pattern --atom busybox-1.31.0 --atom openssh-8.4_p1-r3\n  echo '{\"name\":\"libxml2\",\"version\":\"2.9.10\"}' | cpat query --feed nvdcpematch-1.0.json\n  cpat config --stub",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to the per-user config when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Pattern(PatternArgs),
    Query(QueryArgs),
    Normalize(NormalizeArgs),
    Config(ConfigArgs),
}

/// Where the package descriptions come from.
#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// JSON list of packages or a single package (reads stdin when omitted)
    #[arg(value_name = "PAYLOAD", conflicts_with = "atoms")]
    pub payload: Option<String>,

    /// Package atom such as busybox-1.31.0 (repeatable)
    #[arg(long = "atom", value_name = "ATOM")]
    pub atoms: Vec<String>,

    /// Treat input as canonical records that already carry quasi_cpe values
    #[arg(long)]
    pub canonical: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the regex alternation for the given packages")]
pub struct PatternArgs {
    #[command(flatten)]
    pub input: PayloadArgs,
}

#[derive(Parser, Debug)]
#[command(about = "List CPEs from a CPE match feed that match the given packages")]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: PayloadArgs,

    /// Uncompressed CPE match feed, or a directory holding nvdcpematch-1.0.json
    /// (defaults to feed_path from the config)
    #[arg(long, value_name = "PATH")]
    pub feed: Option<PathBuf>,

    /// Emit matches as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print canonical package records with their quasi-CPEs")]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: PayloadArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Show the effective configuration")]
pub struct ConfigArgs {
    /// Print the default config instead of the effective one
    #[arg(long)]
    pub stub: bool,
}
