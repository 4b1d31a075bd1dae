//! Clap derive structures for the `vigil` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use vigil_core::DEFAULT_TOP_K;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vigil -- command-line client for a behavior-monitoring backend
#[derive(Debug, Parser)]
#[command(
    name = "vigil",
    version,
    about = "Query and watch a camera behavior-monitoring backend",
    long_about = "Fetch alerts and behavior statistics, ask the search backend,\n\
        or watch the live video and alert channels from the terminal.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "VIGIL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Monitoring backend URL (overrides profile)
    #[arg(long, short = 's', env = "VIGIL_SERVER", global = true)]
    pub server: Option<String>,

    /// Search backend URL (overrides profile)
    #[arg(long, env = "VIGIL_SEARCH", global = true)]
    pub search: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VIGIL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VIGIL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VIGIL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the stored alert history
    #[command(alias = "a")]
    Alerts(AlertsArgs),

    /// Show the behavior analysis report
    #[command(alias = "b")]
    Behaviors,

    /// Ask the search backend a question
    Ask(AskArgs),

    /// Stream classified behaviors and alerts from the live channels
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AlertsArgs {
    /// Show at most this many alerts
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Number of passages the search backend retrieves
    #[arg(long, short = 't', default_value_t = DEFAULT_TOP_K)]
    pub top_k: u32,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many behavior and alert events
    #[arg(long, short = 'c')]
    pub count: Option<u64>,

    /// Skip loading the stored alert history on connect
    #[arg(long)]
    pub no_history: bool,

    /// Ring the terminal bell on each live alert (table output only)
    #[arg(long)]
    pub bell: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
