//! Clap derive structures for the `erpdesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// erpdesk -- list, filter, edit and export ERP records
#[derive(Debug, Parser)]
#[command(
    name = "erpdesk",
    version,
    about = "Work with ERP desk records from the command line",
    long_about = "Browse, search, filter, edit and export the records behind the ERP desk.\n\n\
        Every list resource pages 25 records at a time. Run `erpdesk resources`\n\
        to see which lists exist and how their search works.",
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
    #[arg(long, short = 'p', env = "ERPDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend API root (overrides profile)
    #[arg(long, short = 'u', env = "ERPDESK_URL", global = true)]
    pub url: Option<String>,

    /// API token
    #[arg(long, env = "ERPDESK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ERPDESK_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ERPDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ERPDESK_TIMEOUT", global = true)]
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the resources this tool knows about
    #[command(alias = "res")]
    Resources,

    /// Show one page of a resource
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a single record
    Show(ShowArgs),

    /// Create a record through the resource's form
    Create(CreateArgs),

    /// Update a record through the resource's form
    Update(UpdateArgs),

    /// View or edit one tab of a company
    Company(CompanyArgs),

    /// Move every customer from one user to another
    Assign(AssignArgs),

    /// Export every matching record to CSV
    Export(ExportArgs),

    /// Look up state and district for a pincode
    Postal(PostalArgs),

    /// Lead funnel, customer, dispatch and forecast summary
    #[command(alias = "dash")]
    Dashboard(DashboardArgs),

    /// Raise a proforma invoice against a lead
    Invoice(InvoiceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Query Arguments ──────────────────────────────────────────────────

/// Search and filter flags shared by `list` and `export`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Search text. On lists that search locally this only narrows the
    /// loaded page
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter as name=value (repeatable)
    #[arg(long, short = 'f', value_name = "NAME=VALUE")]
    pub filter: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Resource key, e.g. applicants
    pub resource: String,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Resource key
    pub resource: String,

    /// Record id
    pub id: String,
}

/// Field values for `create` and `update`.
#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Field as key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Read field values from a JSON object file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Resource key
    pub resource: String,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Resource key
    pub resource: String,

    /// Record id
    pub id: String,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Debug, Args)]
pub struct CompanyArgs {
    /// Company id
    pub id: String,

    /// Tab to view or edit
    #[arg(long, short = 't', default_value = "company")]
    pub tab: TabArg,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TabArg {
    Company,
    Bank,
    Contact,
    Warehouse,
    SecurityCheque,
    Forecast,
    Kyc,
}

#[derive(Debug, Args)]
pub struct AssignArgs {
    /// User whose customers are moved
    #[arg(long)]
    pub from: String,

    /// User receiving the customers
    #[arg(long)]
    pub to: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Resource key
    pub resource: String,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Destination file (defaults to the resource's export name)
    #[arg(long = "out", short = 'O')]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PostalArgs {
    /// Six-digit pincode
    pub pincode: String,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Forecast for this assigned user (staff only)
    #[arg(long)]
    pub assign_to: Option<String>,
}

#[derive(Debug, Args)]
pub struct InvoiceArgs {
    /// Lead id
    #[arg(long)]
    pub lead: String,

    /// Seller account (unit name or id)
    #[arg(long)]
    pub seller: String,

    /// Product line as product:quantity:rate (repeatable)
    #[arg(long = "product", value_name = "PRODUCT:QTY:RATE", required = true)]
    pub products: Vec<String>,

    #[arg(long)]
    pub place_of_supply: Option<String>,

    #[arg(long)]
    pub transporter: Option<String>,

    /// Buyer order number; without it the order is recorded as verbal
    #[arg(long)]
    pub buyer_order_no: Option<String>,

    /// Buyer order date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub buyer_order_date: Option<String>,

    #[arg(long)]
    pub payment_terms: Option<String>,

    #[arg(long)]
    pub delivery_terms: Option<String>,

    /// Raise for price approval instead of as approved
    #[arg(long)]
    pub price_approval: bool,

    /// Print the payload without submitting it
    #[arg(long)]
    pub dry_run: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (base_url, token_env, postal_url, ca_cert, insecure, timeout)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
