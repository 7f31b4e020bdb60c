use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use invoice_core::models::ExportFormat;

#[derive(Parser)]
#[command(name = "invoice")]
#[command(about = "Upload invoices and browse their exports from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Invoice service base URL (overrides INVOICE_API_URL and the profile)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, sign up or manage the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Upload an invoice for processing
    Upload {
        /// Invoice file; when several are given only the first is uploaded
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Export format to produce
        #[arg(short, long, value_enum, default_value_t = ExportFormatArg::Csv)]
        format: ExportFormatArg,
    },
    /// Show processed invoices and their exports
    #[command(alias = "list")]
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single invoice
    Show {
        /// Invoice ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an invoice
    Delete {
        /// Invoice ID
        id: String,
    },
    /// Check that the invoice service is reachable
    Health,
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormatArg {
    Csv,
    Xlsx,
    Pdf,
    Gsheets,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Csv => Self::Csv,
            ExportFormatArg::Xlsx => Self::Xlsx,
            ExportFormatArg::Pdf => Self::Pdf,
            ExportFormatArg::Gsheets => Self::Gsheets,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// Invoice service base URL to store in the profile
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        request_timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with a username or email and store the session in the keychain
    Login {
        /// Username or email address
        #[arg(long, value_name = "USERNAME_OR_EMAIL")]
        identifier: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long, value_name = "USERNAME")]
        username: String,
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show whether the profile is signed in
    Status,
    /// Clear the stored session
    Logout,
}
