use crate::checklist::applicant::{EmploymentType, LoanPurpose, PassportType, Residence, YesNo};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "loan-checklist",
    about = "Generate loan document checklists for mortgage applicants using an LLM",
    version,
    author
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Explicit provider settings; these take precedence over environment and secrets
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Secrets file (TOML). Defaults to ./secrets.toml when present
    #[arg(long, global = true, env = "LOAN_CHECKLIST_SECRETS")]
    pub secrets: Option<PathBuf>,

    /// LLM provider: openai or deepseek
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// API key for the selected provider
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Custom API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Sampling temperature (only sent to providers that accept it)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds (default: 120)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a loan document checklist for one applicant
    Generate {
        #[command(flatten)]
        applicant: ApplicantArgs,

        /// Prompt template file (default: bundled template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Directory the checklist file is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Print the checklist without saving it
        #[arg(long)]
        no_save: bool,
    },

    /// Display the resolved provider configuration
    Config,

    /// Inspect the placeholders of a prompt template
    Template {
        /// Prompt template file (default: bundled template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Print the full template text
        #[arg(long)]
        show: bool,
    },

    /// Show information about this tool
    Info,
}

/// Applicant form fields
#[derive(Args, Debug, Clone, Default)]
pub struct ApplicantArgs {
    /// YAML file with applicant fields; flags override its values
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Client name
    #[arg(long)]
    pub client_name: Option<String>,

    /// Loan purpose
    #[arg(long, value_enum, ignore_case = true)]
    pub loan_purpose: Option<LoanPurpose>,

    /// Employment type
    #[arg(long, value_enum, ignore_case = true)]
    pub employment_type: Option<EmploymentType>,

    /// Passport type
    #[arg(long, value_enum, ignore_case = true)]
    pub passport_type: Option<PassportType>,

    /// Has rental properties?
    #[arg(long, value_enum, ignore_case = true)]
    pub rental_property: Option<YesNo>,

    /// Has trust-held assets?
    #[arg(long, value_enum, ignore_case = true)]
    pub trust_assets: Option<YesNo>,

    /// Current country of residence
    #[arg(long, value_enum, ignore_case = true)]
    pub country: Option<Residence>,

    /// Additional notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
