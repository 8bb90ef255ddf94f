use crate::checklist::ChecklistResult;
use crate::cli::commands::{LogFormat, ProviderArgs};
use crate::llm::config::{ConfigError, ConfigOverrides, ConfigResolver, ProviderConfig};
use crate::llm::secrets::{SecretsStore, DEFAULT_SECRETS_FILE};
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SEPARATOR_WIDTH: usize = 60;

pub fn init_logging(verbose: bool, log_format: LogFormat) -> Result<()> {
    let env_filter = if verbose {
        EnvFilter::new("loan_checklist=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so stdout carries only the checklist
    let fmt_layer = match log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))
}

pub fn print_info() {
    println!("Loan Checklist v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("Authors: {}", env!("CARGO_PKG_AUTHORS"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
}

impl ProviderArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout,
        }
    }

    /// Secrets from `--secrets`, or the default file when it exists
    pub fn secrets_store(&self) -> Result<SecretsStore, ConfigError> {
        match &self.secrets {
            Some(path) => SecretsStore::load(path),
            None => SecretsStore::load_optional(Path::new(DEFAULT_SECRETS_FILE)),
        }
    }
}

/// Resolve the provider configuration once for this process
pub fn resolve_config(args: &ProviderArgs) -> Result<ProviderConfig> {
    let secrets = args.secrets_store()?;
    let config = ConfigResolver::new(args.overrides(), secrets).resolve()?;
    Ok(config)
}

pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_checklist(result: &ChecklistResult) {
    println!("\n{}", "═".repeat(SEPARATOR_WIDTH).bright_blue());
    println!("{}", "✅ Checklist Output".bold().green());
    println!(
        "{}",
        format!(
            "Client: {} • {} • {}",
            result.client_name,
            result.generated_by,
            result.generated_at.format("%Y-%m-%d %H:%M UTC")
        )
        .dimmed()
    );
    println!("{}\n", "═".repeat(SEPARATOR_WIDTH).bright_blue());
    println!("{}", result.text);
    println!("\n{}", "─".repeat(SEPARATOR_WIDTH).bright_blue());
}
