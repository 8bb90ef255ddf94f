use anyhow::Result;
use clap::Parser;
use loan_checklist::cli::commands::{Cli, Commands};
use loan_checklist::cli::handlers::{
    handle_config_command, handle_generate_command, handle_template_command,
};
use loan_checklist::cli::utils::{init_logging, print_info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so env-backed flags see it
    let env_file_loaded = dotenv::dotenv().is_ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format)?;

    // Execute command
    match cli.command {
        Commands::Generate {
            applicant,
            template,
            output_dir,
            no_save,
        } => handle_generate_command(&cli.provider, applicant, template, output_dir, no_save).await,

        Commands::Config => handle_config_command(&cli.provider, env_file_loaded),

        Commands::Template { template, show } => handle_template_command(template, show),

        Commands::Info => {
            print_info();
            Ok(())
        }
    }
}
