use crate::cli::commands::ProviderArgs;
use crate::llm::config::{known_env_vars, ConfigResolver, Provider};
use crate::llm::secrets::DEFAULT_SECRETS_FILE;
use anyhow::Result;
use std::env;

pub fn handle_config_command(args: &ProviderArgs, env_file_loaded: bool) -> Result<()> {
    println!("🔧 Loan Checklist Configuration");
    println!("═══════════════════════════════════════");
    println!();

    println!("🌍 Environment:");
    if env_file_loaded {
        println!("  • .env file: ✅ Loaded");
    } else {
        println!("  • .env file: ⚠️  Not found (using system environment)");
    }

    let secret_vars: Vec<&str> = Provider::ALL
        .iter()
        .map(|p| p.profile().api_key_var)
        .collect();
    for var in known_env_vars() {
        match env::var(var) {
            Ok(_) if secret_vars.contains(&var) => {
                println!("  • {}: ✅ Set (hidden)", var)
            }
            Ok(val) => println!("  • {}: {}", var, val),
            Err(_) => println!("  • {}: not set", var),
        }
    }
    println!();

    println!("🔐 Secrets:");
    let secrets = match args.secrets_store() {
        Ok(store) => {
            match store.path() {
                Some(path) => println!("  • Secrets file: ✅ {}", path.display()),
                None => println!(
                    "  • Secrets file: ⚠️  None ({} not found)",
                    DEFAULT_SECRETS_FILE
                ),
            }
            store
        }
        Err(e) => {
            println!("  • Secrets file: ❌ {}", e);
            return Err(e.into());
        }
    };
    println!();

    println!("🤖 Resolved Provider:");
    match ConfigResolver::new(args.overrides(), secrets).resolve() {
        Ok(config) => {
            println!("  • Provider: {} ({})", config.provider, config.provider.id());
            println!("  • Model: {}", config.model);
            println!("  • API base: {}", config.api_base());
            println!("  • API key: {}", config.masked_api_key());
            match config.request_temperature() {
                Some(t) => println!("  • Temperature: {} (sent)", t),
                None => println!(
                    "  • Temperature: {} (not sent, unsupported by {})",
                    config.temperature, config.provider
                ),
            }
            println!("  • Timeout: {} seconds", config.timeout_secs);
        }
        Err(e) => {
            println!("  • ❌ {}", e);
            println!();
            println!("💡 Tips:");
            println!("  • Set OPENAI_API_KEY or DEEPSEEK_API_KEY, or add api_key to secrets.toml");
            println!("  • Select the provider with LLM_PROVIDER or --provider");
        }
    }

    Ok(())
}
