use crate::checklist::{ApplicantInput, ChecklistGenerator, TemplateStore};
use crate::cli::commands::{ApplicantArgs, ProviderArgs};
use crate::cli::utils::{create_spinner, print_checklist, resolve_config};
use crate::llm::LlmService;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;

pub async fn handle_generate_command(
    provider: &ProviderArgs,
    applicant: ApplicantArgs,
    template: Option<PathBuf>,
    output_dir: PathBuf,
    no_save: bool,
) -> Result<()> {
    let applicant = applicant_from_args(applicant)?;

    let config = resolve_config(provider)?;
    info!("Using {} model {}", config.provider, config.model);

    let store = TemplateStore::from_path(template);
    let template_text = store.load()?;
    info!("Loaded prompt template: {}", store.describe());

    let generator = ChecklistGenerator::new(LlmService::new(config)?, template_text);

    let spinner = create_spinner("Generating checklist...");
    let result = generator.generate(&applicant).await;
    spinner.finish_and_clear();
    let checklist = result?;

    print_checklist(&checklist);

    if no_save {
        return Ok(());
    }

    let path = checklist.save(&output_dir)?;
    println!("💾 Checklist saved to {}", path.display());

    Ok(())
}

/// Merge the `--input` file with individual flags; flags win
pub fn applicant_from_args(args: ApplicantArgs) -> Result<ApplicantInput> {
    let base = args
        .input
        .as_deref()
        .map(ApplicantInput::from_yaml_file)
        .transpose()?;

    let required = |flag: &str| {
        anyhow!(
            "--{} is required when no --input file provides it",
            flag
        )
    };

    let applicant = ApplicantInput {
        client_name: args
            .client_name
            .or_else(|| base.as_ref().map(|b| b.client_name.clone()))
            .ok_or_else(|| required("client-name"))?,
        loan_purpose: args
            .loan_purpose
            .or(base.as_ref().map(|b| b.loan_purpose))
            .ok_or_else(|| required("loan-purpose"))?,
        employment_type: args
            .employment_type
            .or(base.as_ref().map(|b| b.employment_type))
            .ok_or_else(|| required("employment-type"))?,
        passport_type: args
            .passport_type
            .or(base.as_ref().map(|b| b.passport_type))
            .ok_or_else(|| required("passport-type"))?,
        rental_property: args
            .rental_property
            .or(base.as_ref().map(|b| b.rental_property))
            .ok_or_else(|| required("rental-property"))?,
        trust_assets: args
            .trust_assets
            .or(base.as_ref().and_then(|b| b.trust_assets)),
        country: args.country.or(base.as_ref().and_then(|b| b.country)),
        notes: args
            .notes
            .or_else(|| base.as_ref().map(|b| b.notes.clone()))
            .unwrap_or_default(),
    };

    Ok(applicant)
}
