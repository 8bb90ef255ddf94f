use super::applicant::ApplicantInput;
use super::template::{build_prompt, TemplateError};
use crate::llm::config::{ConfigError, ProviderConfig};
use crate::llm::prompts::SYSTEM_PROMPT;
use crate::llm::service::{ChatBackend, LlmService, UpstreamError};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Suffix of the saved checklist file
pub const CHECKLIST_FILE_SUFFIX: &str = "_LoanChecklist.txt";

#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Invalid applicant input: {0}")]
    InvalidInput(String),

    #[error("Failed to save checklist to {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Generated checklist text plus what produced it
#[derive(Debug, Clone)]
pub struct ChecklistResult {
    pub client_name: String,

    /// Text exactly as returned by the provider
    pub text: String,

    pub generated_by: String,

    pub generated_at: DateTime<Utc>,
}

impl ChecklistResult {
    pub fn file_name(&self) -> String {
        checklist_file_name(&self.client_name)
    }

    /// Write the checklist into `dir`, returning the file path
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ChecklistError> {
        let path = dir.join(self.file_name());
        let save_error = |source| ChecklistError::Save {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(dir).map_err(save_error)?;
        fs::write(&path, &self.text).map_err(save_error)?;

        info!("Checklist saved to {}", path.display());
        Ok(path)
    }
}

/// `{client_name}_LoanChecklist.txt`, with characters that are not allowed
/// in file names replaced by `_`
pub fn checklist_file_name(client_name: &str) -> String {
    let mut stem: String = client_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        stem = "client".to_string();
    }

    format!("{}{}", stem, CHECKLIST_FILE_SUFFIX)
}

/// Turns applicant records into checklists through a chat backend
pub struct ChecklistGenerator<B: ChatBackend> {
    backend: B,
    template: String,
}

impl<B: ChatBackend> ChecklistGenerator<B> {
    pub fn new(backend: B, template: impl Into<String>) -> Self {
        Self {
            backend,
            template: template.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validate the applicant and fill the template
    pub fn prepare_prompt(&self, applicant: &ApplicantInput) -> Result<String, ChecklistError> {
        applicant.validate().map_err(ChecklistError::InvalidInput)?;
        let prompt = build_prompt(&self.template, &applicant.fields())?;
        debug!("Built checklist prompt ({} chars)", prompt.len());
        Ok(prompt)
    }

    pub async fn generate(
        &self,
        applicant: &ApplicantInput,
    ) -> Result<ChecklistResult, ChecklistError> {
        let prompt = self.prepare_prompt(applicant)?;

        info!(
            "Generating checklist for {} via {}",
            applicant.client_name.trim(),
            self.backend.describe()
        );
        let text = self.backend.complete(SYSTEM_PROMPT, &prompt).await?;

        Ok(ChecklistResult {
            client_name: applicant.client_name.trim().to_string(),
            text,
            generated_by: self.backend.describe(),
            generated_at: Utc::now(),
        })
    }
}

/// One-shot request with a resolved configuration
pub async fn dispatch(
    config: &ProviderConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, ChecklistError> {
    let service = LlmService::new(config.clone())?;
    Ok(service.dispatch(system_prompt, user_prompt).await?)
}
