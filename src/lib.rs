//! Loan document checklist generation.
//!
//! Applicant attributes are substituted into a prompt template and sent to an
//! OpenAI-compatible chat-completion provider; the reply is the checklist.

pub mod checklist;
pub mod cli;
pub mod llm;

pub use checklist::{ApplicantInput, ChecklistError, ChecklistGenerator, ChecklistResult};
pub use llm::{ConfigResolver, LlmService, Provider, ProviderConfig};
