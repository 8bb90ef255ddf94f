pub mod applicant;
pub mod generator;
pub mod template;

pub use applicant::ApplicantInput;
pub use generator::{ChecklistError, ChecklistGenerator, ChecklistResult};
pub use template::{build_prompt, placeholders, TemplateError, TemplateStore};
