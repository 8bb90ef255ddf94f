/// Fixed system message for every checklist request
pub const SYSTEM_PROMPT: &str = "You are an expert mortgage broker assistant.";

/// Checklist prompt template shipped with the binary.
/// Uses every applicant field as a `{placeholder}`.
pub const BUNDLED_CHECKLIST_TEMPLATE: &str =
    include_str!("../../prompts/loan_checklist_prompt.md");
