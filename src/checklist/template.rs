use crate::llm::prompts::BUNDLED_CHECKLIST_TEMPLATE;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Prompt template not found: {0}")]
    Missing(String),

    #[error("Failed to read prompt template {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Missing prompt placeholder: {0}")]
    MissingPlaceholder(String),

    #[error("Malformed prompt placeholder '{0}': use {{name}} or {{{{ }}}} for literal braces")]
    MalformedPlaceholder(String),
}

/// Where the checklist prompt template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateStore {
    /// Template compiled into the binary
    Bundled,
    /// Template read from disk on every load
    File(PathBuf),
}

impl TemplateStore {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map(TemplateStore::File).unwrap_or(TemplateStore::Bundled)
    }

    pub fn load(&self) -> Result<String, TemplateError> {
        match self {
            TemplateStore::Bundled => Ok(BUNDLED_CHECKLIST_TEMPLATE.to_string()),
            TemplateStore::File(path) => {
                debug!("Loading prompt template from {}", path.display());
                fs::read_to_string(path).map_err(|e| {
                    if e.kind() == ErrorKind::NotFound {
                        TemplateError::Missing(path.display().to_string())
                    } else {
                        TemplateError::Unreadable {
                            path: path.display().to_string(),
                            message: e.to_string(),
                        }
                    }
                })
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TemplateStore::Bundled => "bundled template".to_string(),
            TemplateStore::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Split a template into literal text and `{name}` placeholders.
/// `{{` and `}}` are literal braces; any other brace must be part of a
/// well-formed `{name}` placeholder.
fn segments(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        let (text, tail) = rest.split_at(pos);
        if !text.is_empty() {
            out.push(Segment::Text(text));
        }

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push(Segment::Text(&tail[..1]));
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('}') {
            return Err(TemplateError::MalformedPlaceholder("}".to_string()));
        }

        let end = tail[1..].find(|c: char| c == '{' || c == '}');
        match end {
            Some(end) if tail[1 + end..].starts_with('}') => {
                let name = &tail[1..end + 1];
                if !is_placeholder_name(name) {
                    return Err(TemplateError::MalformedPlaceholder(
                        tail[..end + 2].to_string(),
                    ));
                }
                out.push(Segment::Placeholder(name));
                rest = &tail[end + 2..];
            }
            Some(end) => {
                return Err(TemplateError::MalformedPlaceholder(
                    tail[..end + 1].to_string(),
                ));
            }
            None => return Err(TemplateError::MalformedPlaceholder(tail.to_string())),
        }
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }

    Ok(out)
}

/// Substitute `{name}` placeholders with field values.
///
/// Every placeholder must have a field; values are inserted literally and
/// are never scanned for further placeholders.
pub fn build_prompt(
    template: &str,
    fields: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut prompt = String::with_capacity(template.len());

    for segment in segments(template)? {
        match segment {
            Segment::Text(text) => prompt.push_str(text),
            Segment::Placeholder(name) => {
                let value = fields
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingPlaceholder(name.to_string()))?;
                prompt.push_str(value);
            }
        }
    }

    Ok(prompt)
}

/// Distinct placeholder names in order of first appearance
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names: Vec<String> = Vec::new();
    for segment in segments(template)? {
        if let Segment::Placeholder(name) = segment {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
