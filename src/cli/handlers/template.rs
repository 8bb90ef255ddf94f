use crate::checklist::applicant::FIELD_NAMES;
use crate::checklist::{placeholders, TemplateStore};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub fn handle_template_command(template: Option<PathBuf>, show: bool) -> Result<()> {
    let store = TemplateStore::from_path(template);
    let text = store.load()?;
    let names = placeholders(&text)?;

    println!("\n📄 Prompt Template: {}\n", store.describe());
    println!("{}", "─".repeat(60));

    let mut unknown = Vec::new();
    println!("Placeholders:");
    for name in &names {
        if FIELD_NAMES.contains(&name.as_str()) {
            println!("  ✅ {{{}}}", name);
        } else {
            println!("  ❌ {{{}}} (no applicant field)", name);
            unknown.push(name.as_str());
        }
    }

    let unused: Vec<&str> = FIELD_NAMES
        .iter()
        .copied()
        .filter(|field| !names.iter().any(|n| n.as_str() == *field))
        .collect();
    if !unused.is_empty() {
        println!("\nApplicant fields not used by the template:");
        for field in &unused {
            println!("  ⚠️  {}", field);
        }
    }

    if show {
        println!("\nTemplate:");
        println!("{}", "─".repeat(40));
        println!("{}", text);
    }

    if !unknown.is_empty() {
        bail!(
            "Template has placeholders without an applicant field: {}",
            unknown.join(", ")
        );
    }

    Ok(())
}
