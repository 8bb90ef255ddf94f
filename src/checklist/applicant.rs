use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Placeholder names an applicant provides, in form order
pub const FIELD_NAMES: [&str; 8] = [
    "client_name",
    "loan_purpose",
    "employment_type",
    "passport_type",
    "rental_property",
    "trust_assets",
    "country",
    "notes",
];

/// Defines a closed set of form choices with human-facing labels.
///
/// Values parse from either the label ("Self-Employed", "Low Doc") or the
/// command-line name ("self-employed", "low-doc"), ignoring case.
macro_rules! form_choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                parse_choice(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.label().to_string()
            }
        }
    };
}

form_choice!(
    /// Why the client is borrowing
    LoanPurpose {
        Purchase => "Purchase",
        Refinance => "Refinance",
        Construction => "Construction",
        Others => "Others",
    }
);

form_choice!(
    EmploymentType {
        Payg => "PAYG",
        SelfEmployed => "Self-Employed",
        LowDoc => "Low Doc",
    }
);

form_choice!(
    PassportType {
        Australian => "Australian",
        NonAustralian => "Non-Australian",
    }
);

form_choice!(
    /// Current country of residence
    Residence {
        Australia => "Australia",
        OtherCountry => "Other Country",
    }
);

form_choice!(
    YesNo {
        Yes => "Yes",
        No => "No",
    }
);

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase().replace([' ', '_'], "-")
}

fn parse_choice<T: ValueEnum + fmt::Display>(value: &str) -> Result<T, String> {
    let wanted = normalize(value);
    T::value_variants()
        .iter()
        .find(|variant| normalize(&variant.to_string()) == wanted)
        .cloned()
        .ok_or_else(|| {
            let allowed: Vec<String> = T::value_variants().iter().map(|v| v.to_string()).collect();
            format!("unknown value '{}', expected one of: {}", value, allowed.join(", "))
        })
}

/// The attributes a broker enters for one loan applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantInput {
    pub client_name: String,

    pub loan_purpose: LoanPurpose,

    pub employment_type: EmploymentType,

    pub passport_type: PassportType,

    pub rental_property: YesNo,

    #[serde(default)]
    pub trust_assets: Option<YesNo>,

    #[serde(default)]
    pub country: Option<Residence>,

    /// Free-text broker notes
    #[serde(default)]
    pub notes: String,
}

impl ApplicantInput {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse applicant YAML")
    }

    /// Load an applicant record from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate the record before it is turned into a prompt
    pub fn validate(&self) -> Result<(), String> {
        if self.client_name.trim().is_empty() {
            return Err("Client name is required".to_string());
        }

        Ok(())
    }

    /// Placeholder values for the prompt template.
    /// Optional fields that were not answered map to an empty string.
    pub fn fields(&self) -> BTreeMap<String, String> {
        let optional = |value: Option<&'static str>| value.unwrap_or_default().to_string();

        let values = [
            self.client_name.trim().to_string(),
            self.loan_purpose.label().to_string(),
            self.employment_type.label().to_string(),
            self.passport_type.label().to_string(),
            self.rental_property.label().to_string(),
            optional(self.trust_assets.map(|v| v.label())),
            optional(self.country.map(|v| v.label())),
            self.notes.trim().to_string(),
        ];

        FIELD_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(values)
            .collect()
    }
}
