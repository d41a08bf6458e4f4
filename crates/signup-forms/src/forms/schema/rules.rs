use serde_json::Value;
use validator::ValidateEmail;

/// Constraint on a text field. Checked in declaration order; the first failure
/// produces the field's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRule {
    /// Absent or whitespace-only values fail.
    Required { message: String },
    MinLength { min: usize, message: String },
    Email { message: String },
    /// Case-insensitive `@domain` suffix.
    DomainSuffix { domain: String, message: String },
}

impl TextRule {
    pub fn required(message: &str) -> Self {
        Self::Required {
            message: message.to_string(),
        }
    }

    pub fn min_length(min: usize, message: &str) -> Self {
        Self::MinLength {
            min,
            message: message.to_string(),
        }
    }

    pub fn email(message: &str) -> Self {
        Self::Email {
            message: message.to_string(),
        }
    }

    pub fn domain_suffix(domain: &str, message: String) -> Self {
        Self::DomainSuffix {
            domain: domain.trim_start_matches('@').to_ascii_lowercase(),
            message,
        }
    }

    /// `None` when the value passes.
    pub fn check<'a>(&'a self, value: Option<&str>) -> Option<&'a str> {
        let failed = match self {
            TextRule::Required { .. } => value.map_or(true, |v| v.trim().is_empty()),
            TextRule::MinLength { min, .. } => value.map_or(true, |v| v.chars().count() < *min),
            TextRule::Email { .. } => value.map_or(true, |v| !is_plain_email(v)),
            TextRule::DomainSuffix { domain, .. } => value.map_or(true, |v| {
                !v.to_ascii_lowercase().ends_with(&format!("@{domain}"))
            }),
        };
        failed.then(|| self.message())
    }

    pub fn message(&self) -> &str {
        match self {
            TextRule::Required { message }
            | TextRule::MinLength { message, .. }
            | TextRule::Email { message }
            | TextRule::DomainSuffix { message, .. } => message,
        }
    }
}

/// `validator`'s syntax check, narrowed to addresses a mail form accepts:
/// no dot at either end of the local part, no `..`, and a dotted domain
/// ending in an alphabetic TLD of two or more letters (so no bare hosts or
/// IP literals).
fn is_plain_email(value: &str) -> bool {
    if !value.to_string().validate_email() {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((_, tld)) => tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

/// Applied after every rule of the field has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransform {
    Trim,
    Lowercase,
    CapitalizeWords,
}

impl TextTransform {
    pub fn apply(self, value: String) -> String {
        match self {
            TextTransform::Trim => value.trim().to_string(),
            TextTransform::Lowercase => value.to_lowercase(),
            TextTransform::CapitalizeWords => capitalize_words(&value),
        }
    }
}

/// Upper-cases the first character of each whitespace-separated word and
/// joins the words with single spaces. Blank input yields an empty string.
pub fn capitalize_words(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why a knowledge value was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeFailure {
    NotANumber,
    OutOfRange,
}

/// Numeric coercion plus inclusive range for the knowledge column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeRange {
    pub min: u8,
    pub max: u8,
}

impl KnowledgeRange {
    pub fn coerce(&self, value: Option<&Value>) -> Result<u8, KnowledgeFailure> {
        let number = match value {
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::String(raw)) if !raw.trim().is_empty() => raw.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .ok_or(KnowledgeFailure::NotANumber)?;

        if number.fract() != 0.0 {
            return Err(KnowledgeFailure::NotANumber);
        }
        if number < f64::from(self.min) || number > f64::from(self.max) {
            return Err(KnowledgeFailure::OutOfRange);
        }
        Ok(number as u8)
    }
}
