use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three incremental shapes of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
    /// Email and password only.
    Credentials,
    /// Adds a capitalized name and restricts the email domain.
    Profile,
    /// Adds an avatar upload and the techs list.
    Portfolio,
}

impl FormVariant {
    pub const fn label(self) -> &'static str {
        match self {
            FormVariant::Credentials => "credentials",
            FormVariant::Profile => "profile",
            FormVariant::Portfolio => "portfolio",
        }
    }

    pub const fn has_name(self) -> bool {
        matches!(self, FormVariant::Profile | FormVariant::Portfolio)
    }

    pub const fn has_portfolio(self) -> bool {
        matches!(self, FormVariant::Portfolio)
    }
}

impl fmt::Display for FormVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form variant '{0}' (expected credentials, profile or portfolio)")]
pub struct UnknownVariant(pub String);

impl FromStr for FormVariant {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "credentials" | "1" => Ok(Self::Credentials),
            "profile" | "2" => Ok(Self::Profile),
            "portfolio" | "3" => Ok(Self::Portfolio),
            _ => Err(UnknownVariant(raw.to_string())),
        }
    }
}

/// One entry of a file-picker selection.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Untyped tech row exactly as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTech {
    #[serde(default)]
    pub title: Option<String>,
    /// Number or numeric string; coerced during validation.
    #[serde(default)]
    pub knowledge: Option<Value>,
}

/// Untrusted input record handed to the schema.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub techs: Vec<RawTech>,
    #[serde(skip)]
    pub avatar: Vec<SelectedFile>,
}

/// Resolved avatar; serialized as metadata only.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AvatarFile {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for AvatarFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tech {
    pub title: String,
    pub knowledge: u8,
}

/// A fully validated and transformed form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub techs: Option<Vec<Tech>>,
}
