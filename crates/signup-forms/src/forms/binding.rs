use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{FormVariant, RawSubmission, RawTech, SelectedFile, Submission};
use super::schema::{SubmissionSchema, ValidationErrors};

/// Position-independent identity of a tech row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechRowId(pub u64);

impl fmt::Display for TechRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tech-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechRow {
    pub id: TechRowId,
    pub title: Option<String>,
    pub knowledge: Option<Value>,
}

/// Submission lifecycle of one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    Submitted,
}

/// Partial edit of the scalar fields; `None` leaves a value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TechUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub knowledge: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("the {variant} form has no '{field}' field")]
    FieldNotInVariant {
        variant: FormVariant,
        field: &'static str,
    },
    #[error("tech row {0} does not exist")]
    UnknownTech(TechRowId),
}

/// Live values, errors and lifecycle of one registration form.
///
/// Nothing is validated while values change; [`FormBinding::submit`] clears
/// the previous errors and recomputes them from scratch.
#[derive(Debug, Clone)]
pub struct FormBinding {
    variant: FormVariant,
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
    techs: Vec<TechRow>,
    avatar: Vec<SelectedFile>,
    errors: ValidationErrors,
    state: FormState,
    submit_count: u32,
    next_tech_id: u64,
}

impl FormBinding {
    pub fn new(variant: FormVariant) -> Self {
        Self {
            variant,
            email: None,
            password: None,
            name: None,
            techs: Vec::new(),
            avatar: Vec::new(),
            errors: ValidationErrors::new(),
            state: FormState::Idle,
            submit_count: 0,
            next_tech_id: 1,
        }
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_for(&self, path: &str) -> Option<&str> {
        self.errors.get(path)
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tech_rows(&self) -> &[TechRow] {
        &self.techs
    }

    pub fn avatar(&self) -> Option<&SelectedFile> {
        self.avatar.first()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), BindingError> {
        self.require(self.variant.has_name(), "name")?;
        self.name = Some(name.into());
        Ok(())
    }

    pub fn apply(&mut self, update: FieldUpdate) -> Result<(), BindingError> {
        if let Some(name) = update.name {
            self.set_name(name)?;
        }
        if let Some(email) = update.email {
            self.set_email(email);
        }
        if let Some(password) = update.password {
            self.set_password(password);
        }
        Ok(())
    }

    /// Adds a row at the end of the techs list and hands back its id.
    pub fn append_tech(&mut self, entry: RawTech) -> Result<TechRowId, BindingError> {
        self.require(self.variant.has_portfolio(), "techs")?;
        let id = TechRowId(self.next_tech_id);
        self.next_tech_id += 1;
        self.techs.push(TechRow {
            id,
            title: entry.title,
            knowledge: entry.knowledge,
        });
        Ok(id)
    }

    pub fn update_tech(&mut self, id: TechRowId, update: TechUpdate) -> Result<(), BindingError> {
        let row = self
            .techs
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(BindingError::UnknownTech(id))?;
        if let Some(title) = update.title {
            row.title = Some(title);
        }
        if let Some(knowledge) = update.knowledge {
            row.knowledge = Some(knowledge);
        }
        Ok(())
    }

    /// Replaces the file-picker selection; only the first file is ever used.
    pub fn select_avatar(&mut self, files: Vec<SelectedFile>) -> Result<(), BindingError> {
        self.require(self.variant.has_portfolio(), "avatar")?;
        self.avatar = files;
        Ok(())
    }

    /// Snapshot of the current values in the schema's input shape.
    pub fn raw(&self) -> RawSubmission {
        RawSubmission {
            email: self.email.clone(),
            password: self.password.clone(),
            name: self.name.clone(),
            techs: self
                .techs
                .iter()
                .map(|row| RawTech {
                    title: row.title.clone(),
                    knowledge: row.knowledge.clone(),
                })
                .collect(),
            avatar: self.avatar.clone(),
        }
    }

    /// Validate the current values. On success the form moves to
    /// `Submitting` and waits for [`FormBinding::mark_submitted`].
    pub fn submit(&mut self, schema: &SubmissionSchema) -> Result<Submission, ValidationErrors> {
        self.state = FormState::Validating;
        self.errors.clear();
        self.submit_count += 1;

        match schema.validate(&self.raw()) {
            Ok(submission) => {
                self.state = FormState::Submitting;
                Ok(submission)
            }
            Err(errors) => {
                self.errors = errors.clone();
                self.state = FormState::Idle;
                Err(errors)
            }
        }
    }

    pub fn mark_submitted(&mut self) {
        self.state = FormState::Submitted;
    }

    /// The submit handler failed after validation; values stay as typed.
    pub fn mark_failed(&mut self) {
        self.state = FormState::Idle;
    }

    pub fn view(&self) -> FormValuesView {
        FormValuesView {
            variant: self.variant,
            state: self.state,
            submit_count: self.submit_count,
            email: self.email.clone(),
            password_set: self.password.as_deref().is_some_and(|p| !p.is_empty()),
            name: self.name.clone(),
            avatar: self.avatar.first().map(|file| AvatarView {
                name: file.name.clone(),
                size: file.bytes.len() as u64,
            }),
            techs: self.techs.clone(),
            errors: self.errors.clone(),
        }
    }

    fn require(&self, present: bool, field: &'static str) -> Result<(), BindingError> {
        if present {
            Ok(())
        } else {
            Err(BindingError::FieldNotInVariant {
                variant: self.variant,
                field,
            })
        }
    }
}

/// Serializable form state. The password itself never leaves the binding.
#[derive(Debug, Clone, Serialize)]
pub struct FormValuesView {
    pub variant: FormVariant,
    pub state: FormState,
    pub submit_count: u32,
    pub email: Option<String>,
    pub password_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarView>,
    pub techs: Vec<TechRow>,
    pub errors: ValidationErrors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarView {
    pub name: String,
    pub size: u64,
}
