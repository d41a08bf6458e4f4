use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::binding::{FormBinding, FormValuesView};
use super::domain::FormVariant;

/// Identifier wrapper for open forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormId(pub String);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random v4 id; not derivable from other forms' ids.
pub(crate) fn next_form_id() -> FormId {
    FormId(Uuid::new_v4().to_string())
}

/// A mounted form. Created empty, discarded after a successful submit.
#[derive(Debug, Clone)]
pub struct FormSession {
    pub id: FormId,
    pub opened_at: DateTime<Utc>,
    /// Bumped by the repository on every accepted update.
    pub revision: u64,
    pub binding: FormBinding,
}

impl FormSession {
    pub fn open(variant: FormVariant) -> Self {
        Self {
            id: next_form_id(),
            opened_at: Utc::now(),
            revision: 0,
            binding: FormBinding::new(variant),
        }
    }

    pub fn view(&self) -> FormSessionView {
        FormSessionView {
            form_id: self.id.clone(),
            opened_at: self.opened_at,
            form: self.binding.view(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSessionView {
    pub form_id: FormId,
    pub opened_at: DateTime<Utc>,
    #[serde(flatten)]
    pub form: FormValuesView,
}

/// Storage abstraction for open forms so the service can be exercised in isolation.
pub trait FormSessionRepository: Send + Sync {
    fn insert(&self, session: FormSession) -> Result<FormSession, SessionError>;
    /// Compare-and-set: stores `session` only if the stored revision still
    /// equals `session.revision`, then bumps it. A stale write is `Conflict`.
    fn update(&self, session: FormSession) -> Result<(), SessionError>;
    fn fetch(&self, id: &FormId) -> Result<Option<FormSession>, SessionError>;
    fn remove(&self, id: &FormId) -> Result<(), SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("form was changed concurrently")]
    Conflict,
    #[error("form not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Compare-and-set step shared by the in-memory repositories.
pub fn apply_update(stored: &mut FormSession, mut incoming: FormSession) -> Result<(), SessionError> {
    if stored.revision != incoming.revision {
        return Err(SessionError::Conflict);
    }
    incoming.revision += 1;
    *stored = incoming;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_ids_are_random_uuids() {
        let first = next_form_id();
        let second = next_form_id();

        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first.0).is_ok());
    }

    #[test]
    fn stale_revision_is_refused() {
        let mut stored = FormSession::open(FormVariant::Credentials);
        let copy_a = stored.clone();
        let mut copy_b = stored.clone();

        apply_update(&mut stored, copy_a).expect("first writer wins");
        assert_eq!(stored.revision, 1);

        copy_b.binding.set_email("late@example.com");
        assert!(matches!(
            apply_update(&mut stored, copy_b),
            Err(SessionError::Conflict)
        ));
        assert!(stored.binding.email().is_none());
    }
}
