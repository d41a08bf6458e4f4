use std::sync::Arc;

use tracing::{info, warn};

use super::binding::{BindingError, FieldUpdate, FormBinding, FormState, TechRowId, TechUpdate};
use super::domain::{FormVariant, RawTech, SelectedFile, Submission};
use super::render::render_page;
use super::schema::{SchemaOptions, SubmissionSchema, ValidationErrors};
use super::sessions::{FormId, FormSession, FormSessionRepository, FormSessionView, SessionError};
use super::submission::{SubmissionError, SubmissionHandler, SubmissionReceipt};
use crate::storage::ObjectStore;

const RELEASE_ATTEMPTS: usize = 3;

/// Service composing open-form sessions, the schema and the submission handler.
pub struct RegistrationService<R, S> {
    repository: Arc<R>,
    handler: SubmissionHandler<S>,
    options: SchemaOptions,
}

impl<R, S> RegistrationService<R, S>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    pub fn new(
        repository: Arc<R>,
        store: Arc<S>,
        bucket: impl Into<String>,
        options: SchemaOptions,
    ) -> Self {
        Self {
            repository,
            handler: SubmissionHandler::new(store, bucket),
            options,
        }
    }

    pub fn schema_for(&self, variant: FormVariant) -> SubmissionSchema {
        SubmissionSchema::for_variant(variant, &self.options)
    }

    /// Mount an empty form.
    pub fn open(&self, variant: FormVariant) -> Result<FormSessionView, FormServiceError> {
        let session = self.repository.insert(FormSession::open(variant))?;
        info!(form_id = %session.id, %variant, "form opened");
        Ok(session.view())
    }

    pub fn view(&self, id: &FormId) -> Result<FormSessionView, FormServiceError> {
        Ok(self.load(id)?.view())
    }

    pub fn page(&self, id: &FormId) -> Result<String, FormServiceError> {
        let session = self.load(id)?;
        Ok(render_page(&session.binding, None))
    }

    pub fn update_fields(
        &self,
        id: &FormId,
        update: FieldUpdate,
    ) -> Result<FormSessionView, FormServiceError> {
        self.modify(id, |session| session.binding.apply(update))
    }

    pub fn append_tech(&self, id: &FormId, entry: RawTech) -> Result<TechRowId, FormServiceError> {
        let mut session = self.load(id)?;
        let tech_id = session.binding.append_tech(entry)?;
        self.repository.update(session)?;
        Ok(tech_id)
    }

    pub fn update_tech(
        &self,
        id: &FormId,
        tech_id: TechRowId,
        update: TechUpdate,
    ) -> Result<FormSessionView, FormServiceError> {
        self.modify(id, |session| session.binding.update_tech(tech_id, update))
    }

    pub fn select_avatar(
        &self,
        id: &FormId,
        file: SelectedFile,
    ) -> Result<FormSessionView, FormServiceError> {
        self.modify(id, |session| session.binding.select_avatar(vec![file]))
    }

    /// Drop an open form without submitting it.
    pub fn discard(&self, id: &FormId) -> Result<(), FormServiceError> {
        self.repository.remove(id)?;
        info!(form_id = %id, "form discarded");
        Ok(())
    }

    /// Validate, upload and render. The form is discarded only on success.
    pub async fn submit(&self, id: &FormId) -> Result<SubmissionReceipt, FormServiceError> {
        let (receipt, _) = self.run_submit(id).await?;
        Ok(receipt)
    }

    /// Same as [`RegistrationService::submit`], answered with the submitted
    /// page and the formatted payload in its output block.
    pub async fn submit_page(&self, id: &FormId) -> Result<String, FormServiceError> {
        let (receipt, binding) = self.run_submit(id).await?;
        Ok(render_page(&binding, Some(&receipt.output)))
    }

    async fn run_submit(
        &self,
        id: &FormId,
    ) -> Result<(SubmissionReceipt, FormBinding), FormServiceError> {
        let (submission, mut session) = self.begin_submit(id)?;

        match self.handler.handle(submission).await {
            Ok(receipt) => {
                session.binding.mark_submitted();
                match self.repository.remove(id) {
                    Ok(()) | Err(SessionError::NotFound) => {}
                    Err(err) => return Err(err.into()),
                }
                info!(form_id = %id, uploaded = receipt.upload.is_some(), "form submitted");
                Ok((receipt, session.binding))
            }
            Err(err) => {
                warn!(form_id = %id, error = %err, "form submission failed after validation");
                if let Err(release) = self.release_after_failure(id) {
                    warn!(form_id = %id, error = %release, "could not reopen form after failure");
                }
                Err(FormServiceError::Submission(err))
            }
        }
    }

    /// Validates and moves the stored form to `Submitting` in one
    /// compare-and-set, so only one caller ever reaches the upload.
    fn begin_submit(&self, id: &FormId) -> Result<(Submission, FormSession), FormServiceError> {
        let mut session = self.load(id)?;
        if session.binding.state() == FormState::Submitting {
            return Err(FormServiceError::SubmitInProgress);
        }

        let schema = self.schema_for(session.binding.variant());
        match session.binding.submit(&schema) {
            Ok(submission) => {
                self.repository.update(session.clone())?;
                Ok((submission, session))
            }
            Err(errors) => {
                self.repository.update(session)?;
                info!(form_id = %id, failures = errors.len(), "form rejected");
                Err(FormServiceError::Validation(errors))
            }
        }
    }

    /// Back to `Idle` on the latest stored copy, keeping edits made while
    /// the upload was in flight.
    fn release_after_failure(&self, id: &FormId) -> Result<(), SessionError> {
        for _ in 0..RELEASE_ATTEMPTS {
            let Some(mut session) = self.repository.fetch(id)? else {
                return Ok(());
            };
            session.binding.mark_failed();
            match self.repository.update(session) {
                Err(SessionError::Conflict) => continue,
                other => return other,
            }
        }
        Err(SessionError::Conflict)
    }

    fn load(&self, id: &FormId) -> Result<FormSession, FormServiceError> {
        Ok(self.repository.fetch(id)?.ok_or(SessionError::NotFound)?)
    }

    fn modify<F>(&self, id: &FormId, change: F) -> Result<FormSessionView, FormServiceError>
    where
        F: FnOnce(&mut FormSession) -> Result<(), BindingError>,
    {
        let mut session = self.load(id)?;
        change(&mut session)?;
        let view = session.view();
        self.repository.update(session)?;
        Ok(view)
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum FormServiceError {
    #[error("form has invalid fields: {0}")]
    Validation(ValidationErrors),
    #[error("form is already being submitted")]
    SubmitInProgress,
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
