//! Registration form: schema, live binding, open-form sessions, submission
//! handling and the HTTP surface around them.

pub mod binding;
pub mod domain;
pub mod render;
pub mod router;
pub mod schema;
pub mod service;
pub mod sessions;
pub mod submission;

#[cfg(test)]
mod tests;

pub use binding::{
    AvatarView, BindingError, FieldUpdate, FormBinding, FormState, FormValuesView, TechRow,
    TechRowId, TechUpdate,
};
pub use domain::{
    AvatarFile, FormVariant, RawSubmission, RawTech, SelectedFile, Submission, Tech,
    UnknownVariant,
};
pub use render::render_page;
pub use router::form_router;
pub use schema::{FieldPath, SchemaOptions, SubmissionSchema, ValidationErrors};
pub use service::{FormServiceError, RegistrationService};
pub use sessions::{
    apply_update, FormId, FormSession, FormSessionRepository, FormSessionView, SessionError,
};
pub use submission::{render_output, SubmissionError, SubmissionHandler, SubmissionReceipt};
