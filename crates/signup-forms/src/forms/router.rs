use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::binding::{FieldUpdate, TechRowId, TechUpdate};
use super::domain::{FormVariant, RawTech, SelectedFile};
use super::service::{FormServiceError, RegistrationService};
use super::sessions::{FormId, FormSessionRepository, FormSessionView};
use super::submission::SubmissionReceipt;
use crate::error::AppError;
use crate::storage::ObjectStore;

#[derive(Debug, Deserialize)]
pub(crate) struct OpenFormRequest {
    pub(crate) variant: FormVariant,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvatarQuery {
    pub(crate) name: String,
}

/// Router builder exposing the form lifecycle over HTTP.
pub fn form_router<R, S>(service: Arc<RegistrationService<R, S>>) -> Router
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    Router::new()
        .route("/api/v1/forms", post(open_handler::<R, S>))
        .route(
            "/api/v1/forms/:form_id",
            get(view_handler::<R, S>).delete(discard_handler::<R, S>),
        )
        .route(
            "/api/v1/forms/:form_id/page",
            get(page_handler::<R, S>).post(page_submit_handler::<R, S>),
        )
        .route("/api/v1/forms/:form_id/fields", patch(fields_handler::<R, S>))
        .route("/api/v1/forms/:form_id/techs", post(append_tech_handler::<R, S>))
        .route(
            "/api/v1/forms/:form_id/techs/:tech_id",
            patch(update_tech_handler::<R, S>),
        )
        .route("/api/v1/forms/:form_id/avatar", put(avatar_handler::<R, S>))
        .route("/api/v1/forms/:form_id/submit", post(submit_handler::<R, S>))
        .with_state(service)
}

pub(crate) async fn open_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Json(request): Json<OpenFormRequest>,
) -> Result<(StatusCode, Json<FormSessionView>), AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    let view = service.open(request.variant)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn view_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
) -> Result<Json<FormSessionView>, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    Ok(Json(service.view(&FormId(form_id))?))
}

pub(crate) async fn discard_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    service.discard(&FormId(form_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn page_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
) -> Result<Html<String>, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    Ok(Html(service.page(&FormId(form_id))?))
}

/// Form-post flow: the submitted page with its output, or the same page
/// with inline errors and a 422.
pub(crate) async fn page_submit_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
) -> Result<Response, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    let id = FormId(form_id);
    match service.submit_page(&id).await {
        Ok(page) => Ok(Html(page).into_response()),
        Err(FormServiceError::Validation(_)) => {
            let page = service.page(&id)?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn fields_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<FormSessionView>, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    Ok(Json(service.update_fields(&FormId(form_id), update)?))
}

pub(crate) async fn append_tech_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
    Json(entry): Json<RawTech>,
) -> Result<(StatusCode, Json<Value>), AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    let tech_id = service.append_tech(&FormId(form_id), entry)?;
    Ok((StatusCode::CREATED, Json(json!({ "tech_id": tech_id }))))
}

pub(crate) async fn update_tech_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path((form_id, tech_id)): Path<(String, u64)>,
    Json(update): Json<TechUpdate>,
) -> Result<Json<FormSessionView>, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    Ok(Json(service.update_tech(
        &FormId(form_id),
        TechRowId(tech_id),
        update,
    )?))
}

pub(crate) async fn avatar_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
    Query(query): Query<AvatarQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FormSessionView>, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    let mut file = SelectedFile::new(query.name, body.to_vec());
    if let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        file = file.with_content_type(content_type);
    }

    Ok(Json(service.select_avatar(&FormId(form_id), file)?))
}

pub(crate) async fn submit_handler<R, S>(
    State(service): State<Arc<RegistrationService<R, S>>>,
    Path(form_id): Path<String>,
) -> Result<Json<SubmissionReceipt>, AppError>
where
    R: FormSessionRepository + 'static,
    S: ObjectStore + 'static,
{
    Ok(Json(service.submit(&FormId(form_id)).await?))
}
