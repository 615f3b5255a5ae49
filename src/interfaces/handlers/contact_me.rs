use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use crate::{
    entities::{
        contact_me::{ContactMeForm, DraftPatch, ValidationOutcome},
        fingerprint::{ClientEnvironment, SessionFingerprint},
    },
    errors::SubmissionError,
    infrastructure::utils::request_probe::RequestProbe,
    interfaces::routes::json_error::JsonError,
    use_cases::extractors::ClientScope,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct MountRequest {
    #[serde(default)]
    pub environment: Option<ClientEnvironment>,
}

/// An empty body is "no body". Anything else has to parse as `T`.
fn optional_json<T: DeserializeOwned>(body: &web::Bytes) -> Result<Option<T>, JsonError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(body)?))
}

/// Mounts a contact form: the timing check counts from this moment.
#[post("/sessions")]
pub async fn mount_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, JsonError> {
    let reported = optional_json::<MountRequest>(&body)?.and_then(|b| b.environment);
    let fingerprint = SessionFingerprint::from_probe(&RequestProbe::new(&req, reported));
    let now = state.contact_handler.clock().now();

    Ok(HttpResponse::Created().json(state.sessions.mount(fingerprint, now)))
}

#[get("/sessions/{session_id}")]
pub async fn get_form(
    state: web::Data<AppState>,
    session_id: web::Path<Uuid>,
) -> Result<HttpResponse, SubmissionError> {
    let view = state.sessions.view(&session_id)?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/sessions/{session_id}/draft")]
pub async fn edit_draft(
    state: web::Data<AppState>,
    session_id: web::Path<Uuid>,
    patch: web::Json<DraftPatch>,
) -> Result<HttpResponse, SubmissionError> {
    let now = state.contact_handler.clock().now();
    let view = state.sessions.edit(&session_id, patch.into_inner(), now)?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/sessions/{session_id}/draft")]
pub async fn reset_draft(
    state: web::Data<AppState>,
    session_id: web::Path<Uuid>,
) -> Result<HttpResponse, SubmissionError> {
    let now = state.contact_handler.clock().now();
    let view = state.sessions.reset(&session_id, now)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Field-by-field verdict without submitting anything.
#[post("/validate")]
pub async fn validate_form(form: web::Json<ContactMeForm>) -> HttpResponse {
    let outcome = ValidationOutcome::of(&form);
    HttpResponse::Ok().json(serde_json::json!({
        "valid": !outcome.has_errors(),
        "errors": outcome,
    }))
}

#[post("/sessions/{session_id}/submit")]
pub async fn submit_form(
    state: web::Data<AppState>,
    session_id: web::Path<Uuid>,
    scope: ClientScope,
    body: web::Bytes,
) -> Result<HttpResponse, actix_web::Error> {
    let replacement = optional_json::<ContactMeForm>(&body)?;
    let response = state.sessions
        .submit(&session_id, &state.contact_handler, &scope.0, replacement)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
