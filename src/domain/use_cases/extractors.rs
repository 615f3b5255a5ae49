use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{errors::AppError, infrastructure::utils::get_client_ip::get_client_ip, AppState};

/// Rate-limit scope of the requesting client.
/// Usage: add `scope: ClientScope` as a handler parameter.
#[derive(Debug, Clone)]
pub struct ClientScope(pub String);

impl FromRequest for ClientScope {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.app_data::<web::Data<AppState>>() {
            Some(state) => ready(Ok(ClientScope(get_client_ip(req, state.trust_x_forwarded_for)))),
            None => ready(Err(AppError::InternalError("Application state missing".into()).into())),
        }
    }
}
