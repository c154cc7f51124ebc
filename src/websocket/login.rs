use crate::auth::AuthError;
use crate::server::ChatServer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /login`. Missing fields deserialize as empty strings so
/// they surface as a 400 rather than a body-rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub otp: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Issue a one-time connection credential for a valid login.
pub async fn login_handler(
    State(server): State<Arc<ChatServer>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let otp = server.login(&request.username, &request.password)?;
    Ok(Json(LoginResponse { otp }))
}
