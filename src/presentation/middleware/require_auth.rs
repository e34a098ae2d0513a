use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::infrastructure::auth::decode_basic_authorization;
use crate::presentation::state::AppState;

pub const AUTH_CHALLENGE: &str = r#"Basic realm="Protected Area""#;

/// Rejects the request with a Basic challenge unless the verifier allows the
/// presented credentials.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(decode_basic_authorization);

    if state.credential_verifier.verify(credentials.as_ref()) {
        return next.run(request).await;
    }

    tracing::warn!(
        presented = credentials.is_some(),
        "Rejected request without valid credentials"
    );
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, AUTH_CHALLENGE)],
        "Authentication required.",
    )
        .into_response()
}
