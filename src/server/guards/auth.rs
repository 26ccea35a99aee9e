use crate::error::StudyhallError;
use crate::server::router::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

/// Authenticated identity, resolved from the `Authorization: Bearer`
/// session token. Session issuance is the auth provider's concern; the
/// guard only resolves tokens through the gateway.
///
/// Threaded explicitly into every handler that touches user-owned rows,
/// rather than looked up implicitly inside the gateway.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = StudyhallError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_string())
            .ok_or(StudyhallError::Unauthorized)?;

        let user_id = state.db.resolve_session(&token).await?;
        Ok(CurrentUser { user_id })
    }
}
