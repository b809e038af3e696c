use super::error::ApiErrorCode;
use crate::application_port::SessionService;
use crate::domain_model::{PrincipalKey, SessionToken};
use std::sync::Arc;
use warp::{Filter, reject};

pub const AUTHORIZATION: &str = "authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// Token carried by an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<SessionToken> {
    header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
        .map(SessionToken::from)
}

/// Resolves the request's bearer token to a principal, rejecting with
/// [`ApiErrorCode::Unauthenticated`] whatever the cause.
pub fn with_principal(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (PrincipalKey,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION).and_then(
        move |header: Option<String>| {
            let session_service = session_service.clone();
            async move {
                let token = header
                    .as_deref()
                    .and_then(bearer_token)
                    .ok_or_else(|| reject::custom(ApiErrorCode::Unauthenticated))?;
                let key = session_service
                    .authenticate(&token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok::<_, warp::Rejection>(key)
            }
        },
    )
}
