use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    db::models::Id,
    error::{AppError, Result},
    services::tokens::{TokenError, TokenKind},
    AppState,
};

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Id,
}

pub type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

pub fn bearer_token(header: &BearerHeader) -> std::result::Result<&str, TokenError> {
    header
        .as_ref()
        .map(|TypedHeader(Authorization(bearer))| bearer.token())
        .ok_or(TokenError::Missing)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    header: BearerHeader,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&header)?;
    let id = state.tokens.verify(token, TokenKind::Access).map_err(|e| {
        tracing::debug!("Rejected access token: {e}");
        AppError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser { id });

    Ok(next.run(request).await)
}

// Extractor for getting the authenticated user from request extensions
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::from(TokenError::Missing))
    }
}
