//! Middleware de autenticación JWT
//!
//! Valida el bearer token emitido por el servicio de autenticación externo
//! e inyecta el usuario autenticado en las extensiones de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token, JwtConfig},
    },
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject: String,
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("malformed authorization header".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &JwtConfig::from(state.config.as_ref())).map_err(|e| {
        tracing::warn!("🔒 Token rechazado: {}", e);
        e
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        subject: claims.sub,
    });

    Ok(next.run(request).await)
}
