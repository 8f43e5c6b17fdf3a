use crate::infrastructure::jwt::JwtService;
use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::{BearerAuth, Config};
use actix_web_httpauth::extractors::AuthenticationError;
use std::sync::Arc;

/// Verifies the bearer token and stashes the user id in request extensions
/// for the handler behind it.
pub async fn jwt_middleware(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
        Some(service) => service.get_ref().clone(),
        None => {
            return Err((
                actix_web::error::ErrorInternalServerError("JWT service not configured"),
                req,
            ));
        }
    };

    match jwt_service.verify_token(credentials.token()) {
        Ok(user_id) => {
            tracing::debug!("Bearer token accepted for user_id={}", user_id);
            req.extensions_mut().insert(user_id);
            Ok(req)
        }
        Err(e) => {
            tracing::debug!("Bearer token rejected: {}", e);
            let config = req.app_data::<Config>().cloned().unwrap_or_default();
            Err((AuthenticationError::from(config).into(), req))
        }
    }
}
