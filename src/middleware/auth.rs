use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Token claims issued by the external auth service. `sub` is the staff
/// member id; store claims bound the stores this principal may touch.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: Uuid,
    pub role: String,
    #[serde(default)]
    pub store_ids: Vec<Uuid>,
    pub active_store_id: Option<Uuid>,
    pub exp: usize,
}

/// Authenticated principal resolved from the bearer token. Every service
/// call receives this and scopes queries by `tenant_id`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: String,
    pub store_ids: Vec<Uuid>,
    pub active_store_id: Option<Uuid>,
}

impl AuthUser {
    /// Pick the target store for a request: an explicit store id must be in
    /// the principal's store claims; otherwise fall back to the active store.
    pub fn resolve_store_id(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match requested {
            Some(store_id) => {
                self.ensure_store_access(store_id)?;
                Ok(store_id)
            }
            None => self
                .active_store_id
                .ok_or_else(|| AppError::Validation("store_id is required".into())),
        }
    }

    pub fn ensure_store_access(&self, store_id: Uuid) -> Result<(), AppError> {
        if !self.store_ids.contains(&store_id) {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Validation("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Validation("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Validation("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Validation("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Validation("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            tenant_id: decoded.claims.tenant_id,
            role: decoded.claims.role.clone(),
            store_ids: decoded.claims.store_ids.clone(),
            active_store_id: decoded.claims.active_store_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(store_ids: Vec<Uuid>, active: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: "waiter".into(),
            store_ids,
            active_store_id: active,
        }
    }

    #[test]
    fn explicit_store_must_be_assigned() {
        let store = Uuid::new_v4();
        let other = Uuid::new_v4();
        let user = principal(vec![store], Some(store));

        assert!(user.resolve_store_id(Some(store)).is_ok());
        assert!(matches!(
            user.resolve_store_id(Some(other)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn falls_back_to_active_store() {
        let store = Uuid::new_v4();
        let user = principal(vec![store], Some(store));
        assert_eq!(user.resolve_store_id(None).unwrap(), store);

        let without_active = principal(vec![store], None);
        assert!(matches!(
            without_active.resolve_store_id(None),
            Err(AppError::Validation(_))
        ));
    }
}
