use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use osswatch_core::models::{CallerContext, GlobalRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    /// System-wide role: "none", "viewer", or "writer"
    pub global_role: GlobalRole,
    /// Organization ids the caller belongs to
    #[serde(default)]
    pub orgs: Vec<Uuid>,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

impl JwtClaims {
    pub fn into_caller_context(self) -> CallerContext {
        CallerContext {
            user_id: self.sub,
            global_role: self.global_role,
            org_memberships: self.orgs,
        }
    }
}

/// Request-extension wrapper so [`CallerContext`] can be extracted in handlers.
/// The auth middleware inserts it after validating the bearer token.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Caller>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Missing caller context",
                    "MISSING_CALLER_CONTEXT",
                )),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_convert_to_caller_context() {
        let user_id = Uuid::new_v4();
        let org = Uuid::new_v4();
        let claims = JwtClaims {
            sub: user_id,
            global_role: GlobalRole::Viewer,
            orgs: vec![org],
            exp: 0,
            iat: 0,
        };
        let caller = claims.into_caller_context();
        assert_eq!(caller.user_id, user_id);
        assert_eq!(caller.global_role, GlobalRole::Viewer);
        assert!(caller.is_member_of(org));
    }

    #[test]
    fn claims_deserialize_with_lowercase_role() {
        let json = format!(
            r#"{{"sub":"{}","global_role":"writer","orgs":[],"exp":1,"iat":0}}"#,
            Uuid::new_v4()
        );
        let claims: JwtClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims.global_role, GlobalRole::Writer);
    }
}
