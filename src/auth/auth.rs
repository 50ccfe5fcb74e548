use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::{ADMINS, Role};
use crate::models::{Claims, TokenType};
use crate::service::Actor;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Accepts access tokens carrying a known role.
    pub fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }

        let role = Role::from_id(claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    /// Verifies a raw `Authorization` header value.
    pub fn from_header(header: Option<&str>, secret: &str) -> Result<Self, ApiError> {
        let header = header.ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Authorization header must start with Bearer".into()))?;

        let claims = verify_token(token, secret)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

        Self::from_claims(claims)
    }

    pub fn require_any(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Role {} may not perform this action", self.role)))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_any(ADMINS)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The employee record this user acts as.
    pub fn employee_id(&self) -> Result<u64, ApiError> {
        self.employee_id
            .ok_or_else(|| ApiError::Forbidden("No employee profile".into()))
    }

    pub fn actor(&self, req: &HttpRequest) -> Actor {
        Actor {
            user_id: self.user_id,
            origin: req.connection_info().realip_remote_addr().map(str::to_string),
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already verified by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(ApiError::Internal.into()));
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(AuthUser::from_header(header, &config.jwt_secret).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id: None,
        }
    }

    #[test]
    fn role_sets_are_checked_declaratively() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::SuperAdmin).require_admin().is_ok());
        assert!(matches!(user(Role::Hr).require_admin(), Err(ApiError::Forbidden(_))));
        assert!(user(Role::Manager).require_any(&[Role::Manager, Role::Hr]).is_ok());
        assert!(matches!(user(Role::Employee).employee_id(), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn header_must_carry_a_valid_bearer_token() {
        assert!(matches!(AuthUser::from_header(None, "s"), Err(ApiError::Unauthorized(_))));
        assert!(matches!(AuthUser::from_header(Some("Basic abc"), "s"), Err(ApiError::Unauthorized(_))));

        let token = generate_access_token(4, "bob".into(), 5, Some(40), "s", 60).unwrap();
        let user = AuthUser::from_header(Some(&format!("Bearer {token}")), "s").unwrap();
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.employee_id, Some(40));

        let bad_role = generate_access_token(4, "bob".into(), 42, None, "s", 60).unwrap();
        assert!(matches!(
            AuthUser::from_header(Some(&format!("Bearer {bad_role}")), "s"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
