use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::{Capabilities, Role};
use crate::models::{Claims, TokenType};

/// The session context for one request: identity plus the capability set
/// derived from the token's role. Handlers receive this explicitly; there is
/// no global auth state.
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub team_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        if data.claims.token_type != TokenType::Access {
            return ready(Err(ErrorUnauthorized("Access token required")));
        }

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            name: data.claims.name,
            role: data.claims.role,
            team_id: data.claims.team_id,
        }))
    }
}

impl AuthUser {
    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }

    pub fn require_reviewer(&self) -> Result<(), ApiError> {
        if self.capabilities().can_review {
            Ok(())
        } else {
            Err(ApiError::Forbidden("reviewer role required"))
        }
    }

    pub fn require_holiday_admin(&self) -> Result<(), ApiError> {
        if self.capabilities().can_manage_holidays {
            Ok(())
        } else {
            Err(ApiError::Forbidden("holiday administration requires hr"))
        }
    }

    pub fn require_user_admin(&self) -> Result<(), ApiError> {
        if self.capabilities().can_manage_users {
            Ok(())
        } else {
            Err(ApiError::Forbidden("user administration requires hr"))
        }
    }
}
