use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "maria.garcia@example.com")]
    pub email: String,
    pub password: String,
    #[schema(example = "María García")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "maria.garcia@example.com")]
    pub email: String,
    pub password: String,
}

/// Credential row used by login; the only place the hash is read back.
#[derive(FromRow)]
pub struct AccountRow {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub team_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub team_id: Option<u64>,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
