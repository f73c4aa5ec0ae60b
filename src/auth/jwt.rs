use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::model::role::Role;
use crate::models::{Claims, TokenType};

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn build_claims(
    user_id: u64,
    email: String,
    name: String,
    role: Role,
    team_id: Option<u64>,
    token_type: TokenType,
    ttl: usize,
) -> Claims {
    Claims {
        user_id,
        sub: email,
        name,
        role,
        team_id,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    }
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    name: String,
    role: Role,
    team_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = build_claims(user_id, email, name, role, team_id, TokenType::Access, ttl);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn generate_refresh_token(
    user_id: u64,
    email: String,
    name: String,
    role: Role,
    team_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    let claims = build_claims(user_id, email, name, role, team_id, TokenType::Refresh, ttl);

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    (token, claims)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trips() {
        let token = generate_access_token(
            7,
            "ana.ruiz@example.com".to_string(),
            "Ana Ruiz".to_string(),
            Role::Hr,
            None,
            "test-secret",
            3600,
        );

        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "ana.ruiz@example.com");
        assert_eq!(claims.role, Role::Hr);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(
            1,
            "maria@example.com".to_string(),
            "María".to_string(),
            Role::Employee,
            Some(3),
            "secret-a",
            3600,
        );

        assert!(verify_token(&token, "secret-b").is_err());
    }

    #[test]
    fn refresh_tokens_are_tagged_and_unique() {
        let (first, first_claims) = generate_refresh_token(
            2,
            "carlos@example.com".to_string(),
            "Carlos".to_string(),
            Role::Manager,
            Some(1),
            "test-secret",
            3600,
        );
        let (second, second_claims) = generate_refresh_token(
            2,
            "carlos@example.com".to_string(),
            "Carlos".to_string(),
            Role::Manager,
            Some(1),
            "test-secret",
            3600,
        );

        assert_eq!(first_claims.token_type, TokenType::Refresh);
        assert_ne!(first_claims.jti, second_claims.jti);
        assert_ne!(first, second);
    }
}
