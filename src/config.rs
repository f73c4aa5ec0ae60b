use dotenvy::dotenv;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

fn parsed<T>(key: &str, default: T) -> T
where
    T: FromStr,
    <T as FromStr>::Err: Debug,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} is not valid: {e:?}")),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900),      // 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", 604800), // 7 days
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 10),

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60),
            rate_register_per_min: parsed("RATE_REGISTER_PER_MIN", 30),
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", 30),
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
