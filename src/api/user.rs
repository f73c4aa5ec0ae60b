use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::handlers::is_email_available;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::{DEFAULT_SICK_DAYS, DEFAULT_VACATION_DAYS, USER_COLUMNS, User};
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::{email_cache, email_filter};

/// Columns HR may touch through the dynamic update endpoint. Email and
/// password stay out: email uniqueness is guarded elsewhere and credential
/// changes go through the auth flow.
const UPDATABLE_COLUMNS: &[&str] = &[
    "name",
    "role",
    "team_id",
    "vacation_days_balance",
    "sick_days_balance",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "pedro.martinez@example.com")]
    pub email: String,
    pub password: String,
    #[schema(example = "Pedro Martínez")]
    pub name: String,
    pub role: Role,
    #[schema(example = 1, nullable = true)]
    pub team_id: Option<u64>,
    /// Defaults to 22 when omitted.
    pub vacation_days_balance: Option<i32>,
    /// Defaults to 3 when omitted.
    pub sick_days_balance: Option<i32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub role: Option<Role>,
    pub team_id: Option<u64>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Role(Role),
    Str(String),
}

async fn fetch_user(pool: &MySqlPool, id: u64) -> Result<Option<User>, ApiError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Email already registered"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim();

    if email.is_empty() || payload.password.is_empty() || name.is_empty() {
        return Err(
            ApiError::Validation("Email, password and name must not be empty".into()).into(),
        );
    }

    if !is_email_available(&email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "error": "Email already registered"
        })));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::Database
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password, name, role, team_id, vacation_days_balance, sick_days_balance)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(&hashed)
    .bind(name)
    .bind(payload.role)
    .bind(payload.team_id)
    .bind(payload.vacation_days_balance.unwrap_or(DEFAULT_VACATION_DAYS))
    .bind(payload.sick_days_balance.unwrap_or(DEFAULT_SICK_DAYS))
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    let created = fetch_user(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(role) = query.role {
        conditions.push("role = ?");
        bindings.push(FilterValue::Role(role));
    }

    if let Some(team_id) = query.team_id {
        conditions.push("team_id = ?");
        bindings.push(FilterValue::U64(team_id));
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::U64(v) => count_query.bind(*v),
            FilterValue::Role(r) => count_query.bind(*r),
            FilterValue::Str(s) => count_query.bind(s.clone()),
        };
    }

    let total = count_query
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {USER_COLUMNS} FROM users {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, User>(&data_sql);
    for b in bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(v),
            FilterValue::Role(r) => data_query.bind(r),
            FilterValue::Str(s) => data_query.bind(s),
        };
    }

    let users = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Not yourself and not hr"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    // Anyone may read their own profile; everything else requires hr.
    if user_id != auth.user_id {
        auth.require_user_admin()?;
    }

    let user = fetch_user(pool.get_ref(), user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Unknown or forbidden field"),
        (status = 404, description = "User not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let user_id = path.into_inner();

    let update = build_update_sql("users", &body, UPDATABLE_COLUMNS, "id", user_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(ApiError::from)?;

    if affected == 0 {
        return Err(ApiError::NotFound("user").into());
    }

    let updated = fetch_user(pool.get_ref(), user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let user_id = path.into_inner();

    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound("user"))?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    // Keep the availability fast path truthful.
    email_filter::remove(&email);
    email_cache::forget(&email).await;

    Ok(HttpResponse::NoContent().finish())
}
