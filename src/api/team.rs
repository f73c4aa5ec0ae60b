use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::team::Team;
use crate::model::user::{USER_COLUMNS, User};

#[derive(Deserialize, ToSchema)]
pub struct CreateTeam {
    #[schema(example = "Desarrollo")]
    pub name: String,
    #[schema(example = 2, nullable = true)]
    pub manager_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub manager_id: Option<u64>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct TeamWithCount {
    pub id: u64,
    pub name: String,
    #[schema(nullable = true)]
    pub manager_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = 5)]
    pub member_count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<User>,
}

/// A team's manager must be an existing user holding the manager or hr role.
async fn validate_manager(pool: &MySqlPool, manager_id: u64) -> Result<(), ApiError> {
    let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = ?")
        .bind(manager_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if role == Role::Employee {
        return Err(ApiError::Validation(
            "manager must hold the manager or hr role".into(),
        ));
    }

    Ok(())
}

async fn fetch_team(pool: &MySqlPool, id: u64) -> Result<Option<Team>, ApiError> {
    let team =
        sqlx::query_as::<_, Team>("SELECT id, name, manager_id, created_at FROM teams WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(team)
}

#[utoipa::path(
    get,
    path = "/api/v1/teams",
    responses((status = 200, description = "Teams with member counts", body = [TeamWithCount])),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn list_teams(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let teams = sqlx::query_as::<_, TeamWithCount>(
        r#"
        SELECT t.id, t.name, t.manager_id, t.created_at, COUNT(u.id) AS member_count
        FROM teams t
        LEFT JOIN users u ON u.team_id = t.id
        GROUP BY t.id, t.name, t.manager_id, t.created_at
        ORDER BY t.created_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(teams))
}

#[utoipa::path(
    get,
    path = "/api/v1/teams/{team_id}",
    params(("team_id" = u64, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team with its members", body = TeamDetail),
        (status = 404, description = "Team not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn get_team(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let team_id = path.into_inner();

    let team = fetch_team(pool.get_ref(), team_id)
        .await?
        .ok_or(ApiError::NotFound("team"))?;

    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE team_id = ? ORDER BY name ASC");
    let members = sqlx::query_as::<_, User>(&sql)
        .bind(team_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(TeamDetail { team, members }))
}

#[utoipa::path(
    post,
    path = "/api/v1/teams",
    request_body = CreateTeam,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Manager lacks the required role"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn create_team(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTeam>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Team name must not be empty".into()).into());
    }

    if let Some(manager_id) = payload.manager_id {
        validate_manager(pool.get_ref(), manager_id).await?;
    }

    let result = sqlx::query("INSERT INTO teams (name, manager_id) VALUES (?, ?)")
        .bind(name)
        .bind(payload.manager_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let created = fetch_team(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("team"))?;

    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/v1/teams/{team_id}",
    params(("team_id" = u64, Path, description = "Team ID")),
    request_body = UpdateTeam,
    responses(
        (status = 200, description = "Team updated", body = Team),
        (status = 404, description = "Team not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn update_team(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTeam>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let team_id = path.into_inner();

    let current = fetch_team(pool.get_ref(), team_id)
        .await?
        .ok_or(ApiError::NotFound("team"))?;

    let name = match &payload.name {
        Some(n) if n.trim().is_empty() => {
            return Err(ApiError::Validation("Team name must not be empty".into()).into());
        }
        Some(n) => n.trim().to_string(),
        None => current.name,
    };

    let manager_id = match payload.manager_id {
        Some(manager_id) => {
            validate_manager(pool.get_ref(), manager_id).await?;
            Some(manager_id)
        }
        None => current.manager_id,
    };

    sqlx::query("UPDATE teams SET name = ?, manager_id = ? WHERE id = ?")
        .bind(&name)
        .bind(manager_id)
        .bind(team_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let updated = fetch_team(pool.get_ref(), team_id)
        .await?
        .ok_or(ApiError::NotFound("team"))?;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/teams/{team_id}",
    params(("team_id" = u64, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted; members detached"),
        (status = 404, description = "Team not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn delete_team(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_user_admin()?;

    let team_id = path.into_inner();

    // Cascade-to-null: members survive their team, unassigned.
    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    sqlx::query("UPDATE users SET team_id = NULL WHERE team_id = ?")
        .bind(team_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::from)?;

    let result = sqlx::query("DELETE FROM teams WHERE id = ?")
        .bind(team_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("team").into());
    }

    tx.commit().await.map_err(ApiError::from)?;

    tracing::info!(team_id, "Team deleted, members detached");

    Ok(HttpResponse::NoContent().finish())
}
