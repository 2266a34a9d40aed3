use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::auth::session;
use crate::db::models::PublicUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// -- Request types --

/// Registration payload. The mobile client has shipped several field
/// layouts over time (name vs. firstName/lastName, location vs.
/// city/country), so all of them are accepted here.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

// -- Handlers --

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Response> {
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email and Password are required".into()))?;
    let password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Email and Password are required".into()))?;

    let name = resolve_name(&req).ok_or_else(|| {
        AppError::Validation("Name is required (provide name, username, or firstName)".into())
    })?;
    let location = resolve_location(&req);

    let conn = state.db.get()?;

    let email_taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    if email_taken {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let user_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, phone, location)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![user_id, name, email, password_hash, req.phone, location],
    )?;
    drop(conn);

    // Log the user in right away
    let token = session::create_session(&state.db, &user_id, state.config.auth.token_hours)?;

    tracing::info!("Registered user {}", user_id);

    let body = RegisterResponse {
        message: "User registered successfully".into(),
        user_id: user_id.clone(),
        token,
        user: PublicUser {
            id: user_id,
            name,
            email: email.to_string(),
            avatar: None,
        },
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// POST /auth/login
///
/// Accepts the address in either `username` or `email`. Unknown email and
/// wrong password produce the same 401 so the response does not reveal
/// whether an account exists.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let email = req
        .username
        .as_deref()
        .or(req.email.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            AppError::Validation("Email/Username and Password are required".into())
        })?;
    let password = req.password.as_deref().filter(|p| !p.is_empty()).ok_or_else(|| {
        AppError::Validation("Email/Username and Password are required".into())
    })?;

    let conn = state.db.get()?;
    let user: Option<(String, String, String, Option<String>, String)> = conn
        .query_row(
            "SELECT id, name, email, avatar, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .ok();
    drop(conn);

    let (id, name, email, avatar, password_hash) = user.ok_or(AppError::Unauthorized)?;

    let matches = bcrypt::verify(password, &password_hash).unwrap_or(false);
    if !matches {
        return Err(AppError::Unauthorized);
    }

    let token = session::create_session(&state.db, &id, state.config.auth.token_hours)?;

    Ok(Json(LoginResponse {
        token,
        user: PublicUser {
            id,
            name,
            email,
            avatar,
        },
    })
    .into_response())
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = bearer_token(&headers) {
        session::delete_session(&state.db, token)?;
    }
    Ok(Json(serde_json::json!({ "message": "Logged out" })).into_response())
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// -- Field normalization --

fn resolve_name(req: &RegisterRequest) -> Option<String> {
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_string());
    }
    match (req.first_name.as_deref(), req.last_name.as_deref()) {
        (Some(first), Some(last)) => return Some(format!("{} {}", first, last).trim().to_string()),
        (Some(first), None) => return Some(first.trim().to_string()),
        _ => {}
    }
    req.username
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.to_string())
}

fn resolve_location(req: &RegisterRequest) -> Option<String> {
    if req.location.is_some() {
        return req.location.clone();
    }
    let parts: Vec<&str> = [req.city.as_deref(), req.country.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
