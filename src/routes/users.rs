use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

// -- Views --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub stats: ProfileStats,
}

/// Derived from the requester's trips at read time.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub trips_completed: i64,
    pub countries_visited: i64,
    pub upcoming_trips: i64,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/avatar", post(update_avatar))
}

// -- Handlers --

async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    let profile = load_profile(&conn, &user.id)?;
    Ok(Json(profile).into_response())
}

async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Response> {
    let conn = state.db.get()?;

    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        conn.execute(
            "UPDATE users SET name = ?2 WHERE id = ?1",
            params![user.id, name],
        )?;
    }
    if let Some(phone) = req.phone.as_deref() {
        conn.execute(
            "UPDATE users SET phone = ?2 WHERE id = ?1",
            params![user.id, phone],
        )?;
    }
    if let Some(location) = req.location.as_deref() {
        conn.execute(
            "UPDATE users SET location = ?2 WHERE id = ?1",
            params![user.id, location],
        )?;
    }

    let profile = load_profile(&conn, &user.id)?;
    Ok(Json(profile).into_response())
}

/// POST /user/avatar — multipart upload. The file lands in the uploads dir
/// and only its public URL is stored on the user row.
async fn update_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut uploaded: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e)))?
    {
        if field.name() == Some("avatar") {
            let extension = field
                .content_type()
                .and_then(|ct| mime_guess::get_mime_extensions_str(ct))
                .and_then(|exts| exts.first())
                .copied()
                .unwrap_or("bin");
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e)))?;
            uploaded = Some((bytes.to_vec(), extension.to_string()));
            break;
        }
    }

    let (bytes, extension) =
        uploaded.ok_or_else(|| AppError::Validation("No file uploaded".into()))?;

    let filename = format!("{}.{}", uuid::Uuid::now_v7(), extension);
    let path = state.config.uploads_path().join(&filename);
    std::fs::create_dir_all(state.config.uploads_path())
        .and_then(|_| std::fs::write(&path, &bytes))
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    let avatar_url = format!("{}/uploads/{}", state.config.public_url(), filename);

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE users SET avatar = ?2 WHERE id = ?1",
        params![user.id, avatar_url],
    )?;

    Ok(Json(serde_json::json!({
        "message": "Avatar updated",
        "avatar": avatar_url,
    }))
    .into_response())
}

// -- Query helpers --

fn load_profile(conn: &rusqlite::Connection, user_id: &str) -> AppResult<Profile> {
    let (id, name, email, phone, location, avatar) = conn
        .query_row(
            "SELECT id, name, email, phone, location, avatar FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Database(other),
        })?;

    let stats = load_stats(conn, user_id)?;

    Ok(Profile {
        id,
        name,
        email,
        phone,
        location,
        avatar,
        stats,
    })
}

fn load_stats(conn: &rusqlite::Connection, user_id: &str) -> AppResult<ProfileStats> {
    let trips_completed: i64 = conn.query_row(
        "SELECT COUNT(*) FROM trips WHERE user_id = ?1 AND status = 'completed'",
        params![user_id],
        |row| row.get(0),
    )?;
    let upcoming_trips: i64 = conn.query_row(
        "SELECT COUNT(*) FROM trips WHERE user_id = ?1 AND status = 'upcoming'",
        params![user_id],
        |row| row.get(0),
    )?;
    let countries_visited: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT destination) FROM trips WHERE user_id = ?1 AND status = 'completed'",
        params![user_id],
        |row| row.get(0),
    )?;

    Ok(ProfileStats {
        trips_completed,
        countries_visited,
        upcoming_trips,
    })
}
