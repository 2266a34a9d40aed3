use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

/// Comments shown inline on a feed post; the full list lives behind the
/// comments endpoint.
const COMMENT_PREVIEW_LEN: usize = 3;
const FEED_LIMIT: i64 = 50;

// -- View structs --

#[derive(Debug, Clone, Serialize)]
pub struct FeedAuthor {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: String,
    pub user: FeedAuthor,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    /// Count of like rows, never a stored counter.
    pub likes: i64,
    pub comments_count: i64,
    pub is_liked: bool,
    pub timestamp: String,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub user: FeedAuthor,
    pub text: String,
    pub timestamp: String,
}

// -- Requests --

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub caption: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: Option<String>,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/community/feed", get(feed))
        .route("/community/posts", post(create_post))
        .route("/community/posts/{id}/like", post(toggle_like))
        .route(
            "/community/posts/{id}/comments",
            get(list_comments).post(add_comment),
        )
}

// -- Handlers --

async fn feed(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> AppResult<Response> {
    let viewer_id = user.map(|u| u.id);

    let conn = state.db.get()?;
    let posts = query_feed(&conn, viewer_id.as_deref())?;
    Ok(Json(posts).into_response())
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Response> {
    let caption = req
        .caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("caption is required".into()))?;

    let post_id = uuid::Uuid::now_v7().to_string();
    let conn = state.db.get()?;
    conn.execute(
        "INSERT INTO posts (id, caption, location, image, user_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![post_id, caption, req.location, req.image, user.id],
    )?;

    let timestamp: String = conn.query_row(
        "SELECT created_at FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;

    let post = FeedPost {
        id: post_id,
        user: FeedAuthor {
            id: user.id,
            name: user.name,
            avatar: user.avatar,
        },
        caption: Some(caption),
        location: req.location,
        image: req.image,
        likes: 0,
        comments_count: 0,
        is_liked: false,
        timestamp,
        comments: Vec::new(),
    };

    Ok((StatusCode::CREATED, Json(post)).into_response())
}

async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    ensure_post_exists(&conn, &post_id)?;

    let (is_liked, likes) = toggle_like_row(&conn, &post_id, &user.id)?;

    Ok(Json(serde_json::json!({
        "message": "Success",
        "isLiked": is_liked,
        "likes": likes,
    }))
    .into_response())
}

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    ensure_post_exists(&conn, &post_id)?;

    let comments = query_comments(&conn, &post_id, None)?;
    Ok(Json(comments).into_response())
}

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Response> {
    let text = req
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("text is required".into()))?;

    let conn = state.db.get()?;
    ensure_post_exists(&conn, &post_id)?;

    let comment_id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO comments (id, post_id, user_id, text) VALUES (?1, ?2, ?3, ?4)",
        params![comment_id, post_id, user.id, text],
    )?;

    let timestamp: String = conn.query_row(
        "SELECT created_at FROM comments WHERE id = ?1",
        params![comment_id],
        |row| row.get(0),
    )?;

    let comment = CommentView {
        id: comment_id,
        user: FeedAuthor {
            id: user.id,
            name: user.name,
            avatar: user.avatar,
        },
        text,
        timestamp,
    };

    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

// -- Query helpers --

fn ensure_post_exists(conn: &rusqlite::Connection, post_id: &str) -> AppResult<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// Flip the requester's like on a post. The composite primary key on likes
/// is the source of truth: delete first, and when nothing was deleted insert
/// (OR IGNORE absorbs a concurrent insert of the same row). The returned
/// count is always re-read from the table.
fn toggle_like_row(
    conn: &rusqlite::Connection,
    post_id: &str,
    user_id: &str,
) -> AppResult<(bool, i64)> {
    let removed = conn.execute(
        "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
        params![post_id, user_id],
    )?;

    let is_liked = if removed == 0 {
        conn.execute(
            "INSERT OR IGNORE INTO likes (post_id, user_id) VALUES (?1, ?2)",
            params![post_id, user_id],
        )?;
        true
    } else {
        false
    };

    let likes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;

    Ok((is_liked, likes))
}

fn query_feed(
    conn: &rusqlite::Connection,
    viewer_id: Option<&str>,
) -> Result<Vec<FeedPost>, AppError> {
    let uid = viewer_id.unwrap_or("");

    let mut stmt = conn.prepare(
        "SELECT p.id, p.caption, p.location, p.image, p.created_at,
                u.id, u.name, u.avatar,
                (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
                (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
                EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1) AS is_liked
         FROM posts p
         JOIN users u ON u.id = p.user_id
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?2",
    )?;

    let rows: Vec<(FeedPost, String)> = stmt
        .query_map(params![uid, FEED_LIMIT], |row| {
            let id: String = row.get(0)?;
            Ok((
                FeedPost {
                    id: id.clone(),
                    caption: row.get(1)?,
                    location: row.get(2)?,
                    image: row.get(3)?,
                    timestamp: row.get(4)?,
                    user: FeedAuthor {
                        id: row.get(5)?,
                        name: row.get(6)?,
                        avatar: row.get(7)?,
                    },
                    likes: row.get(8)?,
                    comments_count: row.get(9)?,
                    is_liked: row.get(10)?,
                    comments: Vec::new(),
                },
                id,
            ))
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut posts = Vec::with_capacity(rows.len());
    for (mut post, post_id) in rows {
        post.comments = query_comments(conn, &post_id, Some(COMMENT_PREVIEW_LEN))?;
        posts.push(post);
    }

    Ok(posts)
}

fn query_comments(
    conn: &rusqlite::Connection,
    post_id: &str,
    limit: Option<usize>,
) -> Result<Vec<CommentView>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.created_at, u.id, u.name, u.avatar
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.id ASC
         LIMIT ?2",
    )?;

    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let comments = stmt
        .query_map(params![post_id, limit], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                text: row.get(1)?,
                timestamp: row.get(2)?,
                user: FeedAuthor {
                    id: row.get(3)?,
                    name: row.get(4)?,
                    avatar: row.get(5)?,
                },
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(comments)
}

// -- Tests --
