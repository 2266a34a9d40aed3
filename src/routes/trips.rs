use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::{Activity, Section, Trip, TripStatus};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::trips::domain::{build_itinerary, parse_money};
use crate::trips::repository;

// -- Requests --

#[derive(Deserialize)]
pub struct TripListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<serde_json::Value>,
    pub image: Option<String>,
    pub overview: Option<String>,
}

/// Whitelisted mutable fields; anything else in the body is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<serde_json::Value>,
    pub status: Option<String>,
    pub image: Option<String>,
    pub overview: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionRequest {
    pub title: Option<String>,
    pub day: Option<i64>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<serde_json::Value>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionRequest {
    pub title: Option<String>,
    pub day: Option<i64>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<serde_json::Value>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub day: Option<i64>,
    pub time: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    pub cost: Option<serde_json::Value>,
    pub duration: Option<String>,
}

#[derive(Deserialize)]
pub struct ActivityListQuery {
    pub day: Option<i64>,
}

// -- Responses --

#[derive(Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub sections: Vec<Section>,
    pub activities: Vec<Activity>,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/{id}",
            get(get_trip).put(update_trip).delete(delete_trip),
        )
        .route(
            "/trips/{id}/sections",
            get(list_sections).post(add_section),
        )
        .route(
            "/trips/{id}/sections/{section_id}",
            axum::routing::put(update_section).delete(delete_section),
        )
        .route(
            "/trips/{id}/activities",
            get(list_activities).post(add_activity),
        )
        .route("/trips/{id}/itinerary", get(get_itinerary))
}

// -- Trip handlers --

async fn list_trips(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TripListQuery>,
) -> AppResult<Response> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            TripStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid status filter: {}", raw)))?,
        ),
        None => None,
    };

    let conn = state.db.get()?;
    let trips = repository::list_trips(&conn, &user.id, status)?;
    Ok(Json(trips).into_response())
}

async fn create_trip(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateTripRequest>,
) -> AppResult<Response> {
    let destination = required_text(req.destination, "destination")?;
    let start_date = required_date(req.start_date, "startDate")?;
    let end_date = required_date(req.end_date, "endDate")?;
    let budget = match &req.budget {
        Some(value) => parse_money("budget", value)?,
        None => None,
    };

    let trip = Trip {
        id: uuid::Uuid::now_v7().to_string(),
        title: req
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "New Trip".to_string()),
        destination,
        start_date,
        end_date,
        budget,
        status: TripStatus::Planning,
        image: req.image,
        overview: req.overview,
        user_id: user.id,
        created_at: String::new(),
    };

    let conn = state.db.get()?;
    repository::insert_trip(&conn, &trip)?;
    let stored = repository::find_owned_trip(&conn, &trip.user_id, &trip.id)?;

    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

async fn get_trip(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let trip = repository::find_owned_trip(&conn, &user.id, &id)?;
    let sections = repository::list_sections(&conn, &trip.id)?;
    let activities = repository::list_activities(&conn, &trip.id, None)?;

    Ok(Json(TripDetail {
        trip,
        sections,
        activities,
    })
    .into_response())
}

async fn update_trip(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTripRequest>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let mut trip = repository::find_owned_trip(&conn, &user.id, &id)?;

    if let Some(title) = req.title {
        trip.title = title;
    }
    if let Some(destination) = req.destination {
        trip.destination = destination;
    }
    if let Some(start_date) = req.start_date {
        trip.start_date = valid_date(start_date, "startDate")?;
    }
    if let Some(end_date) = req.end_date {
        trip.end_date = valid_date(end_date, "endDate")?;
    }
    if let Some(budget) = &req.budget {
        trip.budget = parse_money("budget", budget)?;
    }
    if let Some(raw) = req.status.as_deref() {
        trip.status = TripStatus::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Invalid status: {}", raw)))?;
    }
    if let Some(image) = req.image {
        trip.image = Some(image);
    }
    if let Some(overview) = req.overview {
        trip.overview = Some(overview);
    }

    repository::save_trip(&conn, &trip)?;
    Ok(Json(trip).into_response())
}

async fn delete_trip(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    repository::delete_trip(&conn, &user.id, &id)?;
    Ok(Json(serde_json::json!({ "message": "Trip deleted" })).into_response())
}

// -- Section handlers --

async fn list_sections(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let trip = repository::find_owned_trip(&conn, &user.id, &id)?;
    let sections = repository::list_sections(&conn, &trip.id)?;
    Ok(Json(sections).into_response())
}

async fn add_section(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CreateSectionRequest>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let trip = repository::find_owned_trip(&conn, &user.id, &id)?;

    let title = required_text(req.title, "title")?;
    let day = req
        .day
        .ok_or_else(|| AppError::Validation("day is required".into()))?;
    let budget = match &req.budget {
        Some(value) => parse_money("budget", value)?,
        None => None,
    };

    let section = Section {
        id: uuid::Uuid::now_v7().to_string(),
        title,
        day,
        location: req.location,
        start_date: req.start_date,
        end_date: req.end_date,
        budget,
        notes: req.notes,
        trip_id: trip.id,
        created_at: String::new(),
    };
    repository::insert_section(&conn, &section)?;
    let stored = repository::find_owned_section(&conn, &user.id, &section.id)?;

    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

async fn update_section(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_trip_id, section_id)): Path<(String, String)>,
    Json(req): Json<UpdateSectionRequest>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let mut section = repository::find_owned_section(&conn, &user.id, &section_id)?;

    if let Some(title) = req.title {
        section.title = title;
    }
    if let Some(day) = req.day {
        section.day = day;
    }
    if let Some(location) = req.location {
        section.location = Some(location);
    }
    if let Some(start_date) = req.start_date {
        section.start_date = Some(start_date);
    }
    if let Some(end_date) = req.end_date {
        section.end_date = Some(end_date);
    }
    if let Some(budget) = &req.budget {
        section.budget = parse_money("budget", budget)?;
    }
    if let Some(notes) = req.notes {
        section.notes = Some(notes);
    }

    repository::save_section(&conn, &section)?;
    Ok(Json(section).into_response())
}

async fn delete_section(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((_trip_id, section_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    repository::delete_section(&conn, &user.id, &section_id)?;
    Ok(Json(serde_json::json!({ "message": "Section deleted" })).into_response())
}

// -- Activity handlers --

async fn list_activities(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<ActivityListQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let trip = repository::find_owned_trip(&conn, &user.id, &id)?;
    let activities = repository::list_activities(&conn, &trip.id, query.day)?;
    Ok(Json(activities).into_response())
}

async fn add_activity(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CreateActivityRequest>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let trip = repository::find_owned_trip(&conn, &user.id, &id)?;

    let name = required_text(req.name, "name")?;
    let day = req
        .day
        .ok_or_else(|| AppError::Validation("day is required".into()))?;
    let cost = match &req.cost {
        Some(value) => parse_money("cost", value)?,
        None => None,
    };

    let activity = Activity {
        id: uuid::Uuid::now_v7().to_string(),
        day,
        time: req.time,
        name,
        kind: req.kind,
        location: req.location,
        cost,
        duration: req.duration,
        trip_id: trip.id,
        created_at: String::new(),
    };
    repository::insert_activity(&conn, &activity)?;
    let stored = repository::find_activity(&conn, &activity.trip_id, &activity.id)?;

    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

// -- Itinerary --

async fn get_itinerary(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let trip = repository::find_owned_trip(&conn, &user.id, &id)?;
    let activities = repository::list_activities(&conn, &trip.id, None)?;
    Ok(Json(build_itinerary(&trip.id, activities)).into_response())
}

// -- Validation helpers --

fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

fn valid_date(value: String, field: &str) -> AppResult<String> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} must be a YYYY-MM-DD date", field)))?;
    Ok(value)
}

fn required_date(value: Option<String>, field: &str) -> AppResult<String> {
    valid_date(required_text(value, field)?, field)
}
