// Trip storage - every read and write on trips and their nested resources
// goes through the ownership checks in this module.
use rusqlite::{params, Connection, Row};

use crate::db::models::{Activity, Section, Trip, TripStatus};
use crate::error::{AppError, AppResult};

// -- Row mappers --

fn trip_from_row(row: &Row) -> rusqlite::Result<Trip> {
    let status: String = row.get(6)?;
    Ok(Trip {
        id: row.get(0)?,
        title: row.get(1)?,
        destination: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        budget: row.get(5)?,
        status: TripStatus::parse(&status).unwrap_or(TripStatus::Planning),
        image: row.get(7)?,
        overview: row.get(8)?,
        user_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn section_from_row(row: &Row) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get(0)?,
        title: row.get(1)?,
        day: row.get(2)?,
        location: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        budget: row.get(6)?,
        notes: row.get(7)?,
        trip_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        day: row.get(1)?,
        time: row.get(2)?,
        name: row.get(3)?,
        kind: row.get(4)?,
        location: row.get(5)?,
        cost: row.get(6)?,
        duration: row.get(7)?,
        trip_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const TRIP_COLUMNS: &str =
    "id, title, destination, start_date, end_date, budget, status, image, overview, user_id, created_at";
const SECTION_COLUMNS: &str =
    "id, title, day, location, start_date, end_date, budget, notes, trip_id, created_at";
const ACTIVITY_COLUMNS: &str =
    "id, day, time, name, type, location, cost, duration, trip_id, created_at";

// -- Ownership guard --

/// Look up a trip only if it is owned by the requester. A trip that does
/// not exist and a trip owned by someone else both come back as NotFound.
pub fn find_owned_trip(conn: &Connection, user_id: &str, trip_id: &str) -> AppResult<Trip> {
    conn.query_row(
        &format!("SELECT {} FROM trips WHERE id = ?1 AND user_id = ?2", TRIP_COLUMNS),
        params![trip_id, user_id],
        trip_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
        other => AppError::Database(other),
    })
}

/// Resolve a section through its parent trip, applying the same owner check.
pub fn find_owned_section(conn: &Connection, user_id: &str, section_id: &str) -> AppResult<Section> {
    conn.query_row(
        "SELECT s.id, s.title, s.day, s.location, s.start_date, s.end_date, s.budget, s.notes, s.trip_id, s.created_at
         FROM sections s
         JOIN trips t ON t.id = s.trip_id
         WHERE s.id = ?1 AND t.user_id = ?2",
        params![section_id, user_id],
        section_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
        other => AppError::Database(other),
    })
}

// -- Trips --

pub fn list_trips(
    conn: &Connection,
    user_id: &str,
    status: Option<TripStatus>,
) -> AppResult<Vec<Trip>> {
    let mut trips = Vec::new();
    match status {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM trips WHERE user_id = ?1 AND status = ?2 ORDER BY start_date ASC",
                TRIP_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id, status.as_str()], trip_from_row)?;
            for row in rows {
                trips.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM trips WHERE user_id = ?1 ORDER BY start_date ASC",
                TRIP_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id], trip_from_row)?;
            for row in rows {
                trips.push(row?);
            }
        }
    }
    Ok(trips)
}

pub fn insert_trip(conn: &Connection, trip: &Trip) -> AppResult<()> {
    conn.execute(
        "INSERT INTO trips (id, title, destination, start_date, end_date, budget, status, image, overview, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            trip.id,
            trip.title,
            trip.destination,
            trip.start_date,
            trip.end_date,
            trip.budget,
            trip.status.as_str(),
            trip.image,
            trip.overview,
            trip.user_id,
        ],
    )?;
    Ok(())
}

/// Persist the mutable fields of an already-authorized trip.
pub fn save_trip(conn: &Connection, trip: &Trip) -> AppResult<()> {
    conn.execute(
        "UPDATE trips SET title = ?2, destination = ?3, start_date = ?4, end_date = ?5,
                budget = ?6, status = ?7, image = ?8, overview = ?9
         WHERE id = ?1",
        params![
            trip.id,
            trip.title,
            trip.destination,
            trip.start_date,
            trip.end_date,
            trip.budget,
            trip.status.as_str(),
            trip.image,
            trip.overview,
        ],
    )?;
    Ok(())
}

/// Delete an owned trip. Sections and activities go with it via FK cascade,
/// so a crash mid-delete cannot leave orphans.
pub fn delete_trip(conn: &Connection, user_id: &str, trip_id: &str) -> AppResult<()> {
    find_owned_trip(conn, user_id, trip_id)?;
    conn.execute("DELETE FROM trips WHERE id = ?1", params![trip_id])?;
    Ok(())
}

// -- Sections --

pub fn list_sections(conn: &Connection, trip_id: &str) -> AppResult<Vec<Section>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sections WHERE trip_id = ?1 ORDER BY day ASC, created_at ASC",
        SECTION_COLUMNS
    ))?;
    let rows = stmt.query_map(params![trip_id], section_from_row)?;
    let mut sections = Vec::new();
    for row in rows {
        sections.push(row?);
    }
    Ok(sections)
}

pub fn insert_section(conn: &Connection, section: &Section) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sections (id, title, day, location, start_date, end_date, budget, notes, trip_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            section.id,
            section.title,
            section.day,
            section.location,
            section.start_date,
            section.end_date,
            section.budget,
            section.notes,
            section.trip_id,
        ],
    )?;
    Ok(())
}

pub fn save_section(conn: &Connection, section: &Section) -> AppResult<()> {
    conn.execute(
        "UPDATE sections SET title = ?2, day = ?3, location = ?4, start_date = ?5,
                end_date = ?6, budget = ?7, notes = ?8
         WHERE id = ?1",
        params![
            section.id,
            section.title,
            section.day,
            section.location,
            section.start_date,
            section.end_date,
            section.budget,
            section.notes,
        ],
    )?;
    Ok(())
}

pub fn delete_section(conn: &Connection, user_id: &str, section_id: &str) -> AppResult<()> {
    find_owned_section(conn, user_id, section_id)?;
    conn.execute("DELETE FROM sections WHERE id = ?1", params![section_id])?;
    Ok(())
}

// -- Activities --

pub fn list_activities(
    conn: &Connection,
    trip_id: &str,
    day: Option<i64>,
) -> AppResult<Vec<Activity>> {
    let mut activities = Vec::new();
    match day {
        Some(day) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM activities WHERE trip_id = ?1 AND day = ?2 ORDER BY day ASC, time ASC",
                ACTIVITY_COLUMNS
            ))?;
            let rows = stmt.query_map(params![trip_id, day], activity_from_row)?;
            for row in rows {
                activities.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM activities WHERE trip_id = ?1 ORDER BY day ASC, time ASC",
                ACTIVITY_COLUMNS
            ))?;
            let rows = stmt.query_map(params![trip_id], activity_from_row)?;
            for row in rows {
                activities.push(row?);
            }
        }
    }
    Ok(activities)
}

pub fn find_activity(conn: &Connection, trip_id: &str, activity_id: &str) -> AppResult<Activity> {
    conn.query_row(
        &format!(
            "SELECT {} FROM activities WHERE id = ?1 AND trip_id = ?2",
            ACTIVITY_COLUMNS
        ),
        params![activity_id, trip_id],
        activity_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
        other => AppError::Database(other),
    })
}

pub fn insert_activity(conn: &Connection, activity: &Activity) -> AppResult<()> {
    conn.execute(
        "INSERT INTO activities (id, day, time, name, type, location, cost, duration, trip_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            activity.id,
            activity.day,
            activity.time,
            activity.name,
            activity.kind,
            activity.location,
            activity.cost,
            activity.duration,
            activity.trip_id,
        ],
    )?;
    Ok(())
}
