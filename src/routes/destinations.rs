use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Curated destination catalog. Suggestions are static slices of this
/// list; there is no ranking model behind them.
#[derive(Debug, Clone, Serialize)]
pub struct Destination {
    pub id: u32,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub image: &'static str,
    pub rating: f64,
}

const DESTINATIONS: &[Destination] = &[
    Destination {
        id: 1,
        name: "Paris, France",
        kind: "destination",
        image: "https://via.placeholder.com/300",
        rating: 4.8,
    },
    Destination {
        id: 2,
        name: "Tokyo, Japan",
        kind: "destination",
        image: "https://via.placeholder.com/300",
        rating: 4.9,
    },
    Destination {
        id: 3,
        name: "New York, USA",
        kind: "destination",
        image: "https://via.placeholder.com/300",
        rating: 4.7,
    },
    Destination {
        id: 4,
        name: "Santorini, Greece",
        kind: "destination",
        image: "https://via.placeholder.com/300",
        rating: 4.9,
    },
    Destination {
        id: 5,
        name: "Bali, Indonesia",
        kind: "destination",
        image: "https://via.placeholder.com/300",
        rating: 4.8,
    },
];

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/destinations/regional", get(regional))
        .route("/destinations/suggested", get(suggested))
        .route("/search", get(search))
}

async fn regional() -> Response {
    Json(&DESTINATIONS[..3]).into_response()
}

async fn suggested() -> Response {
    Json(&DESTINATIONS[2..]).into_response()
}

async fn search(Query(query): Query<SearchQuery>) -> Response {
    Json(filter_destinations(query.q.as_deref(), query.kind.as_deref())).into_response()
}

fn filter_destinations(q: Option<&str>, kind: Option<&str>) -> Vec<&'static Destination> {
    DESTINATIONS
        .iter()
        .filter(|d| match q {
            Some(q) => d.name.to_lowercase().contains(&q.to_lowercase()),
            None => true,
        })
        .filter(|d| match kind {
            Some(kind) => d.kind == kind,
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_and_suggested_are_fixed_slices() {
        assert_eq!(DESTINATIONS[..3].len(), 3);
        assert_eq!(DESTINATIONS[2..].len(), 3);
    }

    #[test]
    fn search_matches_case_insensitively() {
        let results = filter_destinations(Some("tokyo"), None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Tokyo, Japan");
    }

    #[test]
    fn search_filters_by_type() {
        assert_eq!(filter_destinations(None, Some("destination")).len(), 5);
        assert!(filter_destinations(None, Some("hotel")).is_empty());
    }

    #[test]
    fn search_without_filters_returns_everything() {
        assert_eq!(filter_destinations(None, None).len(), 5);
    }
}
