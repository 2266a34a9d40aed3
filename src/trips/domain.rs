// Itinerary shaping and money normalization - pure, no side effects
use serde::Serialize;
use std::cmp::Ordering;

use crate::db::models::Activity;
use crate::error::AppError;

/// Day-grouped, time-ordered view of a trip's activities.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub trip_id: String,
    pub days: Vec<ItineraryDay>,
    pub total_cost: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub day: i64,
    pub activities: Vec<ItineraryActivity>,
    pub total_cost: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryActivity {
    pub id: String,
    pub title: String,
    pub location: Option<String>,
    pub start_time: Option<String>,
    /// Never derived from duration; the client renders duration as-is.
    pub end_time: Option<String>,
    pub cost: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub duration: Option<String>,
}

/// Group a trip's activities by day, ordered by (day, time-of-day) with
/// untimed activities sorting first within their day. Days come out in
/// ascending order regardless of insertion order. Costs sum with missing
/// cost treated as zero.
pub fn build_itinerary(trip_id: &str, mut activities: Vec<Activity>) -> Itinerary {
    activities.sort_by(compare_schedule);

    let mut days: Vec<ItineraryDay> = Vec::new();
    let mut total_cost = 0.0;

    for activity in activities {
        let cost = activity.cost.unwrap_or(0.0);
        total_cost += cost;

        let view = ItineraryActivity {
            id: activity.id,
            title: activity.name,
            location: activity.location,
            start_time: activity.time,
            end_time: None,
            cost: activity.cost,
            kind: activity.kind,
            duration: activity.duration,
        };

        match days.last_mut() {
            Some(current) if current.day == activity.day => {
                current.activities.push(view);
                current.total_cost += cost;
            }
            _ => days.push(ItineraryDay {
                day: activity.day,
                activities: vec![view],
                total_cost: cost,
            }),
        }
    }

    Itinerary {
        trip_id: trip_id.to_string(),
        days,
        total_cost,
    }
}

fn compare_schedule(a: &Activity, b: &Activity) -> Ordering {
    a.day.cmp(&b.day).then_with(|| match (&a.time, &b.time) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
    })
}

/// Normalize a money field from JSON. Legacy clients send strings like
/// "$2,500" where newer ones send plain numbers; either is accepted and
/// stored numerically. Anything unparsable is a validation failure rather
/// than a silent zero.
pub fn parse_money(field: &str, value: &serde_json::Value) -> Result<Option<f64>, AppError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid {} value", field))),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned
                .parse::<f64>()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Invalid {} value", field)))
        }
        _ => Err(AppError::Validation(format!("Invalid {} value", field))),
    }
}
