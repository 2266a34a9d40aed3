use serde::{Deserialize, Serialize};

/// Trip lifecycle states. Stored as lowercase text, constrained by a CHECK
/// in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Planning,
    Upcoming,
    Ongoing,
    Completed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planning => "planning",
            TripStatus::Upcoming => "upcoming",
            TripStatus::Ongoing => "ongoing",
            TripStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(TripStatus::Planning),
            "upcoming" => Some(TripStatus::Upcoming),
            "ongoing" => Some(TripStatus::Ongoing),
            "completed" => Some(TripStatus::Completed),
            _ => None,
        }
    }
}

/// Full user row. The password hash stays server-side; handlers expose
/// `PublicUser` instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: Option<f64>,
    pub status: TripStatus,
    pub image: Option<String>,
    pub overview: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub day: i64,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
    pub trip_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub day: i64,
    pub time: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    pub cost: Option<f64>,
    pub duration: Option<String>,
    pub trip_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}
