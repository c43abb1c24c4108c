use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lead record as stored in `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub preferred_language: String,
    pub interest_score: i32,
    pub sentiment: String,
    pub phone_number: String,
    pub call_duration: i32,
    pub car_details: Option<String>, // serialized CarDetails
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime, // insertion order, never sent to clients
}

/// Vehicle the lead asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDetails {
    pub manufacturer: String,
    pub model: String,
    pub variant: String,
    pub year: String,
}

impl CarDetails {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A validated lead, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub preferred_language: String,
    pub interest_score: i32,
    pub sentiment: String,
    pub phone_number: String,
    pub call_duration: i32,
    pub car_details: Option<CarDetails>,
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub count: u64,
}
