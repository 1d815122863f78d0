//! Catalog records: courses, events, groups and users.
//!
//! Every list and count field defaults to empty/zero when absent, so records
//! written by older tooling load fully initialized. Field names on the wire
//! are camelCase (`enrolledStudents`, `attendeeCount`, ...).

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::Model;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Course {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,
    pub price: f64,
    pub duration: String,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub enrolled_students: Vec<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub enrollment_count: u64,
}

impl Model for Course {
    const COLLECTION: &'static str = "courses";

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub organizer: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Capacity; `None` means unlimited.
    pub max_attendees: Option<u64>,
    pub attendees: Vec<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub attendee_count: u64,
}

impl Model for Event {
    const COLLECTION: &'static str = "events";

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Stored and returned, but joining does not consult it.
    pub is_private: bool,
    pub created_by: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub members: Vec<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub member_count: u64,
}

impl Model for Group {
    const COLLECTION: &'static str = "groups";

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub enrolled_courses: Vec<u64>,
    pub saved_events: Vec<u64>,
    pub joined_groups: Vec<u64>,
}

impl Model for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> u64 {
        self.id
    }
}

/// Counts written by older code could go negative; read those as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.max(0) as u64)
}
