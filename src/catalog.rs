//! Catalog: creation and lookup of courses, events, groups and users.
//!
//! New records get `id = max(existing id) + 1` and always start with an empty
//! roster and a zero count; roster fields sent by a client are ignored.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::entities::{Course, Event, Group, User};
use crate::error::HubError;
use crate::model::{Model, ModelError, ModelStore, ModelsExt};

const MAX_CREATE_ATTEMPTS: usize = 5;

/// A model the catalog can look up by id.
pub trait CatalogEntry: Model {
    const NOT_FOUND: &'static str;
}

impl CatalogEntry for Course {
    const NOT_FOUND: &'static str = "Course not found";
}

impl CatalogEntry for Event {
    const NOT_FOUND: &'static str = "Event not found";
}

impl CatalogEntry for Group {
    const NOT_FOUND: &'static str = "Group not found";
}

impl CatalogEntry for User {
    const NOT_FOUND: &'static str = "User not found";
}

/// Client-supplied fields for a new record.
pub trait Draft: DeserializeOwned + Clone + Send + 'static {
    type Model: CatalogEntry;

    fn validate(&self) -> Result<(), HubError>;

    /// Build the record with its allocated id and an empty roster.
    fn into_model(self, id: u64) -> Self::Model;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub category: String,
    pub price: f64,
    pub duration: String,
    pub level: String,
    pub image_url: Option<String>,
}

impl Draft for CourseDraft {
    type Model = Course;

    fn validate(&self) -> Result<(), HubError> {
        require("title", &self.title)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(HubError::Validation("price must be zero or more".into()));
        }
        Ok(())
    }

    fn into_model(self, id: u64) -> Course {
        Course {
            id,
            title: self.title,
            description: self.description,
            instructor: self.instructor,
            category: self.category,
            price: self.price,
            duration: self.duration,
            level: self.level,
            image_url: self.image_url,
            enrolled_students: Vec::new(),
            enrollment_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub organizer: String,
    pub category: String,
    pub image_url: Option<String>,
    pub max_attendees: Option<u64>,
}

impl Draft for EventDraft {
    type Model = Event;

    fn validate(&self) -> Result<(), HubError> {
        require("title", &self.title)?;
        if self.max_attendees == Some(0) {
            return Err(HubError::Validation(
                "maxAttendees must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn into_model(self, id: u64) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            organizer: self.organizer,
            category: self.category,
            image_url: self.image_url,
            max_attendees: self.max_attendees,
            attendees: Vec::new(),
            attendee_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_private: bool,
    pub created_by: Option<u64>,
    pub image_url: Option<String>,
}

impl Draft for GroupDraft {
    type Model = Group;

    fn validate(&self) -> Result<(), HubError> {
        require("name", &self.name)
    }

    fn into_model(self, id: u64) -> Group {
        Group {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            is_private: self.is_private,
            created_by: self.created_by,
            image_url: self.image_url,
            members: Vec::new(),
            member_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
}

impl Draft for UserDraft {
    type Model = User;

    fn validate(&self) -> Result<(), HubError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(HubError::Validation("email must be an email address".into()));
        }
        Ok(())
    }

    fn into_model(self, id: u64) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            bio: self.bio,
            enrolled_courses: Vec::new(),
            saved_events: Vec::new(),
            joined_groups: Vec::new(),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), HubError> {
    if value.trim().is_empty() {
        return Err(HubError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Creation and lookup over a model store.
pub struct Catalog<S> {
    store: S,
}

impl<S: ModelStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate the draft and insert it under the next free id.
    ///
    /// Two concurrent creates can pick the same id; the loser's insert fails
    /// and it retries with a fresh id.
    pub fn create<D: Draft>(&self, draft: D) -> Result<D::Model, HubError> {
        draft.validate()?;

        let mut attempt = 1;
        loop {
            let id = self.store.next_id::<D::Model>()?;
            let model = draft.clone().into_model(id);
            match self.store.insert_model(&model) {
                Ok(versioned) => {
                    info!(collection = <D::Model as Model>::COLLECTION, id, "created");
                    return Ok(versioned.data);
                }
                Err(ModelError::AlreadyExists { .. }) if attempt < MAX_CREATE_ATTEMPTS => {
                    debug!(collection = <D::Model as Model>::COLLECTION, id, attempt, "id taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn get<M: CatalogEntry>(&self, id: u64) -> Result<M, HubError> {
        self.store
            .models::<M>()
            .load(id)?
            .ok_or_else(|| HubError::NotFound(M::NOT_FOUND.into()))
    }

    /// Every record of the type, ordered by id.
    pub fn list<M: CatalogEntry>(&self) -> Result<Vec<M>, HubError> {
        Ok(self.store.models::<M>().all()?)
    }
}
