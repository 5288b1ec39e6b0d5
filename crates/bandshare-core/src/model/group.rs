use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{GroupId, LocationId, UserId};
use crate::validation::{self, Validate, ValidationErrors};

pub const NAME_MAX_LEN: usize = 256;
pub const DESCRIPTION_MAX_LEN: usize = 1024;
pub const BIO_MAX_LEN: usize = 8192;
pub const ROLE_MAX_LEN: usize = 64;

/// A band or ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub bio: String,

    /// Defaults to the day the group was created.
    pub started_date: NaiveDate,

    pub location: Option<LocationId>,

    /// The user who created the group. Deleting that user deletes the group.
    pub created_by: UserId,

    /// The current owner. Cleared when the owning user is deleted.
    pub owned_by: Option<UserId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// A new group owned by its creator.
    #[must_use]
    pub fn new(name: impl Into<String>, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::new(),
            name: name.into(),
            description: String::new(),
            bio: String::new(),
            started_date: now.date_naive(),
            location: None,
            created_by,
            owned_by: Some(created_by),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    #[must_use]
    pub fn with_started_date(mut self, started: NaiveDate) -> Self {
        self.started_date = started;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owned_by = Some(owner);
        self
    }

    /// The owning user, falling back to the creator when no owner is set.
    pub fn owner(&self) -> UserId {
        self.owned_by.unwrap_or(self.created_by)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Validate for Group {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "name", &self.name, NAME_MAX_LEN);
        validation::max_length(&mut errors, "description", &self.description, DESCRIPTION_MAX_LEN);
        validation::max_length(&mut errors, "bio", &self.bio, BIO_MAX_LEN);
        errors
    }
}

/// A user's membership in a group, with the role they play there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub group: GroupId,
    pub member: UserId,

    /// Free-form role label ("Drummer", "Banjoist"). Empty when unknown.
    pub role: String,
}

impl Membership {
    #[must_use]
    pub fn new(group: GroupId, member: UserId, role: impl Into<String>) -> Self {
        Self {
            group,
            member,
            role: role.into(),
        }
    }
}

impl Validate for Membership {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::max_length(&mut errors, "role", &self.role, ROLE_MAX_LEN);
        errors
    }
}
