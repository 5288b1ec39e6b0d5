use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{LocationId, UserId};
use crate::validation::{self, Validate, ValidationErrors};

pub const NAME_MAX_LEN: usize = 128;
pub const DESCRIPTION_MAX_LEN: usize = 1024;
pub const BIO_MAX_LEN: usize = 8192;

/// A musician's profile.
///
/// Group memberships, genres and instruments are many-to-many relations
/// kept in join tables; see [`crate::schema::relations`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,

    /// Nullable in storage, but required by validation.
    pub birth_date: Option<NaiveDate>,

    pub description: String,
    pub bio: String,
    pub location: Option<LocationId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            display_name: display_name.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date: None,
            description: String::new(),
            bio: String::new(),
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
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
    pub fn with_location(mut self, location: LocationId) -> Self {
        self.location = Some(location);
        self
    }

    /// First and last name separated by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whole years between the birth date and today (UTC).
    pub fn age(&self) -> Option<u32> {
        self.age_on(Utc::now().date_naive())
    }

    /// Whole years between the birth date and `today`.
    ///
    /// `None` when no birth date is set or it lies after `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|born| today.years_since(born))
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl Validate for User {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "display_name", &self.display_name, NAME_MAX_LEN);
        validation::required_text(&mut errors, "first_name", &self.first_name, NAME_MAX_LEN);
        validation::required_text(&mut errors, "last_name", &self.last_name, NAME_MAX_LEN);
        validation::required(&mut errors, "birth_date", self.birth_date.as_ref());
        validation::max_length(&mut errors, "description", &self.description, DESCRIPTION_MAX_LEN);
        validation::max_length(&mut errors, "bio", &self.bio, BIO_MAX_LEN);
        errors
    }
}
