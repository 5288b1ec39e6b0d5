use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::ArtistId;
use crate::validation::{self, Validate, ValidationErrors};

pub const NAME_MAX_LEN: usize = 256;

/// A recording artist credited on songs. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artist {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ArtistId::new(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Validate for Artist {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "name", &self.name, NAME_MAX_LEN);
        errors
    }
}
