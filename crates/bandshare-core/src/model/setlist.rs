use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{GroupId, SetlistId};
use crate::validation::{self, Validate, ValidationErrors};

pub const TITLE_MAX_LEN: usize = 128;
pub const DESCRIPTION_MAX_LEN: usize = 512;

/// A group's list of songs for a performance.
///
/// Songs are kept in [`crate::schema::relations::SETLIST_SONGS`] and come
/// back in the order they were added. Deleting the owning group deletes
/// the setlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setlist {
    pub id: SetlistId,
    pub title: String,
    pub description: String,
    pub owner_group: GroupId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setlist {
    #[must_use]
    pub fn new(title: impl Into<String>, owner_group: GroupId) -> Self {
        let now = Utc::now();
        Self {
            id: SetlistId::new(),
            title: title.into(),
            description: String::new(),
            owner_group,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Display for Setlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Validate for Setlist {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "title", &self.title, TITLE_MAX_LEN);
        validation::max_length(&mut errors, "description", &self.description, DESCRIPTION_MAX_LEN);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setlist_new() {
        let group = GroupId::new();
        let setlist = Setlist::new("Friday at the Stumble Inn", group);
        assert_eq!(setlist.owner_group, group);
        assert!(setlist.description.is_empty());
        assert_eq!(setlist.validate(), Ok(()));
    }

    #[test]
    fn test_setlist_fields() {
        let setlist = Setlist::new("", GroupId::new()).with_description("d".repeat(513));
        let errors = setlist.clean_fields();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["description", "title"]);
    }
}
