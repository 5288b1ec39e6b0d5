use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::GenreId;
use crate::validation::{self, Validate, ValidationErrors};

pub const NAME_MAX_LEN: usize = 128;

/// A genre tag shared by users, groups and songs. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

impl Genre {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GenreId::new(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Validate for Genre {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "name", &self.name, NAME_MAX_LEN);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_new() {
        let genre = Genre::new("Pop");
        assert_eq!(genre.name, "Pop");
        assert_eq!(genre.validate(), Ok(()));
    }

    #[test]
    fn test_genre_name_required() {
        assert!(Genre::new("").clean_fields().contains("name"));
    }
}
