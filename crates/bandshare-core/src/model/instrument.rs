use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::InstrumentId;
use crate::validation::{self, Validate, ValidationErrors};

pub const NAME_MAX_LEN: usize = 64;

/// An instrument a user plays. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub name: String,
}

impl Instrument {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: InstrumentId::new(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Validate for Instrument {
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
    fn test_instrument_new() {
        let banjo = Instrument::new("Banjo");
        assert_eq!(banjo.to_string(), "Banjo");
        assert_eq!(banjo.validate(), Ok(()));
    }

    #[test]
    fn test_instrument_name_length() {
        let instrument = Instrument::new("x".repeat(NAME_MAX_LEN + 1));
        assert!(instrument.clean_fields().contains("name"));
    }
}
