use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::LocationId;
use crate::validation::{self, Validate, ValidationErrors};

pub const DEFAULT_COUNTRY: &str = "United States of America";

pub const NAME_MAX_LEN: usize = 128;
pub const ADDRESS_MAX_LEN: usize = 256;
pub const REGION_MAX_LEN: usize = 64;
pub const POSTAL_CODE_MAX_LEN: usize = 10;

/// A postal location shared by users and groups.
///
/// The address tuple (address, city, state, postal code, country) is unique;
/// `name` is only a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Location {
    #[must_use]
    pub fn new(
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            id: LocationId::new(),
            name: String::new(),
            address: String::new(),
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{}, ", self.name)?;
        }
        if !self.address.is_empty() {
            write!(f, "{}, ", self.address)?;
        }
        write!(f, "{}, {} {}", self.city, self.state, self.postal_code)
    }
}

impl Validate for Location {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::max_length(&mut errors, "name", &self.name, NAME_MAX_LEN);
        validation::max_length(&mut errors, "address", &self.address, ADDRESS_MAX_LEN);
        validation::required_text(&mut errors, "city", &self.city, REGION_MAX_LEN);
        validation::required_text(&mut errors, "state", &self.state, REGION_MAX_LEN);
        validation::required_text(&mut errors, "postal_code", &self.postal_code, POSTAL_CODE_MAX_LEN);
        validation::required_text(&mut errors, "country", &self.country, REGION_MAX_LEN);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_defaults_country() {
        let location = Location::new("Scranton", "PA", "18503");
        assert_eq!(location.country, DEFAULT_COUNTRY);
        assert_eq!(location.validate(), Ok(()));
    }

    #[test]
    fn test_required_fields() {
        let mut location = Location::new("", "", "");
        location.country = String::new();
        let errors = location.clean_fields();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            ["city", "country", "postal_code", "state"]
        );
    }

    #[test]
    fn test_postal_code_length() {
        let location = Location::new("Scranton", "PA", "18503-12345");
        assert!(location.clean_fields().contains("postal_code"));
    }

    #[test]
    fn test_display() {
        let location = Location::new("Scranton", "PA", "18503")
            .with_name("Dunder Mifflin")
            .with_address("1725 Slough Avenue");
        assert_eq!(
            location.to_string(),
            "Dunder Mifflin, 1725 Slough Avenue, Scranton, PA 18503"
        );
    }
}
