use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

define_id!(UserId, "Unique identifier for a user profile.");
define_id!(GroupId, "Unique identifier for a band or ensemble.");
define_id!(GenreId, "Unique identifier for a genre tag.");
define_id!(InstrumentId, "Unique identifier for an instrument tag.");
define_id!(LocationId, "Unique identifier for a postal location.");
define_id!(ArtistId, "Unique identifier for a recording artist.");
define_id!(SongId, "Unique identifier for a song.");
define_id!(SetlistId, "Unique identifier for a setlist.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_generation() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_id_parses_its_display_form() {
        let id = GroupId::new();
        let parsed: GroupId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<SongId>().is_err());
    }

    #[test]
    fn test_id_from_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(*GenreId::from_uuid(uuid).as_uuid(), uuid);
    }
}
