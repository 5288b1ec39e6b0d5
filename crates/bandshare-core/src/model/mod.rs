pub mod artist;
pub mod genre;
pub mod group;
pub mod ids;
pub mod instrument;
pub mod location;
pub mod setlist;
pub mod song;
pub mod user;

pub use artist::Artist;
pub use genre::Genre;
pub use group::{Group, Membership};
pub use ids::{ArtistId, GenreId, GroupId, InstrumentId, LocationId, SetlistId, SongId, UserId};
pub use instrument::Instrument;
pub use location::Location;
pub use setlist::Setlist;
pub use song::{MusicalKey, Song, TimeSignature};
pub use user::User;
