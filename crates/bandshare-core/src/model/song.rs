use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
use crate::model::ids::SongId;
use crate::validation::{self, Validate, ValidationErrors};

pub const TITLE_MAX_LEN: usize = 256;

pub const MIN_BPM: u16 = 40;
pub const MAX_BPM: u16 = 300;
pub const DEFAULT_BPM: u16 = 120;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(3 * 60);
pub const MAX_DURATION: Duration = Duration::from_secs(60 * 60);

/// The key a song is written in.
///
/// Stored as the short symbol (`"B♭"`, `"C♯m"`); `Unspecified` is stored as
/// the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicalKey {
    #[default]
    Unspecified,
    AMajor,
    BFlatMajor,
    BMajor,
    CMajor,
    DFlatMajor,
    DMajor,
    EFlatMajor,
    EMajor,
    FMajor,
    FSharpMajor,
    GMajor,
    AFlatMajor,
    AMinor,
    BFlatMinor,
    BMinor,
    CMinor,
    CSharpMinor,
    DMinor,
    DSharpMinor,
    EMinor,
    FMinor,
    FSharpMinor,
    GMinor,
    GSharpMinor,
}

/// (variant, stored symbol, label)
const KEYS: &[(MusicalKey, &str, &str)] = &[
    (MusicalKey::Unspecified, "", "Not Specified"),
    (MusicalKey::AMajor, "A", "A Major"),
    (MusicalKey::BFlatMajor, "B♭", "B♭ Major"),
    (MusicalKey::BMajor, "B", "B Major"),
    (MusicalKey::CMajor, "C", "C Major"),
    (MusicalKey::DFlatMajor, "D♭", "D♭ Major"),
    (MusicalKey::DMajor, "D", "D Major"),
    (MusicalKey::EFlatMajor, "E♭", "E♭ Major"),
    (MusicalKey::EMajor, "E", "E Major"),
    (MusicalKey::FMajor, "F", "F Major"),
    (MusicalKey::FSharpMajor, "F♯", "F♯ Major"),
    (MusicalKey::GMajor, "G", "G Major"),
    (MusicalKey::AFlatMajor, "A♭", "A♭ Major"),
    (MusicalKey::AMinor, "Am", "A Minor"),
    (MusicalKey::BFlatMinor, "B♭m", "B♭ Minor"),
    (MusicalKey::BMinor, "Bm", "B Minor"),
    (MusicalKey::CMinor, "Cm", "C Minor"),
    (MusicalKey::CSharpMinor, "C♯m", "C♯ Minor"),
    (MusicalKey::DMinor, "Dm", "D Minor"),
    (MusicalKey::DSharpMinor, "D♯m", "D♯ Minor"),
    (MusicalKey::EMinor, "Em", "E Minor"),
    (MusicalKey::FMinor, "Fm", "F Minor"),
    (MusicalKey::FSharpMinor, "F♯m", "F♯ Minor"),
    (MusicalKey::GMinor, "Gm", "G Minor"),
    (MusicalKey::GSharpMinor, "G♯m", "G♯ Minor"),
];

impl MusicalKey {
    /// Every key, `Unspecified` first.
    pub fn all() -> impl Iterator<Item = Self> {
        KEYS.iter().map(|&(key, _, _)| key)
    }

    /// The stored symbol.
    pub fn as_str(self) -> &'static str {
        KEYS.iter()
            .find(|&&(key, _, _)| key == self)
            .map(|&(_, symbol, _)| symbol)
            .unwrap_or("")
    }

    /// Human-readable name, e.g. "F♯ Minor".
    pub fn label(self) -> &'static str {
        KEYS.iter()
            .find(|&&(key, _, _)| key == self)
            .map(|&(_, _, label)| label)
            .unwrap_or("Not Specified")
    }

    pub fn is_minor(self) -> bool {
        self.as_str().ends_with('m')
    }
}

impl FromStr for MusicalKey {
    type Err = Error;

    /// Parse a stored symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KEYS.iter()
            .find(|&&(_, symbol, _)| symbol == s)
            .map(|&(key, _, _)| key)
            .ok_or_else(|| Error::InvalidData(format!("unknown musical key {:?}", s)))
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The meter of a song. `Unspecified` is stored as the empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSignature {
    #[default]
    Unspecified,
    TwoTwo,
    TwoFour,
    ThreeFour,
    FourFour,
    SixEight,
    NineEight,
    TwelveEight,
    FiveFour,
}

const SIGNATURES: &[(TimeSignature, &str)] = &[
    (TimeSignature::Unspecified, ""),
    (TimeSignature::TwoTwo, "2/2"),
    (TimeSignature::TwoFour, "2/4"),
    (TimeSignature::ThreeFour, "3/4"),
    (TimeSignature::FourFour, "4/4"),
    (TimeSignature::SixEight, "6/8"),
    (TimeSignature::NineEight, "9/8"),
    (TimeSignature::TwelveEight, "12/8"),
    (TimeSignature::FiveFour, "5/4"),
];

impl TimeSignature {
    pub fn all() -> impl Iterator<Item = Self> {
        SIGNATURES.iter().map(|&(signature, _)| signature)
    }

    pub fn as_str(self) -> &'static str {
        SIGNATURES
            .iter()
            .find(|&&(signature, _)| signature == self)
            .map(|&(_, symbol)| symbol)
            .unwrap_or("")
    }
}

impl FromStr for TimeSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SIGNATURES
            .iter()
            .find(|&&(_, symbol)| symbol == s)
            .map(|&(signature, _)| signature)
            .ok_or_else(|| Error::InvalidData(format!("unknown time signature {:?}", s)))
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => f.write_str("Not Specified"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A song in a group's repertoire.
///
/// Genres and artists are many-to-many relations; see
/// [`crate::schema::relations::SONG_GENRES`] and
/// [`crate::schema::relations::SONG_ARTISTS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub musical_key: MusicalKey,
    pub time_signature: TimeSignature,

    /// Tempo in beats per minute, `MIN_BPM..=MAX_BPM`.
    pub bpm: u16,

    /// Running time, at most `MAX_DURATION`.
    pub duration: Duration,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SongId::new(),
            title: title.into(),
            release_date: None,
            musical_key: MusicalKey::default(),
            time_signature: TimeSignature::default(),
            bpm: DEFAULT_BPM,
            duration: DEFAULT_DURATION,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: MusicalKey) -> Self {
        self.musical_key = key;
        self
    }

    #[must_use]
    pub fn with_time_signature(mut self, signature: TimeSignature) -> Self {
        self.time_signature = signature;
        self
    }

    #[must_use]
    pub fn with_bpm(mut self, bpm: u16) -> Self {
        self.bpm = bpm;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// The running time as `M:SS`.
    pub fn length(&self) -> String {
        format_length(self.duration)
    }
}

fn format_length(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Validate for Song {
    fn clean_fields(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        validation::required_text(&mut errors, "title", &self.title, TITLE_MAX_LEN);
        validation::in_range(&mut errors, "bpm", self.bpm, MIN_BPM, MAX_BPM);
        if self.duration > MAX_DURATION {
            errors.add(
                "duration",
                format!(
                    "Ensure this value is less than or equal to {}.",
                    format_length(MAX_DURATION)
                ),
            );
        }
        errors
    }
}
