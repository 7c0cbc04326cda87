use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Semantic surface category assigned to a mesh face.
///
/// Discriminants match the values emitted by the scanning subsystem and are
/// used directly as slot indices in per-mesh submesh arrays.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticClass {
    Unknown = 0,
    Other = 1,
    Floor = 2,
    Ceiling = 3,
    Wall = 4,
    Table = 5,
    Seat = 6,
    Window = 7,
    Door = 8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown semantic class name `{0}`")]
pub struct ParseClassError(pub String);

impl SemanticClass {
    pub const COUNT: usize = 9;

    pub const ALL: [SemanticClass; SemanticClass::COUNT] = [
        SemanticClass::Unknown,
        SemanticClass::Other,
        SemanticClass::Floor,
        SemanticClass::Ceiling,
        SemanticClass::Wall,
        SemanticClass::Table,
        SemanticClass::Seat,
        SemanticClass::Window,
        SemanticClass::Door,
    ];

    /// Narrows a raw provider value; values outside 0..=8 name no class.
    #[inline]
    pub fn from_raw(raw: u32) -> Option<SemanticClass> {
        Self::ALL.get(raw as usize).copied()
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            SemanticClass::Unknown => "unknown",
            SemanticClass::Other => "other",
            SemanticClass::Floor => "floor",
            SemanticClass::Ceiling => "ceiling",
            SemanticClass::Wall => "wall",
            SemanticClass::Table => "table",
            SemanticClass::Seat => "seat",
            SemanticClass::Window => "window",
            SemanticClass::Door => "door",
        }
    }
}

impl fmt::Display for SemanticClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SemanticClass {
    type Err = ParseClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        // "none" is what older scanning SDKs call the unclassified bucket.
        if key == "none" {
            return Ok(SemanticClass::Unknown);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == key)
            .ok_or_else(|| ParseClassError(s.to_string()))
    }
}
