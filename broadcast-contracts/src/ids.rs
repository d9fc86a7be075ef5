//! Small newtypes for the identifiers that flow between crates. Kept as
//! thin wrappers rather than bare `String`/`u32` so the compiler catches a
//! channel number passed where a show id was expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A positive channel number a viewer dials.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChannelNumber(pub u32);

impl fmt::Display for ChannelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ChannelNumber(s.trim().parse()?))
    }
}

/// An uppercase station identifier selecting an index and playback rules.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Station(pub String);

impl Station {
    /// `true` for MTV or MTV followed by exactly four digits (`MTV1996`).
    pub fn is_mtv_family(&self) -> bool {
        let s = self.0.as_str();
        if s == "MTV" {
            return true;
        }
        s.strip_prefix("MTV")
            .is_some_and(|rest| rest.len() == 4 && rest.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Station {
    fn from(s: &str) -> Self {
        Station(s.to_ascii_uppercase())
    }
}

/// Show identifier. `SIGNOFF`/`SIGNON` are reserved pseudo-shows that have
/// no backing directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowId(pub String);

impl ShowId {
    pub const SIGNOFF: &'static str = "SIGNOFF";
    pub const SIGNON: &'static str = "SIGNON";

    pub fn is_signoff(&self) -> bool {
        self.0 == Self::SIGNOFF
    }

    pub fn is_signon(&self) -> bool {
        self.0 == Self::SIGNON
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
