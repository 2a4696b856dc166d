//! # Shard Keys
//!
//! A shard is addressed by a `(country, location)` pair. Only India is
//! subdivided: a handful of states get their own shard and every other
//! Indian state lands in `IN/default`. The US and EU shards have no
//! location.

use crate::error::ShardError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Location code of the catch-all Indian shard.
pub const DEFAULT_LOCATION: &str = "default";

/// Indian states that own a dedicated shard, keyed by lower-cased state name.
pub const INDIA_STATES: [(&str, &str); 5] = [
    ("west bengal", "WB"),
    ("maharashtra", "MH"),
    ("tamil nadu", "TN"),
    ("delhi", "DL"),
    ("rajasthan", "RJ"),
];

/// Countries that have at least one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "IN")]
    In,
}

impl Country {
    pub fn code(self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Eu => "EU",
            Country::In => "IN",
        }
    }

    /// Case-insensitive lookup of a two-letter country code.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "US" => Some(Country::Us),
            "EU" => Some(Country::Eu),
            "IN" => Some(Country::In),
            _ => None,
        }
    }
}

impl Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = ShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Country::parse(s).ok_or_else(|| ShardError::InvalidQuery(format!("unknown country: {s}")))
    }
}

/// Identifies one shard.
///
/// Keys are `Copy` and only ever built from the static tables in this module,
/// so the set of keys in a running process is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShardKey {
    country: Country,
    location: Option<&'static str>,
}

impl ShardKey {
    pub const US: ShardKey = ShardKey::new(Country::Us, None);
    pub const EU: ShardKey = ShardKey::new(Country::Eu, None);
    pub const IN_DEFAULT: ShardKey = ShardKey::new(Country::In, Some(DEFAULT_LOCATION));

    /// Every known shard in the order the locator probes them.
    pub const CANDIDATES: [ShardKey; 8] = [
        ShardKey::US,
        ShardKey::EU,
        ShardKey::IN_DEFAULT,
        ShardKey::new(Country::In, Some("WB")),
        ShardKey::new(Country::In, Some("MH")),
        ShardKey::new(Country::In, Some("TN")),
        ShardKey::new(Country::In, Some("DL")),
        ShardKey::new(Country::In, Some("RJ")),
    ];

    const fn new(country: Country, location: Option<&'static str>) -> Self {
        Self { country, location }
    }

    /// The shard of an Indian state, given its two-letter code (e.g. `"WB"`).
    pub fn india_state(code: &str) -> Option<Self> {
        let code = code.trim();
        INDIA_STATES
            .iter()
            .find(|(_, c)| c.eq_ignore_ascii_case(code))
            .map(|(_, c)| ShardKey::new(Country::In, Some(*c)))
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn location(&self) -> Option<&'static str> {
        self.location
    }

    /// The shard every record of this key's country can fall back to.
    pub fn country_generic(&self) -> ShardKey {
        match self.country {
            Country::In => ShardKey::IN_DEFAULT,
            country => ShardKey::new(country, None),
        }
    }

    /// All shards belonging to `country`, in candidate order.
    pub fn for_country(country: Country) -> Vec<ShardKey> {
        ShardKey::CANDIDATES
            .iter()
            .copied()
            .filter(|key| key.country == country)
            .collect()
    }

    /// Lower-case identifier used inside generated record ids (`in-wb`).
    pub fn slug(&self) -> String {
        match self.location {
            Some(location) => format!("{}-{}", self.country.code(), location).to_ascii_lowercase(),
            None => self.country.code().to_ascii_lowercase(),
        }
    }
}

impl Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}/{}", self.country, location),
            None => write!(f, "{}", self.country),
        }
    }
}

/// Parses the `Display` form (`US`, `EU`, `IN/default`, `IN/WB`), ignoring
/// case.
impl FromStr for ShardKey {
    type Err = ShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (country, location) = match s.trim().split_once('/') {
            Some((country, location)) => (country, Some(location.trim())),
            None => (s.trim(), None),
        };
        let country: Country = country.parse()?;
        ShardKey::for_country(country)
            .into_iter()
            .find(|key| match (key.location, location) {
                (Some(own), Some(given)) => own.eq_ignore_ascii_case(given),
                (None, None) => true,
                _ => false,
            })
            .ok_or_else(|| ShardError::InvalidQuery(format!("unknown shard: {s}")))
    }
}

impl Serialize for ShardKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShardKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Looks up the location code for an Indian state name.
pub fn location_for_state(state: &str) -> Option<&'static str> {
    let state = state.trim().to_lowercase();
    INDIA_STATES
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, code)| *code)
}
