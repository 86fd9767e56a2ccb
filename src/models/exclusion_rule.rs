use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Ordered pair of line configurations identifying one changeover
/// transition. Rendered as `"{from}-{to}"`, which is also the form used as
/// the map key in the persisted rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    pub from_config: u32,
    pub to_config: u32,
}

impl TransitionKey {
    pub fn new(from_config: u32, to_config: u32) -> Self {
        Self {
            from_config,
            to_config,
        }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from_config, self.to_config)
    }
}

/// Whole exclusion rule table: transition key to the set of step ids
/// excluded for that transition. Always read and replaced as a whole; there
/// is no partial-key patch operation.
pub type ExclusionTable = BTreeMap<TransitionKey, BTreeSet<i64>>;

impl FromStr for TransitionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid transition key: {s}"))?;
        let from_config = from
            .parse()
            .map_err(|_| format!("Invalid source configuration in key: {s}"))?;
        let to_config = to
            .parse()
            .map_err(|_| format!("Invalid target configuration in key: {s}"))?;
        Ok(Self {
            from_config,
            to_config,
        })
    }
}

// Serialized as the "{from}-{to}" string so the table persists as a flat
// JSON object keyed per transition.
impl Serialize for TransitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TransitionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = TransitionKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a transition key of the form \"from-to\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}
