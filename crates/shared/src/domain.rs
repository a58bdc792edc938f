use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(SequenceId);

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback rate of a sequence: the delay between two frames in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Speed {
    Fast,
    #[default]
    Normal,
    Slow,
}

impl Speed {
    pub const ALL: [Speed; 3] = [Speed::Fast, Speed::Normal, Speed::Slow];

    pub fn millis(self) -> i64 {
        match self {
            Speed::Fast => 500,
            Speed::Normal => 1000,
            Speed::Slow => 2000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Speed::Fast => "Fast",
            Speed::Normal => "Normal",
            Speed::Slow => "Slow",
        }
    }

    pub fn from_millis(millis: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|speed| speed.millis() == millis)
    }

    /// Label for a raw speed key, or `None` when the key is not one of the three known rates.
    pub fn label_for(millis: i64) -> Option<&'static str> {
        Self::from_millis(millis).map(Speed::label)
    }

    /// Closest known speed to an arbitrary millisecond value. Ties go to the slower rate.
    pub fn constrain(millis: i64) -> Self {
        [Speed::Slow, Speed::Normal, Speed::Fast]
            .into_iter()
            .min_by_key(|speed| (i128::from(millis) - i128::from(speed.millis())).abs())
            .unwrap_or_default()
    }
}

impl From<Speed> for i64 {
    fn from(value: Speed) -> Self {
        value.millis()
    }
}

impl TryFrom<i64> for Speed {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Speed::from_millis(value).ok_or_else(|| format!("unknown speed: {value}"))
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered sequence names, indexed by [`SequenceId`]. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceCatalog {
    names: Vec<String>,
}

impl SequenceCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let names: Vec<String> = serde_json::from_str(raw.trim())?;
        Ok(Self { names })
    }

    /// Parses the catalog embedded in a host page. Never fails: malformed input yields an
    /// empty catalog so rendering can proceed.
    pub fn from_embedded(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(catalog) => catalog,
            Err(error) => {
                tracing::warn!(%error, "embedded sequence list is malformed; using empty catalog");
                Self::default()
            }
        }
    }

    pub fn name(&self, id: SequenceId) -> Option<&str> {
        usize::try_from(id.0)
            .ok()
            .and_then(|index| self.names.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SequenceId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (SequenceId(index as i64), name.as_str()))
    }

    /// Clamps an id into the catalog range. An empty catalog clamps everything to 0.
    pub fn constrain(&self, id: SequenceId) -> SequenceId {
        let max = self.names.len().saturating_sub(1) as i64;
        SequenceId(id.0.clamp(0, max))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.names).unwrap_or_else(|_| "[]".to_string())
    }
}
