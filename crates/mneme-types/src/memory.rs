//! Memory types for mneme.
//!
//! Priority categories and per-call weights used to rank extracted memories,
//! and the statistics snapshot reported by the memory cache.

use serde::{Deserialize, Deserializer, Serialize};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Weight applied to a category the caller did not specify.
pub const DEFAULT_PRIORITY_WEIGHT: i64 = 3;

/// Category a memory can be prioritized by.
///
/// The set is closed: each category is bound to a fixed keyword list in the
/// ranker, so an unknown name can never silently become a zero-weight bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityCategory {
    Personal,
    Emotion,
    Work,
    Hobby,
}

impl PriorityCategory {
    /// All categories, in scoring order.
    pub const ALL: [PriorityCategory; 4] = [
        PriorityCategory::Personal,
        PriorityCategory::Emotion,
        PriorityCategory::Work,
        PriorityCategory::Hobby,
    ];
}

impl fmt::Display for PriorityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityCategory::Personal => write!(f, "personal"),
            PriorityCategory::Emotion => write!(f, "emotion"),
            PriorityCategory::Work => write!(f, "work"),
            PriorityCategory::Hobby => write!(f, "hobby"),
        }
    }
}

impl FromStr for PriorityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(PriorityCategory::Personal),
            "emotion" => Ok(PriorityCategory::Emotion),
            "work" => Ok(PriorityCategory::Work),
            "hobby" => Ok(PriorityCategory::Hobby),
            other => Err(format!("invalid priority category: '{other}'")),
        }
    }
}

/// Per-call integer weight for each priority category.
///
/// Categories without an explicit weight use [`DEFAULT_PRIORITY_WEIGHT`].
/// Weights are not bounded; 1-5 is the typical range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriorityWeights {
    weights: HashMap<PriorityCategory, i64>,
}

impl PriorityWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, category: PriorityCategory, weight: i64) -> Self {
        self.weights.insert(category, weight);
        self
    }

    pub fn set(&mut self, category: PriorityCategory, weight: i64) {
        self.weights.insert(category, weight);
    }

    /// Effective weight for `category`.
    pub fn weight(&self, category: PriorityCategory) -> i64 {
        self.weights
            .get(&category)
            .copied()
            .unwrap_or(DEFAULT_PRIORITY_WEIGHT)
    }

    /// Lenient parse from a JSON object such as `{"work": 5, "emotion": 1}`.
    ///
    /// Unknown category names and non-integer values are ignored, and a
    /// non-object value yields all-default weights.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut weights = Self::new();
        let Some(object) = value.as_object() else {
            return weights;
        };
        for (name, raw) in object {
            let (Ok(category), Some(weight)) = (name.parse::<PriorityCategory>(), raw.as_i64())
            else {
                continue;
            };
            weights.set(category, weight);
        }
        weights
    }
}

impl<'de> Deserialize<'de> for PriorityWeights {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// Snapshot of the memory cache state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently stored (expired entries not yet purged included).
    pub size: usize,
    pub max_size: usize,
    pub ttl_ms: u64,
    /// Byte length of all keys and memory strings held.
    pub approx_memory_bytes: usize,
    pub hits: u64,
    pub misses: u64,
}
