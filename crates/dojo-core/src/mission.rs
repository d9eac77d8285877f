//! Mission content model
//!
//! A mission is immutable authored content: a flawed starting snippet, the
//! reference answer, and the keyword rule used to accept edits.

use serde::{Deserialize, Serialize};

/// Mission identifier (1-based, dense within a catalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(pub u32);

impl MissionId {
    /// The first mission of every catalog
    pub const FIRST: Self = Self(1);

    /// Identifier of the following mission
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for MissionId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for MissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MissionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// One training unit
///
/// Field aliases accept the camelCase names used by legacy content files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Position in the catalog
    pub id: MissionId,
    /// Short title
    pub title: String,
    /// What the learner must achieve
    #[serde(default)]
    pub objective: String,
    /// Hint text
    #[serde(default)]
    pub hint: String,
    /// Flawed snippet shown at the start
    #[serde(alias = "code")]
    pub starting_snippet: String,
    /// Reference answer
    #[serde(alias = "correctCode")]
    pub reference_snippet: String,
    /// Substrings every accepted answer must contain
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Substrings no accepted answer may contain
    #[serde(default, alias = "removeKeywords")]
    pub remove_keywords: Vec<String>,
    /// Explanation shown once the mission is resolved
    #[serde(default)]
    pub explanation: String,
    /// Points for an unassisted completion
    #[serde(
        default,
        alias = "rewardPoints",
        skip_serializing_if = "Option::is_none"
    )]
    pub reward_points: Option<u32>,
}

impl Mission {
    /// Create a mission with an empty keyword rule
    #[must_use]
    pub fn new(
        id: u32,
        title: impl Into<String>,
        starting_snippet: impl Into<String>,
        reference_snippet: impl Into<String>,
    ) -> Self {
        Self {
            id: MissionId(id),
            title: title.into(),
            objective: String::new(),
            hint: String::new(),
            starting_snippet: starting_snippet.into(),
            reference_snippet: reference_snippet.into(),
            keywords: Vec::new(),
            remove_keywords: Vec::new(),
            explanation: String::new(),
            reward_points: None,
        }
    }

    /// With required substrings
    #[must_use]
    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// With forbidden substrings
    #[must_use]
    pub fn with_remove_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.remove_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// With explicit reward
    #[inline]
    #[must_use]
    pub fn with_reward(mut self, points: u32) -> Self {
        self.reward_points = Some(points);
        self
    }

    /// Reward, falling back to `default` when unauthored
    #[inline]
    #[must_use]
    pub fn reward(&self, default: u32) -> u32 {
        self.reward_points.unwrap_or(default)
    }

    /// True when the mission has no keyword constraints at all
    #[inline]
    #[must_use]
    pub fn has_empty_rule(&self) -> bool {
        self.keywords.is_empty() && self.remove_keywords.is_empty()
    }
}
