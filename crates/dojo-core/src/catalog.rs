//! Mission catalog
//!
//! Owns the ordered mission list for a session. Construction validates the
//! content invariants once so the rest of the engine can index by id:
//! - at least one mission
//! - identifiers are exactly `1..=N` in order
//! - rewards, when authored, are positive
//! - the reference answer is distinguishable from the starting snippet

use crate::error::CatalogError;
use crate::mission::{Mission, MissionId};
use crate::normalize::normalize_loose;
use serde::Deserialize;
use std::path::Path;

const BUILTIN_TOML: &str = include_str!("../data/missions.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    missions: Vec<Mission>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonCatalog {
    Bare(Vec<Mission>),
    Wrapped(CatalogFile),
}

/// Validated, dense, 1-indexed mission list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    missions: Vec<Mission>,
}

impl Catalog {
    /// Validate and wrap a mission list
    ///
    /// # Errors
    /// Returns [`CatalogError`] if any catalog invariant is violated.
    pub fn from_missions(missions: Vec<Mission>) -> Result<Self, CatalogError> {
        if missions.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (position, mission) in missions.iter().enumerate() {
            let expected = u32::try_from(position + 1)
                .map(MissionId)
                .unwrap_or(MissionId(u32::MAX));
            if mission.id != expected {
                return Err(CatalogError::NonDenseId {
                    position,
                    expected,
                    found: mission.id,
                });
            }
            if mission.reward_points == Some(0) {
                return Err(CatalogError::ZeroReward(mission.id));
            }
            if normalize_loose(&mission.starting_snippet)
                == normalize_loose(&mission.reference_snippet)
            {
                return Err(CatalogError::ReferenceEqualsStart(mission.id));
            }
            if mission.has_empty_rule() {
                tracing::warn!(
                    mission = %mission.id,
                    "mission has no keyword rule; any edit will be accepted"
                );
            }
        }

        Ok(Self { missions })
    }

    /// Parse a `[[missions]]` TOML document
    ///
    /// # Errors
    /// Returns [`CatalogError`] on decode or validation failure.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::from_missions(file.missions)
    }

    /// Parse JSON, either a bare array or `{ "missions": [...] }`
    ///
    /// # Errors
    /// Returns [`CatalogError`] on decode or validation failure.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let missions = match serde_json::from_str(text)? {
            JsonCatalog::Bare(missions) => missions,
            JsonCatalog::Wrapped(file) => file.missions,
        };
        Self::from_missions(missions)
    }

    /// Load a catalog file, choosing the format by extension
    ///
    /// # Errors
    /// Returns [`CatalogError`] on IO, format or validation failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| CatalogError::io_error(path, e))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let catalog = match ext.as_str() {
            "toml" => Self::from_toml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
        };
        tracing::info!(path = %path.display(), missions = catalog.len(), "loaded mission catalog");
        Ok(catalog)
    }

    /// The catalog shipped with the crate
    ///
    /// # Errors
    /// Returns [`CatalogError`] only if the embedded content is corrupt.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_TOML)
    }

    /// Look up a mission
    #[inline]
    #[must_use]
    pub fn get(&self, id: MissionId) -> Option<&Mission> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.missions.get(index)
    }

    /// Whether `id` names a mission in this catalog
    #[inline]
    #[must_use]
    pub fn contains(&self, id: MissionId) -> bool {
        self.get(id).is_some()
    }

    /// Number of missions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.missions.len()
    }

    /// Always false for a constructed catalog
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    /// Identifier of the final mission
    #[inline]
    #[must_use]
    pub fn last_id(&self) -> MissionId {
        self.missions.last().map_or(MissionId::FIRST, |m| m.id)
    }

    /// Missions in order
    pub fn iter(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Mission;
    type IntoIter = std::slice::Iter<'a, Mission>;

    fn into_iter(self) -> Self::IntoIter {
        self.missions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission(id: u32) -> Mission {
        Mission::new(id, format!("m{id}"), "before", "after")
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 20);
        assert_eq!(catalog.last_id(), MissionId(20));
        let first = catalog.get(MissionId(1)).unwrap();
        assert_eq!(first.keywords, vec!["sort.reverse".to_string()]);
        assert_eq!(first.remove_keywords.len(), 2);
    }

    #[test]
    fn lookup_out_of_range() {
        let catalog = Catalog::from_missions(vec![mission(1), mission(2)]).unwrap();
        assert!(catalog.get(MissionId(0)).is_none());
        assert!(catalog.get(MissionId(3)).is_none());
        assert!(catalog.contains(MissionId(2)));
    }

    #[test]
    fn empty_catalog_rejected() {
        assert!(matches!(
            Catalog::from_missions(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn gap_in_ids_rejected() {
        let err = Catalog::from_missions(vec![mission(1), mission(3)]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::NonDenseId {
                position: 1,
                expected: MissionId(2),
                found: MissionId(3)
            }
        ));
    }

    #[test]
    fn zero_reward_rejected() {
        let err = Catalog::from_missions(vec![mission(1).with_reward(0)]).unwrap_err();
        assert!(matches!(err, CatalogError::ZeroReward(MissionId(1))));
    }

    #[test]
    fn indistinguishable_reference_rejected() {
        let bad = Mission::new(1, "t", "a  b", "a\nb");
        assert!(matches!(
            Catalog::from_missions(vec![bad]),
            Err(CatalogError::ReferenceEqualsStart(MissionId(1)))
        ));
    }

    #[test]
    fn json_bare_and_wrapped() {
        let bare = r#"[{"id":1,"title":"t","code":"a","correctCode":"b"}]"#;
        let wrapped = r#"{"missions":[{"id":1,"title":"t","starting_snippet":"a","reference_snippet":"b"}]}"#;
        assert_eq!(Catalog::from_json_str(bare).unwrap().len(), 1);
        assert_eq!(Catalog::from_json_str(wrapped).unwrap().len(), 1);
    }
}
