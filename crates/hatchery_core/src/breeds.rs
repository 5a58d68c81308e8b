//! Breed identifiers and the immutable breed registry.
//!
//! The registry is built once from [`BreedData`] and passed by reference
//! to everything that resolves breeds. Iteration order is registration
//! order; habitat scoring relies on it for first-wins tie breaking.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{BreedData, HabitatRule, ParticleStyle};
use crate::error::{HatcheryError, Result};
use crate::math::BlockPos;
use crate::world::HabitatQuery;

/// Validated breed identifier, optionally namespaced (`"dragonmounts:fire"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreedId(String);

impl BreedId {
    /// Parse an identifier.
    ///
    /// Returns `None` for empty or malformed ids: uppercase, whitespace,
    /// more than one `:`, or an empty namespace/path.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (namespace, path) = match raw.split_once(':') {
            Some((ns, path)) => (Some(ns), path),
            None => (None, raw),
        };

        if let Some(ns) = namespace {
            if ns.is_empty() || !ns.chars().all(is_namespace_char) {
                return None;
            }
        }
        if path.is_empty() || !path.chars().all(|c| is_namespace_char(c) || c == '/') {
            return None;
        }

        Some(Self(raw.to_string()))
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

impl fmt::Display for BreedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable breed record: identity, cosmetics and habitat rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breed {
    /// Identifier.
    pub id: BreedId,
    /// Primary color RGB.
    pub primary_color: [u8; 3],
    /// Secondary color RGB.
    pub secondary_color: [u8; 3],
    /// Egg particle style.
    pub particle: ParticleStyle,
    /// Habitat scoring rules.
    pub habitats: Vec<HabitatRule>,
}

impl Breed {
    /// Sum of this breed's habitat rule points at `pos`.
    pub fn habitat_points<Q: HabitatQuery + ?Sized>(&self, world: &Q, pos: BlockPos) -> u32 {
        self.habitats
            .iter()
            .fold(0u32, |acc, rule| acc.saturating_add(rule.points(world, pos)))
    }
}

impl TryFrom<BreedData> for Breed {
    type Error = HatcheryError;

    fn try_from(data: BreedData) -> Result<Self> {
        let id = BreedId::parse(&data.id).ok_or_else(|| HatcheryError::DataParseError {
            source_name: "breed".to_string(),
            message: format!("malformed breed id '{}'", data.id),
        })?;
        Ok(Self {
            id,
            primary_color: data.primary_color,
            secondary_color: data.secondary_color,
            particle: data.particle,
            habitats: data.habitats,
        })
    }
}

/// Registry of all known breeds.
#[derive(Debug, Clone)]
pub struct BreedRegistry {
    breeds: Vec<Breed>,
    index: HashMap<BreedId, usize>,
    default_index: usize,
}

impl BreedRegistry {
    /// Build a registry. `default_id` names the fallback breed used for
    /// fresh eggs and unresolvable ids; `None` picks the first breed.
    pub fn new(data: Vec<BreedData>, default_id: Option<&str>) -> Result<Self> {
        if data.is_empty() {
            return Err(HatcheryError::EmptyRegistry);
        }

        let mut breeds = Vec::with_capacity(data.len());
        let mut index = HashMap::with_capacity(data.len());
        for entry in data {
            let breed = Breed::try_from(entry)?;
            if index.contains_key(&breed.id) {
                return Err(HatcheryError::DuplicateBreed(breed.id.to_string()));
            }
            index.insert(breed.id.clone(), breeds.len());
            breeds.push(breed);
        }

        let default_index = match default_id {
            Some(id) => BreedId::parse(id)
                .and_then(|id| index.get(&id).copied())
                .ok_or_else(|| HatcheryError::UnknownBreed(id.to_string()))?,
            None => 0,
        };

        tracing::debug!(
            breeds = breeds.len(),
            default = %breeds[default_index].id,
            "Breed registry built"
        );

        Ok(Self {
            breeds,
            index,
            default_index,
        })
    }

    /// Parse a RON list of breeds (`[BreedData(..), ..]`), first is default.
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        let data: Vec<BreedData> =
            ron::from_str(text).map_err(|e| HatcheryError::DataParseError {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        Self::new(data, None)
    }

    /// Look up a breed by validated id.
    #[must_use]
    pub fn get(&self, id: &BreedId) -> Option<&Breed> {
        self.index.get(id).map(|&i| &self.breeds[i])
    }

    /// Resolve raw id text; malformed or unknown ids give `None`.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<&Breed> {
        BreedId::parse(raw).and_then(|id| self.get(&id))
    }

    /// Resolve raw id text, falling back to the default breed.
    #[must_use]
    pub fn read(&self, raw: &str) -> &Breed {
        self.resolve(raw).unwrap_or_else(|| self.default_breed())
    }

    /// Resolve raw id text, failing on unknown ids.
    pub fn require(&self, raw: &str) -> Result<&Breed> {
        self.resolve(raw)
            .ok_or_else(|| HatcheryError::UnknownBreed(raw.to_string()))
    }

    /// The fallback breed.
    #[must_use]
    pub fn default_breed(&self) -> &Breed {
        &self.breeds[self.default_index]
    }

    /// All breeds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Breed> {
        self.breeds.iter()
    }

    /// Number of registered breeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.breeds.len()
    }

    /// Always false; an empty registry cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: &str) -> BreedData {
        BreedData {
            id: id.to_string(),
            primary_color: [1, 2, 3],
            secondary_color: [4, 5, 6],
            particle: ParticleStyle::Dust,
            habitats: Vec::new(),
        }
    }

    #[test]
    fn test_parse_ids() {
        assert!(BreedId::parse("fire").is_some());
        assert!(BreedId::parse("dragonmounts:fire").is_some());
        assert!(BreedId::parse("mod:nested/path_1").is_some());
        assert!(BreedId::parse("").is_none());
        assert!(BreedId::parse("Fire").is_none());
        assert!(BreedId::parse("a:b:c").is_none());
        assert!(BreedId::parse(":fire").is_none());
        assert!(BreedId::parse("fire ").is_none());
    }

    #[test]
    fn test_registry_order_and_default() {
        let registry =
            BreedRegistry::new(vec![data("fire"), data("ice"), data("water")], Some("ice"))
                .unwrap();
        let order: Vec<_> = registry.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["fire", "ice", "water"]);
        assert_eq!(registry.default_breed().id.as_str(), "ice");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_resolve_and_read_fallback() {
        let registry = BreedRegistry::new(vec![data("fire"), data("ice")], None).unwrap();
        assert_eq!(registry.resolve("ice").unwrap().id.as_str(), "ice");
        assert!(registry.resolve("storm").is_none());
        assert!(registry.resolve("NOT VALID").is_none());
        assert_eq!(registry.read("storm").id.as_str(), "fire");
        assert!(matches!(
            registry.require("storm"),
            Err(HatcheryError::UnknownBreed(_))
        ));
    }

    #[test]
    fn test_registry_rejects_bad_input() {
        assert!(matches!(
            BreedRegistry::new(Vec::new(), None),
            Err(HatcheryError::EmptyRegistry)
        ));
        assert!(matches!(
            BreedRegistry::new(vec![data("fire"), data("fire")], None),
            Err(HatcheryError::DuplicateBreed(_))
        ));
        assert!(matches!(
            BreedRegistry::new(vec![data("fire")], Some("ice")),
            Err(HatcheryError::UnknownBreed(_))
        ));
        assert!(matches!(
            BreedRegistry::new(vec![data("Bad Id")], None),
            Err(HatcheryError::DataParseError { .. })
        ));
    }

    #[test]
    fn test_from_ron_list() {
        let registry = BreedRegistry::from_ron(
            "inline",
            r#"[
                BreedData(id: "fire", primary_color: (1, 1, 1), secondary_color: (2, 2, 2)),
                BreedData(id: "ice", primary_color: (3, 3, 3), secondary_color: (4, 4, 4)),
            ]"#,
        )
        .unwrap();
        assert_eq!(registry.default_breed().id.as_str(), "fire");
        assert_eq!(registry.get(&BreedId::parse("ice").unwrap()).unwrap().primary_color, [3, 3, 3]);
    }
}
