//! Structure selectors and the registry they resolve against

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use super::placement::{ConcentricRings, Placement, RandomSpread, SpreadType};
use crate::constants::DEFAULT_NAMESPACE;
use crate::types::StructureKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid character {1:?} in selector `{0}`")]
    InvalidCharacter(String, char),
    #[error("unknown structure tag `{0}`")]
    UnknownTag(String),
    #[error("no structure set places `{0}`")]
    Unplaceable(String),
}

/// `namespace:path` or `#namespace:path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Kind(StructureKind),
    Tag(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let raw = raw.trim();
        let (is_tag, body) = match raw.strip_prefix('#') {
            Some(body) => (true, body),
            None => (false, raw),
        };
        if body.is_empty() {
            return Err(SelectorError::Empty);
        }

        let id = match body.split_once(':') {
            Some((namespace, path)) => {
                if namespace.is_empty() || path.is_empty() {
                    return Err(SelectorError::Empty);
                }
                validate(raw, namespace, false)?;
                validate(raw, path, true)?;
                body.to_string()
            }
            None => {
                validate(raw, body, true)?;
                format!("{DEFAULT_NAMESPACE}:{body}")
            }
        };

        Ok(if is_tag {
            Selector::Tag(id)
        } else {
            Selector::Kind(StructureKind(id))
        })
    }
}

fn validate(raw: &str, part: &str, allow_slash: bool) -> Result<(), SelectorError> {
    match part.chars().find(|&c| {
        !(c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || matches!(c, '_' | '.' | '-')
            || (allow_slash && c == '/'))
    }) {
        Some(bad) => Err(SelectorError::InvalidCharacter(raw.to_string(), bad)),
        None => Ok(()),
    }
}

/// A group of structure types sharing one placement
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSet {
    pub name: String,
    pub placement: Placement,
    pub kinds: Vec<StructureKind>,
}

#[derive(Debug, Clone, Default)]
pub struct StructureRegistry {
    sets: Vec<StructureSet>,
    tags: HashMap<String, Vec<StructureKind>>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(mut self, set: StructureSet) -> Self {
        self.sets.push(set);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>, kinds: Vec<StructureKind>) -> Self {
        self.tags.insert(tag.into(), kinds);
        self
    }

    pub fn sets(&self) -> &[StructureSet] {
        &self.sets
    }

    fn is_placeable(&self, kind: &StructureKind) -> bool {
        self.sets.iter().any(|set| set.kinds.contains(kind))
    }

    /// Expand one selector into the structure types it names
    pub fn resolve(&self, selector: &Selector) -> Result<Vec<StructureKind>, SelectorError> {
        match selector {
            Selector::Kind(kind) => {
                if self.is_placeable(kind) {
                    Ok(vec![kind.clone()])
                } else {
                    Err(SelectorError::Unplaceable(kind.to_string()))
                }
            }
            Selector::Tag(tag) => {
                let kinds = self
                    .tags
                    .get(tag)
                    .ok_or_else(|| SelectorError::UnknownTag(tag.clone()))?;
                let placeable: Vec<StructureKind> =
                    kinds.iter().filter(|k| self.is_placeable(k)).cloned().collect();
                if placeable.is_empty() {
                    return Err(SelectorError::Unplaceable(format!("#{tag}")));
                }
                Ok(placeable)
            }
        }
    }

    /// Parse and expand raw selectors, logging and skipping the bad ones
    pub fn resolve_all<S: AsRef<str>>(&self, selectors: &[S]) -> BTreeSet<StructureKind> {
        let mut kinds = BTreeSet::new();
        for raw in selectors {
            let raw = raw.as_ref();
            match Selector::parse(raw).and_then(|s| self.resolve(&s)) {
                Ok(resolved) => kinds.extend(resolved),
                Err(err) => bevy::log::warn!("Skipping structure selector `{}`: {}", raw, err),
            }
        }
        kinds
    }

    /// Overworld-like defaults: spread-out villages and ringed strongholds
    pub fn vanilla() -> Self {
        let villages: Vec<StructureKind> = ["plains", "desert", "savanna", "snowy", "taiga"]
            .iter()
            .map(|biome| StructureKind(format!("minecraft:village_{biome}")))
            .collect();
        let stronghold = StructureKind::new("minecraft:stronghold");

        Self::new()
            .with_set(StructureSet {
                name: "minecraft:villages".to_string(),
                placement: Placement::RandomSpread(RandomSpread {
                    spacing: 34,
                    separation: 8,
                    salt: 10_387_312,
                    spread: SpreadType::Linear,
                }),
                kinds: villages.clone(),
            })
            .with_set(StructureSet {
                name: "minecraft:strongholds".to_string(),
                placement: Placement::ConcentricRings(ConcentricRings {
                    distance: 32,
                    count: 128,
                    spread: 3,
                }),
                kinds: vec![stronghold.clone()],
            })
            .with_tag("minecraft:village", villages)
            .with_tag("minecraft:eye_of_ender_located", vec![stronghold])
    }
}
