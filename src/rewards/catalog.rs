use super::data::{BUILTIN_REWARDS, DEFAULT_LOADOUT};
use super::types::{CatalogError, RewardCategory, RewardDescriptor, RewardTag};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read-only lookup over every known reward.
#[derive(Debug, Clone, Default)]
pub struct RewardCatalog {
    rewards: Vec<Arc<RewardDescriptor>>,
    by_tag: HashMap<RewardTag, usize>,
}

impl RewardCatalog {
    /// Validates each descriptor and rejects duplicate tags.
    pub fn from_descriptors(descriptors: Vec<RewardDescriptor>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for descriptor in descriptors {
            descriptor.validate()?;
            if catalog.by_tag.contains_key(&descriptor.tag) {
                return Err(CatalogError::Duplicate(descriptor.tag.to_string()));
            }
            catalog
                .by_tag
                .insert(descriptor.tag.clone(), catalog.rewards.len());
            catalog.rewards.push(Arc::new(descriptor));
        }
        Ok(catalog)
    }

    pub fn builtin() -> Self {
        let rewards: Vec<Arc<RewardDescriptor>> = BUILTIN_REWARDS
            .iter()
            .map(|def| Arc::new(def.to_descriptor()))
            .collect();
        let by_tag = rewards
            .iter()
            .enumerate()
            .map(|(i, reward)| (reward.tag.clone(), i))
            .collect();
        Self { rewards, by_tag }
    }

    /// Parses a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let descriptors: Vec<RewardDescriptor> = serde_json::from_str(json)?;
        Self::from_descriptors(descriptors)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn get(&self, tag: &RewardTag) -> Option<&Arc<RewardDescriptor>> {
        self.by_tag.get(tag).map(|&i| &self.rewards[i])
    }

    pub fn all(&self) -> &[Arc<RewardDescriptor>] {
        &self.rewards
    }

    pub fn by_category(&self, category: RewardCategory) -> Vec<Arc<RewardDescriptor>> {
        self.rewards
            .iter()
            .filter(|reward| reward.category == category)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Starting loadout for a fresh profile, skipping tags this catalog lacks.
    pub fn default_loadout(&self) -> Vec<Arc<RewardDescriptor>> {
        DEFAULT_LOADOUT
            .iter()
            .filter_map(|tag| self.get(&RewardTag::new(*tag)).cloned())
            .collect()
    }
}
