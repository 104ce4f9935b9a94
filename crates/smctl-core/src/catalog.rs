//! The set of resource provider types smctl knows about

use std::collections::BTreeSet;

/// Provider types every subscription may need
pub const DEFAULT_RESOURCE_TYPES: &[&str] = &[
    "CloudServices",
    "Storage",
    "Caching",
    "ServiceBus",
    "SqlAzure",
    "HDInsight",
    "MediaServices",
    "TrafficManager",
    "WebSites",
];

/// Known resource provider type names, sorted and deduplicated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeCatalog {
    types: BTreeSet<String>,
}

impl Default for ResourceTypeCatalog {
    fn default() -> Self {
        Self::from_types(DEFAULT_RESOURCE_TYPES.iter().copied())
    }
}

impl ResourceTypeCatalog {
    /// Catalog with exactly `types`; blank names are dropped
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Add more types to the catalog
    #[must_use]
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.types.extend(Self::from_types(types).types);
        self
    }

    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.types.iter().cloned().collect()
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.types.contains(resource_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
