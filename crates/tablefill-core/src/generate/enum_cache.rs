//! # Enum Catalog Cache
//!
//! Memoizes enum membership and enum labels per type name for the lifetime of
//! one fill run. The cache is owned by the `RowSynthesizer`, so separate runs
//! never share entries. A catalog provider is asked at most once per type name
//! for membership and at most once for labels.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::schema::introspect::EnumCatalogProvider;

#[derive(Debug, Default)]
pub struct EnumCache {
    membership: HashMap<String, bool>,
    labels: HashMap<String, Vec<String>>,
}

impl EnumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `type_name` is an enum, asking the provider on a cache miss.
    pub async fn is_enum<P: EnumCatalogProvider>(
        &mut self,
        provider: &P,
        type_name: &str,
    ) -> Result<bool> {
        if let Some(&known) = self.membership.get(type_name) {
            return Ok(known);
        }

        let found = provider.is_enum(type_name).await?;
        debug!("Enum membership for '{}': {}", type_name, found);
        self.membership.insert(type_name.to_string(), found);
        Ok(found)
    }

    /// Labels of the enum `type_name`, asking the provider on a cache miss.
    pub async fn labels<P: EnumCatalogProvider>(
        &mut self,
        provider: &P,
        type_name: &str,
    ) -> Result<&[String]> {
        if !self.labels.contains_key(type_name) {
            let labels = provider.enum_labels(type_name).await?;
            debug!("Enum '{}' has {} labels", type_name, labels.len());
            self.labels.insert(type_name.to_string(), labels);
        }

        Ok(self
            .labels
            .get(type_name)
            .map(|labels| labels.as_slice())
            .unwrap_or_default())
    }

    /// Number of type names with a cached membership answer.
    pub fn known_types(&self) -> usize {
        self.membership.len()
    }
}
