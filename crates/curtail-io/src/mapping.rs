//! Entity-to-company mapping.
//!
//! An optional JSON file maps plant names to the company that reports them.
//! The file is either a flat object or nests the pairs under an
//! `entity_to_company` key. Absent file, absent key, or unmapped entity all
//! fall back to identity.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Pure lookup from entity id to company id, identity by default.
#[derive(Debug, Clone, Default)]
pub struct CompanyMap {
    map: HashMap<String, String>,
}

impl CompanyMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        CompanyMap {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a mapping file; a missing file yields the identity mapping.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(CompanyMap::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading mapping file '{}'", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("parsing mapping file '{}'", path.display()))?;
        let object = match value.get("entity_to_company") {
            Some(nested) => nested,
            None => &value,
        };
        let mut map = HashMap::new();
        if let Some(entries) = object.as_object() {
            for (entity, company) in entries {
                if let Some(company) = company.as_str() {
                    map.insert(entity.clone(), company.to_string());
                }
            }
        }
        Ok(CompanyMap { map })
    }

    /// Resolve an entity to its company; identity when unmapped.
    pub fn resolve<'a>(&'a self, entity: &'a str) -> &'a str {
        self.map.get(entity).map(String::as_str).unwrap_or(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
