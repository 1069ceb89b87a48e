//! Template gallery backing store.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::template::DocumentDescriptor;

const BUILTIN_TEMPLATES: &str = include_str!("../templates/builtin.json");

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TemplateEntry {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub premium: bool,
    pub template: DocumentDescriptor,
}

/// Anything that can hand out template descriptors by id or title.
pub trait TemplateSource {
    fn entries(&self) -> &[TemplateEntry];

    fn by_id(&self, id: u32) -> Option<&TemplateEntry> {
        self.entries().iter().find(|t| t.id == id)
    }

    /// Case-insensitive exact title match.
    fn by_title(&self, title: &str) -> Option<&TemplateEntry> {
        self.entries().iter().find(|t| t.title.eq_ignore_ascii_case(title))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
}

impl TemplateCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(TemplateCatalog { entries: serde_json::from_str(json)? })
    }

    /// Templates bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TEMPLATES)
    }

    pub fn insert(&mut self, entry: TemplateEntry) {
        self.entries.retain(|t| t.id != entry.id);
        self.entries.push(entry);
    }

    /// Entries whose title, category or tags contain `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&TemplateEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&query)
                    || t.category.to_lowercase().contains(&query)
                    || t.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }
}

impl TemplateSource for TemplateCatalog {
    fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = TemplateCatalog::builtin().unwrap();
        assert_eq!(catalog.entries().len(), 4);
        let sale = catalog.by_title("instagram post - summer sale").unwrap();
        assert_eq!(sale.id, 1);
        assert_eq!(sale.template.elements.len(), 5);
        assert_eq!(catalog.by_id(2).map(|t| t.template.height), Some(Some(1920)));
    }

    #[test]
    fn search_matches_tags() {
        let catalog = TemplateCatalog::builtin().unwrap();
        let hits: Vec<u32> = catalog.search("PARTY").iter().map(|t| t.id).collect();
        assert_eq!(hits, vec![4]);
    }
}
