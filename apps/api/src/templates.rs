//! Template Store: key → LaTeX text lookup, loaded once at startup and
//! shared read-only through `AppState`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: BTreeMap<String, String>,
}

impl TemplateStore {
    /// Reads every `*.tex` file under `dir` into memory, keyed by file stem.
    /// A missing or unreadable directory yields an empty store with a
    /// warning rather than a startup failure.
    pub fn load(dir: &Path) -> TemplateStore {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Template directory {} unavailable: {e}", dir.display());
                return TemplateStore::default();
            }
        };

        let mut templates = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("tex") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    templates.insert(stem.to_string(), content);
                }
                Err(e) => warn!("Skipping unreadable template {}: {e}", path.display()),
            }
        }

        info!(
            "Loaded {} LaTeX template(s) from {}",
            templates.len(),
            dir.display()
        );
        TemplateStore { templates }
    }

    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.templates.get(id).map(String::as_str)
    }

    /// Lookup with fallback to the first available template for unknown ids.
    /// Returns `None` only when the store is empty.
    pub fn lookup_or_first(&self, id: &str) -> Option<&str> {
        self.lookup(id)
            .or_else(|| self.templates.values().next().map(String::as_str))
    }

    pub fn list(&self) -> Vec<TemplateInfo> {
        self.templates
            .keys()
            .map(|id| TemplateInfo {
                id: id.clone(),
                name: title_case(id),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> TemplateStore {
        TemplateStore {
            templates: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
