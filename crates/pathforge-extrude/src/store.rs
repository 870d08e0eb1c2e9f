//! Template persistence.

use crate::template::Template;
use parking_lot::RwLock;
use pathforge_core::ExtrusionError;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Named template storage.
pub trait TemplateStore: Send + Sync {
    /// Load a template by name.
    fn load(&self, name: &str) -> Result<Template, ExtrusionError>;

    /// Store a template under its own name, replacing any previous one.
    fn save(&self, template: &Template) -> Result<(), ExtrusionError>;

    /// Names of all stored templates, sorted.
    fn names(&self) -> Vec<String>;
}

/// In-memory template store.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<BTreeMap<String, Template>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn load(&self, name: &str) -> Result<Template, ExtrusionError> {
        self.templates
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ExtrusionError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    fn save(&self, template: &Template) -> Result<(), ExtrusionError> {
        self.templates
            .write()
            .insert(template.name().to_string(), template.clone());
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        self.templates.read().keys().cloned().collect()
    }
}

/// Directory of pretty-printed `<name>.json` template files.
#[derive(Debug, Clone)]
pub struct JsonTemplateStore {
    dir: PathBuf,
}

impl JsonTemplateStore {
    /// Store rooted at a directory. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ExtrusionError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(storage_error(name, "invalid template name"));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

fn storage_error(name: &str, reason: impl ToString) -> ExtrusionError {
    ExtrusionError::TemplateStorage {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl TemplateStore for JsonTemplateStore {
    fn load(&self, name: &str) -> Result<Template, ExtrusionError> {
        let path = self.path_for(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ExtrusionError::TemplateNotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(storage_error(name, e)),
        };
        let template: Template =
            serde_json::from_str(&content).map_err(|e| storage_error(name, e))?;
        template.validate()?;
        tracing::debug!(name, path = %path.display(), "template loaded");
        Ok(template)
    }

    fn save(&self, template: &Template) -> Result<(), ExtrusionError> {
        let name = template.name();
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|e| storage_error(name, e))?;
        let content = serde_json::to_string_pretty(template).map_err(|e| storage_error(name, e))?;
        fs::write(&path, content).map_err(|e| storage_error(name, e))?;
        tracing::debug!(name, path = %path.display(), "template saved");
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "cannot list templates");
                }
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Slice;
    use pathforge_core::BlockState;

    fn road() -> Template {
        Template::new("road", 3, 1)
            .with_slice(Slice::filled(3, 1, BlockState::new("minecraft:stone")))
            .unwrap()
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTemplateStore::new();
        assert!(matches!(
            store.load("road"),
            Err(ExtrusionError::TemplateNotFound { .. })
        ));
        store.save(&road()).unwrap();
        assert_eq!(store.load("road").unwrap(), road());
        assert_eq!(store.names(), vec!["road".to_string()]);
    }

    #[test]
    fn test_json_store_rejects_path_names() {
        let store = JsonTemplateStore::new("/nonexistent");
        assert!(matches!(
            store.load("../etc"),
            Err(ExtrusionError::TemplateStorage { .. })
        ));
    }
}
