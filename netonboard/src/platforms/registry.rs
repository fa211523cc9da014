//! Registry of platform mappings.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};

use super::BUILTIN;
use crate::error::MappingError;
use crate::mapping::PlatformMapping;

/// Platform name to validated mapping.
///
/// The registry is built once, before any host is processed, and then shared
/// read-only by every extraction; mappings are handed out as `Arc`s so
/// worker tasks can hold them without borrowing the registry.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    platforms: IndexMap<String, Arc<PlatformMapping>>,
}

impl MappingRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in platforms.
    pub fn builtin() -> Result<Self, MappingError> {
        let mut registry = Self::new();
        for (name, text) in BUILTIN {
            registry.register(PlatformMapping::from_yaml_str(name, text)?)?;
        }
        Ok(registry)
    }

    /// Load every `.yml` / `.yaml` document in a directory, in file name order.
    ///
    /// Returns the number of platforms added. A platform already present is
    /// an error, so a directory cannot silently shadow a built-in mapping.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, MappingError> {
        let dir = dir.as_ref();
        let io_error = |source| MappingError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if is_yaml && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            debug!("Loading platform mapping {}", path.display());
            self.register(PlatformMapping::from_path(path)?)?;
        }
        info!(
            "Loaded {} platform mapping(s) from {}",
            paths.len(),
            dir.display()
        );
        Ok(paths.len())
    }

    /// Register a platform mapping.
    pub fn register(&mut self, mapping: PlatformMapping) -> Result<(), MappingError> {
        if self.platforms.contains_key(&mapping.platform) {
            return Err(MappingError::AlreadyRegistered {
                name: mapping.platform.clone(),
            });
        }
        self.platforms
            .insert(mapping.platform.clone(), Arc::new(mapping));
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<Arc<PlatformMapping>> {
        self.platforms.get(name).cloned()
    }

    /// Get a platform by name, failing if it is unknown.
    pub fn resolve(&self, name: &str) -> Result<Arc<PlatformMapping>, MappingError> {
        self.get(name).ok_or_else(|| MappingError::UnknownPlatform {
            name: name.to_string(),
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// List all registered platform names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
