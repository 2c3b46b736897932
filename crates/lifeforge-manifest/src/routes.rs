//! Route registry: the host frontend's persisted navigation structure.
//!
//! An ordered list of categories, each holding opaque module references of
//! the form `@apps/<ModuleName>`. Stored as JSON at a fixed path under the
//! frontend tree and always rewritten whole — the registry is a structured
//! document, never patched as source text.

use crate::errors::RoutesError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the registry relative to the frontend root.
const ROUTES_FILE: &str = "src/core/routes/routes.json";

/// One navigation category and the module references it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCategory {
    pub title: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// The module reference was appended to the category.
    Added,
    /// The category already carried the reference; registry unchanged.
    Already,
}

/// The full ordered registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteRegistry {
    pub categories: Vec<RouteCategory>,
}

impl RouteRegistry {
    /// Path of the registry file under a frontend checkout.
    pub fn locate(frontend_root: &Path) -> PathBuf {
        frontend_root.join(ROUTES_FILE)
    }

    /// Load the registry, failing with the resolved path if it is absent.
    pub fn load_from_path(path: &Path) -> Result<Self, RoutesError> {
        if !path.exists() {
            return Err(RoutesError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the registry with an atomic write (temp file, then rename) so a
    /// crash mid-write never leaves a truncated document behind.
    pub fn save_to_path(&self, path: &Path) -> Result<(), RoutesError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;

        let temp_path = path.with_extension("json.tmp");
        {
            let file = std::fs::File::create(&temp_path)?;
            let mut writer = std::io::BufWriter::new(file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
        }
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Category titles, sorted for selection prompts.
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.title.clone())
            .filter(|t| !t.is_empty())
            .collect();
        titles.sort();
        titles
    }

    /// Module names referenced anywhere in the registry, sorted.
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .categories
            .iter()
            .flat_map(|c| c.items.iter())
            .filter_map(|item| item.strip_prefix("@apps/"))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// The reference form a module takes inside `items`.
    pub fn module_ref(module_name: &str) -> String {
        format!("@apps/{}", module_name)
    }

    /// Append `@apps/<module_name>` to the named category.
    ///
    /// Registering a module that is already present in the category is an
    /// idempotent no-op, not an error. A missing category is an error: the
    /// surrounding flow offered the registry's own titles, so absence means
    /// the file changed underneath us.
    pub fn register_module(
        &mut self,
        category_title: &str,
        module_name: &str,
    ) -> Result<Registered, RoutesError> {
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.title == category_title)
            .ok_or_else(|| RoutesError::CategoryNotFound(category_title.to_string()))?;

        let module_ref = Self::module_ref(module_name);
        if category.items.contains(&module_ref) {
            debug!("Module '{}' already registered in '{}'", module_name, category_title);
            return Ok(Registered::Already);
        }

        category.items.push(module_ref);
        debug!("Registered module '{}' under '{}'", module_name, category_title);
        Ok(Registered::Added)
    }
}
