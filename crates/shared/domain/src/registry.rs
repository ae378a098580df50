//! Path registry: one source selection and one output directory per [`Category`].

use crate::category::Category;
use crate::config::PipelineConfig;
use std::path::{Path, PathBuf};

/// Source selection for a category, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub pattern: String,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub category: Category,
    pub source: SourceSpec,
    /// Absolute (project-root joined) output directory.
    pub output_dir: PathBuf,
}

/// Read-only mapping from category to sources and outputs.
///
/// Exactly one entry exists per category; the registry cannot be mutated after construction.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    project_root: PathBuf,
    output_root: PathBuf,
    source_maps: String,
    entries: [RegistryEntry; 4],
}

impl PathRegistry {
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let project_root = config.project_root.clone();
        let paths = &config.paths;

        let entries = Category::ALL.map(|category| {
            let source = paths.source(category);
            RegistryEntry {
                category,
                source: SourceSpec { pattern: source.pattern.clone(), ignore: source.ignore.clone() },
                output_dir: project_root.join(paths.output.dir(category)),
            }
        });

        Self {
            output_root: project_root.join(&paths.output.root),
            source_maps: paths.output.source_maps.clone(),
            project_root,
            entries,
        }
    }

    #[must_use]
    pub const fn get(&self, category: Category) -> &RegistryEntry {
        &self.entries[category.index()]
    }

    #[must_use]
    pub const fn entries(&self) -> &[RegistryEntry; 4] {
        &self.entries
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Source map directory name, relative to a category output directory.
    #[must_use]
    pub fn source_maps(&self) -> &str {
        &self.source_maps
    }
}
