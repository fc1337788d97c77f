//! Glob-based exclusion of resources from the global history.
//!
//! Patterns come from the workspace's merged file-exclude and
//! search-exclude configuration, a set per workspace root plus a
//! fallback set for resources outside every root.

use glob::Pattern;
use tracing::warn;

use crate::host::Workspace;
use crate::model::ResourceId;

/// Compiled exclusion globs, scoped per workspace root.
#[derive(Debug, Default)]
pub struct ExclusionFilter {
    per_root: Vec<(ResourceId, Vec<Pattern>)>,
    fallback: Vec<Pattern>,
}

impl ExclusionFilter {
    /// Compiles the workspace's current exclusion configuration.
    /// Invalid patterns are reported and skipped.
    pub fn build(workspace: &dyn Workspace) -> Self {
        let per_root = workspace
            .roots()
            .into_iter()
            .map(|root| {
                let patterns = compile(workspace.exclude_patterns(Some(&root)));
                (root, patterns)
            })
            .collect();
        let fallback = compile(workspace.exclude_patterns(None));
        Self { per_root, fallback }
    }

    /// Whether the resource is excluded from history.
    ///
    /// Resources inside workspace roots match every containing root's
    /// patterns against the respective root-relative path (nested roots
    /// are all consulted); resources outside all roots match the
    /// fallback patterns against the full path.
    pub fn excludes(&self, resource: &ResourceId) -> bool {
        let mut contained = false;
        for (root, patterns) in &self.per_root {
            if let Some(relative) = resource.path_relative_to(root) {
                contained = true;
                if patterns.iter().any(|pattern| pattern.matches(relative)) {
                    return true;
                }
            }
        }
        if contained {
            return false;
        }
        self.fallback
            .iter()
            .any(|pattern| pattern.matches(resource.path()))
    }
}

fn compile(patterns: Vec<String>) -> Vec<Pattern> {
    patterns
        .into_iter()
        .filter_map(|raw| match Pattern::new(&raw) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warn!(pattern = %raw, error = %err, "skipping invalid exclude pattern");
                None
            }
        })
        .collect()
}
