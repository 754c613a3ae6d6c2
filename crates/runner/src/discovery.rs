//! Pattern script discovery.
//!
//! The catalog is laid out as `<n>-<category>/<framework>-examples/NN_name.py`,
//! with scripts optionally nested one or more folders deeper
//! (`3-intelligence/adk-examples/learning_agents/01_learning.py`).

use crate::RunnerError;
use patternlab_core::Framework;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One runnable pattern implementation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PatternScript {
    /// Path relative to the catalog root, `/`-separated. Sort key.
    pub relative: String,
    pub category: String,
    pub framework: Framework,
    #[serde(skip)]
    pub path: PathBuf,
}

impl PatternScript {
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }
}

/// Category and framework restrictions. Empty lists match everything.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    pub categories: Vec<String>,
    pub frameworks: Vec<Framework>,
}

impl DiscoveryFilter {
    /// Parse comma-separated category and framework lists.
    pub fn parse(categories: Option<&str>, frameworks: Option<&str>) -> Result<Self, RunnerError> {
        let split = |raw: Option<&str>| -> Vec<String> {
            raw.map(|r| {
                r.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
        };

        let frameworks = split(frameworks)
            .iter()
            .map(|f| f.parse::<Framework>().map_err(RunnerError::InvalidFilter))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            categories: split(categories),
            frameworks,
        })
    }

    /// A category filter matches the full directory name (`2-orchestration`),
    /// its number (`2`) or its name (`orchestration`).
    fn matches_category(&self, category: &str) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        let (number, name) = category.split_once('-').unwrap_or((category, category));
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category) || c == number || c.eq_ignore_ascii_case(name))
    }

    fn matches_framework(&self, framework: Framework) -> bool {
        self.frameworks.is_empty() || self.frameworks.contains(&framework)
    }
}

/// `1-foundational`, `4-production`, ...
pub fn is_category_dir(name: &str) -> bool {
    let digits = name.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && name[digits..].starts_with('-')
}

/// `01_simple_agent.py`; `__init__.py` and unnumbered helpers are not scripts.
pub fn is_pattern_script(name: &str) -> bool {
    let bytes = name.as_bytes();
    name.ends_with(".py")
        && bytes.len() > 6
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b'_'
}

/// Every pattern script under `root` that passes `filter`, sorted by path.
pub fn discover(root: &Path, filter: &DiscoveryFilter) -> Result<Vec<PatternScript>, RunnerError> {
    if !root.is_dir() {
        return Err(RunnerError::CatalogNotFound(root.to_path_buf()));
    }

    let mut scripts = Vec::new();
    for category_entry in read_dirs(root)? {
        let category = dir_name(&category_entry);
        if !is_category_dir(&category) || !filter.matches_category(&category) {
            continue;
        }

        for framework_entry in read_dirs(&category_entry)? {
            let Some(framework) = Framework::from_dir_name(&dir_name(&framework_entry)) else {
                continue;
            };
            if !filter.matches_framework(framework) {
                continue;
            }
            collect_scripts(root, &framework_entry, &category, framework, &mut scripts)?;
        }
    }

    scripts.sort();
    debug!(root = %root.display(), count = scripts.len(), "Discovered pattern scripts");
    Ok(scripts)
}

fn collect_scripts(
    root: &Path,
    dir: &Path,
    category: &str,
    framework: Framework,
    out: &mut Vec<PatternScript>,
) -> Result<(), RunnerError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = dir_name(&path);
        if name.starts_with('.') || name == "__pycache__" {
            continue;
        }

        if path.is_dir() {
            collect_scripts(root, &path, category, framework, out)?;
        } else if is_pattern_script(&name) {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(PatternScript {
                relative,
                category: category.to_string(),
                framework,
                path,
            });
        }
    }
    Ok(())
}

fn read_dirs(dir: &Path) -> Result<Vec<PathBuf>, RunnerError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "print('ok')\n").unwrap();
    }

    fn catalog() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "1-foundational/adk-examples/01_simple_agent.py");
        touch(root, "1-foundational/adk-examples/02_memory.py");
        touch(root, "1-foundational/adk-examples/__init__.py");
        touch(root, "1-foundational/crewai-examples/01_simple_agent.py");
        touch(root, "2-orchestration/shared-tools/common/blackboard.py");
        touch(root, "2-orchestration/crewai-examples/helpers.py");
        touch(root, "2-orchestration/crewai-examples/08_blackboard_pattern.py");
        touch(root, "3-intelligence/adk-examples/learning_agents/01_learning.py");
        touch(root, "3-intelligence/adk-examples/__pycache__/01_learning.py");
        touch(root, "shared-utilities/01_not_a_pattern.py");
        dir
    }

    #[test]
    fn name_rules() {
        assert!(is_category_dir("1-foundational"));
        assert!(is_category_dir("12-extra"));
        assert!(!is_category_dir("shared-utilities"));
        assert!(!is_category_dir("1foundational"));

        assert!(is_pattern_script("01_simple_agent.py"));
        assert!(!is_pattern_script("__init__.py"));
        assert!(!is_pattern_script("helpers.py"));
        assert!(!is_pattern_script("1_short.py"));
        assert!(!is_pattern_script("01_notes.txt"));
    }

    #[test]
    fn discovers_sorted_scripts() {
        let dir = catalog();
        let scripts = discover(dir.path(), &DiscoveryFilter::default()).unwrap();
        let relative: Vec<_> = scripts.iter().map(|s| s.relative.as_str()).collect();
        assert_eq!(
            relative,
            vec![
                "1-foundational/adk-examples/01_simple_agent.py",
                "1-foundational/adk-examples/02_memory.py",
                "1-foundational/crewai-examples/01_simple_agent.py",
                "2-orchestration/crewai-examples/08_blackboard_pattern.py",
                "3-intelligence/adk-examples/learning_agents/01_learning.py",
            ]
        );
        assert_eq!(scripts[2].framework, Framework::CrewAi);
        assert_eq!(scripts[4].category, "3-intelligence");
        assert_eq!(scripts[4].file_name(), "01_learning.py");
    }

    #[test]
    fn filters_by_category_and_framework() {
        let dir = catalog();
        let by_number = DiscoveryFilter::parse(Some("1"), Some("crewai")).unwrap();
        let scripts = discover(dir.path(), &by_number).unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].relative, "1-foundational/crewai-examples/01_simple_agent.py");

        let by_name = DiscoveryFilter::parse(Some("intelligence, orchestration"), None).unwrap();
        assert_eq!(discover(dir.path(), &by_name).unwrap().len(), 2);
    }

    #[test]
    fn bad_framework_filter_is_rejected() {
        assert!(matches!(
            DiscoveryFilter::parse(None, Some("adk,langgraph")),
            Err(RunnerError::InvalidFilter(_))
        ));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&missing, &DiscoveryFilter::default()),
            Err(RunnerError::CatalogNotFound(_))
        ));
    }
}
