//! Canonical workspace layout contracts for bddrun artifacts.

use bddrun_schema::feature::Bucket;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Directory names under the workspace root.
pub const DIR_BDD_TESTS: &str = "bdd_tests";
pub const DIR_FUNCTIONAL: &str = "functional";
pub const DIR_NON_FUNCTIONAL: &str = "non_functional";
pub const DIR_OPENAPI_OUTPUT: &str = "output";

pub const FEATURE_EXTENSION: &str = "feature";
pub const FILE_EXECUTION_REPORT_JSON: &str = "execution.report.json";
pub const FILE_EXECUTION_REPORT_MD: &str = "execution.report.md";

/// Paths for one bddrun workspace.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `bdd_tests/`
    pub fn bdd_tests(&self) -> PathBuf {
        self.root.join(DIR_BDD_TESTS)
    }

    /// `bdd_tests/functional/` or `bdd_tests/non_functional/`
    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.bdd_tests().join(bucket_dir_name(bucket))
    }

    /// `bdd_tests/<bucket>/<slug>.feature`
    pub fn bucket_feature(&self, bucket: Bucket, slug: &str) -> PathBuf {
        self.bucket_dir(bucket).join(feature_file_name(slug))
    }

    /// `bdd_tests/<slug>.feature`
    pub fn saved_feature(&self, slug: &str) -> PathBuf {
        self.bdd_tests().join(feature_file_name(slug))
    }

    /// `output/`, where the API description is looked up by default.
    pub fn openapi_dir(&self) -> PathBuf {
        self.root.join(DIR_OPENAPI_OUTPUT)
    }

    /// `bdd_tests/execution.report.json`
    pub fn report_json(&self) -> PathBuf {
        self.bdd_tests().join(FILE_EXECUTION_REPORT_JSON)
    }

    /// `bdd_tests/execution.report.md`
    pub fn report_md(&self) -> PathBuf {
        self.bdd_tests().join(FILE_EXECUTION_REPORT_MD)
    }
}

pub fn bucket_dir_name(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Functional => DIR_FUNCTIONAL,
        Bucket::NonFunctional => DIR_NON_FUNCTIONAL,
    }
}

pub fn feature_file_name(slug: &str) -> String {
    format!("{slug}.{FEATURE_EXTENSION}")
}

pub fn is_feature_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION)
}

/// File-name slug for a feature title.
///
/// Lowercased, whitespace runs and path separators become `_`.
/// An empty result falls back to `feature_<index>`.
pub fn feature_slug(title: &str, index: usize) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('_');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if c == '/' || c == '\\' {
            slug.push('_');
        } else {
            slug.extend(c.to_lowercase());
        }
    }
    if slug.is_empty() {
        format!("feature_{index}")
    } else {
        slug
    }
}

/// Hands out slugs, suffixing repeats with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct SlugAllocator {
    used: HashSet<String>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, title: &str, index: usize) -> String {
        let base = feature_slug(title, index);
        if self.used.insert(base.clone()) {
            return base;
        }
        // A literal title such as "users_2" may already hold a suffixed slug.
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn workspace_paths_are_stable() {
        let paths = WorkspacePaths::new("/tmp/ws");
        assert_eq!(paths.bdd_tests(), PathBuf::from("/tmp/ws/bdd_tests"));
        assert_eq!(
            paths.bucket_feature(Bucket::Functional, "users"),
            PathBuf::from("/tmp/ws/bdd_tests/functional/users.feature")
        );
        assert_eq!(
            paths.bucket_feature(Bucket::NonFunctional, "users"),
            PathBuf::from("/tmp/ws/bdd_tests/non_functional/users.feature")
        );
        assert_eq!(
            paths.saved_feature("users"),
            PathBuf::from("/tmp/ws/bdd_tests/users.feature")
        );
        assert_eq!(paths.openapi_dir(), PathBuf::from("/tmp/ws/output"));
        assert_eq!(
            paths.report_json(),
            PathBuf::from("/tmp/ws/bdd_tests/execution.report.json")
        );
    }

    #[test]
    fn slug_lowercases_and_collapses_whitespace() {
        assert_eq!(feature_slug("User  Management API", 0), "user_management_api");
        assert_eq!(feature_slug("  Orders\t\tv2 ", 0), "orders_v2");
    }

    #[test]
    fn slug_replaces_path_separators() {
        assert_eq!(feature_slug("Users/Admin\\Roles", 0), "users_admin_roles");
    }

    #[test]
    fn empty_slug_uses_index() {
        assert_eq!(feature_slug("", 3), "feature_3");
        assert_eq!(feature_slug("   ", 0), "feature_0");
    }

    #[test]
    fn allocator_suffixes_duplicates() {
        let mut slugs = SlugAllocator::new();
        assert_eq!(slugs.allocate("Users", 0), "users");
        assert_eq!(slugs.allocate("users", 1), "users_2");
        assert_eq!(slugs.allocate("USERS", 2), "users_3");
        assert_eq!(slugs.allocate("Orders", 3), "orders");
    }

    #[test]
    fn allocator_avoids_literal_suffix_collisions() {
        let mut slugs = SlugAllocator::new();
        assert_eq!(slugs.allocate("users_2", 0), "users_2");
        assert_eq!(slugs.allocate("users", 1), "users");
        assert_eq!(slugs.allocate("users", 2), "users_3");
    }

    #[test]
    fn feature_file_detection() {
        assert!(is_feature_file(Path::new("a/b.feature")));
        assert!(!is_feature_file(Path::new("a/b.feature.bak")));
        assert!(!is_feature_file(Path::new("a/feature")));
    }

    proptest! {
        #[test]
        fn slug_never_contains_separators_or_whitespace(title in ".{0,40}", index in 0usize..100) {
            let slug = feature_slug(&title, index);
            prop_assert!(!slug.is_empty());
            prop_assert!(!slug.contains('/'));
            prop_assert!(!slug.contains('\\'));
            prop_assert!(!slug.chars().any(char::is_whitespace));
        }

        #[test]
        fn allocated_slugs_are_unique(titles in prop::collection::vec("[a-c]{0,2}( [a-c])?", 0..12)) {
            let mut slugs = SlugAllocator::new();
            let mut all = std::collections::HashSet::new();
            for (i, t) in titles.iter().enumerate() {
                prop_assert!(all.insert(slugs.allocate(t, i)));
            }
        }
    }
}
