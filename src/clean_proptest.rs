//! Property-based tests for the keep-list cleaner and path helpers.
//!
//! These tests use proptest to generate random trees and keep lists and
//! verify that the cleaner's invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::clean::check_and_clean;
    use crate::path::{encode_url_path, normalize_relative};
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use walkdir::WalkDir;

    /// Relative file paths of one to three short components.
    fn tree_strategy() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(
            prop::collection::vec("[a-d]{1,2}", 1..=3).prop_map(|parts| parts.join("/")),
            1..12,
        )
    }

    /// A tree plus a subset of its files to keep.
    fn tree_and_keep() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
        tree_strategy()
            .prop_map(|files| {
                // A path cannot be both a file and a directory.
                let all: Vec<String> = files.iter().cloned().collect();
                all.iter()
                    .filter(|f| !all.iter().any(|o| o.starts_with(&format!("{}/", f))))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .prop_flat_map(|files| {
                let len = files.len();
                (
                    Just(files),
                    prop::collection::vec(any::<bool>(), len..=len),
                )
            })
            .prop_map(|(files, mask)| {
                let keep = files
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| *keep)
                    .map(|(f, _)| f.clone())
                    .collect();
                (files, keep)
            })
    }

    fn materialize(root: &Path, files: &[String]) {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, file.as_bytes()).unwrap();
        }
    }

    fn listing(root: &Path) -> BTreeSet<PathBuf> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    proptest! {
        /// Property: kept files and all their ancestors survive cleaning
        #[test]
        fn kept_paths_and_ancestors_survive((files, keep) in tree_and_keep()) {
            let temp = TempDir::new().unwrap();
            materialize(temp.path(), &files);

            check_and_clean(temp.path(), &keep).unwrap();

            for kept in &keep {
                let mut path = temp.path().join(kept);
                prop_assert!(path.is_file(), "{} was removed", kept);
                while path.pop() && path.starts_with(temp.path()) {
                    prop_assert!(path.is_dir());
                }
            }
        }

        /// Property: nothing that is not kept survives as a file
        #[test]
        fn unkept_files_are_removed((files, keep) in tree_and_keep()) {
            let temp = TempDir::new().unwrap();
            materialize(temp.path(), &files);

            check_and_clean(temp.path(), &keep).unwrap();

            for file in files.iter().filter(|f| !keep.contains(f)) {
                prop_assert!(!temp.path().join(file).exists(), "{} survived", file);
            }
        }

        /// Property: cleaning twice leaves the same tree as cleaning once
        #[test]
        fn clean_is_idempotent((files, keep) in tree_and_keep()) {
            let temp = TempDir::new().unwrap();
            materialize(temp.path(), &files);

            check_and_clean(temp.path(), &keep).unwrap();
            let once = listing(temp.path());
            check_and_clean(temp.path(), &keep).unwrap();
            let twice = listing(temp.path());

            prop_assert_eq!(once, twice);
        }
    }

    proptest! {
        /// Property: normalization is idempotent
        #[test]
        fn normalize_relative_is_idempotent(parts in prop::collection::vec("[a-z]{1,3}|\\.", 0..6)) {
            let path = PathBuf::from(parts.join("/"));
            let once = normalize_relative(&path);
            prop_assert_eq!(normalize_relative(&once), once.clone());
        }

        /// Property: encode_url_path never produces filesystem-unsafe characters
        #[test]
        fn encode_url_path_never_produces_unsafe_chars(input in ".*") {
            let result = encode_url_path(&input);
            let unsafe_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
            for ch in unsafe_chars {
                prop_assert!(
                    !result.contains(ch),
                    "encode_url_path produced unsafe character '{}' from input '{}'",
                    ch,
                    input
                );
            }
        }

        /// Property: encode_url_path preserves alphanumeric characters
        #[test]
        fn encode_url_path_preserves_alphanumeric(input in "[a-zA-Z0-9]+") {
            let result = encode_url_path(&input);
            prop_assert_eq!(result, input);
        }
    }
}
