//! Properties of snapshot diffs

use super::support::{build_tree, paths_strategy, pattern_strategy};
use setsync::diff;
use setsync::filter::FileSetFilter;

#[test]
fn test_diff_against_itself_is_empty() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&paths_strategy(), |paths| {
            let tree = build_tree(&paths, 1);
            let map = tree.flatten();
            assert!(diff::diff(&map, &map).is_empty());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_diff_partitions_keys() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&(paths_strategy(), paths_strategy()), |(old_paths, new_paths)| {
            let old_tree = build_tree(&old_paths, 1);
            let new_tree = build_tree(&new_paths, 2);
            let old = old_tree.flatten();
            let new = new_tree.flatten();
            let d = diff::diff(&old, &new);

            for key in d.added.keys() {
                assert!(new.contains_key(key) && !old.contains_key(key));
            }
            for key in d.removed.keys() {
                assert!(old.contains_key(key) && !new.contains_key(key));
            }
            for key in d.updated.keys() {
                assert!(old.contains_key(key) && new.contains_key(key));
                assert!(diff::is_updated(old[key], new[key]));
            }
            for key in old.keys().filter(|k| new.contains_key(*k)) {
                assert_eq!(d.updated.contains_key(key), diff::is_updated(old[key], new[key]));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_filtered_diff_is_sound() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(
            &(paths_strategy(), paths_strategy(), pattern_strategy()),
            |(old_paths, new_paths, patterns)| {
                let old_tree = build_tree(&old_paths, 1);
                let new_tree = build_tree(&new_paths, 2);
                let old = old_tree.flatten();
                let new = new_tree.flatten();
                let full = diff::diff(&old, &new);
                let filter = FileSetFilter::new(&patterns).unwrap();
                let filtered = full.filter(&filter);

                for (part, whole) in [
                    (&filtered.added, &full.added),
                    (&filtered.removed, &full.removed),
                    (&filtered.updated, &full.updated),
                ] {
                    for key in part.keys() {
                        assert!(whole.contains_key(key));
                        assert!(filter.matches(key));
                    }
                    for key in whole.keys() {
                        assert_eq!(part.contains_key(key), filter.matches(key));
                    }
                }
                Ok(())
            },
        )
        .unwrap();
}
