//! Property-based testing for sprig
//!
//! Uses proptest to verify invariants of the hasher, the staging area and
//! the repository store across randomly generated inputs.

use ::sprig::hash::digest_fields;
use ::sprig::*;
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;
use tempfile::TempDir;

/// A staging request against one path
#[derive(Debug, Clone)]
pub enum StagingOperation {
    Add(String),
    Remove { path: String, tracked: bool },
}

/// Short field lists; short alphabets make boundary collisions likely
fn fields_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[ab]{0,3}", 0..5)
}

/// Paths drawn from a small pool so operations hit the same path often
fn path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-c]".prop_map(|s| s),
        "dir/[a-c]\\.txt".prop_map(|s| s),
    ]
}

fn staging_operation_strategy() -> impl Strategy<Value = StagingOperation> {
    prop_oneof![
        path_strategy().prop_map(StagingOperation::Add),
        (path_strategy(), any::<bool>())
            .prop_map(|(path, tracked)| StagingOperation::Remove { path, tracked }),
    ]
}

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

fn snapshots_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((path_strategy(), "[ -~\n]{0,40}"), 0..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_digest_equal_iff_fields_equal(a in fields_strategy(), b in fields_strategy()) {
        prop_assert_eq!(a == b, digest_fields(&a) == digest_fields(&b));
    }

    #[test]
    fn prop_digest_is_fixed_width_hex(fields in fields_strategy()) {
        let digest = digest_fields(&fields);
        prop_assert_eq!(digest.as_str().len(), Digest::HEX_LEN);
        prop_assert!(digest.as_str().parse::<Digest>().is_ok());
    }

    #[test]
    fn prop_staged_sets_stay_disjoint(
        ops in prop::collection::vec(staging_operation_strategy(), 0..40)
    ) {
        let mut staging = StagingArea::empty("unused");
        let mut last: BTreeMap<String, &'static str> = BTreeMap::new();

        for op in &ops {
            match op {
                StagingOperation::Add(path) => {
                    staging.stage_add(path);
                    last.insert(path.clone(), "add");
                }
                StagingOperation::Remove { path, tracked } => {
                    let staged = staging.pending_add().contains(path);
                    match staging.stage_remove(path, *tracked) {
                        Ok(_) if *tracked => { last.insert(path.clone(), "remove"); }
                        Ok(_) => { last.remove(path); }
                        Err(SprigError::NothingToRemove(_)) => prop_assert!(!staged),
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
            }
            prop_assert!(staging.pending_add().is_disjoint(staging.pending_remove()));
        }

        // The last successful request for each path decides where it ends up
        for (path, kind) in &last {
            match *kind {
                "add" => prop_assert!(staging.pending_add().contains(path)),
                _ => prop_assert!(staging.pending_remove().contains(path)),
            }
        }
    }

    #[test]
    fn prop_snapshot_order_does_not_change_digest(
        files in snapshots_strategy(),
        timestamp in timestamp_strategy(),
    ) {
        // Dedup first so both orders keep the same content per path
        let unique: BTreeMap<String, String> = files.into_iter().collect();
        let forward: Vec<FileSnapshot> = unique
            .iter()
            .map(|(path, content)| FileSnapshot::new(path.clone(), content.clone()))
            .collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = Commit::new(None, timestamp, "m", forward);
        let b = Commit::new(None, timestamp, "m", backward);
        prop_assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn prop_store_round_trip(
        messages in prop::collection::vec("[a-z ]{0,12}", 1..6),
        timestamp in timestamp_strategy(),
        branch_points in prop::collection::vec(any::<prop::sample::Index>(), 0..3),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let mut store = RepositoryStore::empty(temp_dir.path());

        let mut chain = vec![store.register(Commit::root(timestamp, "root")).unwrap()];
        for message in &messages {
            let parent = chain.last().cloned();
            let commit = Commit::new(parent, timestamp, message.as_str(), Vec::new());
            chain.push(store.register(commit).unwrap());
        }

        store.set_branch("master", chain.last().cloned().unwrap()).unwrap();
        store.set_head("master").unwrap();
        for (i, index) in branch_points.iter().enumerate() {
            store.set_branch(format!("b{}", i), index.get(&chain).clone()).unwrap();
        }
        store.save().unwrap();

        let mut reloaded = RepositoryStore::load(temp_dir.path()).unwrap();
        prop_assert_eq!(reloaded.branches(), store.branches());
        prop_assert_eq!(reloaded.head(), "master");
        prop_assert_eq!(
            reloaded.digests().cloned().collect::<Vec<_>>(),
            store.digests().cloned().collect::<Vec<_>>()
        );

        let history = reloaded.history(chain.last().unwrap()).unwrap();
        prop_assert_eq!(history.len(), chain.len());
        for (commit, digest) in history.iter().zip(chain.iter().rev()) {
            prop_assert_eq!(&commit.digest(), digest);
        }
    }
}
