//! Main test module for sprig
//!
//! This module includes all test suites:
//! - Integration tests for whole-repository scenarios
//! - Property-based tests for invariants

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::sprig::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = RepositoryBuilder::new()
            .clock(FixedClock::epoch())
            .init(temp_dir.path())
            .unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_special_filenames() {
        let (temp_dir, repo) = setup();

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.multiple.dots.txt",
            "UPPERCASE.TXT",
            "unicode_文件.txt",
            ".hidden",
        ];
        for name in &special_names {
            fs::write(temp_dir.path().join(name), format!("content of {}", name)).unwrap();
            repo.add(name).unwrap();
        }

        let commit = repo.commit("special names").unwrap();
        for name in &special_names {
            assert!(commit.tracks(name), "{} should be tracked", name);
        }
        assert!(repo.status().unwrap().is_clean());
    }

    #[test]
    fn test_empty_file_and_empty_message() {
        let (temp_dir, repo) = setup();
        fs::write(temp_dir.path().join("empty.txt"), "").unwrap();
        repo.add("empty.txt").unwrap();

        let commit = repo.commit("").unwrap();
        assert_eq!(commit.message(), "");
        assert_eq!(commit.snapshot("empty.txt").unwrap().content(), "");
    }

    #[test]
    fn test_binary_file_rejected() {
        let (temp_dir, repo) = setup();
        fs::write(temp_dir.path().join("image.bin"), [0u8, 159, 146, 150]).unwrap();

        let err = repo.add("image.bin").unwrap_err();
        assert!(matches!(err, SprigError::NotText(_)));
        assert!(repo.status().unwrap().staged.is_empty());
    }

    #[test]
    fn test_paths_outside_root_rejected() {
        let (_temp_dir, repo) = setup();
        for path in ["../escape.txt", ".sprig/refs.json", ""] {
            assert!(matches!(repo.add(path), Err(SprigError::InvalidPath(_))));
        }
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let (temp_dir, repo) = setup();
        fs::create_dir(temp_dir.path().join("dir")).unwrap();
        assert!(matches!(repo.add("dir"), Err(SprigError::FileNotFound(_))));
    }

    #[test]
    fn test_nested_directories() {
        let (temp_dir, repo) = setup();
        let nested = temp_dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.txt"), "deep").unwrap();

        assert_eq!(repo.add("a/b/c/deep.txt").unwrap(), "a/b/c/deep.txt");
        let commit = repo.commit("deep").unwrap();
        assert!(commit.tracks("a/b/c/deep.txt"));
    }

    #[test]
    fn test_ignored_files_are_not_untracked() {
        let (temp_dir, repo) = setup();
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(temp_dir.path().join("build.log"), "noise").unwrap();
        fs::write(temp_dir.path().join("main.txt"), "code").unwrap();

        let status = repo.status().unwrap();
        assert_eq!(
            status.untracked,
            vec![".gitignore".to_string(), "main.txt".to_string()]
        );
    }
}
