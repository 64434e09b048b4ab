//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile to verify
//! branch detection, remote lookup, and force pushing.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use gl_unprotect::git::{push_in, Git, GitError};

/// Test fixture that creates a real git repository on `main`.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-q", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    fn add_remote(&self, name: &str, url: &str) {
        run_git(self.path(), &["remote", "add", name, url]);
    }

    /// Rewrite the last commit so the remote branch can only be updated
    /// with a force push.
    fn rewrite_head(&self, content: &str) {
        std::fs::write(self.path().join("README.md"), content).unwrap();
        run_git(self.path(), &["add", "README.md"]);
        run_git(self.path(), &["commit", "-q", "--amend", "-m", "Rewritten"]);
    }

    fn head_oid_raw(&self) -> String {
        rev_parse(self.path(), "HEAD")
    }
}

/// Bare repository standing in for the GitLab side of a remote.
fn bare_remote() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    run_git(dir.path(), &["init", "-q", "--bare"]);
    dir
}

fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = Command::new("git")
        .args(["rev-parse", rev])
        .current_dir(dir)
        .output()
        .expect("git rev-parse failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

// =============================================================================
// Repository and Branch Tests
// =============================================================================

#[test]
fn open_from_subdirectory() {
    let repo = TestRepo::new();
    let subdir = repo.path().join("src");
    std::fs::create_dir(&subdir).unwrap();

    let git = Git::open(&subdir).unwrap();
    assert_eq!(
        git.work_dir().unwrap().canonicalize().unwrap(),
        repo.path().canonicalize().unwrap()
    );
}

#[test]
fn open_bare_repository_fails() {
    let bare = bare_remote();
    assert!(matches!(Git::open(bare.path()), Err(GitError::BareRepo)));
}

#[test]
fn current_branch_follows_checkout() {
    let repo = TestRepo::new();
    assert_eq!(repo.git().current_branch().unwrap(), "main");

    run_git(repo.path(), &["checkout", "-q", "-b", "release/1.0"]);
    assert_eq!(repo.git().current_branch().unwrap(), "release/1.0");
}

#[test]
fn detached_head_has_no_branch() {
    let repo = TestRepo::new();
    let oid = repo.head_oid_raw();
    run_git(repo.path(), &["checkout", "-q", &oid]);

    assert!(matches!(
        repo.git().current_branch(),
        Err(GitError::DetachedHead)
    ));
}

// =============================================================================
// Remote Tests
// =============================================================================

#[test]
fn no_remotes() {
    let repo = TestRepo::new();
    let git = repo.git();
    assert!(git.list_remotes().unwrap().is_empty());
    assert!(matches!(git.pick_remote(), Err(GitError::NoRemotes)));
}

#[test]
fn pick_remote_prefers_origin() {
    let repo = TestRepo::new();
    repo.add_remote("upstream", "git@gitlab.com:upstream/widgets.git");
    repo.add_remote("origin", "git@gitlab.example.com:acme/widgets.git");

    let git = repo.git();
    assert_eq!(git.pick_remote().unwrap(), "origin");
    assert_eq!(
        git.remote_url("origin").unwrap().as_deref(),
        Some("git@gitlab.example.com:acme/widgets.git")
    );
}

#[test]
fn pick_remote_falls_back_to_first() {
    let repo = TestRepo::new();
    repo.add_remote("gitlab", "https://gitlab.com/acme/widgets.git");

    assert_eq!(repo.git().pick_remote().unwrap(), "gitlab");
}

#[test]
fn missing_remote_has_no_url() {
    let repo = TestRepo::new();
    assert_eq!(repo.git().remote_url("origin").unwrap(), None);
}

// =============================================================================
// Push Tests
// =============================================================================

#[test]
fn force_push_replaces_remote_history() {
    let repo = TestRepo::new();
    let remote = bare_remote();
    repo.add_remote("origin", remote.path().to_str().unwrap());

    let git = repo.git();
    git.push("origin", "main", false).unwrap();
    assert_eq!(rev_parse(remote.path(), "main"), repo.head_oid_raw());

    repo.rewrite_head("# Rewritten\n");
    git.push("origin", "main", true).unwrap();
    assert_eq!(rev_parse(remote.path(), "main"), repo.head_oid_raw());
}

#[test]
fn non_force_push_of_rewritten_history_fails() {
    let repo = TestRepo::new();
    let remote = bare_remote();
    repo.add_remote("origin", remote.path().to_str().unwrap());

    let git = repo.git();
    git.push("origin", "main", false).unwrap();
    repo.rewrite_head("# Rewritten\n");

    match git.push("origin", "main", false) {
        Err(GitError::PushFailed { stderr, .. }) => assert!(stderr.contains("rejected")),
        other => panic!("expected PushFailed, got {:?}", other),
    }
}

#[test]
fn push_to_unknown_remote_fails() {
    let repo = TestRepo::new();
    let err = repo.git().push("nowhere", "main", true).unwrap_err();
    assert!(matches!(err, GitError::PushFailed { .. }));
}

#[test]
fn push_in_needs_only_the_work_dir() {
    let repo = TestRepo::new();
    let remote = bare_remote();
    repo.add_remote("origin", remote.path().to_str().unwrap());

    let dir = repo.path().to_path_buf();
    let handle = std::thread::spawn(move || push_in(&dir, "origin", "main", true));
    handle.join().expect("push thread").expect("push");

    assert_eq!(rev_parse(remote.path(), "main"), repo.head_oid_raw());
}
