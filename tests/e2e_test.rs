use git_addp::{Config, FileOutcome, FileReport, GitRepo, Stager};
use git2::{Repository, Signature};
use similar_asserts::assert_eq;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Test fixture for a git repository
struct Fixture {
    dir: TempDir,
    repo: Repository,
}

impl Fixture {
    /// Create a new empty repo with deterministic config
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repo");

        // Deterministic config
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        Self { dir, repo }
    }

    fn path(&self) -> &str {
        self.dir.path().to_str().unwrap()
    }

    /// Write a file to the repo
    fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Write raw bytes to the repo
    fn write_bytes(&self, name: &str, content: &[u8]) {
        fs::write(self.dir.path().join(name), content).unwrap();
    }

    /// Stage a file
    fn stage_file(&self, name: &str) {
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    /// Create a commit
    fn commit(&self, message: &str) {
        let sig = Signature::new(
            "Test User",
            "test@example.com",
            &git2::Time::new(1234567890, 0),
        )
        .unwrap();
        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        if self.repo.head().is_ok() {
            let parent = self.repo.head().unwrap().peel_to_commit().unwrap();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .unwrap();
        } else {
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
                .unwrap();
        }
    }

    /// Commit `content` as `name`
    fn commit_file(&self, name: &str, content: &str) {
        self.write_file(name, content);
        self.stage_file(name);
        self.commit("initial");
    }

    /// Content of `name` as currently recorded in the index
    fn staged(&self, name: &str) -> String {
        String::from_utf8(self.staged_bytes(name)).unwrap()
    }

    fn staged_bytes(&self, name: &str) -> Vec<u8> {
        let mut index = self.repo.index().unwrap();
        index.read(true).unwrap();
        let entry = index.get_path(Path::new(name), 0).unwrap();
        let blob = self.repo.find_blob(entry.id).unwrap();
        blob.content().to_vec()
    }

    /// Get git diff --cached output (staged changes)
    fn git_diff_cached(&self) -> String {
        let output = Command::new("git")
            .args([
                "-C",
                self.path(),
                "diff",
                "--cached",
                "--no-ext-diff", // Force standard diff, ignore external tools
                "-U0",
                "--no-color",
            ])
            .output()
            .expect("Failed to run git diff --cached");
        String::from_utf8(output.stdout).unwrap()
    }

    /// Run the stager with scripted operator input
    fn stage(&self, config: &Config, input: &str) -> (Vec<FileReport>, String) {
        let mut output = Vec::new();
        let reports = Stager::new(GitRepo::new(self.path()), config)
            .run(&[], Cursor::new(input.as_bytes()), &mut output)
            .unwrap();
        (reports, String::from_utf8(output).unwrap())
    }
}

fn numbered(lines: std::ops::RangeInclusive<u32>) -> Vec<String> {
    lines.map(|i| format!("line {i}")).collect()
}

fn text(lines: &[String]) -> String {
    lines.join("\n") + "\n"
}

/// 20 lines; the worktree inserts a line after line 2 and rewrites line 15,
/// far enough apart to give two hunks
fn two_hunk_fixture() -> (Fixture, Vec<String>) {
    let fixture = Fixture::new();
    let original = numbered(1..=20);
    fixture.commit_file("notes.txt", &text(&original));

    let mut modified = original.clone();
    modified[14] = "line fifteen".to_string();
    modified.insert(2, "inserted".to_string());
    fixture.write_file("notes.txt", &text(&modified));

    (fixture, original)
}

// =============================================================================
// Accept first, skip second
// =============================================================================

#[test]
fn stage_first_hunk_only() {
    let (fixture, original) = two_hunk_fixture();

    let (reports, output) = fixture.stage(&Config::plain(), "y\nn\n");

    assert_eq!(
        reports,
        vec![FileReport {
            path: "notes.txt".to_string(),
            outcome: FileOutcome::Staged { hunks: 1 },
            aborted: false,
        }]
    );
    assert!(output.starts_with("diff --git a/notes.txt b/notes.txt\n"));
    assert_eq!(output.matches("Stage this hunk").count(), 2);

    let mut expected = original.clone();
    expected.insert(2, "inserted".to_string());
    assert_eq!(fixture.staged("notes.txt"), text(&expected));
}

// =============================================================================
// Skip first, accept second: the second header is renumbered
// =============================================================================

#[test]
fn stage_second_hunk_renumbers() {
    let (fixture, original) = two_hunk_fixture();

    let (reports, output) = fixture.stage(&Config::plain(), "n\ny\n");

    assert_eq!(reports[0].outcome, FileOutcome::Staged { hunks: 1 });
    // Shown against the worktree numbering
    assert!(output.contains("@@ -12,7 +13,7 @@"));

    let mut expected = original.clone();
    expected[14] = "line fifteen".to_string();
    assert_eq!(fixture.staged("notes.txt"), text(&expected));
    let cached = fixture.git_diff_cached();
    assert!(cached.contains("@@ -15 +15 @@"));
    assert!(cached.contains("-line 15\n+line fifteen\n"));
    assert!(!cached.contains("+inserted"));
}

// =============================================================================
// Accept everything
// =============================================================================

#[test]
fn stage_all_matches_worktree() {
    let (fixture, _) = two_hunk_fixture();

    let (reports, _) = fixture.stage(&Config::plain(), "a\n");

    assert_eq!(reports[0].outcome, FileOutcome::Staged { hunks: 2 });
    let worktree = fs::read_to_string(fixture.dir.path().join("notes.txt")).unwrap();
    assert_eq!(fixture.staged("notes.txt"), worktree);
}

// =============================================================================
// Reject everything
// =============================================================================

#[test]
fn skip_all_leaves_index_alone() {
    let (fixture, original) = two_hunk_fixture();

    let (reports, _) = fixture.stage(&Config::plain(), "d\n");

    assert_eq!(reports[0].outcome, FileOutcome::NothingSelected);
    assert_eq!(fixture.staged("notes.txt"), text(&original));
    assert!(fixture.git_diff_cached().is_empty());
}

// =============================================================================
// Input ends early
// =============================================================================

#[test]
fn end_of_input_stages_partial_selection() {
    let (fixture, original) = two_hunk_fixture();

    let (reports, output) = fixture.stage(&Config::plain(), "y\n");

    assert!(reports[0].aborted);
    assert_eq!(reports[0].outcome, FileOutcome::Staged { hunks: 1 });
    assert!(output.ends_with("? \n"));

    let mut expected = original.clone();
    expected.insert(2, "inserted".to_string());
    assert_eq!(fixture.staged("notes.txt"), text(&expected));
}

// =============================================================================
// Navigation before deciding
// =============================================================================

#[test]
fn navigate_back_and_change_decision() {
    let (fixture, original) = two_hunk_fixture();

    // Accept the first, go back, reject it, then accept the second
    let (_, output) = fixture.stage(&Config::plain(), "y\nK\nn\ny\n");

    assert!(!output.contains("No previous hunk"));
    let mut expected = original.clone();
    expected[14] = "line fifteen".to_string();
    assert_eq!(fixture.staged("notes.txt"), text(&expected));
}

// =============================================================================
// Several files
// =============================================================================

#[test]
fn stage_across_files() {
    let fixture = Fixture::new();
    fixture.write_file("a.txt", "alpha\n");
    fixture.stage_file("a.txt");
    fixture.commit_file("b.txt", "bravo\n");

    fixture.write_file("a.txt", "ALPHA\n");
    fixture.write_file("b.txt", "BRAVO\n");

    let (reports, _) = fixture.stage(&Config::plain(), "n\ny\n");

    let paths: Vec<_> = reports.iter().map(|report| report.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt", "b.txt"]);
    assert_eq!(fixture.staged("a.txt"), "alpha\n");
    assert_eq!(fixture.staged("b.txt"), "BRAVO\n");
}

// =============================================================================
// Files that are not UTF-8
// =============================================================================

#[test]
fn stage_latin1_file_alongside_utf8() {
    let fixture = Fixture::new();
    fixture.write_file("a.txt", "alpha\n");
    fixture.stage_file("a.txt");
    fixture.write_bytes("l1.txt", b"caf\xe9\n");
    fixture.stage_file("l1.txt");
    fixture.commit("initial");

    fixture.write_file("a.txt", "ALPHA\n");
    fixture.write_bytes("l1.txt", b"th\xe9\n");

    let mut output = Vec::new();
    let reports = Stager::new(GitRepo::new(fixture.path()), &Config::plain())
        .run(&[], Cursor::new(&b"y\ny\n"[..]), &mut output)
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(
        reports
            .iter()
            .all(|report| report.outcome == FileOutcome::Staged { hunks: 1 })
    );
    // Shown to the operator as git wrote it
    assert!(output.windows(5).any(|w| w == b"+th\xe9\n"));
    assert_eq!(fixture.staged_bytes("l1.txt"), b"th\xe9\n");
    assert_eq!(fixture.staged("a.txt"), "ALPHA\n");
}

// =============================================================================
// Colored output
// =============================================================================

#[test]
fn colored_run_stages_plain_patch() {
    let (fixture, original) = two_hunk_fixture();

    let (_, output) = fixture.stage(&Config::colored(), "n\ny\n");

    assert!(output.contains("\x1b[1;34mStage this hunk"));
    assert!(output.contains("\x1b[36m@@ -1,5 +1,6 @@"));

    let mut expected = original.clone();
    expected[14] = "line fifteen".to_string();
    assert_eq!(fixture.staged("notes.txt"), text(&expected));
}

// =============================================================================
// Nothing to do
// =============================================================================

#[test]
fn clean_tree_reports_no_changes() {
    let fixture = Fixture::new();
    fixture.commit_file("notes.txt", "unchanged\n");

    let (reports, output) = fixture.stage(&Config::plain(), "");

    assert!(reports.is_empty());
    assert_eq!(output, "No changes.\n");
}
