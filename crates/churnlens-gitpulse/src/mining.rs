//! Touched-file extraction from git history.
//!
//! The pipeline only needs a flat list of "file touched by a commit"
//! entries. [`HistorySource`] abstracts where that list comes from: a live
//! repository walked with git2 ([`GitHistory`]), captured
//! `git log --name-only --pretty=format:` output ([`NameOnlyLog`]), or an
//! in-memory list.

use std::io::Read;
use std::path::{Path, PathBuf};

use churnlens_core::{ChurnError, FilesConfig};
use git2::{Delta, DiffFindOptions, DiffOptions, Repository, Sort};
use tracing::debug;

/// Produces the sequence of touched-file paths across all commits.
///
/// One entry per file per commit. Entries may be blank; the counter
/// ignores them.
///
/// # Examples
///
/// ```
/// use churnlens_gitpulse::mining::HistorySource;
///
/// let history = vec!["a.rs".to_string(), "b.rs".to_string(), "a.rs".to_string()];
/// assert_eq!(history.touched_files().unwrap().len(), 3);
/// ```
pub trait HistorySource {
    /// Return every touched path, newest commit first.
    ///
    /// # Errors
    ///
    /// Returns a [`ChurnError`] if the history cannot be read.
    fn touched_files(&self) -> Result<Vec<String>, ChurnError>;
}

impl HistorySource for [String] {
    fn touched_files(&self) -> Result<Vec<String>, ChurnError> {
        Ok(self.to_vec())
    }
}

impl HistorySource for Vec<String> {
    fn touched_files(&self) -> Result<Vec<String>, ChurnError> {
        Ok(self.clone())
    }
}

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use churnlens_gitpulse::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.since_days.is_none());
/// assert!(opts.max_files_per_commit.is_none());
/// assert!(opts.branch.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Only include commits from the last N days. Whole history when `None`.
    pub since_days: Option<u64>,
    /// Skip commits touching more files than this (large refactors).
    pub max_files_per_commit: Option<usize>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
}

impl From<&FilesConfig> for MiningOptions {
    fn from(config: &FilesConfig) -> Self {
        Self {
            since_days: config.since_days,
            max_files_per_commit: config.max_files_per_commit,
            branch: config.branch.clone(),
        }
    }
}

/// A git repository read through git2.
///
/// # Examples
///
/// ```no_run
/// use churnlens_gitpulse::mining::{GitHistory, HistorySource, MiningOptions};
///
/// let history = GitHistory::new(".", MiningOptions::default());
/// let paths = history.touched_files().unwrap();
/// println!("{} file changes", paths.len());
/// ```
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_path: PathBuf,
    options: MiningOptions,
}

impl GitHistory {
    pub fn new(repo_path: impl Into<PathBuf>, options: MiningOptions) -> Self {
        Self {
            repo_path: repo_path.into(),
            options,
        }
    }
}

impl HistorySource for GitHistory {
    fn touched_files(&self) -> Result<Vec<String>, ChurnError> {
        mine_touched_files(&self.repo_path, &self.options)
    }
}

/// Walk history and list the files each commit touched.
///
/// Commits are visited newest first. Merge commits contribute nothing,
/// matching `git log --name-only`. Deleted files are listed under their old
/// path and renamed files under their new one.
///
/// # Errors
///
/// Returns [`ChurnError::Git`] if the repository cannot be opened or walked.
pub fn mine_touched_files(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<String>, ChurnError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| ChurnError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| ChurnError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk
        .set_sorting(Sort::TIME)
        .map_err(|e| ChurnError::Git(format!("failed to sort revwalk: {e}")))?;

    // Start from HEAD or specified branch
    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| ChurnError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .peel_to_commit()
            .map_err(|e| ChurnError::Git(format!("branch '{branch}' has no commit: {e}")))?
            .id();
        revwalk
            .push(oid)
            .map_err(|e| ChurnError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| ChurnError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let cutoff = options.since_days.map(compute_cutoff);
    let mut touched = Vec::new();
    let mut commits = 0usize;

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| ChurnError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| ChurnError::Git(format!("failed to find commit: {e}")))?;

        if let Some(cutoff) = cutoff {
            if commit.time().seconds() < cutoff {
                break;
            }
        }

        if commit.parent_count() > 1 {
            continue;
        }

        let paths = commit_paths(&repo, &commit)?;

        if let Some(max) = options.max_files_per_commit {
            if paths.len() > max {
                debug!(commit = %oid, files = paths.len(), max, "skipping large commit");
                continue;
            }
        }

        commits += 1;
        touched.extend(paths);
    }

    debug!(commits, entries = touched.len(), "mined git history");
    Ok(touched)
}

fn compute_cutoff(since_days: u64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    now - (since_days as i64 * 86400)
}

fn commit_paths(repo: &Repository, commit: &git2::Commit) -> Result<Vec<String>, ChurnError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| ChurnError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| ChurnError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| ChurnError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| ChurnError::Git(format!("failed to compute diff: {e}")))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| ChurnError::Git(format!("failed to find renames: {e}")))?;

    let paths = diff
        .deltas()
        .filter_map(|delta| {
            let file = match delta.status() {
                Delta::Deleted => delta.old_file(),
                _ => delta.new_file(),
            };
            file.path().map(|p| p.to_string_lossy().to_string())
        })
        .filter(|p| !p.is_empty())
        .collect();

    Ok(paths)
}

/// Captured output of `git log --name-only --pretty=format:`.
///
/// # Examples
///
/// ```
/// use churnlens_gitpulse::mining::{HistorySource, NameOnlyLog};
///
/// let log = NameOnlyLog::new("src/a.rs\nsrc/b.rs\n\nsrc/a.rs\n");
/// assert_eq!(log.touched_files().unwrap(), vec!["src/a.rs", "src/b.rs", "", "src/a.rs"]);
/// ```
#[derive(Debug, Clone)]
pub struct NameOnlyLog {
    text: String,
}

impl NameOnlyLog {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read captured log text. Invalid UTF-8 is replaced, not rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Io`] if reading fails.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ChurnError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::new(String::from_utf8_lossy(&bytes)))
    }

    /// Read captured log text from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::FileNotFound`] if `path` does not exist and
    /// [`ChurnError::Io`] if reading fails.
    pub fn from_path(path: &Path) -> Result<Self, ChurnError> {
        if !path.exists() {
            return Err(ChurnError::FileNotFound(path.to_path_buf()));
        }
        Self::from_reader(std::fs::File::open(path)?)
    }
}

impl HistorySource for NameOnlyLog {
    fn touched_files(&self) -> Result<Vec<String>, ChurnError> {
        Ok(self.text.trim().lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mining_options_follow_config() {
        let config = FilesConfig {
            since_days: Some(30),
            branch: Some("main".into()),
            max_files_per_commit: Some(10),
            ..FilesConfig::default()
        };
        let opts = MiningOptions::from(&config);
        assert_eq!(opts.since_days, Some(30));
        assert_eq!(opts.branch.as_deref(), Some("main"));
        assert_eq!(opts.max_files_per_commit, Some(10));
    }

    #[test]
    fn name_only_log_handles_crlf_and_outer_blank_lines() {
        let log = NameOnlyLog::new("\n\na.rs\r\nb.rs\r\n\r\nc.rs\n\n");
        assert_eq!(log.touched_files().unwrap(), vec!["a.rs", "b.rs", "", "c.rs"]);
    }

    #[test]
    fn name_only_log_replaces_invalid_utf8() {
        let bytes: &[u8] = b"ok.rs\nbad\xff.rs\n";
        let log = NameOnlyLog::from_reader(bytes).unwrap();
        let files = log.touched_files().unwrap();
        assert_eq!(files[0], "ok.rs");
        assert!(files[1].starts_with("bad"));
    }

    #[test]
    fn missing_log_file_is_reported() {
        let err = NameOnlyLog::from_path(Path::new("/nonexistent/git.log")).unwrap_err();
        assert!(matches!(err, ChurnError::FileNotFound(_)));
    }

    #[test]
    fn slices_are_history_sources() {
        let paths = vec!["x".to_string()];
        assert_eq!(paths.as_slice().touched_files().unwrap(), vec!["x"]);
    }

    #[test]
    fn cutoff_is_in_the_past() {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let cutoff = compute_cutoff(2);
        assert!(cutoff >= now - 2 * 86400);
        assert!(cutoff < now - 86400);
    }
}
