//! Repository Auto-Detection
//!
//! Infers the target repository's owner and name from the Git remotes
//! configured in the current working directory. The Git CLI is the only
//! side-effecting dependency; every invocation runs under a fixed timeout.
//! The URL parser is intentionally single-provider and only understands
//! github.com remotes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

/// Timeout for every Git subprocess invocation
pub const GIT_TIMEOUT: Duration = Duration::from_secs(5);

const GITHUB_HOST: &str = "github.com";

/// How the repository reference was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    /// The `origin` remote resolved
    Origin,

    /// No usable `origin`; the first listed remote was used
    FirstRemote,

    /// Entered by the user
    Manual,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::Origin => write!(f, "origin"),
            DetectionMethod::FirstRemote => write!(f, "first-remote"),
            DetectionMethod::Manual => write!(f, "manual"),
        }
    }
}

/// In-memory reference to the target repository, derived each session
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryReference {
    pub owner: String,
    pub repo: String,
    pub remote_url: Option<String>,
    pub detection_method: DetectionMethod,
}

/// Result of one auto-detection pass
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub is_git_repository: bool,
    pub repository: Option<RepositoryReference>,
    pub error: Option<String>,
}

impl DetectionResult {
    fn not_a_repository() -> Self {
        Self {
            is_git_repository: false,
            repository: None,
            error: Some("Not a Git repository".to_string()),
        }
    }

    fn failed(reason: &str) -> Self {
        Self {
            is_git_repository: true,
            repository: None,
            error: Some(reason.to_string()),
        }
    }

    fn detected(repository: RepositoryReference) -> Self {
        Self {
            is_git_repository: true,
            repository: Some(repository),
            error: None,
        }
    }
}

/// The `git` binary could not be found on this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitUnavailable;

/// Outcome of a single Git invocation
enum GitOutput {
    Ok(String),
    Failed,
    Unavailable,
}

/// Walk parent directories upward looking for a `.git` entry
///
/// Terminates at the filesystem root: the loop ends when a directory has no
/// parent distinct from itself.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            return Some(current);
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => return None,
        }
    }
}

async fn run_git(git_root: &Path, args: &[&str]) -> GitOutput {
    let mut command = Command::new("git");
    command.args(args).current_dir(git_root);

    match tokio::time::timeout(GIT_TIMEOUT, command.output()).await {
        Err(_) => GitOutput::Failed, // timed out
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => GitOutput::Unavailable,
        Ok(Err(_)) => GitOutput::Failed,
        Ok(Ok(output)) if output.status.success() => {
            GitOutput::Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(Ok(_)) => GitOutput::Failed,
    }
}

/// List the configured remote names
///
/// A failing or empty invocation yields an empty list; only a missing `git`
/// binary is distinguished.
pub async fn list_remotes(git_root: &Path) -> std::result::Result<Vec<String>, GitUnavailable> {
    match run_git(git_root, &["remote"]).await {
        GitOutput::Ok(stdout) => Ok(stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()),
        GitOutput::Failed => Ok(Vec::new()),
        GitOutput::Unavailable => Err(GitUnavailable),
    }
}

/// Resolve the URL of a named remote
///
/// Any failure (nonexistent remote, timeout, missing binary) yields `None`.
pub async fn get_remote_url(git_root: &Path, name: &str) -> Option<String> {
    match run_git(git_root, &["remote", "get-url", name]).await {
        GitOutput::Ok(stdout) => {
            let url = stdout.trim().to_string();
            if url.is_empty() {
                None
            } else {
                Some(url)
            }
        }
        _ => None,
    }
}

/// Detect the target repository from the Git remotes of `cwd`
pub async fn detect_repository(cwd: &Path) -> DetectionResult {
    let Some(git_root) = find_git_root(cwd) else {
        return DetectionResult::not_a_repository();
    };

    let remotes = match list_remotes(&git_root).await {
        Ok(remotes) => remotes,
        Err(GitUnavailable) => return DetectionResult::failed("Git command not available"),
    };

    if remotes.is_empty() {
        return DetectionResult::failed("No remotes configured");
    }

    // Prefer origin; fall back to the first remote as listed by Git
    let mut detection_method = DetectionMethod::Origin;
    let mut url = if remotes.iter().any(|r| r == "origin") {
        get_remote_url(&git_root, "origin").await
    } else {
        None
    };

    if url.is_none() {
        detection_method = DetectionMethod::FirstRemote;
        url = get_remote_url(&git_root, &remotes[0]).await;
    }

    let Some(url) = url else {
        return DetectionResult::failed("Could not retrieve remote URL");
    };

    let Some((owner, repo)) = parse_github_url(&url) else {
        return DetectionResult::failed("Could not parse remote URL");
    };

    DetectionResult::detected(RepositoryReference {
        owner,
        repo,
        remote_url: Some(url),
        detection_method,
    })
}

static SSH_RE: OnceLock<Regex> = OnceLock::new();
static HTTP_RE: OnceLock<Regex> = OnceLock::new();

fn ssh_re() -> &'static Regex {
    SSH_RE.get_or_init(|| {
        Regex::new(&format!(
            r"^git@{host}:([A-Za-z0-9-]+)/([A-Za-z0-9-]+?)(?:\.git)?$",
            host = regex::escape(GITHUB_HOST)
        ))
        .expect("valid SSH remote regex")
    })
}

fn http_re() -> &'static Regex {
    HTTP_RE.get_or_init(|| {
        Regex::new(&format!(
            r"^https?://{host}/([A-Za-z0-9-]+)/([A-Za-z0-9-]+?)(?:\.git)?/?$",
            host = regex::escape(GITHUB_HOST)
        ))
        .expect("valid HTTP remote regex")
    })
}

/// Parse a github.com remote URL into owner and repository name
///
/// Accepts exactly three shapes: SSH (`git@github.com:owner/repo[.git]`),
/// HTTPS and HTTP (`http(s)://github.com/owner/repo[.git][/]`). Any other
/// host, or an owner/repo that is not a valid GitHub identifier, is a parse
/// failure.
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let url = url.trim();
    let captures = ssh_re().captures(url).or_else(|| http_re().captures(url))?;

    let owner = captures.get(1)?.as_str();
    let repo = captures.get(2)?.as_str();

    if !is_valid_identifier(owner) || !is_valid_identifier(repo) {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

/// Check a GitHub owner/repository identifier
///
/// 1-39 characters, alphanumeric and hyphen only, no leading or trailing
/// hyphen, no consecutive hyphens.
pub fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > 39 {
        return false;
    }
    if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        return false;
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_git_root_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let nested = root.join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir(root.join(".git")).unwrap();

        assert_eq!(find_git_root(&nested), Some(root.clone()));
        assert_eq!(find_git_root(&root), Some(root));
    }

    #[test]
    fn test_find_git_root_none() {
        let dir = tempfile::tempdir().unwrap();
        // Temp dirs live under paths without a .git ancestor in practice,
        // but guard against a stray one on the test machine.
        if find_git_root(dir.path()).is_some() {
            return;
        }
        assert_eq!(find_git_root(dir.path()), None);
    }

    #[test]
    fn test_parse_ssh_url() {
        assert_eq!(
            parse_github_url("git@github.com:a/b.git"),
            Some(("a".to_string(), "b".to_string()))
        );
        assert_eq!(
            parse_github_url("git@github.com:owner/repo"),
            Some(("owner".to_string(), "repo".to_string()))
        );
    }

    #[test]
    fn test_parse_https_url() {
        assert_eq!(
            parse_github_url("https://github.com/owner/repo.git"),
            Some(("owner".to_string(), "repo".to_string()))
        );
        assert_eq!(
            parse_github_url("https://github.com/owner/repo/"),
            Some(("owner".to_string(), "repo".to_string()))
        );
        assert_eq!(
            parse_github_url("http://github.com/owner/repo"),
            Some(("owner".to_string(), "repo".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        assert_eq!(parse_github_url("git@gitlab.com:a/b.git"), None);
        assert_eq!(parse_github_url("https://gitlab.com/a/b.git"), None);
        assert_eq!(parse_github_url("https://github.org/a/b"), None);
    }

    #[test]
    fn test_parse_rejects_malformed_identifiers() {
        assert_eq!(parse_github_url("https://github.com/owner--bad/repo.git"), None);
        assert_eq!(parse_github_url("git@github.com:-owner/repo.git"), None);
        assert_eq!(parse_github_url("git@github.com:owner-/repo.git"), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_github_url(""), None);
        assert_eq!(parse_github_url("not a url"), None);
        assert_eq!(parse_github_url("https://github.com/only-owner"), None);
        assert_eq!(parse_github_url("git@github.com:a/b/c"), None);
    }

    #[test]
    fn test_identifier_length_boundary() {
        let ok = "a".repeat(39);
        let too_long = "a".repeat(40);
        assert!(is_valid_identifier(&ok));
        assert!(!is_valid_identifier(&too_long));

        let url_ok = format!("git@github.com:{ok}/repo.git");
        assert!(parse_github_url(&url_ok).is_some());
        let url_long = format!("git@github.com:{too_long}/repo.git");
        assert!(parse_github_url(&url_long).is_none());
    }

    #[test]
    fn test_identifier_hyphen_rules() {
        assert!(is_valid_identifier("a"));
        assert!(is_valid_identifier("a-b-c"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("-a"));
        assert!(!is_valid_identifier("a-"));
        assert!(!is_valid_identifier("a--b"));
        assert!(!is_valid_identifier("a_b"));
    }

    #[test]
    fn test_detection_method_display() {
        assert_eq!(DetectionMethod::Origin.to_string(), "origin");
        assert_eq!(DetectionMethod::FirstRemote.to_string(), "first-remote");
        assert_eq!(DetectionMethod::Manual.to_string(), "manual");
    }

    #[tokio::test]
    async fn test_detect_outside_git_repository() {
        let dir = tempfile::tempdir().unwrap();
        if find_git_root(dir.path()).is_some() {
            return; // test machine has a .git ancestor above the temp dir
        }
        let result = detect_repository(dir.path()).await;
        assert!(!result.is_git_repository);
        assert_eq!(result.error.as_deref(), Some("Not a Git repository"));
    }

    #[tokio::test]
    async fn test_detect_no_remotes() {
        let dir = tempfile::tempdir().unwrap();
        let output = std::process::Command::new("git")
            .arg("init")
            .current_dir(dir.path())
            .output();
        let Ok(output) = output else {
            return; // git not installed on the test machine
        };
        if !output.status.success() {
            return;
        }

        let result = detect_repository(dir.path()).await;
        assert!(result.is_git_repository);
        assert_eq!(result.error.as_deref(), Some("No remotes configured"));
    }

    #[tokio::test]
    async fn test_detect_prefers_origin() {
        let dir = tempfile::tempdir().unwrap();
        let git = |args: &[&str]| {
            std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
        };
        let Ok(init) = git(&["init"]) else {
            return;
        };
        if !init.status.success() {
            return;
        }
        // Alphabetically "fork" sorts before "origin"; origin must still win
        git(&["remote", "add", "fork", "git@github.com:fork-owner/repo.git"]).unwrap();
        git(&["remote", "add", "origin", "git@github.com:real-owner/repo.git"]).unwrap();
        git(&["remote", "add", "upstream", "git@github.com:up-owner/repo.git"]).unwrap();

        let result = detect_repository(dir.path()).await;
        let info = result.repository.expect("detection should succeed");
        assert_eq!(info.owner, "real-owner");
        assert_eq!(info.detection_method, DetectionMethod::Origin);
    }

    #[tokio::test]
    async fn test_detect_first_remote_without_origin() {
        let dir = tempfile::tempdir().unwrap();
        let git = |args: &[&str]| {
            std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
        };
        let Ok(init) = git(&["init"]) else {
            return;
        };
        if !init.status.success() {
            return;
        }
        git(&["remote", "add", "fork", "git@github.com:fork-owner/repo.git"]).unwrap();
        git(&["remote", "add", "upstream", "git@github.com:up-owner/repo.git"]).unwrap();

        let result = detect_repository(dir.path()).await;
        let info = result.repository.expect("detection should succeed");
        // `git remote` lists alphabetically, so "fork" comes first
        assert_eq!(info.owner, "fork-owner");
        assert_eq!(info.detection_method, DetectionMethod::FirstRemote);
    }

    #[tokio::test]
    async fn test_detect_unparsable_remote() {
        let dir = tempfile::tempdir().unwrap();
        let git = |args: &[&str]| {
            std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
        };
        let Ok(init) = git(&["init"]) else {
            return;
        };
        if !init.status.success() {
            return;
        }
        git(&["remote", "add", "origin", "git@gitlab.com:a/b.git"]).unwrap();

        let result = detect_repository(dir.path()).await;
        assert!(result.is_git_repository);
        assert_eq!(result.error.as_deref(), Some("Could not parse remote URL"));
    }
}
