use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Stdio};

/// True when `dir` is inside a git work tree, as git itself sees it.
pub fn is_inside_work_tree(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// URL of the `origin` remote.
pub fn origin_url(dir: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .current_dir(dir)
        .output()
        .context("Failed to run 'git remote get-url origin'")?;
    if !output.status.success() {
        bail!("No 'origin' remote configured for this repository");
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Split a git remote URL into `(organization, repository)`.
///
/// Accepts `git@host:org/repo.git`, `ssh://git@host/org/repo`,
/// `https://host/org/repo(.git)` and `host/org/repo`.
pub fn parse_org_and_repo(url: &str) -> Result<(String, String)> {
    let url = url.trim();

    let path = if let Some(rest) = url.strip_prefix("git@") {
        match rest.split_once(':') {
            Some((_, path)) => path,
            None => bail!("Invalid SSH git URL format: {}", url),
        }
    } else {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .or_else(|| url.strip_prefix("ssh://"))
            .unwrap_or(url);
        // drop the host (and any user@ prefix)
        match rest.split_once('/') {
            Some((_, path)) => path,
            None => bail!("Repository URL must include a path: {}", url),
        }
    };

    let path = path.strip_suffix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.rsplitn(2, '/');
    match (parts.next(), parts.next()) {
        (Some(repo), Some(org)) if !repo.is_empty() && !org.is_empty() => {
            let org = org.rsplit('/').next().unwrap_or(org);
            Ok((org.to_string(), repo.to_string()))
        }
        _ => bail!(
            "Repository URL must include organization and name (e.g., github.com/org/repo): {}",
            url
        ),
    }
}

/// Apply a unified diff to the work tree at `dir` with `git apply`.
pub fn apply_patch(dir: &Path, patch: &str) -> Result<()> {
    use std::io::Write;

    let mut child = Command::new("git")
        .args(["apply", "--whitespace=nowarn", "-"])
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to run 'git apply'")?;

    child
        .stdin
        .take()
        .context("Failed to open stdin for 'git apply'")?
        .write_all(patch.as_bytes())?;

    let output = child.wait_with_output()?;
    if !output.status.success() {
        bail!(
            "'git apply' failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org_repo(url: &str) -> (String, String) {
        parse_org_and_repo(url).unwrap()
    }

    #[test]
    fn test_parse_org_and_repo() {
        let expected = ("acme".to_string(), "widgets".to_string());
        assert_eq!(org_repo("https://github.com/acme/widgets"), expected);
        assert_eq!(org_repo("https://github.com/acme/widgets.git"), expected);
        assert_eq!(org_repo("https://github.com/acme/widgets/"), expected);
        assert_eq!(org_repo("git@github.com:acme/widgets.git"), expected);
        assert_eq!(org_repo("ssh://git@github.com/acme/widgets.git"), expected);
        assert_eq!(org_repo("github.com/acme/widgets"), expected);
        // nested groups keep only the innermost org
        assert_eq!(
            org_repo("https://gitlab.com/group/acme/widgets.git"),
            expected
        );

        assert!(parse_org_and_repo("invalid").is_err());
        assert!(parse_org_and_repo("github.com/acme").is_err());
        assert!(parse_org_and_repo("git@github.com").is_err());
    }
}
