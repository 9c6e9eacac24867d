//! Project URL validation and name derivation.

use crate::error::AppError;

/// Hosts whose full path after the host is used as the project name
/// (e.g. `https://github.com/acme/widget` -> `acme/widget`).
const REPOSITORY_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

/// Validate a project repository URL. Only absolute http(s) URLs with a
/// non-empty host are accepted.
pub fn validate_project_url(url: &str) -> Result<(), AppError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Project URL is required".to_string()));
    }

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Project URL must be http(s): {}", trimmed))
        })?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() || !host.contains('.') {
        return Err(AppError::InvalidInput(format!(
            "Project URL has no valid host: {}",
            trimmed
        )));
    }

    Ok(())
}

/// Derive the project name from its URL.
///
/// For known repository hosts the name is the path portion following the host;
/// for anything else it is the last `/`-delimited segment. Trailing slashes and
/// a `.git` suffix are stripped in both cases.
pub fn derive_project_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let name = match without_scheme.split_once('/') {
        Some((host, path)) if REPOSITORY_HOSTS.contains(&host) && !path.is_empty() => path,
        _ => trimmed.rsplit('/').next().unwrap_or(trimmed),
    };

    name.trim_end_matches(".git").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_host_uses_full_path() {
        assert_eq!(
            derive_project_name("https://github.com/acme/widget"),
            "acme/widget"
        );
        assert_eq!(
            derive_project_name("https://gitlab.com/group/subgroup/tool"),
            "group/subgroup/tool"
        );
    }

    #[test]
    fn other_host_uses_last_segment() {
        assert_eq!(derive_project_name("https://example.com/foo/bar"), "bar");
        assert_eq!(derive_project_name("https://example.com/solo"), "solo");
    }

    #[test]
    fn trailing_slash_and_git_suffix_stripped() {
        assert_eq!(
            derive_project_name("https://github.com/acme/widget.git"),
            "acme/widget"
        );
        assert_eq!(
            derive_project_name("https://github.com/acme/widget/"),
            "acme/widget"
        );
    }

    #[test]
    fn url_validation() {
        assert!(validate_project_url("https://github.com/acme/widget").is_ok());
        assert!(validate_project_url("http://example.com/repo").is_ok());
        assert!(validate_project_url("").is_err());
        assert!(validate_project_url("   ").is_err());
        assert!(validate_project_url("ftp://example.com/repo").is_err());
        assert!(validate_project_url("https://").is_err());
        assert!(validate_project_url("https://nohost").is_err());
    }
}
