//! Credentials file path resolution.
//!
//! Shells do not expand `~` or `$HOME` after an `=` (`--creds-file=~/.aws/credentials`),
//! so the expansion is done here before the path is handed to the AWS SDK.

use std::{
    env,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("could not determine the current user's home directory")]
    HomeDirectory,
    #[error("could not determine the current working directory")]
    CurrentDir(#[source] std::io::Error),
    #[error("cannot find AWS credentials file at specified path: '{}'", .0.display())]
    NotFound(PathBuf),
}

/// Expands `~` and environment variables in `path` and returns an absolute, cleaned path.
pub fn resolve(path: &str) -> Result<PathBuf, PathError> {
    let cwd = env::current_dir().map_err(PathError::CurrentDir)?;
    resolve_with(path, dirs::home_dir, |name| env::var(name).ok(), &cwd)
}

/// Resolves `path` like [`resolve`] and requires the result to be an existing regular file.
pub fn resolve_existing(path: &str) -> Result<PathBuf, PathError> {
    let resolved = resolve(path)?;
    if !exists(&resolved) {
        return Err(PathError::NotFound(resolved));
    }
    Ok(resolved)
}

/// Default location of the shared credentials file, `~/.aws/credentials`.
pub fn default_credentials_path() -> Result<PathBuf, PathError> {
    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .ok_or(PathError::HomeDirectory)
}

/// Reports whether `path` names an existing regular file.
pub fn exists(path: &Path) -> bool {
    path.is_file()
}

fn resolve_with(
    path: &str,
    home: impl FnOnce() -> Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
    cwd: &Path,
) -> Result<PathBuf, PathError> {
    let expanded = expand_env(&expand_tilde(path, home)?, lookup);
    Ok(clean(&cwd.join(expanded)))
}

/// Replaces every path component that is exactly `~` with the home directory.
fn expand_tilde(path: &str, home: impl FnOnce() -> Option<PathBuf>) -> Result<String, PathError> {
    if !path.split('/').any(|part| part == "~") {
        return Ok(path.to_string());
    }
    let home = home().ok_or(PathError::HomeDirectory)?;
    let home = home.to_string_lossy();

    Ok(path
        .split('/')
        .map(|part| if part == "~" { &*home } else { part })
        .collect::<Vec<_>>()
        .join("/"))
}

/// Expands `$NAME` and `${NAME}`. Unset variables expand to an empty string.
fn expand_env(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                rest = &braced[end + 1..];
            } else {
                // unterminated, keep literally
                out.push_str(&rest[pos..]);
                rest = "";
            }
            continue;
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

/// Lexically removes `.` and resolves `..` without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/bob"))
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn expands_leading_tilde() {
        let path = resolve_with("~/.aws/credentials", home, no_env, Path::new("/tmp")).unwrap();
        assert_eq!(path, PathBuf::from("/home/bob/.aws/credentials"));
    }

    #[test]
    fn tilde_inside_a_file_name_is_left_alone() {
        let path = resolve_with("/data/a~b", || None, no_env, Path::new("/")).unwrap();
        assert_eq!(path, PathBuf::from("/data/a~b"));
    }

    #[test]
    fn expands_environment_variables() {
        let lookup = |name: &str| match name {
            "HOME" => Some("/home/carol".to_string()),
            "AWS_DIR" => Some(".aws".to_string()),
            _ => None,
        };
        let path = resolve_with("$HOME/${AWS_DIR}/credentials", || None, lookup, Path::new("/")).unwrap();
        assert_eq!(path, PathBuf::from("/home/carol/.aws/credentials"));
    }

    #[test]
    fn unset_variable_expands_to_nothing() {
        assert_eq!(expand_env("/a/$NOPE/b", no_env), "/a//b");
        assert_eq!(expand_env("cost$", no_env), "cost$");
    }

    #[test]
    fn relative_paths_become_absolute_and_clean() {
        let path = resolve_with("./creds/../credentials", || None, no_env, Path::new("/work/dir")).unwrap();
        assert_eq!(path, PathBuf::from("/work/dir/credentials"));
    }

    #[test]
    fn missing_home_is_an_error_only_when_needed() {
        let err = resolve_with("~/credentials", || None, no_env, Path::new("/")).unwrap_err();
        assert!(matches!(err, PathError::HomeDirectory));
        assert!(resolve_with("/etc/credentials", || None, no_env, Path::new("/")).is_ok());
    }

    #[test]
    fn exists_reports_regular_files_only() {
        let temp = tempdir().expect("can create temp directory");
        let file = temp.path().join("credentials");
        fs::write(&file, "[default]\n").expect("can write credentials");

        assert!(exists(&file));
        assert!(!exists(temp.path()));
        assert!(!exists(&temp.path().join("missing")));
    }

    #[test]
    fn resolve_existing_requires_a_file() {
        let temp = tempdir().expect("can create temp directory");
        let file = temp.path().join("credentials");
        fs::write(&file, "[default]\n").expect("can write credentials");

        let found = resolve_existing(&file.to_string_lossy()).expect("file resolves");
        assert_eq!(found, file);

        let missing = temp.path().join("missing");
        match resolve_existing(&missing.to_string_lossy()) {
            Err(PathError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
