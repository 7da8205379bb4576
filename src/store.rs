//! Shared credentials file reader/writer.
//!
//! The file is the INI dialect used by the AWS CLI:
//! ```ini
//! [default]
//! aws_access_key_id = AKIA...
//! aws_secret_access_key = ...
//!
//! [default-session]
//! aws_access_key_id = ASIA...
//! aws_secret_access_key = ...
//! aws_session_token = ...
//! ```
//!
//! Profiles and keys keep their file order. Writing a profile never drops or reorders the others,
//! and the file is replaced atomically so an interrupted write leaves the previous content intact.

use std::{
    fmt, fs, io,
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[cfg(unix)]
const OWNER_READ_WRITE: u32 = 0o600;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read credentials file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed credentials file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("failed to write credentials file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

type Entries = Vec<(String, String)>;

/// Ordered profile name -> key/value mapping loaded from a credentials file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    profiles: Vec<(String, Entries)>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store at `path`. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|message| StoreError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Loads the store at `path`, or returns an empty store if the file does not exist yet.
    pub fn load_or_empty(path: &Path) -> Result<Self, StoreError> {
        match Self::load(path) {
            Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist, starting from an empty store", path.display());
                Ok(Self::new())
            }
            other => other,
        }
    }

    /// Parses credentials file content.
    ///
    /// Only whole lines starting with `#` or `;` are comments, so values keep any `#` or `;`
    /// they contain. Indented lines continue the entry above them (the nested `s3 =` style) and
    /// are kept verbatim. Errors name the offending line.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut store = Self::new();
        let mut current: Option<usize> = None;
        // Entry that indented lines continue, as (profile index, entry index).
        let mut last: Option<(usize, usize)> = None;

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(['#', ';']) {
                continue;
            }

            if raw.starts_with(char::is_whitespace) {
                let (section, entry) = last
                    .ok_or_else(|| format!("line {line}: indented line does not continue an entry"))?;
                let value = &mut store.profiles[section].1[entry].1;
                value.push('\n');
                value.push_str(raw.trim_end());
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| format!("line {line}: section header is missing `]`"))?
                    .trim();
                if name.is_empty() {
                    return Err(format!("line {line}: section header has no profile name"));
                }
                current = Some(store.section_index(name));
                last = None;
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| format!("line {line}: expected `key = value`, found `{trimmed}`"))?;
            let section = current.ok_or_else(|| {
                format!("line {line}: entry `{key}` appears before any [profile] header")
            })?;

            let entries = &mut store.profiles[section].1;
            let entry = match entries.iter().position(|(existing, _)| existing == key) {
                Some(entry) => {
                    entries[entry].1 = value.to_string();
                    entry
                }
                None => {
                    entries.push((key.to_string(), value.to_string()));
                    entries.len() - 1
                }
            };
            last = Some((section, entry));
        }

        Ok(store)
    }

    /// Index of the profile `name`, appending an empty one if it is new. Repeated headers merge.
    fn section_index(&mut self, name: &str) -> usize {
        match self.profiles.iter().position(|(profile, _)| profile == name) {
            Some(index) => index,
            None => {
                self.profiles.push((name.to_string(), Vec::new()));
                self.profiles.len() - 1
            }
        }
    }

    pub fn profile(&self, name: &str) -> Option<&[(String, String)]> {
        self.profiles
            .iter()
            .find(|(profile, _)| profile == name)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|(name, _)| name.as_str())
    }

    /// Replaces the whole key set of `name`, appending the profile if it is new.
    pub fn upsert(&mut self, name: &str, entries: Entries) {
        match self.profiles.iter_mut().find(|(profile, _)| profile == name) {
            Some((_, existing)) => *existing = entries,
            None => self.profiles.push((name.to_string(), entries)),
        }
    }

    /// Writes the store to `path` through a temporary file in the same directory, then renames it
    /// over the target. The result is readable and writable by the owner only.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
        file.write_all(self.to_string().as_bytes()).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(OWNER_READ_WRITE))
                .map_err(write_err)?;
        }
        file.as_file().sync_all().map_err(write_err)?;
        file.persist(path).map_err(|err| write_err(err.error))?;

        debug!("wrote {} profile(s) to {}", self.profiles.len(), path.display());
        Ok(())
    }
}

impl fmt::Display for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, entries)) in self.profiles.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for (key, value) in entries {
                // Nested values start on the next line: `s3 =` then indented sub-keys.
                let (head, nested) = match value.split_once('\n') {
                    Some((head, nested)) => (head, Some(nested)),
                    None => (value.as_str(), None),
                };
                write!(f, "{key} =")?;
                if !head.is_empty() {
                    write!(f, " {head}")?;
                }
                if let Some(nested) = nested {
                    write!(f, "\n{nested}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
