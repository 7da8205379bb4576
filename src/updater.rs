//! Session credentials updater.
//!
//! Exchanges the long-term credentials of a source profile plus an MFA code for temporary
//! session credentials, and stores them in the credentials file as `[<profile>-session]`:
//!
//! ```ini
//! [default]                          # long-term credentials, left untouched
//! aws_access_key_id=AKIA...
//! aws_secret_access_key=...
//!
//! [default-session]                  # written by this tool
//! aws_access_key_id = ASIA...
//! aws_secret_access_key = ...
//! aws_session_token = ...
//! ```
//!
//! Tools that cannot prompt for MFA then use `--profile default-session`. Every failure ends the
//! run; nothing is retried.

use std::{ops::RangeInclusive, path::PathBuf};

use aws_config::SdkConfig;
use aws_sdk_sts::config::Region;
use aws_smithy_types::DateTime;
use log::{debug, info};
use thiserror::Error;

use crate::{
    config::{ConfigLoadError, ConfigLoader},
    credentials::{MfaDeviceError, MfaDeviceId},
    exchange::{ExchangeError, SessionExchange},
    store::{CredentialStore, StoreError},
};

/// Session durations accepted by STS for IAM user sessions, in seconds.
pub const DURATION_RANGE: RangeInclusive<u32> = 900..=43_200;
/// Region used when neither the environment nor the profile sets one.
pub const FALLBACK_REGION: &str = "us-west-2";
/// Suffix appended to the source profile name to form the session profile name.
pub const SESSION_SUFFIX: &str = "-session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(
        "duration must be between 900 and 43200 seconds (15 minutes and 12 hours), got {0}"
    )]
    InvalidDuration(u32),
    #[error("an MFA token code is required")]
    MissingMfaToken,
    #[error("error loading configuration")]
    ConfigLoad(#[from] ConfigLoadError),
    #[error("error getting identity")]
    IdentityLookup(#[source] ExchangeError),
    #[error("error deriving MFA device")]
    MfaDevice(#[from] MfaDeviceError),
    #[error("error getting session token")]
    SessionToken(#[source] ExchangeError),
    #[error("error updating credentials file")]
    Store(#[from] StoreError),
}

/// Validated inputs for one run.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub mfa_code: String,
    pub duration: u32,
    pub source_profile: String,
    /// Credentials file to read from and write to. `None` uses the default discovery chain for
    /// reading and the updater's default store for writing.
    pub credentials_file: Option<PathBuf>,
}

impl SessionRequest {
    pub fn session_profile(&self) -> String {
        format!("{}{SESSION_SUFFIX}", self.source_profile)
    }
}

/// Where a run wrote its session and when that session expires.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub profile: String,
    pub path: PathBuf,
    pub expiration: DateTime,
}

/// Drives one session exchange. Configuration loading and the STS calls go through the injected
/// loader and exchange, so the whole flow runs against fakes in tests.
pub struct SessionUpdater<L, X> {
    loader: L,
    exchange: X,
    /// Store written to when the request names no credentials file (typically ~/.aws/credentials)
    default_store: PathBuf,
}

impl<L: ConfigLoader, X: SessionExchange> SessionUpdater<L, X> {
    pub fn new(loader: L, exchange: X, default_store: PathBuf) -> Self {
        Self { loader, exchange, default_store }
    }

    pub async fn run(&self, request: &SessionRequest) -> Result<SessionOutcome, SessionError> {
        let duration = i32::try_from(request.duration)
            .ok()
            .filter(|_| DURATION_RANGE.contains(&request.duration))
            .ok_or(SessionError::InvalidDuration(request.duration))?;
        if request.mfa_code.is_empty() {
            return Err(SessionError::MissingMfaToken);
        }

        let config = self
            .loader
            .load(&request.source_profile, request.credentials_file.as_deref())
            .await?;
        let config = with_fallback_region(config);

        let identity = self
            .exchange
            .who_am_i(&config)
            .await
            .map_err(SessionError::IdentityLookup)?;
        let device = MfaDeviceId::from_caller_arn(&identity.arn)?;
        info!("Requesting session for {} with MFA device {device}", identity.arn);

        let session = self
            .exchange
            .issue_session_token(&config, duration, &device, &request.mfa_code)
            .await
            .map_err(SessionError::SessionToken)?;
        debug!("Issued {session:?}");

        let profile = request.session_profile();
        let path = request
            .credentials_file
            .clone()
            .unwrap_or_else(|| self.default_store.clone());

        let mut store = CredentialStore::load_or_empty(&path)?;
        store.upsert(&profile, session.profile_entries());
        store.save(&path)?;
        info!("Wrote [{profile}] to {}", path.display());

        Ok(SessionOutcome { profile, path, expiration: session.expiration })
    }
}

fn with_fallback_region(config: SdkConfig) -> SdkConfig {
    if config.region().is_some() {
        return config;
    }
    debug!("No region configured, using {FALLBACK_REGION}");
    config
        .into_builder()
        .region(Region::new(FALLBACK_REGION))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_profile_appends_suffix() {
        let request = SessionRequest {
            mfa_code: "123456".to_string(),
            duration: 3600,
            source_profile: "work".to_string(),
            credentials_file: None,
        };
        assert_eq!(request.session_profile(), "work-session");
    }

    #[test]
    fn fallback_region_applies_only_when_unset() {
        let config = with_fallback_region(SdkConfig::builder().build());
        assert_eq!(config.region().map(|r| r.as_ref()), Some(FALLBACK_REGION));

        let config = SdkConfig::builder().region(Region::new("eu-central-1")).build();
        let config = with_fallback_region(config);
        assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-central-1"));
    }

    #[test]
    fn duration_bounds_are_inclusive() {
        assert!(DURATION_RANGE.contains(&900));
        assert!(DURATION_RANGE.contains(&43_200));
        assert!(!DURATION_RANGE.contains(&899));
        assert!(!DURATION_RANGE.contains(&43_201));
    }
}
