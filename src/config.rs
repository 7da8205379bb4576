//! Base AWS configuration for the source profile.

use std::{future::Future, path::Path};

use aws_config::{
    BehaviorVersion, SdkConfig,
    profile::profile_file::{ProfileFileKind, ProfileFiles},
};
use aws_credential_types::provider::{ProvideCredentials, error::CredentialsError};
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("no credentials provider configured for profile `{profile}`")]
    NoProvider { profile: String },
    #[error("failed to load credentials for profile `{profile}`")]
    Credentials {
        profile: String,
        #[source]
        source: CredentialsError,
    },
}

/// Resolves the SDK configuration that the session exchange is made with.
pub trait ConfigLoader {
    /// Loads configuration for `profile`, reading credentials from `credentials_file` when given
    /// and from the default discovery chain otherwise.
    fn load(
        &self,
        profile: &str,
        credentials_file: Option<&Path>,
    ) -> impl Future<Output = Result<SdkConfig, ConfigLoadError>> + Send;
}

/// Loads configuration with `aws-config` and resolves the profile's credentials eagerly, so a
/// malformed file or unknown profile fails here rather than on the first service call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SdkConfigLoader;

impl ConfigLoader for SdkConfigLoader {
    async fn load(
        &self,
        profile: &str,
        credentials_file: Option<&Path>,
    ) -> Result<SdkConfig, ConfigLoadError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).profile_name(profile);
        if let Some(path) = credentials_file {
            debug!("Reading credentials from {}", path.display());
            let files = ProfileFiles::builder()
                .include_default_config_file(true)
                .with_file(ProfileFileKind::Credentials, path)
                .build();
            loader = loader.profile_files(files);
        }
        let config = loader.load().await;

        let provider = config
            .credentials_provider()
            .ok_or_else(|| ConfigLoadError::NoProvider { profile: profile.to_string() })?;
        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|source| ConfigLoadError::Credentials {
                profile: profile.to_string(),
                source,
            })?;
        debug!("Base credentials resolved - Access key: {}", credentials.access_key_id());

        Ok(config)
    }
}
