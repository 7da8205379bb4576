//! Identity lookup and session token exchange with AWS STS.

use std::future::Future;

use aws_config::SdkConfig;
use aws_sdk_sts::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use log::debug;
use thiserror::Error;

use crate::credentials::{CallerIdentity, MfaDeviceId, SessionCredentials};

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The service call failed; holds the rendered SDK error with its full cause chain.
    #[error("{0}")]
    Service(String),
    #[error("response did not include {0}")]
    MissingField(&'static str),
}

impl ExchangeError {
    fn service(err: impl std::error::Error) -> Self {
        Self::Service(DisplayErrorContext(err).to_string())
    }
}

/// The two calls a session exchange needs. No retries happen behind this interface.
pub trait SessionExchange {
    /// Returns the identity the configured credentials belong to.
    fn who_am_i(
        &self,
        config: &SdkConfig,
    ) -> impl Future<Output = Result<CallerIdentity, ExchangeError>> + Send;

    /// Trades the configured long-term credentials and an MFA code for temporary credentials.
    fn issue_session_token(
        &self,
        config: &SdkConfig,
        duration: i32,
        serial_number: &MfaDeviceId,
        token_code: &str,
    ) -> impl Future<Output = Result<SessionCredentials, ExchangeError>> + Send;
}

/// Live exchange backed by `aws-sdk-sts`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StsExchange;

impl SessionExchange for StsExchange {
    async fn who_am_i(&self, config: &SdkConfig) -> Result<CallerIdentity, ExchangeError> {
        let output = Client::new(config)
            .get_caller_identity()
            .send()
            .await
            .map_err(ExchangeError::service)?;
        debug!("Caller account: {:?}", output.account());

        output
            .arn()
            .map(|arn| CallerIdentity { arn: arn.to_string() })
            .ok_or(ExchangeError::MissingField("an ARN"))
    }

    async fn issue_session_token(
        &self,
        config: &SdkConfig,
        duration: i32,
        serial_number: &MfaDeviceId,
        token_code: &str,
    ) -> Result<SessionCredentials, ExchangeError> {
        Client::new(config)
            .get_session_token()
            .duration_seconds(duration)
            .serial_number(serial_number.as_str())
            .token_code(token_code)
            .send()
            .await
            .map_err(ExchangeError::service)?
            .credentials
            .map(SessionCredentials::from)
            .ok_or(ExchangeError::MissingField("credentials"))
    }
}
