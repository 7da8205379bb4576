//! Caller identity, MFA device and session credential types.

use std::fmt;

use aws_smithy_types::DateTime;
use thiserror::Error;

/// Keys written to a session profile, in file order.
pub const ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const SESSION_TOKEN: &str = "aws_session_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub arn: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MfaDeviceError {
    #[error("caller `{arn}` is not an IAM user; cannot derive its MFA device")]
    NotAnIamUser { arn: String },
}

/// Serial number of the virtual MFA device registered to an IAM user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaDeviceId(String);

impl MfaDeviceId {
    /// Derives the device ARN from a caller ARN by swapping the `user` resource type for `mfa`.
    ///
    /// `arn:aws:iam::123456789012:user/alice` becomes `arn:aws:iam::123456789012:mfa/alice`.
    pub fn from_caller_arn(arn: &str) -> Result<Self, MfaDeviceError> {
        let not_a_user = || MfaDeviceError::NotAnIamUser { arn: arn.to_string() };

        let (prefix, resource) = arn.rsplit_once(':').ok_or_else(not_a_user)?;
        let mut parts = prefix.split(':');
        let is_iam = parts.next() == Some("arn") && parts.nth(1) == Some("iam");
        let name = resource.strip_prefix("user/").filter(|name| !name.is_empty());

        match name {
            Some(name) if is_iam => Ok(Self(format!("{prefix}:mfa/{name}"))),
            _ => Err(not_a_user()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MfaDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Temporary credentials issued for an MFA-authenticated session.
///
/// The secret and session token are kept out of `Debug` output.
#[derive(Clone)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

impl SessionCredentials {
    /// The key/value set stored under the session profile.
    pub fn profile_entries(&self) -> Vec<(String, String)> {
        vec![
            (ACCESS_KEY_ID.to_string(), self.access_key_id.clone()),
            (SECRET_ACCESS_KEY.to_string(), self.secret_access_key.clone()),
            (SESSION_TOKEN.to_string(), self.session_token.clone()),
        ]
    }
}

impl From<aws_sdk_sts::types::Credentials> for SessionCredentials {
    fn from(credentials: aws_sdk_sts::types::Credentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
            expiration: credentials.expiration,
        }
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}
