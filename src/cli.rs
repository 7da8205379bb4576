//! Command-line interface definitions.

use clap::Parser;

/// AWS MFA session profile writer.
///
/// Uses the long-term credentials of `--profile` and an MFA code to request temporary session
/// credentials, then writes them to the `[<profile>-session]` profile of the credentials file.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    after_help = "Example: aws-mfa-session --mfa-token 123456 --profile default --duration 3600 --creds-file ~/.aws/credentials"
)]
pub struct Args {
    /// Current code from the MFA device (required)
    #[arg(long, default_value = "", hide_default_value = true)]
    pub mfa_token: String,

    /// Profile holding the long-term credentials
    #[arg(long, default_value = "default")]
    pub profile: String,

    /// Session duration in seconds (900-43200)
    #[arg(long, env = "AWS_SESSION_DURATION", default_value_t = 3600)]
    pub duration: u32,

    /// Path to AWS credentials file; `~` and `$VARS` are expanded [default: ~/.aws/credentials]
    #[arg(long, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub creds_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "aws-mfa-session",
            "--mfa-token",
            "123456",
            "--profile",
            "work",
            "--duration",
            "900",
            "--creds-file",
            "~/creds",
        ])
        .unwrap();

        assert_eq!(args.mfa_token, "123456");
        assert_eq!(args.profile, "work");
        assert_eq!(args.duration, 900);
        assert_eq!(args.creds_file.as_deref(), Some("~/creds"));
    }

    #[test]
    fn mfa_token_defaults_to_empty() {
        let args = Args::try_parse_from(["aws-mfa-session", "--profile", "p"]).unwrap();
        assert!(args.mfa_token.is_empty());
        assert_eq!(args.profile, "p");
    }
}
