//! AWS MFA Session Profile Writer
//!
//! Exchanges the long-term credentials of a profile plus an MFA code for temporary credentials
//! and stores them as `[<profile>-session]` in the shared credentials file.
//!
//! 1. Parses command-line arguments
//! 2. Expands and checks the credentials file path
//! 3. Wires the live AWS configuration loader and STS client into the updater
//! 4. Runs the session exchange and writes the session profile

use anyhow::{Context, Result};
use aws_smithy_types::date_time::Format;
use clap::{CommandFactory, Parser};
use log::info;

use aws_mfa_session::{
    cli::Args,
    config::SdkConfigLoader,
    exchange::StsExchange,
    paths,
    updater::{SessionRequest, SessionUpdater},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Args {
        mfa_token,
        profile,
        duration,
        creds_file,
    } = Args::parse();

    // Shells don't expand `~` in `--creds-file=~/.aws/credentials`, so expand it here.
    let credentials_file = creds_file
        .filter(|path| !path.is_empty())
        .map(|path| paths::resolve_existing(&path))
        .transpose()?;

    if mfa_token.is_empty() {
        println!("MFA token is required\n");
        Args::command().print_help()?;
        return Ok(());
    }

    let config_file = credentials_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<default chain>".to_string());
    info!("MFA Token: {mfa_token}");
    info!("Profile: {profile}");
    info!("Duration: {duration}");
    info!("Config File: {config_file}");

    let default_store = paths::default_credentials_path().context("Could not determine home directory")?;
    let updater = SessionUpdater::new(SdkConfigLoader, StsExchange, default_store);
    let request = SessionRequest {
        mfa_code: mfa_token,
        duration,
        source_profile: profile,
        credentials_file,
    };

    let outcome = updater.run(&request).await?;
    let expiration = outcome.expiration.fmt(Format::DateTime)?;
    info!("Success! Use --profile {}; credentials expire at: {expiration}", outcome.profile);

    Ok(())
}
