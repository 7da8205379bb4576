//! Exchange long-term AWS credentials plus an MFA code for a session profile.
//!
//! [`updater::SessionUpdater`] runs the exchange. It reaches AWS only through the
//! [`config::ConfigLoader`] and [`exchange::SessionExchange`] traits, and persists the result with
//! [`store::CredentialStore`].

pub mod cli;
pub mod config;
pub mod credentials;
pub mod exchange;
pub mod paths;
pub mod store;
pub mod updater;
