//! Google Calendar provider.
//!
//! Talks to the Calendar API v3 with a user's OAuth access token. Recurring
//! events are expanded server-side (`singleEvents=true`), so every fetched
//! event is one concrete occurrence.

mod client;
mod config;
mod provider;

pub use config::GoogleConfig;
pub use provider::GoogleProvider;
