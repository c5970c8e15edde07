//! Microsoft Outlook calendar provider, over Microsoft Graph.
//!
//! Events are listed through `/me/calendarview`, which expands recurring
//! series into occurrences. Times are requested in UTC via the
//! `Prefer: outlook.timezone` header.

mod client;
mod config;
mod provider;

pub use config::MicrosoftConfig;
pub use provider::MicrosoftProvider;
