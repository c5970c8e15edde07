//! Calendar provider abstraction layer.
//!
//! - [`CalendarProvider`]: the contract every calendar backend implements
//! - [`Provider`]: the closed set of backends (Google, Microsoft)
//! - [`RawEvent`] and [`normalize_event`]: provider payloads to [`CalendarEvent`]
//! - [`CredentialStore`]: per-user OAuth credentials, in memory or on disk
//! - [`ProviderRegistry`]: linked providers and authenticated clients per user
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐
//! │ Calendar v3  │   │ Microsoft Graph  │
//! └──────┬───────┘   └────────┬─────────┘
//!        ▼                    ▼
//! ┌──────────────┐   ┌──────────────────┐
//! │GoogleProvider│   │MicrosoftProvider │
//! └──────┬───────┘   └────────┬─────────┘
//!        └───── Provider ─────┘
//!                  │
//!                  ▼ normalize_events()
//!           ┌───────────────┐
//!           │ CalendarEvent │
//!           └───────────────┘
//! ```
//!
//! [`CalendarEvent`]: meetsync_core::CalendarEvent

pub mod credential;
pub mod error;
pub mod file_store;
pub mod google;
mod http;
pub mod microsoft;
pub mod normalize;
pub mod oauth;
pub mod provider;
pub mod raw_event;
pub mod registry;

pub use credential::{Credential, CredentialStore, CredentialStoreError, MemoryCredentialStore};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use file_store::FileCredentialStore;
pub use google::{GoogleConfig, GoogleProvider};
pub use microsoft::{MicrosoftConfig, MicrosoftProvider};
pub use normalize::{TimestampPolicy, normalize_event, normalize_events};
pub use oauth::OAuthCredentials;
pub use provider::{BoxFuture, CalendarProvider, NewEventData, Provider, ProviderClient};
pub use raw_event::{RawEvent, RawEventTime};
pub use registry::{ProviderRegistry, ProvidersConfig, RegistryError};
