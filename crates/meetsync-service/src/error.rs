//! Service error types.

use std::fmt;

use meetsync_core::{AppointmentId, ProviderKind, UserId};
use meetsync_providers::{ProviderError, ProviderErrorCode, RegistryError};
use thiserror::Error;

use crate::orchestrator::ConfirmationReport;
use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidRequest,
    /// Network, timeout, throttling or 5xx from a provider. Worth retrying.
    ProviderTransient,
    /// A provider refused the call. Retrying will not help.
    ProviderRejected,
    Persistence,
    /// Some or all provider writes failed; see the attached failures.
    Incomplete,
    Internal,
}

fn provider_kind(err: &ProviderError) -> ErrorKind {
    if err.is_transient() {
        return ErrorKind::ProviderTransient;
    }
    match err.code() {
        ProviderErrorCode::ConfigurationError
        | ProviderErrorCode::ProviderMismatch
        | ProviderErrorCode::InternalError => ErrorKind::Internal,
        _ => ErrorKind::ProviderRejected,
    }
}

/// Which step of a (participant, provider) operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStage {
    /// Resolving the provider or building its authenticated client.
    Connect,
    CreateEvent,
    /// Recording the appointment-event row after a successful create.
    RecordEvent,
    DeleteEvent,
    /// Removing the appointment-event row after a successful delete.
    RemoveRecord,
}

impl fmt::Display for PairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connect => "connect",
            Self::CreateEvent => "create event",
            Self::RecordEvent => "record event",
            Self::DeleteEvent => "delete event",
            Self::RemoveRecord => "remove record",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PairError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PairError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(e) => registry_kind(e),
            Self::Provider(e) => provider_kind(e),
            Self::Store(_) => ErrorKind::Persistence,
        }
    }
}

/// One failed (participant, provider) operation.
#[derive(Debug, Error)]
#[error("{stage} failed for user {user_id} on {provider}: {error}")]
pub struct PairFailure {
    pub user_id: UserId,
    pub provider: ProviderKind,
    pub stage: PairStage,
    #[source]
    pub error: PairError,
}

impl PairFailure {
    pub fn new(
        user_id: UserId,
        provider: ProviderKind,
        stage: PairStage,
        error: impl Into<PairError>,
    ) -> Self {
        Self {
            user_id,
            provider,
            stage,
            error: error.into(),
        }
    }
}

fn registry_kind(err: &RegistryError) -> ErrorKind {
    match err {
        RegistryError::CredentialStore { .. } => ErrorKind::Persistence,
        RegistryError::NotLinked { .. } => ErrorKind::NotFound,
        RegistryError::Refresh { source, .. } => provider_kind(source),
        RegistryError::UnknownProvider(_) | RegistryError::NotConfigured(_) => ErrorKind::Internal,
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("user {user} is not allowed to {action}")]
    Forbidden { user: UserId, action: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(StoreError),

    /// No remote event could be created; the request is still pending.
    #[error("no calendar event could be created ({} failures)", .failures.len())]
    NothingConfirmed { failures: Vec<PairFailure> },

    /// Remote events were created and the request consumed, but the
    /// appointment status could not be recorded. `reconcile` repairs it.
    #[error(
        "appointment {} confirmed with {} events but its status was not saved: {source}",
        .report.appointment.id,
        .report.created.len()
    )]
    ConfirmationIncomplete {
        report: Box<ConfirmationReport>,
        #[source]
        source: StoreError,
    },

    /// Some remote events could not be deleted; the appointment remains
    /// with the rows that still need deleting.
    #[error(
        "appointment {appointment} partially deleted: {removed} removed, {} failed",
        .failures.len()
    )]
    DeletionIncomplete {
        appointment: AppointmentId,
        removed: usize,
        failures: Vec<PairFailure>,
    },
}

impl ServiceError {
    pub fn forbidden(user: UserId, action: impl Into<String>) -> Self {
        Self::Forbidden {
            user,
            action: action.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Provider(e) => provider_kind(e),
            Self::Registry(e) => registry_kind(e),
            Self::Store(_) => ErrorKind::Persistence,
            Self::NothingConfirmed { .. }
            | Self::ConfirmationIncomplete { .. }
            | Self::DeletionIncomplete { .. } => ErrorKind::Incomplete,
        }
    }

    /// Per-pair failures carried by incomplete outcomes.
    pub fn failures(&self) -> &[PairFailure] {
        match self {
            Self::NothingConfirmed { failures } | Self::DeletionIncomplete { failures, .. } => {
                failures
            }
            Self::ConfirmationIncomplete { report, .. } => &report.failures,
            _ => &[],
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Store(other),
        }
    }
}
