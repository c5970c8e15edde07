//! Persistence contracts used by the orchestrator.
//!
//! Each store is a plain CRUD collaborator. Absence of a looked-up row is
//! [`StoreError::NotFound`]; every other failure is [`StoreError::Backend`].

use meetsync_core::{
    Appointment, AppointmentEvent, AppointmentId, AppointmentRequest, AppointmentStatus, Group,
    GroupId, NewAppointment, NewAppointmentRequest, RequestId, UserId,
};
use meetsync_providers::BoxFuture;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub trait AppointmentRequestStore: Send + Sync {
    /// Stores a new pending request and assigns its id.
    fn insert_request(
        &self,
        request: NewAppointmentRequest,
    ) -> BoxFuture<'_, StoreResult<AppointmentRequest>>;

    fn get_request(&self, id: RequestId) -> BoxFuture<'_, StoreResult<AppointmentRequest>>;

    /// Requests addressed directly to `user`.
    fn requests_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<AppointmentRequest>>>;

    fn requests_for_group(
        &self,
        group: GroupId,
    ) -> BoxFuture<'_, StoreResult<Vec<AppointmentRequest>>>;

    fn delete_request(&self, id: RequestId) -> BoxFuture<'_, StoreResult<()>>;

    /// Removes and returns a request in one step. Of several concurrent
    /// callers, exactly one gets the request; the others get `NotFound`.
    fn take_request(&self, id: RequestId) -> BoxFuture<'_, StoreResult<AppointmentRequest>>;

    /// Puts back a request previously taken, keeping its id.
    fn restore_request(&self, request: AppointmentRequest) -> BoxFuture<'_, StoreResult<()>>;
}

pub trait AppointmentStore: Send + Sync {
    /// Stores a new appointment and assigns its id.
    fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> BoxFuture<'_, StoreResult<Appointment>>;

    fn get_appointment(&self, id: AppointmentId) -> BoxFuture<'_, StoreResult<Appointment>>;

    /// Appointments `user` created or takes part in.
    fn appointments_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Appointment>>>;

    fn set_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> BoxFuture<'_, StoreResult<()>>;

    /// Deletes the appointment and any appointment-event rows still
    /// referencing it.
    fn delete_appointment(&self, id: AppointmentId) -> BoxFuture<'_, StoreResult<()>>;
}

pub trait AppointmentEventStore: Send + Sync {
    fn insert_appointment_event(&self, event: AppointmentEvent) -> BoxFuture<'_, StoreResult<()>>;

    fn appointment_events(
        &self,
        appointment: AppointmentId,
    ) -> BoxFuture<'_, StoreResult<Vec<AppointmentEvent>>>;

    fn delete_appointment_event<'a>(
        &'a self,
        event: &'a AppointmentEvent,
    ) -> BoxFuture<'a, StoreResult<()>>;
}

pub trait GroupStore: Send + Sync {
    fn get_group(&self, id: GroupId) -> BoxFuture<'_, StoreResult<Group>>;

    /// Groups that list `user` as a member.
    fn groups_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Group>>>;
}
