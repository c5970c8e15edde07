//! Appointment Confirmation Orchestrator.
//!
//! Drives a request from `pending` to declined (request deleted) or
//! confirmed (appointment stored, one remote event per participant and
//! linked provider, request deleted).
//!
//! Confirmation fans out one task per (participant, provider) pair, bounded
//! by [`OrchestratorConfig::max_concurrency`]. Every outcome is collected
//! before the result is decided:
//!
//! The request is claimed (removed from the store) before anything else
//! happens, so two concurrent answers cannot both act on it.
//!
//! | created | failed | result                                             |
//! |---------|--------|----------------------------------------------------|
//! | any     | none   | `confirmed`, request deleted                       |
//! | some    | some   | `confirmed_partial`, request deleted, reconcilable |
//! | none    | some   | appointment removed, request pending again, error  |

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use meetsync_core::{
    Appointment, AppointmentEvent, AppointmentId, AppointmentRequest, AppointmentStatus, Group,
    NewAppointment, NewAppointmentRequest, ProviderKind, RequestId, RequestTarget, UserId,
    resolve_participants,
};
use meetsync_providers::{CalendarProvider, Provider, ProviderRegistry};
use tracing::{error, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{PairError, PairFailure, PairStage, ServiceError, ServiceResult};
use crate::memory::MemoryStore;
use crate::store::{AppointmentEventStore, AppointmentRequestStore, AppointmentStore, GroupStore};

/// The persistence collaborators the orchestrator works against.
#[derive(Clone)]
pub struct Stores {
    pub requests: Arc<dyn AppointmentRequestStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub events: Arc<dyn AppointmentEventStore>,
    pub groups: Arc<dyn GroupStore>,
}

impl Stores {
    /// Backs every contract with the same in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            requests: store.clone(),
            appointments: store.clone(),
            events: store.clone(),
            groups: store,
        }
    }
}

/// The answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Confirm,
    Decline,
}

impl FromStr for RequestAction {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirm" | "confirmed" => Ok(Self::Confirm),
            "decline" | "declined" => Ok(Self::Decline),
            other => Err(ServiceError::invalid(format!("unknown action '{other}'"))),
        }
    }
}

/// What a successful confirmation produced.
#[derive(Debug)]
pub struct ConfirmationReport {
    pub appointment: Appointment,
    /// Rows recorded by this call, ordered by participant then provider.
    pub created: Vec<AppointmentEvent>,
    pub failures: Vec<PairFailure>,
}

impl ConfirmationReport {
    /// True if every pair received its event.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub enum RespondOutcome {
    Declined(RequestId),
    Confirmed(ConfirmationReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub appointment: AppointmentId,
    /// Remote events deleted (or already gone).
    pub removed: usize,
}

impl fmt::Display for DeletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "appointment {} deleted ({} remote events)", self.appointment, self.removed)
    }
}

/// Coordinates requests, appointments and provider writes.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    stores: Stores,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, stores: Stores, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            stores,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validates and stores a new pending request.
    pub async fn submit_request(
        &self,
        request: NewAppointmentRequest,
    ) -> ServiceResult<AppointmentRequest> {
        let details = &request.details;
        if details.title.trim().is_empty() {
            return Err(ServiceError::invalid("title must not be empty"));
        }
        if details.start >= details.end {
            return Err(ServiceError::invalid("start must be before end"));
        }
        match request.target {
            RequestTarget::User(target) if target == request.requester => {
                return Err(ServiceError::invalid("cannot send a request to yourself"));
            }
            RequestTarget::User(_) => {}
            RequestTarget::Group(group) => {
                self.stores.groups.get_group(group).await?;
            }
        }

        let stored = self.stores.requests.insert_request(request).await?;
        info!(
            request_id = %stored.id,
            requester = %stored.requester,
            kind = %stored.kind(),
            "request submitted"
        );
        Ok(stored)
    }

    /// Requests `user` may answer: addressed to them or to a group they
    /// belong to, excluding their own.
    pub async fn pending_requests(&self, user: UserId) -> ServiceResult<Vec<AppointmentRequest>> {
        let mut requests = self.stores.requests.requests_for_user(user).await?;
        for group in self.stores.groups.groups_for_user(user).await? {
            requests.extend(self.stores.requests.requests_for_group(group.id).await?);
        }
        requests.retain(|r| r.requester != user);
        requests.sort_by_key(|r| r.id);
        requests.dedup_by_key(|r| r.id);
        Ok(requests)
    }

    pub async fn appointments_for(&self, user: UserId) -> ServiceResult<Vec<Appointment>> {
        let mut appointments = self.stores.appointments.appointments_for_user(user).await?;
        appointments.sort_by_key(|a| a.id);
        Ok(appointments)
    }

    /// Confirms or declines a pending request on behalf of `acting`.
    ///
    /// Only the target user, or a member of the target group, may answer.
    pub async fn respond(
        &self,
        request_id: RequestId,
        acting: UserId,
        action: RequestAction,
    ) -> ServiceResult<RespondOutcome> {
        let request = self.stores.requests.get_request(request_id).await?;
        let group = match request.target {
            RequestTarget::Group(id) => Some(self.stores.groups.get_group(id).await?),
            RequestTarget::User(_) => None,
        };

        let allowed = match (&request.target, &group) {
            (RequestTarget::User(target), _) => *target == acting,
            (RequestTarget::Group(_), Some(group)) => group.has_member(acting),
            (RequestTarget::Group(_), None) => false,
        };
        if !allowed {
            warn!(request_id = %request_id, user_id = %acting, "respond refused");
            return Err(ServiceError::forbidden(
                acting,
                format!("respond to request {request_id}"),
            ));
        }

        // Claim the request so a concurrent answer finds it gone.
        let request = self.stores.requests.take_request(request.id).await?;
        match action {
            RequestAction::Decline => {
                info!(request_id = %request_id, user_id = %acting, "request declined");
                Ok(RespondOutcome::Declined(request_id))
            }
            RequestAction::Confirm => self
                .confirm(request, acting, group.as_ref())
                .await
                .map(RespondOutcome::Confirmed),
        }
    }

    /// Returns a claimed request to `pending` after a confirmation that
    /// produced nothing.
    async fn release_request(&self, request: AppointmentRequest) {
        let id = request.id;
        if let Err(e) = self.stores.requests.restore_request(request).await {
            error!(request_id = %id, error = %e, "failed to put request back");
        }
    }

    async fn confirm(
        &self,
        request: AppointmentRequest,
        acting: UserId,
        group: Option<&Group>,
    ) -> ServiceResult<ConfirmationReport> {
        let participants = resolve_participants(&request, acting, group);
        let inserted = self
            .stores
            .appointments
            .insert_appointment(NewAppointment {
                creator: request.requester,
                target: request.target,
                participants: participants.clone(),
                details: request.details.clone(),
                status: AppointmentStatus::Confirmed,
            })
            .await;
        let appointment = match inserted {
            Ok(appointment) => appointment,
            Err(e) => {
                self.release_request(request).await;
                return Err(e.into());
            }
        };
        info!(
            request_id = %request.id,
            appointment_id = %appointment.id,
            participants = participants.len(),
            "appointment created, fanning out"
        );

        let pairs = match self.linked_pairs(&participants).await {
            Ok(pairs) => pairs,
            Err(e) => {
                error!(appointment_id = %appointment.id, error = %e, "provider lookup failed");
                self.discard_appointment(appointment.id).await;
                self.release_request(request).await;
                return Err(e);
            }
        };

        let (created, failures) = self.create_pairs(&appointment, pairs).await;

        if created.is_empty() && !failures.is_empty() {
            error!(
                request_id = %request.id,
                appointment_id = %appointment.id,
                failed = failures.len(),
                "no provider event created, request stays pending"
            );
            self.discard_appointment(appointment.id).await;
            self.release_request(request).await;
            return Err(ServiceError::NothingConfirmed { failures });
        }

        let mut appointment = appointment;
        if !failures.is_empty() {
            let status = self
                .stores
                .appointments
                .set_appointment_status(appointment.id, AppointmentStatus::ConfirmedPartial)
                .await;
            if let Err(source) = status {
                error!(
                    appointment_id = %appointment.id,
                    error = %source,
                    "partial confirmation not recorded, reconcile required"
                );
                return Err(ServiceError::ConfirmationIncomplete {
                    report: Box::new(ConfirmationReport {
                        appointment,
                        created,
                        failures,
                    }),
                    source,
                });
            }
            appointment.status = AppointmentStatus::ConfirmedPartial;
        }

        info!(
            request_id = %request.id,
            appointment_id = %appointment.id,
            status = %appointment.status,
            created = created.len(),
            failed = failures.len(),
            "request confirmed"
        );
        Ok(ConfirmationReport {
            appointment,
            created,
            failures,
        })
    }

    /// Creates the remote events still missing for a `confirmed_partial`
    /// appointment, and promotes it to `confirmed` once none are missing.
    pub async fn reconcile(&self, appointment_id: AppointmentId) -> ServiceResult<ConfirmationReport> {
        let mut appointment = self.stores.appointments.get_appointment(appointment_id).await?;
        let existing: BTreeSet<(UserId, ProviderKind)> = self
            .stores
            .events
            .appointment_events(appointment_id)
            .await?
            .iter()
            .map(AppointmentEvent::pair)
            .collect();

        let missing: Vec<_> = self
            .linked_pairs(&appointment.participants)
            .await?
            .into_iter()
            .filter(|(user, provider)| !existing.contains(&(*user, provider.kind())))
            .collect();

        let (created, failures) = self.create_pairs(&appointment, missing).await;

        if failures.is_empty() && appointment.status != AppointmentStatus::Confirmed {
            self.stores
                .appointments
                .set_appointment_status(appointment_id, AppointmentStatus::Confirmed)
                .await?;
            appointment.status = AppointmentStatus::Confirmed;
        }

        info!(
            appointment_id = %appointment_id,
            status = %appointment.status,
            created = created.len(),
            failed = failures.len(),
            "reconciled"
        );
        Ok(ConfirmationReport {
            appointment,
            created,
            failures,
        })
    }

    /// Deletes an appointment and its remote events.
    ///
    /// Only someone the appointment involves may delete it. If any remote
    /// delete fails, the appointment and the rows still to delete are kept
    /// and [`ServiceError::DeletionIncomplete`] is returned; retrying only
    /// touches what is left.
    pub async fn delete_appointment(
        &self,
        appointment_id: AppointmentId,
        acting: UserId,
    ) -> ServiceResult<DeletionReport> {
        let appointment = self.stores.appointments.get_appointment(appointment_id).await?;
        if !appointment.involves(acting) {
            warn!(appointment_id = %appointment_id, user_id = %acting, "delete refused");
            return Err(ServiceError::forbidden(
                acting,
                format!("delete appointment {appointment_id}"),
            ));
        }

        let rows = self.stores.events.appointment_events(appointment_id).await?;
        let outcomes = self.fan_out(rows, |row| self.delete_row(row)).await;
        let mut removed = 0;
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(()) => removed += 1,
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            error!(
                appointment_id = %appointment_id,
                removed,
                failed = failures.len(),
                "appointment deletion incomplete"
            );
            return Err(ServiceError::DeletionIncomplete {
                appointment: appointment_id,
                removed,
                failures,
            });
        }

        self.stores.appointments.delete_appointment(appointment_id).await?;
        info!(appointment_id = %appointment_id, user_id = %acting, removed, "appointment deleted");
        Ok(DeletionReport {
            appointment: appointment_id,
            removed,
        })
    }

    /// Every (participant, linked provider) pair.
    async fn linked_pairs(&self, participants: &[UserId]) -> ServiceResult<Vec<(UserId, Provider)>> {
        let mut pairs = Vec::new();
        for &user in participants {
            for provider in self.registry.linked_providers(user).await? {
                pairs.push((user, provider));
            }
        }
        Ok(pairs)
    }

    async fn create_pairs(
        &self,
        appointment: &Appointment,
        pairs: Vec<(UserId, Provider)>,
    ) -> (Vec<AppointmentEvent>, Vec<PairFailure>) {
        let outcomes = self
            .fan_out(pairs, |(user, provider)| self.create_pair(appointment, user, provider))
            .await;

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(row) => created.push(row),
                Err(failure) => failures.push(failure),
            }
        }
        created.sort_by_key(|row| row.pair());
        failures.sort_by_key(|f| (f.user_id, f.provider));
        (created, failures)
    }

    async fn create_pair(
        &self,
        appointment: &Appointment,
        user: UserId,
        provider: Provider,
    ) -> Result<AppointmentEvent, PairFailure> {
        let kind = provider.kind();
        let fail = |stage: PairStage, error: PairError| {
            let failure = PairFailure::new(user, kind, stage, error);
            warn!(appointment_id = %appointment.id, error = %failure, "pair failed");
            failure
        };

        let client = self
            .registry
            .client_for(user, &provider)
            .await
            .map_err(|e| fail(PairStage::Connect, e.into()))?;
        let event_id = provider
            .create_event(user, &client, &appointment.details)
            .await
            .map_err(|e| fail(PairStage::CreateEvent, e.into()))?;

        let row = AppointmentEvent::new(appointment.id, user, kind, &event_id);
        if let Err(e) = self.stores.events.insert_appointment_event(row.clone()).await {
            // Nothing references the remote event now
            if let Err(cleanup) = provider
                .delete_event(user, &client, provider.name(), &event_id)
                .await
            {
                error!(
                    appointment_id = %appointment.id,
                    user_id = %user,
                    provider = %kind,
                    event_id = %event_id,
                    error = %cleanup,
                    "orphaned remote event"
                );
            }
            return Err(fail(PairStage::RecordEvent, e.into()));
        }
        Ok(row)
    }

    async fn delete_row(&self, row: AppointmentEvent) -> Result<(), PairFailure> {
        let (user, kind) = row.pair();
        let fail = |stage: PairStage, error: PairError| {
            let failure = PairFailure::new(user, kind, stage, error);
            warn!(appointment_id = %row.appointment_id, error = %failure, "pair failed");
            failure
        };

        let provider = self
            .registry
            .provider_by_name(user, row.provider.as_str())
            .map_err(|e| fail(PairStage::Connect, e.into()))?;
        let client = self
            .registry
            .client_for(user, &provider)
            .await
            .map_err(|e| fail(PairStage::Connect, e.into()))?;

        match provider
            .delete_event(user, &client, row.provider.as_str(), &row.provider_event_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() && self.config.tolerate_missing_remote_on_delete => {
                info!(event_id = %row.provider_event_id, provider = %kind, "remote event already gone");
            }
            Err(e) => return Err(fail(PairStage::DeleteEvent, e.into())),
        }

        self.stores
            .events
            .delete_appointment_event(&row)
            .await
            .map_err(|e| fail(PairStage::RemoveRecord, e.into()))
    }

    /// Runs `task` over `items`, at most `max_concurrency` at a time, and
    /// collects every outcome.
    async fn fan_out<T, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<Fut::Output>
    where
        F: FnMut(T) -> Fut,
        Fut: Future,
    {
        stream::iter(items)
            .map(task)
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await
    }

    async fn discard_appointment(&self, id: AppointmentId) {
        if let Err(e) = self.stores.appointments.delete_appointment(id).await {
            error!(appointment_id = %id, error = %e, "failed to remove unconfirmed appointment");
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
