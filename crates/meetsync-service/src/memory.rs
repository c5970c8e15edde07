//! In-memory implementation of every store contract.

use std::collections::BTreeMap;

use chrono::Utc;
use meetsync_core::{
    Appointment, AppointmentEvent, AppointmentId, AppointmentRequest, AppointmentStatus, Group,
    GroupId, NewAppointment, NewAppointmentRequest, RequestId, UserId,
};
use meetsync_providers::BoxFuture;
use tokio::sync::Mutex;
use tracing::trace;

use crate::store::{
    AppointmentEventStore, AppointmentRequestStore, AppointmentStore, GroupStore, StoreError,
    StoreResult,
};

#[derive(Debug, Default)]
struct State {
    last_request_id: i64,
    last_appointment_id: i64,
    requests: BTreeMap<RequestId, AppointmentRequest>,
    appointments: BTreeMap<AppointmentId, Appointment>,
    events: Vec<AppointmentEvent>,
    groups: BTreeMap<GroupId, Group>,
}

/// A process-local store. Ids are assigned sequentially from 1.
///
/// Deleting an appointment cascades to its appointment-event rows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a group.
    pub fn with_group(mut self, group: Group) -> Self {
        self.state.get_mut().groups.insert(group.id, group);
        self
    }

    pub async fn insert_group(&self, group: Group) {
        self.state.lock().await.groups.insert(group.id, group);
    }

    /// Every appointment-event row, ordered by appointment then insertion.
    pub async fn all_appointment_events(&self) -> Vec<AppointmentEvent> {
        let mut events = self.state.lock().await.events.clone();
        events.sort_by_key(|e| e.appointment_id);
        events
    }

    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    pub async fn appointment_count(&self) -> usize {
        self.state.lock().await.appointments.len()
    }
}

impl AppointmentRequestStore for MemoryStore {
    fn insert_request(
        &self,
        request: NewAppointmentRequest,
    ) -> BoxFuture<'_, StoreResult<AppointmentRequest>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.last_request_id += 1;
            let id = RequestId(state.last_request_id);
            let stored = AppointmentRequest::from_new(id, request, Utc::now());
            state.requests.insert(id, stored.clone());
            trace!(request_id = %id, "stored request");
            Ok(stored)
        })
    }

    fn get_request(&self, id: RequestId) -> BoxFuture<'_, StoreResult<AppointmentRequest>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .requests
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("request", id))
        })
    }

    fn requests_for_user(
        &self,
        user: UserId,
    ) -> BoxFuture<'_, StoreResult<Vec<AppointmentRequest>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .requests
                .values()
                .filter(|r| r.target.user() == Some(user))
                .cloned()
                .collect())
        })
    }

    fn requests_for_group(
        &self,
        group: GroupId,
    ) -> BoxFuture<'_, StoreResult<Vec<AppointmentRequest>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .requests
                .values()
                .filter(|r| r.target.group() == Some(group))
                .cloned()
                .collect())
        })
    }

    fn delete_request(&self, id: RequestId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            match self.state.lock().await.requests.remove(&id) {
                Some(_) => Ok(()),
                None => Err(StoreError::not_found("request", id)),
            }
        })
    }

    fn take_request(&self, id: RequestId) -> BoxFuture<'_, StoreResult<AppointmentRequest>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .requests
                .remove(&id)
                .ok_or_else(|| StoreError::not_found("request", id))
        })
    }

    fn restore_request(&self, request: AppointmentRequest) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.requests.contains_key(&request.id) {
                return Err(StoreError::backend(format!("request {} already exists", request.id)));
            }
            trace!(request_id = %request.id, "restored request");
            state.requests.insert(request.id, request);
            Ok(())
        })
    }
}

impl AppointmentStore for MemoryStore {
    fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> BoxFuture<'_, StoreResult<Appointment>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.last_appointment_id += 1;
            let id = AppointmentId(state.last_appointment_id);
            let stored = Appointment::from_new(id, appointment);
            state.appointments.insert(id, stored.clone());
            Ok(stored)
        })
    }

    fn get_appointment(&self, id: AppointmentId) -> BoxFuture<'_, StoreResult<Appointment>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .appointments
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("appointment", id))
        })
    }

    fn appointments_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Appointment>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .appointments
                .values()
                .filter(|a| a.involves(user))
                .cloned()
                .collect())
        })
    }

    fn set_appointment_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let appointment = state
                .appointments
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("appointment", id))?;
            appointment.status = status;
            Ok(())
        })
    }

    fn delete_appointment(&self, id: AppointmentId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.appointments.remove(&id).is_none() {
                return Err(StoreError::not_found("appointment", id));
            }
            state.events.retain(|e| e.appointment_id != id);
            Ok(())
        })
    }
}

impl AppointmentEventStore for MemoryStore {
    fn insert_appointment_event(&self, event: AppointmentEvent) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if !state.appointments.contains_key(&event.appointment_id) {
                return Err(StoreError::not_found("appointment", event.appointment_id));
            }
            state.events.push(event);
            Ok(())
        })
    }

    fn appointment_events(
        &self,
        appointment: AppointmentId,
    ) -> BoxFuture<'_, StoreResult<Vec<AppointmentEvent>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .events
                .iter()
                .filter(|e| e.appointment_id == appointment)
                .cloned()
                .collect())
        })
    }

    fn delete_appointment_event<'a>(
        &'a self,
        event: &'a AppointmentEvent,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let before = state.events.len();
            state.events.retain(|e| e != event);
            if state.events.len() == before {
                return Err(StoreError::not_found("appointment event", &event.provider_event_id));
            }
            Ok(())
        })
    }
}

impl GroupStore for MemoryStore {
    fn get_group(&self, id: GroupId) -> BoxFuture<'_, StoreResult<Group>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .groups
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("group", id))
        })
    }

    fn groups_for_user(&self, user: UserId) -> BoxFuture<'_, StoreResult<Vec<Group>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .groups
                .values()
                .filter(|g| g.has_member(user))
                .cloned()
                .collect())
        })
    }
}
