//! Appointment requests, confirmed appointments and their provider mappings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::ProviderKind;
use crate::ids::{AppointmentId, GroupId, RequestId, UserId};

/// Who a request is addressed to.
///
/// Exactly one of a direct user or a group determines the participant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum RequestTarget {
    User(UserId),
    Group(GroupId),
}

impl RequestTarget {
    /// Returns the appointment kind this target produces.
    pub fn kind(&self) -> AppointmentKind {
        match self {
            Self::User(_) => AppointmentKind::Individual,
            Self::Group(_) => AppointmentKind::Group,
        }
    }

    /// Returns the direct target user, if any.
    pub fn user(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Group(_) => None,
        }
    }

    /// Returns the target group, if any.
    pub fn group(&self) -> Option<GroupId> {
        match self {
            Self::Group(id) => Some(*id),
            Self::User(_) => None,
        }
    }
}

/// The appointment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentKind {
    Individual,
    Group,
}

impl AppointmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a stored request. Requests are deleted on resolution, so
/// `Pending` is the only state ever persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
}

/// The event details shared by requests, appointments and provider writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventDetails {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A proposal awaiting acceptance, before it has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointmentRequest {
    pub requester: UserId,
    pub target: RequestTarget,
    pub details: EventDetails,
}

impl NewAppointmentRequest {
    pub fn new(requester: UserId, target: RequestTarget, details: EventDetails) -> Self {
        Self {
            requester,
            target,
            details,
        }
    }
}

/// A stored proposal awaiting acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub id: RequestId,
    pub requester: UserId,
    pub target: RequestTarget,
    pub details: EventDetails,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentRequest {
    /// Builds the stored form of a new request.
    pub fn from_new(id: RequestId, new: NewAppointmentRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            requester: new.requester,
            target: new.target,
            details: new.details,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> AppointmentKind {
        self.target.kind()
    }
}

/// Status of a confirmed appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Every (participant, provider) pair received its event.
    Confirmed,
    /// Some pairs are missing their remote event and await reconciliation.
    ConfirmedPartial,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::ConfirmedPartial => "confirmed_partial",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An appointment about to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub creator: UserId,
    pub target: RequestTarget,
    pub participants: Vec<UserId>,
    pub details: EventDetails,
    pub status: AppointmentStatus,
}

/// A confirmed appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub creator: UserId,
    pub target: RequestTarget,
    /// Participants resolved at confirmation time.
    pub participants: Vec<UserId>,
    pub details: EventDetails,
    pub kind: AppointmentKind,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn from_new(id: AppointmentId, new: NewAppointment) -> Self {
        Self {
            id,
            kind: new.target.kind(),
            creator: new.creator,
            target: new.target,
            participants: new.participants,
            details: new.details,
            status: new.status,
        }
    }

    /// Returns `true` if `user` created, was targeted by, or takes part in
    /// this appointment.
    pub fn involves(&self, user: UserId) -> bool {
        self.creator == user || self.target.user() == Some(user) || self.participants.contains(&user)
    }
}

/// Maps one appointment to one remote event for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub appointment_id: AppointmentId,
    pub user_id: UserId,
    pub provider: ProviderKind,
    pub provider_event_id: String,
}

impl AppointmentEvent {
    pub fn new(
        appointment_id: AppointmentId,
        user_id: UserId,
        provider: ProviderKind,
        provider_event_id: impl Into<String>,
    ) -> Self {
        Self {
            appointment_id,
            user_id,
            provider,
            provider_event_id: provider_event_id.into(),
        }
    }

    /// Returns the `(participant, provider)` pair this row covers.
    pub fn pair(&self) -> (UserId, ProviderKind) {
        (self.user_id, self.provider)
    }
}

/// A group of users with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<UserId>,
}

impl Group {
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}

/// Resolves the participants of a request accepted by `accepting`.
///
/// Individual requests yield `{requester, accepting}`; group requests yield
/// the group members plus the accepting user. The result is sorted and free
/// of duplicates.
pub fn resolve_participants(
    request: &AppointmentRequest,
    accepting: UserId,
    group: Option<&Group>,
) -> Vec<UserId> {
    let mut participants = match (request.target, group) {
        (RequestTarget::Group(_), Some(group)) => group.members.clone(),
        (RequestTarget::Group(_), None) => Vec::new(),
        (RequestTarget::User(_), _) => vec![request.requester],
    };
    participants.push(accepting);
    participants.sort();
    participants.dedup();
    participants
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(target: RequestTarget) -> AppointmentRequest {
        let start = Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 6, 2, 12, 0, 0).unwrap();
        AppointmentRequest::from_new(
            RequestId(1),
            NewAppointmentRequest::new(UserId(1), target, EventDetails::new("Sync", start, end)),
            start,
        )
    }

    #[test]
    fn individual_participants_are_requester_and_acceptor() {
        let req = request(RequestTarget::User(UserId(2)));
        assert_eq!(req.kind(), AppointmentKind::Individual);
        assert_eq!(resolve_participants(&req, UserId(2), None), vec![UserId(1), UserId(2)]);
    }

    #[test]
    fn group_participants_are_members_plus_acceptor() {
        let req = request(RequestTarget::Group(GroupId(9)));
        let group = Group {
            id: GroupId(9),
            name: "ops".into(),
            members: vec![UserId(4), UserId(3), UserId(5)],
        };
        assert_eq!(
            resolve_participants(&req, UserId(5), Some(&group)),
            vec![UserId(3), UserId(4), UserId(5)]
        );
        assert_eq!(
            resolve_participants(&req, UserId(7), Some(&group)),
            vec![UserId(3), UserId(4), UserId(5), UserId(7)]
        );
    }

    #[test]
    fn appointment_involvement() {
        let req = request(RequestTarget::User(UserId(2)));
        let appt = Appointment::from_new(
            AppointmentId(1),
            NewAppointment {
                creator: req.requester,
                target: req.target,
                participants: vec![UserId(1), UserId(2)],
                details: req.details.clone(),
                status: AppointmentStatus::Confirmed,
            },
        );
        assert!(appt.involves(UserId(1)));
        assert!(appt.involves(UserId(2)));
        assert!(!appt.involves(UserId(3)));
        assert_eq!(appt.kind, AppointmentKind::Individual);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::ConfirmedPartial).unwrap();
        assert_eq!(json, "\"confirmed_partial\"");
        let target = serde_json::to_value(RequestTarget::Group(GroupId(3))).unwrap();
        assert_eq!(target, serde_json::json!({"type": "group", "id": 3}));
    }
}
