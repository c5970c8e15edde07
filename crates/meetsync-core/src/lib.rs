//! Core types: calendar events, appointments, time windows, availability

pub mod appointment;
pub mod availability;
pub mod event;
pub mod ids;
pub mod time;
pub mod tracing;

pub use appointment::{
    resolve_participants, Appointment, AppointmentEvent, AppointmentKind, AppointmentRequest,
    AppointmentStatus, EventDetails, Group, NewAppointment, NewAppointmentRequest, RequestStatus,
    RequestTarget,
};
pub use availability::{
    build_availability, build_availability_for_days, AvailabilityGrid, DayAvailability, SlotState,
};
pub use event::{CalendarEvent, ProviderKind, UnknownProvider};
pub use ids::{AppointmentId, GroupId, RequestId, UserId};
pub use time::{InvalidWindow, TimeWindow};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
