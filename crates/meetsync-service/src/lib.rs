//! Cross-provider appointment service.
//!
//! - [`EventAggregator`]: a user's events from every linked provider, and
//!   their free/busy availability
//! - [`Orchestrator`]: request submission, confirmation fan-out, deletion
//!   and reconciliation
//! - [`store`]: the persistence contracts, with [`MemoryStore`] as the
//!   in-process implementation

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod store;

pub use aggregator::EventAggregator;
pub use cache::EventCache;
pub use config::OrchestratorConfig;
pub use error::{ErrorKind, PairError, PairFailure, PairStage, ServiceError, ServiceResult};
pub use memory::MemoryStore;
pub use orchestrator::{
    ConfirmationReport, DeletionReport, Orchestrator, RequestAction, RespondOutcome, Stores,
};
pub use store::{
    AppointmentEventStore, AppointmentRequestStore, AppointmentStore, GroupStore, StoreError,
    StoreResult,
};
