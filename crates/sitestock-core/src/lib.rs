pub mod error;
pub mod events;
pub mod models;
pub mod storage;

pub use error::AllocationError;
pub use events::{DomainEvent, DomainEventKind};
pub use models::{AllocationRequest, AllocationResult, Batch, BatchAllocation};
pub use storage::{EventEnvelope, EventStore};
