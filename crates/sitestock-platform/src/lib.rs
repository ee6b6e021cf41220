pub mod config;
pub mod contracts;

pub use config::AllocatorConfig;
pub use contracts::{
    AllocationRequestBody, AllocationSubmission, ProductRecord, SubmissionLine,
    parse_allocation_request, parse_batches, parse_purchase_date, parse_requested_quantity,
};
