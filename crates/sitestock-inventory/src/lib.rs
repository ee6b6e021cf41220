pub mod allocation;
pub mod ledger;
pub mod plan;

pub use allocation::{allocate, allocate_request};
pub use ledger::{InMemoryLedger, StockLedger, TransferRequest};
pub use plan::{
    AllocationPlan, AllocationPolicy, GodownAvailability, ItemAllocation, ItemStock, Shortfall,
    availability_by_godown, plan_allocations,
};
