use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient stock for {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("batch {batch_id} already recorded for {item_id}")]
    DuplicateBatch { item_id: String, batch_id: String },

    #[error("batch {batch_id} not found for {item_id}")]
    UnknownBatch { item_id: String, batch_id: String },

    #[error(
        "stale allocation for {item_id}: batch {batch_id} has {remaining} remaining, {allocated} allocated"
    )]
    StaleAllocation {
        item_id: String,
        batch_id: String,
        allocated: Decimal,
        remaining: Decimal,
    },

    #[error(transparent)]
    Journal(#[from] anyhow::Error),
}
