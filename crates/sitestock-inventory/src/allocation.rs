use rust_decimal::Decimal;
use sitestock_core::{AllocationError, AllocationRequest, AllocationResult, Batch, BatchAllocation};
use tracing::debug;

/// Spreads `requested_quantity` over `batches` oldest purchase first.
///
/// Batches with nothing remaining are skipped. Batches sharing a purchase
/// date are consumed in the order they were given. Running out of stock is
/// not an error: the result carries whatever could be allocated and
/// `fully_satisfied` is false.
pub fn allocate(
    requested_quantity: Decimal,
    batches: &[Batch],
) -> Result<AllocationResult, AllocationError> {
    validate_requested_quantity(requested_quantity)?;

    let mut ordered: Vec<&Batch> = batches
        .iter()
        .filter(|batch| batch.quantity_remaining > Decimal::ZERO)
        .collect();
    ordered.sort_by_key(|batch| batch.purchase_date);

    let mut remaining = requested_quantity;
    let mut allocations = Vec::new();
    let mut total_price = Decimal::ZERO;

    for batch in ordered {
        if remaining.is_zero() {
            break;
        }

        let take = batch.quantity_remaining.min(remaining);
        let line_total = take.checked_mul(batch.unit_price).ok_or_else(|| {
            AllocationError::InvalidInput(format!("line total overflows for batch {}", batch.batch_id))
        })?;
        total_price = total_price.checked_add(line_total).ok_or_else(|| {
            AllocationError::InvalidInput("allocation total overflows".to_string())
        })?;
        remaining -= take;

        allocations.push(BatchAllocation {
            batch_id: batch.batch_id.clone(),
            godown_id: batch.godown_id.clone(),
            godown_name: batch.godown_name.clone(),
            quantity: take,
            unit_price: batch.unit_price,
            line_total,
        });
    }

    let fully_satisfied = remaining.is_zero();
    debug!(
        %requested_quantity,
        lines = allocations.len(),
        %total_price,
        fully_satisfied,
        "computed fifo allocation"
    );

    Ok(AllocationResult {
        allocations,
        total_price,
        fully_satisfied,
    })
}

/// Runs [`allocate`] for a parsed request, naming the item in quantity errors.
pub fn allocate_request(request: &AllocationRequest) -> Result<AllocationResult, AllocationError> {
    debug!(item_id = %request.item_id, batches = request.batches.len(), "allocating request");
    allocate(request.requested_quantity, &request.batches).map_err(|err| match err {
        AllocationError::InvalidQuantity(reason) => {
            AllocationError::InvalidQuantity(format!("{}: {reason}", request.item_id))
        }
        other => other,
    })
}

fn validate_requested_quantity(quantity: Decimal) -> Result<(), AllocationError> {
    if quantity < Decimal::ZERO {
        return Err(AllocationError::InvalidQuantity(format!(
            "requested quantity {quantity} is negative"
        )));
    }
    if !quantity.fract().is_zero() {
        return Err(AllocationError::InvalidQuantity(format!(
            "requested quantity {quantity} is not a whole number"
        )));
    }
    Ok(())
}
