use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitestock_core::{AllocationError, AllocationResult, Batch};
use sitestock_platform::{AllocationSubmission, AllocatorConfig, ProductRecord, SubmissionLine};
use tracing::{info, warn};

use crate::allocation::allocate;

/// An item selected for allocation together with its batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStock {
    pub item_id: String,
    pub item_name: Option<String>,
    pub batches: Vec<Batch>,
}

impl TryFrom<&ProductRecord> for ItemStock {
    type Error = AllocationError;

    fn try_from(record: &ProductRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            item_id: record.item_id.clone(),
            item_name: record.product_name.clone(),
            batches: record.batches()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemAllocation {
    pub item_id: String,
    pub requested_quantity: Decimal,
    pub result: AllocationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortfall {
    pub item_id: String,
    pub requested: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationPlan {
    pub items: Vec<ItemAllocation>,
    pub grand_total: Decimal,
}

/// Submission rules applied when a plan is turned into a write request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationPolicy {
    pub allow_partial: bool,
    pub money_dp: u32,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::from(&AllocatorConfig::default())
    }
}

impl From<&AllocatorConfig> for AllocationPolicy {
    fn from(config: &AllocatorConfig) -> Self {
        Self {
            allow_partial: config.allow_partial,
            money_dp: config.money_dp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GodownAvailability {
    pub godown_id: String,
    pub godown_name: String,
    pub quantity: Decimal,
}

/// Allocates every selected item in selection order. Items with no entry in
/// `quantities` request nothing.
pub fn plan_allocations(
    selected: &[ItemStock],
    quantities: &HashMap<String, Decimal>,
) -> Result<AllocationPlan, AllocationError> {
    let mut items = Vec::with_capacity(selected.len());
    let mut grand_total = Decimal::ZERO;

    for item in selected {
        let requested_quantity = quantities
            .get(&item.item_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let result = allocate(requested_quantity, &item.batches).map_err(|err| match err {
            AllocationError::InvalidQuantity(reason) => {
                AllocationError::InvalidQuantity(format!("{}: {reason}", item.item_id))
            }
            other => other,
        })?;

        grand_total = grand_total
            .checked_add(result.total_price)
            .ok_or_else(|| AllocationError::InvalidInput("plan total overflows".to_string()))?;
        items.push(ItemAllocation {
            item_id: item.item_id.clone(),
            requested_quantity,
            result,
        });
    }

    Ok(AllocationPlan { items, grand_total })
}

impl AllocationPlan {
    pub fn is_fully_satisfied(&self) -> bool {
        self.items.iter().all(|item| item.result.fully_satisfied)
    }

    pub fn shortfalls(&self) -> Vec<Shortfall> {
        self.items
            .iter()
            .filter(|item| !item.result.fully_satisfied)
            .map(|item| Shortfall {
                item_id: item.item_id.clone(),
                requested: item.requested_quantity,
                available: item.result.allocated_quantity(),
            })
            .collect()
    }

    /// Builds the write-endpoint body, refusing short plans unless the
    /// policy allows partial submission.
    pub fn into_submission(
        self,
        policy: &AllocationPolicy,
    ) -> Result<AllocationSubmission, AllocationError> {
        if !policy.allow_partial {
            if let Some(shortfall) = self.shortfalls().into_iter().next() {
                warn!(
                    item_id = %shortfall.item_id,
                    requested = %shortfall.requested,
                    available = %shortfall.available,
                    "refusing partial allocation"
                );
                return Err(AllocationError::InsufficientStock {
                    item_id: shortfall.item_id,
                    requested: shortfall.requested,
                    available: shortfall.available,
                });
            }
        }

        let mut lines = Vec::new();
        for item in self.items {
            for allocation in item.result.allocations {
                lines.push(SubmissionLine {
                    item_id: item.item_id.clone(),
                    batch_id: allocation.batch_id,
                    godown_id: allocation.godown_id,
                    quantity: allocation.quantity,
                    unit_price: allocation.unit_price,
                    total_price: allocation.line_total.round_dp(policy.money_dp),
                });
            }
        }

        if lines.is_empty() {
            return Err(AllocationError::InvalidQuantity(
                "nothing to submit".to_string(),
            ));
        }

        let grand_total = self.grand_total.round_dp(policy.money_dp);
        info!(lines = lines.len(), %grand_total, "allocation submission ready");

        Ok(AllocationSubmission { lines, grand_total })
    }
}

/// Remaining stock per godown, in the order godowns first appear.
pub fn availability_by_godown(batches: &[Batch]) -> Vec<GodownAvailability> {
    let mut summary: Vec<GodownAvailability> = Vec::new();

    for batch in batches
        .iter()
        .filter(|batch| batch.quantity_remaining > Decimal::ZERO)
    {
        match summary
            .iter_mut()
            .find(|entry| entry.godown_id == batch.godown_id)
        {
            Some(entry) => entry.quantity += batch.quantity_remaining,
            None => summary.push(GodownAvailability {
                godown_id: batch.godown_id.clone(),
                godown_name: batch.godown_name.clone(),
                quantity: batch.quantity_remaining,
            }),
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn batch(id: &str, godown: &str, quantity: i64, price: i64, day: u32) -> Batch {
        Batch {
            batch_id: id.to_string(),
            godown_id: godown.to_string(),
            godown_name: format!("Godown {godown}"),
            quantity_remaining: Decimal::new(quantity, 0),
            unit_price: Decimal::new(price, 0),
            purchase_date: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
        }
    }

    fn cement_and_steel() -> Vec<ItemStock> {
        vec![
            ItemStock {
                item_id: "CEMENT".to_string(),
                item_name: Some("OPC 53".to_string()),
                batches: vec![batch("C1", "G1", 50, 380, 1), batch("C2", "G2", 50, 395, 9)],
            },
            ItemStock {
                item_id: "STEEL".to_string(),
                item_name: None,
                batches: vec![batch("S1", "G1", 10, 62, 4)],
            },
        ]
    }

    fn quantities(pairs: &[(&str, i64)]) -> HashMap<String, Decimal> {
        pairs
            .iter()
            .map(|(id, qty)| (id.to_string(), Decimal::new(*qty, 0)))
            .collect()
    }

    #[test]
    fn plans_each_selected_item_and_sums_totals() {
        let plan =
            plan_allocations(&cement_and_steel(), &quantities(&[("CEMENT", 60), ("STEEL", 4)]))
                .unwrap();

        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].result.total_price, Decimal::new(50 * 380 + 10 * 395, 0));
        assert_eq!(plan.items[1].result.total_price, Decimal::new(4 * 62, 0));
        assert_eq!(
            plan.grand_total,
            Decimal::new(50 * 380 + 10 * 395 + 4 * 62, 0)
        );
        assert!(plan.is_fully_satisfied());
    }

    #[test]
    fn unlisted_items_request_nothing() {
        let plan = plan_allocations(&cement_and_steel(), &quantities(&[("CEMENT", 1)])).unwrap();

        assert_eq!(plan.items[1].requested_quantity, Decimal::ZERO);
        assert!(plan.items[1].result.allocations.is_empty());
    }

    #[test]
    fn invalid_quantity_names_the_item() {
        let err = plan_allocations(&cement_and_steel(), &quantities(&[("STEEL", -3)])).unwrap_err();

        assert!(matches!(err, AllocationError::InvalidQuantity(reason) if reason.starts_with("STEEL")));
    }

    #[test]
    fn short_plans_are_refused_by_default() {
        let plan = plan_allocations(&cement_and_steel(), &quantities(&[("STEEL", 25)])).unwrap();

        assert_eq!(
            plan.shortfalls(),
            vec![Shortfall {
                item_id: "STEEL".to_string(),
                requested: Decimal::new(25, 0),
                available: Decimal::new(10, 0),
            }]
        );

        let err = plan.into_submission(&AllocationPolicy::default()).unwrap_err();
        assert!(matches!(err, AllocationError::InsufficientStock { ref item_id, .. } if item_id == "STEEL"));
    }

    #[test]
    fn partial_plans_submit_when_allowed() {
        let plan = plan_allocations(&cement_and_steel(), &quantities(&[("STEEL", 25)])).unwrap();
        let policy = AllocationPolicy {
            allow_partial: true,
            ..AllocationPolicy::default()
        };

        let submission = plan.into_submission(&policy).unwrap();

        assert_eq!(submission.lines.len(), 1);
        assert_eq!(submission.lines[0].batch_id, "S1");
        assert_eq!(submission.grand_total, Decimal::new(620, 0));
    }

    #[test]
    fn submission_rounds_money_to_configured_places() {
        let mut items = cement_and_steel();
        items[1].batches[0].unit_price = Decimal::new(62_3333, 4);
        let plan = plan_allocations(&items, &quantities(&[("STEEL", 3)])).unwrap();

        let submission = plan.into_submission(&AllocationPolicy::default()).unwrap();

        assert_eq!(submission.lines[0].total_price, Decimal::new(18700, 2));
        assert_eq!(submission.grand_total, Decimal::new(18700, 2));
    }

    #[test]
    fn empty_plans_have_nothing_to_submit() {
        let plan = plan_allocations(&cement_and_steel(), &HashMap::new()).unwrap();

        assert!(matches!(
            plan.into_submission(&AllocationPolicy::default()),
            Err(AllocationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn plan_total_overflow_is_an_input_error() {
        let huge = Decimal::from_scientific("5e28").unwrap();
        let mut items = cement_and_steel();
        items[0].batches = vec![batch("C1", "G1", 1, 0, 1)];
        items[0].batches[0].unit_price = huge;
        items[1].batches[0].unit_price = huge;

        let err = plan_allocations(&items, &quantities(&[("CEMENT", 1), ("STEEL", 1)])).unwrap_err();

        assert!(matches!(err, AllocationError::InvalidInput(reason) if reason.contains("overflows")));
    }

    #[test]
    fn policy_follows_loaded_config() {
        let config = AllocatorConfig {
            allow_partial: true,
            money_dp: 3,
        };

        assert_eq!(
            AllocationPolicy::from(&config),
            AllocationPolicy {
                allow_partial: true,
                money_dp: 3,
            }
        );
        assert!(!AllocationPolicy::default().allow_partial);
    }

    #[test]
    fn availability_groups_by_godown() {
        let batches = vec![
            batch("C1", "G1", 50, 380, 1),
            batch("C2", "G2", 20, 395, 2),
            batch("C3", "G1", 5, 390, 3),
            batch("C4", "G3", 0, 390, 4),
        ];

        let summary = availability_by_godown(&batches);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].godown_id, "G1");
        assert_eq!(summary[0].quantity, Decimal::new(55, 0));
        assert_eq!(summary[1].godown_id, "G2");
    }

    #[test]
    fn item_stock_from_listing_row() {
        let row: ProductRecord = serde_json::from_value(serde_json::json!({
            "CM_Product_ID": "SAND",
            "CM_Product_Name": "River Sand",
            "batches": "not-a-list"
        }))
        .unwrap();

        assert!(matches!(
            ItemStock::try_from(&row),
            Err(AllocationError::InvalidInput(_))
        ));
    }
}
