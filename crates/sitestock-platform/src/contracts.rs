use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sitestock_core::{AllocationError, AllocationRequest, Batch};
use tracing::debug;

/// One row of the "list products with batches" response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(
        rename = "CM_Product_ID",
        alias = "CM_Item_ID",
        deserialize_with = "deserialize_id"
    )]
    pub item_id: String,
    #[serde(rename = "CM_Product_Name", default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub batches: Value,
}

impl ProductRecord {
    /// Absent or `null` batches mean the product has no stock on record.
    pub fn batches(&self) -> Result<Vec<Batch>, AllocationError> {
        match &self.batches {
            Value::Null => Ok(Vec::new()),
            value => parse_batches(value),
        }
    }
}

/// Allocation request as posted by the allocation screen. Every field is
/// checked when the body is turned into an [`AllocationRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationRequestBody {
    #[serde(default, alias = "CM_Item_ID", alias = "CM_Product_ID")]
    pub item_id: Value,
    #[serde(default)]
    pub requested_quantity: Value,
    #[serde(default)]
    pub batches: Value,
}

impl AllocationRequestBody {
    pub fn into_request(self) -> Result<AllocationRequest, AllocationError> {
        let batches = match &self.batches {
            Value::Null => Vec::new(),
            value => parse_batches(value)?,
        };
        let requested_quantity = parse_requested_quantity(&self.requested_quantity)?;

        Ok(AllocationRequest {
            item_id: id_value(&self.item_id).unwrap_or_default(),
            requested_quantity,
            batches,
        })
    }
}

pub fn parse_allocation_request(value: Value) -> Result<AllocationRequest, AllocationError> {
    serde_json::from_value::<AllocationRequestBody>(value)
        .map_err(|err| AllocationError::InvalidInput(format!("allocation request: {err}")))?
        .into_request()
}

/// Body handed to the allocation write endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationSubmission {
    #[serde(rename = "items")]
    pub lines: Vec<SubmissionLine>,
    #[serde(rename = "CM_Grand_Total")]
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionLine {
    #[serde(rename = "CM_Item_ID")]
    pub item_id: String,
    #[serde(rename = "CM_Batch_ID")]
    pub batch_id: String,
    #[serde(rename = "CM_Godown_ID")]
    pub godown_id: String,
    #[serde(rename = "CM_Quantity")]
    pub quantity: Decimal,
    #[serde(rename = "CM_Unit_Price")]
    pub unit_price: Decimal,
    #[serde(rename = "CM_Total_Price")]
    pub total_price: Decimal,
}

pub fn parse_batches(value: &Value) -> Result<Vec<Batch>, AllocationError> {
    let Value::Array(items) = value else {
        return Err(AllocationError::InvalidInput(
            "batches must be a list".to_string(),
        ));
    };

    let batches = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_batch(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = batches.len(), "parsed batch records");
    Ok(batches)
}

/// Quantity inputs arrive as numbers or as the raw text of an input field.
pub fn parse_requested_quantity(value: &Value) -> Result<Decimal, AllocationError> {
    match value {
        Value::String(raw) if raw.trim().is_empty() => Ok(Decimal::ZERO),
        other => decimal_value(other).ok_or_else(|| {
            AllocationError::InvalidQuantity(format!("not a number: {other}"))
        }),
    }
}

pub fn parse_purchase_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Some(Utc.from_utc_datetime(&naive))
}

fn parse_batch(index: usize, value: &Value) -> Result<Batch, AllocationError> {
    let malformed = |reason: &str| AllocationError::InvalidInput(format!("batch {index}: {reason}"));

    let Value::Object(fields) = value else {
        return Err(malformed("not an object"));
    };

    let batch_id = fields
        .get("CM_Batch_ID")
        .and_then(id_value)
        .ok_or_else(|| malformed("missing CM_Batch_ID"))?;
    let godown_id = fields
        .get("CM_Godown_ID")
        .and_then(id_value)
        .unwrap_or_default();
    let godown_name = fields
        .get("CM_Godown_Name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let quantity_remaining = fields
        .get("CM_Quantity_Remaining")
        .and_then(decimal_value)
        .ok_or_else(|| malformed("CM_Quantity_Remaining is not a number"))?;
    let unit_price = fields
        .get("CM_Unit_Price")
        .and_then(decimal_value)
        .ok_or_else(|| malformed("CM_Unit_Price is not a number"))?;
    if unit_price < Decimal::ZERO {
        return Err(malformed("CM_Unit_Price is negative"));
    }

    let purchase_date = fields
        .get("CM_Purchase_Date")
        .and_then(Value::as_str)
        .and_then(parse_purchase_date)
        .ok_or_else(|| malformed("CM_Purchase_Date is not a date"))?;

    Ok(Batch {
        batch_id,
        godown_id,
        godown_name,
        quantity_remaining,
        unit_price,
        purchase_date,
    })
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(raw) => raw.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_value(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}
