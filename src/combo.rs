//! Combo (bundle) pricing.
//!
//! Amounts are integer minor currency units. The discount never exceeds the
//! regular total, so the final price is never negative.

use crate::error::{FollowUpError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboItem {
    pub product_id: String,
    pub unit_price: i64,
    pub quantity: u32,
}

/// How the combo is discounted relative to buying the items separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ComboDiscount {
    #[default]
    None,
    /// Percentage off the regular total, 0..=100.
    Percent(f64),
    /// Flat amount off the regular total.
    Fixed(i64),
    /// The combo sells for this price outright.
    FixedPrice(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboQuote {
    pub regular_total: i64,
    pub discount: i64,
    pub final_price: i64,
    /// Discount as a share of the regular total, rounded to two decimals.
    pub savings_percent: f64,
}

pub fn quote(items: &[ComboItem], discount: ComboDiscount) -> Result<ComboQuote> {
    if items.is_empty() {
        return Err(FollowUpError::invalid_value(
            "items",
            "a combo needs at least one item",
        ));
    }

    let mut regular_total: i64 = 0;
    for item in items {
        if item.quantity == 0 {
            return Err(FollowUpError::invalid_value(
                "quantity",
                format!("quantity for {} must be at least 1", item.product_id),
            ));
        }
        if item.unit_price < 0 {
            return Err(FollowUpError::invalid_value(
                "unitPrice",
                format!("price for {} must not be negative", item.product_id),
            ));
        }
        regular_total = regular_total.saturating_add(
            item.unit_price.saturating_mul(i64::from(item.quantity)),
        );
    }

    let raw_discount = match discount {
        ComboDiscount::None => 0,
        ComboDiscount::Percent(p) => {
            if !(0.0..=100.0).contains(&p) {
                return Err(FollowUpError::invalid_value(
                    "discount",
                    format!("percent must be between 0 and 100, got {}", p),
                ));
            }
            (regular_total as f64 * p / 100.0).round() as i64
        }
        ComboDiscount::Fixed(amount) => {
            if amount < 0 {
                return Err(FollowUpError::invalid_value(
                    "discount",
                    "fixed discount must not be negative",
                ));
            }
            amount
        }
        ComboDiscount::FixedPrice(price) => {
            if price < 0 {
                return Err(FollowUpError::invalid_value(
                    "discount",
                    "combo price must not be negative",
                ));
            }
            regular_total.saturating_sub(price).max(0)
        }
    };

    let discount = raw_discount.min(regular_total);
    let savings_percent = if regular_total == 0 {
        0.0
    } else {
        (discount as f64 * 10_000.0 / regular_total as f64).round() / 100.0
    };

    Ok(ComboQuote {
        regular_total,
        discount,
        final_price: regular_total - discount,
        savings_percent,
    })
}
