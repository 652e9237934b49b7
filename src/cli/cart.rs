//! Cart subcommand for followup-engine CLI
//!
//! Edits the cart persisted in the configured data directory.

use crate::error::{FollowUpError, Result};
use crate::store::{Cart, CartItem, CartStore};
use clap::{Args, Subcommand};
use serde_json::{Value, json};

/// Arguments for the cart subcommand
#[derive(Args, Debug)]
pub struct CartArgs {
    #[command(subcommand)]
    pub action: CartAction,
}

#[derive(Subcommand, Debug)]
pub enum CartAction {
    /// Print the cart with item count and subtotal
    Show,

    /// Add an item, merging into an existing line for the same product/variant
    Add {
        #[arg(long)]
        product_id: String,
        #[arg(long)]
        variant_id: Option<String>,
        #[arg(long)]
        name: String,
        /// Unit price in minor currency units
        #[arg(long)]
        price: i64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Change a line's quantity (0 removes it)
    Set {
        #[arg(long)]
        product_id: String,
        #[arg(long)]
        variant_id: Option<String>,
        #[arg(long)]
        quantity: u32,
    },

    /// Remove a line
    Remove {
        #[arg(long)]
        product_id: String,
        #[arg(long)]
        variant_id: Option<String>,
    },

    /// Empty the cart
    Clear,
}

/// Apply `action` to the stored cart and return its resulting summary.
pub fn run_cart(store: &dyn CartStore<Cart>, action: CartAction) -> Result<Value> {
    match action {
        CartAction::Show => {}
        CartAction::Add {
            product_id,
            variant_id,
            name,
            price,
            quantity,
        } => {
            if price < 0 {
                return Err(FollowUpError::invalid_value("price", "price must not be negative"));
            }
            let mut cart = store.get()?;
            cart.add(CartItem {
                product_id,
                variant_id,
                name,
                unit_price: price,
                quantity,
            });
            store.set(&cart)?;
        }
        CartAction::Set {
            product_id,
            variant_id,
            quantity,
        } => {
            let mut cart = store.get()?;
            if !cart.set_quantity(&product_id, variant_id.as_deref(), quantity) {
                return Err(not_in_cart(&product_id));
            }
            store.set(&cart)?;
        }
        CartAction::Remove {
            product_id,
            variant_id,
        } => {
            let mut cart = store.get()?;
            if !cart.remove(&product_id, variant_id.as_deref()) {
                return Err(not_in_cart(&product_id));
            }
            store.set(&cart)?;
        }
        CartAction::Clear => store.clear()?,
    }
    Ok(summary(&store.get()?))
}

fn not_in_cart(product_id: &str) -> FollowUpError {
    FollowUpError::invalid_value("productId", format!("'{}' is not in the cart", product_id))
}

fn summary(cart: &Cart) -> Value {
    json!({
        "items": cart.items,
        "itemCount": cart.item_count(),
        "subtotal": cart.subtotal(),
    })
}
