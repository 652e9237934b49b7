//! Client-side persistence for the cart and wishlist.
//!
//! Storage is an injected [`CartStore`] rather than ambient global state, so
//! the same cart logic runs against a JSON file, memory, or anything else.

use crate::error::{FollowUpError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Repository for one persisted client-side value.
pub trait CartStore<T = Cart>: Send + Sync {
    /// Current value, or `T::default()` when nothing is stored.
    fn get(&self) -> Result<T>;

    fn set(&self, value: &T) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// A line in the cart. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }

    fn same_line(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Add an item, merging quantity into an existing line for the same
    /// product and variant. Zero-quantity items are ignored.
    pub fn add(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }
        match self
            .items
            .iter_mut()
            .find(|line| line.same_line(&item.product_id, item.variant_id.as_deref()))
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(item.quantity);
                line.unit_price = item.unit_price;
            }
            None => self.items.push(item),
        }
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &str, variant_id: Option<&str>) -> bool {
        let before = self.items.len();
        self.items.retain(|line| !line.same_line(product_id, variant_id));
        self.items.len() != before
    }

    /// Set a line's quantity; zero removes the line. Returns whether the
    /// line exists.
    pub fn set_quantity(&mut self, product_id: &str, variant_id: Option<&str>, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id, variant_id);
        }
        match self
            .items
            .iter_mut()
            .find(|line| line.same_line(product_id, variant_id))
        {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Saturates at `u32::MAX`.
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .map(|line| line.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Saturates at `i64::MAX`.
    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(0, i64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Insertion-ordered set of product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    #[serde(default)]
    pub product_ids: Vec<String>,
}

impl Wishlist {
    pub fn contains(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|id| id == product_id)
    }

    /// Returns false if already present.
    pub fn add(&mut self, product_id: impl Into<String>) -> bool {
        let product_id = product_id.into();
        if self.contains(&product_id) {
            return false;
        }
        self.product_ids.push(product_id);
        true
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|id| id != product_id);
        self.product_ids.len() != before
    }

    /// Add when absent, remove when present. Returns whether it is now listed.
    pub fn toggle(&mut self, product_id: &str) -> bool {
        if self.remove(product_id) {
            false
        } else {
            self.add(product_id)
        }
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryCartStore<T> {
    value: Mutex<Option<T>>,
}

impl<T> MemoryCartStore<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }
}

impl<T> CartStore<T> for MemoryCartStore<T>
where
    T: Clone + Default + Send,
{
    fn get(&self) -> Result<T> {
        let guard = self.value.lock().map_err(FollowUpError::internal)?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn set(&self, value: &T) -> Result<()> {
        let mut guard = self.value.lock().map_err(FollowUpError::internal)?;
        *guard = Some(value.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.value.lock().map_err(FollowUpError::internal)?;
        *guard = None;
        Ok(())
    }
}

/// Store backed by a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `name.json` inside `dir`.
    pub fn in_dir(dir: &Path, name: &str) -> Self {
        Self::new(dir.join(format!("{}.json", name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> CartStore<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned + Default,
{
    fn get(&self) -> Result<T> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(FollowUpError::store_io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&content).map_err(|e| FollowUpError::store_corrupt(&self.path, e))
    }

    fn set(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| FollowUpError::store_io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(value).map_err(FollowUpError::internal)?;

        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| FollowUpError::store_io(&tmp, e))?;
        if std::fs::rename(&tmp, &self.path).is_err() {
            // Some platforms refuse to rename over an existing file.
            let _ = std::fs::remove_file(&self.path);
            if let Err(e) = std::fs::rename(&tmp, &self.path) {
                let _ = std::fs::remove_file(&tmp);
                return Err(FollowUpError::store_io(&self.path, e));
            }
        }
        debug!(path = %self.path.display(), "Store written");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Store cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FollowUpError::store_io(&self.path, e)),
        }
    }
}
