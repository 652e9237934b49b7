//! Integration tests for the JSON-file cart and wishlist stores.

use followup_engine::error::ErrorCode;
use followup_engine::store::{Cart, CartItem, CartStore, JsonFileStore, Wishlist};
use tempfile::TempDir;

fn item(product_id: &str, unit_price: i64, quantity: u32) -> CartItem {
    CartItem {
        product_id: product_id.to_string(),
        variant_id: None,
        name: format!("Item {}", product_id),
        unit_price,
        quantity,
    }
}

#[test]
fn missing_file_reads_as_empty_cart() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(temp.path(), "cart");
    let cart: Cart = store.get().unwrap();
    assert!(cart.is_empty());
}

#[test]
fn cart_persists_across_store_instances() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("data");

    let store = JsonFileStore::in_dir(&dir, "cart");
    let mut cart = Cart::default();
    cart.add(item("p1", 1200, 2));
    cart.add(item("p2", 300, 1));
    store.set(&cart).unwrap();

    let reopened = JsonFileStore::in_dir(&dir, "cart");
    let loaded: Cart = reopened.get().unwrap();
    assert_eq!(loaded, cart);
    assert_eq!(loaded.subtotal(), 2700);
    assert_eq!(loaded.item_count(), 3);
    assert!(!dir.join("cart.json.tmp").exists());

    let raw = std::fs::read_to_string(dir.join("cart.json")).unwrap();
    assert!(raw.contains("\"productId\": \"p1\""));
    assert!(raw.contains("\"unitPrice\": 1200"));
}

#[test]
fn set_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(temp.path(), "cart");

    let mut cart = Cart::default();
    cart.add(item("p1", 100, 1));
    store.set(&cart).unwrap();
    cart.add(item("p2", 50, 4));
    store.set(&cart).unwrap();

    let loaded: Cart = store.get().unwrap();
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.subtotal(), 300);
    assert!(!temp.path().join("cart.json.tmp").exists());
}

#[test]
fn clear_removes_file_and_is_repeatable() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(temp.path(), "cart");
    let mut cart = Cart::default();
    cart.add(item("p1", 100, 1));
    store.set(&cart).unwrap();

    CartStore::<Cart>::clear(&store).unwrap();
    assert!(!store.path().exists());
    CartStore::<Cart>::clear(&store).unwrap();
    let cart: Cart = store.get().unwrap();
    assert!(cart.is_empty());
}

#[test]
fn corrupt_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(temp.path(), "cart");
    std::fs::write(store.path(), "{ not json").unwrap();

    let err = CartStore::<Cart>::get(&store).unwrap_err();
    assert_eq!(err.code, ErrorCode::StoreCorrupt);
    assert!(err.details.is_some());
}

#[test]
fn wishlist_uses_the_same_store_shape() {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::in_dir(temp.path(), "wishlist");
    let mut wishlist = Wishlist::default();
    wishlist.toggle("p9");
    wishlist.toggle("p3");
    store.set(&wishlist).unwrap();

    let loaded: Wishlist = store.get().unwrap();
    assert!(loaded.contains("p9"));
    assert!(loaded.contains("p3"));
    assert_eq!(loaded.product_ids, vec!["p9".to_string(), "p3".to_string()]);
}
