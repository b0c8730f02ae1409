//! # Catalog Commands
//!
//! Product maintenance. Catalog edits land in the ledger first and are then
//! saved to the database; if the save fails the ledger change is reverted,
//! so the two never disagree.
//!
//! Stock is the exception: restocking adds to the stored count in place and
//! then copies the stored product into the ledger, so units sold meanwhile by
//! another register on the same database are kept.

use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::Register;
use smartdesk_core::validation::validate_search_query;
use smartdesk_core::{Money, NewProduct, Product};

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Adds a product to the catalog.
pub async fn create_product(register: &Register, input: NewProduct) -> ApiResult<Product> {
    let product = Product::create(input)?;
    register.ledger().add_product(product.clone())?;

    if let Err(err) = register.database().products().insert(&product).await {
        if let Err(revert) = register.ledger().remove_product(&product.id) {
            warn!(error = %revert, "Could not revert ledger insert");
        }
        return Err(err.into());
    }

    info!(sku = %product.sku, id = %product.id, "Product created");
    Ok(product)
}

/// Changes a product's unit price. Lines already on a bill keep theirs.
pub async fn update_price(register: &Register, product_id: &str, price: Money) -> ApiResult<Product> {
    let previous = register.ledger().set_price(product_id, price)?;
    let product = register.ledger().get(product_id)?;

    if let Err(err) = register.database().products().save(&product).await {
        if let Err(revert) = register.ledger().set_price(product_id, previous) {
            warn!(error = %revert, "Could not revert price change");
        }
        return Err(err.into());
    }

    info!(sku = %product.sku, from = %previous, to = %price, "Price updated");
    Ok(product)
}

/// Removes a product from the catalog.
///
/// Refused while the product is on the open bill.
pub async fn delete_product(register: &Register, product_id: &str) -> ApiResult<()> {
    let bill = register.bill().lock().await;
    if bill.line(product_id).is_some() {
        return Err(ApiError::new(
            ErrorCode::BusinessLogic,
            "Product is on the open bill; remove it first",
        ));
    }

    let product = register.ledger().get(product_id)?;
    register.database().products().delete(product_id).await?;
    register.ledger().remove_product(product_id)?;
    drop(bill);

    info!(sku = %product.sku, "Product deleted");
    Ok(())
}

/// Receives `quantity` units into stock.
pub async fn restock(register: &Register, product_id: &str, quantity: i64) -> ApiResult<Product> {
    if quantity <= 0 {
        return Err(ApiError::new(
            ErrorCode::InvalidQuantity,
            format!("Restock quantity must be positive, got {}", quantity),
        ));
    }

    // Checkout holds the bill while it commits; keep the ledger still until
    // the stored copy is installed.
    let _bill = register.bill().lock().await;
    register.ledger().get(product_id)?;

    let product = register.database().products().add_stock(product_id, quantity).await?;
    register.ledger().sync_product(product.clone())?;

    info!(
        sku = %product.sku,
        added = quantity,
        on_hand = product.quantity_on_hand,
        "Product restocked"
    );
    Ok(product)
}

/// Every product, or only those in `category`.
pub fn list_products(register: &Register, category: Option<&str>) -> Vec<Product> {
    match category {
        Some(category) => register.ledger().products_in_category(category),
        None => register.ledger().products(),
    }
}

/// Searches sku and name. An empty query lists everything.
pub fn search_products(
    register: &Register,
    query: &str,
    category: Option<&str>,
    limit: Option<usize>,
) -> ApiResult<Vec<Product>> {
    let query = validate_search_query(query)?;
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 500);

    let results = register.ledger().search(&query, category, limit);
    debug!(query = %query, count = results.len(), "search_products");
    Ok(results)
}

/// Products at or below the configured low-stock threshold, lowest first.
pub fn low_stock(register: &Register) -> Vec<Product> {
    register.ledger().low_stock(register.config().low_stock_threshold)
}
