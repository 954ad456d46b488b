//! Catalog item commands.
//!
//! # Usage
//!
//! ```bash
//! mdq items list --search panel
//! mdq items add "Wall Panel" 1450
//! mdq items update 12 "Wall Panel" 1500
//! mdq items delete 12
//! ```
//!
//! # Environment Variables
//!
//! - `ESTIMATOR_API_BASE_URL` - Catalog service base URL
//! - `ESTIMATOR_API_TOKEN` - Optional bearer token

use std::io::Write;

use md_estimator::catalog::CatalogSync;
use md_estimator::{CatalogGateway, Estimator};
use md_estimator_core::{CatalogItem, ItemDraft, ItemId};

use super::{CliError, require_admin};

/// List the catalog, optionally filtered by name.
pub async fn list(
    estimator: &Estimator,
    search: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    estimator.catalog().refresh().await?;
    let items = estimator.catalog().search(search.unwrap_or_default());
    write_items(&items, out)?;
    Ok(())
}

/// Create an item.
pub async fn add(
    estimator: &Estimator,
    name: &str,
    price: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    require_admin(estimator)?;
    let draft = ItemDraft::parse(name, price)?;

    estimator.catalog().create(&draft).await?;
    tracing::info!(name = %draft.name(), "Item created");

    writeln!(out, "Item added successfully")?;
    Ok(())
}

/// Replace an item's name and price.
pub async fn update(
    estimator: &Estimator,
    id: &str,
    name: &str,
    price: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    require_admin(estimator)?;
    let draft = ItemDraft::parse(name, price)?;

    estimator.catalog().update(&ItemId::new(id), &draft).await?;
    tracing::info!(id, name = %draft.name(), "Item updated");

    writeln!(out, "Item updated successfully")?;
    Ok(())
}

/// Delete an item.
pub async fn delete(estimator: &Estimator, id: &str, out: &mut impl Write) -> Result<(), CliError> {
    require_admin(estimator)?;

    let message = estimator.catalog().delete(&ItemId::new(id)).await?;

    writeln!(out, "{message}")?;
    Ok(())
}

/// Print the current catalog.
pub fn write_catalog<G: CatalogGateway>(
    catalog: &CatalogSync<G>,
    query: &str,
    out: &mut impl Write,
) -> std::io::Result<()> {
    write_items(&catalog.search(query), out)
}

/// Print items as an aligned table.
pub fn write_items(items: &[CatalogItem], out: &mut impl Write) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No items found");
    }
    writeln!(out, "{:<14} {:<36} {:>14}", "ID", "NAME", "PRICE")?;
    for item in items {
        writeln!(
            out,
            "{:<14} {:<36} {:>14}",
            item.id.as_str(),
            item.name,
            item.price.display()
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use md_estimator_core::Price;

    use super::*;

    #[test]
    fn test_write_items_table() {
        let items = vec![CatalogItem::new(
            "12",
            "Wall Panel",
            Price::parse("1450").unwrap(),
        )];
        let mut out = Vec::new();

        write_items(&items, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("ID"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("12 "));
        assert!(row.contains("Wall Panel"));
        assert!(row.ends_with("₹1450.00"));
    }

    #[test]
    fn test_write_items_empty() {
        let mut out = Vec::new();
        write_items(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No items found\n");
    }
}
