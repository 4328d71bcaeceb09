//! # Rendering
//!
//! Plain-text tables for the terminal.

use stockroom_core::{InventoryItem, InventoryOption, SaleLine};

/// Lays out rows under headers with left-aligned, padded columns.
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.iter().map(|h| h.to_string()).collect()));
    out.push(line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    out.extend(rows.into_iter().map(line));
    out.join("\n")
}

/// The inventory table.
pub fn inventory_table(items: &[InventoryItem]) -> String {
    if items.is_empty() {
        return "No inventory items.".to_string();
    }
    table(
        &["ID", "Product", "Quantity", "Price", "Cost", "Supplier"],
        items
            .iter()
            .map(|item| {
                vec![
                    item.id.to_string(),
                    item.product_name.clone(),
                    item.quantity.to_string(),
                    item.price.to_string(),
                    item.cost.to_string(),
                    item.supplier_id.to_string(),
                ]
            })
            .collect(),
    )
}

/// The sales table. Deleted products show a blank name.
pub fn sales_table(lines: &[SaleLine]) -> String {
    if lines.is_empty() {
        return "No sales recorded.".to_string();
    }
    table(
        &["Sale", "Product", "Quantity", "Price", "Total", "Date"],
        lines
            .iter()
            .map(|line| {
                vec![
                    line.sale_id.to_string(),
                    line.product_name.clone().unwrap_or_default(),
                    line.quantity.to_string(),
                    line.price.to_string(),
                    line.total.to_string(),
                    line.sale_date.format("%Y-%m-%d %H:%M").to_string(),
                ]
            })
            .collect(),
    )
}

/// The product picker of the sales form.
pub fn product_options(options: &[InventoryOption]) -> String {
    options
        .iter()
        .map(|o| format!("{:>4}  {}", o.id, o.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stockroom_core::Money;

    #[test]
    fn test_inventory_table() {
        let items = vec![InventoryItem {
            id: 1,
            product_name: "Widget".to_string(),
            quantity: 10,
            price: Money::from_cents(500),
            cost: Money::from_cents(310),
            supplier_id: 1,
        }];
        let out = inventory_table(&items);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "ID  Product  Quantity  Price  Cost   Supplier");
        assert_eq!(lines[2], "1   Widget   10        $5.00  $3.10  1");
        assert_eq!(inventory_table(&[]), "No inventory items.");
    }

    #[test]
    fn test_sales_table_blank_name() {
        let lines = vec![SaleLine {
            sale_id: 3,
            product_name: None,
            quantity: 2,
            price: Money::from_cents(250),
            total: Money::from_cents(500),
            sale_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        }];
        let out = sales_table(&lines);
        assert!(out.lines().nth(2).unwrap().starts_with("3              2"));
        assert!(out.ends_with("2024-03-01 12:30"));
    }

    #[test]
    fn test_product_options() {
        let options = vec![InventoryOption {
            id: 1,
            product_name: "Widget".to_string(),
            quantity: 10,
            price: Money::from_cents(500),
        }];
        assert_eq!(
            product_options(&options),
            "   1  Widget - $5.00 (Available: 10)"
        );
    }
}
