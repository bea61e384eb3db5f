use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use diesel::sql_types::{BigInt, Date, Integer, Nullable, Text};
use diesel::QueryableByName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Products whose balance is strictly below this are restock candidates.
pub const RESTOCK_THRESHOLD: i64 = 50;

/// Direction of an inventory movement, as stored in `inventory_log.change_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    In,
    Out,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::In => "IN",
            ChangeType::Out => "OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    CurrentStock,
    LowStock,
    ShippedPerProduct,
    UnitsPerSupplier,
    DailyNetChange,
    NeverRestocked,
    ShippedPerSupplier,
    OutboundPerProduct,
    StockOverview,
    InventoryValue,
}

impl ReportKind {
    pub const ALL: [ReportKind; 10] = [
        ReportKind::CurrentStock,
        ReportKind::LowStock,
        ReportKind::ShippedPerProduct,
        ReportKind::UnitsPerSupplier,
        ReportKind::DailyNetChange,
        ReportKind::NeverRestocked,
        ReportKind::ShippedPerSupplier,
        ReportKind::OutboundPerProduct,
        ReportKind::StockOverview,
        ReportKind::InventoryValue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::CurrentStock => "current-stock",
            ReportKind::LowStock => "low-stock",
            ReportKind::ShippedPerProduct => "shipped-per-product",
            ReportKind::UnitsPerSupplier => "units-per-supplier",
            ReportKind::DailyNetChange => "daily-net-change",
            ReportKind::NeverRestocked => "never-restocked",
            ReportKind::ShippedPerSupplier => "shipped-per-supplier",
            ReportKind::OutboundPerProduct => "outbound-per-product",
            ReportKind::StockOverview => "stock-overview",
            ReportKind::InventoryValue => "inventory-value",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::CurrentStock => "Current stock per product",
            ReportKind::LowStock => "Products below the restock threshold",
            ReportKind::ShippedPerProduct => "Total shipped quantity per product",
            ReportKind::UnitsPerSupplier => "Total units supplied per supplier",
            ReportKind::DailyNetChange => "Net inventory change per product per day",
            ReportKind::NeverRestocked => "Products never restocked",
            ReportKind::ShippedPerSupplier => "Total shipped quantity per supplier",
            ReportKind::OutboundPerProduct => "Total outbound quantity per product",
            ReportKind::StockOverview => "Stock overview including empty products",
            ReportKind::InventoryValue => "Inventory value per product",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ReportKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown report '{s}', expected one of: {}", known.join(", "))
            })
    }
}

/// Rounds a money amount to cents, half away from zero.
pub fn currency(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct ProductStock {
    #[diesel(sql_type = Integer)]
    pub product_id: i32,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = BigInt)]
    pub current_stock: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct ProductQuantity {
    #[diesel(sql_type = Integer)]
    pub product_id: i32,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = BigInt)]
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct SupplierQuantity {
    #[diesel(sql_type = Integer)]
    pub supplier_id: i32,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = BigInt)]
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct DailyNetChange {
    #[diesel(sql_type = Integer)]
    pub product_id: i32,
    #[diesel(sql_type = Date)]
    pub log_date: NaiveDate,
    #[diesel(sql_type = BigInt)]
    pub net_change: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct ProductSummary {
    #[diesel(sql_type = Integer)]
    pub product_id: i32,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryValue {
    pub product_id: i32,
    pub name: String,
    pub current_stock: i64,
    pub unit_price: BigDecimal,
    pub inventory_value: BigDecimal,
}

impl InventoryValue {
    /// Prices `current_stock` units at `unit_price`; both money columns come
    /// out with exactly two decimal places.
    pub fn new(product_id: i32, name: String, current_stock: i64, unit_price: &BigDecimal) -> Self {
        let unit_price = currency(unit_price);
        let inventory_value = currency(&(&unit_price * BigDecimal::from(current_stock)));
        Self {
            product_id,
            name,
            current_stock,
            unit_price,
            inventory_value,
        }
    }
}
