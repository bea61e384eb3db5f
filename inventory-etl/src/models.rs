use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub product_id: i32,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: BigDecimal,
}

// Staging rows mirror the CSV headers; every column is optional because the
// staging tables accept whatever the import hands them.

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::staging_products)]
pub struct StagingProduct {
    pub product_id: Option<i32>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::staging_suppliers)]
pub struct StagingSupplier {
    pub supplier_id: Option<i32>,
    pub name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::staging_shipments)]
pub struct StagingShipment {
    pub shipment_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub product_id: Option<i32>,
    pub quantity: Option<i32>,
    pub shipment_date: Option<String>,
}

#[derive(Debug, Clone, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::staging_inventory_log)]
pub struct StagingInventoryLog {
    pub log_id: Option<i32>,
    pub product_id: Option<i32>,
    pub change_type: Option<String>,
    pub quantity: Option<i32>,
    pub log_date: Option<String>,
}
