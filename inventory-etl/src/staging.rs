use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StagingError;
use crate::models::*;
use crate::schema::*;

pub const STAGING_PRODUCTS: &str = "staging_products";
pub const STAGING_SUPPLIERS: &str = "staging_suppliers";
pub const STAGING_SHIPMENTS: &str = "staging_shipments";
pub const STAGING_INVENTORY_LOG: &str = "staging_inventory_log";

pub const STAGING_TABLES: [&str; 4] = [
    STAGING_PRODUCTS,
    STAGING_SUPPLIERS,
    STAGING_SHIPMENTS,
    STAGING_INVENTORY_LOG,
];

// No keys, no NOT NULL, no references: anything the import produces lands here.
const CREATE_STAGING_TABLES: &str = "
CREATE TABLE IF NOT EXISTS staging_products (
    product_id INTEGER,
    name TEXT,
    category TEXT,
    unit_price REAL
);
CREATE TABLE IF NOT EXISTS staging_suppliers (
    supplier_id INTEGER,
    name TEXT,
    location TEXT
);
CREATE TABLE IF NOT EXISTS staging_shipments (
    shipment_id INTEGER,
    supplier_id INTEGER,
    product_id INTEGER,
    quantity INTEGER,
    shipment_date TEXT
);
CREATE TABLE IF NOT EXISTS staging_inventory_log (
    log_id INTEGER,
    product_id INTEGER,
    change_type TEXT,
    quantity INTEGER,
    log_date TEXT
);
";

pub fn create_tables(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(CREATE_STAGING_TABLES)
}

/// Drops whichever staging tables exist. Absent tables are not an error.
pub fn drop_tables(conn: &mut SqliteConnection) -> QueryResult<()> {
    for table in STAGING_TABLES {
        conn.batch_execute(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    debug!("Staging tables dropped");
    Ok(())
}

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Names of the staging tables currently present.
pub fn existing_tables(conn: &mut SqliteConnection) -> QueryResult<Vec<String>> {
    let names = STAGING_TABLES
        .iter()
        .map(|table| format!("'{table}'"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ({names}) ORDER BY name"
    );
    let tables = diesel::sql_query(query).load::<TableName>(conn)?;
    Ok(tables.into_iter().map(|t| t.name).collect())
}

/// CSV files to append to the staging tables. Missing entries are skipped.
#[derive(Debug, Clone, Default)]
pub struct StagingSources {
    pub products: Option<PathBuf>,
    pub suppliers: Option<PathBuf>,
    pub shipments: Option<PathBuf>,
    pub inventory_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub products: usize,
    pub suppliers: usize,
    pub shipments: usize,
    pub inventory_log: usize,
}

/// Appends CSV rows to the staging tables, creating them if needed.
///
/// Values are inserted as parsed. A file that fails to parse aborts the whole
/// import and nothing is staged.
pub fn import(
    conn: &mut SqliteConnection,
    sources: &StagingSources,
) -> Result<ImportSummary, StagingError> {
    create_tables(conn)?;

    let summary = conn.transaction::<_, StagingError, _>(|conn| {
        let mut summary = ImportSummary::default();

        if let Some(path) = &sources.products {
            summary.products = stage_file(path, |row: &StagingProduct| {
                diesel::insert_into(staging_products::table)
                    .values(row)
                    .execute(conn)
            })?;
        }
        if let Some(path) = &sources.suppliers {
            summary.suppliers = stage_file(path, |row: &StagingSupplier| {
                diesel::insert_into(staging_suppliers::table)
                    .values(row)
                    .execute(conn)
            })?;
        }
        if let Some(path) = &sources.shipments {
            summary.shipments = stage_file(path, |row: &StagingShipment| {
                diesel::insert_into(staging_shipments::table)
                    .values(row)
                    .execute(conn)
            })?;
        }
        if let Some(path) = &sources.inventory_log {
            summary.inventory_log = stage_file(path, |row: &StagingInventoryLog| {
                diesel::insert_into(staging_inventory_log::table)
                    .values(row)
                    .execute(conn)
            })?;
        }

        Ok(summary)
    })?;

    info!(
        products = summary.products,
        suppliers = summary.suppliers,
        shipments = summary.shipments,
        inventory_log = summary.inventory_log,
        "Staged CSV rows"
    );
    Ok(summary)
}

fn stage_file<R, F>(path: &Path, mut insert: F) -> Result<usize, StagingError>
where
    R: DeserializeOwned,
    F: FnMut(&R) -> QueryResult<usize>,
{
    let rows = read_csv::<R>(path)?;
    for row in &rows {
        insert(row)?;
    }
    debug!("Staged {} row(s) from {}", rows.len(), path.display());
    Ok(rows.len())
}

fn read_csv<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, StagingError> {
    let csv_error = |source| StagingError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<Result<Vec<R>, csv::Error>>()
        .map_err(csv_error)
}
