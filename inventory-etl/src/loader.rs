use diesel::prelude::*;
use tracing::{error, info, warn};

use crate::error::LoadError;
use crate::staging::{
    self, STAGING_INVENTORY_LOG, STAGING_PRODUCTS, STAGING_SHIPMENTS, STAGING_SUPPLIERS,
};

/// The four constrained tables a load writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalTable {
    Products,
    Suppliers,
    Shipments,
    InventoryLog,
}

impl FinalTable {
    pub fn name(&self) -> &'static str {
        match self {
            FinalTable::Products => "products",
            FinalTable::Suppliers => "suppliers",
            FinalTable::Shipments => "shipments",
            FinalTable::InventoryLog => "inventory_log",
        }
    }
}

struct CopyStep {
    staging: &'static str,
    target: FinalTable,
    columns: &'static str,
}

// Referenced tables are copied before the tables that point at them.
const COPY_STEPS: [CopyStep; 4] = [
    CopyStep {
        staging: STAGING_PRODUCTS,
        target: FinalTable::Products,
        columns: "product_id, name, category, unit_price",
    },
    CopyStep {
        staging: STAGING_SUPPLIERS,
        target: FinalTable::Suppliers,
        columns: "supplier_id, name, location",
    },
    CopyStep {
        staging: STAGING_SHIPMENTS,
        target: FinalTable::Shipments,
        columns: "shipment_id, supplier_id, product_id, quantity, shipment_date",
    },
    CopyStep {
        staging: STAGING_INVENTORY_LOG,
        target: FinalTable::InventoryLog,
        columns: "log_id, product_id, change_type, quantity, log_date",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub products: usize,
    pub suppliers: usize,
    pub shipments: usize,
    pub inventory_log: usize,
}

impl LoadSummary {
    fn record(&mut self, table: FinalTable, rows: usize) {
        match table {
            FinalTable::Products => self.products = rows,
            FinalTable::Suppliers => self.suppliers = rows,
            FinalTable::Shipments => self.shipments = rows,
            FinalTable::InventoryLog => self.inventory_log = rows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadSummary),
    /// No staging tables were present, so there was nothing to do.
    NothingStaged,
}

/// Moves every staged row into the final tables and drops staging.
///
/// All four copies and the drop share one transaction: if any row violates a
/// constraint the final tables are left exactly as they were and the staging
/// tables stay in place for correction.
pub fn load(conn: &mut SqliteConnection) -> Result<LoadOutcome, LoadError> {
    let present = staging::existing_tables(conn)?;
    if present.is_empty() {
        info!("No staging tables present, nothing to load");
        return Ok(LoadOutcome::NothingStaged);
    }
    if let Some(step) = COPY_STEPS
        .iter()
        .find(|step| !present.iter().any(|name| name == step.staging))
    {
        return Err(LoadError::IncompleteStaging(step.staging));
    }

    let result = conn.transaction::<_, LoadError, _>(|conn| {
        let mut summary = LoadSummary::default();
        for step in &COPY_STEPS {
            let rows = copy(conn, step)?;
            info!("Copied {} row(s) from {} into {}", rows, step.staging, step.target.name());
            summary.record(step.target, rows);
        }
        staging::drop_tables(conn)?;
        Ok(summary)
    });

    match result {
        Ok(summary) => {
            info!(
                products = summary.products,
                suppliers = summary.suppliers,
                shipments = summary.shipments,
                inventory_log = summary.inventory_log,
                "Load completed, staging tables dropped"
            );
            Ok(LoadOutcome::Loaded(summary))
        }
        Err(e) => {
            error!("Load failed, final tables unchanged: {}", e);
            warn!("Staging tables kept for correction");
            Err(e)
        }
    }
}

fn copy(conn: &mut SqliteConnection, step: &CopyStep) -> Result<usize, LoadError> {
    let sql = format!(
        "INSERT INTO {target} ({columns}) SELECT {columns} FROM {staging}",
        target = step.target.name(),
        columns = step.columns,
        staging = step.staging,
    );
    diesel::sql_query(sql)
        .execute(conn)
        .map_err(|e| LoadError::from_copy(step.target.name(), e))
}
