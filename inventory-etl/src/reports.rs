use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use serde::Serialize;
use shared::{
    ChangeType, DailyNetChange, InventoryValue, ProductQuantity, ProductStock, ProductSummary,
    ReportKind, SupplierQuantity, RESTOCK_THRESHOLD,
};
use std::collections::HashMap;

use crate::error::ReportError;
use crate::models::Product;
use crate::schema::products;

/// Prefixes a query with the `stock` CTE: one row per product with its
/// balance (IN minus OUT, zero when the product has no log entries).
///
/// The CTE takes two binds, the IN and the OUT change type, ahead of any
/// bind of the outer query.
macro_rules! with_stock {
    ($select:literal) => {
        concat!(
            "WITH stock AS (
                SELECT p.product_id,
                       p.name,
                       COALESCE(SUM(CASE l.change_type
                                     WHEN ? THEN l.quantity
                                     WHEN ? THEN -l.quantity
                                     ELSE 0
                                     END), 0) AS current_stock
                FROM products p
                LEFT JOIN inventory_log l ON l.product_id = p.product_id
                GROUP BY p.product_id, p.name
            ) ",
            $select
        )
    };
}

const CURRENT_STOCK: &str = with_stock!(
    "SELECT product_id, name, current_stock FROM stock
     ORDER BY current_stock ASC, product_id"
);

const LOW_STOCK: &str = with_stock!(
    "SELECT product_id, name, current_stock FROM stock
     WHERE current_stock < ?
     ORDER BY current_stock ASC, product_id"
);

const STOCK_OVERVIEW: &str = with_stock!(
    "SELECT product_id, name, current_stock FROM stock
     ORDER BY product_id"
);

const SHIPPED_PER_PRODUCT: &str = "
    SELECT p.product_id, p.name, SUM(s.quantity) AS total_quantity
    FROM shipments s
    JOIN products p ON p.product_id = s.product_id
    GROUP BY p.product_id, p.name
    ORDER BY total_quantity DESC, p.product_id";

const SHIPPED_PER_SUPPLIER: &str = "
    SELECT su.supplier_id, su.name, SUM(s.quantity) AS total_quantity
    FROM shipments s
    JOIN suppliers su ON su.supplier_id = s.supplier_id
    GROUP BY su.supplier_id, su.name
    ORDER BY total_quantity DESC, su.supplier_id";

const DAILY_NET_CHANGE: &str = "
    SELECT product_id,
           log_date,
           SUM(CASE change_type WHEN ? THEN quantity ELSE -quantity END) AS net_change
    FROM inventory_log
    GROUP BY product_id, log_date
    ORDER BY product_id, log_date";

// The IN filter sits in the join condition, so a product matches when it has
// no IN entry at all, whatever OUT entries it has.
const NEVER_RESTOCKED: &str = "
    SELECT p.product_id, p.name, p.category
    FROM products p
    LEFT JOIN inventory_log l
           ON l.product_id = p.product_id AND l.change_type = ?
    WHERE l.log_id IS NULL
    ORDER BY p.product_id";

const OUTBOUND_PER_PRODUCT: &str = "
    SELECT p.product_id, p.name, SUM(l.quantity) AS total_quantity
    FROM inventory_log l
    JOIN products p ON p.product_id = l.product_id
    WHERE l.change_type = ?
    GROUP BY p.product_id, p.name
    ORDER BY total_quantity DESC, p.product_id";

/// Boxes `sql` and binds the given change types, in order, to its leading
/// placeholders.
fn movement_query(
    sql: &str,
    directions: &[ChangeType],
) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
    directions
        .iter()
        .fold(diesel::sql_query(sql).into_boxed(), |query, direction| {
            query.bind::<Text, _>(direction.as_str())
        })
}

fn stock_query(sql: &str) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
    movement_query(sql, &[ChangeType::In, ChangeType::Out])
}

/// Every product with its balance, lowest first.
pub fn current_stock(conn: &mut SqliteConnection) -> QueryResult<Vec<ProductStock>> {
    stock_query(CURRENT_STOCK).load(conn)
}

/// Products whose balance is below [`RESTOCK_THRESHOLD`], lowest first.
pub fn low_stock(conn: &mut SqliteConnection) -> QueryResult<Vec<ProductStock>> {
    stock_query(LOW_STOCK)
        .bind::<BigInt, _>(RESTOCK_THRESHOLD)
        .load(conn)
}

pub fn shipped_per_product(conn: &mut SqliteConnection) -> QueryResult<Vec<ProductQuantity>> {
    diesel::sql_query(SHIPPED_PER_PRODUCT).load(conn)
}

/// Units shipped by each supplier, largest contributor first.
///
/// Backs both the "units supplied" and the "shipped per supplier" reports.
pub fn supplier_contribution(conn: &mut SqliteConnection) -> QueryResult<Vec<SupplierQuantity>> {
    diesel::sql_query(SHIPPED_PER_SUPPLIER).load(conn)
}

pub fn daily_net_change(conn: &mut SqliteConnection) -> QueryResult<Vec<DailyNetChange>> {
    movement_query(DAILY_NET_CHANGE, &[ChangeType::In]).load(conn)
}

/// Products without a single IN movement. Products that only ever went OUT,
/// and products with no movements at all, are both included.
pub fn never_restocked(conn: &mut SqliteConnection) -> QueryResult<Vec<ProductSummary>> {
    movement_query(NEVER_RESTOCKED, &[ChangeType::In]).load(conn)
}

pub fn outbound_per_product(conn: &mut SqliteConnection) -> QueryResult<Vec<ProductQuantity>> {
    movement_query(OUTBOUND_PER_PRODUCT, &[ChangeType::Out]).load(conn)
}

/// Same balances as [`current_stock`], listed by product id.
pub fn stock_overview(conn: &mut SqliteConnection) -> QueryResult<Vec<ProductStock>> {
    stock_query(STOCK_OVERVIEW).load(conn)
}

/// Stock of every product priced at its unit price, most valuable first.
///
/// The multiplication and rounding happen in decimal arithmetic, not in
/// sqlite's floating point.
pub fn inventory_value(conn: &mut SqliteConnection) -> QueryResult<Vec<InventoryValue>> {
    let stock: HashMap<i32, i64> = stock_overview(conn)?
        .into_iter()
        .map(|row| (row.product_id, row.current_stock))
        .collect();

    let catalogue = products::table
        .select(Product::as_select())
        .order(products::product_id)
        .load(conn)?;

    let mut rows: Vec<InventoryValue> = catalogue
        .into_iter()
        .map(|product| {
            let current = stock.get(&product.product_id).copied().unwrap_or(0);
            InventoryValue::new(product.product_id, product.name, current, &product.unit_price)
        })
        .collect();
    // Stable sort: equal values stay in product id order.
    rows.sort_by(|a, b| b.inventory_value.cmp(&a.inventory_value));
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Stock(Vec<ProductStock>),
    ProductTotals(Vec<ProductQuantity>),
    SupplierTotals(Vec<SupplierQuantity>),
    DailyChanges(Vec<DailyNetChange>),
    Products(Vec<ProductSummary>),
    Values(Vec<InventoryValue>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Stock(rows) => rows.len(),
            ReportRows::ProductTotals(rows) => rows.len(),
            ReportRows::SupplierTotals(rows) => rows.len(),
            ReportRows::DailyChanges(rows) => rows.len(),
            ReportRows::Products(rows) => rows.len(),
            ReportRows::Values(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub report: ReportKind,
    pub title: &'static str,
    pub rows: ReportRows,
}

pub fn run(conn: &mut SqliteConnection, kind: ReportKind) -> Result<Report, ReportError> {
    let rows = match kind {
        ReportKind::CurrentStock => ReportRows::Stock(current_stock(conn)?),
        ReportKind::LowStock => ReportRows::Stock(low_stock(conn)?),
        ReportKind::ShippedPerProduct => ReportRows::ProductTotals(shipped_per_product(conn)?),
        ReportKind::UnitsPerSupplier | ReportKind::ShippedPerSupplier => {
            ReportRows::SupplierTotals(supplier_contribution(conn)?)
        }
        ReportKind::DailyNetChange => ReportRows::DailyChanges(daily_net_change(conn)?),
        ReportKind::NeverRestocked => ReportRows::Products(never_restocked(conn)?),
        ReportKind::OutboundPerProduct => ReportRows::ProductTotals(outbound_per_product(conn)?),
        ReportKind::StockOverview => ReportRows::Stock(stock_overview(conn)?),
        ReportKind::InventoryValue => ReportRows::Values(inventory_value(conn)?),
    };
    Ok(Report {
        report: kind,
        title: kind.title(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{self, exec};
    use crate::loader;
    use bigdecimal::BigDecimal;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn loaded(seed: &str) -> SqliteConnection {
        let mut conn = testing::connection();
        exec(&mut conn, seed);
        loader::load(&mut conn).unwrap();
        conn
    }

    const WIDGET: &str = "
        INSERT INTO staging_products VALUES (1, 'Widget', NULL, 10.00);
        INSERT INTO staging_inventory_log VALUES
            (1, 1, 'IN', 100, '2024-01-01'),
            (2, 1, 'OUT', 30, '2024-01-02');
    ";

    const CATALOGUE: &str = "
        INSERT INTO staging_products VALUES
            (1, 'Widget', 'Hardware', 10.00),
            (2, 'Gadget', 'Tools', 19.99),
            (3, 'Gizmo', NULL, 4.50),
            (4, 'Doohickey', 'Tools', 2.25);
        INSERT INTO staging_suppliers VALUES
            (1, 'Acme', 'Berlin'),
            (2, 'Globex', 'Lyon'),
            (3, 'Initech', NULL);
        INSERT INTO staging_shipments VALUES
            (1, 1, 1, 100, '2024-01-01'),
            (2, 2, 2, 40, '2024-01-01'),
            (3, 2, 1, 25, '2024-01-05'),
            (4, 1, 3, 10, '2024-01-06');
        INSERT INTO staging_inventory_log VALUES
            (1, 1, 'IN', 100, '2024-01-01'),
            (2, 1, 'OUT', 30, '2024-01-02'),
            (3, 1, 'OUT', 5, '2024-01-02'),
            (4, 2, 'IN', 3, '2024-01-01'),
            (5, 3, 'OUT', 8, '2024-01-03'),
            (6, 2, 'IN', 10, '2024-01-04'),
            (7, 2, 'OUT', 10, '2024-01-04');
    ";

    fn stock_by_id(rows: &[ProductStock]) -> HashMap<i32, i64> {
        rows.iter().map(|r| (r.product_id, r.current_stock)).collect()
    }

    #[test]
    fn widget_example_end_to_end() {
        let mut conn = loaded(WIDGET);

        let stock = current_stock(&mut conn).unwrap();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].current_stock, 70);

        let value = inventory_value(&mut conn).unwrap();
        assert_eq!(value[0].inventory_value, BigDecimal::from_str("700").unwrap());
        assert_eq!(value[0].inventory_value.to_string(), "700.00");
    }

    #[test]
    fn inventory_value_rounds_to_cents() {
        let mut conn = loaded(
            "INSERT INTO staging_products VALUES (1, 'Gadget', NULL, 19.99);
             INSERT INTO staging_inventory_log VALUES (1, 1, 'IN', 3, '2024-01-01');",
        );

        let value = inventory_value(&mut conn).unwrap();
        assert_eq!(value[0].current_stock, 3);
        assert_eq!(value[0].unit_price.to_string(), "19.99");
        assert_eq!(value[0].inventory_value.to_string(), "59.97");
    }

    #[test]
    fn products_without_movements_have_zero_stock() {
        let mut conn = loaded(CATALOGUE);

        for rows in [current_stock(&mut conn).unwrap(), stock_overview(&mut conn).unwrap()] {
            assert_eq!(stock_by_id(&rows)[&4], 0);
        }
    }

    #[test]
    fn balances_agree_across_reports() {
        let mut conn = loaded(CATALOGUE);

        let current = stock_by_id(&current_stock(&mut conn).unwrap());
        let overview = stock_by_id(&stock_overview(&mut conn).unwrap());
        assert_eq!(current, overview);
        assert_eq!(current, HashMap::from([(1, 65), (2, 3), (3, -8), (4, 0)]));

        for row in inventory_value(&mut conn).unwrap() {
            assert_eq!(row.current_stock, current[&row.product_id]);
            let priced = &row.unit_price * BigDecimal::from(current[&row.product_id]);
            assert_eq!(row.inventory_value, priced);
        }
    }

    #[test]
    fn inventory_value_is_descending() {
        let mut conn = loaded(CATALOGUE);

        let values: Vec<(i32, String)> = inventory_value(&mut conn)
            .unwrap()
            .iter()
            .map(|r| (r.product_id, r.inventory_value.to_string()))
            .collect();
        assert_eq!(
            values,
            vec![
                (1, "650.00".to_string()),
                (2, "59.97".to_string()),
                (4, "0.00".to_string()),
                (3, "-36.00".to_string()),
            ]
        );
    }

    #[test]
    fn change_types_are_matched_exactly() {
        let mut conn = loaded(WIDGET);
        // Bypasses the CHECK constraint to show the stock CTE only counts the
        // two stored spellings.
        exec(
            &mut conn,
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO inventory_log VALUES (9, 1, 'in', 500, '2024-01-03');
             PRAGMA ignore_check_constraints = OFF;",
        );

        assert_eq!(current_stock(&mut conn).unwrap()[0].current_stock, 70);
        assert_eq!(outbound_per_product(&mut conn).unwrap()[0].total_quantity, 30);
    }

    #[test]
    fn current_stock_is_ascending() {
        let mut conn = loaded(CATALOGUE);

        let ids: Vec<i32> = current_stock(&mut conn)
            .unwrap()
            .iter()
            .map(|r| r.product_id)
            .collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);

        let overview: Vec<i32> = stock_overview(&mut conn)
            .unwrap()
            .iter()
            .map(|r| r.product_id)
            .collect();
        assert_eq!(overview, vec![1, 2, 3, 4]);
    }

    #[test]
    fn low_stock_is_the_subset_below_threshold() {
        let mut conn = loaded(CATALOGUE);

        let expected: Vec<ProductStock> = current_stock(&mut conn)
            .unwrap()
            .into_iter()
            .filter(|r| r.current_stock < RESTOCK_THRESHOLD)
            .collect();
        let low = low_stock(&mut conn).unwrap();
        assert_eq!(low, expected);
        assert!(low.iter().all(|r| r.product_id != 1));
    }

    #[test]
    fn shipment_totals() {
        let mut conn = loaded(CATALOGUE);

        let per_product: Vec<(i32, i64)> = shipped_per_product(&mut conn)
            .unwrap()
            .iter()
            .map(|r| (r.product_id, r.total_quantity))
            .collect();
        assert_eq!(per_product, vec![(1, 125), (2, 40), (3, 10)]);

        let per_supplier: Vec<(i32, i64)> = supplier_contribution(&mut conn)
            .unwrap()
            .iter()
            .map(|r| (r.supplier_id, r.total_quantity))
            .collect();
        assert_eq!(per_supplier, vec![(1, 110), (2, 65)]);
    }

    #[test]
    fn supplier_reports_share_one_query() {
        let mut conn = loaded(CATALOGUE);

        let units = run(&mut conn, ReportKind::UnitsPerSupplier).unwrap();
        let shipped = run(&mut conn, ReportKind::ShippedPerSupplier).unwrap();
        assert_eq!(units.rows, shipped.rows);
        assert_ne!(units.title, shipped.title);
    }

    #[test]
    fn daily_net_change_groups_by_product_and_date() {
        let mut conn = loaded(CATALOGUE);

        let changes: Vec<(i32, String, i64)> = daily_net_change(&mut conn)
            .unwrap()
            .iter()
            .map(|r| (r.product_id, r.log_date.to_string(), r.net_change))
            .collect();
        assert_eq!(
            changes,
            vec![
                (1, "2024-01-01".to_string(), 100),
                (1, "2024-01-02".to_string(), -35),
                (2, "2024-01-01".to_string(), 3),
                (2, "2024-01-04".to_string(), 0),
                (3, "2024-01-03".to_string(), -8),
            ]
        );
    }

    #[test]
    fn never_restocked_means_no_in_entries() {
        let mut conn = loaded(CATALOGUE);

        let ids: Vec<i32> = never_restocked(&mut conn)
            .unwrap()
            .iter()
            .map(|r| r.product_id)
            .collect();
        // 3 only ever went out, 4 never moved.
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn outbound_totals() {
        let mut conn = loaded(CATALOGUE);

        let outbound: Vec<(i32, i64)> = outbound_per_product(&mut conn)
            .unwrap()
            .iter()
            .map(|r| (r.product_id, r.total_quantity))
            .collect();
        assert_eq!(outbound, vec![(1, 35), (2, 10), (3, 8)]);
    }

    #[test]
    fn every_report_runs_on_an_empty_database() {
        let mut conn = testing::connection();

        for kind in ReportKind::ALL {
            let report = run(&mut conn, kind).unwrap();
            assert_eq!(report.report, kind);
            assert!(report.rows.is_empty(), "{kind}");
        }
    }
}
