diesel::table! {
    products (product_id) {
        product_id -> Integer,
        name -> Text,
        category -> Nullable<Text>,
        unit_price -> Numeric,
    }
}

diesel::table! {
    suppliers (supplier_id) {
        supplier_id -> Integer,
        name -> Text,
        location -> Nullable<Text>,
    }
}

diesel::table! {
    shipments (shipment_id) {
        shipment_id -> Integer,
        supplier_id -> Integer,
        product_id -> Integer,
        quantity -> Integer,
        shipment_date -> Date,
    }
}

diesel::table! {
    inventory_log (log_id) {
        log_id -> Integer,
        product_id -> Integer,
        change_type -> Text,
        quantity -> Integer,
        log_date -> Date,
    }
}

// Staging tables have no key of their own; sqlite's rowid stands in.
diesel::table! {
    staging_products (rowid) {
        rowid -> BigInt,
        product_id -> Nullable<Integer>,
        name -> Nullable<Text>,
        category -> Nullable<Text>,
        unit_price -> Nullable<Double>,
    }
}

diesel::table! {
    staging_suppliers (rowid) {
        rowid -> BigInt,
        supplier_id -> Nullable<Integer>,
        name -> Nullable<Text>,
        location -> Nullable<Text>,
    }
}

diesel::table! {
    staging_shipments (rowid) {
        rowid -> BigInt,
        shipment_id -> Nullable<Integer>,
        supplier_id -> Nullable<Integer>,
        product_id -> Nullable<Integer>,
        quantity -> Nullable<Integer>,
        shipment_date -> Nullable<Text>,
    }
}

diesel::table! {
    staging_inventory_log (rowid) {
        rowid -> BigInt,
        log_id -> Nullable<Integer>,
        product_id -> Nullable<Integer>,
        change_type -> Nullable<Text>,
        quantity -> Nullable<Integer>,
        log_date -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    products,
    suppliers,
    shipments,
    inventory_log,
);
