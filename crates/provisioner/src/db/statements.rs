//! SQL text for the provisioning statements.
//!
//! Names are interpolated as quoted identifiers; row values are always bound.

use sqlx::{MySql, QueryBuilder};

use crate::config::{KEY_COLUMN_CAPACITY, PAYLOAD_COLUMN_CAPACITY};
use crate::generators::GeneratedRow;

/// Quotes an identifier with backticks, doubling any embedded backtick.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Fully qualified `` `database`.`table` `` reference.
pub fn qualified(database: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(database), quote_ident(table))
}

pub fn drop_database(database: &str) -> String {
    format!("DROP DATABASE IF EXISTS {}", quote_ident(database))
}

pub fn create_database(database: &str) -> String {
    format!(
        "CREATE DATABASE {} DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_0900_ai_ci",
        quote_ident(database)
    )
}

pub fn use_database(database: &str) -> String {
    format!("USE {}", quote_ident(database))
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn create_table(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE {} (
            `uuid` VARBINARY({KEY_COLUMN_CAPACITY}) NOT NULL,
            `data` VARBINARY({PAYLOAD_COLUMN_CAPACITY}) NOT NULL,
            PRIMARY KEY (`uuid`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci
        "#,
        quote_ident(table)
    )
}

pub fn count_rows(database: &str, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", qualified(database, table))
}

pub const SHOW_DATABASES: &str = "SHOW DATABASES";

/// Builds one multi-row insert for `rows`, binding every key and payload.
pub fn insert_rows<'a>(
    database: &str,
    table: &str,
    rows: &'a [GeneratedRow],
) -> QueryBuilder<'a, MySql> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} (`uuid`, `data`) ",
        qualified(database, table)
    ));
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.key()).push_bind(row.data.as_slice());
    });
    qb
}
