//! Access SQL generation for table recreation

use serde_json::Value;

use super::{Column, ColumnType, Row, TableSchema};

const DEFAULT_TEXT_SIZE: u32 = 255;

/// Access DDL type for a column.
pub fn ddl_type(column: &Column) -> String {
    match column.column_type {
        ColumnType::Counter => "AUTOINCREMENT".to_string(),
        ColumnType::Boolean => "YESNO".to_string(),
        ColumnType::Byte => "BYTE".to_string(),
        ColumnType::Integer => "SHORT".to_string(),
        ColumnType::Long => "LONG".to_string(),
        ColumnType::Currency => "CURRENCY".to_string(),
        ColumnType::Single => "SINGLE".to_string(),
        ColumnType::Double => "DOUBLE".to_string(),
        ColumnType::DateTime => "DATETIME".to_string(),
        ColumnType::Binary => format!("BINARY({})", column.size.unwrap_or(DEFAULT_TEXT_SIZE)),
        ColumnType::LongBinary => "LONGBINARY".to_string(),
        ColumnType::Memo => "MEMO".to_string(),
        ColumnType::Guid => "GUID".to_string(),
        ColumnType::Decimal => "DECIMAL".to_string(),
        ColumnType::Text => format!("TEXT({})", text_size(column.size)),
        ColumnType::Other => format!("TEXT({})", DEFAULT_TEXT_SIZE),
    }
}

fn text_size(size: Option<u32>) -> u32 {
    match size {
        Some(n) if (1..=DEFAULT_TEXT_SIZE).contains(&n) => n,
        _ => DEFAULT_TEXT_SIZE,
    }
}

/// Bracket-quote an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// `CREATE TABLE` statement for `schema`.
pub fn create_table_sql(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quote_ident(&c.name), ddl_type(c));
            if !c.nullable && c.column_type != ColumnType::Counter {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();
    format!(
        "CREATE TABLE {} ({})",
        quote_ident(&schema.name),
        columns.join(", ")
    )
}

/// `INSERT INTO` statement for one row.
///
/// Every column is listed, counters included, so copied records keep their ids.
pub fn insert_sql(schema: &TableSchema, row: &Row) -> String {
    let (names, values): (Vec<String>, Vec<String>) = schema
        .columns
        .iter()
        .zip(row.iter().chain(std::iter::repeat(&Value::Null)))
        .map(|(column, value)| (quote_ident(&column.name), render_literal(column, value)))
        .unzip();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&schema.name),
        names.join(", "),
        values.join(", ")
    )
}

/// Render a value as an Access SQL literal for `column`.
///
/// Binary data has no literal form and is written as NULL.
pub fn render_literal(column: &Column, value: &Value) -> String {
    match (column.column_type, value) {
        (_, Value::Null) => "NULL".to_string(),
        (ColumnType::Binary | ColumnType::LongBinary, _) => "NULL".to_string(),
        (ColumnType::Boolean, Value::Bool(b)) => bool_literal(*b),
        (ColumnType::Boolean, Value::Number(n)) => bool_literal(n.as_f64().unwrap_or(0.0) != 0.0),
        (ColumnType::DateTime, Value::String(s)) => format!("#{}#", s.replace('T', " ")),
        (_, Value::Bool(b)) => bool_literal(*b),
        (t, Value::Number(n)) if t.is_numeric() => n.to_string(),
        (_, Value::Number(n)) => quote_text(&n.to_string()),
        (_, Value::String(s)) => quote_text(s),
        (_, other) => quote_text(&other.to_string()),
    }
}

fn bool_literal(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
