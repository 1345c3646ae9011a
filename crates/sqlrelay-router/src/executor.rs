//! Execution Adapter
//!
//! Runs a query on the node chosen by the strategy engine. Every request
//! opens its own connection (bounded connect timeout) and closes it on
//! every exit path before returning, so one request's connection failure
//! can never affect another's. There is no pooling and no retry.
//!
//! Reads return the full result set as an array of row objects; writes
//! run under autocommit and return `{"affected_rows": n}`.

use std::time::Duration;

use serde_json::{json, Map, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row};
use tracing::info;

use sqlrelay_common::{RelayError, Result};

use crate::cluster::{host_port, DbConfig};

/// Bound on opening a connection to the target node.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Executes `query` on the node at `target`.
///
/// Any connect or execution failure is reported as
/// [`RelayError::Execution`] carrying the target's address.
pub async fn execute(db: &DbConfig, target: &str, query: &str, is_read: bool) -> Result<Value> {
    let (host, port) = host_port(target, db.port);
    let options = MySqlConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.database);

    let mut conn = tokio::time::timeout(CONNECT_TIMEOUT, options.connect())
        .await
        .map_err(|_| execution_error(target, "connection timed out"))?
        .map_err(|e| execution_error(target, &e.to_string()))?;

    let outcome = if is_read {
        sqlx::query(query)
            .fetch_all(&mut conn)
            .await
            .map(|rows| Value::Array(rows.iter().map(|r| Value::Object(row_to_json(r))).collect()))
    } else {
        sqlx::query(query)
            .execute(&mut conn)
            .await
            .map(|result| json!({"affected_rows": result.rows_affected()}))
    };

    // Release the connection before surfacing the result, success or not.
    let _ = conn.close().await;

    match outcome {
        Ok(data) => {
            info!("executed on {} ({})", target, if is_read { "read" } else { "write" });
            Ok(data)
        }
        Err(e) => Err(execution_error(target, &e.to_string())),
    }
}

fn execution_error(target: &str, message: &str) -> RelayError {
    RelayError::Execution {
        node: target.to_string(),
        message: message.to_string(),
    }
}

/// Converts a row into a column-name → JSON-value object.
fn row_to_json(row: &MySqlRow) -> Map<String, Value> {
    let mut object = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), cell_to_json(row, i));
    }
    object
}

/// Decodes one cell into JSON without knowing the schema.
///
/// The query text is arbitrary, so the column types are only known at
/// runtime; each decode is attempted in turn until one matches the
/// column's wire type. NULL short-circuits through whichever arm matches
/// the column type first.
fn cell_to_json(row: &MySqlRow, i: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(i) {
        return v.map(|f| Value::from(f as f64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(i) {
        return v.map(|t| Value::from(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i) {
        return v.map(|t| Value::from(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(i) {
        return v.map(|t| Value::from(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(i) {
        return v.map(|t| Value::from(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(i) {
        return v
            .map(|b| Value::from(String::from_utf8_lossy(&b).into_owned()))
            .unwrap_or(Value::Null);
    }
    // DECIMAL and friends: the binary protocol carries them as text
    if let Ok(v) = row.try_get_unchecked::<Option<String>, _>(i) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    Value::Null
}
