//! DuckDB / MotherDuck engine backed by the `duckdb` crate

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::arrow::datatypes::DataType;
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::{AccessMode, Config, Connection};

use super::{Engine, EngineHandle};
use crate::types::{
    ColumnInfo, DatabaseError, DatabaseTarget, EngineMode, QueryResult, Result, Value,
};

/// User agent reported to DuckDB and MotherDuck on every connection
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Opens DuckDB connections for local, in-memory and MotherDuck targets
#[derive(Debug, Clone, Default)]
pub struct DuckDbEngine {
    home_dir: Option<PathBuf>,
}

impl DuckDbEngine {
    pub fn new(home_dir: Option<PathBuf>) -> Self {
        Self { home_dir }
    }

    fn config(&self, read_only: bool) -> duckdb::Result<Config> {
        let mode = if read_only {
            AccessMode::ReadOnly
        } else {
            AccessMode::Automatic
        };
        let mut config = Config::default()
            .access_mode(mode)?
            .with("custom_user_agent", USER_AGENT)?;
        if let Some(home) = &self.home_dir {
            config = config.with("home_directory", &home.to_string_lossy())?;
        }
        Ok(config)
    }
}

impl Engine for DuckDbEngine {
    fn connect(&self, target: &DatabaseTarget, read_only: bool) -> Result<Box<dyn EngineHandle>> {
        tracing::debug!(
            db = %target,
            mode = target.engine_mode().as_str(),
            read_only,
            "Opening DuckDB connection"
        );

        let config = self.config(read_only).map_err(connection_error)?;
        let conn = match target.engine_mode() {
            EngineMode::InMemory => Connection::open_in_memory_with_flags(config),
            EngineMode::LocalFile | EngineMode::Cloud => {
                Connection::open_with_flags(target.resolved_uri(), config)
            }
        }
        .map_err(connection_error)?;

        Ok(Box::new(DuckDbHandle { conn }))
    }
}

struct DuckDbHandle {
    conn: Connection,
}

impl EngineHandle for DuckDbHandle {
    fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(sql).map_err(query_error)?;
        let mut rows = stmt.query([]).map_err(query_error)?;
        let column_count = rows.as_ref().map(|s| s.column_count()).unwrap_or(0);

        let mut data = Vec::new();
        while let Some(row) = rows.next().map_err(query_error)? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value: DuckValue = row.get(idx).map_err(query_error)?;
                values.push(convert_value(value));
            }
            data.push(values);
        }
        drop(rows);

        let columns = stmt
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| ColumnInfo::new(name, type_label(&stmt.column_type(idx))))
            .collect();

        Ok(QueryResult::new(columns, data))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| connection_error(e))
    }
}

fn connection_error(err: duckdb::Error) -> DatabaseError {
    DatabaseError::Connection(err.to_string())
}

fn query_error(err: duckdb::Error) -> DatabaseError {
    DatabaseError::Query(err.to_string())
}

fn convert_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::Int(i.into()),
        DuckValue::SmallInt(i) => Value::Int(i.into()),
        DuckValue::Int(i) => Value::Int(i.into()),
        DuckValue::BigInt(i) => Value::Int(i),
        DuckValue::UTinyInt(i) => Value::Int(i.into()),
        DuckValue::USmallInt(i) => Value::Int(i.into()),
        DuckValue::UInt(i) => Value::Int(i.into()),
        DuckValue::UBigInt(i) => match i64::try_from(i) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Other(i.to_string()),
        },
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Other(i.to_string()),
        },
        DuckValue::UHugeInt(i) => match i64::try_from(i) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Other(i.to_string()),
        },
        DuckValue::Float(f) => Value::Float(f.into()),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => Value::Other(d.to_string()),
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Blob(b) | DuckValue::Geometry(b) => Value::Bytes(b),
        DuckValue::Date32(days) => format_date(days),
        DuckValue::Time64(unit, t) => format_time(to_micros(unit, t)),
        DuckValue::Timestamp(unit, t) => format_timestamp(to_micros(unit, t)),
        DuckValue::Interval {
            months,
            days,
            nanos,
        } => Value::Other(format_interval(months, days, nanos / 1_000)),
        DuckValue::Union(inner) => convert_value(*inner),
        nested @ (DuckValue::List(_)
        | DuckValue::Array(_)
        | DuckValue::Struct(_)
        | DuckValue::Map(_)) => Value::Other(value_text(&nested)),
        // variants added by newer duckdb releases
        other => Value::Other(format!("{:?}", other)),
    }
}

/// DuckDB's text form of a value, recursing into lists, structs and maps
fn value_text(value: &DuckValue) -> String {
    match value {
        DuckValue::List(items) | DuckValue::Array(items) => {
            let items: Vec<String> = items.iter().map(value_text).collect();
            format!("[{}]", items.join(", "))
        }
        DuckValue::Struct(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, v)| format!("'{}': {}", name, value_text(v)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        DuckValue::Map(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}={}", value_text(k), value_text(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        DuckValue::Union(inner) => value_text(inner),
        scalar => convert_value(scalar.clone()).to_string(),
    }
}

/// Interval text as DuckDB prints it: `1 year 2 months 3 days 01:02:03.5`
fn format_interval(months: i32, days: i32, micros: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        if n == 1 {
            format!("{} {}", n, name)
        } else {
            format!("{} {}s", n, name)
        }
    }

    let mut parts = Vec::new();
    let (years, months) = (i64::from(months) / 12, i64::from(months) % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "month"));
    }
    if days != 0 {
        parts.push(unit(days.into(), "day"));
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let micros = micros.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut time = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }
    parts.join(" ")
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn format_date(days_since_epoch: i32) -> Value {
    days_since_epoch
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|d| Value::Other(d.to_string()))
        .unwrap_or_else(|| Value::Other(days_since_epoch.to_string()))
}

fn format_time(micros: i64) -> Value {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok();
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    secs.and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, nanos))
        .map(|t| Value::Other(t.to_string()))
        .unwrap_or_else(|| Value::Other(micros.to_string()))
}

fn format_timestamp(micros: i64) -> Value {
    DateTime::from_timestamp_micros(micros)
        .map(|ts| Value::Other(ts.naive_utc().to_string()))
        .unwrap_or_else(|| Value::Other(micros.to_string()))
}

/// DuckDB SQL name for an arrow column type
fn type_label(data_type: &DataType) -> String {
    match data_type {
        DataType::Null => "NULL".to_string(),
        DataType::Boolean => "BOOLEAN".to_string(),
        DataType::Int8 => "TINYINT".to_string(),
        DataType::Int16 => "SMALLINT".to_string(),
        DataType::Int32 => "INTEGER".to_string(),
        DataType::Int64 => "BIGINT".to_string(),
        DataType::UInt8 => "UTINYINT".to_string(),
        DataType::UInt16 => "USMALLINT".to_string(),
        DataType::UInt32 => "UINTEGER".to_string(),
        DataType::UInt64 => "UBIGINT".to_string(),
        DataType::Float32 => "FLOAT".to_string(),
        DataType::Float64 => "DOUBLE".to_string(),
        DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR".to_string(),
        DataType::Binary | DataType::LargeBinary => "BLOB".to_string(),
        DataType::Date32 | DataType::Date64 => "DATE".to_string(),
        DataType::Time32(_) | DataType::Time64(_) => "TIME".to_string(),
        DataType::Timestamp(_, None) => "TIMESTAMP".to_string(),
        DataType::Timestamp(_, Some(_)) => "TIMESTAMP WITH TIME ZONE".to_string(),
        DataType::Interval(_) => "INTERVAL".to_string(),
        DataType::Decimal128(p, s) => format!("DECIMAL({},{})", p, s),
        DataType::List(field) | DataType::LargeList(field) => {
            format!("{}[]", type_label(field.data_type()))
        }
        DataType::Struct(_) => "STRUCT".to_string(),
        DataType::Map(_, _) => "MAP".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}
