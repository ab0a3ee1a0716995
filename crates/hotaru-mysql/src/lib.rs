//! Blocking MySQL binding for hotaru.
//!
//! [`MysqlConnection`] implements the ORM's
//! [`Connection`](hotaru_orm::Connection) boundary over one `mysql::Conn`.
//! Named parameter bindings map onto the driver's `:name` placeholder
//! support, batch rows run one prepared statement once per row, and result
//! rows come back as [`hotaru_orm::Row`] values.
//!
//! Call [`install`] once at startup so sessions can be opened from a
//! [`DbConfig`] alone:
//!
//! ```no_run
//! use hotaru_orm::{update_default, DbConfigPatch, Session};
//!
//! hotaru_mysql::install();
//! update_default(DbConfigPatch {
//!     database: Some("blog".into()),
//!     user: Some("rinka".into()),
//!     password: Some("rinka".into()),
//!     ..DbConfigPatch::default()
//! });
//! let session = Session::open_default()?;
//! # drop(session);
//! # Ok::<(), hotaru_orm::Error>(())
//! ```

use chrono::{Datelike, Timelike};
use mysql::prelude::Queryable;
use tracing::debug;

use hotaru_core::{DbConfig, Error, Result};
use hotaru_orm::{Connection, Outcome, Params, Row, RowCursor, Value};

/// Registers this driver as the process connector.
///
/// Installing replaces any previously registered connector; sessions opened
/// afterwards connect through `mysql::Conn`.
pub fn install() {
    hotaru_orm::register_connector(|config| {
        MysqlConnection::connect(config).map(|conn| Box::new(conn) as Box<dyn Connection>)
    });
}

/// One blocking MySQL connection.
pub struct MysqlConnection {
    conn: Option<mysql::Conn>,
    opts: mysql::Opts,
    autocommit: bool,
}

impl MysqlConnection {
    /// Connects with the given configuration.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let opts = mysql::Opts::from(
            mysql::OptsBuilder::new()
                .ip_or_hostname(Some(config.host.clone()))
                .tcp_port(config.port)
                .user(Some(config.user.clone()))
                .pass(Some(config.password.clone()))
                .db_name(Some(config.database.clone())),
        );
        let conn = mysql::Conn::new(opts.clone()).map_err(driver_err)?;
        debug!(host = %config.host, database = %config.database, "mysql connection established");
        Ok(Self {
            conn: Some(conn),
            opts,
            autocommit: true,
        })
    }

    fn conn(&mut self) -> Result<&mut mysql::Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::driver("connection is closed"))
    }
}

impl Connection for MysqlConnection {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Outcome> {
        let conn = self.conn()?;
        conn.exec_drop(sql, to_driver_params(params))
            .map_err(driver_err)?;
        let last_insert_id = match conn.last_insert_id() {
            0 => None,
            id => Some(id),
        };
        Ok(Outcome {
            affected: conn.affected_rows(),
            last_insert_id,
        })
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        let conn = self.conn()?;
        let rows: Vec<mysql::Row> = conn
            .exec(sql, to_driver_params(params))
            .map_err(driver_err)?;
        Ok(rows.into_iter().map(convert_row).collect())
    }

    fn query_iter<'a>(
        &'a mut self,
        sql: &str,
        params: &Params,
    ) -> Result<Box<dyn RowCursor + 'a>> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Error::driver("connection is closed"))?;
        let result = conn
            .exec_iter(sql, to_driver_params(params))
            .map_err(driver_err)?;
        Ok(Box::new(MysqlCursor { result }))
    }

    fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<u64> {
        let conn = self.conn()?;
        let statement = conn.prep(sql).map_err(driver_err)?;
        let mut total = 0;
        for row in rows {
            let values: Vec<mysql::Value> = row.iter().map(to_driver_value).collect();
            conn.exec_drop(&statement, mysql::Params::Positional(values))
                .map_err(driver_err)?;
            total += conn.affected_rows();
        }
        Ok(total)
    }

    fn begin(&mut self) -> Result<()> {
        self.conn()?.query_drop("BEGIN").map_err(driver_err)
    }

    fn commit(&mut self) -> Result<()> {
        self.conn()?.query_drop("COMMIT").map_err(driver_err)
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn()?.query_drop("ROLLBACK").map_err(driver_err)
    }

    fn autocommit(&self) -> bool {
        self.autocommit
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        let statement = format!("SET autocommit = {}", i32::from(enabled));
        self.conn()?.query_drop(statement).map_err(driver_err)?;
        self.autocommit = enabled;
        Ok(())
    }

    fn ping(&mut self) -> bool {
        self.conn.as_mut().is_some_and(|c| c.ping().is_ok())
    }

    fn reconnect(&mut self) -> Result<()> {
        debug!("reconnecting mysql connection");
        let conn = mysql::Conn::new(self.opts.clone()).map_err(driver_err)?;
        self.conn = Some(conn);
        // Restore the session-level autocommit flag on the new link.
        let autocommit = self.autocommit;
        self.set_autocommit(autocommit)
    }

    fn close(&mut self) -> Result<()> {
        self.conn.take();
        Ok(())
    }
}

struct MysqlCursor<'a> {
    result: mysql::QueryResult<'a, 'a, 'a, mysql::Binary>,
}

impl RowCursor for MysqlCursor<'_> {
    fn next_row(&mut self) -> Option<Result<Row>> {
        self.result
            .next()
            .map(|row| row.map(convert_row).map_err(driver_err))
    }
}

fn driver_err(err: mysql::Error) -> Error {
    Error::driver(err.to_string())
}

/// Converts the statement's named bindings to driver parameters.
fn to_driver_params(params: &Params) -> mysql::Params {
    if params.is_empty() {
        mysql::Params::Empty
    } else {
        mysql::Params::from(
            params
                .iter()
                .map(|(name, value)| (name.to_string(), to_driver_value(value)))
                .collect::<Vec<(String, mysql::Value)>>(),
        )
    }
}

/// Converts one ORM value to a driver value.
fn to_driver_value(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Bool(b) => mysql::Value::Int(i64::from(*b)),
        Value::Int(i) => mysql::Value::Int(*i),
        Value::Float(f) => mysql::Value::Double(*f),
        Value::String(s) => mysql::Value::Bytes(s.clone().into_bytes()),
        Value::Bytes(b) => mysql::Value::Bytes(b.clone()),
        Value::Date(d) => {
            mysql::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        Value::DateTime(dt) => mysql::Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000,
        ),
        Value::Time(t) => mysql::Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1_000,
        ),
        Value::Uuid(u) => mysql::Value::Bytes(u.to_string().into_bytes()),
        Value::Json(j) => mysql::Value::Bytes(j.to_string().into_bytes()),
    }
}

/// Converts one driver value to an ORM value. Byte payloads are decoded as
/// UTF-8 strings when possible, matching what MySQL returns for text
/// columns.
fn convert_value(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        },
        mysql::Value::Int(i) => Value::Int(i),
        mysql::Value::UInt(u) => Value::Int(u as i64),
        mysql::Value::Float(f) => Value::Float(f64::from(f)),
        mysql::Value::Double(d) => Value::Float(d),
        mysql::Value::Date(year, month, day, 0, 0, 0, 0) => {
            chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .map_or(Value::Null, Value::Date)
        }
        mysql::Value::Date(year, month, day, hour, minute, second, micros) => {
            chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or(Value::Null, Value::DateTime)
        }
        mysql::Value::Time(false, 0, hour, minute, second, micros) => {
            chrono::NaiveTime::from_hms_micro_opt(
                u32::from(hour),
                u32::from(minute),
                u32::from(second),
                micros,
            )
            .map_or(Value::Null, Value::Time)
        }
        other @ mysql::Value::Time(..) => Value::String(format!("{other:?}")),
    }
}

/// Converts one driver row to an ORM row.
fn convert_row(row: mysql::Row) -> Row {
    let columns: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().to_string())
        .collect();
    let values: Vec<Value> = row.unwrap().into_iter().map(convert_value).collect();
    Row::new(columns, values)
}
