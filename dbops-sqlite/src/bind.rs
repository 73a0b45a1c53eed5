use crate::error_message_from_ptr;
use dbops_core::{
    DATE_FORMAT, Error, Result, TIME_FORMAT, TIMESTAMP_FORMAT, Value, truncate_long,
};
use libsqlite3_sys::*;
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{CStr, c_char, c_int, c_void},
};
use time::format_description::well_known::Rfc3339;

unsafe fn bind_text(statement: *mut sqlite3_stmt, index: c_int, value: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            value.as_ptr() as *const c_char,
            value.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

/// Bind every argument, by position starting from 1.
pub(crate) unsafe fn bind_args(statement: *mut sqlite3_stmt, args: &[Value]) -> Result<()> {
    unsafe {
        let expected = sqlite3_bind_parameter_count(statement) as usize;
        if expected != args.len() {
            let error = Error::msg(format!(
                "The query expects {} parameters but {} were provided",
                expected,
                args.len()
            ))
            .context(format!(
                "While binding the parameters of:\n{}",
                truncate_long!(CStr::from_ptr(sqlite3_sql(statement)).to_string_lossy())
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        for (i, value) in args.iter().enumerate() {
            bind_value(statement, i as c_int + 1, value)?;
        }
        Ok(())
    }
}

unsafe fn bind_value(statement: *mut sqlite3_stmt, index: c_int, value: &Value) -> Result<()> {
    unsafe {
        let rc = match value {
            _ if value.is_null() => sqlite3_bind_null(statement, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v),
            Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
            Value::UInt64(Some(v)) => {
                let Ok(v) = sqlite3_int64::try_from(*v) else {
                    return Err(Error::msg(format!(
                        "Cannot bind u64 value `{}` into sqlite integer because it's out of bounds",
                        v
                    )));
                };
                sqlite3_bind_int64(statement, index, v)
            }
            Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
            Value::Decimal(Some(v)) => sqlite3_bind_double(
                statement,
                index,
                v.to_f64().ok_or_else(|| {
                    Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                })?,
            ),
            Value::Varchar(Some(v)) => bind_text(statement, index, v),
            Value::Blob(Some(v)) if v.is_empty() => sqlite3_bind_zeroblob(statement, index, 0),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Date(Some(v)) => bind_text(statement, index, &v.format(DATE_FORMAT)?),
            Value::Time(Some(v)) => bind_text(statement, index, &v.format(TIME_FORMAT)?),
            Value::Timestamp(Some(v)) => {
                bind_text(statement, index, &v.format(TIMESTAMP_FORMAT)?)
            }
            Value::TimestampWithTimezone(Some(v)) => {
                bind_text(statement, index, &v.format(&Rfc3339)?)
            }
            Value::Uuid(Some(v)) => bind_text(statement, index, &v.to_string()),
            _ => {
                let error = Error::msg(format!("Cannot use a {:?} as a query parameter", value));
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        if rc != SQLITE_OK {
            let db = sqlite3_db_handle(statement);
            let query = sqlite3_sql(statement);
            let error = Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string())
                .context(format!(
                    "Cannot bind parameter {} to query:\n{}",
                    index,
                    truncate_long!(CStr::from_ptr(query).to_string_lossy())
                ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}
