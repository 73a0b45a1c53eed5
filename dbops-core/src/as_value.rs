use crate::{Error, Result, Value};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};
use uuid::Uuid;

/// Text layout used to bind and parse dates.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// Text layout used to bind times.
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
const TIME_FORMAT_SHORT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");
/// Text layout used to bind timestamps without time zone.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const TIMESTAMP_FORMAT_SHORT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is the single conversion point used for query arguments and for row
/// decoding. Implementations:
/// - accept the canonical variant for the type (e.g. `Value::Int64` for `i64`);
/// - may accept alternate widths, always range checked;
/// - may parse `Value::Varchar` for types that backends store as text
///   (dates, times, decimals, uuids);
/// - return a descriptive error naming the target type otherwise.
///
/// ```rust
/// use dbops_core::{AsValue, Value};
/// let v = 42i64.as_value();
/// assert_eq!(v, Value::Int64(Some(42)));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The NULL variant carrying this type.
    fn as_empty_value() -> Value;
    /// Owned [`Value`] representation of `self`.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn out_of_range<T>(value: impl std::fmt::Display, source: &str) -> Error {
    Error::msg(format!(
        "Value {value}: {source} is out of range for {}",
        any::type_name::<T>()
    ))
}

fn parse_first<T>(
    input: &str,
    formats: &[&[BorrowedFormatItem<'static>]],
    parse: impl Fn(&str, &[BorrowedFormatItem<'static>]) -> std::result::Result<T, time::error::Parse>,
) -> Result<T> {
    let mut last = None;
    for format in formats {
        match parse(input, *format) {
            Ok(v) => return Ok(v),
            Err(e) => last = Some(e),
        }
    }
    let error = Error::msg(format!(
        "Cannot parse `{input}` as {}",
        any::type_name::<T>()
    ));
    Err(match last {
        Some(e) => error.context(e),
        None => error,
    })
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $($pat_rest => $expr_rest,)*
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
        }
    };
}

impl_as_value!(
    bool,
    Value::Boolean,
    Value::Int64(Some(v)) => Ok(v != 0),
    Value::Int32(Some(v)) => Ok(v != 0),
    Value::UInt64(Some(v)) => Ok(v != 0),
);
impl_as_value!(
    i32,
    Value::Int32,
    Value::Int64(Some(v)) => i32::try_from(v).map_err(|_| out_of_range::<i32>(v, "i64")),
    Value::UInt64(Some(v)) => i32::try_from(v).map_err(|_| out_of_range::<i32>(v, "u64")),
);
impl_as_value!(
    i64,
    Value::Int64,
    Value::Int32(Some(v)) => Ok(v.into()),
    Value::UInt64(Some(v)) => i64::try_from(v).map_err(|_| out_of_range::<i64>(v, "u64")),
    Value::Decimal(Some(v)) => {
        let error = Error::msg(format!("Value {v}: Decimal does not fit into i64"));
        if !v.is_integer() {
            return Err(error.context("The value is not an integer"));
        }
        v.to_i64().ok_or(error)
    },
);
impl_as_value!(
    u64,
    Value::UInt64,
    Value::Int64(Some(v)) => u64::try_from(v).map_err(|_| out_of_range::<u64>(v, "i64")),
    Value::Int32(Some(v)) => u64::try_from(v).map_err(|_| out_of_range::<u64>(v, "i32")),
);
impl_as_value!(
    f64,
    Value::Float64,
    Value::Int64(Some(v)) => Ok(v as f64),
    Value::Int32(Some(v)) => Ok(v.into()),
    Value::Decimal(Some(v)) => v
        .to_f64()
        .ok_or_else(|| Error::msg(format!("Cannot convert the Decimal value `{v}` to f64"))),
);
impl_as_value!(
    Decimal,
    Value::Decimal,
    Value::Int64(Some(v)) => Ok(v.into()),
    Value::Int32(Some(v)) => Ok(v.into()),
    Value::Float64(Some(v)) => Decimal::from_f64(v)
        .ok_or_else(|| Error::msg(format!("Cannot convert the f64 value `{v}` to Decimal"))),
    Value::Varchar(Some(v)) => Ok(v.trim().parse::<Decimal>()?),
);
impl_as_value!(String, Value::Varchar);
impl_as_value!(
    Box<[u8]>,
    Value::Blob,
    Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
);
impl_as_value!(
    Date,
    Value::Date,
    Value::Timestamp(Some(v)) => Ok(v.date()),
    Value::Varchar(Some(v)) => parse_first(&v, &[DATE_FORMAT], |v, f| Date::parse(v, f)),
);
impl_as_value!(
    Time,
    Value::Time,
    Value::Varchar(Some(v)) => parse_first(&v, &[TIME_FORMAT, TIME_FORMAT_SHORT], |v, f| {
        Time::parse(v, f)
    }),
);
impl_as_value!(
    PrimitiveDateTime,
    Value::Timestamp,
    Value::Varchar(Some(v)) => parse_first(
        &v,
        &[TIMESTAMP_FORMAT, TIMESTAMP_FORMAT_SHORT],
        |v, f| PrimitiveDateTime::parse(v, f),
    ),
);
impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    Value::Varchar(Some(v)) => OffsetDateTime::parse(&v, &Rfc3339)
        .map_err(|e| Error::new(e).context(format!("Cannot parse `{v}` as OffsetDateTime"))),
);
impl_as_value!(
    Uuid,
    Value::Uuid,
    Value::Varchar(Some(v)) => Ok(Uuid::parse_str(&v)?),
    Value::Blob(Some(v)) => Ok(Uuid::from_slice(&v)?),
);

impl AsValue for u32 {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(Some(v)) => u32::try_from(v).map_err(|_| out_of_range::<u32>(v, "i64")),
            Value::Int32(Some(v)) => u32::try_from(v).map_err(|_| out_of_range::<u32>(v, "i32")),
            Value::UInt64(Some(v)) => u32::try_from(v).map_err(|_| out_of_range::<u32>(v, "u64")),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to u32"))),
        }
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        f64::try_from_value(value).map(|v| v as f32)
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        <Box<[u8]>>::try_from_value(value).map(Into::into)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}
