use crate::{AsValue, Error, Result, RowLabeled, Value};
use anyhow::Context as _;

/// A single destination a row cell can be written into.
///
/// Every [`AsValue`] type is a destination; the cell is converted with
/// [`AsValue::try_from_value`] and assigned in place.
pub trait Scan: Send {
    fn scan(&mut self, value: Value) -> Result<()>;
}

impl<T: AsValue + Send> Scan for T {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = T::try_from_value(value)?;
        Ok(())
    }
}

/// A record that can be populated from a row.
///
/// `scan_columns` returns one destination per selected column, in the same
/// order as the columns of the query. Matching that order is the caller's
/// responsibility, only the count is checked.
///
/// Usually derived with `#[derive(Record)]`, which lists the fields in
/// declaration order. Tuples up to six elements implement it too.
pub trait ScanRow {
    fn scan_columns(&mut self) -> Vec<&mut dyn Scan>;
}

macro_rules! impl_scan_row_tuple {
    ($($T:ident $i:tt),+) => {
        impl<$($T: Scan),+> ScanRow for ($($T,)+) {
            fn scan_columns(&mut self) -> Vec<&mut dyn Scan> {
                vec![$(&mut self.$i as &mut dyn Scan),+]
            }
        }
    };
}

impl_scan_row_tuple!(A 0);
impl_scan_row_tuple!(A 0, B 1);
impl_scan_row_tuple!(A 0, B 1, C 2);
impl_scan_row_tuple!(A 0, B 1, C 2, D 3);
impl_scan_row_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_scan_row_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);

/// Write the cells of `row` into the destinations of `record`, in order.
pub fn scan_row(record: &mut impl ScanRow, row: RowLabeled) -> Result<()> {
    let mut columns = record.scan_columns();
    if columns.len() != row.len() {
        return Err(Error::msg(format!(
            "The record expects {} columns but the row has {} ({})",
            columns.len(),
            row.len(),
            row.labels.join(", "),
        )));
    }
    for ((column, label), value) in columns
        .iter_mut()
        .zip(row.labels.iter())
        .zip(row.values.into_vec())
    {
        column
            .scan(value)
            .with_context(|| format!("While scanning the column `{label}`"))?;
    }
    Ok(())
}
