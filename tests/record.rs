#[cfg(test)]
mod tests {
    use dbops::{Record, RowLabeled, ScanRow, Value, scan_row};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use time::macros::date;
    use uuid::Uuid;

    #[derive(Default, Debug, PartialEq, Record)]
    struct Invoice {
        id: i64,
        customer: String,
        total: Decimal,
        issued: Option<time::Date>,
        paid: Option<bool>,
        #[record(skip)]
        note: String,
        reference: Uuid,
    }

    #[derive(Default, Debug, Record)]
    struct Pair(u32, Option<String>);

    fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
        RowLabeled::new(
            labels.iter().map(|v| v.to_string()).collect::<Arc<[String]>>(),
            values.into_boxed_slice(),
        )
    }

    #[test]
    fn derive_lists_fields_in_declaration_order() {
        let mut invoice = Invoice::default();
        assert_eq!(invoice.scan_columns().len(), 6);
        let reference = Uuid::parse_str("0b5b8d2e-5d1a-4a61-9f35-1f5f2c8f8a11").unwrap();
        scan_row(
            &mut invoice,
            row(
                &["id", "customer", "total", "issued", "paid", "reference"],
                vec![
                    Value::Int64(Some(7)),
                    Value::Varchar(Some("ACME".into())),
                    Value::Varchar(Some("199.90".into())),
                    Value::Varchar(Some("2025-03-01".into())),
                    Value::Null,
                    Value::Varchar(Some(reference.to_string())),
                ],
            ),
        )
        .expect("The row should fit the record");
        assert_eq!(
            invoice,
            Invoice {
                id: 7,
                customer: "ACME".into(),
                total: Decimal::new(19990, 2),
                issued: Some(date!(2025 - 03 - 01)),
                paid: None,
                note: String::new(),
                reference,
            }
        );
    }

    #[test]
    fn derive_tuple_struct() {
        let mut pair = Pair::default();
        scan_row(
            &mut pair,
            row(
                &["n", "label"],
                vec![Value::Int64(Some(3)), Value::Varchar(Some("three".into()))],
            ),
        )
        .unwrap();
        assert_eq!(pair.0, 3);
        assert_eq!(pair.1.as_deref(), Some("three"));
    }

    #[test]
    fn column_count_mismatch_is_an_error() {
        let mut pair = Pair::default();
        let result = scan_row(&mut pair, row(&["n"], vec![Value::Int64(Some(3))]));
        assert!(result.is_err());
    }

    #[test]
    fn incompatible_column_is_an_error() {
        let mut pair = Pair::default();
        let error = scan_row(
            &mut pair,
            row(
                &["n", "label"],
                vec![Value::Varchar(Some("x".into())), Value::Null],
            ),
        )
        .unwrap_err();
        assert!(format!("{error:#}").contains("`n`"));
    }

    #[test]
    fn tuples_scan_in_order() {
        let mut value = (0i64, String::new(), None::<f64>);
        scan_row(
            &mut value,
            row(
                &["a", "b", "c"],
                vec![
                    Value::Int32(Some(1)),
                    Value::Varchar(Some("b".into())),
                    Value::Float64(Some(0.5)),
                ],
            ),
        )
        .unwrap();
        assert_eq!(value, (1, "b".to_string(), Some(0.5)));
    }
}
