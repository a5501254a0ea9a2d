#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use stow_core::{AsValue, Value};
    use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};
    use uuid::Uuid;

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert!(Value::Int32(None).is_null());
        assert!(!Value::Int32(Some(0)).is_null());
    }

    #[test]
    fn value_integers() {
        let val: Value = 127i8.into();
        assert_eq!(val, Value::Int8(Some(127)));
        assert_eq!(i64::try_from_value(val).unwrap(), 127);
        assert_eq!(u8::try_from_value(Value::Int64(Some(255))).unwrap(), 255);
        assert!(u8::try_from_value(Value::Int64(Some(256))).is_err());
        assert!(u32::try_from_value(Value::Int16(Some(-1))).is_err());
        assert_eq!(i32::try_from_value(Value::UInt64(Some(7))).unwrap(), 7);
        assert_eq!(
            i16::try_from_value(Value::Decimal(Some(Decimal::from(-300)))).unwrap(),
            -300
        );
        assert!(i16::try_from_value(Value::Decimal(Some(Decimal::new(15, 1)))).is_err());
        assert_eq!(i64::try_from_value(Value::Varchar(Some(" 42 ".into()))).unwrap(), 42);
        assert!(i64::try_from_value(Value::Varchar(Some("4x".into()))).is_err());
        assert!(i64::try_from_value(Value::Boolean(Some(true))).is_err());
    }

    #[test]
    fn value_floats() {
        assert_eq!(f64::try_from_value(Value::Float32(Some(1.5))).unwrap(), 1.5);
        assert_eq!(f32::try_from_value(Value::Int32(Some(3))).unwrap(), 3.0);
        assert_eq!(
            f64::try_from_value(Value::Decimal(Some(Decimal::new(25, 1)))).unwrap(),
            2.5
        );
        assert_eq!(f64::try_from_value("0.25".into()).unwrap(), 0.25);
        assert_eq!(f32::try_from_value(Value::Float64(Some(0.5))).unwrap(), 0.5);
        assert!(f32::try_from_value(Value::Float64(Some(1e300))).is_err());
        assert!(f32::try_from_value(Value::Float64(Some(f64::INFINITY))).unwrap().is_infinite());
        assert_eq!(f64::try_from_value(Value::Float64(Some(1e300))).unwrap(), 1e300);
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(None));
        assert!(bool::try_from_value(Value::Int8(Some(1))).unwrap());
        assert!(!bool::try_from_value(Value::UInt64(Some(0))).unwrap());
        assert!(bool::try_from_value("TRUE".into()).unwrap());
        assert!(!bool::try_from_value("f".into()).unwrap());
        assert!(bool::try_from_value("maybe".into()).is_err());
    }

    #[test]
    fn value_text_and_blob() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");
        assert!(String::try_from_value(Value::Int32(Some(1))).is_err());
        let val = vec![1u8, 2, 3].as_value();
        assert_eq!(val, Value::Blob(Some([1u8, 2, 3].into())));
        assert_eq!(Vec::<u8>::try_from_value(val).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn value_decimal() {
        let expected = Decimal::from_str("12.340").unwrap();
        assert_eq!(
            Decimal::try_from_value("12.340".into()).unwrap(),
            expected
        );
        assert_eq!(
            Decimal::try_from_value(Value::Int64(Some(12))).unwrap(),
            Decimal::from(12)
        );
    }

    #[test]
    fn value_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(Uuid::try_from_value(id.as_value()).unwrap(), id);
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(id.to_string()))).unwrap(),
            id
        );
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(format!("'{id}'")))).unwrap(),
            id
        );
        assert_eq!(
            Uuid::try_from_value(Value::Blob(Some(id.as_bytes().to_vec().into()))).unwrap(),
            id
        );
        assert!(Uuid::try_from_value("not a uuid".into()).is_err());
    }

    #[test]
    fn value_time() {
        let date = Date::from_calendar_date(2025, Month::March, 9).unwrap();
        let time = Time::from_hms(12, 30, 5).unwrap();
        assert_eq!(Date::try_from_value("2025-03-09".into()).unwrap(), date);
        assert_eq!(Time::try_from_value("12:30:05".into()).unwrap(), time);
        let timestamp = PrimitiveDateTime::new(date, time);
        assert_eq!(
            PrimitiveDateTime::try_from_value("2025-03-09 12:30:05".into()).unwrap(),
            timestamp
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value("2025-03-09T12:30:05".into()).unwrap(),
            timestamp
        );
        assert_eq!(
            OffsetDateTime::try_from_value(Value::Timestamp(Some(timestamp))).unwrap(),
            timestamp.assume_utc()
        );
        assert_eq!(
            OffsetDateTime::try_from_value("2025-03-09 12:30:05".into()).unwrap(),
            timestamp.assume_utc()
        );
        assert!(Date::try_from_value("2025-13-09".into()).is_err());
        assert_eq!(
            <Time as AsValue>::parse("12:30").unwrap(),
            Time::from_hms(12, 30, 0).unwrap()
        );
    }

    #[test]
    fn value_option() {
        assert_eq!(Option::<i32>::None.as_value(), Value::Int32(None));
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::try_from_value(Value::Int64(None)).unwrap(), None);
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int64(Some(5))).unwrap(),
            Some(5)
        );
        assert_eq!(Box::new(5u16).as_value(), Value::UInt16(Some(5)));
    }

    #[test]
    fn value_empty() {
        assert!(Value::Null.is_empty());
        assert!(Value::Int64(Some(0)).is_empty());
        assert!(Value::Float64(Some(0.0)).is_empty());
        assert!(Value::Varchar(Some(String::new())).is_empty());
        assert!(Value::Uuid(Some(Uuid::nil())).is_empty());
        assert!(Value::Uuid(None).is_empty());
        assert!(!Value::Uuid(Some(Uuid::new_v4())).is_empty());
        assert!(Value::Boolean(Some(false)).is_empty());
        assert!(!Value::Boolean(Some(true)).is_empty());
        assert!(!Value::Varchar(Some("x".into())).is_empty());
        assert!(!Value::Int8(Some(-1)).is_empty());
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Int32(None).to_string(), "NULL");
        assert_eq!(Value::Int32(Some(5)).to_string(), "5");
    }
}
