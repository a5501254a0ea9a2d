use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::{any, str::FromStr};
use time::{PrimitiveDateTime, format_description::parse_borrowed};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is the conversion every mapped column goes through: reading a field
/// produces a `Value` with [`AsValue::as_value`], and writing a scanned column
/// or an assigned identifier back into a field uses [`AsValue::try_from_value`].
///
/// # Implementing `AsValue` for custom types
/// A newtype around a supported type usually forwards to it:
///
/// ```rust
/// use stow_core::{AsValue, Result, Value};
/// struct Code(String);
/// impl AsValue for Code {
///     fn as_empty_value() -> Value {
///         String::as_empty_value()
///     }
///     fn as_value(self) -> Value {
///         self.0.as_value()
///     }
///     fn try_from_value(value: Value) -> Result<Self> {
///         String::try_from_value(value).map(Code)
///     }
/// }
/// ```
///
/// # Error semantics
/// - Numeric conversions accept any integer width and check the range before
///   narrowing. The error names both the offending value and the target type.
/// - `Value::Varchar` is parsed for numbers, booleans, decimals, UUIDs and
///   temporal types.
pub trait AsValue {
    /// Typed NULL for this type.
    fn as_empty_value() -> Value;
    /// Convert this value into its owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse a textual representation, the whole input must be consumed.
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input.as_ref()),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn parse_with<T: FromStr>(input: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    input.trim().parse::<T>().with_context(|| {
        format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<T>()
        )
    })
}

macro_rules! impl_as_value {
    ($($source:ty => $destination:path),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_empty_value() -> Value {
                    $destination(None)
                }
                fn as_value(self) -> Value {
                    $destination(Some(self))
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let converted = match &value {
                        Value::Int8(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::Int16(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::Int32(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::Int64(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::UInt8(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::UInt16(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::UInt32(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::UInt64(Some(v)) => <$source>::try_from(*v).ok(),
                        Value::Decimal(Some(v)) => {
                            if !v.is_integer() {
                                return Err(Error::msg(format!(
                                    "Value {v}: Decimal is not an integer, cannot convert to {}",
                                    any::type_name::<Self>(),
                                )));
                            }
                            v.to_i128().and_then(|v| <$source>::try_from(v).ok())
                        }
                        Value::Varchar(Some(v)) => return <Self as AsValue>::parse(v),
                        _ => return Err(cannot_convert::<Self>(&value)),
                    };
                    converted.ok_or_else(|| {
                        Error::msg(format!(
                            "Value {value} is out of range for {}",
                            any::type_name::<Self>(),
                        ))
                    })
                }
                fn parse(input: impl AsRef<str>) -> Result<Self> {
                    parse_with(input.as_ref())
                }
            }
        )+
    };
}
impl_as_value!(
    i8 => Value::Int8,
    i16 => Value::Int16,
    i32 => Value::Int32,
    i64 => Value::Int64,
    u8 => Value::UInt8,
    u16 => Value::UInt16,
    u32 => Value::UInt32,
    u64 => Value::UInt64,
);

macro_rules! impl_as_value {
    ($($source:ty => $destination:path),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_empty_value() -> Value {
                    $destination(None)
                }
                fn as_value(self) -> Value {
                    $destination(Some(self))
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let wide = match &value {
                        Value::Float32(Some(v)) => *v as f64,
                        Value::Float64(Some(v)) => *v,
                        Value::Int8(Some(v)) => *v as f64,
                        Value::Int16(Some(v)) => *v as f64,
                        Value::Int32(Some(v)) => *v as f64,
                        Value::Int64(Some(v)) => *v as f64,
                        Value::UInt8(Some(v)) => *v as f64,
                        Value::UInt16(Some(v)) => *v as f64,
                        Value::UInt32(Some(v)) => *v as f64,
                        Value::UInt64(Some(v)) => *v as f64,
                        Value::Decimal(Some(v)) => v
                            .to_f64()
                            .ok_or_else(|| cannot_convert::<Self>(&value))?,
                        Value::Varchar(Some(v)) => return <Self as AsValue>::parse(v),
                        _ => return Err(cannot_convert::<Self>(&value)),
                    };
                    let narrowed = wide as $source;
                    if wide.is_finite() && narrowed.is_infinite() {
                        return Err(Error::msg(format!(
                            "Value {value} is out of range for {}",
                            any::type_name::<Self>(),
                        )));
                    }
                    Ok(narrowed)
                }
                fn parse(input: impl AsRef<str>) -> Result<Self> {
                    parse_with(input.as_ref())
                }
            }
        )+
    };
}
impl_as_value!(f32 => Value::Float32, f64 => Value::Float64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt8(Some(v)) => Ok(v != 0),
            Value::UInt16(Some(v)) => Ok(v != 0),
            Value::UInt32(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        match input.as_ref().trim() {
            x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x == "1" => {
                Ok(true)
            }
            x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x == "0" => {
                Ok(false)
            }
            x => Err(Error::msg(format!("Cannot parse boolean from `{x}`"))),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        Ok(input.as_ref().to_owned())
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
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
        <Box<[u8]> as AsValue>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v.into()),
            Value::Int16(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::UInt8(Some(v)) => Ok(v.into()),
            Value::UInt16(Some(v)) => Ok(v.into()),
            Value::UInt32(Some(v)) => Ok(v.into()),
            Value::UInt64(Some(v)) => Ok(v.into()),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        parse_with(input.as_ref())
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).with_context(|| cannot_convert::<Self>(&value))
            }
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        parse_with(input.as_ref().trim_matches(['\'', '"']))
    }
}

macro_rules! parse_time {
    ($value:expr, $($formats:literal),+ $(,)?) => {
        'value: {
            let input: &str = $value.trim();
            for format in [$($formats,)+] {
                let format = parse_borrowed::<2>(format)?;
                let mut parsed = time::parsing::Parsed::new();
                if let Ok(remaining) = parsed.parse_items(input.as_bytes(), &format) {
                    if remaining.is_empty() {
                        break 'value Ok(parsed.try_into()?);
                    }
                }
            }
            Err(Error::msg(format!(
                "Cannot parse `{}` as {}",
                truncate_long!(input),
                any::type_name::<Self>()
            )))
        }
    };
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path, $parse:expr $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
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
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                $parse(input.as_ref())
            }
        }
    };
}
impl_as_value!(time::Date, Value::Date, |v: &str| -> Result<Self> {
    parse_time!(v, "[year]-[month]-[day]")
});
impl_as_value!(time::Time, Value::Time, |v: &str| -> Result<Self> {
    parse_time!(
        v,
        "[hour]:[minute]:[second].[subsecond]",
        "[hour]:[minute]:[second]",
        "[hour]:[minute]",
    )
});
impl_as_value!(
    time::PrimitiveDateTime,
    Value::Timestamp,
    |v: &str| -> Result<Self> {
        parse_time!(
            v,
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day]T[hour]:[minute]:[second]",
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day] [hour]:[minute]:[second]",
        )
    },
    Value::TimestampWithTimezone(Some(v)) => Ok(PrimitiveDateTime::new(v.date(), v.time())),
);
impl_as_value!(
    time::OffsetDateTime,
    Value::TimestampWithTimezone,
    |v: &str| -> Result<Self> {
        parse_time!(
            v,
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
        )
        .or_else(|_: Error| <PrimitiveDateTime as AsValue>::parse(v).map(|v| v.assume_utc()))
    },
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);

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
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        T::parse(input).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        T::parse(input).map(Box::new)
    }
}
