//! Conversion table between primitive kinds.
//!
//! Invokers route every argument whose runtime type differs from the declared parameter
//! type through [`convert`]. The table covers booleans, characters, all integral widths
//! (range checked, never wrapping), floating point, strings and date-times.
//!
//! Enumeration values convert like their numeric value. Converting *to* an enumeration
//! is handled by [`convert_enum`], which additionally accepts literal names.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{
    metadata::typesystem::{PrimitiveKind, TypeFlavor, TypeRc, Value},
    Result,
};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Convert `value` to the primitive `target` kind.
///
/// Values that already have the target kind are returned unchanged.
///
/// ## Arguments
/// * `value` - The value to convert, must not be null
/// * `target` - A kind for which [`PrimitiveKind::is_convertible`] holds
///
/// # Errors
/// Returns [`crate::Error::Conversion`] if the value has no representation in the target
/// kind: out of range integers, unparseable strings, or unsupported source kinds.
pub fn convert(value: &Value, target: PrimitiveKind) -> Result<Value> {
    if value.kind() == Some(target) {
        return Ok(value.clone());
    }

    match target {
        PrimitiveKind::Boolean => to_bool(value).map(Value::Boolean),
        PrimitiveKind::Char => to_char(value).map(Value::Char),
        PrimitiveKind::String => Ok(Value::string(value.to_string())),
        PrimitiveKind::DateTime => to_datetime(value).map(Value::DateTime),
        PrimitiveKind::R4 => to_f64(value).map(|v| Value::R4(v as f32)),
        PrimitiveKind::R8 => to_f64(value).map(Value::R8),
        kind if kind.is_integral() => integral_from_i128(to_i128(value)?, kind),
        other => Err(conversion_error!(
            "{} is not a conversion target",
            other.full_name()
        )),
    }
}

/// Convert `value` to the enumeration type `ty`.
///
/// Accepts values of the same enumeration, numeric values of any kind that fit the
/// underlying type, numeric strings and literal names (case-insensitive).
///
/// # Errors
/// Returns [`crate::Error::Conversion`] if `ty` is not an enumeration or the value does
/// not name or fit one of its values.
pub fn convert_enum(value: &Value, ty: &TypeRc) -> Result<Value> {
    let TypeFlavor::Enum { underlying } = ty.flavor else {
        return Err(conversion_error!("{} is not an enumeration", ty.fullname()));
    };

    if let Value::Enum { ty: source, value } = value {
        if source.token == ty.token {
            return Ok(Value::Enum {
                ty: ty.clone(),
                value: *value,
            });
        }
    }

    if let Value::String(text) = value {
        let text = text.trim();
        if text.parse::<i128>().is_err() {
            return match ty.literal_value(text) {
                Some(literal) => Ok(Value::Enum {
                    ty: ty.clone(),
                    value: literal,
                }),
                None => Err(conversion_error!(
                    "'{}' is not a member of {}",
                    text,
                    ty.fullname()
                )),
            };
        }
    }

    let numeric = convert(value, underlying)?;
    let Some(raw) = numeric.as_i128() else {
        return Err(conversion_error!("{} has no numeric value", value));
    };

    // U8 literals above i64::MAX keep their bit pattern
    let value = i64::try_from(raw).unwrap_or(raw as i64);
    Ok(Value::Enum {
        ty: ty.clone(),
        value,
    })
}

fn to_i128(value: &Value) -> Result<i128> {
    if let Some(v) = value.as_i128() {
        return Ok(v);
    }

    match value {
        Value::Boolean(b) => Ok(i128::from(*b)),
        Value::Char(c) => Ok(i128::from(u32::from(*c))),
        Value::R4(v) => float_to_i128(f64::from(*v)),
        Value::R8(v) => float_to_i128(*v),
        Value::String(s) => {
            let text = s.trim();
            match text.parse::<i128>() {
                Ok(v) => Ok(v),
                Err(_) => Err(conversion_error!("'{}' is not an integer", text)),
            }
        }
        other => Err(conversion_error!("cannot convert {:?} to an integer", other)),
    }
}

fn float_to_i128(value: f64) -> Result<i128> {
    if !value.is_finite() {
        return Err(conversion_error!("{} has no integral representation", value));
    }

    let truncated = value.trunc();
    if truncated < i128::MIN as f64 || truncated > i128::MAX as f64 {
        return Err(conversion_error!("{} is out of range", value));
    }
    Ok(truncated as i128)
}

fn integral_from_i128(value: i128, kind: PrimitiveKind) -> Result<Value> {
    let out_of_range = || conversion_error!("{} is out of range for {}", value, kind.full_name());

    Ok(match kind {
        PrimitiveKind::I1 => Value::I1(i8::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::U1 => Value::U1(u8::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::I2 => Value::I2(i16::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::U2 => Value::U2(u16::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::I4 => Value::I4(i32::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::U4 => Value::U4(u32::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::I8 => Value::I8(i64::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::U8 => Value::U8(u64::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::I => Value::I(isize::try_from(value).map_err(|_| out_of_range())?),
        PrimitiveKind::U => Value::U(usize::try_from(value).map_err(|_| out_of_range())?),
        other => {
            return Err(conversion_error!(
                "{} is not an integral type",
                other.full_name()
            ))
        }
    })
}

fn to_f64(value: &Value) -> Result<f64> {
    if let Some(v) = value.as_f64() {
        return Ok(v);
    }

    match value {
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| conversion_error!("'{}' is not a number", s)),
        other => Err(conversion_error!("cannot convert {:?} to a number", other)),
    }
}

fn to_bool(value: &Value) -> Result<bool> {
    match value {
        Value::String(s) => {
            let text = s.trim();
            if text.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if text.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(conversion_error!("'{}' is not a boolean", text))
            }
        }
        Value::R4(_) | Value::R8(_) => Ok(to_f64(value)? != 0.0),
        other => match other.as_i128() {
            Some(v) => Ok(v != 0),
            None => Err(conversion_error!("cannot convert {:?} to a boolean", other)),
        },
    }
}

fn to_char(value: &Value) -> Result<char> {
    match value {
        Value::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(conversion_error!("'{}' is not a single character", s)),
            }
        }
        other => {
            let code = other
                .as_i128()
                .ok_or_else(|| conversion_error!("cannot convert {:?} to a character", other))?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| conversion_error!("{} is not a valid character", code))
        }
    }
}

fn to_datetime(value: &Value) -> Result<NaiveDateTime> {
    match value {
        Value::String(s) => parse_datetime(s.trim()),
        // Integral values are unix seconds
        other => {
            let seconds = other
                .as_i64()
                .ok_or_else(|| conversion_error!("cannot convert {:?} to a date", other))?;
            DateTime::from_timestamp(seconds, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| conversion_error!("{} is out of the date range", seconds))
        }
    }
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| conversion_error!("'{}' is not a date", text))
}
