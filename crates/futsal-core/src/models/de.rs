//! Lenient field deserializers for server records.
//!
//! Records are edited by hand through the admin forms, so a field may come
//! back as `null`, a number where text was expected, or a count typed as
//! `"3"` or `3.0`. One odd field must not make a whole collection unreadable.

use std::fmt;

use serde::de::{Deserializer, Visitor};

use super::Group;

/// Text field: `null` becomes empty, numbers are rendered as text.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or null")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// Any JSON number, numeric string or `null` as an `i64`.
///
/// Floats are rounded; unparsable strings and `null` count as zero.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, numeric string or null")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            // `as` saturates and maps NaN to 0
            Ok(v.round() as i64)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            Ok(v.parse::<i64>()
                .ok()
                .or_else(|| v.parse::<f64>().ok().map(|f| f.round() as i64))
                .unwrap_or_default())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(0)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

/// Non-negative count (played, won, ...). Negative values clamp to zero.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = whole_number(deserializer)?;
    Ok(u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

/// Signed value (points, goal difference).
pub(crate) fn signed<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = whole_number(deserializer)?;
    Ok(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Group tag; blank, unknown or `null` fall back to the default group.
pub(crate) fn group<'de, D>(deserializer: D) -> Result<Group, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = text(deserializer)?;
    Ok(raw.parse().unwrap_or_default())
}
