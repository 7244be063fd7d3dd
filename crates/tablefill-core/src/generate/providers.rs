use std::borrow::Cow;

use chrono::DateTime;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;

use crate::generate::value::Value;
use crate::schema::types::DeclaredType;


/// Earliest generated timestamp (1970-01-01T00:00:00Z).
const TIMESTAMP_MIN_SECS: i64 = 0;
/// Latest generated timestamp (2099-12-31T23:59:59Z).
const TIMESTAMP_MAX_SECS: i64 = 4_102_444_799;

/// Wrap a dynamically generated String into a Value::String.
#[inline]
fn owned(s: String) -> Value {
    Value::String(Cow::Owned(s))
}

/// Generate a value for a primitive column.
///
/// Text columns are generated by column name, every other type by its
/// declared type alone. Returns `None` for named types (enums are resolved
/// before this is called, anything else is unsupported).
pub fn generate_primitive(
    declared_type: &DeclaredType,
    column_name: &str,
    rng: &mut impl Rng,
) -> Option<Value> {
    let value = match declared_type {
        DeclaredType::BigInt => Value::Int(rng.random::<i64>()),
        DeclaredType::Integer => Value::Int(rng.random_range(0..100)),
        DeclaredType::Text => generate_text(column_name, rng),
        DeclaredType::Timestamp => generate_timestamp(rng),
        DeclaredType::Boolean => Value::Bool(rng.random_bool(0.5)),
        DeclaredType::Float => Value::Float(rng.random::<f64>()),
        DeclaredType::Json => Value::Json(json_placeholder()),
        DeclaredType::Named(_) => return None,
    };
    Some(value)
}

/// Text keyed by well-known column names; a sentence for anything else.
fn generate_text(column_name: &str, rng: &mut impl Rng) -> Value {
    match column_name {
        "first_name" => owned(FirstName().fake_with_rng(rng)),
        "last_name" => owned(LastName().fake_with_rng(rng)),
        "email" => owned(SafeEmail().fake_with_rng(rng)),
        "name" => owned(Word().fake_with_rng(rng)),
        "phone_number" => owned(e164_phone_number(rng)),
        _ => owned(Sentence(4..10).fake_with_rng(rng)),
    }
}

/// Object written to every JSON column.
pub fn json_placeholder() -> serde_json::Value {
    serde_json::json!({ "key": "value" })
}

/// A North American number in E.164 form, e.g. `+14155552671`.
fn e164_phone_number(rng: &mut impl Rng) -> String {
    let area: u16 = rng.random_range(200..1000);
    let exchange: u16 = rng.random_range(200..1000);
    let line: u16 = rng.random_range(0..10_000);
    format!("+1{:03}{:03}{:04}", area, exchange, line)
}

fn generate_timestamp(rng: &mut impl Rng) -> Value {
    let secs = rng.random_range(TIMESTAMP_MIN_SECS..=TIMESTAMP_MAX_SECS);
    let ts = DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default();
    Value::Timestamp(ts)
}
