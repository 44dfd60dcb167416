//! Wire codec for [`Descriptor`].
//!
//! The document is a flat JSON object, one key per descriptor field. [`FIELDS`]
//! is the single schema table: the reader validates and coerces every entry
//! before handing the normalised object to serde, and a test pins the derived
//! `Serialize` output to the same key set so the two directions cannot drift.

use super::{Descriptor, TarType, METADATA_VERSION};
use crate::utils::errors::{DescriptorError, Result};
use serde_json::{Map, Value};

/// Wire type of a descriptor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
    Boolean,
    /// 64-bit signed integer
    Long,
    /// 32-bit signed integer
    Int,
    /// 32-bit unsigned integer (bitsets)
    Bits,
    TarType,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::TextList => "array of strings",
            FieldKind::Boolean => "boolean",
            FieldKind::Long => "64-bit integer",
            FieldKind::Int => "32-bit integer",
            FieldKind::Bits => "unsigned 32-bit integer",
            FieldKind::TarType => "archive type (\"t\" or \"z\")",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

/// Every wire field, in document order.
pub const FIELDS: &[FieldSpec] = &[
    field("label", FieldKind::Text),
    field("package_name", FieldKind::Text),
    field("version_name", FieldKind::Text),
    field("version_code", FieldKind::Long),
    field("data_dirs", FieldKind::TextList),
    field("is_system", FieldKind::Boolean),
    field("is_split_apk", FieldKind::Boolean),
    field("split_configs", FieldKind::TextList),
    field("split_names", FieldKind::TextList),
    field("has_rules", FieldKind::Boolean),
    field("backup_time", FieldKind::Long),
    field("cert_sha256_checksum", FieldKind::TextList),
    field("source_sha256_checksum", FieldKind::Text),
    field("data_sha256_checksum", FieldKind::TextList),
    field("mode", FieldKind::Int),
    field("version", FieldKind::Int),
    field("apk_name", FieldKind::Text),
    field("instruction_set", FieldKind::Text),
    field("flags", FieldKind::Bits),
    field("user_handle", FieldKind::Int),
    field("tar_type", FieldKind::TarType),
    field("key_store", FieldKind::Boolean),
];

/// Serialize a descriptor to its wire document.
pub fn to_bytes(descriptor: &Descriptor) -> Result<Vec<u8>> {
    descriptor
        .check_invariants()
        .map_err(DescriptorError::InvariantViolation)?;
    Ok(serde_json::to_vec(descriptor)?)
}

/// Parse a wire document.
///
/// All fields of [`FIELDS`] must be present with a usable type; the first one
/// that is not aborts the parse. Keys not in the table are ignored.
pub fn from_bytes(bytes: &[u8]) -> Result<Descriptor> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DescriptorError::EmptyInput);
    }

    let root = match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(root) => root,
        _ => {
            return Err(DescriptorError::Malformed(serde::de::Error::custom(
                "descriptor document is not an object",
            )))
        }
    };

    let mut normalized = Map::with_capacity(FIELDS.len());
    for spec in FIELDS {
        let value = match root.get(spec.name) {
            Some(Value::Null) | None if spec.required => {
                return Err(DescriptorError::MissingField(spec.name))
            }
            Some(Value::Null) | None => continue,
            Some(value) => value,
        };
        let coerced = coerce(spec.kind, value).ok_or(DescriptorError::InvalidField {
            field: spec.name,
            expected: spec.kind.expected(),
        })?;
        normalized.insert(spec.name.to_string(), coerced);
    }

    let version = normalized.get("version").and_then(Value::as_i64).unwrap_or(0);
    if version < 1 || version > i64::from(METADATA_VERSION) {
        return Err(DescriptorError::UnsupportedVersion(version));
    }

    let descriptor: Descriptor = serde_json::from_value(Value::Object(normalized))?;
    descriptor
        .check_invariants()
        .map_err(DescriptorError::Inconsistent)?;

    Ok(descriptor)
}

fn coerce(kind: FieldKind, value: &Value) -> Option<Value> {
    match kind {
        FieldKind::Text => value.as_str().map(Value::from),
        FieldKind::TextList => {
            let items = value.as_array()?;
            items
                .iter()
                .map(|item| item.as_str().map(Value::from))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
            _ => None,
        },
        FieldKind::Long => coerce_integer(value).map(Value::from),
        FieldKind::Int => coerce_integer(value)
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::from),
        FieldKind::Bits => coerce_integer(value)
            .and_then(|v| u32::try_from(v).ok())
            .map(Value::from),
        FieldKind::TarType => value
            .as_str()
            .and_then(TarType::parse)
            .map(|tar| Value::from(tar.as_str())),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
