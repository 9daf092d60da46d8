//! # Form Binding
//!
//! Decodes submitted form values (a string-keyed multi-map) into typed
//! records.
//!
//! A record describes itself once with a static table of [`FieldSpec`]s:
//! the field name, the kind of value it holds, an optional alternate form
//! key and whether it collects every submitted value. [`decode`] walks that
//! table against the form and hands each converted [`FieldValue`] back to the
//! record through [`FormRecord::assign`].
//!
//! ## Rules
//!
//! - Form keys no field asks for are ignored.
//! - A field whose key was not submitted keeps its `Default` value.
//! - An empty string decodes to the kind's zero value.
//! - Integer text that does not parse, or does not fit the field's width,
//!   is a [`BindError`]; the handler decides what to answer.
//! - Booleans are `false` for `""`, `"false"` and `"0"`, `true` otherwise.
//! - Single-valued fields take the first submitted value; repeated fields
//!   take all of them, in order.
//! - Nested records read the same flat form. A record fills its sub-records
//!   in [`FormRecord::decode_nested`], usually by calling [`decode`] again.
//!
//! ## Example
//!
//! ```
//! use xia::binding::{decode, FieldKind, FieldSpec, FieldValue, FormRecord, FormValues};
//!
//! #[derive(Default)]
//! struct Signup {
//!     name: String,
//!     age: u8,
//!     tags: Vec<String>,
//! }
//!
//! impl FormRecord for Signup {
//!     const FIELDS: &'static [FieldSpec] = &[
//!         FieldSpec::new("name", FieldKind::Str).form("username"),
//!         FieldSpec::new("age", FieldKind::U8),
//!         FieldSpec::new("tags", FieldKind::Str).repeated(),
//!     ];
//!
//!     fn assign(&mut self, field: &str, value: FieldValue) {
//!         match field {
//!             "name" => self.name = value.into_string(),
//!             "age" => self.age = value.as_u64() as u8,
//!             "tags" => self.tags = value.into_list().into_iter().map(FieldValue::into_string).collect(),
//!             _ => {}
//!         }
//!     }
//! }
//!
//! let mut form = FormValues::new();
//! form.insert("username".into(), vec!["xia".into()]);
//! form.insert("age".into(), vec!["18".into()]);
//! form.insert("tags".into(), vec!["a".into(), "b".into()]);
//!
//! let signup: Signup = decode(&form).unwrap();
//! assert_eq!(signup.name, "xia");
//! assert_eq!(signup.age, 18);
//! assert_eq!(signup.tags, vec!["a", "b"]);
//! ```

use std::collections::HashMap;
use std::fmt;

/// Submitted form or query values, every key with all of its values.
pub type FormValues = HashMap<String, Vec<String>>;

/// Value kinds a form field can decode into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl FieldKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Bool => "bool",
            FieldKind::I8 => "int8",
            FieldKind::I16 => "int16",
            FieldKind::I32 => "int32",
            FieldKind::I64 => "int64",
            FieldKind::U8 => "uint8",
            FieldKind::U16 => "uint16",
            FieldKind::U32 => "uint32",
            FieldKind::U64 => "uint64",
            FieldKind::F32 => "float32",
            FieldKind::F64 => "float64",
        }
    }

    fn signed_range(self) -> Option<(i64, i64)> {
        match self {
            FieldKind::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            FieldKind::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            FieldKind::I32 => Some((i32::MIN.into(), i32::MAX.into())),
            FieldKind::I64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    fn unsigned_max(self) -> Option<u64> {
        match self {
            FieldKind::U8 => Some(u8::MAX.into()),
            FieldKind::U16 => Some(u16::MAX.into()),
            FieldKind::U32 => Some(u32::MAX.into()),
            FieldKind::U64 => Some(u64::MAX),
            _ => None,
        }
    }

    /// Zero value produced for an empty submission.
    #[must_use]
    pub fn zero(self) -> FieldValue {
        match self {
            FieldKind::Str => FieldValue::Str(String::new()),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 => FieldValue::Int(0),
            FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64 => FieldValue::Uint(0),
            FieldKind::F32 | FieldKind::F64 => FieldValue::Float(0.0),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, passed back to [`FormRecord::assign`]
    pub name: &'static str,
    /// Alternate form key; the field name is used when absent
    pub form: Option<&'static str>,
    pub kind: FieldKind,
    /// Collect every submitted value instead of the first
    pub repeated: bool,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            form: None,
            kind,
            repeated: false,
        }
    }

    /// Read this field from form key `key` instead of its name.
    #[must_use]
    pub const fn form(mut self, key: &'static str) -> Self {
        self.form = Some(key);
        self
    }

    #[must_use]
    pub const fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Form key this field reads.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self.form {
            Some(key) if !key.is_empty() => key,
            _ => self.name,
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Owned string; non-string values are formatted.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            FieldValue::Str(s) => s,
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Uint(n) => n.to_string(),
            FieldValue::Float(n) => n.to_string(),
            FieldValue::List(items) => items
                .into_iter()
                .map(FieldValue::into_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> bool {
        matches!(self, FieldValue::Bool(true))
    }

    /// Signed view; out-of-range unsigned values saturate.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self {
            FieldValue::Int(n) => *n,
            FieldValue::Uint(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            _ => 0,
        }
    }

    /// Unsigned view; negative values become zero.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        match self {
            FieldValue::Uint(n) => *n,
            FieldValue::Int(n) => u64::try_from(*n).unwrap_or(0),
            _ => 0,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Float(n) => *n,
            _ => 0.0,
        }
    }

    /// Items of a repeated field; a single value becomes a one-item list.
    #[must_use]
    pub fn into_list(self) -> Vec<FieldValue> {
        match self {
            FieldValue::List(items) => items,
            other => vec![other],
        }
    }
}

/// A record that can be populated from form values.
pub trait FormRecord: Default {
    /// Field table, consulted once per decode.
    const FIELDS: &'static [FieldSpec];

    /// Store a decoded value into the field called `field`.
    fn assign(&mut self, field: &str, value: FieldValue);

    /// Fill embedded records from the same form, after the own fields.
    ///
    /// # Errors
    ///
    /// Propagates the first [`BindError`] of a sub-record.
    fn decode_nested(&mut self, _form: &FormValues) -> Result<(), BindError> {
        Ok(())
    }
}

/// Failure converting a submitted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The number parsed but does not fit the field's width
    Overflow {
        field: &'static str,
        kind: FieldKind,
        value: String,
    },
    /// The text is not a number of the field's kind
    Invalid {
        field: &'static str,
        kind: FieldKind,
        value: String,
        reason: String,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::Overflow { field, kind, value } => {
                write!(f, "field {field}: type [{kind}] value [{value}] overflow")
            }
            BindError::Invalid {
                field,
                kind,
                value,
                reason,
            } => write!(f, "field {field}: cannot parse [{value}] as {kind}: {reason}"),
        }
    }
}

impl std::error::Error for BindError {}

/// Convert one submitted string according to `spec.kind`.
///
/// # Errors
///
/// Returns [`BindError`] for unparseable or out-of-range numbers.
pub fn decode_value(spec: &FieldSpec, raw: &str) -> Result<FieldValue, BindError> {
    if raw.is_empty() {
        return Ok(spec.kind.zero());
    }

    let invalid = |reason: String| BindError::Invalid {
        field: spec.name,
        kind: spec.kind,
        value: raw.to_string(),
        reason,
    };
    let overflow = || BindError::Overflow {
        field: spec.name,
        kind: spec.kind,
        value: raw.to_string(),
    };

    match spec.kind {
        FieldKind::Str => Ok(FieldValue::Str(raw.to_string())),
        FieldKind::Bool => Ok(FieldValue::Bool(!matches!(raw, "false" | "0"))),
        FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 => {
            let n: i64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                if matches!(
                    e.kind(),
                    std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow
                ) {
                    overflow()
                } else {
                    invalid(e.to_string())
                }
            })?;
            let (min, max) = spec.kind.signed_range().unwrap_or((i64::MIN, i64::MAX));
            if n < min || n > max {
                return Err(overflow());
            }
            Ok(FieldValue::Int(n))
        }
        FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64 => {
            let n: u64 = raw.parse().map_err(|e: std::num::ParseIntError| {
                if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) {
                    overflow()
                } else {
                    invalid(e.to_string())
                }
            })?;
            if n > spec.kind.unsigned_max().unwrap_or(u64::MAX) {
                return Err(overflow());
            }
            Ok(FieldValue::Uint(n))
        }
        FieldKind::F32 | FieldKind::F64 => {
            let n: f64 = raw
                .parse()
                .map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
            if spec.kind == FieldKind::F32 && n.is_finite() && n.abs() > f64::from(f32::MAX) {
                return Err(overflow());
            }
            Ok(FieldValue::Float(n))
        }
    }
}

/// Populate a `T` from `form` using its field table.
///
/// # Errors
///
/// Stops at the first field that fails to convert and returns its
/// [`BindError`].
pub fn decode<T: FormRecord>(form: &FormValues) -> Result<T, BindError> {
    let mut record = T::default();
    for spec in T::FIELDS {
        let Some(values) = form.get(spec.key()) else {
            continue;
        };
        if spec.repeated {
            let items = values
                .iter()
                .map(|v| decode_value(spec, v))
                .collect::<Result<Vec<_>, _>>()?;
            record.assign(spec.name, FieldValue::List(items));
        } else if let Some(first) = values.first() {
            record.assign(spec.name, decode_value(spec, first)?);
        }
    }
    record.decode_nested(form)?;
    Ok(record)
}

/// Flatten to the first value of every key.
#[must_use]
pub fn first_values(form: &FormValues) -> HashMap<String, String> {
    form.iter()
        .filter_map(|(k, v)| v.first().map(|first| (k.clone(), first.clone())))
        .collect()
}
