//! Generic native values and the conversions between them and [`Tag`] trees.

use crate::{Compound, Tag};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// A tag tree with the wire-level details dropped: arrays become lists and
/// booleans are first class.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    List(Vec<Value>),
    Compound(Vec<(String, Value)>),
}

/// Returned when an End tag shows up where a value was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndTagError;

impl fmt::Display for EndTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "End tag has no value")
    }
}

impl std::error::Error for EndTagError {}

impl TryFrom<&Tag> for Value {
    type Error = EndTagError;

    fn try_from(tag: &Tag) -> Result<Self, Self::Error> {
        Ok(match tag {
            Tag::End => return Err(EndTagError),
            Tag::Byte(v) => Value::Byte(*v),
            Tag::Short(v) => Value::Short(*v),
            Tag::Int(v) => Value::Int(*v),
            Tag::Long(v) => Value::Long(*v),
            Tag::Float(v) => Value::Float(*v),
            Tag::Double(v) => Value::Double(*v),
            Tag::String(v) => Value::String(v.clone()),
            Tag::ByteArray(v) => Value::List(v.iter().copied().map(Value::Byte).collect()),
            Tag::IntArray(v) => Value::List(v.iter().copied().map(Value::Int).collect()),
            Tag::LongArray(v) => Value::List(v.iter().copied().map(Value::Long).collect()),
            Tag::List(_, items) => Value::List(
                items
                    .iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Tag::Compound(compound) => Value::Compound(
                compound
                    .iter()
                    .map(|(name, tag)| Ok((name.to_string(), Value::try_from(tag)?)))
                    .collect::<Result<Vec<_>, EndTagError>>()?,
            ),
        })
    }
}

impl From<Value> for Tag {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(v) => Tag::Byte(v as i8),
            Value::Byte(v) => Tag::Byte(v),
            Value::Short(v) => Tag::Short(v),
            Value::Int(v) => Tag::Int(v),
            Value::Long(v) => Tag::Long(v),
            Value::Float(v) => Tag::Float(v),
            Value::Double(v) => Tag::Double(v),
            Value::String(v) => Tag::String(v),
            Value::List(items) => Tag::list(items.into_iter().map(Tag::from).collect()),
            Value::Compound(entries) => Tag::Compound(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, Tag::from(value)))
                    .collect::<Compound>(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Byte(v) => serializer.serialize_i8(*v),
            Value::Short(v) => serializer.serialize_i16(*v),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Compound(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, value) in entries {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}
