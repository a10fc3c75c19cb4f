//! Self-describing tagged property serialization.
//!
//! Every property record on disk is laid out as
//! `name, [pad byte], type tag, declared length (i32), array index (i32)`
//! followed by a kind-specific header and payload. A property list ends with
//! a record whose name is the literal `None`.

pub mod decode;
pub mod encode;
pub mod string;
pub mod structs;
pub mod text;

use crate::error::Result;
use crate::reader::ByteCursor;
use crate::types::{GUID_LEN, PROPERTY_TAG_SUFFIX, STRUCT_METADATA_LEN};

pub use decode::PropertyReader;
pub use encode::{write_none, write_property, write_property_list};
pub use string::{SaveString, StringEncoding, read_save_string, skip_save_string, write_save_string};
pub use structs::{InventoryItem, StructPayload, StructValue, Vector3};
pub use text::{FormatArgument, TextHistory, TextValue};

/// A (level, path) pair naming another object in the save.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    pub level_name: SaveString,
    pub path_name: SaveString,
}

impl ObjectReference {
    pub fn new(level_name: SaveString, path_name: SaveString) -> Self {
        Self {
            level_name,
            path_name,
        }
    }

    pub fn read(cur: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            level_name: read_save_string(cur)?,
            path_name: read_save_string(cur)?,
        })
    }

    pub fn skip(cur: &mut ByteCursor<'_>) -> Result<()> {
        skip_save_string(cur)?;
        skip_save_string(cur)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        write_save_string(out, &self.level_name);
        write_save_string(out, &self.path_name);
    }

    pub fn encoded_len(&self) -> usize {
        self.level_name.encoded_len() + self.path_name.encoded_len()
    }
}

pub fn write_references(out: &mut Vec<u8>, references: &[ObjectReference]) {
    for reference in references {
        reference.write(out);
    }
}

/// Closed set of property kinds, keyed by the type tag minus its
/// `Property` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool,
    Int8,
    Int,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Str,
    Name,
    Object,
    Interface,
    Enum,
    Byte,
    Text,
    Array,
    Struct,
}

impl PropertyKind {
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        let canonical = tag.strip_suffix(PROPERTY_TAG_SUFFIX).unwrap_or(tag);
        let kind = match canonical {
            b"Bool" => Self::Bool,
            b"Int8" => Self::Int8,
            b"Int" => Self::Int,
            b"UInt32" => Self::UInt32,
            b"Int64" => Self::Int64,
            b"UInt64" => Self::UInt64,
            b"Float" => Self::Float,
            b"Double" => Self::Double,
            b"Str" => Self::Str,
            b"Name" => Self::Name,
            b"Object" => Self::Object,
            b"Interface" => Self::Interface,
            b"Enum" => Self::Enum,
            b"Byte" => Self::Byte,
            b"Text" => Self::Text,
            b"Array" => Self::Array,
            b"Struct" => Self::Struct,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: SaveString,
    /// Type tag exactly as stored, e.g. `IntProperty`.
    pub type_tag: SaveString,
    pub pad_byte: bool,
    pub array_index: i32,
    pub property_guid: Option<[u8; GUID_LEN]>,
    pub value: PropertyValue,
}

impl Property {
    /// Readable text for string-like values.
    pub fn display_string(&self) -> Option<&SaveString> {
        match &self.value {
            PropertyValue::Str(s) | PropertyValue::Name(s) => Some(s),
            PropertyValue::Text(text) => text.display_string(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(u8),
    Int8(i8),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Str(SaveString),
    Name(SaveString),
    Object(ObjectReference),
    Interface(ObjectReference),
    Enum {
        enum_type_name: SaveString,
        value_name: SaveString,
    },
    Byte {
        enum_type_name: SaveString,
        value: ByteValue,
    },
    Text(TextValue),
    Array(ArrayValue),
    Struct(StructValue),
}

/// A byte property is a raw byte when its enum type is `None`, otherwise an
/// enumerator name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteValue {
    Raw(u8),
    Named(SaveString),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayValue {
    pub element_type: SaveString,
    pub flag: u8,
    pub elements: Vec<ObjectReference>,
}

pub type StructMetadata = [u8; STRUCT_METADATA_LEN];

pub fn find_property<'p>(properties: &'p [Property], name: &str) -> Option<&'p Property> {
    properties.iter().find(|p| p.name.is(name))
}

pub fn find_property_mut<'p>(
    properties: &'p mut [Property],
    name: &str,
) -> Option<&'p mut Property> {
    properties.iter_mut().find(|p| p.name.is(name))
}

#[cfg(test)]
mod tests {
    use super::{ObjectReference, PropertyKind, SaveString};
    use crate::reader::ByteCursor;

    #[test]
    fn tags_are_matched_with_and_without_suffix() {
        assert_eq!(PropertyKind::from_tag(b"IntProperty"), Some(PropertyKind::Int));
        assert_eq!(PropertyKind::from_tag(b"Int"), Some(PropertyKind::Int));
        assert_eq!(
            PropertyKind::from_tag(b"ArrayProperty"),
            Some(PropertyKind::Array)
        );
        assert_eq!(PropertyKind::from_tag(b"SetProperty"), None);
        assert_eq!(PropertyKind::from_tag(b"MapProperty"), None);
    }

    #[test]
    fn reference_roundtrip_and_skip() {
        let reference = ObjectReference::new(
            SaveString::utf8("Persistent_Level"),
            SaveString::utf8("Persistent_Level:PersistentLevel.BP_Train_C_1"),
        );
        let mut out = Vec::new();
        reference.write(&mut out);
        assert_eq!(out.len(), reference.encoded_len());

        let mut cur = ByteCursor::new(&out);
        assert_eq!(ObjectReference::read(&mut cur).expect("read"), reference);
        let mut cur = ByteCursor::new(&out);
        ObjectReference::skip(&mut cur).expect("skip");
        assert!(cur.is_exhausted());
    }
}
