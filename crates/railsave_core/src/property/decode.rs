use crate::error::{Result, SaveError, SaveErrorCode};
use crate::locator::ArrayLocator;
use crate::reader::ByteCursor;
use crate::types::{GUID_LEN, NONE_NAME};

use super::string::{SaveString, read_save_string};
use super::text::read_text;
use super::{
    ArrayValue, ByteValue, ObjectReference, Property, PropertyKind, PropertyValue, StructValue,
};

/// Recursive-descent property decoder over the decoded body. Arrays of
/// interest report their element spans to the attached locator.
pub struct PropertyReader<'a> {
    cur: ByteCursor<'a>,
    locator: ArrayLocator,
}

impl<'a> PropertyReader<'a> {
    pub fn new(data: &'a [u8], locator: ArrayLocator) -> Self {
        Self {
            cur: ByteCursor::new(data),
            locator,
        }
    }

    pub fn cursor(&mut self) -> &mut ByteCursor<'a> {
        &mut self.cur
    }

    pub fn position(&self) -> usize {
        self.cur.position()
    }

    pub fn locator(&self) -> &ArrayLocator {
        &self.locator
    }

    pub fn into_locator(self) -> ArrayLocator {
        self.locator
    }

    /// Reads properties up to and including the `None` terminator.
    pub fn read_property_list(&mut self) -> Result<Vec<Property>> {
        let mut properties = Vec::new();
        while let Some(property) = self.read_property()? {
            properties.push(property);
        }
        Ok(properties)
    }

    /// Returns `None` once the `None` terminator has been consumed.
    pub fn read_property(&mut self) -> Result<Option<Property>> {
        let name = read_save_string(&mut self.cur)?;
        if name.is(NONE_NAME) {
            return Ok(None);
        }

        let pad_byte = self.cur.peek_u8()? == 0;
        if pad_byte {
            self.cur.skip(1)?;
        }

        let tag_pos = self.cur.position();
        let type_tag = read_save_string(&mut self.cur)?;
        let _declared_len = self.cur.read_i32()?;
        let array_index = self.cur.read_i32()?;

        let kind = PropertyKind::from_tag(type_tag.as_bytes()).ok_or_else(|| {
            SaveError::new(
                SaveErrorCode::UnknownPropertyType,
                format!("property {name} has unknown type {type_tag} at pos={tag_pos}"),
            )
        })?;

        let mut property_guid = None;
        let value = match kind {
            PropertyKind::Bool => {
                let value = self.cur.read_u8()?;
                property_guid = self.read_guid_section()?;
                PropertyValue::Bool(value)
            }
            PropertyKind::Enum => {
                let enum_type_name = read_save_string(&mut self.cur)?;
                property_guid = self.read_guid_section()?;
                PropertyValue::Enum {
                    enum_type_name,
                    value_name: read_save_string(&mut self.cur)?,
                }
            }
            PropertyKind::Byte => {
                let enum_type_name = read_save_string(&mut self.cur)?;
                property_guid = self.read_guid_section()?;
                let value = if enum_type_name.is(NONE_NAME) {
                    ByteValue::Raw(self.cur.read_u8()?)
                } else {
                    ByteValue::Named(read_save_string(&mut self.cur)?)
                };
                PropertyValue::Byte {
                    enum_type_name,
                    value,
                }
            }
            PropertyKind::Array => PropertyValue::Array(self.read_array(&name)?),
            PropertyKind::Struct => {
                let struct_type = read_save_string(&mut self.cur)?;
                let metadata = self.cur.read_array()?;
                let payload = self.read_struct_payload(&struct_type)?;
                PropertyValue::Struct(StructValue {
                    struct_type,
                    metadata,
                    payload,
                })
            }
            _ => {
                property_guid = self.read_guid_section()?;
                self.read_plain_value(kind)?
            }
        };

        Ok(Some(Property {
            name,
            type_tag,
            pad_byte,
            array_index,
            property_guid,
            value,
        }))
    }

    fn read_guid_section(&mut self) -> Result<Option<[u8; GUID_LEN]>> {
        if self.cur.read_u8()? == 1 {
            Ok(Some(self.cur.read_array()?))
        } else {
            Ok(None)
        }
    }

    fn read_plain_value(&mut self, kind: PropertyKind) -> Result<PropertyValue> {
        let cur = &mut self.cur;
        let value = match kind {
            PropertyKind::Int8 => PropertyValue::Int8(cur.read_i8()?),
            PropertyKind::Int => PropertyValue::Int32(cur.read_i32()?),
            PropertyKind::UInt32 => PropertyValue::UInt32(cur.read_u32()?),
            PropertyKind::Int64 => PropertyValue::Int64(cur.read_i64()?),
            PropertyKind::UInt64 => PropertyValue::UInt64(cur.read_u64()?),
            PropertyKind::Float => PropertyValue::Float(cur.read_f32()?),
            PropertyKind::Double => PropertyValue::Double(cur.read_f64()?),
            PropertyKind::Str => PropertyValue::Str(read_save_string(cur)?),
            PropertyKind::Name => PropertyValue::Name(read_save_string(cur)?),
            PropertyKind::Object => PropertyValue::Object(ObjectReference::read(cur)?),
            PropertyKind::Interface => PropertyValue::Interface(ObjectReference::read(cur)?),
            PropertyKind::Text => PropertyValue::Text(read_text(cur)?),
            PropertyKind::Bool
            | PropertyKind::Enum
            | PropertyKind::Byte
            | PropertyKind::Array
            | PropertyKind::Struct => {
                return Err(SaveError::new(
                    SaveErrorCode::UnknownPropertyType,
                    format!("{kind:?} has a kind-specific header"),
                ));
            }
        };
        Ok(value)
    }

    fn read_array(&mut self, name: &SaveString) -> Result<ArrayValue> {
        let type_pos = self.cur.position();
        let element_type = read_save_string(&mut self.cur)?;
        let element_kind = PropertyKind::from_tag(element_type.as_bytes());
        if !matches!(
            element_kind,
            Some(PropertyKind::Object) | Some(PropertyKind::Interface)
        ) {
            return Err(SaveError::new(
                SaveErrorCode::UnsupportedArrayElementType,
                format!("array {name} of {element_type} at pos={type_pos}"),
            ));
        }

        let flag = self.cur.read_u8()?;
        let count = self.cur.read_i32()?;
        let count = usize::try_from(count).map_err(|_| {
            SaveError::new(
                SaveErrorCode::OutOfRange,
                format!("array {name} has negative element count {count}"),
            )
        })?;

        let start = self.cur.position();
        let mut elements = Vec::with_capacity(count.min(self.cur.remaining()));
        for _ in 0..count {
            elements.push(ObjectReference::read(&mut self.cur)?);
        }
        let end = self.cur.position();
        self.locator.observe(name, start, end, count);

        Ok(ArrayValue {
            element_type,
            flag,
            elements,
        })
    }
}
