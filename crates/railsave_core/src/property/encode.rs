use crate::types::{GUID_LEN, NONE_NAME};

use super::string::{SaveString, write_save_string};
use super::structs::write_struct_payload;
use super::text::write_text;
use super::{ByteValue, Property, PropertyValue, write_references};

pub fn write_none(out: &mut Vec<u8>) {
    write_save_string(out, &SaveString::utf8(NONE_NAME));
}

pub fn write_property_list(out: &mut Vec<u8>, properties: &[Property]) {
    for property in properties {
        write_property(out, property);
    }
    write_none(out);
}

/// Writes one property record. The declared length is recomputed from the
/// encoded payload, which is everything after the kind header and GUID.
pub fn write_property(out: &mut Vec<u8>, property: &Property) {
    write_save_string(out, &property.name);
    if property.pad_byte {
        out.push(0);
    }
    write_save_string(out, &property.type_tag);

    let mut header = Vec::new();
    let mut payload = Vec::new();
    match &property.value {
        PropertyValue::Bool(value) => {
            header.push(*value);
            write_guid_section(&mut header, property.property_guid.as_ref());
        }
        PropertyValue::Enum {
            enum_type_name,
            value_name,
        } => {
            write_save_string(&mut header, enum_type_name);
            write_guid_section(&mut header, property.property_guid.as_ref());
            write_save_string(&mut payload, value_name);
        }
        PropertyValue::Byte {
            enum_type_name,
            value,
        } => {
            write_save_string(&mut header, enum_type_name);
            write_guid_section(&mut header, property.property_guid.as_ref());
            match value {
                ByteValue::Raw(b) => payload.push(*b),
                ByteValue::Named(name) => write_save_string(&mut payload, name),
            }
        }
        PropertyValue::Array(array) => {
            write_save_string(&mut header, &array.element_type);
            header.push(array.flag);
            payload.extend_from_slice(&(array.elements.len() as i32).to_le_bytes());
            write_references(&mut payload, &array.elements);
        }
        PropertyValue::Struct(value) => {
            write_save_string(&mut header, &value.struct_type);
            header.extend_from_slice(&value.metadata);
            write_struct_payload(&mut payload, &value.payload);
        }
        plain => {
            write_guid_section(&mut header, property.property_guid.as_ref());
            write_plain_value(&mut payload, plain);
        }
    }

    out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    out.extend_from_slice(&property.array_index.to_le_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&payload);
}

fn write_guid_section(out: &mut Vec<u8>, guid: Option<&[u8; GUID_LEN]>) {
    match guid {
        Some(guid) => {
            out.push(1);
            out.extend_from_slice(guid);
        }
        None => out.push(0),
    }
}

fn write_plain_value(out: &mut Vec<u8>, value: &PropertyValue) {
    match value {
        PropertyValue::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::UInt32(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::UInt64(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        PropertyValue::Str(s) | PropertyValue::Name(s) => write_save_string(out, s),
        PropertyValue::Object(r) | PropertyValue::Interface(r) => r.write(out),
        PropertyValue::Text(text) => write_text(out, text),
        PropertyValue::Bool(_)
        | PropertyValue::Enum { .. }
        | PropertyValue::Byte { .. }
        | PropertyValue::Array(_)
        | PropertyValue::Struct(_) => {}
    }
}
