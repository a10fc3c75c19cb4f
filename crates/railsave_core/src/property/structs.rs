use crate::error::Result;
use crate::reader::ByteCursor;
use crate::types::GUID_LEN;

use super::decode::PropertyReader;
use super::encode::{write_none, write_property};
use super::string::{SaveString, read_save_string, write_save_string};
use super::{ObjectReference, Property, PropertyValue, StructMetadata};

#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub struct_type: SaveString,
    pub metadata: StructMetadata,
    pub payload: StructPayload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    pub unknown: i32,
    pub item_name: SaveString,
    pub item_state: ObjectReference,
    pub property: Option<Box<Property>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructPayload {
    Color { b: u8, g: u8, r: u8, a: u8 },
    LinearColor([f32; 4]),
    Vector(Vector3),
    Rotator(Vector3),
    Vector2D { x: f32, y: f32 },
    Quat([f32; 4]),
    Vector4([f32; 4]),
    Box {
        min: Vector3,
        max: Vector3,
        is_valid: u8,
    },
    RailroadTrackPosition {
        track: ObjectReference,
        offset: f32,
        forward: f32,
    },
    TimeHandle(SaveString),
    Guid([u8; GUID_LEN]),
    InventoryItem(InventoryItem),
    FluidBox(f32),
    SlateBrush(SaveString),
    /// Nested properties. Normally `None`-terminated; see
    /// [`ends_generic_struct`] for the one exception.
    Generic(Vec<Property>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructKind {
    Color,
    LinearColor,
    Vector,
    Rotator,
    Vector2D,
    Quat,
    Vector4,
    Box,
    RailroadTrackPosition,
    TimeHandle,
    Guid,
    InventoryItem,
    FluidBox,
    SlateBrush,
    Generic,
}

impl StructKind {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"Color" => Self::Color,
            b"LinearColor" => Self::LinearColor,
            b"Vector" => Self::Vector,
            b"Rotator" => Self::Rotator,
            b"Vector2D" => Self::Vector2D,
            b"Quat" => Self::Quat,
            b"Vector4" => Self::Vector4,
            b"Box" => Self::Box,
            b"RailroadTrackPosition" => Self::RailroadTrackPosition,
            b"TimeHandle" => Self::TimeHandle,
            b"Guid" => Self::Guid,
            b"InventoryItem" => Self::InventoryItem,
            b"FluidBox" => Self::FluidBox,
            b"SlateBrush" => Self::SlateBrush,
            _ => Self::Generic,
        }
    }
}

/// A generic struct stops right after a nested inventory item whose single
/// property slot is empty; no `None` record follows it in that case.
pub fn ends_generic_struct(property: &Property) -> bool {
    matches!(
        &property.value,
        PropertyValue::Struct(StructValue {
            payload: StructPayload::InventoryItem(InventoryItem { property: None, .. }),
            ..
        })
    )
}

impl PropertyReader<'_> {
    pub(crate) fn read_struct_payload(
        &mut self,
        struct_type: &SaveString,
    ) -> Result<StructPayload> {
        let payload = match StructKind::from_name(struct_type.as_bytes()) {
            StructKind::Color => {
                let cur = self.cursor();
                StructPayload::Color {
                    b: cur.read_u8()?,
                    g: cur.read_u8()?,
                    r: cur.read_u8()?,
                    a: cur.read_u8()?,
                }
            }
            StructKind::LinearColor => StructPayload::LinearColor(read_f32x4(self.cursor())?),
            StructKind::Vector => StructPayload::Vector(read_vector3(self.cursor())?),
            StructKind::Rotator => StructPayload::Rotator(read_vector3(self.cursor())?),
            StructKind::Vector2D => {
                let cur = self.cursor();
                StructPayload::Vector2D {
                    x: cur.read_f32()?,
                    y: cur.read_f32()?,
                }
            }
            StructKind::Quat => StructPayload::Quat(read_f32x4(self.cursor())?),
            StructKind::Vector4 => StructPayload::Vector4(read_f32x4(self.cursor())?),
            StructKind::Box => {
                let cur = self.cursor();
                StructPayload::Box {
                    min: read_vector3(cur)?,
                    max: read_vector3(cur)?,
                    is_valid: cur.read_u8()?,
                }
            }
            StructKind::RailroadTrackPosition => {
                let cur = self.cursor();
                StructPayload::RailroadTrackPosition {
                    track: ObjectReference::read(cur)?,
                    offset: cur.read_f32()?,
                    forward: cur.read_f32()?,
                }
            }
            StructKind::TimeHandle => StructPayload::TimeHandle(read_save_string(self.cursor())?),
            StructKind::Guid => StructPayload::Guid(self.cursor().read_array()?),
            StructKind::InventoryItem => {
                let cur = self.cursor();
                let unknown = cur.read_i32()?;
                let item_name = read_save_string(cur)?;
                let item_state = ObjectReference::read(cur)?;
                let property = self.read_property()?.map(Box::new);
                StructPayload::InventoryItem(InventoryItem {
                    unknown,
                    item_name,
                    item_state,
                    property,
                })
            }
            StructKind::FluidBox => StructPayload::FluidBox(self.cursor().read_f32()?),
            StructKind::SlateBrush => StructPayload::SlateBrush(read_save_string(self.cursor())?),
            StructKind::Generic => {
                let mut properties = Vec::new();
                while let Some(property) = self.read_property()? {
                    let stop = ends_generic_struct(&property);
                    properties.push(property);
                    if stop {
                        break;
                    }
                }
                StructPayload::Generic(properties)
            }
        };
        Ok(payload)
    }
}

pub fn write_struct_payload(out: &mut Vec<u8>, payload: &StructPayload) {
    match payload {
        StructPayload::Color { b, g, r, a } => out.extend_from_slice(&[*b, *g, *r, *a]),
        StructPayload::LinearColor(values)
        | StructPayload::Quat(values)
        | StructPayload::Vector4(values) => write_f32s(out, values),
        StructPayload::Vector(v) | StructPayload::Rotator(v) => write_vector3(out, v),
        StructPayload::Vector2D { x, y } => write_f32s(out, &[*x, *y]),
        StructPayload::Box { min, max, is_valid } => {
            write_vector3(out, min);
            write_vector3(out, max);
            out.push(*is_valid);
        }
        StructPayload::RailroadTrackPosition {
            track,
            offset,
            forward,
        } => {
            track.write(out);
            write_f32s(out, &[*offset, *forward]);
        }
        StructPayload::TimeHandle(s) | StructPayload::SlateBrush(s) => write_save_string(out, s),
        StructPayload::Guid(guid) => out.extend_from_slice(guid),
        StructPayload::InventoryItem(item) => {
            out.extend_from_slice(&item.unknown.to_le_bytes());
            write_save_string(out, &item.item_name);
            item.item_state.write(out);
            match &item.property {
                Some(property) => write_property(out, property),
                None => write_none(out),
            }
        }
        StructPayload::FluidBox(value) => out.extend_from_slice(&value.to_le_bytes()),
        StructPayload::Generic(properties) => {
            for property in properties {
                write_property(out, property);
            }
            if !properties.last().is_some_and(ends_generic_struct) {
                write_none(out);
            }
        }
    }
}

fn read_vector3(cur: &mut ByteCursor<'_>) -> Result<Vector3> {
    Ok(Vector3 {
        x: cur.read_f32()?,
        y: cur.read_f32()?,
        z: cur.read_f32()?,
    })
}

fn read_f32x4(cur: &mut ByteCursor<'_>) -> Result<[f32; 4]> {
    Ok([
        cur.read_f32()?,
        cur.read_f32()?,
        cur.read_f32()?,
        cur.read_f32()?,
    ])
}

fn write_vector3(out: &mut Vec<u8>, v: &Vector3) {
    write_f32s(out, &[v.x, v.y, v.z]);
}

fn write_f32s(out: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
}
