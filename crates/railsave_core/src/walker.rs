//! Walks the decoded body's level tables. Only entities whose path names
//! mark them as railroad-related are decoded; everything else is skipped by
//! its declared length.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, SaveError, SaveErrorCode};
use crate::locator::ArrayLocator;
use crate::property::{
    ObjectReference, Property, PropertyReader, SaveString, read_save_string, skip_save_string,
};
use crate::reader::ByteCursor;
use crate::types::{
    ACTOR_RESERVED_LEN, BODY_SIZE_FIELD_LEN, CACHED_ACTOR_TRANSFORM, END_MARKER_MAX_LEN,
    ENTITY_VERSION_METADATA_LEN, OBJECT_TYPE_ACTOR, OBJECT_TYPE_OBJECT, RAILROAD_SUBSYSTEM_PATH,
    STATION_PATH_MARKER, TRAIN_PATH_MARKER, uses_extended_layout,
};

/// Entry of a level's object table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectHeader {
    Object {
        class_name: SaveString,
        path_name: SaveString,
        outer_path_name: SaveString,
    },
    Actor {
        class_name: SaveString,
        path_name: SaveString,
    },
}

impl ObjectHeader {
    pub fn path_name(&self) -> &SaveString {
        match self {
            Self::Object { path_name, .. } | Self::Actor { path_name, .. } => path_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Object {
        class_name: SaveString,
        path_name: SaveString,
        outer_path_name: SaveString,
    },
    Actor {
        class_name: SaveString,
        path_name: SaveString,
        parent: ObjectReference,
        children: Vec<ObjectReference>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub properties: Vec<Property>,
    /// Undecoded bytes before the declared end, kept when longer than the
    /// end-of-block marker.
    pub trailing_bytes: Vec<u8>,
}

impl EntityRecord {
    pub fn path_name(&self) -> &SaveString {
        match &self.kind {
            EntityKind::Object { path_name, .. } | EntityKind::Actor { path_name, .. } => path_name,
        }
    }

    pub fn class_name(&self) -> &SaveString {
        match &self.kind {
            EntityKind::Object { class_name, .. } | EntityKind::Actor { class_name, .. } => {
                class_name
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRole {
    RailroadSubsystem,
    Station,
    Train,
}

pub fn classify(path_name: &[u8]) -> Option<EntityRole> {
    if path_name == RAILROAD_SUBSYSTEM_PATH {
        Some(EntityRole::RailroadSubsystem)
    } else if contains(path_name, STATION_PATH_MARKER) {
        Some(EntityRole::Station)
    } else if contains(path_name, TRAIN_PATH_MARKER) {
        Some(EntityRole::Train)
    } else {
        None
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[derive(Debug, Default)]
pub struct BodyScan {
    pub level_count: usize,
    pub object_count: usize,
    pub skipped_entities: usize,
    pub railroad_subsystem: Option<EntityRecord>,
    pub stations: HashMap<Vec<u8>, EntityRecord>,
    pub trains: HashMap<Vec<u8>, EntityRecord>,
    pub locator: ArrayLocator,
}

impl BodyScan {
    pub fn decoded_entities(&self) -> usize {
        usize::from(self.railroad_subsystem.is_some()) + self.stations.len() + self.trains.len()
    }
}

pub fn walk_body(body: &[u8], header_version: u32) -> Result<BodyScan> {
    let extended = uses_extended_layout(header_version);
    let mut reader = PropertyReader::new(body, ArrayLocator::for_rail_arrays());
    let mut scan = BodyScan::default();

    reader.cursor().skip(BODY_SIZE_FIELD_LEN)?;
    let sublevels = read_count(reader.cursor(), "level")?;
    scan.level_count = sublevels + 1;

    for level in 0..=sublevels {
        let cur = reader.cursor();
        let level_name = if level < sublevels {
            Some(read_save_string(cur)?)
        } else {
            None
        };

        let _objects_binary_len = cur.read_i32()?;
        let object_count = read_count(cur, "object")?;
        let mut headers = Vec::with_capacity(object_count.min(cur.remaining()));
        for _ in 0..object_count {
            headers.push(read_object_header(cur)?);
        }
        skip_collected(cur)?;

        let _entities_binary_len = cur.read_i32()?;
        let entity_count = read_count(cur, "entity")?;
        if entity_count > headers.len() {
            return Err(SaveError::new(
                SaveErrorCode::EntityTableMismatch,
                format!(
                    "level {level} lists {entity_count} entities for {} objects",
                    headers.len()
                ),
            ));
        }

        for header in headers.iter().take(entity_count) {
            if extended {
                reader.cursor().skip(ENTITY_VERSION_METADATA_LEN)?;
            }
            match classify(header.path_name().as_bytes()) {
                Some(role) => {
                    let record = read_entity(&mut reader, header)?;
                    let path = record.path_name().as_bytes().to_vec();
                    match role {
                        EntityRole::RailroadSubsystem => scan.railroad_subsystem = Some(record),
                        EntityRole::Station => {
                            scan.stations.insert(path, record);
                        }
                        EntityRole::Train => {
                            scan.trains.insert(path, record);
                        }
                    }
                }
                None => {
                    skip_entity(reader.cursor())?;
                    scan.skipped_entities += 1;
                }
            }
        }
        skip_collected(reader.cursor())?;

        scan.object_count += headers.len();
        debug!(
            level = %level_name.map(|n| n.to_string()).unwrap_or_else(|| "Persistent_Level".into()),
            objects = headers.len(),
            entities = entity_count,
            "level_scanned"
        );
    }

    scan.locator = reader.into_locator();
    Ok(scan)
}

pub fn read_object_header(cur: &mut ByteCursor<'_>) -> Result<ObjectHeader> {
    let type_pos = cur.position();
    let object_type = cur.read_i32()?;
    match object_type {
        OBJECT_TYPE_OBJECT => {
            let class_name = read_save_string(cur)?;
            skip_save_string(cur)?;
            let path_name = read_save_string(cur)?;
            let outer_path_name = read_save_string(cur)?;
            Ok(ObjectHeader::Object {
                class_name,
                path_name,
                outer_path_name,
            })
        }
        OBJECT_TYPE_ACTOR => {
            let class_name = read_save_string(cur)?;
            skip_save_string(cur)?;
            let path_name = read_save_string(cur)?;
            cur.skip(ACTOR_RESERVED_LEN)?;
            Ok(ObjectHeader::Actor {
                class_name,
                path_name,
            })
        }
        other => Err(SaveError::new(
            SaveErrorCode::UnknownObjectType,
            format!("object type {other} at pos={type_pos}"),
        )),
    }
}

/// Skips one entity by its declared length, returning the end offset.
pub fn skip_entity(cur: &mut ByteCursor<'_>) -> Result<usize> {
    let declared_len = read_count(cur, "entity byte")?;
    cur.skip(declared_len)?;
    Ok(cur.position())
}

/// Fully decodes one entity. The cursor always ends at the declared end.
pub fn read_entity(reader: &mut PropertyReader<'_>, header: &ObjectHeader) -> Result<EntityRecord> {
    let cur = reader.cursor();
    let declared_len = read_count(cur, "entity byte")?;
    let start = cur.position();
    let end = start
        .checked_add(declared_len)
        .filter(|&end| end <= cur.len())
        .ok_or_else(|| SaveError::truncated(start, declared_len, cur.len()))?;

    let kind = match header {
        ObjectHeader::Object {
            class_name,
            path_name,
            outer_path_name,
        } => EntityKind::Object {
            class_name: class_name.clone(),
            path_name: path_name.clone(),
            outer_path_name: outer_path_name.clone(),
        },
        ObjectHeader::Actor {
            class_name,
            path_name,
        } => {
            let parent = ObjectReference::read(cur)?;
            let child_count = read_count(cur, "child")?;
            let mut children = Vec::with_capacity(child_count.min(cur.remaining()));
            for _ in 0..child_count {
                children.push(ObjectReference::read(cur)?);
            }
            EntityKind::Actor {
                class_name: class_name.clone(),
                path_name: path_name.clone(),
                parent,
                children,
            }
        }
    };

    let mut properties = reader.read_property_list()?;
    properties.retain(|p| !p.name.is(CACHED_ACTOR_TRANSFORM));

    let cur = reader.cursor();
    let pos = cur.position();
    if pos > end {
        return Err(SaveError::new(
            SaveErrorCode::EntityOverrun,
            format!(
                "entity {} decoded to pos={pos}, past its declared end {end}",
                header.path_name()
            ),
        ));
    }
    let remaining = end - pos;
    let trailing_bytes = if remaining > END_MARKER_MAX_LEN {
        cur.read_bytes(remaining)?.to_vec()
    } else {
        cur.skip(remaining)?;
        Vec::new()
    };

    Ok(EntityRecord {
        kind,
        properties,
        trailing_bytes,
    })
}

fn skip_collected(cur: &mut ByteCursor<'_>) -> Result<()> {
    let count = read_count(cur, "collected reference")?;
    for _ in 0..count {
        ObjectReference::skip(cur)?;
    }
    Ok(())
}

fn read_count(cur: &mut ByteCursor<'_>, what: &str) -> Result<usize> {
    let pos = cur.position();
    let count = cur.read_i32()?;
    usize::try_from(count).map_err(|_| {
        SaveError::new(
            SaveErrorCode::OutOfRange,
            format!("negative {what} count {count} at pos={pos}"),
        )
    })
}
