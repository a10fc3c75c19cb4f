use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::container::{self, ChunkParams, ContainerHeader, Decompressed};
use crate::error::{Result, SaveError, SaveErrorCode};
use crate::header::SaveHeader;
use crate::layout::ChunkLayout;
use crate::locator::patch_array;
use crate::property::{
    ArrayValue, ObjectReference, Property, PropertyValue, find_property, find_property_mut,
};
use crate::types::NEWEST_KNOWN_VERSION;
use crate::walker::{BodyScan, EntityRecord, walk_body};

use super::types::{Collection, OrderedEntry, SaveSummary};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// One decoded save. The body is replaced wholesale by each patch; the
/// original file bytes are never touched.
#[derive(Debug)]
pub struct Session {
    header: ContainerHeader,
    params: ChunkParams,
    layout: ChunkLayout,
    body: Vec<u8>,
    scan: BodyScan,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session> {
        let (header, compressed_body) = container::split(bytes.as_ref())?;
        let header_version = header.header_version();
        if header_version > NEWEST_KNOWN_VERSION {
            warn!(
                header_version,
                newest_known = NEWEST_KNOWN_VERSION,
                "unsupported_save_version; decoding best-effort"
            );
        }

        let Decompressed {
            body,
            params,
            layout,
        } = container::decompress(compressed_body, header_version)?;
        let scan = walk_body(&body, header_version)?;
        debug!(
            header_version,
            levels = scan.level_count,
            objects = scan.object_count,
            decoded = scan.decoded_entities(),
            skipped = scan.skipped_entities,
            "save_opened"
        );

        Ok(Session {
            header,
            params,
            layout,
            body,
            scan,
        })
    }
}

impl Session {
    pub fn header_version(&self) -> u32 {
        self.header.header_version()
    }

    pub fn container_header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn chunk_layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn scan(&self) -> &BodyScan {
        &self.scan
    }

    pub fn summary(&self) -> SaveSummary {
        SaveSummary {
            header_version: self.header_version(),
            header: SaveHeader::parse(self.header.bytes()).ok(),
            chunk_count: self.layout.chunks.len(),
            max_chunk_size: self.params.max_chunk_size,
            body_len: self.body.len(),
            level_count: self.scan.level_count,
            object_count: self.scan.object_count,
            decoded_entities: self.scan.decoded_entities(),
            skipped_entities: self.scan.skipped_entities,
            station_count: self.references(Collection::Stations).ok().map(<[_]>::len),
            train_count: self.references(Collection::Trains).ok().map(<[_]>::len),
        }
    }

    /// Current array order with a display name per element.
    pub fn list_ordered_entries(&self, collection: Collection) -> Result<Vec<OrderedEntry>> {
        let entities = self.entities(collection);
        self.references(collection)?
            .iter()
            .map(|reference| {
                let entity = entities.get(reference.path_name.as_bytes()).ok_or_else(|| {
                    SaveError::new(
                        SaveErrorCode::EntityNotFound,
                        format!(
                            "{} {} is referenced but was not found in the save",
                            collection.label(),
                            reference.path_name
                        ),
                    )
                })?;
                let display_name = find_property(&entity.properties, collection.name_property())
                    .and_then(Property::display_string)
                    .map(|name| name.to_string())
                    .or_else(|| collection.fallback_name().map(str::to_string))
                    .ok_or_else(|| {
                        SaveError::new(
                            SaveErrorCode::EntityNotFound,
                            format!(
                                "{} {} has no {}",
                                collection.label(),
                                reference.path_name,
                                collection.name_property()
                            ),
                        )
                    })?;
                Ok(OrderedEntry {
                    display_name,
                    reference: reference.clone(),
                })
            })
            .collect()
    }

    /// Maps an edited list of display names back to references. Each
    /// original entry is consumed once, so repeated names resolve in their
    /// original order.
    pub fn resolve_names<S: AsRef<str>>(
        &self,
        collection: Collection,
        names: &[S],
    ) -> Result<Vec<ObjectReference>> {
        let entries = self.list_ordered_entries(collection)?;
        let mut unused: Vec<Option<&OrderedEntry>> = entries.iter().map(Some).collect();
        let mut resolved = Vec::with_capacity(names.len());

        for (line, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let index = unused
                .iter()
                .position(|slot| matches!(slot, Some(entry) if entry.display_name == name));
            match index.and_then(|i| unused[i].take()) {
                Some(entry) => resolved.push(entry.reference.clone()),
                None => {
                    return Err(SaveError::new(
                        SaveErrorCode::PermutationInvalid,
                        format!(
                            "line {}: {} \"{name}\" is unknown or is already on a line above",
                            line + 1,
                            collection.label()
                        ),
                    ));
                }
            }
        }

        let missing: Vec<&str> = unused
            .iter()
            .flatten()
            .map(|entry| entry.display_name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(SaveError::new(
                SaveErrorCode::PermutationInvalid,
                format!("missing {}s: {}", collection.label(), missing.join(", ")),
            ));
        }

        Ok(resolved)
    }

    /// Reorders a collection. `new_order` must contain every original
    /// reference exactly once.
    pub fn apply_order(
        &mut self,
        collection: Collection,
        new_order: &[ObjectReference],
    ) -> Result<()> {
        let original = self.references(collection)?;
        validate_permutation(collection, original, new_order)?;
        self.patch(collection.array_name(), new_order)?;
        info!(
            collection = collection.label(),
            elements = new_order.len(),
            "array_reordered"
        );
        Ok(())
    }

    /// Overwrites the recorded span of `array_name` with `new_order`,
    /// keeping every other body byte.
    pub fn patch(&mut self, array_name: &str, new_order: &[ObjectReference]) -> Result<()> {
        let span = *self.scan.locator.span(array_name).ok_or_else(|| {
            SaveError::new(
                SaveErrorCode::ArrayNotFound,
                format!("array {array_name} was not located while decoding"),
            )
        })?;
        self.body = patch_array(&self.body, array_name, &span, new_order)?;

        if let Some(array) = self.array_value_mut(array_name) {
            array.elements = new_order.to_vec();
        }
        Ok(())
    }

    /// Header bytes followed by the recompressed body.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        container::compress(&self.body, self.header.bytes(), &self.params)
    }

    fn entities(&self, collection: Collection) -> &HashMap<Vec<u8>, EntityRecord> {
        match collection {
            Collection::Stations => &self.scan.stations,
            Collection::Trains => &self.scan.trains,
        }
    }

    fn references(&self, collection: Collection) -> Result<&[ObjectReference]> {
        let subsystem = self.scan.railroad_subsystem.as_ref().ok_or_else(|| {
            SaveError::new(
                SaveErrorCode::CollectionNotFound,
                "railroad subsystem not present in save",
            )
        })?;
        match find_property(&subsystem.properties, collection.array_name()).map(|p| &p.value) {
            Some(PropertyValue::Array(array)) => Ok(&array.elements),
            _ => Err(SaveError::new(
                SaveErrorCode::CollectionNotFound,
                format!(
                    "railroad subsystem has no {} array",
                    collection.array_name()
                ),
            )),
        }
    }

    fn array_value_mut(&mut self, array_name: &str) -> Option<&mut ArrayValue> {
        let subsystem = self.scan.railroad_subsystem.as_mut()?;
        match find_property_mut(&mut subsystem.properties, array_name).map(|p| &mut p.value) {
            Some(PropertyValue::Array(array)) => Some(array),
            _ => None,
        }
    }
}

fn validate_permutation(
    collection: Collection,
    original: &[ObjectReference],
    new_order: &[ObjectReference],
) -> Result<()> {
    let mut remaining: HashMap<&ObjectReference, usize> = HashMap::new();
    for reference in original {
        *remaining.entry(reference).or_default() += 1;
    }

    for reference in new_order {
        match remaining.get_mut(reference) {
            Some(count) if *count > 0 => *count -= 1,
            _ => {
                return Err(SaveError::new(
                    SaveErrorCode::PermutationInvalid,
                    format!(
                        "{} {} is not in the original list or appears more than once",
                        collection.label(),
                        reference.path_name
                    ),
                ));
            }
        }
    }

    if new_order.len() != original.len() {
        let missing: Vec<String> = remaining
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(reference, _)| reference.path_name.to_string())
            .collect();
        return Err(SaveError::new(
            SaveErrorCode::PermutationInvalid,
            format!("missing {}s: {}", collection.label(), missing.join(", ")),
        ));
    }

    Ok(())
}
