use serde::{Deserialize, Serialize};

use crate::header::SaveHeader;
use crate::property::ObjectReference;
use crate::types::{
    DEFAULT_TRAIN_NAME, STATION_ARRAY_NAME, STATION_NAME_PROPERTY, TRAIN_ARRAY_NAME,
    TRAIN_NAME_PROPERTY,
};

/// The two reorderable arrays on the railroad subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Stations,
    Trains,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Stations, Collection::Trains];

    pub fn array_name(self) -> &'static str {
        match self {
            Self::Stations => STATION_ARRAY_NAME,
            Self::Trains => TRAIN_ARRAY_NAME,
        }
    }

    pub fn name_property(self) -> &'static str {
        match self {
            Self::Stations => STATION_NAME_PROPERTY,
            Self::Trains => TRAIN_NAME_PROPERTY,
        }
    }

    /// Name used when an entity has no name property. Stations always need one.
    pub fn fallback_name(self) -> Option<&'static str> {
        match self {
            Self::Stations => None,
            Self::Trains => Some(DEFAULT_TRAIN_NAME),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stations => "station",
            Self::Trains => "train",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedEntry {
    pub display_name: String,
    pub reference: ObjectReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub header_version: u32,
    pub header: Option<SaveHeader>,
    pub chunk_count: usize,
    pub max_chunk_size: u64,
    pub body_len: usize,
    pub level_count: usize,
    pub object_count: usize,
    pub decoded_entities: usize,
    pub skipped_entities: usize,
    pub station_count: Option<usize>,
    pub train_count: Option<usize>,
}
