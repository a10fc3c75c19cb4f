// Container constants
pub const CHUNK_SIGNATURE: [u8; 4] = [0xC1, 0x83, 0x2A, 0x9E];
pub const HEADER_VERSION_OFFSET: usize = 4;
pub const EXTENDED_LAYOUT_VERSION: u32 = 41;
pub const NEWEST_KNOWN_VERSION: u32 = 46;

// Chunk header: prefix + compressed_len + uncompressed_len + both repeated
pub const CHUNK_HEADER_LEN_LEGACY: usize = 48;
pub const CHUNK_HEADER_LEN_EXTENDED: usize = 49;
pub const CHUNK_LENGTH_FIELDS_LEN: usize = 32;
pub const MAX_CHUNK_SIZE_OFFSET: usize = 8;

// Body layout
pub const BODY_SIZE_FIELD_LEN: usize = 4;
pub const OBJECT_TYPE_OBJECT: i32 = 0;
pub const OBJECT_TYPE_ACTOR: i32 = 1;
pub const ACTOR_RESERVED_LEN: usize = 48;
pub const ENTITY_VERSION_METADATA_LEN: usize = 8;
pub const END_MARKER_MAX_LEN: usize = 4;

// Property layout
pub const NONE_NAME: &str = "None";
pub const PROPERTY_TAG_SUFFIX: &[u8] = b"Property";
pub const STRUCT_METADATA_LEN: usize = 17;
pub const GUID_LEN: usize = 16;
pub const CACHED_ACTOR_TRANSFORM: &str = "CachedActorTransform";

// Entities of interest
pub const RAILROAD_SUBSYSTEM_PATH: &[u8] = b"Persistent_Level:PersistentLevel.RailroadSubsystem";
pub const STATION_PATH_MARKER: &[u8] =
    b"Persistent_Level:PersistentLevel.FGTrainStationIdentifier_";
pub const TRAIN_PATH_MARKER: &[u8] = b"Persistent_Level:PersistentLevel.BP_Train_C_";

pub const STATION_ARRAY_NAME: &str = "mTrainStationIdentifiers";
pub const TRAIN_ARRAY_NAME: &str = "mTrains";
pub const STATION_NAME_PROPERTY: &str = "mStationName";
pub const TRAIN_NAME_PROPERTY: &str = "mTrainName";
pub const DEFAULT_TRAIN_NAME: &str = "Train";

pub fn uses_extended_layout(header_version: u32) -> bool {
    header_version >= EXTENDED_LAYOUT_VERSION
}

pub fn chunk_header_len(header_version: u32) -> usize {
    if uses_extended_layout(header_version) {
        CHUNK_HEADER_LEN_EXTENDED
    } else {
        CHUNK_HEADER_LEN_LEGACY
    }
}
