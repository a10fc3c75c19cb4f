use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::property::read_save_string;
use crate::reader::ByteCursor;

/// Header type from which a save name precedes the map name.
const HEADER_TYPE_WITH_SAVE_NAME: i32 = 14;

/// Leading header fields, for display only. The container keeps the header
/// bytes verbatim regardless of what is parsed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub header_type: i32,
    pub save_version: i32,
    pub build_version: i32,
    pub save_name: Option<String>,
    pub map_name: String,
    pub map_options: String,
    pub session_name: String,
    pub play_duration_seconds: i32,
    pub save_date_ticks: i64,
    pub session_visibility: u8,
}

impl SaveHeader {
    pub fn parse(header_bytes: &[u8]) -> Result<Self> {
        let mut r = ByteCursor::new(header_bytes);
        let header_type = r.read_i32()?;
        let save_version = r.read_i32()?;
        let build_version = r.read_i32()?;
        let save_name = if header_type >= HEADER_TYPE_WITH_SAVE_NAME {
            Some(read_save_string(&mut r)?.to_string())
        } else {
            None
        };
        let map_name = read_save_string(&mut r)?.to_string();
        let map_options = read_save_string(&mut r)?.to_string();
        let session_name = read_save_string(&mut r)?.to_string();
        let play_duration_seconds = r.read_i32()?;
        let save_date_ticks = r.read_i64()?;
        let session_visibility = r.read_u8()?;

        Ok(Self {
            header_type,
            save_version,
            build_version,
            save_name,
            map_name,
            map_options,
            session_name,
            play_duration_seconds,
            save_date_ticks,
            session_visibility,
        })
    }
}
