#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use railsave_core::property::{
    ArrayValue, ObjectReference, Property, PropertyValue, SaveString, TextHistory, TextValue,
    write_property_list, write_save_string,
};

pub const SIGNATURE: [u8; 4] = [0xC1, 0x83, 0x2A, 0x9E];
pub const LEVEL: &str = "Persistent_Level";
pub const SUBSYSTEM_PATH: &str = "Persistent_Level:PersistentLevel.RailroadSubsystem";

pub fn station_path(id: u32) -> String {
    format!("Persistent_Level:PersistentLevel.FGTrainStationIdentifier_{id}")
}

pub fn train_path(id: u32) -> String {
    format!("Persistent_Level:PersistentLevel.BP_Train_C_{id}")
}

pub fn reference(path: &str) -> ObjectReference {
    ObjectReference::new(SaveString::utf8(LEVEL), SaveString::utf8(path))
}

/// Builds a small but structurally complete save: an opaque header, a
/// sublevel with one unrelated object, and the persistent level holding the
/// railroad subsystem, station identifiers, trains and an unrelated actor.
#[derive(Debug, Clone)]
pub struct SaveBuilder {
    version: u32,
    stations: Vec<(u32, Option<String>)>,
    trains: Vec<(u32, Option<String>)>,
    subsystem: bool,
    chunk_count: usize,
}

impl SaveBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            stations: Vec::new(),
            trains: Vec::new(),
            subsystem: true,
            chunk_count: 2,
        }
    }

    pub fn station(mut self, id: u32, name: &str) -> Self {
        self.stations.push((id, Some(name.to_string())));
        self
    }

    pub fn unnamed_station(mut self, id: u32) -> Self {
        self.stations.push((id, None));
        self
    }

    pub fn train(mut self, id: u32, name: Option<&str>) -> Self {
        self.trains.push((id, name.map(str::to_string)));
        self
    }

    pub fn without_subsystem(mut self) -> Self {
        self.subsystem = false;
        self
    }

    pub fn chunks(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count.max(1);
        self
    }

    pub fn extended(&self) -> bool {
        self.version >= 41
    }

    pub fn header(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&13i32.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&211_839i32.to_le_bytes());
        write_save_string(&mut out, &SaveString::utf8(LEVEL));
        write_save_string(&mut out, &SaveString::utf8("?startloc=Grass Fields"));
        write_save_string(&mut out, &SaveString::utf8("Rail Test"));
        out.extend_from_slice(&5400i32.to_le_bytes());
        out.extend_from_slice(&1_000_000i64.to_le_bytes());
        out.push(0);
        out.extend_from_slice(&[0x11; 12]);
        out
    }

    pub fn body(&self) -> Vec<u8> {
        let extended = self.extended();
        let mut levels = Vec::new();
        levels.extend_from_slice(&1i32.to_le_bytes());

        let sublevel_objects = vec![unrelated_object()];
        write_level(&mut levels, Some("Level_Sub_1"), &sublevel_objects, extended);

        let mut objects = vec![unrelated_actor()];
        for (id, name) in &self.stations {
            objects.push(station_object(*id, name.as_deref()));
        }
        for (id, name) in &self.trains {
            objects.push(train_actor(*id, name.as_deref()));
        }
        if self.subsystem {
            objects.push(self.subsystem_object());
        }
        write_level(&mut levels, None, &objects, extended);

        let mut body = (levels.len() as i32).to_le_bytes().to_vec();
        body.extend_from_slice(&levels);
        body
    }

    pub fn build(&self) -> Vec<u8> {
        let body = self.body();
        let max_chunk_size = body.len().div_ceil(self.chunk_count) as u64;

        let mut prefix = SIGNATURE.to_vec();
        prefix.extend_from_slice(&[0x22, 0x22, 0x22, 0x22]);
        prefix.extend_from_slice(&max_chunk_size.to_le_bytes());
        if self.extended() {
            prefix.push(3);
        }

        let mut out = self.header();
        for slice in body.chunks(max_chunk_size as usize) {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(slice).expect("compress fixture chunk");
            let compressed = encoder.finish().expect("finish fixture chunk");
            out.extend_from_slice(&prefix);
            for _ in 0..2 {
                out.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
                out.extend_from_slice(&(slice.len() as u64).to_le_bytes());
            }
            out.extend_from_slice(&compressed);
        }
        out
    }

    fn subsystem_object(&self) -> LevelObject {
        let stations: Vec<ObjectReference> = self
            .stations
            .iter()
            .map(|(id, _)| reference(&station_path(*id)))
            .collect();
        let trains: Vec<ObjectReference> = self
            .trains
            .iter()
            .map(|(id, _)| reference(&train_path(*id)))
            .collect();
        let properties = vec![
            int_prop("mSaveVersion", 7),
            array_prop("mTrainStationIdentifiers", stations),
            array_prop("mTrains", trains),
        ];

        let mut header = Vec::new();
        object_header(
            &mut header,
            "/Script/FactoryGame.FGRailroadSubsystem",
            SUBSYSTEM_PATH,
        );
        LevelObject {
            header,
            entity: object_payload(&properties),
        }
    }
}

pub struct LevelObject {
    header: Vec<u8>,
    entity: Vec<u8>,
}

pub fn int_prop(name: &str, value: i32) -> Property {
    Property {
        name: SaveString::utf8(name),
        type_tag: SaveString::utf8("IntProperty"),
        pad_byte: false,
        array_index: 0,
        property_guid: None,
        value: PropertyValue::Int32(value),
    }
}

pub fn text_prop(name: &str, value: &str) -> Property {
    Property {
        name: SaveString::utf8(name),
        type_tag: SaveString::utf8("TextProperty"),
        pad_byte: false,
        array_index: 0,
        property_guid: None,
        value: PropertyValue::Text(TextValue {
            flags: 0,
            history: TextHistory::Base {
                namespace: SaveString::null(),
                key: SaveString::utf8("8C1A2B3D4E5F60718293A4B5C6D7E8F9"),
                source: SaveString::from_text(value),
            },
        }),
    }
}

pub fn array_prop(name: &str, elements: Vec<ObjectReference>) -> Property {
    Property {
        name: SaveString::utf8(name),
        type_tag: SaveString::utf8("ArrayProperty"),
        pad_byte: false,
        array_index: 0,
        property_guid: None,
        value: PropertyValue::Array(ArrayValue {
            element_type: SaveString::utf8("ObjectProperty"),
            flag: 0,
            elements,
        }),
    }
}

fn object_header(out: &mut Vec<u8>, class_name: &str, path_name: &str) {
    out.extend_from_slice(&0i32.to_le_bytes());
    write_save_string(out, &SaveString::utf8(class_name));
    write_save_string(out, &SaveString::utf8("/Script/FactoryGame"));
    write_save_string(out, &SaveString::utf8(path_name));
    write_save_string(out, &SaveString::utf8("Persistent_Level:PersistentLevel"));
}

fn actor_header(out: &mut Vec<u8>, class_name: &str, path_name: &str) {
    out.extend_from_slice(&1i32.to_le_bytes());
    write_save_string(out, &SaveString::utf8(class_name));
    write_save_string(out, &SaveString::utf8("/Game/FactoryGame"));
    write_save_string(out, &SaveString::utf8(path_name));
    out.extend_from_slice(&[0x3F; 48]);
}

fn object_payload(properties: &[Property]) -> Vec<u8> {
    let mut payload = Vec::new();
    write_property_list(&mut payload, properties);
    payload.extend_from_slice(&[0; 4]);
    payload
}

fn actor_payload(properties: &[Property]) -> Vec<u8> {
    let mut payload = Vec::new();
    reference("Persistent_Level:PersistentLevel").write(&mut payload);
    payload.extend_from_slice(&0i32.to_le_bytes());
    write_property_list(&mut payload, properties);
    payload.extend_from_slice(&[0; 4]);
    payload
}

fn station_object(id: u32, name: Option<&str>) -> LevelObject {
    let mut properties = vec![int_prop("mStationIndex", id as i32)];
    if let Some(name) = name {
        properties.push(text_prop("mStationName", name));
    }
    let mut header = Vec::new();
    object_header(
        &mut header,
        "/Script/FactoryGame.FGTrainStationIdentifier",
        &station_path(id),
    );
    LevelObject {
        header,
        entity: object_payload(&properties),
    }
}

fn train_actor(id: u32, name: Option<&str>) -> LevelObject {
    let mut properties = vec![int_prop("CachedActorTransform", 0)];
    if let Some(name) = name {
        properties.push(text_prop("mTrainName", name));
    }
    let mut header = Vec::new();
    actor_header(&mut header, "/Game/FactoryGame/BP_Train.BP_Train_C", &train_path(id));
    LevelObject {
        header,
        entity: actor_payload(&properties),
    }
}

/// Entity payload that is not a valid property list; walking must skip it.
fn unrelated_actor() -> LevelObject {
    let mut header = Vec::new();
    actor_header(
        &mut header,
        "/Game/FactoryGame/Build_Foundation.Build_Foundation_C",
        "Persistent_Level:PersistentLevel.Build_Foundation_C_1",
    );
    LevelObject {
        header,
        entity: vec![0xEE; 37],
    }
}

fn unrelated_object() -> LevelObject {
    let mut header = Vec::new();
    object_header(
        &mut header,
        "/Script/FactoryGame.FGFoliageRemoval",
        "Level_Sub_1:PersistentLevel.FoliageRemoval_1",
    );
    LevelObject {
        header,
        entity: vec![0xDD; 9],
    }
}

fn write_level(out: &mut Vec<u8>, name: Option<&str>, objects: &[LevelObject], extended: bool) {
    if let Some(name) = name {
        write_save_string(out, &SaveString::utf8(name));
    }

    let mut headers = Vec::new();
    for object in objects {
        headers.extend_from_slice(&object.header);
    }
    out.extend_from_slice(&((headers.len() + 8) as i32).to_le_bytes());
    out.extend_from_slice(&(objects.len() as i32).to_le_bytes());
    out.extend_from_slice(&headers);
    out.extend_from_slice(&0i32.to_le_bytes());

    let mut entities = Vec::new();
    for object in objects {
        if extended {
            entities.extend_from_slice(&[0x05; 8]);
        }
        entities.extend_from_slice(&(object.entity.len() as i32).to_le_bytes());
        entities.extend_from_slice(&object.entity);
    }
    out.extend_from_slice(&((entities.len() + 8) as i32).to_le_bytes());
    out.extend_from_slice(&(objects.len() as i32).to_le_bytes());
    out.extend_from_slice(&entities);
    out.extend_from_slice(&0i32.to_le_bytes());
}

pub fn rail_save(version: u32) -> SaveBuilder {
    SaveBuilder::new(version)
        .station(1, "Iron Mine")
        .station(2, "Gare Süd")
        .station(3, "Smelter Yard")
        .train(1, Some("Ore Express"))
        .train(2, None)
        .train(3, Some("Coal Runner"))
}
