use crate::error::{Result, SaveError, SaveErrorCode};
use crate::reader::ByteCursor;

use super::string::{SaveString, read_save_string, write_save_string};

const HISTORY_BASE: u8 = 0;
const HISTORY_NAMED_FORMAT: u8 = 1;
const HISTORY_ORDERED_FORMAT: u8 = 3;
const HISTORY_TRANSFORM: u8 = 10;
const HISTORY_STRING_TABLE_ENTRY: u8 = 11;
const HISTORY_CULTURE_INVARIANT: u8 = 255;

const ARGUMENT_KIND_TEXT: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct TextValue {
    pub flags: i32,
    pub history: TextHistory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextHistory {
    Base {
        namespace: SaveString,
        key: SaveString,
        source: SaveString,
    },
    Format {
        ordered: bool,
        source: Box<TextValue>,
        arguments: Vec<FormatArgument>,
    },
    Transform {
        source: Box<TextValue>,
        transform_kind: u8,
    },
    TableEntry {
        table_id: SaveString,
        text_key: SaveString,
    },
    CultureInvariant {
        value: Option<SaveString>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatArgument {
    pub name: SaveString,
    pub value: TextValue,
}

impl TextValue {
    /// The string a player would see, when the history carries one.
    pub fn display_string(&self) -> Option<&SaveString> {
        match &self.history {
            TextHistory::Base { source, .. } => Some(source),
            TextHistory::CultureInvariant { value } => value.as_ref(),
            TextHistory::Format { source, .. } | TextHistory::Transform { source, .. } => {
                source.display_string()
            }
            TextHistory::TableEntry { .. } => None,
        }
    }
}

pub fn read_text(cur: &mut ByteCursor<'_>) -> Result<TextValue> {
    let flags = cur.read_i32()?;
    let history_pos = cur.position();
    let history_type = cur.read_u8()?;

    let history = match history_type {
        HISTORY_BASE => TextHistory::Base {
            namespace: read_save_string(cur)?,
            key: read_save_string(cur)?,
            source: read_save_string(cur)?,
        },
        HISTORY_NAMED_FORMAT | HISTORY_ORDERED_FORMAT => {
            let source = Box::new(read_text(cur)?);
            let count = cur.read_i32()?;
            let mut arguments = Vec::new();
            for _ in 0..count {
                let name = read_save_string(cur)?;
                let kind_pos = cur.position();
                let kind = cur.read_u8()?;
                if kind != ARGUMENT_KIND_TEXT {
                    return Err(SaveError::new(
                        SaveErrorCode::UnsupportedTextHistory,
                        format!("format argument kind {kind} at pos={kind_pos}"),
                    ));
                }
                arguments.push(FormatArgument {
                    name,
                    value: read_text(cur)?,
                });
            }
            TextHistory::Format {
                ordered: history_type == HISTORY_ORDERED_FORMAT,
                source,
                arguments,
            }
        }
        HISTORY_TRANSFORM => TextHistory::Transform {
            source: Box::new(read_text(cur)?),
            transform_kind: cur.read_u8()?,
        },
        HISTORY_STRING_TABLE_ENTRY => TextHistory::TableEntry {
            table_id: read_save_string(cur)?,
            text_key: read_save_string(cur)?,
        },
        HISTORY_CULTURE_INVARIANT => {
            let has_string = cur.read_i32()?;
            let value = if has_string == 1 {
                Some(read_save_string(cur)?)
            } else {
                None
            };
            TextHistory::CultureInvariant { value }
        }
        other => {
            return Err(SaveError::new(
                SaveErrorCode::UnsupportedTextHistory,
                format!("text history type {other} at pos={history_pos}"),
            ));
        }
    };

    Ok(TextValue { flags, history })
}

pub fn write_text(out: &mut Vec<u8>, text: &TextValue) {
    out.extend_from_slice(&text.flags.to_le_bytes());
    match &text.history {
        TextHistory::Base {
            namespace,
            key,
            source,
        } => {
            out.push(HISTORY_BASE);
            write_save_string(out, namespace);
            write_save_string(out, key);
            write_save_string(out, source);
        }
        TextHistory::Format {
            ordered,
            source,
            arguments,
        } => {
            out.push(if *ordered {
                HISTORY_ORDERED_FORMAT
            } else {
                HISTORY_NAMED_FORMAT
            });
            write_text(out, source);
            out.extend_from_slice(&(arguments.len() as i32).to_le_bytes());
            for argument in arguments {
                write_save_string(out, &argument.name);
                out.push(ARGUMENT_KIND_TEXT);
                write_text(out, &argument.value);
            }
        }
        TextHistory::Transform {
            source,
            transform_kind,
        } => {
            out.push(HISTORY_TRANSFORM);
            write_text(out, source);
            out.push(*transform_kind);
        }
        TextHistory::TableEntry { table_id, text_key } => {
            out.push(HISTORY_STRING_TABLE_ENTRY);
            write_save_string(out, table_id);
            write_save_string(out, text_key);
        }
        TextHistory::CultureInvariant { value } => {
            out.push(HISTORY_CULTURE_INVARIANT);
            match value {
                Some(value) => {
                    out.extend_from_slice(&1i32.to_le_bytes());
                    write_save_string(out, value);
                }
                None => out.extend_from_slice(&0i32.to_le_bytes()),
            }
        }
    }
}
