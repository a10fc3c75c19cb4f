use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Result, SaveError, SaveErrorCode};
use crate::layout::{ArraySpan, ByteRange};
use crate::property::{ObjectReference, SaveString, write_references};
use crate::types::{STATION_ARRAY_NAME, TRAIN_ARRAY_NAME};

/// Remembers where the arrays of interest were found in the decoded body.
/// Only the first occurrence of each name is kept.
#[derive(Debug, Clone, Default)]
pub struct ArrayLocator {
    names: Vec<String>,
    spans: BTreeMap<String, ArraySpan>,
}

impl ArrayLocator {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            spans: BTreeMap::new(),
        }
    }

    pub fn for_rail_arrays() -> Self {
        Self::new([STATION_ARRAY_NAME, TRAIN_ARRAY_NAME])
    }

    pub fn observe(&mut self, name: &SaveString, start: usize, end: usize, element_count: usize) {
        let Some(tracked) = self.names.iter().find(|n| name.is(n)) else {
            return;
        };
        if self.spans.contains_key(tracked) {
            return;
        }
        debug!(array = %tracked, start, end, element_count, "array_span_recorded");
        self.spans.insert(
            tracked.clone(),
            ArraySpan {
                range: ByteRange { start, end },
                element_count,
            },
        );
    }

    pub fn span(&self, name: &str) -> Option<&ArraySpan> {
        self.spans.get(name)
    }

    pub fn spans(&self) -> impl Iterator<Item = (&str, &ArraySpan)> {
        self.spans.iter().map(|(name, span)| (name.as_str(), span))
    }
}

/// Returns a copy of `body` with the span's elements replaced by
/// `new_order`. The replacement must have the same count and byte length.
pub fn patch_array(
    body: &[u8],
    name: &str,
    span: &ArraySpan,
    new_order: &[ObjectReference],
) -> Result<Vec<u8>> {
    if new_order.len() != span.element_count {
        return Err(SaveError::new(
            SaveErrorCode::ArrayLengthMismatch,
            format!(
                "{name}: got {} elements, original has {}",
                new_order.len(),
                span.element_count
            ),
        ));
    }

    let mut replacement = Vec::with_capacity(span.range.len());
    write_references(&mut replacement, new_order);
    if replacement.len() != span.range.len() {
        return Err(SaveError::new(
            SaveErrorCode::ArrayByteLengthMismatch,
            format!(
                "{name}: new elements take {} bytes, original span is {}",
                replacement.len(),
                span.range.len()
            ),
        ));
    }
    if span.range.end > body.len() || span.range.start > span.range.end {
        return Err(SaveError::new(
            SaveErrorCode::OutOfRange,
            format!(
                "{name}: span {}..{} outside body of length {}",
                span.range.start,
                span.range.end,
                body.len()
            ),
        ));
    }

    let mut patched = Vec::with_capacity(body.len());
    patched.extend_from_slice(&body[..span.range.start]);
    patched.extend_from_slice(&replacement);
    patched.extend_from_slice(&body[span.range.end..]);
    Ok(patched)
}
