//! Base64 VLQ handling for the source map `mappings` field.
//!
//! Segments are decoded into absolute values so that generated positions can
//! be moved freely, then re-encoded with the usual relative deltas.

use crate::error::{InjectError, InjectResult};
use crate::snippet::InjectionEdit;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_CONTINUATION: i64 = 1 << VLQ_BASE_SHIFT;
const VLQ_MASK: i64 = VLQ_CONTINUATION - 1;

/// Source map positions and indices are 32-bit values.
const MAX_VALUE: i64 = i32::MAX as i64;

/// One decoded mapping segment with absolute field values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Generated column (UTF-16 units).
    pub column: i64,
    /// Source index, original line, original column, and optional name index.
    /// Empty for segments that map to nothing.
    pub original: Vec<i64>,
}

fn base64_value(byte: u8) -> Option<i64> {
    BASE64.iter().position(|&b| b == byte).map(|p| p as i64)
}

fn decode_segment(text: &str, start: usize) -> InjectResult<Vec<i64>> {
    let mut values = Vec::with_capacity(5);
    let mut value: i64 = 0;
    let mut shift: u32 = 0;
    let mut pending = false;

    for (i, byte) in text.bytes().enumerate() {
        let digit = base64_value(byte).ok_or_else(|| InjectError::InvalidVlq {
            position: start + i,
            reason: format!("unexpected character {:?}", byte as char),
        })?;
        if shift > 30 {
            return Err(InjectError::InvalidVlq {
                position: start + i,
                reason: "value exceeds 32 bits".into(),
            });
        }
        value += (digit & VLQ_MASK) << shift;
        if digit & VLQ_CONTINUATION != 0 {
            shift += VLQ_BASE_SHIFT;
            pending = true;
        } else {
            let negative = value & 1 == 1;
            let magnitude = value >> 1;
            if magnitude > MAX_VALUE {
                return Err(InjectError::InvalidVlq {
                    position: start + i,
                    reason: "value exceeds 32 bits".into(),
                });
            }
            values.push(if negative { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
            pending = false;
        }
    }

    if pending {
        return Err(InjectError::InvalidVlq {
            position: start + text.len(),
            reason: "truncated segment".into(),
        });
    }
    if !matches!(values.len(), 1 | 4 | 5) {
        return Err(InjectError::InvalidVlq {
            position: start,
            reason: format!("segment has {} fields", values.len()),
        });
    }
    Ok(values)
}

fn accumulate(total: i64, delta: i64, position: usize) -> InjectResult<i64> {
    total
        .checked_add(delta)
        .filter(|v| (-MAX_VALUE - 1..=MAX_VALUE).contains(v))
        .ok_or_else(|| InjectError::InvalidVlq {
            position,
            reason: "accumulated value exceeds 32 bits".into(),
        })
}

/// Decode `mappings` into one vector of segments per generated line.
pub fn decode(mappings: &str) -> InjectResult<Vec<Vec<Segment>>> {
    let mut lines = Vec::new();
    // Source index, original line, original column, name index.
    let mut state = [0i64; 4];
    let mut offset = 0;

    for line_text in mappings.split(';') {
        let mut segments = Vec::new();
        let mut column = 0i64;
        let mut seg_offset = offset;
        for seg_text in line_text.split(',') {
            if !seg_text.is_empty() {
                let fields = decode_segment(seg_text, seg_offset)?;
                column = accumulate(column, fields[0], seg_offset)?;
                let mut original = Vec::with_capacity(4);
                for (slot, &delta) in fields[1..].iter().enumerate() {
                    state[slot] = accumulate(state[slot], delta, seg_offset)?;
                    original.push(state[slot]);
                }
                segments.push(Segment { column, original });
            }
            seg_offset += seg_text.len() + 1;
        }
        lines.push(segments);
        offset += line_text.len() + 1;
    }

    Ok(lines)
}

fn encode_value(out: &mut String, value: i64) {
    // Widened so that i64::MIN keeps its sign bit after the shift.
    let magnitude = u128::from(value.unsigned_abs()) << 1;
    let mut vlq = if value < 0 { magnitude | 1 } else { magnitude };
    loop {
        let mut digit = (vlq & VLQ_MASK as u128) as usize;
        vlq >>= VLQ_BASE_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION as usize;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Encode decoded lines back into a `mappings` string.
pub fn encode(lines: &[Vec<Segment>]) -> String {
    let mut out = String::new();
    let mut state = [0i64; 4];

    for (line_index, segments) in lines.iter().enumerate() {
        if line_index > 0 {
            out.push(';');
        }
        let mut column = 0i64;
        for (seg_index, segment) in segments.iter().enumerate() {
            if seg_index > 0 {
                out.push(',');
            }
            encode_value(&mut out, segment.column - column);
            column = segment.column;
            for (slot, value) in segment.original.iter().enumerate() {
                encode_value(&mut out, value - state[slot]);
                state[slot] = *value;
            }
        }
    }

    out
}

/// Move decoded segments to account for `edit`.
///
/// Segments on the edit's line at or after its column move past the inserted
/// text. Later lines move down by the number of inserted line breaks.
pub fn apply_edit(lines: &mut Vec<Vec<Segment>>, edit: &InjectionEdit) {
    if edit.line >= lines.len() {
        return;
    }
    let column = edit.column as i64;
    let added = edit.added_lines();
    let width = edit.last_line_width() as i64;

    if added == 0 {
        for segment in lines[edit.line].iter_mut().filter(|s| s.column >= column) {
            segment.column += width;
        }
        return;
    }

    let split_at = lines[edit.line]
        .iter()
        .position(|s| s.column >= column)
        .unwrap_or(lines[edit.line].len());
    let mut moved = lines[edit.line].split_off(split_at);
    for segment in &mut moved {
        segment.column = segment.column - column + width;
    }

    let insert_at = edit.line + 1;
    let mut inserted: Vec<Vec<Segment>> = vec![Vec::new(); added - 1];
    inserted.push(moved);
    lines.splice(insert_at..insert_at, inserted);
}

/// Re-encode `mappings` after the code it describes received `edit`.
pub fn shift_mappings(mappings: &str, edit: &InjectionEdit) -> InjectResult<String> {
    let mut lines = decode(mappings)?;
    apply_edit(&mut lines, edit);
    Ok(encode(&lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(line: usize, column: usize, inserted: &str) -> InjectionEdit {
        InjectionEdit {
            offset: 0,
            line,
            column,
            inserted: inserted.into(),
        }
    }

    #[test]
    fn decodes_known_mappings() {
        // [0,0,0,0], [4,0,0,4] on line 0; [0,0,1,0] on line 1.
        let lines = decode("AAAA,IAAI;AACA").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][0], Segment { column: 0, original: vec![0, 0, 0] });
        assert_eq!(lines[0][1], Segment { column: 4, original: vec![0, 0, 4] });
        assert_eq!(lines[1][0], Segment { column: 0, original: vec![0, 1, 4] });
    }

    #[test]
    fn encode_inverts_decode() {
        for mappings in ["AAAA,IAAI;AACA", ";;AAAA,SAASA;;GACAC", "", "A", "gBAAgB,6BAA6B"] {
            let lines = decode(mappings).unwrap();
            assert_eq!(encode(&lines), mappings, "mappings {mappings:?}");
        }
    }

    #[test]
    fn negative_values_encode() {
        let mut out = String::new();
        encode_value(&mut out, -1);
        assert_eq!(out, "D");
        out.clear();
        encode_value(&mut out, 16);
        assert_eq!(out, "gB");
    }

    #[test]
    fn same_line_insert_moves_later_segments() {
        let shifted = shift_mappings("AAAA,IAAI;AACA", &edit(0, 2, "xyz")).unwrap();
        let lines = decode(&shifted).unwrap();
        assert_eq!(lines[0][0].column, 0);
        assert_eq!(lines[0][1].column, 7);
        assert_eq!(lines[0][1].original, vec![0, 0, 4]);
        assert_eq!(lines[1][0].column, 0);
    }

    #[test]
    fn insert_at_segment_column_moves_that_segment() {
        let shifted = shift_mappings("AAAA", &edit(0, 0, "ab")).unwrap();
        let lines = decode(&shifted).unwrap();
        assert_eq!(lines[0][0].column, 2);
    }

    #[test]
    fn multi_line_insert_splits_the_line() {
        let shifted = shift_mappings("AAAA,IAAI;AACA", &edit(0, 2, "x\ny\nzz")).unwrap();
        let lines = decode(&shifted).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 1);
        assert!(lines[1].is_empty());
        assert_eq!(lines[2][0].column, 4 - 2 + 2);
        assert_eq!(lines[2][0].original, vec![0, 0, 4]);
        assert_eq!(lines[3][0].original, vec![0, 1, 4]);
    }

    #[test]
    fn edit_past_last_line_is_noop() {
        let shifted = shift_mappings("AAAA", &edit(5, 0, "abc")).unwrap();
        assert_eq!(shifted, "AAAA");
    }

    #[test]
    fn rejects_invalid_characters() {
        let err = decode("AA!A").unwrap_err();
        assert!(matches!(err, InjectError::InvalidVlq { position: 2, .. }));
    }

    #[test]
    fn rejects_truncated_segment() {
        assert!(decode("g").is_err());
    }

    #[test]
    fn rejects_bad_field_count() {
        assert!(decode("AA").is_err());
    }

    #[test]
    fn rejects_values_wider_than_32_bits() {
        let err = decode("ggggggggggggH,ggggggggggggH,ggggggggggggH").unwrap_err();
        assert!(matches!(err, InjectError::InvalidVlq { .. }), "{err:?}");
        assert!(shift_mappings("ggggggggggggH", &edit(0, 0, "x")).is_err());
    }

    #[test]
    fn rejects_columns_that_accumulate_past_32_bits() {
        let wide = vec![vec![
            Segment { column: 1 << 30, original: vec![] },
            Segment { column: 1 << 31, original: vec![] },
        ]];
        let mappings = encode(&wide);
        let err = decode(&mappings).unwrap_err();
        assert!(matches!(err, InjectError::InvalidVlq { .. }), "{err:?}");
    }

    #[test]
    fn encodes_extreme_values_without_overflow() {
        let mut out = String::new();
        encode_value(&mut out, i64::MIN);
        encode_value(&mut out, i64::MAX);
        assert!(!out.is_empty());
    }
}
