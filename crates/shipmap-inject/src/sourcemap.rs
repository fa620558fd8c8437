use serde_json::Value;
use shipmap_types::DebugId;

use crate::error::{InjectError, InjectResult};
use crate::mappings::shift_mappings;
use crate::snippet::InjectionEdit;

/// Top-level keys that carry the debug ID in a source map. Both spellings are
/// written so that older and newer consumers find it.
pub const DEBUG_ID_KEYS: [&str; 2] = ["debug_id", "debugId"];

/// Set both debug-ID keys on a parsed source map.
pub fn set_debug_id(map: &mut Value, id: &DebugId) -> InjectResult<()> {
    let object = map.as_object_mut().ok_or(InjectError::NotAnObject)?;
    for key in DEBUG_ID_KEYS {
        object.insert(key.to_string(), Value::String(id.to_string()));
    }
    Ok(())
}

/// Replay `edit` onto a parsed source map and tag it with `id`.
///
/// A map without a string `mappings` field is only tagged.
pub fn adjust_source_map(map: &mut Value, edit: &InjectionEdit, id: &DebugId) -> InjectResult<()> {
    let object = map.as_object_mut().ok_or(InjectError::NotAnObject)?;
    let shifted = match object.get("mappings") {
        Some(Value::String(mappings)) => Some(shift_mappings(mappings, edit)?),
        _ => None,
    };
    if let Some(shifted) = shifted {
        object.insert("mappings".into(), Value::String(shifted));
    }
    set_debug_id(map, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> DebugId {
        DebugId::parse("c315b2d7-ef4b-4a2b-8e78-3c2d43264d99").unwrap()
    }

    #[test]
    fn sets_both_keys() {
        let mut map = json!({"version": 3, "sources": [], "mappings": ""});
        set_debug_id(&mut map, &id()).unwrap();
        assert_eq!(map["debug_id"], "c315b2d7-ef4b-4a2b-8e78-3c2d43264d99");
        assert_eq!(map["debugId"], "c315b2d7-ef4b-4a2b-8e78-3c2d43264d99");
    }

    #[test]
    fn rejects_non_object() {
        let mut map = json!([1, 2, 3]);
        assert!(matches!(set_debug_id(&mut map, &id()), Err(InjectError::NotAnObject)));
    }

    #[test]
    fn shifts_mappings_and_tags() {
        let mut map = json!({"version": 3, "mappings": "AAAA,IAAI"});
        let edit = InjectionEdit::at("var a;", 0, "xy");
        adjust_source_map(&mut map, &edit, &id()).unwrap();
        assert_eq!(map["mappings"], "EAAA,IAAI");
        assert_eq!(map["debugId"], "c315b2d7-ef4b-4a2b-8e78-3c2d43264d99");
    }

    #[test]
    fn map_without_mappings_is_only_tagged() {
        let mut map = json!({"version": 3});
        let edit = InjectionEdit::at("x", 0, "y");
        adjust_source_map(&mut map, &edit, &id()).unwrap();
        assert!(map.get("mappings").is_none());
        assert_eq!(map["debug_id"], "c315b2d7-ef4b-4a2b-8e78-3c2d43264d99");
    }

    #[test]
    fn invalid_mappings_propagate() {
        let mut map = json!({"mappings": "!!"});
        let edit = InjectionEdit::at("x", 0, "y");
        assert!(matches!(
            adjust_source_map(&mut map, &edit, &id()),
            Err(InjectError::InvalidVlq { .. })
        ));
    }
}
