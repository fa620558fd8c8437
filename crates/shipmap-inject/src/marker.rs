use std::sync::OnceLock;

use regex::Regex;
use shipmap_types::DebugId;

/// Literal prefix that precedes the debug ID inside injected code.
pub const MARKER_PREFIX: &str = "shipmap-dbid-";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            "shipmap-dbid-",
            "([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})"
        ))
        .expect("marker regex is valid")
    })
}

/// Build the runtime snippet for `id`.
///
/// The snippet registers the id on the global object under the current stack
/// trace, so the runtime can attach it to reported frames. It is a single line,
/// swallows any exception, and starts with `;` so it cannot merge with a
/// preceding expression.
pub fn debug_id_snippet(id: &DebugId) -> String {
    format!(
        concat!(
            ";{{try{{(function(){{",
            "var e=\"undefined\"!=typeof window?window:",
            "\"undefined\"!=typeof global?global:",
            "\"undefined\"!=typeof globalThis?globalThis:",
            "\"undefined\"!=typeof self?self:{{}},",
            "n=(new e.Error).stack;",
            "n&&(e._shipmapDebugIds=e._shipmapDebugIds||{{}},",
            "e._shipmapDebugIds[n]=\"{id}\",",
            "e._shipmapDebugIdIdentifier=\"{prefix}{id}\")",
            "}})();}}catch(e){{}}}};"
        ),
        id = id,
        prefix = MARKER_PREFIX,
    )
}

/// Find the first marker in `code` and return its debug ID.
pub fn extract_debug_id(code: &str) -> Option<DebugId> {
    marker_regex()
        .captures(code)
        .and_then(|caps| caps.get(1))
        .and_then(|m| DebugId::parse(m.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DebugId {
        DebugId::parse("c315b2d7-ef4b-4a2b-8e78-3c2d43264d99").unwrap()
    }

    #[test]
    fn snippet_embeds_marker() {
        let snippet = debug_id_snippet(&id());
        assert!(snippet.contains("shipmap-dbid-c315b2d7-ef4b-4a2b-8e78-3c2d43264d99"));
        assert!(snippet.starts_with(";{try{"));
        assert!(snippet.ends_with("catch(e){}};"));
        assert!(!snippet.contains('\n'));
    }

    #[test]
    fn snippet_braces_balance() {
        let snippet = debug_id_snippet(&id());
        let open = snippet.matches('{').count();
        let close = snippet.matches('}').count();
        assert_eq!(open, close);
    }

    #[test]
    fn extracts_from_snippet() {
        let code = format!("{}console.log(1);", debug_id_snippet(&id()));
        assert_eq!(extract_debug_id(&code), Some(id()));
    }

    #[test]
    fn extracts_uppercase_marker() {
        let code = "x=\"shipmap-dbid-C315B2D7-EF4B-4A2B-8E78-3C2D43264D99\"";
        assert_eq!(extract_debug_id(code), Some(id()));
    }

    #[test]
    fn no_marker_yields_none() {
        assert_eq!(extract_debug_id("console.log('plain');"), None);
        assert_eq!(extract_debug_id("shipmap-dbid-not-a-uuid"), None);
    }

    #[test]
    fn first_marker_wins() {
        let other = DebugId::parse("e3b0c442-98fc-4c14-9afb-f4c8996fb924").unwrap();
        let code = format!("{}{}", debug_id_snippet(&id()), debug_id_snippet(&other));
        assert_eq!(extract_debug_id(&code), Some(id()));
    }
}
