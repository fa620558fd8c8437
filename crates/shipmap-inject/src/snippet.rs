use std::sync::OnceLock;

use regex::Regex;
use shipmap_types::DebugId;

use crate::marker::debug_id_snippet;

/// Matches an optional shebang, leading whitespace and comments, and an
/// optional `"use strict"` directive.
fn prologue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"^(?:#![^\n]*(?:\n|$))?"#,
            r#"(?:\s|/\*[\s\S]*?\*/|//[^\n]*)*"#,
            r#"(?:"use strict"|'use strict')?;?"#,
        ))
        .expect("prologue regex is valid")
    })
}

/// A single text insertion into generated code.
///
/// Positions follow source map conventions: `line` is zero-based and
/// `column` counts UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionEdit {
    /// Byte offset of the insertion in the original code.
    pub offset: usize,
    /// Zero-based line of the insertion point.
    pub line: usize,
    /// UTF-16 column of the insertion point.
    pub column: usize,
    /// The inserted text.
    pub inserted: String,
}

impl InjectionEdit {
    /// Build an edit for inserting `inserted` at byte `offset` of `code`.
    pub fn at(code: &str, offset: usize, inserted: impl Into<String>) -> Self {
        let before = &code[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].encode_utf16().count();
        Self {
            offset,
            line,
            column,
            inserted: inserted.into(),
        }
    }

    /// Number of line breaks in the inserted text.
    pub fn added_lines(&self) -> usize {
        self.inserted.matches('\n').count()
    }

    /// UTF-16 width of the inserted text after its last line break.
    pub fn last_line_width(&self) -> usize {
        let tail = match self.inserted.rfind('\n') {
            Some(i) => &self.inserted[i + 1..],
            None => self.inserted.as_str(),
        };
        tail.encode_utf16().count()
    }
}

/// Code with an injected snippet and the edit that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Injection {
    pub code: String,
    pub edit: InjectionEdit,
}

/// Byte offset where a snippet should be inserted.
///
/// Returns the end of the prologue match: after a shebang, leading comments,
/// whitespace, and a `"use strict"` directive. Returns 0 if there is no
/// prologue.
pub fn insertion_offset(code: &str) -> usize {
    prologue_regex().find(code).map_or(0, |m| m.end())
}

/// Insert the debug-ID snippet for `id` into `code`.
pub fn inject_snippet(code: &str, id: &DebugId) -> Injection {
    let offset = insertion_offset(code);
    let snippet = debug_id_snippet(id);
    let edit = InjectionEdit::at(code, offset, snippet);

    let mut out = String::with_capacity(code.len() + edit.inserted.len());
    out.push_str(&code[..offset]);
    out.push_str(&edit.inserted);
    out.push_str(&code[offset..]);

    Injection { code: out, edit }
}
