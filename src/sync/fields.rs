//! `#[Field]#` extraction from Dradis markup.
//!
//! Dradis stores structured data inside plain markup: a marker line
//! `#[Name]#` followed by the value on the next non-blank line. Everything in
//! here is pure text processing; no filesystem or network access.

use std::sync::LazyLock;

use regex::Regex;

/// Field holding the identity of issues and content blocks.
pub const TITLE_FIELD: &str = "Title";

/// Field persisted into evidence files once the remote id is known.
pub const EVIDENCE_ID_FIELD: &str = "EvidenceID";

static FIELD_WITH_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(#\[[^\r\n]*?\]#)[ \t]*[\r\n]+([^\r\n]+)").expect("field pattern is valid")
});

/// Extract the value of `#[name]#`.
///
/// The value is the first non-blank line after the marker line. A marker
/// line starts with `#[name]#`; a mention inside prose does not count.
/// Returns `None` when the marker is absent, or when the next non-blank line
/// is itself a marker (the field is empty).
#[must_use]
pub fn parse_field(text: &str, name: &str) -> Option<String> {
    let marker = format!("#[{name}]#");
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if !line.trim_start().starts_with(&marker) {
            continue;
        }

        let value = lines.find(|l| !l.trim().is_empty())?.trim();
        if value.starts_with("#[") {
            return None;
        }
        return Some(value.to_string());
    }

    None
}

/// The `#[Title]#` value.
#[must_use]
pub fn title(text: &str) -> Option<String> {
    parse_field(text, TITLE_FIELD)
}

/// The `#[EvidenceID]#` value.
#[must_use]
pub fn evidence_id(text: &str) -> Option<String> {
    parse_field(text, EVIDENCE_ID_FIELD)
}

/// Append an `#[EvidenceID]#` block to the end of `text`.
#[must_use]
pub fn append_evidence_id(text: &str, id: &str) -> String {
    format!("{text}\n#[{EVIDENCE_ID_FIELD}]#\n\n{id}\n")
}

/// Remove every `#[name]#` marker and its value line from `text`.
#[must_use]
pub fn strip_field(text: &str, name: &str) -> String {
    let pattern = format!(
        r"#\[{}\]#[^\r\n]*(?:\r?\n)*(?:[^\r\n#][^\r\n]*)?",
        regex::escape(name)
    );
    match Regex::new(&pattern) {
        Ok(block) => block.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Remove every `#[EvidenceID]#` block (marker and value) from `text`.
#[must_use]
pub fn strip_evidence_id(text: &str) -> String {
    strip_field(text, EVIDENCE_ID_FIELD)
}

/// Replace any existing `#[EvidenceID]#` with `id`.
#[must_use]
pub fn replace_evidence_id(text: &str, id: &str) -> String {
    let stripped = strip_evidence_id(text);
    let base = stripped.trim_end_matches(['\r', '\n']);
    append_evidence_id(&format!("{base}\n"), id)
}

/// Force exactly one blank line between each marker and its value.
///
/// Pandoc folds a marker and its value into one paragraph otherwise.
#[must_use]
pub fn space_fields(text: &str) -> String {
    FIELD_WITH_VALUE.replace_all(text, "$1\n\n$2").into_owned()
}
