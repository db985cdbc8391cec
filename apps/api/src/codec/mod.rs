//! Section codec: converts between delimiter-sectioned resume text and a
//! [`ResumeDocument`].
//!
//! A section starts at a line of exactly `=== <name> ===` and runs until the
//! next such line or the end of input. Every caller (upload, manual entry,
//! form entry, export, LLM submission) goes through this module.
//!
//! Body lines that happen to match the delimiter grammar are read back as new
//! section boundaries. There is no escaping.

pub mod document;

pub use document::{validate_section_name, ResumeDocument, SectionNameError};

use serde::{Deserialize, Serialize};

const DELIMITER_OPEN: &str = "=== ";
const DELIMITER_CLOSE: &str = " ===";

/// Output shape for re-flattening a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeMode {
    /// Bodies only, separated by a blank line. Used for LLM submission.
    #[default]
    Flat,
    /// Delimiter line + body per section. Decodes back to the same document.
    Delimited,
}

/// Returns the section name if `line` is a delimiter line.
pub fn parse_delimiter(line: &str) -> Option<&str> {
    line.strip_prefix(DELIMITER_OPEN)?
        .strip_suffix(DELIMITER_CLOSE)
        .filter(|name| validate_section_name(name).is_ok())
}

pub fn delimiter_line(name: &str) -> String {
    format!("{DELIMITER_OPEN}{name}{DELIMITER_CLOSE}")
}

enum DecodeState<'a> {
    NoSectionOpen,
    SectionOpen { name: &'a str, lines: Vec<&'a str> },
}

impl DecodeState<'_> {
    /// Emits the open section into `doc` unless its body is empty.
    fn close_into(self, doc: &mut ResumeDocument) {
        if let DecodeState::SectionOpen { name, lines } = self {
            let body = lines.join("\n");
            if !body.is_empty() {
                doc.append_section(name, &body);
            }
        }
    }
}

/// Splits `text` into sections. Never fails.
///
/// Content before the first delimiter is discarded. Sections with an empty
/// body are dropped. A repeated name appends its body to the first
/// occurrence. A delimiter line may end in `\r`; body lines are kept
/// byte for byte, `\r` included.
pub fn decode(text: &str) -> ResumeDocument {
    let mut doc = ResumeDocument::new();
    let mut state = DecodeState::NoSectionOpen;

    for line in text.split('\n') {
        if let Some(name) = parse_delimiter(line.strip_suffix('\r').unwrap_or(line)) {
            let previous = std::mem::replace(
                &mut state,
                DecodeState::SectionOpen {
                    name,
                    lines: Vec::new(),
                },
            );
            previous.close_into(&mut doc);
            continue;
        }

        if let DecodeState::SectionOpen { lines, .. } = &mut state {
            lines.push(line);
        }
    }

    state.close_into(&mut doc);
    doc
}

/// Joins section bodies with one blank line; names are dropped.
pub fn encode_flat(doc: &ResumeDocument) -> String {
    doc.bodies().collect::<Vec<_>>().join("\n\n")
}

/// Writes each section as its delimiter line followed by its body.
pub fn encode_delimited(doc: &ResumeDocument) -> String {
    doc.iter()
        .map(|(name, body)| format!("{}\n{}", delimiter_line(name), body))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn encode(doc: &ResumeDocument, mode: EncodeMode) -> String {
    match mode {
        EncodeMode::Flat => encode_flat(doc),
        EncodeMode::Delimited => encode_delimited(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sections(doc: &ResumeDocument) -> Vec<(&str, &str)> {
        doc.iter().collect()
    }

    #[test]
    fn test_decode_contact_and_skills() {
        let text = "=== Contact Information ===\n\
                    John Doe\n\
                    john@example.com\n\
                    \n\
                    === Skills ===\n\
                    Python\n\
                    JavaScript";
        let doc = decode(text);
        assert_eq!(
            sections(&doc),
            vec![
                ("Contact Information", "John Doe\njohn@example.com\n"),
                ("Skills", "Python\nJavaScript"),
            ]
        );
    }

    #[test]
    fn test_decode_without_delimiters_is_empty() {
        assert!(decode("Just some text with no delimiters").is_empty());
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_decode_drops_empty_section() {
        let doc = decode("=== A ===\n=== B ===\ncontent for B");
        assert_eq!(sections(&doc), vec![("B", "content for B")]);
    }

    #[test]
    fn test_decode_drops_trailing_empty_section() {
        let doc = decode("=== A ===\nbody\n=== B ===");
        assert_eq!(sections(&doc), vec![("A", "body")]);
    }

    #[test]
    fn test_decode_single_blank_line_counts_as_empty() {
        let doc = decode("=== A ===\n\n=== B ===\nx");
        assert_eq!(sections(&doc), vec![("B", "x")]);
    }

    #[test]
    fn test_decode_discards_preamble() {
        let doc = decode("Jane Roe\nSeattle\n=== Summary ===\nEngineer");
        assert_eq!(sections(&doc), vec![("Summary", "Engineer")]);
    }

    #[test]
    fn test_decode_duplicate_name_appends_to_first() {
        let doc = decode("=== A ===\nx\n=== B ===\ny\n=== A ===\nz");
        assert_eq!(sections(&doc), vec![("A", "x\nz"), ("B", "y")]);
    }

    #[test]
    fn test_decode_accepts_crlf_delimiters_and_keeps_body_bytes() {
        let doc = decode("=== Skills ===\r\nRust\r\nGo\r\n=== Tools ===\r\nCargo");
        assert_eq!(sections(&doc), vec![("Skills", "Rust\r\nGo\r"), ("Tools", "Cargo")]);
    }

    #[test]
    fn test_body_carriage_returns_survive_round_trip() {
        let doc = ResumeDocument::from_pairs([("A", "line one\r\nline two"), ("B", "tail\r")])
            .unwrap();
        assert_eq!(decode(&encode_delimited(&doc)), doc);
    }

    #[test]
    fn test_doubled_carriage_return_is_body_not_delimiter() {
        let once = decode("=== A ===\nx\r\r\n=== B ===\r\r");
        assert_eq!(sections(&once), vec![("A", "x\r\r\n=== B ===\r\r")]);
        assert_eq!(decode(&encode_delimited(&once)), once);
    }

    #[test]
    fn test_delimiter_precision() {
        assert_eq!(parse_delimiter("=== Foo ==="), Some("Foo"));
        assert_eq!(parse_delimiter("===  Padded  ==="), Some(" Padded "));
        assert_eq!(parse_delimiter("==Foo=="), None);
        assert_eq!(parse_delimiter("===Foo==="), None);
        assert_eq!(parse_delimiter("=== Foo === "), None);
        assert_eq!(parse_delimiter(" === Foo ==="), None);
        assert_eq!(parse_delimiter("=== ==="), None);
        assert_eq!(parse_delimiter("===  ==="), None);

        let doc = decode("=== A ===\n==Foo==\n===Bar===");
        assert_eq!(sections(&doc), vec![("A", "==Foo==\n===Bar===")]);
    }

    #[test]
    fn test_encode_flat_joins_with_blank_line() {
        let doc = ResumeDocument::from_pairs([("A", "foo"), ("B", "bar")]).unwrap();
        assert_eq!(encode_flat(&doc), "foo\n\nbar");
        assert_eq!(encode_flat(&ResumeDocument::new()), "");
    }

    #[test]
    fn test_encode_delimited_layout() {
        let doc = ResumeDocument::from_pairs([("A", "foo"), ("B", "bar\nbaz")]).unwrap();
        assert_eq!(encode_delimited(&doc), "=== A ===\nfoo\n=== B ===\nbar\nbaz");
        assert_eq!(encode(&doc, EncodeMode::Flat), encode_flat(&doc));
    }

    #[test]
    fn test_body_delimiter_collision_splits_section() {
        let doc = ResumeDocument::from_pairs([("Notes", "see below\n=== Fake ===\ntail")])
            .unwrap();
        let reread = decode(&encode_delimited(&doc));
        assert_eq!(sections(&reread), vec![("Notes", "see below"), ("Fake", "tail")]);
    }

    #[test]
    fn test_encode_mode_serde() {
        let mode: EncodeMode = serde_json::from_str(r#""delimited""#).unwrap();
        assert_eq!(mode, EncodeMode::Delimited);
        assert_eq!(EncodeMode::default(), EncodeMode::Flat);
    }

    fn is_delimiter_like(line: &str) -> bool {
        parse_delimiter(line.strip_suffix('\r').unwrap_or(line)).is_some()
    }

    fn body_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z0-9 =\r.,:;@()-]{0,16}", 1..5)
            .prop_map(|lines| lines.join("\n"))
            .prop_filter("non-empty body", |body| !body.is_empty())
            .prop_filter("no delimiter-like body line", |body| {
                !body.split('\n').any(is_delimiter_like)
            })
    }

    fn document_strategy() -> impl Strategy<Value = ResumeDocument> {
        prop::collection::vec(("[A-Za-z =]{1,12}", body_strategy()), 0..6).prop_map(
            |pairs| ResumeDocument::from_pairs(pairs).expect("generated names are valid"),
        )
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-C =]{1,3}".prop_map(|name| delimiter_line(&name)),
            "[A-C]".prop_map(|name| format!("{}\r", delimiter_line(&name))),
            "[A-C]".prop_map(|name| format!("{}\r\r", delimiter_line(&name))),
            "[a-z =\r]{0,8}",
            Just(String::new()),
            Just("\r".to_string()),
            Just("==A==".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_delimited_round_trip(doc in document_strategy()) {
            prop_assert_eq!(decode(&encode_delimited(&doc)), doc);
        }

        #[test]
        fn prop_decode_is_fixed_point_after_first_pass(
            lines in prop::collection::vec(line_strategy(), 0..12)
        ) {
            let once = decode(&lines.join("\n"));
            let twice = decode(&encode_delimited(&once));
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn prop_sections_follow_delimiter_order(
            names in prop::collection::vec("[a-z]{1,6}", 0..6)
        ) {
            let mut seen = std::collections::HashSet::new();
            let unique: Vec<String> = names
                .into_iter()
                .filter(|n| seen.insert(n.clone()))
                .collect();

            let text: Vec<String> = unique
                .iter()
                .map(|n| format!("{}\nbody of {}", delimiter_line(n), n))
                .collect();
            let doc = decode(&text.join("\n"));
            let decoded: Vec<&str> = doc.names().collect();
            let expected: Vec<&str> = unique.iter().map(String::as_str).collect();
            prop_assert_eq!(decoded, expected);
        }
    }
}
