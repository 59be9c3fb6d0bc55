//! Parser for the Lingo line-oriented localization format.
//!
//! Source text is consumed line by line: each trimmed, non-empty,
//! non-comment line either transitions the block state machine or produces
//! a message entry. Lines that match no recognized pattern are dropped, and
//! a block still open at end of input is discarded without an entry, so
//! parsing never fails on content.

use std::collections::BTreeMap;

use crate::{
    error::Error,
    traits::Parse,
    types::{Document, Message, MessageKind, Metadata},
};

/// Block the parser is currently inside. Each variant owns its own buffer,
/// so one state can never carry another state's leftovers.
enum State {
    Default,
    Meta { lines: Vec<String> },
    Plural { key: String, lines: Vec<String> },
    Choice { key: String, lines: Vec<String> },
    Array { key: String, fragments: Vec<String> },
}

impl Parse for Document {
    fn from_reader<R: std::io::BufRead>(reader: R) -> Result<Self, Error> {
        let source = reader.lines().collect::<Result<Vec<_>, _>>()?.join("\n");
        Ok(parse(&source))
    }
}

/// Parses Lingo source text into a [`Document`].
///
/// Pure function of the input. A later duplicate assignment to the same
/// fully-qualified key overwrites the earlier one.
pub fn parse(source: &str) -> Document {
    let mut doc = Document::default();
    let mut namespace = String::new();
    let mut state = State::Default;

    for line in logical_lines(source) {
        state = match state {
            State::Default => step_default(line, &mut namespace, &mut doc),
            State::Meta { mut lines } => {
                lines.push(line.to_string());
                if line.contains('}') {
                    for buffered in &lines {
                        apply_meta_pairs(buffered, &mut doc.metadata);
                    }
                    State::Default
                } else {
                    State::Meta { lines }
                }
            }
            State::Plural { key, mut lines } => {
                if line.starts_with('}') {
                    doc.insert(build_plural(key, &lines));
                    State::Default
                } else {
                    lines.push(line.to_string());
                    State::Plural { key, lines }
                }
            }
            State::Choice { key, mut lines } => {
                if line.starts_with('}') {
                    doc.insert(build_choice(key, &lines));
                    State::Default
                } else {
                    lines.push(line.to_string());
                    State::Choice { key, lines }
                }
            }
            State::Array { key, mut fragments } => {
                fragments.push(line.to_string());
                if line.ends_with(']') {
                    doc.insert(build_array(key, &fragments));
                    State::Default
                } else {
                    State::Array { key, fragments }
                }
            }
        };
    }

    doc
}

/// The scanner: trimmed, non-empty, non-comment lines.
fn logical_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn step_default(line: &str, namespace: &mut String, doc: &mut Document) -> State {
    if let Some(rest) = line.strip_prefix("@meta") {
        // A brace-matched body on the same line is consumed in place.
        if let Some(body) = brace_body(rest) {
            apply_meta_pairs(body, &mut doc.metadata);
            return State::Default;
        }
        let mut lines = Vec::new();
        if !rest.trim().is_empty() {
            lines.push(rest.to_string());
        }
        return State::Meta { lines };
    }

    if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
        let interior = line[1..line.len() - 1].trim();
        if is_namespace(interior) {
            // empty interior clears the scope
            *namespace = interior.to_string();
        }
        return State::Default;
    }

    let Some((key_part, value)) = split_assignment(line) else {
        return State::Default;
    };

    // The inheritance form wins over every other assignment form.
    if let Some((key, parent)) = split_inheritance(key_part) {
        let value = strip_quote_layer(value);
        doc.insert(Message {
            key: qualify(namespace, key),
            kind: MessageKind::Plain,
            raw_value: value.to_string(),
            choices: BTreeMap::new(),
            inherits_from: Some(parent.to_string()),
            has_conditional: value.contains('?'),
        });
        return State::Default;
    }

    let key = qualify(namespace, key_part);

    if value.starts_with("plural(") {
        if let Some(body) = brace_body(value) {
            doc.insert(plural_message(key, scan_plural_arms(body)));
            return State::Default;
        }
        return State::Plural {
            key,
            lines: vec![value.to_string()],
        };
    }

    if let Some(after_arrow) = choice_marker(value) {
        if let Some(body) = brace_body(after_arrow) {
            doc.insert(choice_message(key, scan_choice_arms(body)));
            return State::Default;
        }
        return State::Choice {
            key,
            lines: vec![value.to_string()],
        };
    }

    if value.starts_with('[') {
        if value.ends_with(']') {
            // single-line array literal, kept verbatim; resolution strips
            // the bracket layer
            doc.insert(array_message(key, value.to_string()));
            return State::Default;
        }
        return State::Array {
            key,
            fragments: vec![value.to_string()],
        };
    }

    let value = strip_quote_layer(value);
    doc.insert(Message {
        key,
        kind: MessageKind::Plain,
        raw_value: value.to_string(),
        choices: BTreeMap::new(),
        inherits_from: None,
        has_conditional: value.contains('?'),
    });
    State::Default
}

/// Splits `key = value` at the first `=`. Both sides must be non-empty
/// after trimming.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

/// Splits `actualKey : parentKey` at the first `:`.
fn split_inheritance(key: &str) -> Option<(&str, &str)> {
    let (actual, parent) = key.split_once(':')?;
    let (actual, parent) = (actual.trim(), parent.trim());
    (!actual.is_empty() && !parent.is_empty()).then_some((actual, parent))
}

/// A choice assignment carries `->` followed, after whitespace, by nothing
/// (block form) or by the arm body. Arrows embedded in ordinary text do not
/// count. Returns the text after the arrow.
fn choice_marker(value: &str) -> Option<&str> {
    let idx = value.find("->")?;
    let rest = value[idx + 2..].trim_start();
    (rest.is_empty() || rest.starts_with('{')).then_some(rest)
}

/// Text between the first `{` and its matching `}`, when the match closes
/// within `s`. Depth-counted, since arm templates contain `{name}`
/// placeholders of their own.
fn brace_body(s: &str) -> Option<&str> {
    let open = s.find('{')?;
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn qualify(namespace: &str, key: &str) -> String {
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", namespace, key)
    }
}

/// Namespace headers carry an identifier interior (or nothing, to clear).
/// Any other bracketed line is dropped whole, like the other malformed
/// lines, and never reaches the assignment match.
fn is_namespace(interior: &str) -> bool {
    interior
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Strips one layer of enclosing double quotes, when present on both ends.
fn strip_quote_layer(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Finds every `identifier = "value"` pair in a line. Values are plain
/// quoted strings without escapes; several pairs may share one line.
fn scan_quoted_pairs(line: &str) -> Vec<(String, String)> {
    let bytes = line.as_bytes();
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !is_word_byte(bytes[i]) {
            i += 1;
            continue;
        }
        let ident_start = i;
        while i < bytes.len() && is_word_byte(bytes[i]) {
            i += 1;
        }
        let ident_end = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'"' {
            continue;
        }
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != b'"' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        if i > value_start {
            pairs.push((
                line[ident_start..ident_end].to_string(),
                line[value_start..i].to_string(),
            ));
        }
        i += 1;
    }
    pairs
}

/// Assigns recognized settings into the metadata; unrecognized pairs are
/// ignored.
fn apply_meta_pairs(text: &str, metadata: &mut Metadata) {
    for (key, value) in scan_quoted_pairs(text) {
        match key.as_str() {
            "locale" => metadata.locale = value,
            "plural_rules" => metadata.plural_rules = value,
            "direction" => metadata.direction = value,
            _ => {}
        }
    }
}

/// Matches a whole plural arm line: `label: "text"`. The label is word
/// characters with the colon attached; the quoted text runs to end of line.
fn parse_plural_arm(line: &str) -> Option<(String, String)> {
    let (label, rest) = line.split_once(':')?;
    if label.is_empty() || !label.bytes().all(is_word_byte) {
        return None;
    }
    let text = rest.trim_start().strip_prefix('"')?.strip_suffix('"')?;
    if text.is_empty() || text.contains('"') {
        return None;
    }
    Some((label.to_string(), text.to_string()))
}

/// Finds `label: "text"` arms anywhere in an inline plural body.
fn scan_plural_arms(body: &str) -> BTreeMap<String, String> {
    let bytes = body.as_bytes();
    let mut arms = BTreeMap::new();
    let mut i = 0;
    while i < bytes.len() {
        if !is_word_byte(bytes[i]) {
            i += 1;
            continue;
        }
        let label_start = i;
        while i < bytes.len() && is_word_byte(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b':' {
            continue;
        }
        let label = &body[label_start..i];
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'"' {
            continue;
        }
        i += 1;
        let text_start = i;
        while i < bytes.len() && bytes[i] != b'"' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        if i > text_start {
            arms.insert(label.to_string(), body[text_start..i].to_string());
        }
        i += 1;
    }
    arms
}

/// Matches a choice arm line: `[label] text`, or the `*[other] text`
/// default-arm form. One quote layer is stripped from the text.
fn parse_choice_arm(line: &str) -> Option<(String, String)> {
    if let Some(rest) = line.strip_prefix('[') {
        let (label, text) = rest.split_once(']')?;
        let label = label.trim();
        let text = text.trim();
        if label.is_empty() || text.is_empty() {
            return None;
        }
        Some((label.to_string(), strip_quote_layer(text).to_string()))
    } else if let Some(rest) = line.strip_prefix("*[other]") {
        Some((
            "other".to_string(),
            strip_quote_layer(rest.trim()).to_string(),
        ))
    } else {
        None
    }
}

/// Finds `[label] text` arms in an inline choice body. An arm's text runs to
/// the next arm opener. Starred arms other than `*[other]` are consumed but
/// dropped, as in the block form.
fn scan_choice_arms(body: &str) -> BTreeMap<String, String> {
    let mut arms = BTreeMap::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        let starred = rest.starts_with("*[");
        if !starred && !rest.starts_with('[') {
            match rest.find('[') {
                Some(idx) => {
                    let starred_at = idx > 0 && rest.as_bytes()[idx - 1] == b'*';
                    rest = &rest[idx - usize::from(starred_at)..];
                    continue;
                }
                None => break,
            }
        }
        let after = if starred { &rest[2..] } else { &rest[1..] };
        let Some((label, tail)) = after.split_once(']') else {
            break;
        };
        let label = label.trim();
        let text_end = next_arm_offset(tail);
        let text = tail[..text_end].trim();
        if !label.is_empty() && !text.is_empty() && (!starred || label == "other") {
            arms.insert(label.to_string(), strip_quote_layer(text).to_string());
        }
        rest = &tail[text_end..];
    }
    arms
}

/// Offset in `tail` where the next `[label]` or `*[label]` arm begins.
fn next_arm_offset(tail: &str) -> usize {
    let bytes = tail.as_bytes();
    for i in 0..bytes.len() {
        let starred = bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'[';
        if (bytes[i] == b'[' || starred) && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return i;
        }
    }
    bytes.len()
}

/// Block-form plural close: every buffered line except the opening
/// `plural(...)` line is matched as an arm.
fn build_plural(key: String, lines: &[String]) -> Message {
    let mut choices = BTreeMap::new();
    for line in lines.iter().skip(1) {
        if let Some((label, text)) = parse_plural_arm(line) {
            choices.insert(label, text);
        }
    }
    plural_message(key, choices)
}

/// Block-form choice close: every buffered line is matched as an arm; the
/// opening `... ->` line matches nothing and falls away.
fn build_choice(key: String, lines: &[String]) -> Message {
    let mut choices = BTreeMap::new();
    for line in lines {
        if let Some((label, text)) = parse_choice_arm(line) {
            choices.insert(label, text);
        }
    }
    choice_message(key, choices)
}

/// Array close: all fragments, opening and closing included, joined with
/// single spaces.
fn build_array(key: String, fragments: &[String]) -> Message {
    array_message(key, fragments.join(" "))
}

fn plural_message(key: String, choices: BTreeMap<String, String>) -> Message {
    Message {
        key,
        kind: MessageKind::Plural,
        raw_value: String::new(),
        choices,
        inherits_from: None,
        has_conditional: false,
    }
}

fn choice_message(key: String, choices: BTreeMap<String, String>) -> Message {
    Message {
        key,
        kind: MessageKind::Choice,
        raw_value: String::new(),
        choices,
        inherits_from: None,
        has_conditional: false,
    }
}

fn array_message(key: String, raw_value: String) -> Message {
    Message {
        key,
        kind: MessageKind::Plain,
        raw_value,
        choices: BTreeMap::new(),
        inherits_from: None,
        has_conditional: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_assignment_strips_quotes() {
        let doc = parse(r#"greet = "Hello, {name}!""#);
        let message = doc.get("greet").unwrap();
        assert_eq!(message.kind, MessageKind::Plain);
        assert_eq!(message.raw_value, "Hello, {name}!");
        assert!(!message.has_conditional);
    }

    #[test]
    fn test_parse_unquoted_value_kept_verbatim() {
        let doc = parse("greet = Hello there");
        assert_eq!(doc.get("greet").unwrap().raw_value, "Hello there");
    }

    #[test]
    fn test_parse_skips_comments_blanks_and_malformed_lines() {
        let doc = parse(
            "# header comment\n\n   \ngood = \"yes\"\nthis line has no separator\n= nokey\nnovalue =\n",
        );
        assert_eq!(doc.len(), 1);
        assert!(doc.contains_key("good"));
    }

    #[test]
    fn test_parse_conditional_flag() {
        let doc = parse(r#"msg = "{n == 1 ? 'one' : 'many'}""#);
        assert!(doc.get("msg").unwrap().has_conditional);
    }

    #[test]
    fn test_parse_inheritance_key_split() {
        let doc = parse(r#"child : base = "{parent}, world""#);
        let message = doc.get("child").unwrap();
        assert_eq!(message.inherits_from.as_deref(), Some("base"));
        assert_eq!(message.raw_value, "{parent}, world");
    }

    #[test]
    fn test_parse_namespace_qualifies_and_clears() {
        let doc = parse("[ui]\ngreet = \"Hi\"\n[]\nbye = \"Bye\"");
        assert!(doc.contains_key("ui.greet"));
        assert!(!doc.contains_key("greet"));
        assert!(doc.contains_key("bye"));
    }

    #[test]
    fn test_parse_meta_block() {
        let doc = parse(
            "@meta\n{\nlocale = \"ar-EG\"\ndirection = \"rtl\"\nflavor = \"ignored\"\n}\nk = \"v\"",
        );
        assert_eq!(doc.metadata.locale, "ar-EG");
        assert_eq!(doc.metadata.direction, "rtl");
        assert_eq!(doc.metadata.plural_rules, "cardinal");
        assert!(doc.contains_key("k"));
    }

    #[test]
    fn test_parse_meta_single_line() {
        let doc =
            parse(r#"@meta { locale = "fr-FR" plural_rules = "cardinal" direction = "ltr" }"#);
        assert_eq!(doc.metadata.locale, "fr-FR");
    }

    #[test]
    fn test_parse_plural_block() {
        let doc = parse("items = plural(count) {\none: \"1 item\"\nother: \"{count} items\"\n}");
        let message = doc.get("items").unwrap();
        assert_eq!(message.kind, MessageKind::Plural);
        assert_eq!(message.choice_text("one"), Some("1 item"));
        assert_eq!(message.choice_text("other"), Some("{count} items"));
        assert!(message.raw_value.is_empty());
    }

    #[test]
    fn test_parse_plural_inline() {
        let doc = parse(r#"items = plural(count) { one: "1 item" other: "{count} items" }"#);
        let message = doc.get("items").unwrap();
        assert_eq!(message.kind, MessageKind::Plural);
        assert_eq!(message.choice_text("one"), Some("1 item"));
        assert_eq!(message.choice_text("other"), Some("{count} items"));
    }

    #[test]
    fn test_parse_choice_block_with_default_arm() {
        let doc = parse(
            "pronoun = {gender} -> {\n[male] \"He\"\n[female] \"She\"\n*[other] \"They\"\n}",
        );
        let message = doc.get("pronoun").unwrap();
        assert_eq!(message.kind, MessageKind::Choice);
        assert_eq!(message.choice_text("male"), Some("He"));
        assert_eq!(message.choice_text("female"), Some("She"));
        assert_eq!(message.choice_text("other"), Some("They"));
    }

    #[test]
    fn test_parse_choice_inline() {
        let doc = parse(r#"pronoun = {gender} -> { [male] "He" [female] "She" *[other] "They" }"#);
        let message = doc.get("pronoun").unwrap();
        assert_eq!(message.kind, MessageKind::Choice);
        assert_eq!(message.choice_text("male"), Some("He"));
        assert_eq!(message.choice_text("other"), Some("They"));
    }

    #[test]
    fn test_parse_choice_starred_non_other_dropped() {
        let doc = parse("pronoun = {gender} -> {\n*[misc] \"x\"\n*[other] \"They\"\n}");
        let message = doc.get("pronoun").unwrap();
        assert!(message.choice_text("misc").is_none());
        assert_eq!(message.choice_text("other"), Some("They"));
    }

    #[test]
    fn test_arrow_in_plain_text_is_not_a_choice() {
        let doc = parse(r#"hint = "press a -> b""#);
        let message = doc.get("hint").unwrap();
        assert_eq!(message.kind, MessageKind::Plain);
        assert_eq!(message.raw_value, "press a -> b");
    }

    #[test]
    fn test_parse_array_single_line() {
        let doc = parse("tags = [alpha beta gamma]");
        let message = doc.get("tags").unwrap();
        assert_eq!(message.kind, MessageKind::Plain);
        assert_eq!(message.raw_value, "[alpha beta gamma]");
        assert!(!message.has_conditional);
    }

    #[test]
    fn test_parse_array_block_joined_with_spaces() {
        let doc = parse("tags = [\nalpha\nbeta\ngamma\n]");
        assert_eq!(doc.get("tags").unwrap().raw_value, "[ alpha beta gamma ]");
    }

    #[test]
    fn test_parse_unclosed_block_discarded() {
        let doc = parse("items = plural(count) {\none: \"1 item\"");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_parse_duplicate_key_last_wins() {
        let doc = parse("k = \"first\"\nk = \"second\"");
        assert_eq!(doc.get("k").unwrap().raw_value, "second");
    }

    #[test]
    fn test_parse_namespace_applies_to_blocks() {
        let doc = parse("[cart]\nitems = plural(count) {\nother: \"{count} items\"\n}");
        assert!(doc.contains_key("cart.items"));
    }

    #[test]
    fn test_plural_arm_rejects_spaced_label() {
        assert!(parse_plural_arm("one : \"1 item\"").is_none());
        assert!(parse_plural_arm("one: \"1 item\" trailing").is_none());
        assert!(parse_plural_arm("one: \"\"").is_none());
        assert_eq!(
            parse_plural_arm("one: \"1 item\""),
            Some(("one".to_string(), "1 item".to_string()))
        );
    }

    #[test]
    fn test_brace_body_depth_counted() {
        assert_eq!(brace_body("plural(count) { a: \"{n} x\" }"), Some(" a: \"{n} x\" "));
        assert_eq!(brace_body("no braces"), None);
        assert_eq!(brace_body("open { only"), None);
    }

    #[test]
    fn test_scan_quoted_pairs_multiple_per_line() {
        let pairs = scan_quoted_pairs(r#"locale = "fr" direction = "rtl""#);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("locale".to_string(), "fr".to_string()));
        assert_eq!(pairs[1], ("direction".to_string(), "rtl".to_string()));
    }
}
