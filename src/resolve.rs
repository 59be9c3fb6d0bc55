//! Message resolution: the fixed transformation pipeline applied at lookup
//! time.
//!
//! Stages run in a fixed order — inheritance splice, plural selection,
//! choice selection, conditional evaluation, variable interpolation,
//! literal unwrapping — each consuming the previous stage's output. Missing
//! data degrades to an empty string or the `!key!` placeholder; the only
//! failure the pipeline can produce is a `count` variable that does not
//! coerce to an integer.

use std::collections::HashMap;

use crate::{
    error::Error,
    format::is_word_byte,
    types::{Message, MessageKind, Value, Variables},
};

/// Upper bound on the `inherits_from` chain walked during resolution. A
/// chain longer than this (in practice, a cycle) resolves like a missing
/// parent instead of recursing without bound. The bound is an added safety
/// behavior; the format itself does not forbid cycles.
const MAX_INHERIT_DEPTH: usize = 16;

/// Placeholder returned for keys that cannot be resolved.
pub fn missing_key(key: &str) -> String {
    format!("!{}!", key)
}

/// Resolves `key` against one language's message set.
///
/// Missing keys short-circuit to the `!key!` placeholder without running
/// any stage.
pub fn resolve(
    messages: &HashMap<String, Message>,
    key: &str,
    variables: &Variables,
) -> Result<String, Error> {
    resolve_at_depth(messages, key, variables, 0)
}

fn resolve_at_depth(
    messages: &HashMap<String, Message>,
    key: &str,
    variables: &Variables,
    depth: usize,
) -> Result<String, Error> {
    if depth > MAX_INHERIT_DEPTH {
        return Ok(missing_key(key));
    }
    match messages.get(key) {
        Some(message) => resolve_message(messages, message, variables, depth),
        None => Ok(missing_key(key)),
    }
}

fn resolve_message(
    messages: &HashMap<String, Message>,
    message: &Message,
    variables: &Variables,
    depth: usize,
) -> Result<String, Error> {
    let mut value = message.raw_value.clone();

    // 1. Inheritance: the parent resolves with the same variables and is
    // spliced into every literal `{parent}`.
    if let Some(parent) = &message.inherits_from {
        let resolved = resolve_at_depth(messages, parent, variables, depth + 1)?;
        value = value.replace("{parent}", &resolved);
    }

    // 2. Plural selection replaces the value wholesale.
    if message.kind == MessageKind::Plural {
        if let Some(count) = variables.get("count") {
            value = select_by_count(message, count.as_count()?);
        }
    }

    // 3. Choice selection: the same one/other-by-count rule. Bracket labels
    // are never matched against variables.
    if message.kind == MessageKind::Choice {
        if let Some(count) = variables.get("count") {
            value = select_by_count(message, count.as_count()?);
        }
    }

    // 4. Conditionals.
    if message.has_conditional {
        value = evaluate_conditionals(&value, variables);
    }

    // 5. Interpolation, in variable insertion order. Each name is a single
    // replace pass; braces are never expanded recursively.
    for (name, val) in variables.iter() {
        value = value.replace(&format!("{{{}}}", name), &val.to_string());
    }

    // 6. Literal unwrapping.
    Ok(unwrap_literal(&value).to_string())
}

/// The binary plural rule: `one` for a count of exactly 1 when that label
/// exists, `other` otherwise, empty when `other` is absent.
fn select_by_count(message: &Message, count: i64) -> String {
    if count == 1 {
        if let Some(one) = message.choices.get("one") {
            return one.clone();
        }
    }
    message.choices.get("other").cloned().unwrap_or_default()
}

/// Strips one bracket layer, then one quote layer. Both checks are
/// positional and run for every entry kind.
fn unwrap_literal(value: &str) -> &str {
    let value = strip_layer(value, '[', ']');
    strip_layer(value, '"', '"')
}

fn strip_layer(value: &str, open: char, close: char) -> &str {
    if value.len() >= 2 && value.starts_with(open) && value.ends_with(close) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// One parsed `{name == literal ? 'textA' : 'textB'}` occurrence.
struct Conditional<'a> {
    name: &'a str,
    literal: i64,
    when_true: &'a str,
    when_false: &'a str,
    /// Bytes consumed from the opening brace through the closing one.
    len: usize,
}

/// Replaces every conditional pattern in `value`. A pattern whose variable
/// is absent, or does not coerce to an integer, is left as written.
fn evaluate_conditionals(value: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find('{') {
        out.push_str(&rest[..idx]);
        let candidate = &rest[idx..];
        match parse_conditional(candidate) {
            Some(cond) => {
                match variables.get(cond.name).and_then(Value::as_int) {
                    Some(n) => out.push_str(if n == cond.literal {
                        cond.when_true
                    } else {
                        cond.when_false
                    }),
                    None => out.push_str(&candidate[..cond.len]),
                }
                rest = &candidate[cond.len..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses `{name == 42 ? 'yes' : 'no'}` at the start of `s`.
fn parse_conditional(s: &str) -> Option<Conditional<'_>> {
    let bytes = s.as_bytes();
    let mut i = 1; // past the opening brace

    skip_spaces(bytes, &mut i);
    let name_start = i;
    while i < bytes.len() && is_word_byte(bytes[i]) {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = &s[name_start..i];

    skip_spaces(bytes, &mut i);
    if !s[i..].starts_with("==") {
        return None;
    }
    i += 2;
    skip_spaces(bytes, &mut i);

    let literal_start = i;
    if i < bytes.len() && bytes[i] == b'-' {
        i += 1;
    }
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let literal: i64 = s[literal_start..i].parse().ok()?;

    skip_spaces(bytes, &mut i);
    if i >= bytes.len() || bytes[i] != b'?' {
        return None;
    }
    i += 1;
    skip_spaces(bytes, &mut i);

    let (when_true, next) = single_quoted(s, i)?;
    i = next;
    skip_spaces(bytes, &mut i);
    if i >= bytes.len() || bytes[i] != b':' {
        return None;
    }
    i += 1;
    skip_spaces(bytes, &mut i);

    let (when_false, next) = single_quoted(s, i)?;
    i = next;
    skip_spaces(bytes, &mut i);
    if i >= bytes.len() || bytes[i] != b'}' {
        return None;
    }

    Some(Conditional {
        name,
        literal,
        when_true,
        when_false,
        len: i + 1,
    })
}

fn skip_spaces(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

/// Reads a `'single quoted'` span starting at `i`; returns the span and the
/// index just past the closing quote.
fn single_quoted(s: &str, i: usize) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    if i >= bytes.len() || bytes[i] != b'\'' {
        return None;
    }
    let start = i + 1;
    let end = s[start..].find('\'')? + start;
    Some((&s[start..end], end + 1))
}
