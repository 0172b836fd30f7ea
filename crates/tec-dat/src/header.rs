//! Directive lookups over the free-form Tecplot header.
//!
//! Exporters disagree on key order and on which optional keys they write, so
//! every directive is located on its own by a case-insensitive scan instead of
//! walking the header line by line. Only `VARIABLES`, `ZONE`, `N` and `E` are
//! required; everything else has a documented default.

use crate::error::FormatError;
use crate::{ElementKind, FieldLocation};

/// The captured remainder of the `ZONE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ZoneHeader<'a> {
    pub line: &'a str,
    /// Byte offset just past the captured text (before the line terminator).
    pub end: usize,
}

pub(crate) fn variables(raw: &str) -> Result<Vec<String>, FormatError> {
    let bytes = raw.as_bytes();
    let mut from = 0usize;

    while let Some(pos) = find_ignore_case(raw, "VARIABLE", from) {
        let mut i = pos + "VARIABLE".len();
        if bytes.get(i).is_some_and(|b| b.eq_ignore_ascii_case(&b'S')) {
            i += 1;
        }
        i = skip_whitespace(bytes, i);
        if bytes.get(i) == Some(&b'=') {
            let start = skip_whitespace(bytes, i + 1);
            let (value, _) = line_remainder(raw, start);
            let names: Vec<String> = value
                .split(',')
                .map(|token| token.trim().trim_matches('"').trim())
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Err(FormatError::MissingVariables);
            }
            return Ok(names);
        }
        from = pos + 1;
    }

    Err(FormatError::MissingVariables)
}

pub(crate) fn zone(raw: &str) -> Result<ZoneHeader<'_>, FormatError> {
    let bytes = raw.as_bytes();
    let mut from = 0usize;

    while let Some(pos) = find_ignore_case(raw, "ZONE", from) {
        from = pos + 1;
        if !at_word_start(bytes, pos) {
            continue;
        }
        let after = pos + "ZONE".len();
        if !bytes.get(after).is_some_and(u8::is_ascii_whitespace) {
            continue;
        }
        let start = skip_whitespace(bytes, after);
        let (line, end) = line_remainder(raw, start);
        if line.is_empty() {
            continue;
        }
        return Ok(ZoneHeader { line, end });
    }

    Err(FormatError::MissingZone)
}

pub(crate) fn dimensions(zone_line: &str) -> Result<(usize, usize), FormatError> {
    let nodes = integer_value(zone_line, &["NODES", "N"]);
    let elements = integer_value(zone_line, &["ELEMENTS", "E"]);
    match (nodes, elements) {
        (Some(nodes), Some(elements)) => Ok((nodes, elements)),
        _ => Err(FormatError::MissingDimensions),
    }
}

/// `ZONETYPE` wins over `ET` whenever both are present.
pub(crate) fn element_kind(zone_line: &str) -> Result<ElementKind, FormatError> {
    let zone_type = match (
        word_value(zone_line, &["ZONETYPE"]),
        word_value(zone_line, &["ET"]),
    ) {
        (Some(zone_type), _) => zone_type.to_ascii_uppercase(),
        (None, Some(et)) => format!("FE{}", et.to_ascii_uppercase()),
        (None, None) => "UNKNOWN".to_string(),
    };

    ElementKind::classify(&zone_type).ok_or(FormatError::UnsupportedZoneType(zone_type))
}

/// Resolve one location tag per variable.
///
/// Without a `VARLOCATION` clause every variable is nodal. Variables the
/// clause does not mention also stay nodal, and a later range overrides an
/// earlier one, so each variable ends up with exactly one tag.
pub(crate) fn locations(
    zone_line: &str,
    num_variables: usize,
) -> Result<Vec<FieldLocation>, FormatError> {
    let mut tags = vec![FieldLocation::Nodal; num_variables];

    let Some((_, rest)) = find_key(zone_line, &["VARLOCATION"]) else {
        return Ok(tags);
    };
    let body = rest
        .strip_prefix('(')
        .and_then(|inner| inner.split_once(')'))
        .map(|(body, _)| body)
        .ok_or_else(|| FormatError::InvalidVarLocation("expected '(...)'".to_string()))?;

    let mut remaining = body;
    while let Some(open) = remaining.find('[') {
        let after_open = &remaining[open + 1..];
        let close = after_open.find(']').ok_or_else(|| {
            FormatError::InvalidVarLocation(format!("unterminated range in '{body}'"))
        })?;
        let members = &after_open[..close];

        let tail = after_open[close + 1..].trim_start();
        let tail = tail.strip_prefix('=').ok_or_else(|| {
            FormatError::InvalidVarLocation(format!("missing '=' after [{members}]"))
        })?;
        let tail = tail.trim_start();
        let keyword_len = word_len(tail);
        let keyword = &tail[..keyword_len];
        let location = FieldLocation::from_keyword(keyword).ok_or_else(|| {
            FormatError::InvalidVarLocation(format!("unknown location '{keyword}'"))
        })?;

        for member in members.split(',') {
            let (start, end) = parse_range(member.trim())?;
            if start == 0 || end > num_variables {
                return Err(FormatError::InvalidVarLocation(format!(
                    "range [{start}-{end}] outside 1..={num_variables}"
                )));
            }
            for tag in &mut tags[start - 1..end] {
                *tag = location;
            }
        }

        remaining = &tail[keyword_len..];
    }

    Ok(tags)
}

/// Offset where the numeric data stream begins.
///
/// Data starts on the line after the zone line. If that line is a
/// `STRANDID`/`SOLUTIONTIME` continuation it is skipped, but only that one.
pub(crate) fn data_start(raw: &str, zone_end: usize) -> usize {
    let Some(newline) = raw[zone_end..].find('\n') else {
        return raw.len();
    };
    let next_start = zone_end + newline + 1;
    let next_end = raw[next_start..]
        .find('\n')
        .map_or(raw.len(), |offset| next_start + offset);

    let next_line = &raw[next_start..next_end];
    if find_ignore_case(next_line, "STRANDID", 0).is_some()
        || find_ignore_case(next_line, "SOLUTIONTIME", 0).is_some()
    {
        (next_end + 1).min(raw.len())
    } else {
        next_start
    }
}

/// Whitespace-split numeric tokens; anything that is not a plain signed
/// decimal (optionally with an exponent) is skipped.
pub(crate) fn numeric_tokens(data: &str) -> Vec<f64> {
    data.split_ascii_whitespace()
        .filter(|token| is_numeric_token(token))
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}

pub(crate) fn is_numeric_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut i = 0usize;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut digits = 0usize;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
        digits += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return false;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }

    i == bytes.len()
}

fn parse_range(member: &str) -> Result<(usize, usize), FormatError> {
    let invalid = || FormatError::InvalidVarLocation(format!("bad range '{member}'"));
    let (start, end) = match member.split_once('-') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (member, member),
    };
    let start: usize = start.parse().map_err(|_| invalid())?;
    let end: usize = end.parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok((start, end))
}

fn integer_value(line: &str, keys: &[&str]) -> Option<usize> {
    let (_, rest) = find_key(line, keys)?;
    let len = rest.bytes().take_while(u8::is_ascii_digit).count();
    rest[..len].parse().ok()
}

fn word_value<'a>(line: &'a str, keys: &[&str]) -> Option<&'a str> {
    let (_, rest) = find_key(line, keys)?;
    let len = word_len(rest);
    (len > 0).then(|| &rest[..len])
}

/// Earliest `KEY = ` occurrence among `keys`, returning its offset and the
/// text after the `=` and any following whitespace. Keys only match at a word
/// start, so `E` never fires inside `ZONETYPE`.
fn find_key<'a>(line: &'a str, keys: &[&str]) -> Option<(usize, &'a str)> {
    let bytes = line.as_bytes();
    for pos in 0..bytes.len() {
        if !at_word_start(bytes, pos) {
            continue;
        }
        for key in keys {
            let end = pos + key.len();
            if end > bytes.len() || !bytes[pos..end].eq_ignore_ascii_case(key.as_bytes()) {
                continue;
            }
            let eq = skip_whitespace(bytes, end);
            if bytes.get(eq) == Some(&b'=') {
                let value = skip_whitespace(bytes, eq + 1);
                return Some((pos, &line[value..]));
            }
        }
    }
    None
}

fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

fn at_word_start(bytes: &[u8], pos: usize) -> bool {
    pos == 0 || !is_word_byte(bytes[pos - 1])
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn word_len(text: &str) -> usize {
    text.bytes().take_while(|&b| is_word_byte(b)).count()
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

/// Text from `start` up to the next line terminator, and the offset where it stops.
fn line_remainder(raw: &str, start: usize) -> (&str, usize) {
    let start = start.min(raw.len());
    let end = raw[start..]
        .find(['\r', '\n'])
        .map_or(raw.len(), |offset| start + offset);
    (raw[start..end].trim_end(), end)
}
