use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{Error, RowError, RowErrorKind};
use crate::model::{Entry, Value};

/// Parse entries from UTF-8 text, failing on the first invalid row.
///
/// Duplicate keys keep the last value at the position of the first occurrence.
pub fn parse_str(input: &str) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::new();
    let mut by_key = HashMap::<String, usize>::new();

    for row in parse_rows(input, None) {
        let entry = row?;
        if let Some(existing_idx) = by_key.get(&entry.key).copied() {
            entries[existing_idx] = entry;
        } else {
            by_key.insert(entry.key.clone(), entries.len());
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Parse entries from a buffered reader.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Vec<Entry>, Error> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse_str(&buf)
}

/// Coerce a raw value: integer, then float, then boolean, then string.
///
/// One layer of matching quotes is removed first; whitespace is kept.
pub fn parse_value(raw: &str) -> Value {
    let value = strip_quotes(raw);

    if is_integer(value)
        && let Ok(parsed) = value.parse::<i64>()
    {
        return Value::Int(parsed);
    }

    if is_numeric(value)
        && let Ok(parsed) = value.parse::<f64>()
    {
        return Value::Float(parsed);
    }

    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::Str(value.to_owned())
}

/// Yield every assignment row of `input` in order, skipping comments and
/// blank lines.
///
/// The input as a whole is trimmed first; line numbers still refer to the
/// untrimmed text.
pub(crate) fn parse_rows<'a>(
    input: &'a str,
    source: Option<&'a Path>,
) -> impl Iterator<Item = Result<Entry, RowError>> + 'a {
    let body = input.trim_start();
    let leading_lines = input[..input.len() - body.len()].matches('\n').count();

    body.trim_end()
        .split('\n')
        .enumerate()
        .filter_map(move |(idx, line)| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let line_num = leading_lines + idx + 1;
            parse_line(line, line_num)
                .map_err(|err| err.with_path(source.map(Path::to_path_buf)))
                .map(|parsed| {
                    parsed.map(|(key, value)| Entry {
                        key,
                        value,
                        source: source.map(Path::to_path_buf),
                        line: line_num,
                    })
                })
                .transpose()
        })
}

fn parse_line(line: &str, line_num: usize) -> Result<Option<(String, Value)>, RowError> {
    if line.trim().is_empty() || line.starts_with('#') || line.starts_with("//") {
        return Ok(None);
    }
    // The process environment cannot hold NUL bytes.
    if line.contains('\0') {
        return Err(RowError::new(line_num, line, RowErrorKind::NulByte));
    }

    let Some((name, value)) = line.split_once('=') else {
        return Err(RowError::new(
            line_num,
            line,
            RowErrorKind::MissingSeparator,
        ));
    };

    let name = strip_quotes(name);
    if name.is_empty() {
        return Err(RowError::new(line_num, line, RowErrorKind::EmptyName));
    }
    if !is_valid_name(name) {
        return Err(RowError::new(line_num, line, RowErrorKind::InvalidName));
    }

    Ok(Some((name.to_owned(), parse_value(value))))
}

fn strip_quotes(input: &str) -> &str {
    for quote in ['"', '\''] {
        if input.len() >= 2
            && let Some(inner) = input
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    input
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn is_integer(input: &str) -> bool {
    let digits = input.strip_prefix('-').unwrap_or(input);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

/// Decimal numbers with optional sign, fraction and exponent. Rejects the
/// `inf`/`nan` spellings that `f64::from_str` would otherwise accept.
fn is_numeric(input: &str) -> bool {
    let bytes = input.as_bytes();
    let mut idx = 0usize;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        idx += 1;
    }

    let int_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    let mut digits = idx - int_start;

    if idx < bytes.len() && bytes[idx] == b'.' {
        idx += 1;
        let frac_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        digits += idx - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if idx < bytes.len() && matches!(bytes[idx], b'e' | b'E') {
        idx += 1;
        if idx < bytes.len() && matches!(bytes[idx], b'+' | b'-') {
            idx += 1;
        }
        let exp_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == exp_start {
            return false;
        }
    }

    idx == bytes.len()
}
