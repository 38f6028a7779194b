use crate::error::{info_err, TvEpgError};
use crate::model::DaySchedule;
use crate::utils::CONSTANTS;
use std::iter::Peekable;
use std::str::Chars;

/// Returns the bracket balanced literal starting at `start`, which must point to `[` or `{`.
/// Brackets inside string literals are ignored.
pub fn extract_balanced(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, ch) in text.get(start..)?.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..=start + idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn push_json_char(out: &mut String, ch: char) {
    match ch {
        '"' => out.push_str("\\\""),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push(c),
    }
}

fn copy_string(out: &mut String, it: &mut Peekable<Chars>, quote: char) {
    out.push('"');
    while let Some(ch) = it.next() {
        if ch == quote {
            break;
        }
        if ch == '\\' {
            match it.next() {
                Some(esc @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) => {
                    out.push('\\');
                    out.push(esc);
                }
                Some(other) => push_json_char(out, other),
                None => break,
            }
            continue;
        }
        push_json_char(out, ch);
    }
    out.push('"');
}

fn next_non_whitespace(it: &Peekable<Chars>) -> Option<char> {
    it.clone().find(|c| !c.is_whitespace())
}

/// Converts a javascript object/array literal to json:
/// single quoted strings, unquoted keys and trailing commas are accepted.
pub fn js_literal_to_json(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len() + literal.len() / 4);
    let mut it = literal.chars().peekable();
    while let Some(ch) = it.next() {
        match ch {
            '\'' | '"' | '`' => copy_string(&mut out, &mut it, ch),
            ',' => {
                if !matches!(next_non_whitespace(&it), Some('}' | ']') | None) {
                    out.push(',');
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::from(c);
                while let Some(&n) = it.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '$' {
                        ident.push(n);
                        it.next();
                    } else {
                        break;
                    }
                }
                if next_non_whitespace(&it) == Some(':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else if ident == "undefined" {
                    out.push_str("null");
                } else {
                    out.push_str(&ident);
                }
            }
            c => out.push(c),
        }
    }
    out
}

fn parse_schedule_at(html: &str, bracket_pos: usize) -> Result<Vec<DaySchedule>, TvEpgError> {
    let literal = extract_balanced(html, bracket_pos)
        .ok_or_else(|| info_err!("unterminated scheduleList literal"))?;
    serde_json::from_str::<Vec<DaySchedule>>(&js_literal_to_json(literal))
        .map_err(|err| info_err!("can't parse scheduleList: {err}"))
}

/// Extracts the `scheduleList` array of the vue component embedded in the page.
pub fn extract_schedule_list(html: &str) -> Result<Vec<DaySchedule>, TvEpgError> {
    let first = CONSTANTS.re_schedule_list.find(html)
        .ok_or_else(|| info_err!("no scheduleList found"))?;
    // the match ends with the opening bracket
    match parse_schedule_at(html, first.end() - 1) {
        Ok(schedule) => Ok(schedule),
        Err(err) => {
            let fallback = CONSTANTS.re_vue_data_block.find(html)
                .and_then(|block| CONSTANTS.re_schedule_list.find_at(html, block.end()))
                .filter(|m| m.start() != first.start());
            match fallback {
                Some(m) => parse_schedule_at(html, m.end() - 1),
                None => Err(err),
            }
        }
    }
}
