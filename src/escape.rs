//! Entity escaping for attribute values and text bodies
//!
//! Both directions return `Cow::Borrowed` when the input needs no change.

use std::borrow::Cow;

use memchr::memchr;

/// Escape text for use inside an attribute value or element body.
///
/// The five markup characters become named entities, restricted control
/// characters become numeric references and characters that may never
/// appear in a document (NUL, U+FFFE, U+FFFF) are dropped.
pub fn escape(input: &str) -> Cow<'_, str> {
    if !input.chars().any(needs_escape) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\0' | '\u{FFFE}' | '\u{FFFF}' => {}
            c if is_restricted(c) => {
                out.push_str("&#");
                out.push_str(&u32::from(c).to_string());
                out.push(';');
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Decode entity and character references.
///
/// Unknown or unterminated references are kept verbatim.
pub fn unescape(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (text, tail) = rest.split_at(amp);
        out.push_str(text);

        let decoded = tail
            .get(1..)
            .and_then(|after| after.find(';').map(|semi| (after, semi)))
            .and_then(|(after, semi)| {
                let entity = after.get(..semi)?;
                decode_entity(entity).map(|c| (c, semi + 2))
            });

        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = tail.get(len..).unwrap_or_default();
            }
            None => {
                out.push('&');
                rest = tail.get(1..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric_entity(entity),
    }
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '&' | '<' | '>' | '"' | '\'' | '\0' | '\u{FFFE}' | '\u{FFFF}'
    ) || is_restricted(c)
}

/// Control characters written as character references
fn is_restricted(c: char) -> bool {
    matches!(
        c,
        '\u{1}'..='\u{8}'
            | '\u{B}'
            | '\u{C}'
            | '\u{E}'..='\u{1F}'
            | '\u{7F}'..='\u{84}'
            | '\u{86}'..='\u{9F}'
    )
}
