//! XML properties format (`<properties><entry key="..">..</entry></properties>`).
//!
//! Only the narrow document shape used for key/value properties is read;
//! anything else inside the root element is rejected.

use std::collections::BTreeMap;

const DOCTYPE: &str = "<!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">";

/// Serializes entries as an XML properties document with a `<comment>` header.
pub fn encode(entries: &BTreeMap<String, String>, comment: &str) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    out.push_str(DOCTYPE);
    out.push_str("\n<properties>\n");
    if !comment.is_empty() {
        out.push_str("<comment>");
        escape_into(&mut out, comment, false);
        out.push_str("</comment>\n");
    }
    for (key, value) in entries {
        out.push_str("<entry key=\"");
        escape_into(&mut out, key, true);
        out.push_str("\">");
        escape_into(&mut out, value, false);
        out.push_str("</entry>\n");
    }
    out.push_str("</properties>\n");
    out
}

/// Parses an XML properties document into an ordered map.
pub fn decode(text: &str) -> Result<BTreeMap<String, String>, String> {
    let mut entries = BTreeMap::new();
    let mut rest = text;
    let mut saw_root = false;

    while let Some(start) = rest.find('<') {
        rest = &rest[start..];
        if rest.starts_with("<?") {
            rest = skip_past(rest, "?>")?;
        } else if rest.starts_with("<!--") {
            rest = skip_past(rest, "-->")?;
        } else if rest.starts_with("<!DOCTYPE") {
            let bracket = rest.find('[');
            let close = rest.find('>');
            rest = match (bracket, close) {
                (Some(b), Some(c)) if b < c => skip_past(rest, "]>")?,
                _ => skip_past(rest, ">")?,
            };
        } else if rest.starts_with("<properties") {
            saw_root = true;
            rest = split_tag(rest)?.1;
        } else if rest.starts_with("</properties") {
            rest = skip_past(rest, ">")?;
        } else if rest.starts_with("<comment") {
            let (tag, after) = split_tag(rest)?;
            rest = if tag.ends_with('/') {
                after
            } else {
                skip_past(after, "</comment>")?
            };
        } else if rest.starts_with("<entry") {
            let (tag, after) = split_tag(rest)?;
            let self_closing = tag.ends_with('/');
            let attributes = tag["<entry".len()..].trim_end_matches('/');
            let key = attribute(attributes, "key")?
                .ok_or_else(|| "<entry> without a key attribute".to_string())?;
            let value = if self_closing {
                rest = after;
                String::new()
            } else {
                let end = after
                    .find("</entry>")
                    .ok_or_else(|| format!("unterminated <entry> for key '{}'", key))?;
                rest = &after[end + "</entry>".len()..];
                text_content(&after[..end])?
            };
            entries.insert(key, value);
        } else {
            return Err(format!("unexpected markup near '{}'", snippet(rest)));
        }
    }

    if !saw_root {
        return Err("missing <properties> root element".to_string());
    }
    Ok(entries)
}

fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(24)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

fn skip_past<'a>(text: &'a str, marker: &str) -> Result<&'a str, String> {
    text.find(marker)
        .map(|i| &text[i + marker.len()..])
        .ok_or_else(|| format!("expected '{}' near '{}'", marker, snippet(text)))
}

/// Splits `<tag ...>rest` into the tag body (without `>`) and the rest.
///
/// A `>` inside a quoted attribute value does not close the tag.
fn split_tag(text: &str) -> Result<(&str, &str), String> {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Ok((&text[..i], &text[i + 1..])),
            (None, _) => {}
        }
    }
    Err(format!("unterminated tag near '{}'", snippet(text)))
}

/// Value of attribute `name` in a tag's attribute list.
fn attribute(attributes: &str, name: &str) -> Result<Option<String>, String> {
    let mut rest = attributes.trim_start();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| format!("malformed attributes '{}'", attributes))?;
        let attr_name = rest[..eq].trim();
        let after_eq = rest[eq + 1..].trim_start();
        let quote = after_eq
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| format!("unquoted value for attribute '{}'", attr_name))?;
        let body = &after_eq[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| format!("unterminated value for attribute '{}'", attr_name))?;
        if attr_name == name {
            return unescape(&body[..end]).map(Some);
        }
        rest = body[end + 1..].trim_start();
    }
    Ok(None)
}

/// Character data of an element, with CDATA sections taken verbatim.
fn text_content(raw: &str) -> Result<String, String> {
    let mut out = String::new();
    let mut rest = raw;
    while let Some(start) = rest.find("<![CDATA[") {
        out.push_str(&unescape(&rest[..start])?);
        let body = &rest[start + "<![CDATA[".len()..];
        let end = body
            .find("]]>")
            .ok_or_else(|| "unterminated CDATA section".to_string())?;
        out.push_str(&body[..end]);
        rest = &body[end + "]]>".len()..];
    }
    out.push_str(&unescape(rest)?);
    Ok(out)
}

fn unescape(raw: &str) -> Result<String, String> {
    if raw.contains('<') {
        return Err(format!("unexpected markup in text '{}'", snippet(raw)));
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let semi = rest[amp..]
            .find(';')
            .ok_or_else(|| format!("unterminated entity near '{}'", snippet(&rest[amp..])))?;
        let entity = &rest[amp + 1..amp + semi];
        out.push(decode_entity(entity)?);
        rest = &rest[amp + semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn decode_entity(entity: &str) -> Result<char, String> {
    let code = match entity {
        "amp" => return Ok('&'),
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "quot" => return Ok('"'),
        "apos" => return Ok('\''),
        _ => {
            if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()
            } else {
                None
            }
        }
    };
    code.and_then(char::from_u32)
        .ok_or_else(|| format!("unknown entity '&{};'", entity))
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\t' if attribute => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}
