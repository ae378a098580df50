//! Native SVG cleanup.
//!
//! Drops the XML declaration, doctype, comments, `<metadata>` and
//! whitespace-only text between tags, and removes a root `viewBox` that only
//! restates `width`/`height`. IDs and everything else are left alone.

use aflow_kernel::prelude::{Asset, Step, StepError};
use std::ops::Range;

/// Cleans an SVG document.
#[must_use]
pub fn clean(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg.strip_prefix('\u{feff}').unwrap_or(svg);

    while !rest.is_empty() {
        if let Some(body) = rest.strip_prefix("<!--") {
            rest = body.find("-->").map_or("", |i| &body[i + 3..]);
        } else if rest.starts_with("<![CDATA[") {
            let end = rest.find("]]>").map_or(rest.len(), |i| i + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if rest.starts_with("<?") {
            rest = rest.find("?>").map_or("", |i| &rest[i + 2..]);
        } else if rest.starts_with("<!") {
            // A doctype may carry an internal subset in brackets.
            let end = match (rest.find('['), rest.find('>')) {
                (Some(open), Some(close)) if open < close => rest.find("]>").map_or(rest.len(), |i| i + 2),
                (_, Some(close)) => close + 1,
                _ => rest.len(),
            };
            rest = &rest[end..];
        } else if rest.starts_with('<') {
            let end = tag_end(rest);
            let tag = &rest[..end];
            rest = &rest[end..];

            let name = tag_name(tag);
            if name.eq_ignore_ascii_case("metadata") {
                if !tag.ends_with("/>") {
                    rest = find_ci(rest, "</metadata").map_or("", |i| {
                        let after = &rest[i..];
                        after.find('>').map_or("", |j| &after[j + 1..])
                    });
                }
            } else if name == "svg" {
                out.push_str(&strip_redundant_view_box(tag));
            } else {
                out.push_str(tag);
            }
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let text = &rest[..end];
            if !text.trim().is_empty() {
                out.push_str(text);
            }
            rest = &rest[end..];
        }
    }
    out
}

/// Length of the tag at the start of `s`, honouring quoted attribute values.
fn tag_end(s: &str) -> usize {
    let mut quote = None;
    for (i, c) in s.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {},
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return i + 1,
            None => {},
        }
    }
    s.len()
}

fn tag_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('<');
    let end = body.find(|c: char| c.is_whitespace() || c == '>' || c == '/').unwrap_or(body.len());
    &body[..end]
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack.as_bytes().windows(needle.len()).position(|w| w.eq_ignore_ascii_case(needle))
}

struct Attribute<'a> {
    name: &'a str,
    value: &'a str,
    /// Span including the whitespace before the attribute.
    span: Range<usize>,
}

fn attributes(tag: &str) -> Vec<Attribute<'_>> {
    let bytes = tag.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 1 + tag_name(tag).len();

    loop {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b'>' | b'/') && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos == name_start {
            break;
        }
        let name = &tag[name_start..pos];

        let mut value = "";
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            match bytes.get(pos) {
                Some(&q @ (b'"' | b'\'')) => {
                    let close = tag[pos + 1..].find(q as char).map_or(tag.len(), |i| pos + 1 + i);
                    value = &tag[pos + 1..close];
                    pos = (close + 1).min(tag.len());
                },
                _ => {
                    let value_start = pos;
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    value = &tag[value_start..pos];
                },
            }
        }
        attrs.push(Attribute { name, value, span: start..pos });
    }
    attrs
}

fn length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

fn strip_redundant_view_box(tag: &str) -> String {
    let attrs = attributes(tag);
    let find = |name: &str| attrs.iter().find(|a| a.name == name);

    let (Some(view_box), Some(width), Some(height)) = (find("viewBox"), find("width"), find("height")) else {
        return tag.to_owned();
    };
    let (Some(w), Some(h)) = (length(width.value), length(height.value)) else {
        return tag.to_owned();
    };
    let numbers: Vec<f64> = view_box
        .value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    let same = |a: f64, b: f64| (a - b).abs() < f64::EPSILON;
    if let [x, y, vw, vh] = numbers[..]
        && same(x, 0.0)
        && same(y, 0.0)
        && same(vw, w)
        && same(vh, h)
    {
        let mut out = tag.to_owned();
        out.replace_range(view_box.span.clone(), "");
        out
    } else {
        tag.to_owned()
    }
}

/// Native SVG optimization step.
#[derive(Debug, Default, Clone, Copy)]
pub struct Svgo;

impl Step for Svgo {
    fn name(&self) -> &'static str {
        "svgo"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let cleaned = clean(asset.text()?);
        asset.set_text(cleaned);
        Ok(asset)
    }
}
