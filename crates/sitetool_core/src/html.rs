//! Byte-level HTML tag scanning.
//!
//! This is not a parser: it finds opening tags by name, respects quoted
//! attribute values, skips comments and raw `<script>`/`<style>` bodies, and
//! reports byte spans so callers can splice the original text without
//! re-serializing anything else.

use std::ops::Range;

/// Elements whose content is raw text, never markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attribute {
    pub name: String,
    pub value: String,
    /// Span of `name="value"` relative to the tag text.
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct TagMatch {
    pub span: Range<usize>,
    pub attrs: Vec<Attribute>,
}

impl TagMatch {
    pub fn attr(&self, name: &str) -> Option<&str> {
        attribute(&self.attrs, name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadBounds {
    /// First byte after `<head ...>`.
    pub inner_start: usize,
    /// Index of `</head`.
    pub close: usize,
}

pub(crate) fn attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| attr.name == name)
        .map(|attr| attr.value.as_str())
}

/// Locate the head element. `None` in the outer option means no `<head>`;
/// `Some(None)` means the head is never closed.
pub(crate) fn head_bounds(html: &str) -> Option<Option<HeadBounds>> {
    let start = find_tag_start(html, "head", 0)?;
    let Some(open_end) = find_tag_end(html, start) else {
        return Some(None);
    };
    Some(
        index_of_ignore_case(html, "</head", open_end + 1).map(|close| HeadBounds {
            inner_start: open_end + 1,
            close,
        }),
    )
}

pub(crate) fn scan_tags(html: &str, from: usize, tag_name: &str) -> Vec<TagMatch> {
    let mut output = Vec::new();
    let mut index = from;

    while index < html.len() {
        let Some(lt) = html[index..].find('<') else {
            break;
        };
        let at = index + lt;
        if let Some(resume) = skip_opaque(html, at, tag_name) {
            index = resume;
            continue;
        }
        if is_tag_at(html, at, tag_name) {
            let Some(end) = find_tag_end(html, at) else {
                break;
            };
            output.push(TagMatch {
                span: at..end + 1,
                attrs: parse_attributes(&html[at..=end], tag_name),
            });
            index = end + 1;
            continue;
        }
        index = at + 1;
    }

    output
}

pub(crate) fn find_tag_start(html: &str, tag_name: &str, from: usize) -> Option<usize> {
    let mut index = from;
    while index < html.len() {
        let at = index + html[index..].find('<')?;
        if let Some(resume) = skip_opaque(html, at, tag_name) {
            index = resume;
            continue;
        }
        if is_tag_at(html, at, tag_name) {
            return Some(at);
        }
        index = at + 1;
    }
    None
}

/// Where scanning resumes when `at` opens a comment or a raw-text element
/// other than the one being searched for.
fn skip_opaque(html: &str, at: usize, tag_name: &str) -> Option<usize> {
    if html[at..].starts_with("<!--") {
        return Some(index_of_ignore_case(html, "-->", at + 4).map_or(html.len(), |end| end + 3));
    }
    let element = RAW_TEXT_ELEMENTS
        .into_iter()
        .find(|element| !element.eq_ignore_ascii_case(tag_name) && is_tag_at(html, at, element))?;
    let Some(open_end) = find_tag_end(html, at) else {
        return Some(html.len());
    };
    let closing = format!("</{element}");
    Some(index_of_ignore_case(html, &closing, open_end + 1).map_or(html.len(), |close| close + 1))
}

fn is_tag_at(html: &str, at: usize, tag_name: &str) -> bool {
    let bytes = html.as_bytes();
    if bytes.get(at) != Some(&b'<') {
        return false;
    }
    let name_start = at + 1;
    let name_end = name_start + tag_name.len();
    let Some(name) = bytes.get(name_start..name_end) else {
        return false;
    };
    name.eq_ignore_ascii_case(tag_name.as_bytes())
        && matches!(
            bytes.get(name_end),
            Some(b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/')
        )
}

/// Index of the `>` closing the tag that starts at `start`, skipping quoted values.
pub(crate) fn find_tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote = None::<u8>;
    for (offset, byte) in html.as_bytes()[start..].iter().copied().enumerate() {
        match quote {
            Some(active) if byte == active => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'>' => return Some(start + offset),
            None => {}
        }
    }
    None
}

pub(crate) fn parse_attributes(tag_raw: &str, tag_name: &str) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    let bytes = tag_raw.as_bytes();
    let mut index = tag_name.len() + 1;

    while index < bytes.len() {
        let byte = bytes[index];
        if byte == b'>' {
            break;
        }
        if byte == b'/' || byte.is_ascii_whitespace() {
            index += 1;
            continue;
        }

        let name_start = index;
        while index < bytes.len()
            && !bytes[index].is_ascii_whitespace()
            && !matches!(bytes[index], b'=' | b'>' | b'/')
        {
            index += 1;
        }
        if name_start == index {
            index += 1;
            continue;
        }
        let name = tag_raw[name_start..index].to_ascii_lowercase();
        let mut span_end = index;

        let mut cursor = skip_whitespace(bytes, index);
        let mut value = String::new();
        if bytes.get(cursor) == Some(&b'=') {
            cursor = skip_whitespace(bytes, cursor + 1);
            match bytes.get(cursor).copied() {
                Some(quote @ (b'"' | b'\'')) => {
                    let value_start = cursor + 1;
                    let value_end = tag_raw[value_start..]
                        .find(char::from(quote))
                        .map_or(bytes.len(), |offset| value_start + offset);
                    value = tag_raw[value_start..value_end].to_string();
                    cursor = (value_end + 1).min(bytes.len());
                }
                _ => {
                    let value_start = cursor;
                    while cursor < bytes.len()
                        && !bytes[cursor].is_ascii_whitespace()
                        && bytes[cursor] != b'>'
                    {
                        cursor += 1;
                    }
                    value = tag_raw[value_start..cursor].to_string();
                }
            }
            span_end = cursor;
            index = cursor;
        }

        attrs.push(Attribute {
            name,
            value,
            span: name_start..span_end,
        });
    }

    attrs
}

fn skip_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while index < bytes.len() && bytes[index].is_ascii_whitespace() {
        index += 1;
    }
    index
}

pub(crate) fn index_of_ignore_case(text: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = text.as_bytes().get(from..)?;
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
        .map(|offset| from + offset)
}

/// Escape a value placed inside a double-quoted attribute.
pub(crate) fn escape_attribute(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
    output
}

/// Escape element text so translations cannot open tags; `&` and quotes stay literal.
pub(crate) fn escape_text(value: &str) -> String {
    value.replace('<', "&lt;").replace('>', "&gt;")
}

pub(crate) fn decode_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::{
        attribute, decode_html, escape_attribute, find_tag_end, find_tag_start, head_bounds,
        index_of_ignore_case, parse_attributes, scan_tags,
    };

    #[test]
    fn find_tag_start_skips_commented_tags() {
        let html = "<head><!-- <title>dev</title> --><title>Real</title></head>";
        assert_eq!(find_tag_start(html, "title", 0), html.find("<title>Real"));
        assert_eq!(find_tag_start("<!-- <title>x</title>", "title", 0), None);
    }

    #[test]
    fn script_and_style_bodies_are_opaque() {
        let html = r#"<head>
<script>var s='<meta name="description" content="x">';</script>
<style>/* <link rel="canonical" href="y"> */</style>
<meta name="description" content="real">
<SCRIPT src="a.js"></SCRIPT><title>t</title>
</head>"#;
        let meta = scan_tags(html, 0, "meta");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].attr("content"), Some("real"));
        assert!(scan_tags(html, 0, "link").is_empty());
        assert_eq!(find_tag_start(html, "title", 0), html.find("<title>"));
        assert_eq!(scan_tags(html, 0, "script").len(), 2);
    }

    #[test]
    fn scanner_extracts_head_meta_and_links() {
        let html = r#"
<html><head>
<title>Example</title>
<meta name="description" content="hello" />
<!-- <meta name="ignored" content="x"> -->
<link rel="canonical" href="https://example.org/alpha" />
</head><body><header>x</header></body></html>
"#;
        let meta = scan_tags(html, 0, "meta");
        let links = scan_tags(html, 0, "link");
        assert_eq!(meta.len(), 1);
        assert_eq!(links.len(), 1);
        assert_eq!(meta[0].attr("name"), Some("description"));
        assert_eq!(&html[meta[0].span.clone()], r#"<meta name="description" content="hello" />"#);
        assert_eq!(find_tag_start(html, "head", 0), html.find("<head>"));
    }

    #[test]
    fn tag_end_skips_quoted_angle_brackets() {
        let html = r#"<meta content="a > b" name='x>y'>rest"#;
        assert_eq!(find_tag_end(html, 0), Some(html.len() - "rest".len() - 1));
    }

    #[test]
    fn attribute_spans_cover_name_and_value() {
        let raw = r#"<html class="dark" lang = 'en' data-x=plain hidden>"#;
        let attrs = parse_attributes(raw, "html");
        let names: Vec<&str> = attrs.iter().map(|attr| attr.name.as_str()).collect();
        assert_eq!(names, vec!["class", "lang", "data-x", "hidden"]);
        assert_eq!(&raw[attrs[1].span.clone()], "lang = 'en'");
        assert_eq!(&raw[attrs[2].span.clone()], "data-x=plain");
        assert_eq!(&raw[attrs[3].span.clone()], "hidden");
        assert_eq!(attribute(&attrs, "lang"), Some("en"));
        assert_eq!(attribute(&attrs, "hidden"), Some(""));
    }

    #[test]
    fn head_bounds_distinguishes_missing_and_unclosed() {
        assert_eq!(head_bounds("<html><body></body></html>"), None);
        assert_eq!(head_bounds("<html><head><title>x</title>"), Some(None));
        let html = "<html><HEAD><title>x</title></HEAD></html>";
        let bounds = head_bounds(html).flatten().expect("bounds");
        assert_eq!(&html[bounds.inner_start..bounds.close], "<title>x</title>");
    }

    #[test]
    fn index_of_ignore_case_respects_start() {
        assert_eq!(index_of_ignore_case("ab</TITLE>", "</title", 0), Some(2));
        assert_eq!(index_of_ignore_case("ab</TITLE>", "</title", 3), None);
        assert_eq!(index_of_ignore_case("ab", "</title", 10), None);
    }

    #[test]
    fn escaping_round_trips_through_decode() {
        let raw = r#"Tom & "Jerry" <3"#;
        let escaped = escape_attribute(raw);
        assert_eq!(escaped, "Tom &amp; &quot;Jerry&quot; &lt;3");
        assert_eq!(decode_html(&escaped), raw);
    }
}
