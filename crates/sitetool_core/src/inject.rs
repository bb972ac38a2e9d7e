//! Per-route SEO metadata injection into an exported HTML document.
//!
//! The managed tag families are the description meta, every `og:*` and
//! `twitter:*` meta, and canonical links. They are stripped from the head and
//! re-emitted as one block before `</head>`, so running the injector over its
//! own output with the same record reproduces it byte for byte.

use std::ops::Range;

use thiserror::Error;

use crate::config::SiteSettings;
use crate::html::{
    HeadBounds, TagMatch, escape_attribute, escape_text, find_tag_end, find_tag_start,
    head_bounds, index_of_ignore_case, parse_attributes, scan_tags,
};
use crate::routes::RouteMeta;

pub const TWITTER_CARD: &str = "summary_large_image";
const BLOCK_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document has no <html> opening tag")]
    MissingHtml,
    #[error("document has no <head> element")]
    MissingHead,
    #[error("document has no closing </head> tag")]
    UnclosedHead,
    #[error("document has an unclosed <title> element")]
    UnclosedTitle,
}

pub fn inject_meta(
    document: &str,
    meta: &RouteMeta,
    settings: &SiteSettings,
) -> Result<String, DocumentError> {
    let html = set_lang_attribute(document, &meta.lang_tag)?;
    let (html, replaced_title) = replace_title(&html, &meta.title)?;
    let html = strip_managed_tags(&html)?;

    let mut tags = Vec::with_capacity(10);
    if !replaced_title {
        tags.push(format!("<title>{}</title>", escape_text(&meta.title)));
    }
    tags.extend(managed_tags(meta, &settings.twitter_site));
    insert_before_head_close(&html, &tags)
}

pub fn managed_tags(meta: &RouteMeta, twitter_site: &str) -> Vec<String> {
    let title = escape_attribute(&meta.title);
    let description = escape_attribute(&meta.description);
    let image = escape_attribute(&meta.og_image_url);
    let url = escape_attribute(&meta.canonical_url);
    let twitter_site = escape_attribute(twitter_site);
    vec![
        format!(r#"<meta name="description" content="{description}">"#),
        format!(r#"<meta property="og:title" content="{title}">"#),
        format!(r#"<meta property="og:description" content="{description}">"#),
        format!(r#"<meta property="og:image" content="{image}">"#),
        format!(r#"<meta property="og:url" content="{url}">"#),
        format!(r#"<meta name="twitter:card" content="{TWITTER_CARD}">"#),
        format!(r#"<meta name="twitter:site" content="{twitter_site}">"#),
        format!(r#"<meta name="twitter:image" content="{image}">"#),
        format!(r#"<link rel="canonical" href="{url}">"#),
    ]
}

pub(crate) fn is_managed_meta(tag: &TagMatch) -> bool {
    tag.attr("property")
        .or_else(|| tag.attr("name"))
        .map(str::to_ascii_lowercase)
        .is_some_and(|key| {
            key == "description" || key.starts_with("og:") || key.starts_with("twitter:")
        })
}

pub(crate) fn is_canonical_link(tag: &TagMatch) -> bool {
    tag.attr("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("canonical"))
    })
}

fn require_head(html: &str) -> Result<HeadBounds, DocumentError> {
    head_bounds(html)
        .ok_or(DocumentError::MissingHead)?
        .ok_or(DocumentError::UnclosedHead)
}

fn set_lang_attribute(html: &str, lang_tag: &str) -> Result<String, DocumentError> {
    let start = find_tag_start(html, "html", 0).ok_or(DocumentError::MissingHtml)?;
    let end = find_tag_end(html, start).ok_or(DocumentError::MissingHtml)?;
    let raw = &html[start..=end];
    let lang = format!(r#"lang="{}""#, escape_attribute(lang_tag));

    let tag = match parse_attributes(raw, "html")
        .into_iter()
        .find(|attr| attr.name == "lang")
    {
        Some(existing) => format!(
            "{}{lang}{}",
            &raw[..existing.span.start],
            &raw[existing.span.end..]
        ),
        None => {
            let name_end = "<html".len();
            format!("{} {lang}{}", &raw[..name_end], &raw[name_end..])
        }
    };
    Ok(format!("{}{tag}{}", &html[..start], &html[end + 1..]))
}

/// Returns the new document and whether a title element was found.
fn replace_title(html: &str, title: &str) -> Result<(String, bool), DocumentError> {
    let head = require_head(html)?;
    let region = &html[..head.close];
    let Some(start) = find_tag_start(region, "title", head.inner_start) else {
        return Ok((html.to_string(), false));
    };
    let open_end = find_tag_end(region, start).ok_or(DocumentError::UnclosedTitle)?;
    let close =
        index_of_ignore_case(region, "</title", open_end + 1).ok_or(DocumentError::UnclosedTitle)?;

    let replaced = format!(
        "{}{}{}",
        &html[..open_end + 1],
        escape_text(title),
        &html[close..]
    );
    Ok((replaced, true))
}

fn strip_managed_tags(html: &str) -> Result<String, DocumentError> {
    let head = require_head(html)?;
    let region = &html[..head.close];

    let mut spans: Vec<Range<usize>> = scan_tags(region, head.inner_start, "meta")
        .into_iter()
        .filter(is_managed_meta)
        .chain(
            scan_tags(region, head.inner_start, "link")
                .into_iter()
                .filter(is_canonical_link),
        )
        .map(|tag| removal_range(html, tag.span))
        .collect();
    spans.sort_by_key(|span| span.start);

    let mut output = html.to_string();
    for span in spans.into_iter().rev() {
        output.replace_range(span, "");
    }
    Ok(output)
}

/// A tag alone on its line takes the whole line with it.
fn removal_range(html: &str, span: Range<usize>) -> Range<usize> {
    let line_start = html[..span.start].rfind('\n').map_or(0, |index| index + 1);
    if !is_indentation(&html[line_start..span.start]) {
        return span;
    }
    let rest = &html[span.end..];
    let after = span.end + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
    if html[after..].starts_with("\r\n") {
        line_start..after + 2
    } else if html[after..].starts_with('\n') {
        line_start..after + 1
    } else {
        span
    }
}

fn insert_before_head_close(html: &str, tags: &[String]) -> Result<String, DocumentError> {
    let head = require_head(html)?;
    let line_start = html[..head.close].rfind('\n').map(|index| index + 1);

    let (at, block) = match line_start {
        Some(line_start) if is_indentation(&html[line_start..head.close]) => {
            let indent = &html[line_start..head.close];
            let block: String = tags
                .iter()
                .map(|tag| format!("{indent}{BLOCK_INDENT}{tag}\n"))
                .collect();
            (line_start, block)
        }
        _ => (head.close, tags.concat()),
    };

    let mut output = String::with_capacity(html.len() + block.len());
    output.push_str(&html[..at]);
    output.push_str(&block);
    output.push_str(&html[at..]);
    Ok(output)
}

fn is_indentation(text: &str) -> bool {
    text.bytes().all(|byte| byte == b' ' || byte == b'\t')
}
