use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{SiteError, SiteResult};
use crate::html::{
    TagMatch, decode_html, find_tag_end, find_tag_start, head_bounds, index_of_ignore_case,
    parse_attributes, scan_tags,
};
use crate::inject::{is_canonical_link, is_managed_meta};
use crate::routes::{ROUTES, output_path};
use crate::runtime::ResolvedPaths;

/// Meta keys every prerendered route is expected to carry exactly once.
pub const REQUIRED_META: &[&str] = &[
    "description",
    "og:title",
    "og:description",
    "og:image",
    "og:url",
    "twitter:card",
    "twitter:site",
    "twitter:image",
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentAudit {
    pub lang: Option<String>,
    pub title: Option<String>,
    pub meta: BTreeMap<String, Vec<String>>,
    pub canonical: Vec<String>,
    pub missing: Vec<String>,
    pub duplicates: Vec<String>,
}

impl DocumentAudit {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.duplicates.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteAudit {
    pub slug: String,
    pub path: PathBuf,
    /// `None` when the route was never prerendered.
    pub document: Option<DocumentAudit>,
}

pub fn audit_document(html: &str) -> DocumentAudit {
    let head = match head_bounds(html) {
        Some(Some(bounds)) => &html[bounds.inner_start..bounds.close],
        _ => html,
    };

    let mut meta: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for tag in scan_tags(head, 0, "meta").iter().filter(|tag| is_managed_meta(tag)) {
        let Some(key) = meta_key(tag) else {
            continue;
        };
        let content = decode_html(tag.attr("content").unwrap_or_default())
            .trim()
            .to_string();
        meta.entry(key).or_default().push(content);
    }
    let canonical: Vec<String> = scan_tags(head, 0, "link")
        .iter()
        .filter(|tag| is_canonical_link(tag))
        .map(|tag| decode_html(tag.attr("href").unwrap_or_default()).trim().to_string())
        .collect();

    let lang = extract_lang(html);
    let title = extract_title(head);

    let mut missing = Vec::new();
    if lang.is_none() {
        missing.push("html lang".to_string());
    }
    if title.is_none() {
        missing.push("title tag".to_string());
    }
    for key in REQUIRED_META {
        let present = meta
            .get(*key)
            .is_some_and(|values| values.iter().any(|value| !value.is_empty()));
        if !present {
            missing.push((*key).to_string());
        }
    }
    if canonical.iter().all(String::is_empty) {
        missing.push("canonical link".to_string());
    }

    let mut duplicates: Vec<String> = meta
        .iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(key, _)| key.clone())
        .collect();
    if canonical.len() > 1 {
        duplicates.push("canonical link".to_string());
    }

    DocumentAudit {
        lang,
        title,
        meta,
        canonical,
        missing,
        duplicates,
    }
}

fn meta_key(tag: &TagMatch) -> Option<String> {
    tag.attr("property")
        .or_else(|| tag.attr("name"))
        .map(str::to_ascii_lowercase)
}

fn extract_lang(html: &str) -> Option<String> {
    let start = find_tag_start(html, "html", 0)?;
    let end = find_tag_end(html, start)?;
    parse_attributes(&html[start..=end], "html")
        .into_iter()
        .find(|attr| attr.name == "lang")
        .map(|attr| attr.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn extract_title(head: &str) -> Option<String> {
    let start = find_tag_start(head, "title", 0)?;
    let open_end = find_tag_end(head, start)?;
    let close = index_of_ignore_case(head, "</title", open_end + 1)?;
    let decoded = decode_html(&head[open_end + 1..close]);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read every route document a prerender pass produces for `language`.
pub fn audit_language(paths: &ResolvedPaths, language: &str) -> SiteResult<Vec<RouteAudit>> {
    let mut audits = Vec::with_capacity(ROUTES.len());
    for route in ROUTES {
        let path = output_path(&paths.dist_dir, language, route.slug);
        let document = match fs::read_to_string(&path) {
            Ok(html) => Some(audit_document(&html)),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => return Err(SiteError::io("read", &path, error)),
        };
        audits.push(RouteAudit {
            slug: route.slug.to_string(),
            path,
            document,
        });
    }
    Ok(audits)
}
