use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::config::SiteSettings;
use crate::runtime::INDEX_DOCUMENT;

pub const GENERIC_TITLE_KEY: &str = "meta.title";
pub const GENERIC_DESCRIPTION_KEY: &str = "meta.description";
pub const DEFAULT_TITLE: &str = "IT Consulting & Software Engineering";
pub const DEFAULT_DESCRIPTION: &str =
    "Independent IT consulting: architecture, cloud, and software delivery for growing teams.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDefinition {
    /// URL segment below the language prefix; empty for the landing page.
    pub slug: &'static str,
    /// Primary lookup, then alias lookup.
    pub title_keys: [&'static str; 2],
    pub description_keys: [&'static str; 2],
}

impl RouteDefinition {
    pub fn is_home(&self) -> bool {
        self.slug.is_empty()
    }
}

pub const ROUTES: &[RouteDefinition] = &[
    RouteDefinition {
        slug: "",
        title_keys: ["meta.home.title", "hero.title"],
        description_keys: ["meta.home.description", "hero.subtitle"],
    },
    RouteDefinition {
        slug: "services",
        title_keys: ["meta.services.title", "services.title"],
        description_keys: ["meta.services.description", "services.subtitle"],
    },
    RouteDefinition {
        slug: "about",
        title_keys: ["meta.about.title", "about.title"],
        description_keys: ["meta.about.description", "about.intro"],
    },
    RouteDefinition {
        slug: "contact",
        title_keys: ["meta.contact.title", "contact.title"],
        description_keys: ["meta.contact.description", "contact.subtitle"],
    },
    RouteDefinition {
        slug: "faq",
        title_keys: ["meta.faq.title", "faq.title"],
        description_keys: ["meta.faq.description", "faq.subtitle"],
    },
    RouteDefinition {
        slug: "privacy",
        title_keys: ["meta.privacy.title", "privacy.title"],
        description_keys: ["meta.privacy.description", "privacy.intro"],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMeta {
    pub language: String,
    pub lang_tag: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub og_image_url: String,
}

pub fn enumerate_routes(
    tree: &Value,
    routes: &[RouteDefinition],
    language: &str,
    settings: &SiteSettings,
) -> Vec<RouteMeta> {
    let lang_tag = language_tag(language);
    routes
        .iter()
        .map(|route| RouteMeta {
            language: language.to_string(),
            lang_tag: lang_tag.clone(),
            slug: route.slug.to_string(),
            title: resolve_field(tree, &route.title_keys, GENERIC_TITLE_KEY, DEFAULT_TITLE),
            description: resolve_field(
                tree,
                &route.description_keys,
                GENERIC_DESCRIPTION_KEY,
                DEFAULT_DESCRIPTION,
            ),
            canonical_url: canonical_url(&settings.site_url, language, route.slug),
            og_image_url: settings.og_image_url.clone(),
        })
        .collect()
}

fn resolve_field(tree: &Value, keys: &[&str], generic_key: &str, default: &str) -> String {
    keys.iter()
        .chain(std::iter::once(&generic_key))
        .find_map(|key| lookup_str(tree, key))
        .unwrap_or(default)
        .to_string()
}

/// Resolve a dotted path (`services.faq.2.question`) to a non-empty string.
pub fn lookup_str<'a>(tree: &'a Value, dotted: &str) -> Option<&'a str> {
    let mut cursor = tree;
    for segment in dotted.split('.') {
        cursor = match cursor {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    let text = cursor.as_str()?.trim();
    if text.is_empty() { None } else { Some(text) }
}

/// Map an internal locale code to the tag published in `<html lang>` and `hreflang`.
pub fn language_tag(code: &str) -> String {
    let lowered = code.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "cz" => "cs".to_string(),
        _ => lowered,
    }
}

pub fn canonical_url(site_url: &str, language: &str, slug: &str) -> String {
    let base = site_url.trim_end_matches('/');
    let slug = slug.trim_matches('/');
    if slug.is_empty() {
        format!("{base}/{language}/")
    } else {
        format!("{base}/{language}/{slug}/")
    }
}

pub fn output_path(dist_dir: &Path, language: &str, slug: &str) -> PathBuf {
    let mut path = dist_dir.join(language);
    for segment in slug.split('/').filter(|segment| !segment.is_empty()) {
        path.push(segment);
    }
    path.join(INDEX_DOCUMENT)
}
