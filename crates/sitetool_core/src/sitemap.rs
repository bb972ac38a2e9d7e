use std::fs;
use std::path::PathBuf;

use crate::error::{SiteError, SiteResult};
use crate::routes::{ROUTES, RouteDefinition, canonical_url, language_tag};
use crate::runtime::ResolvedPaths;

const URLSET_OPEN: &str = "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">";

/// One `<url>` per language and route, each listing every language variant
/// plus an `x-default` alternate that points at the reference language.
pub fn render_sitemap(site_url: &str, languages: &[String], reference_language: &str) -> String {
    render_sitemap_for(site_url, ROUTES, languages, reference_language)
}

pub fn render_sitemap_for(
    site_url: &str,
    routes: &[RouteDefinition],
    languages: &[String],
    reference_language: &str,
) -> String {
    let mut output = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    output.push_str(URLSET_OPEN);
    output.push('\n');

    for language in languages {
        for route in routes {
            let loc = canonical_url(site_url, language, route.slug);
            output.push_str("  <url>\n");
            output.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&loc)));
            for alternate in languages {
                push_alternate(
                    &mut output,
                    &language_tag(alternate),
                    &canonical_url(site_url, alternate, route.slug),
                );
            }
            push_alternate(
                &mut output,
                "x-default",
                &canonical_url(site_url, reference_language, route.slug),
            );
            let (changefreq, priority) = if route.is_home() {
                ("weekly", "1.0")
            } else {
                ("monthly", "0.8")
            };
            output.push_str(&format!("    <changefreq>{changefreq}</changefreq>\n"));
            output.push_str(&format!("    <priority>{priority}</priority>\n"));
            output.push_str("  </url>\n");
        }
    }

    output.push_str("</urlset>\n");
    output
}

fn push_alternate(output: &mut String, hreflang: &str, href: &str) {
    output.push_str(&format!(
        "    <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>\n",
        escape_xml(hreflang),
        escape_xml(href)
    ));
}

fn escape_xml(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            _ => output.push(ch),
        }
    }
    output
}

/// Writes `sitemap.xml` into the build output, which must already exist.
pub fn write_sitemap(
    paths: &ResolvedPaths,
    site_url: &str,
    languages: &[String],
    reference_language: &str,
) -> SiteResult<PathBuf> {
    if !paths.dist_dir.is_dir() {
        return Err(SiteError::missing("build output directory", &paths.dist_dir));
    }
    let target = paths.sitemap_path();
    let document = render_sitemap(site_url, languages, reference_language);
    fs::write(&target, document).map_err(|error| SiteError::io("write", &target, error))?;
    Ok(target)
}
