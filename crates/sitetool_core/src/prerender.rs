use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::SiteSettings;
use crate::error::{SiteError, SiteResult};
use crate::inject::inject_meta;
use crate::locales::load_tree;
use crate::routes::{
    ROUTES, RouteDefinition, RouteMeta, enumerate_routes, language_tag, output_path,
};
use crate::runtime::ResolvedPaths;

#[derive(Debug, Clone)]
pub struct RenderedRoute {
    pub meta: RouteMeta,
    pub output_path: PathBuf,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrerenderReport {
    pub language: String,
    pub lang_tag: String,
    pub written: Vec<PathBuf>,
}

/// Build every route document for one language without touching the disk.
pub fn render_language(
    paths: &ResolvedPaths,
    settings: &SiteSettings,
    routes: &[RouteDefinition],
    language: &str,
) -> SiteResult<Vec<RenderedRoute>> {
    let base_path = paths.base_document_path(language);
    let base_document = fs::read_to_string(&base_path).map_err(|error| match error.kind() {
        ErrorKind::NotFound => SiteError::missing("rendered document", &base_path),
        _ => SiteError::io("read", &base_path, error),
    })?;
    let tree = load_tree(&paths.locale_path(language))?;

    let mut rendered = Vec::with_capacity(routes.len());
    for meta in enumerate_routes(&tree, routes, language, settings) {
        let html = inject_meta(&base_document, &meta, settings)
            .map_err(|error| SiteError::malformed(&base_path, error.to_string()))?;
        rendered.push(RenderedRoute {
            output_path: output_path(&paths.dist_dir, language, &meta.slug),
            meta,
            html,
        });
    }
    Ok(rendered)
}

/// Render first, then write; a failed input check leaves the language untouched.
pub fn prerender_language(
    paths: &ResolvedPaths,
    settings: &SiteSettings,
    language: &str,
) -> SiteResult<PrerenderReport> {
    let rendered = render_language(paths, settings, ROUTES, language)?;
    let lang_tag = rendered
        .first()
        .map(|route| route.meta.lang_tag.clone())
        .unwrap_or_else(|| language_tag(language));

    let mut written = Vec::with_capacity(rendered.len());
    for route in rendered {
        if let Some(parent) = route.output_path.parent() {
            fs::create_dir_all(parent).map_err(|error| SiteError::io("create", parent, error))?;
        }
        fs::write(&route.output_path, &route.html)
            .map_err(|error| SiteError::io("write", &route.output_path, error))?;
        written.push(route.output_path);
    }

    Ok(PrerenderReport {
        language: language.to_string(),
        lang_tag,
        written,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{prerender_language, render_language};
    use crate::config::SiteSettings;
    use crate::error::SiteError;
    use crate::routes::ROUTES;
    use crate::runtime::{ResolvedPaths, ValueSource};

    const BASE_DOCUMENT: &str = "<!doctype html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"UTF-8\" />\n    <title>Site</title>\n    <meta name=\"description\" content=\"generic\" />\n  </head>\n  <body><div id=\"root\"></div></body>\n</html>\n";

    fn layout(root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            project_root: root.to_path_buf(),
            config_path: root.join("sitetool.toml"),
            locales_dir: root.join("locales"),
            dist_dir: root.join("dist"),
            root_source: ValueSource::Flag,
            config_source: ValueSource::Default,
        }
    }

    fn settings() -> SiteSettings {
        SiteSettings {
            site_url: "https://consulting.example".to_string(),
            og_image_url: "https://consulting.example/og-image.png".to_string(),
            twitter_site: "@consulting".to_string(),
        }
    }

    fn seed(paths: &ResolvedPaths, language: &str, translations: &str) {
        fs::create_dir_all(&paths.locales_dir).expect("create locales");
        fs::create_dir_all(paths.dist_dir.join(language)).expect("create dist");
        fs::write(paths.locale_path(language), translations).expect("write locale");
        fs::write(paths.base_document_path(language), BASE_DOCUMENT).expect("write base");
    }

    #[test]
    fn writes_one_document_per_route() {
        let temp = tempdir().expect("tempdir");
        let paths = layout(temp.path());
        seed(
            &paths,
            "cz",
            r#"{"meta": {"title": "Konzultace", "description": "IT poradenstvi", "services": {"title": "Sluzby"}}}"#,
        );

        let report = prerender_language(&paths, &settings(), "cz").expect("prerender");
        assert_eq!(report.lang_tag, "cs");
        assert_eq!(report.written.len(), ROUTES.len());

        let services = fs::read_to_string(paths.dist_dir.join("cz").join("services").join("index.html"))
            .expect("read services");
        assert!(services.contains("<html lang=\"cs\">"));
        assert!(services.contains("<title>Sluzby</title>"));
        assert!(services.contains(
            "<link rel=\"canonical\" href=\"https://consulting.example/cz/services/\">"
        ));
        assert!(!services.contains("generic"));

        let home = fs::read_to_string(paths.base_document_path("cz")).expect("read home");
        assert!(home.contains("<title>Konzultace</title>"));
        assert!(home.contains("content=\"https://consulting.example/cz/\""));
    }

    #[test]
    fn rerunning_over_rewritten_home_is_stable() {
        let temp = tempdir().expect("tempdir");
        let paths = layout(temp.path());
        seed(&paths, "de", r#"{"hero": {"title": "Willkommen"}}"#);

        prerender_language(&paths, &settings(), "de").expect("first run");
        let first = render_language(&paths, &settings(), ROUTES, "de").expect("render");
        prerender_language(&paths, &settings(), "de").expect("second run");
        let second = render_language(&paths, &settings(), ROUTES, "de").expect("render again");

        let first_html: Vec<&str> = first.iter().map(|route| route.html.as_str()).collect();
        let second_html: Vec<&str> = second.iter().map(|route| route.html.as_str()).collect();
        assert_eq!(first_html, second_html);
    }

    #[test]
    fn missing_build_output_fails_without_writing() {
        let temp = tempdir().expect("tempdir");
        let paths = layout(temp.path());
        fs::create_dir_all(&paths.locales_dir).expect("create locales");
        fs::write(paths.locale_path("de"), "{}").expect("write locale");

        let error = prerender_language(&paths, &settings(), "de").expect_err("must fail");
        assert!(matches!(error, SiteError::MissingInput { .. }));
        assert_eq!(error.path(), paths.base_document_path("de"));
        assert!(!paths.dist_dir.exists());
    }

    #[test]
    fn missing_translations_fail_without_writing() {
        let temp = tempdir().expect("tempdir");
        let paths = layout(temp.path());
        fs::create_dir_all(paths.dist_dir.join("fr")).expect("create dist");
        fs::write(paths.base_document_path("fr"), BASE_DOCUMENT).expect("write base");

        let error = prerender_language(&paths, &settings(), "fr").expect_err("must fail");
        assert_eq!(error.path(), paths.locale_path("fr"));
        assert!(!paths.dist_dir.join("fr").join("services").exists());
        assert_eq!(
            fs::read_to_string(paths.base_document_path("fr")).expect("read base"),
            BASE_DOCUMENT
        );
    }

    #[test]
    fn malformed_base_document_names_the_file() {
        let temp = tempdir().expect("tempdir");
        let paths = layout(temp.path());
        seed(&paths, "en", "{}");
        fs::write(paths.base_document_path("en"), "<html><body></body></html>")
            .expect("overwrite base");

        let error = prerender_language(&paths, &settings(), "en").expect_err("must fail");
        assert!(matches!(error, SiteError::MalformedInput { .. }));
        assert!(error.to_string().contains("no <head> element"));
    }
}
