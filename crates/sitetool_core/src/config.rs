use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "sitetool.toml";
pub const DEFAULT_SITE_URL: &str = "https://example.com";
pub const DEFAULT_OG_IMAGE: &str = "/og-image.png";
pub const DEFAULT_TWITTER_SITE: &str = "@example";
pub const DEFAULT_REFERENCE_LOCALE: &str = "en";
pub const DEFAULT_LOCALES_DIR: &str = "locales";
pub const DEFAULT_DIST_DIR: &str = "dist";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub locales: LocalesSection,
    #[serde(default)]
    pub build: BuildSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteSection {
    pub url: Option<String>,
    pub og_image: Option<String>,
    pub twitter_site: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct LocalesSection {
    pub dir: Option<String>,
    pub reference: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BuildSection {
    pub dist_dir: Option<String>,
}

pub type EnvLookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Site-wide values the injector and sitemap need, with overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub site_url: String,
    pub og_image_url: String,
    pub twitter_site: String,
}

impl SiteConfig {
    /// Resolve the public site URL: env SITE_URL > config > DEFAULT_SITE_URL.
    pub fn site_url(&self) -> String {
        self.site_url_with_lookup(&|key: &str| env::var(key).ok())
    }

    /// Resolve the reference locale: env SITETOOL_REFERENCE_LOCALE > config > "en".
    pub fn reference_locale(&self) -> String {
        self.reference_locale_with_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn settings(&self) -> SiteSettings {
        self.settings_with_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn settings_with_lookup(&self, lookup_env: &EnvLookup<'_>) -> SiteSettings {
        let site_url = self.site_url_with_lookup(lookup_env);
        let og_image = self
            .site
            .og_image
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_OG_IMAGE);
        let og_image_url = absolutize_url(&site_url, og_image);
        let twitter_site = self
            .site
            .twitter_site
            .clone()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TWITTER_SITE.to_string());
        SiteSettings {
            site_url,
            og_image_url,
            twitter_site,
        }
    }

    pub fn locales_dir(&self) -> &str {
        self.locales.dir.as_deref().unwrap_or(DEFAULT_LOCALES_DIR)
    }

    pub fn dist_dir(&self) -> &str {
        self.build.dist_dir.as_deref().unwrap_or(DEFAULT_DIST_DIR)
    }

    fn site_url_with_lookup(&self, lookup_env: &EnvLookup<'_>) -> String {
        let raw = non_empty_env(lookup_env, "SITE_URL")
            .or_else(|| self.site.url.clone())
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        raw.trim().trim_end_matches('/').to_string()
    }

    fn reference_locale_with_lookup(&self, lookup_env: &EnvLookup<'_>) -> String {
        non_empty_env(lookup_env, "SITETOOL_REFERENCE_LOCALE")
            .or_else(|| self.locales.reference.clone())
            .unwrap_or_else(|| DEFAULT_REFERENCE_LOCALE.to_string())
    }
}

/// Load and parse a SiteConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<SiteConfig> {
    if !config_path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: SiteConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

fn non_empty_env(lookup_env: &EnvLookup<'_>, key: &str) -> Option<String> {
    lookup_env(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn absolutize_url(site_url: &str, value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    format!("{site_url}/{}", value.trim_start_matches('/'))
}
