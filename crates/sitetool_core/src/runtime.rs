use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{CONFIG_FILENAME, DEFAULT_LOCALES_DIR, SiteConfig, load_config};
use crate::error::display_path;

pub const INDEX_DOCUMENT: &str = "index.html";
pub const SITEMAP_FILENAME: &str = "sitemap.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Heuristic,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        Ok(Self { cwd })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub locales_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub root_source: ValueSource,
    pub config_source: ValueSource,
}

impl ResolvedPaths {
    pub fn locale_path(&self, language: &str) -> PathBuf {
        self.locales_dir.join(format!("{language}.json"))
    }

    /// The bundler's generic render for a language, used as the injection base.
    pub fn base_document_path(&self, language: &str) -> PathBuf {
        self.dist_dir.join(language).join(INDEX_DOCUMENT)
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.dist_dir.join(SITEMAP_FILENAME)
    }

    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\nconfig_path={} ({})\nlocales_dir={}\ndist_dir={}",
            display_path(&self.project_root),
            self.root_source.as_str(),
            display_path(&self.config_path),
            self.config_source.as_str(),
            display_path(&self.locales_dir),
            display_path(&self.dist_dir),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Runtime {
    pub paths: ResolvedPaths,
    pub config: SiteConfig,
}

#[derive(Debug, Clone)]
pub struct RuntimeStatus {
    pub project_root_exists: bool,
    pub config_exists: bool,
    pub locales_dir_exists: bool,
    pub dist_dir_exists: bool,
    pub warnings: Vec<String>,
}

pub fn resolve_runtime(context: &ResolutionContext, overrides: &PathOverrides) -> Result<Runtime> {
    resolve_runtime_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_runtime_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<Runtime>
where
    F: Fn(&str) -> Option<String>,
{
    let (project_root, root_source) = resolve_project_root(context, overrides, &lookup_env);

    let (config_path, config_source) = if let Some(path) = overrides.config.as_deref() {
        (absolutize(path, &project_root), ValueSource::Flag)
    } else if let Some(value) = lookup_env("SITETOOL_CONFIG") {
        (
            absolutize(Path::new(value.trim()), &project_root),
            ValueSource::Env,
        )
    } else {
        (project_root.join(CONFIG_FILENAME), ValueSource::Default)
    };

    let config = load_config(&config_path)?;
    let locales_dir = absolutize(Path::new(config.locales_dir()), &project_root);
    let dist_dir = absolutize(Path::new(config.dist_dir()), &project_root);

    Ok(Runtime {
        paths: ResolvedPaths {
            project_root,
            config_path,
            locales_dir,
            dist_dir,
            root_source,
            config_source,
        },
        config,
    })
}

pub fn inspect_runtime(paths: &ResolvedPaths) -> RuntimeStatus {
    let project_root_exists = paths.project_root.exists();
    let config_exists = paths.config_path.exists();
    let locales_dir_exists = paths.locales_dir.is_dir();
    let dist_dir_exists = paths.dist_dir.is_dir();

    let mut warnings = Vec::new();
    if !config_exists {
        warnings.push(format!(
            "{CONFIG_FILENAME} is missing; built-in defaults are in effect"
        ));
    }
    if !locales_dir_exists {
        warnings.push(format!(
            "locales directory {} is missing; sync-locales has nothing to reconcile",
            display_path(&paths.locales_dir)
        ));
    }
    if !dist_dir_exists {
        warnings.push(format!(
            "build output {} is missing; run the site build before prerender",
            display_path(&paths.dist_dir)
        ));
    }

    RuntimeStatus {
        project_root_exists,
        config_exists,
        locales_dir_exists,
        dist_dir_exists,
        warnings,
    }
}

fn resolve_project_root<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: &F,
) -> (PathBuf, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.project_root.as_deref() {
        return (absolutize(path, &context.cwd), ValueSource::Flag);
    }

    if let Some(value) = lookup_env("SITETOOL_PROJECT_ROOT") {
        return (
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        );
    }

    match detect_project_root_heuristic(&context.cwd) {
        Some(root) => (root, ValueSource::Heuristic),
        None => (context.cwd.clone(), ValueSource::Default),
    }
}

fn detect_project_root_heuristic(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|candidate| {
            candidate.join(CONFIG_FILENAME).is_file() || candidate.join(DEFAULT_LOCALES_DIR).is_dir()
        })
        .map(Path::to_path_buf)
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
