use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use similar::TextDiff;
use walkdir::WalkDir;

use crate::error::{SiteError, SiteResult, display_path};
use crate::reconcile::reconcile;

/// How many filled paths a console report lists before truncating.
pub const REPORT_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct LocaleSyncPlan {
    pub language: String,
    pub path: PathBuf,
    pub filled_paths: Vec<String>,
    pub original: String,
    pub rendered: String,
}

impl LocaleSyncPlan {
    pub fn changes_file(&self) -> bool {
        self.original != self.rendered
    }

    pub fn sample(&self) -> &[String] {
        &self.filled_paths[..self.filled_paths.len().min(REPORT_SAMPLE_LIMIT)]
    }

    pub fn unified_diff(&self) -> String {
        let label = display_path(&self.path);
        TextDiff::from_lines(self.original.as_str(), self.rendered.as_str())
            .unified_diff()
            .context_radius(2)
            .header(&label, &label)
            .to_string()
    }
}

pub fn load_tree(path: &Path) -> SiteResult<Value> {
    let content = read_locale_file(path)?;
    parse_tree(path, &content)
}

fn read_locale_file(path: &Path) -> SiteResult<String> {
    fs::read_to_string(path).map_err(|error| match error.kind() {
        ErrorKind::NotFound => SiteError::missing("translation file", path),
        _ => SiteError::io("read", path, error),
    })
}

fn parse_tree(path: &Path, content: &str) -> SiteResult<Value> {
    let value: Value = serde_json::from_str(content)
        .map_err(|error| SiteError::malformed(path, error.to_string()))?;
    if !value.is_object() {
        return Err(SiteError::malformed(
            path,
            "top-level value must be a JSON object",
        ));
    }
    Ok(value)
}

/// Pretty-printed, two-space indented, newline-terminated.
pub fn render_tree(value: &Value) -> String {
    let mut rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    rendered.push('\n');
    rendered
}

/// Language codes of every `*.json` file directly inside the locales directory.
pub fn discover_languages(locales_dir: &Path) -> Result<Vec<String>> {
    if !locales_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut languages = Vec::new();
    for entry in WalkDir::new(locales_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry = entry.with_context(|| format!("failed to walk {}", locales_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            languages.push(stem.to_string());
        }
    }
    languages.sort();
    Ok(languages)
}

/// Configured languages win; an empty list falls back to the files on disk.
pub fn resolve_languages(configured: &[String], locales_dir: &Path) -> Result<Vec<String>> {
    let cleaned: Vec<String> = configured
        .iter()
        .map(|language| language.trim().to_string())
        .filter(|language| !language.is_empty())
        .collect();
    if !cleaned.is_empty() {
        return Ok(cleaned);
    }
    discover_languages(locales_dir)
}

/// One target language's planned sync, or the reason its pass was skipped.
#[derive(Debug)]
pub struct LanguageSync {
    pub language: String,
    pub outcome: SiteResult<LocaleSyncPlan>,
}

/// The reference tree is the only shared precondition. Each target is then
/// loaded and reconciled on its own, so a missing or malformed file fails
/// that language alone. Nothing is written here.
pub fn plan_sync(
    locales_dir: &Path,
    reference_language: &str,
    languages: &[String],
) -> Result<Vec<LanguageSync>> {
    if languages.iter().any(|language| language == reference_language) {
        bail!("reference locale `{reference_language}` cannot also be a sync target");
    }

    let reference_path = locales_dir.join(format!("{reference_language}.json"));
    let reference = load_tree(&reference_path)?;

    Ok(languages
        .iter()
        .map(|language| LanguageSync {
            language: language.clone(),
            outcome: plan_language(locales_dir, &reference, language),
        })
        .collect())
}

fn plan_language(
    locales_dir: &Path,
    reference: &Value,
    language: &str,
) -> SiteResult<LocaleSyncPlan> {
    let path = locales_dir.join(format!("{language}.json"));
    let original = read_locale_file(&path)?;
    let tree = parse_tree(&path, &original)?;
    let outcome = reconcile(reference, &tree);
    Ok(LocaleSyncPlan {
        language: language.to_string(),
        path,
        filled_paths: outcome.filled_paths,
        rendered: render_tree(&outcome.merged),
        original,
    })
}

/// Returns `true` when the file was rewritten.
pub fn apply_plan(plan: &LocaleSyncPlan) -> SiteResult<bool> {
    if !plan.changes_file() {
        return Ok(false);
    }
    fs::write(&plan.path, &plan.rendered)
        .map_err(|error| SiteError::io("write", &plan.path, error))?;
    Ok(true)
}
