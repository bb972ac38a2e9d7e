use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use sitetool_core::audit::audit_language;
use sitetool_core::locales::{
    LanguageSync, apply_plan, load_tree, plan_sync, resolve_languages,
};
use sitetool_core::prerender::prerender_language;
use sitetool_core::routes::{ROUTES, enumerate_routes};
use sitetool_core::runtime::{
    PathOverrides, ResolutionContext, Runtime, inspect_runtime, resolve_runtime,
};
use sitetool_core::sitemap::write_sitemap;

#[derive(Debug, Parser)]
#[command(
    name = "sitetool",
    version,
    about = "Locale reconciliation and static SEO prerendering for a multilingual site"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    config: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            config: cli.config.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(
        name = "sync-locales",
        about = "Fill missing translation keys from the reference locale"
    )]
    SyncLocales(SyncLocalesArgs),
    #[command(about = "Write per-route HTML with localized SEO metadata into the build output")]
    Prerender(LanguagesArgs),
    #[command(about = "Write sitemap.xml with hreflang alternates into the build output")]
    Sitemap,
    #[command(about = "Print resolved route metadata for one language as JSON")]
    Routes(RoutesArgs),
    #[command(about = "Check prerendered documents for missing or duplicated SEO tags")]
    Audit(LanguagesArgs),
    #[command(about = "Show resolved layout and which inputs exist")]
    Status,
}

#[derive(Debug, Args)]
struct SyncLocalesArgs {
    #[arg(value_name = "LANG", help = "Target languages (default: all but the reference)")]
    languages: Vec<String>,
    #[arg(long, value_name = "LANG", help = "Reference locale to copy missing keys from")]
    reference: Option<String>,
    #[arg(long, help = "Report drift as a diff and fail instead of writing")]
    check: bool,
}

#[derive(Debug, Args)]
struct LanguagesArgs {
    #[arg(value_name = "LANG", help = "Languages to process (default: all)")]
    languages: Vec<String>,
}

#[derive(Debug, Args)]
struct RoutesArgs {
    language: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::SyncLocales(args)) => run_sync_locales(&runtime, args),
        Some(Commands::Prerender(args)) => run_prerender(&runtime, args),
        Some(Commands::Sitemap) => run_sitemap(&runtime),
        Some(Commands::Routes(args)) => run_routes(&runtime, args),
        Some(Commands::Audit(args)) => run_audit(&runtime, args),
        Some(Commands::Status) => run_status(&runtime),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_sync_locales(runtime: &RuntimeOptions, args: SyncLocalesArgs) -> Result<()> {
    let resolved = resolve_site_runtime(runtime)?;
    let paths = &resolved.paths;
    let reference = args
        .reference
        .unwrap_or_else(|| resolved.config.reference_locale());
    let targets = if args.languages.is_empty() {
        resolve_languages(&resolved.config.locales.languages, &paths.locales_dir)?
            .into_iter()
            .filter(|language| *language != reference)
            .collect()
    } else {
        args.languages
    };

    println!("sync locales");
    println!("locales_dir: {}", normalize_path(&paths.locales_dir));
    println!("reference: {reference}");
    println!("mode: {}", if args.check { "check" } else { "write" });
    if targets.is_empty() {
        println!("targets: <none>");
        return Ok(());
    }

    let plans = plan_sync(&paths.locales_dir, &reference, &targets)?;
    let mut drifted = Vec::new();
    let mut failed = Vec::new();
    for LanguageSync { language, outcome } in &plans {
        let plan = match outcome {
            Ok(plan) => plan,
            Err(error) => {
                eprintln!("[{language}] skipped: {error}");
                failed.push(language.clone());
                continue;
            }
        };
        println!("[{language}] filled: {}", plan.filled_paths.len());
        for path in plan.sample() {
            println!("  - {path}");
        }
        let hidden = plan.filled_paths.len() - plan.sample().len();
        if hidden > 0 {
            println!("  ... and {hidden} more");
        }

        if args.check {
            if plan.changes_file() {
                print!("{}", plan.unified_diff());
                drifted.push(language.clone());
            }
            continue;
        }
        match apply_plan(plan) {
            Ok(wrote) => println!(
                "[{language}] {}: {}",
                if wrote { "updated" } else { "unchanged" },
                normalize_path(&plan.path)
            ),
            Err(error) => {
                eprintln!("[{language}] skipped: {error}");
                failed.push(language.clone());
            }
        }
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    if !failed.is_empty() {
        bail!(
            "sync-locales failed for {} of {} languages: {}",
            failed.len(),
            plans.len(),
            failed.join(", ")
        );
    }
    if !drifted.is_empty() {
        bail!(
            "locale files out of sync with `{reference}`: {}",
            drifted.join(", ")
        );
    }
    Ok(())
}

fn run_prerender(runtime: &RuntimeOptions, args: LanguagesArgs) -> Result<()> {
    let resolved = resolve_site_runtime(runtime)?;
    let paths = &resolved.paths;
    let settings = resolved.config.settings();
    let languages = selected_languages(&resolved, args.languages)?;

    println!("prerender");
    println!("dist_dir: {}", normalize_path(&paths.dist_dir));
    println!("site_url: {}", settings.site_url);

    let mut failed = Vec::new();
    for language in &languages {
        match prerender_language(paths, &settings, language) {
            Ok(report) => {
                println!(
                    "[{}] lang={} routes: {}",
                    report.language,
                    report.lang_tag,
                    report.written.len()
                );
                for path in &report.written {
                    println!("  - {}", normalize_path(path));
                }
            }
            Err(error) => {
                eprintln!("[{language}] skipped: {error}");
                failed.push(language.clone());
            }
        }
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    if !failed.is_empty() {
        bail!(
            "prerender failed for {} of {} languages: {}",
            failed.len(),
            languages.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

fn run_sitemap(runtime: &RuntimeOptions) -> Result<()> {
    let resolved = resolve_site_runtime(runtime)?;
    let paths = &resolved.paths;
    let site_url = resolved.config.site_url();
    let reference = resolved.config.reference_locale();
    let languages = selected_languages(&resolved, Vec::new())?;

    let written = write_sitemap(paths, &site_url, &languages, &reference)?;
    println!("sitemap");
    println!("path: {}", normalize_path(&written));
    println!("languages: {}", languages.join(", "));
    println!("urls: {}", languages.len() * ROUTES.len());
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
    Ok(())
}

fn run_routes(runtime: &RuntimeOptions, args: RoutesArgs) -> Result<()> {
    let resolved = resolve_site_runtime(runtime)?;
    let tree = load_tree(&resolved.paths.locale_path(&args.language))?;
    let routes = enumerate_routes(
        &tree,
        ROUTES,
        &args.language,
        &resolved.config.settings(),
    );
    println!("{}", serde_json::to_string_pretty(&routes)?);
    Ok(())
}

fn run_audit(runtime: &RuntimeOptions, args: LanguagesArgs) -> Result<()> {
    let resolved = resolve_site_runtime(runtime)?;
    let paths = &resolved.paths;
    let languages = selected_languages(&resolved, args.languages)?;

    println!("seo audit");
    println!("dist_dir: {}", normalize_path(&paths.dist_dir));
    let mut problems = 0usize;
    for language in &languages {
        for route in audit_language(paths, language)? {
            let label = if route.slug.is_empty() { "/" } else { route.slug.as_str() };
            let Some(document) = route.document else {
                println!("[{language}] {label}: not prerendered");
                problems += 1;
                continue;
            };
            if document.is_clean() {
                println!("[{language}] {label}: ok");
                continue;
            }
            problems += 1;
            println!("[{language}] {label}: {}", normalize_path(&route.path));
            if !document.missing.is_empty() {
                println!("  missing: {}", document.missing.join(", "));
            }
            if !document.duplicates.is_empty() {
                println!("  duplicates: {}", document.duplicates.join(", "));
            }
        }
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    if problems > 0 {
        bail!("seo audit found {problems} route(s) with problems");
    }
    Ok(())
}

fn run_status(runtime: &RuntimeOptions) -> Result<()> {
    let resolved = resolve_site_runtime(runtime)?;
    let paths = &resolved.paths;
    let status = inspect_runtime(paths);
    let languages = resolve_languages(&resolved.config.locales.languages, &paths.locales_dir)?;

    println!("runtime status");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!(
        "project_root_exists: {}",
        format_flag(status.project_root_exists)
    );
    println!("config_path: {}", normalize_path(&paths.config_path));
    println!("config_exists: {}", format_flag(status.config_exists));
    println!("locales_dir: {}", normalize_path(&paths.locales_dir));
    println!(
        "locales_dir_exists: {}",
        format_flag(status.locales_dir_exists)
    );
    println!("dist_dir: {}", normalize_path(&paths.dist_dir));
    println!("dist_dir_exists: {}", format_flag(status.dist_dir_exists));
    println!("site_url: {}", resolved.config.site_url());
    println!("reference: {}", resolved.config.reference_locale());
    if languages.is_empty() {
        println!("languages: <none>");
    } else {
        println!("languages: {}", languages.join(", "));
    }
    if !status.warnings.is_empty() {
        println!("warnings:");
        for warning in &status.warnings {
            println!("  - {warning}");
        }
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn selected_languages(resolved: &Runtime, requested: Vec<String>) -> Result<Vec<String>> {
    if !requested.is_empty() {
        return Ok(requested);
    }
    let languages = resolve_languages(
        &resolved.config.locales.languages,
        &resolved.paths.locales_dir,
    )?;
    if languages.is_empty() {
        bail!(
            "no languages configured and no locale files found in {}",
            normalize_path(&resolved.paths.locales_dir)
        );
    }
    Ok(languages)
}

fn resolve_site_runtime(runtime: &RuntimeOptions) -> Result<Runtime> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        config: runtime.config.clone(),
    };

    let initial = resolve_runtime(&context, &overrides)?;
    let project_env = initial.paths.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    resolve_runtime(&context, &overrides)
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
