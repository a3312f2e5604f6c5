//! Command implementations shared by CLI and MCP server.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::corpus::{Candidate, Collection, CorpusError};
use crate::search::Searcher;
use crate::search::dispatch::{
    Category, CategoryItems, CategoryResults, Dispatcher, ManualScheduler, PendingSearch,
    search_categories,
};

/// Fields tried, in order, when choosing a display label for a result.
const LABEL_FIELDS: [&str; 4] = ["formattedTitle", "name", "label", "title"];

/// Parameters for a one-shot search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    /// Restrict the search to this category.
    pub category: Option<String>,
    /// Page size overriding each category's limit.
    pub limit: Option<usize>,
    pub offset: usize,
    pub min_score: Option<f64>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

/// A configured category and the state of its collection file.
#[derive(Debug, Clone)]
pub struct CategoryInfo {
    pub name: String,
    pub search_fields: Vec<String>,
    pub limit: usize,
    pub path: PathBuf,
    /// Number of records, or `None` if the file could not be loaded.
    pub records: Option<usize>,
}

/// Load the collection of every configured category from the data directory.
///
/// Missing files are skipped. Files that fail to load are reported as
/// warnings as long as at least one collection loaded.
///
/// # Errors
///
/// Returns an error if no collection could be loaded at all.
pub fn load_items(config: &Config) -> anyhow::Result<CategoryItems> {
    let mut items = CategoryItems::new();
    let mut errors = Vec::new();

    for category in &config.categories {
        let path = config.collection_path(category);

        match Collection::load(&category.name, &path) {
            Ok(collection) => {
                info!(
                    category = %category.name,
                    records = collection.len(),
                    path = %path.display(),
                    "Loaded collection"
                );
                items.insert(category.name.clone(), collection);
            }
            Err(CorpusError::NotFound(path)) => {
                debug!(category = %category.name, path = %path.display(), "No collection file");
            }
            Err(e) => errors.push(format!("Load {}: {e}", path.display())),
        }
    }

    if items.is_empty() {
        if errors.is_empty() {
            anyhow::bail!(
                "No collections found in {}",
                config.data_dir().display()
            );
        }
        anyhow::bail!("Loading collections failed:\n  {}", errors.join("\n  "));
    }

    for error in &errors {
        warn!("{error}");
    }

    Ok(items)
}

/// Resolve which categories a request searches, applying its overrides.
///
/// # Errors
///
/// Returns an error if the request names a category that isn't configured.
pub fn resolve_categories(
    config: &Config,
    request: &SearchRequest,
) -> anyhow::Result<Vec<Category>> {
    let mut categories = config.categories();

    if let Some(wanted) = &request.category {
        categories.retain(|category| &category.name == wanted);
        if categories.is_empty() {
            let available: Vec<_> = config.categories.iter().map(|c| c.name.as_str()).collect();
            anyhow::bail!(
                "Unknown category: {wanted} (available: {})",
                available.join(", ")
            );
        }
    }

    for category in &mut categories {
        if let Some(limit) = request.limit {
            category.options.limit = limit;
        }
        if let Some(min_score) = request.min_score {
            category.options.min_score = min_score;
        }
        category.options.offset = request.offset;
    }

    Ok(categories)
}

/// Search the configured collections once.
///
/// # Errors
///
/// Returns an error if the category is unknown or no collection loads.
pub fn search(config: &Config, request: &SearchRequest) -> anyhow::Result<CategoryResults> {
    let categories = resolve_categories(config, request)?;
    let items = load_items(config)?;
    let mut searcher = Searcher::with_settings(config.cache_settings());

    Ok(search_categories(
        &mut searcher,
        &categories,
        &request.query,
        &items,
    ))
}

/// Search already-loaded collections with a caller-owned searcher.
///
/// # Errors
///
/// Returns an error if the category is unknown.
pub fn search_loaded(
    config: &Config,
    searcher: &mut Searcher,
    items: &CategoryItems,
    request: &SearchRequest,
) -> anyhow::Result<CategoryResults> {
    let categories = resolve_categories(config, request)?;
    Ok(search_categories(searcher, &categories, &request.query, items))
}

/// Describe the configured categories.
#[must_use]
pub fn categories(config: &Config) -> Vec<CategoryInfo> {
    config
        .categories
        .iter()
        .map(|category| {
            let path = config.collection_path(category);
            let records = Collection::load(&category.name, &path)
                .ok()
                .map(|collection| collection.len());

            CategoryInfo {
                name: category.name.clone(),
                search_fields: category.search_fields.clone(),
                limit: category.limit,
                path,
                records,
            }
        })
        .collect()
}

/// Feed queries from `input`, one per line, through a debounced dispatcher
/// and write every published result set to `output`.
///
/// Lines are timed against the wall clock, so a burst of lines arriving
/// within the quiet window produces a single publish. End of input flushes
/// the pending query.
///
/// # Returns
///
/// The number of result sets written.
///
/// # Errors
///
/// Returns an error if no collection loads or reading/writing fails.
pub fn watch<R: BufRead, W: Write>(
    config: &Config,
    input: R,
    output: &mut W,
    json: bool,
) -> anyhow::Result<usize> {
    let items = load_items(config)?;
    let searcher = Searcher::with_settings(config.cache_settings());
    let mut dispatcher = Dispatcher::new(searcher, ManualScheduler::new(), config.categories())
        .with_quiet_window(config.quiet_window());
    let mut published = 0;

    for line in input.lines() {
        let line = line.context("Failed to read query")?;

        dispatcher.scheduler_mut().advance_to(Instant::now());
        if dispatcher.poll().is_some() {
            write_published(&dispatcher, output, json)?;
            published += 1;
        }

        dispatcher.search(line.trim(), items.clone());
    }

    dispatcher.scheduler_mut().advance_to(Instant::now());
    if dispatcher.poll().is_some() || dispatcher.flush().is_some() {
        write_published(&dispatcher, output, json)?;
        published += 1;
    }

    Ok(published)
}

fn write_published<W: Write>(
    dispatcher: &Dispatcher<ManualScheduler<PendingSearch>>,
    output: &mut W,
    json: bool,
) -> anyhow::Result<()> {
    let (Some(query), Some(results)) = (dispatcher.latest_query(), dispatcher.latest()) else {
        return Ok(());
    };

    if json {
        let line = serde_json::json!({ "query": query, "results": results });
        writeln!(output, "{line}")?;
    } else {
        writeln!(output, "> {query}")?;
        write!(output, "{}", render_text(query, results))?;
    }
    output.flush()?;
    Ok(())
}

/// Human-readable listing of `results`.
#[must_use]
pub fn render_text(query: &str, results: &CategoryResults) -> String {
    let mut output = String::new();

    if results.total() == 0 {
        let _ = writeln!(output, "No matches found for '{query}'");
        return output;
    }

    let mut shown = 0;
    for (category, ranked) in results.iter() {
        if ranked.is_empty() {
            continue;
        }

        let _ = writeln!(output, "## {category} ({} match(es))", ranked.total);
        for (candidate, score) in ranked.iter() {
            let _ = writeln!(output, "  {score:.2}  {}", display_label(candidate));
            shown += 1;
        }
        if ranked.has_more {
            let _ = writeln!(output, "  ...");
        }
        output.push('\n');
    }
    let _ = writeln!(output, "{shown} result(s) found");

    output
}

/// A short label for a candidate: its first naming field, plus its number.
#[must_use]
pub fn display_label(candidate: &Candidate) -> String {
    let name = LABEL_FIELDS
        .iter()
        .find_map(|field| candidate.field_text(field));
    let number = candidate.field_text("number");

    match (name, number) {
        (Some(name), Some(number)) => format!("{name} (#{number})"),
        (Some(name), None) => name.into_owned(),
        (None, Some(number)) => format!("#{number}"),
        (None, None) => serde_json::Value::Object(candidate.fields().clone()).to_string(),
    }
}
