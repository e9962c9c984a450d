//! Stage handlers and the dispatch table
//!
//! Each handler is a plain function from `(page, request)` to a finite
//! [`StageOutput`]. The controller looks handlers up by [`Stage`] in a fixed
//! table instead of carrying callbacks on requests.

use crate::config::SelectorConfig;
use crate::pipeline::{
    normalize_part_type, parse_part_number, validate, ContextKey, FetchRequest, Page,
    ProductRecord, Stage,
};
use crate::url::resolve_link;
use crate::{ConfigError, ConfigResult, PipelineResult};
use scraper::Selector;

/// Everything one handler invocation produced
#[derive(Debug, Default)]
pub struct StageOutput {
    /// Follow-up requests for the next stage
    pub requests: Vec<FetchRequest>,

    /// Validated records (terminal stage only)
    pub records: Vec<ProductRecord>,

    /// Entries skipped for missing text or link
    pub skipped: usize,

    /// Records rejected by the validator
    pub dropped: usize,

    /// The listing had no entries at all
    pub empty_listing: bool,
}

/// Compiled selectors for every stage
#[derive(Debug, Clone)]
pub struct StageSelectors {
    makes: Selector,
    categories: Selector,
    models: Selector,
    parts: Selector,
    link: Selector,
    part_type: Selector,
}

impl StageSelectors {
    /// Compiles the configured selectors
    pub fn from_config(config: &SelectorConfig) -> ConfigResult<Self> {
        Ok(Self {
            makes: compile("makes", &config.makes)?,
            categories: compile("categories", &config.categories)?,
            models: compile("models", &config.models)?,
            parts: compile("parts", &config.parts)?,
            link: compile("link", &config.link)?,
            part_type: compile("part-type", &config.part_type)?,
        })
    }

    /// Selector matching the listing entries of `stage`
    pub fn entries(&self, stage: Stage) -> &Selector {
        match stage {
            Stage::ListMakes => &self.makes,
            Stage::ListCategories => &self.categories,
            Stage::ListModels => &self.models,
            Stage::ListParts => &self.parts,
        }
    }
}

fn compile(name: &str, css: &str) -> ConfigResult<Selector> {
    Selector::parse(css).map_err(|_| ConfigError::InvalidSelector {
        name: name.to_string(),
        selector: css.to_string(),
    })
}

/// Signature shared by all stage handlers
pub type StageHandler = fn(&Page, &FetchRequest, &StageSelectors) -> PipelineResult<StageOutput>;

/// Handlers indexed by [`Stage::index`]
const STAGE_HANDLERS: [StageHandler; 4] = [list_makes, list_categories, list_models, list_parts];

/// Runs the handler registered for the request's stage
pub fn dispatch(
    page: &Page,
    request: &FetchRequest,
    selectors: &StageSelectors,
) -> PipelineResult<StageOutput> {
    STAGE_HANDLERS[request.stage().index()](page, request, selectors)
}

/// Root page: one category request per make
fn list_makes(
    page: &Page,
    request: &FetchRequest,
    selectors: &StageSelectors,
) -> PipelineResult<StageOutput> {
    tracing::info!("Parsing makes from {}", page.url());
    follow_entries(page, request, selectors, ContextKey::Make, |text| {
        text.trim().to_string()
    })
}

/// Make page: one model request per category, labels lowercased
fn list_categories(
    page: &Page,
    request: &FetchRequest,
    selectors: &StageSelectors,
) -> PipelineResult<StageOutput> {
    tracing::info!(
        "Parsing categories for {} from {}",
        request.context(),
        page.url()
    );
    follow_entries(page, request, selectors, ContextKey::Category, |text| {
        text.trim().to_lowercase()
    })
}

/// Category page: one parts request per model
fn list_models(
    page: &Page,
    request: &FetchRequest,
    selectors: &StageSelectors,
) -> PipelineResult<StageOutput> {
    tracing::info!("Parsing models for {} from {}", request.context(), page.url());
    follow_entries(page, request, selectors, ContextKey::Model, |text| {
        text.trim().to_string()
    })
}

/// Shared body of the three intermediate stages
///
/// Entries without text are skipped quietly, entries with text but no usable
/// link are skipped with a warning, and an empty listing ends the branch.
fn follow_entries(
    page: &Page,
    request: &FetchRequest,
    selectors: &StageSelectors,
    key: ContextKey,
    normalize: fn(&str) -> String,
) -> PipelineResult<StageOutput> {
    let stage = request.stage();
    let mut output = StageOutput::default();

    let entries = page.select_all(selectors.entries(stage));
    if entries.is_empty() {
        tracing::warn!(
            "No {} found at {} ({})",
            stage.entry_label(),
            page.url(),
            request.context()
        );
        output.empty_listing = true;
        return Ok(output);
    }

    for entry in entries {
        let value = match entry.select_text(&selectors.link) {
            Some(text) => normalize(&text),
            None => {
                output.skipped += 1;
                continue;
            }
        };
        if value.is_empty() {
            output.skipped += 1;
            continue;
        }

        let link = entry
            .select_attribute(&selectors.link, "href")
            .and_then(|href| resolve_link(&href, page.url()));
        let url = match link {
            Some(url) => url,
            None => {
                tracing::warn!("No href found for {}: {}", key, value);
                output.skipped += 1;
                continue;
            }
        };

        let context = request.context().extend(key, value)?;
        output.requests.push(request.follow(url, context)?);
    }

    tracing::info!(
        "Found {} {} to process at {}",
        output.requests.len(),
        stage.entry_label(),
        page.url()
    );

    Ok(output)
}

/// Model page: one record per valid part entry
///
/// Every valid part on the page is emitted, not just the first one.
fn list_parts(
    page: &Page,
    request: &FetchRequest,
    selectors: &StageSelectors,
) -> PipelineResult<StageOutput> {
    let context = request.context();
    tracing::info!("Parsing parts for {}", context);

    let mut output = StageOutput::default();

    let entries = page.select_all(&selectors.parts);
    if entries.is_empty() {
        tracing::warn!("No parts found for {}", context);
        output.empty_listing = true;
        return Ok(output);
    }

    for entry in entries {
        let text = match entry.select_text(&selectors.link) {
            Some(text) => text,
            None => {
                output.skipped += 1;
                continue;
            }
        };

        if !text.contains('-') {
            tracing::debug!("Part entry without separator, using whole text: {}", text.trim());
        }
        let part_number = parse_part_number(&text);
        let part_type = normalize_part_type(entry.select_text(&selectors.part_type).as_deref());

        let record = ProductRecord::from_context(context, part_number, part_type);
        if validate(&record) {
            output.records.push(record);
        } else {
            output.dropped += 1;
        }
    }

    Ok(output)
}
