//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl controller, which:
//! - Issues start requests after a random delay each
//! - Hands fetched pages to the stage handler for their request
//! - Schedules follow-up requests and forwards records to the writer
//! - Closes the run and emits the summary

use crate::config::{validate, Config, CrawlerConfig};
use crate::crawler::scheduler::{ScheduledFetch, Scheduler};
use crate::crawler::{build_http_client, fetch_page, FetchResult};
use crate::output::{CrawlStats, CrawlSummary};
use crate::pipeline::{
    dispatch, on_failure, FetchRequest, Page, ProductRecord, StageOutput, StageSelectors,
};
use crate::state::CrawlerState;
use crate::storage::{spawn_writer, RunStatus, SqliteStorage, Storage, WriterHandle};
use crate::url::is_allowed;
use crate::{CrawlError, PipelineResult, Result};
use reqwest::Client;
use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tokio::time::Sleep;
use url::Url;

/// Close reason when every branch has drained
pub const CLOSE_FINISHED: &str = "finished";

/// Close reason when the shutdown signal fired first
pub const CLOSE_SHUTDOWN: &str = "shutdown";

/// Close reason when a pipeline wiring error aborted the crawl
pub const CLOSE_ERROR: &str = "error";

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    scheduler: Scheduler,
    selectors: Arc<StageSelectors>,
    stats: Arc<CrawlStats>,
    state: CrawlerState,
    start_urls: Vec<Url>,
    run_id: i64,

    /// Owned here while idle and after close; lent to the writer while running
    storage: Option<SqliteStorage>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the database and records a new run; nothing is fetched until
    /// [`Coordinator::run`] is called.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash of the configuration file, stored with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Invalid configuration or failed to initialize
    pub fn new(config: Config, config_hash: &str) -> Result<Self> {
        validate(&config)?;
        let selectors = StageSelectors::from_config(&config.selectors)?;

        let start_urls = config
            .catalog
            .start_urls
            .iter()
            .map(|s| Url::parse(s))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let run_id = storage.create_run(config_hash)?;

        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let scheduler = Scheduler::new(config.crawler.concurrent_requests as usize);

        Ok(Self {
            config: Arc::new(config),
            client,
            scheduler,
            selectors: Arc::new(selectors),
            stats: Arc::new(CrawlStats::new()),
            state: CrawlerState::Idle,
            start_urls,
            run_id,
            storage: Some(storage),
        })
    }

    pub fn state(&self) -> CrawlerState {
        self.state
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Live counters of this crawl
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// The storage backend, available while the controller is not running
    pub fn storage(&self) -> Option<&SqliteStorage> {
        self.storage.as_ref()
    }

    /// Runs the crawl until every branch has drained
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until every branch has drained or `shutdown` resolves
    ///
    /// The crawl closes with reason `"finished"` or `"shutdown"` (`"error"` when
    /// a pipeline error aborts it). On shutdown
    /// in-flight branches are aborted; records already handed to the writer
    /// are still stored.
    ///
    /// # Errors
    ///
    /// * [`CrawlError::InvalidTransition`] if the controller is not idle
    /// * [`CrawlError::Pipeline`] if a stage handler hit a wiring error; the
    ///   run is closed as failed first
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlSummary>
    where
        F: Future<Output = ()>,
    {
        self.transition(CrawlerState::Running)?;
        let storage = self.storage.take().ok_or(CrawlError::InvalidTransition {
            from: CrawlerState::Closed,
            to: CrawlerState::Running,
        })?;

        tracing::info!(
            "Starting crawl run {} with {} start URL(s)",
            self.run_id,
            self.start_urls.len()
        );

        let started = Instant::now();
        let writer = spawn_writer(storage);
        let items = writer.sender();

        tokio::pin!(shutdown);

        let mut starts: VecDeque<Url> = self.start_urls.iter().cloned().collect();
        let mut start_delay = self.next_start_delay(&starts);
        let mut tasks: JoinSet<PipelineResult<Vec<FetchRequest>>> = JoinSet::new();
        let mut pages_processed: u64 = 0;

        let outcome = loop {
            while let Some(scheduled) = self.scheduler.try_next() {
                tasks.spawn(process_request(
                    self.client.clone(),
                    Arc::clone(&self.selectors),
                    Arc::clone(&self.stats),
                    items.clone(),
                    scheduled,
                ));
            }

            if tasks.is_empty() && start_delay.is_none() {
                tracing::info!("Frontier is empty, crawl complete");
                break Ok(CLOSE_FINISHED);
            }

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping crawl");
                    break Ok(CLOSE_SHUTDOWN);
                }

                _ = wait_for(&mut start_delay) => {
                    if let Some(url) = starts.pop_front() {
                        tracing::debug!("Issuing start request for {}", url);
                        self.scheduler.add_request(FetchRequest::root(url));
                    }
                    start_delay = self.next_start_delay(&starts);
                }

                Some(joined) = tasks.join_next() => {
                    match joined {
                        Ok(Ok(requests)) => self.schedule_follow_ups(requests),
                        Ok(Err(e)) => break Err(CrawlError::Pipeline(e)),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => break Err(CrawlError::TaskJoin(e)),
                    }

                    pages_processed += 1;
                    if pages_processed % 10 == 0 {
                        tracing::info!(
                            "Progress: {} pages processed, {} in frontier, {} items scraped",
                            pages_processed,
                            self.scheduler.frontier_size(),
                            self.stats.items_scraped()
                        );
                    }
                }
            }
        };

        // Abort whatever is still in flight so every sender clone is gone
        tasks.shutdown().await;
        drop(items);

        match outcome {
            Ok(reason) => {
                let status = if reason == CLOSE_FINISHED {
                    RunStatus::Completed
                } else {
                    RunStatus::Interrupted
                };
                self.close(reason, status, writer, started).await
            }
            Err(e) => {
                tracing::error!("Crawl aborted: {}", e);
                if let Err(close_err) = self
                    .close(CLOSE_ERROR, RunStatus::Failed, writer, started)
                    .await
                {
                    tracing::error!("Failed to close run {}: {}", self.run_id, close_err);
                }
                Err(e)
            }
        }
    }

    /// Moves the controller to `next`, rejecting anything but forward moves
    fn transition(&mut self, next: CrawlerState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Crawler state: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Random pause before the next start request, if one is left
    fn next_start_delay(&self, starts: &VecDeque<Url>) -> Option<Pin<Box<Sleep>>> {
        if starts.is_empty() {
            return None;
        }

        let delay = random_start_delay(&self.config.crawler);
        tracing::debug!("Next start request in {:?}", delay);
        Some(Box::pin(tokio::time::sleep(delay)))
    }

    /// Queues follow-up requests that stay on the catalog domains
    fn schedule_follow_ups(&mut self, requests: Vec<FetchRequest>) {
        for request in requests {
            if !is_allowed(request.url(), &self.config.catalog.allowed_domains) {
                tracing::debug!("Filtered offsite request to {}", request.url());
                self.stats.record_offsite();
                continue;
            }
            self.scheduler.add_request(request);
        }
    }

    /// Drains the writer, records the run outcome and emits the summary
    async fn close(
        &mut self,
        reason: &str,
        status: RunStatus,
        writer: WriterHandle<SqliteStorage>,
        started: Instant,
    ) -> Result<CrawlSummary> {
        self.transition(CrawlerState::Closed)?;

        let (mut storage, report) = writer.finish().await?;
        let items_scraped = self.stats.items_scraped();
        storage.complete_run(self.run_id, status, reason, items_scraped)?;
        self.storage = Some(storage);

        let summary =
            CrawlSummary::from_stats(reason, self.run_id, &self.stats, report, started.elapsed());
        summary.log();

        Ok(summary)
    }
}

/// Draws a start delay within the configured bounds (inclusive)
fn random_start_delay(crawler: &CrawlerConfig) -> Duration {
    let (min, max) = (crawler.start_delay_min, crawler.start_delay_max);
    Duration::from_millis(fastrand::u64(min..=max.max(min)))
}

/// Resolves when the pending start delay elapses; never if there is none
async fn wait_for(delay: &mut Option<Pin<Box<Sleep>>>) {
    match delay.as_mut() {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

/// Fetches one request and runs its stage handler
///
/// Failed fetches are routed to the error handler and end the branch. Only
/// pipeline wiring errors are returned.
async fn process_request(
    client: Client,
    selectors: Arc<StageSelectors>,
    stats: Arc<CrawlStats>,
    items: UnboundedSender<ProductRecord>,
    scheduled: ScheduledFetch,
) -> PipelineResult<Vec<FetchRequest>> {
    // The permit is held until this branch step is done
    let ScheduledFetch { request, _permit } = scheduled;

    stats.record_request();
    tracing::debug!(
        "Fetching {} for {:?} ({})",
        request.url(),
        request.stage(),
        request.context()
    );

    let (final_url, body) = match fetch_page(&client, request.url()).await {
        FetchResult::Success {
            final_url,
            status_code,
            body,
        } => {
            tracing::trace!("{} returned {}", final_url, status_code);
            (final_url, body)
        }
        failed => {
            if let Some(failure) = failed.into_failure(request.url()) {
                on_failure(&failure);
            }
            stats.record_failure();
            return Ok(Vec::new());
        }
    };

    let output = handle_page(&body, final_url, &request, &selectors)?;
    stats.record_stage_output(&output);

    for record in output.records {
        let total = stats.record_item();
        tracing::debug!(
            "Scraped item #{}: {} / {} / {} / {}",
            total,
            record.make,
            record.category,
            record.model,
            record.part_number
        );
        if items.send(record).is_err() {
            tracing::error!("Product writer has stopped; item not stored");
        }
    }

    Ok(output.requests)
}

/// Parses the page and dispatches it; kept synchronous so the parsed
/// document never lives across an await point
fn handle_page(
    body: &str,
    final_url: Url,
    request: &FetchRequest,
    selectors: &StageSelectors,
) -> PipelineResult<StageOutput> {
    let page = Page::parse(body, final_url);
    dispatch(&page, request, selectors)
}
