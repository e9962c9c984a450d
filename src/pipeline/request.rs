//! Stage identifiers and fetch requests

use crate::pipeline::CrawlContext;
use crate::{PipelineError, PipelineResult};
use url::Url;

/// One level of the make → category → model → part traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Root page listing every make
    ListMakes,

    /// Make page listing its categories
    ListCategories,

    /// Category page listing its models
    ListModels,

    /// Model page listing its parts (terminal)
    ListParts,
}

impl Stage {
    /// All stages in traversal order
    pub const ALL: [Stage; 4] = [
        Self::ListMakes,
        Self::ListCategories,
        Self::ListModels,
        Self::ListParts,
    ];

    /// Position of the stage in the handler table
    pub fn index(&self) -> usize {
        match self {
            Self::ListMakes => 0,
            Self::ListCategories => 1,
            Self::ListModels => 2,
            Self::ListParts => 3,
        }
    }

    /// Depth of requests issued for this stage (0 at the root)
    pub fn depth(&self) -> u32 {
        self.index() as u32
    }

    /// The stage that pages found by this stage are handed to
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::ListMakes => Some(Self::ListCategories),
            Self::ListCategories => Some(Self::ListModels),
            Self::ListModels => Some(Self::ListParts),
            Self::ListParts => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// What the stage's listing contains, for log messages
    pub fn entry_label(&self) -> &'static str {
        match self {
            Self::ListMakes => "makes",
            Self::ListCategories => "categories",
            Self::ListModels => "models",
            Self::ListParts => "parts",
        }
    }
}

/// A page to fetch, the stage to hand it to, and the branch context it carries
///
/// Requests are only built through [`FetchRequest::root`] and
/// [`FetchRequest::follow`], so `depth` always equals `stage.depth()` and grows
/// by exactly one per hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: Url,
    stage: Stage,
    context: CrawlContext,
    depth: u32,
}

impl FetchRequest {
    /// Creates a start request: root stage, empty context, depth 0
    pub fn root(url: Url) -> Self {
        Self {
            url,
            stage: Stage::ListMakes,
            context: CrawlContext::new(),
            depth: 0,
        }
    }

    /// Creates the request for a link found while handling this request
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoFollowUpStage`] when called on a terminal-stage request.
    pub fn follow(&self, url: Url, context: CrawlContext) -> PipelineResult<FetchRequest> {
        let stage = self
            .stage
            .next()
            .ok_or(PipelineError::NoFollowUpStage { stage: self.stage })?;

        Ok(Self {
            url,
            stage,
            context,
            depth: self.depth + 1,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn context(&self) -> &CrawlContext {
        &self.context
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}
