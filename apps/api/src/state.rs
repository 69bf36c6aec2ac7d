use std::sync::Arc;

use sqlx::SqlitePool;

use crate::analysis::extractor::SkillMatcher;
use crate::config::Config;
use crate::taxonomy::SkillTaxonomy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Immutable skill vocabulary. Built-in unless SKILL_TAXONOMY_PATH is set.
    pub taxonomy: Arc<SkillTaxonomy>,
    /// Pluggable matcher. Default: PhraseMatcher. Swap via MATCH_STRATEGY.
    pub matcher: Arc<dyn SkillMatcher>,
}
