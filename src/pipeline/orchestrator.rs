//! Pipeline orchestrator: drives extraction → parsing → resolution →
//! state assignment for a whole project, and re-runs single items
//! without disturbing their siblings.
//!
//! Uses trait-based DI for the product cache and the enrichment lookup
//! so the whole pipeline runs against in-memory fakes in tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::extraction::{detect_format, extract_lines, extract_text, ExtractionError};
use super::parsing::{parse_line, ParsedCandidate};
use super::resolution::{EnrichmentLookup, ProductCache, ResolutionOutcome, Resolver};
use super::state::{self, StateError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{normalize_model_number, Project, ProjectItem};

/// Extra lookup attempts after a transient failure, per item.
const MAX_LOOKUP_RETRIES: usize = 2;

/// Default size of the resolution worker pool. Kept small to respect
/// the enrichment service's rate limits.
const DEFAULT_WORKERS: usize = 4;

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Item state error: {0}")]
    State(#[from] StateError),

    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),
}

/// A contract line excluded from item creation, with the reason —
/// reported so the user sees "could not extract" instead of nothing.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    pub line: String,
    pub reason: String,
}

/// Everything `process` produced for one contract.
#[derive(Debug)]
pub struct ProcessOutcome {
    /// All created items, already transitioned out of `pending` where
    /// resolution completed.
    pub items: Vec<ProjectItem>,
    pub skipped: Vec<SkippedLine>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct ContractProcessor {
    resolver: Resolver,
    workers: usize,
}

impl ContractProcessor {
    pub fn new(cache: Arc<dyn ProductCache>, enrichment: Arc<dyn EnrichmentLookup>) -> Self {
        Self {
            resolver: Resolver::new(cache, enrichment),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Process one uploaded contract end to end.
    ///
    /// 1. Detect format and extract raw text
    /// 2. Split into lines and parse candidates (skips reported, not dropped)
    /// 3. Create pending items in bulk
    /// 4. Resolve concurrently over the bounded worker pool
    /// 5. Apply the matching state transition and persist each item
    pub fn process(
        &self,
        conn: &Connection,
        project: &Project,
        contract: &[u8],
    ) -> Result<ProcessOutcome, ProcessingError> {
        let format = detect_format(contract);
        let text = extract_text(contract, format)?;
        let lines = extract_lines(&text);
        tracing::info!(
            project_id = %project.id,
            format = ?format,
            lines = lines.len(),
            "Processing contract"
        );

        let mut skipped = Vec::new();
        let mut candidates: Vec<ParsedCandidate> = Vec::new();
        let mut seen_models: HashSet<String> = HashSet::new();
        for line in lines {
            match parse_line(&line) {
                Ok(candidate) => {
                    let key = normalize_model_number(&candidate.model_number);
                    if !key.is_empty() && !seen_models.insert(key) {
                        skipped.push(SkippedLine {
                            line,
                            reason: "duplicate model number in contract".into(),
                        });
                        continue;
                    }
                    candidates.push(candidate);
                }
                Err(failure) => {
                    tracing::info!(line = %failure.line, reason = %failure.reason, "Skipping line");
                    skipped.push(SkippedLine {
                        line: failure.line,
                        reason: failure.reason.to_string(),
                    });
                }
            }
        }

        let mut items: Vec<ProjectItem> = candidates
            .iter()
            .map(|c| {
                ProjectItem::new_pending(
                    project.id,
                    &c.raw_line,
                    &c.brand,
                    &c.model_number,
                    &c.product_name,
                )
            })
            .collect();
        repository::insert_project_items(conn, &items)?;

        let outcomes = self.resolve_all(&candidates);
        for (item, outcome) in items.iter_mut().zip(outcomes) {
            self.apply_outcome(conn, item, outcome)?;
        }

        tracing::info!(
            project_id = %project.id,
            items = items.len(),
            skipped = skipped.len(),
            "Contract processed"
        );
        Ok(ProcessOutcome { items, skipped })
    }

    /// Re-run resolution for one existing item: `not_found -> pending`,
    /// then resolve again. Siblings are untouched; the product cache is
    /// the only shared state and its upsert is atomic per key.
    pub fn retry_item(
        &self,
        conn: &Connection,
        item_id: &Uuid,
    ) -> Result<ProjectItem, ProcessingError> {
        let mut item = repository::get_project_item(conn, item_id)?
            .ok_or(ProcessingError::ItemNotFound(*item_id))?;

        state::mark_retry(&mut item)?;
        repository::update_project_item(conn, &item)?;
        tracing::info!(item_id = %item.id, "Retrying item resolution");

        let candidate = candidate_from_item(&item);
        let outcome = self.resolve_with_retry(&candidate);
        self.apply_outcome(conn, &mut item, outcome)?;
        Ok(item)
    }

    /// Apply a user-supplied manual URL. Allowed from any state; the
    /// override clears the product link and is stored verbatim.
    pub fn set_manual_entry(
        &self,
        conn: &Connection,
        item_id: &Uuid,
        manual_url: &str,
        notes: Option<&str>,
    ) -> Result<ProjectItem, ProcessingError> {
        let mut item = repository::get_project_item(conn, item_id)?
            .ok_or(ProcessingError::ItemNotFound(*item_id))?;

        state::mark_manual_entry(&mut item, manual_url, notes)?;
        repository::update_project_item(conn, &item)?;
        tracing::info!(item_id = %item.id, "Manual entry recorded");
        Ok(item)
    }

    /// Resolve all candidates over a bounded worker pool. Workers pull
    /// indices from a shared counter; results come back in input order.
    fn resolve_all(&self, candidates: &[ParsedCandidate]) -> Vec<ResolutionOutcome> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let next = AtomicUsize::new(0);
        let results: Mutex<Vec<(usize, ResolutionOutcome)>> =
            Mutex::new(Vec::with_capacity(candidates.len()));
        let workers = self.workers.min(candidates.len());

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let idx = next.fetch_add(1, Ordering::SeqCst);
                    if idx >= candidates.len() {
                        break;
                    }
                    let outcome = self.resolve_with_retry(&candidates[idx]);
                    results
                        .lock()
                        .expect("resolution results lock poisoned")
                        .push((idx, outcome));
                });
            }
        });

        let mut collected = results
            .into_inner()
            .expect("resolution results lock poisoned");
        collected.sort_by_key(|(idx, _)| *idx);
        collected.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Resolve one candidate, retrying transient failures a bounded
    /// number of times before giving the final outcome back.
    fn resolve_with_retry(&self, candidate: &ParsedCandidate) -> ResolutionOutcome {
        let mut outcome = self.resolver.resolve(candidate);
        for attempt in 1..=MAX_LOOKUP_RETRIES {
            match &outcome {
                ResolutionOutcome::Error { reason } => {
                    tracing::warn!(
                        model = %candidate.model_number,
                        attempt,
                        reason = %reason,
                        "Transient resolution failure, retrying"
                    );
                    outcome = self.resolver.resolve(candidate);
                }
                _ => break,
            }
        }
        outcome
    }

    fn apply_outcome(
        &self,
        conn: &Connection,
        item: &mut ProjectItem,
        outcome: ResolutionOutcome,
    ) -> Result<(), ProcessingError> {
        match outcome {
            ResolutionOutcome::Found { product } => {
                state::mark_found(item, &product)?;
            }
            ResolutionOutcome::NotFound => {
                state::mark_not_found(item, None)?;
            }
            ResolutionOutcome::Error { reason } => {
                // Retries exhausted — surface as not_found with a note so
                // the user can intervene, never silently swallowed.
                state::mark_not_found(
                    item,
                    Some(&format!("lookup unavailable: {reason}; retry this item later")),
                )?;
            }
        }
        repository::update_project_item(conn, item)?;
        Ok(())
    }
}

fn candidate_from_item(item: &ProjectItem) -> ParsedCandidate {
    ParsedCandidate {
        raw_line: item.raw_line.clone(),
        brand: item.brand.clone().unwrap_or_default(),
        model_number: item.model_number.clone().unwrap_or_default(),
        product_name: item.product_name.clone().unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::ItemStatus;
    use crate::pipeline::resolution::{
        LookupError, LookupOutcome, MemoryProductCache, MockEnrichmentLookup,
    };

    const CONTRACT: &str = "\
Equipment Schedule
2x Bosch SHP878ZD5N dishwasher $899
Crestron DM-NVX-D30 4K60 Network AV Decoder $1,980.00
NOTE: owner to supply display
";

    fn seeded_project(conn: &Connection) -> Project {
        let project = Project::new("Smith Residence", Some("contracts/smith.pdf"));
        repository::insert_project(conn, &project).unwrap();
        project
    }

    fn processor_with(
        enrichment: MockEnrichmentLookup,
    ) -> (Arc<MemoryProductCache>, Arc<MockEnrichmentLookup>, ContractProcessor) {
        let cache = Arc::new(MemoryProductCache::new());
        let enrichment = Arc::new(enrichment);
        let processor = ContractProcessor::new(cache.clone(), enrichment.clone()).with_workers(2);
        (cache, enrichment, processor)
    }

    #[test]
    fn process_resolves_items_and_reports_skips() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (cache, _enrichment, processor) =
            processor_with(MockEnrichmentLookup::hit("http://x/manual.pdf", "1 year"));

        let outcome = processor
            .process(&conn, &project, CONTRACT.as_bytes())
            .unwrap();

        assert_eq!(outcome.items.len(), 2);
        for item in &outcome.items {
            assert_eq!(item.status, ItemStatus::Found);
            assert_eq!(item.manual_url.as_deref(), Some("http://x/manual.pdf"));
            assert!(item.product_id.is_some());
        }
        // Header + NOTE line reported, not dropped
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(cache.len(), 2);

        // Persisted state matches
        let stored = repository::get_project_items(&conn, &project.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|i| i.status == ItemStatus::Found));
    }

    #[test]
    fn process_miss_leaves_cache_empty() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (cache, _enrichment, processor) = processor_with(MockEnrichmentLookup::miss());

        let outcome = processor
            .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
            .unwrap();

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].status, ItemStatus::NotFound);
        assert!(cache.is_empty(), "no negative caching");
    }

    #[test]
    fn transient_errors_exhaust_retries_then_surface_with_note() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, enrichment, processor) = processor_with(MockEnrichmentLookup::transient());

        let outcome = processor
            .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
            .unwrap();

        let item = &outcome.items[0];
        assert_eq!(item.status, ItemStatus::NotFound);
        assert!(item.notes.as_deref().unwrap().contains("lookup unavailable"));
        // 1 initial attempt + MAX_LOOKUP_RETRIES
        assert_eq!(enrichment.call_count(), 1 + MAX_LOOKUP_RETRIES);
    }

    #[test]
    fn transient_then_hit_recovers_within_retries() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) = processor_with(MockEnrichmentLookup::scripted(vec![
            Err(LookupError::Timeout(15)),
            Ok(LookupOutcome::Hit {
                manual_url: "http://x/manual.pdf".into(),
                warranty_length: "1 year".into(),
            }),
        ]));

        let outcome = processor
            .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
            .unwrap();
        assert_eq!(outcome.items[0].status, ItemStatus::Found);
    }

    #[test]
    fn duplicate_models_within_a_contract_are_skipped() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) =
            processor_with(MockEnrichmentLookup::hit("http://x/m.pdf", ""));

        let contract = "Bosch SHP878ZD5N dishwasher\nBosch SHP878ZD5N dishwasher again";
        let outcome = processor
            .process(&conn, &project, contract.as_bytes())
            .unwrap();

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].reason.contains("duplicate"));
    }

    #[test]
    fn retry_item_resolves_after_service_recovers() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) = processor_with(MockEnrichmentLookup::scripted(vec![
            Ok(LookupOutcome::Miss),
            Ok(LookupOutcome::Hit {
                manual_url: "http://x/manual.pdf".into(),
                warranty_length: "2 years".into(),
            }),
        ]));

        let outcome = processor
            .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
            .unwrap();
        let item_id = outcome.items[0].id;
        assert_eq!(outcome.items[0].status, ItemStatus::NotFound);

        let retried = processor.retry_item(&conn, &item_id).unwrap();
        assert_eq!(retried.status, ItemStatus::Found);
        assert_eq!(retried.manual_url.as_deref(), Some("http://x/manual.pdf"));
    }

    #[test]
    fn retry_of_found_item_is_an_invalid_transition() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) =
            processor_with(MockEnrichmentLookup::hit("http://x/manual.pdf", "1 year"));

        let outcome = processor
            .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
            .unwrap();
        let item_id = outcome.items[0].id;

        let result = processor.retry_item(&conn, &item_id);
        assert!(matches!(
            result,
            Err(ProcessingError::State(StateError::InvalidTransition { .. }))
        ));

        // Item state untouched by the failed retry
        let stored = repository::get_project_item(&conn, &item_id).unwrap().unwrap();
        assert_eq!(stored.status, ItemStatus::Found);
    }

    #[test]
    fn retry_touches_only_the_requested_item() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) = processor_with(MockEnrichmentLookup::miss());

        let contract = "Bosch SHP878ZD5N dishwasher\nCrestron DM-NVX-D30 decoder";
        let outcome = processor
            .process(&conn, &project, contract.as_bytes())
            .unwrap();
        let (first, second) = (outcome.items[0].id, outcome.items[1].id);

        processor.retry_item(&conn, &first).unwrap();

        let sibling = repository::get_project_item(&conn, &second).unwrap().unwrap();
        assert_eq!(sibling.status, ItemStatus::NotFound);
        assert_eq!(sibling.notes, None);
    }

    #[test]
    fn manual_entry_overrides_any_state() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) =
            processor_with(MockEnrichmentLookup::hit("http://x/manual.pdf", "1 year"));

        let outcome = processor
            .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
            .unwrap();
        let item_id = outcome.items[0].id;

        let updated = processor
            .set_manual_entry(&conn, &item_id, "http://user/override.pdf", Some("PM supplied"))
            .unwrap();
        assert_eq!(updated.status, ItemStatus::ManualEntry);
        assert_eq!(updated.manual_url.as_deref(), Some("http://user/override.pdf"));
        assert_eq!(updated.product_id, None);
    }

    #[test]
    fn empty_contract_is_an_extraction_error() {
        let conn = open_memory_database().unwrap();
        let project = seeded_project(&conn);
        let (_cache, _enrichment, processor) = processor_with(MockEnrichmentLookup::miss());

        let result = processor.process(&conn, &project, b"  \n ");
        assert!(matches!(
            result,
            Err(ProcessingError::Extraction(ExtractionError::EmptyDocument))
        ));
    }

    #[test]
    fn concurrent_projects_converge_on_one_cached_record() {
        // Two projects on separate databases share the cache and the
        // lookup; both resolve the same model concurrently.
        let cache = Arc::new(MemoryProductCache::new());
        let enrichment = Arc::new(MockEnrichmentLookup::hit("http://x/manual.pdf", "1 year"));

        std::thread::scope(|scope| {
            for _ in 0..2 {
                let cache = cache.clone();
                let enrichment = enrichment.clone();
                scope.spawn(move || {
                    let conn = open_memory_database().unwrap();
                    let project = seeded_project(&conn);
                    let processor = ContractProcessor::new(cache, enrichment);
                    let outcome = processor
                        .process(&conn, &project, b"Bosch SHP878ZD5N dishwasher")
                        .unwrap();
                    assert_eq!(outcome.items[0].status, ItemStatus::Found);
                });
            }
        });

        assert_eq!(cache.len(), 1, "exactly one merged record, no duplicate key");
    }
}
