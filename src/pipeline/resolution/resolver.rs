use std::sync::Arc;

use super::cache::ProductCache;
use super::enrichment::{EnrichmentLookup, LookupOutcome};
use crate::models::{normalize_model_number, Product};
use crate::pipeline::parsing::ParsedCandidate;

/// Outcome of resolving one parsed candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Found { product: Product },
    /// Confirmed negative — not cached, so a corrected retry can succeed.
    NotFound,
    /// Transient failure, retryable; distinct from a confirmed miss.
    Error { reason: String },
}

/// Resolves parsed candidates against the product cache, falling back to
/// the enrichment lookup on a miss. The cache is mutated only when the
/// lookup succeeds.
pub struct Resolver {
    cache: Arc<dyn ProductCache>,
    enrichment: Arc<dyn EnrichmentLookup>,
}

impl Resolver {
    pub fn new(cache: Arc<dyn ProductCache>, enrichment: Arc<dyn EnrichmentLookup>) -> Self {
        Self { cache, enrichment }
    }

    pub fn resolve(&self, candidate: &ParsedCandidate) -> ResolutionOutcome {
        let model = normalize_model_number(&candidate.model_number);
        if model.is_empty() {
            // Nothing to key on; skip the lookup entirely.
            return ResolutionOutcome::NotFound;
        }

        match self.cache.lookup(&model) {
            Ok(Some(product)) => {
                tracing::debug!(model = %model, "Cache hit");
                return ResolutionOutcome::Found { product };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "Cache lookup failed");
                return ResolutionOutcome::Error {
                    reason: e.to_string(),
                };
            }
        }

        tracing::debug!(model = %model, brand = %candidate.brand, "Cache miss, querying enrichment");
        match self
            .enrichment
            .lookup(&candidate.brand, &model, &candidate.product_name)
        {
            Ok(LookupOutcome::Hit {
                manual_url,
                warranty_length,
            }) => {
                let mut product = Product::new(&model);
                product.brand = candidate.brand.clone();
                product.product_name = candidate.product_name.clone();
                product.manual_url = manual_url;
                product.warranty_length = warranty_length;

                match self.cache.upsert(product.clone()) {
                    Ok(stored) => ResolutionOutcome::Found { product: stored },
                    Err(e) => {
                        // The manual is known even if the cache write
                        // failed; resolve the item and leave the cache
                        // to the next attempt.
                        tracing::warn!(model = %model, error = %e, "Cache write failed after lookup hit");
                        ResolutionOutcome::Found { product }
                    }
                }
            }
            Ok(LookupOutcome::Miss) => {
                tracing::info!(model = %model, "Enrichment confirmed not found");
                ResolutionOutcome::NotFound
            }
            Err(e) => {
                tracing::warn!(model = %model, error = %e, transient = e.is_transient(), "Enrichment lookup failed");
                ResolutionOutcome::Error {
                    reason: e.to_string(),
                }
            }
        }
    }
}
