

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::explain::{ExplainContext, explain};
use super::models::{Candidate, Channels, RankedResult};
use crate::safe_truncate_ellipsis;


pub const SNIPPET_CHARS: usize = 200;


#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub semantic: f64,
    pub cf: Option<f64>,
    pub score: f64,
}


pub fn calculate_combined_score(semantic: f64, cf: Option<f64>, cf_weight: f64) -> f64 {
    semantic + cf_weight * cf.unwrap_or(0.0)
}

/// Keeps one candidate per id: the one with the smallest distance (first seen on ties).
pub fn dedupe(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut order: Vec<i64> = Vec::with_capacity(candidates.len());
    let mut unique: HashMap<i64, Candidate> = HashMap::with_capacity(candidates.len());

    for candidate in candidates {
        match unique.entry(candidate.entity_id) {
            Entry::Occupied(mut existing) => {
                if candidate.distance < existing.get().distance {
                    existing.insert(candidate);
                }
            }
            Entry::Vacant(slot) => {
                order.push(candidate.entity_id);
                slot.insert(candidate);
            }
        }
    }

    order.into_iter().filter_map(|id| unique.remove(&id)).collect()
}

/// Descending score, then ascending id.
fn score_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate.entity_id.cmp(&b.candidate.entity_id))
}

/// Dedupe, score, sort, truncate. `secondary` holds externally supplied cf scores.
pub fn rank_candidates(
    candidates: Vec<Candidate>,
    secondary: Option<&HashMap<i64, f64>>,
    cf_weight: f64,
    k: usize,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = dedupe(candidates)
        .into_iter()
        .filter(|c| c.distance.is_finite())
        .map(|candidate| {
            let semantic = 1.0 - candidate.distance;
            let cf = secondary
                .and_then(|scores| scores.get(&candidate.entity_id))
                .copied()
                .filter(|s| s.is_finite());
            let score = calculate_combined_score(semantic, cf, cf_weight);
            ScoredCandidate { candidate, semantic, cf, score }
        })
        .collect();

    ranked.sort_by(score_order);
    ranked.truncate(k);
    ranked
}

/// Description flattened to one line and capped at [`SNIPPET_CHARS`].
pub fn snippet(description: Option<&str>) -> Option<String> {
    let flat = description?.trim().replace(['\r', '\n'], " ");
    if flat.is_empty() {
        return None;
    }
    Some(safe_truncate_ellipsis(&flat, SNIPPET_CHARS))
}

/// Attaches metadata, a snippet, and a reason to each scored candidate.
pub fn assemble(ranked: Vec<ScoredCandidate>, ctx: &ExplainContext) -> Vec<RankedResult> {
    ranked
        .into_iter()
        .map(|scored| {
            let channels = Channels {
                semantic: Some(scored.semantic),
                cf: scored.cf,
            };
            let reason = explain(ctx, scored.candidate.metadata.as_ref(), channels.semantic, channels.cf);
            let snippet = scored.candidate.metadata.as_ref().and_then(|b| snippet(b.description.as_deref()));
            let (title, author, published_year, subtitle, page_count) = match scored.candidate.metadata {
                Some(book) => (Some(book.title), book.author, book.published_year, book.subtitle, book.page_count),
                None => (None, None, None, None, None),
            };
            RankedResult {
                id: scored.candidate.entity_id,
                title,
                author,
                published_year,
                subtitle,
                page_count,
                snippet,
                score: scored.score,
                channels,
                reason,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::Book;

    fn cand(id: i64, distance: f64) -> Candidate {
        Candidate {
            entity_id: id,
            distance,
            metadata: Some(Book { id, title: format!("Book {id}"), ..Default::default() }),
        }
    }

    #[test]
    fn test_dedupe_keeps_smallest_distance() {
        let deduped = dedupe(vec![cand(1, 0.4), cand(2, 0.3), cand(1, 0.1), cand(1, 0.2)]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].entity_id, 1);
        assert!((deduped[0].distance - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_semantic_score_is_one_minus_distance() {
        let ranked = rank_candidates(vec![cand(5, 0.25)], None, 0.0, 10);
        assert!((ranked[0].semantic - 0.75).abs() < 1e-12);
        assert_eq!(ranked[0].score, ranked[0].semantic);
        assert!(ranked[0].cf.is_none());
    }

    #[test]
    fn test_sort_desc_with_id_tiebreak_and_truncate() {
        let ranked = rank_candidates(
            vec![cand(9, 0.2), cand(3, 0.2), cand(4, 0.1), cand(1, 0.5)],
            None,
            0.0,
            3,
        );
        let ids: Vec<i64> = ranked.iter().map(|r| r.candidate.entity_id).collect();
        assert_eq!(ids, vec![4, 3, 9]);
    }

    #[test]
    fn test_cf_is_informational_at_zero_weight() {
        let cf: HashMap<i64, f64> = [(2, 0.9)].into_iter().collect();
        let ranked = rank_candidates(vec![cand(1, 0.1), cand(2, 0.2)], Some(&cf), 0.0, 10);

        assert_eq!(ranked[0].candidate.entity_id, 1);
        assert_eq!(ranked[1].cf, Some(0.9));
        assert!((ranked[1].score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_cf_weight_blends_when_configured() {
        let cf: HashMap<i64, f64> = [(2, 0.9)].into_iter().collect();
        let ranked = rank_candidates(vec![cand(1, 0.1), cand(2, 0.2)], Some(&cf), 0.5, 10);
        assert_eq!(ranked[0].candidate.entity_id, 2);
        assert!((ranked[0].score - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_assemble_fills_channels_and_reason() {
        let mut degraded = cand(8, 0.3);
        degraded.metadata = None;
        let ranked = rank_candidates(vec![cand(7, 0.2), degraded], None, 0.0, 10);
        let results = assemble(ranked, &ExplainContext::new(Some("harbor"), None));

        assert_eq!(results[0].title.as_deref(), Some("Book 7"));
        assert_eq!(results[0].channels.semantic, Some(results[0].score));
        assert!(results[1].title.is_none());
        assert!(results.iter().all(|r| !r.reason.is_empty()));
    }

    #[test]
    fn test_snippet_is_flattened_and_capped() {
        assert_eq!(snippet(Some("  A memoir.\nOf Spain.  ")).as_deref(), Some("A memoir. Of Spain."));
        assert_eq!(snippet(Some("   ")), None);
        assert_eq!(snippet(None), None);

        let long = "word ".repeat(100);
        let capped = snippet(Some(&long)).unwrap();
        assert_eq!(capped.chars().count(), SNIPPET_CHARS + 3);
        assert!(capped.ends_with("..."));
    }

    #[test]
    fn test_assemble_carries_snippet_and_page_count() {
        let mut c = cand(3, 0.1);
        if let Some(book) = c.metadata.as_mut() {
            book.description = Some("x".repeat(SNIPPET_CHARS * 2));
            book.page_count = Some(232);
        }
        let results = assemble(rank_candidates(vec![c], None, 0.0, 1), &ExplainContext::default());

        assert_eq!(results[0].page_count, Some(232));
        let snippet = results[0].snippet.as_deref().unwrap();
        assert!(snippet.chars().count() <= SNIPPET_CHARS + 3);
    }
}
