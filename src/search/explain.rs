

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::catalog::Book;
use crate::embeddings::text::content_terms;

/// Channel scores at or below this are not mentioned.
const CHANNEL_CUE_THRESHOLD: f64 = 0.01;

const SIMILAR_PERIOD_YEARS: i32 = 5;

const MAX_LISTED_TERMS: usize = 5;

const FALLBACK_REASON: &str = "Recommended based on overall similarity in themes and readership.";

lazy_static! {
    static ref SUBJECTS_RE: Regex = Regex::new(r"(?is)Subjects:\s*(.*)$").unwrap();
    static ref SUBJECT_SPLIT_RE: Regex = Regex::new(r"[|\n,]+").unwrap();
}

/// What the request was built from; shared by every result of one request.
#[derive(Debug, Clone, Default)]
pub struct ExplainContext {
    pub query_terms: Vec<String>,
    pub seed: Option<Book>,
    pub has_text: bool,
}

impl ExplainContext {
    pub fn new(text: Option<&str>, seed: Option<Book>) -> Self {
        let mut seen = BTreeSet::new();
        let query_terms = text
            .map(content_terms)
            .unwrap_or_default()
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self {
            query_terms,
            seed,
            has_text: text.is_some(),
        }
    }
}

/// Lowercased entries of a trailing `Subjects: a | b | c` section.
pub fn subjects(description: Option<&str>) -> BTreeSet<String> {
    let Some(description) = description else { return BTreeSet::new() };
    let Some(caps) = SUBJECTS_RE.captures(description) else { return BTreeSet::new() };
    SUBJECT_SPLIT_RE
        .split(&caps[1])
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn shared_subjects(a: &Book, b: &Book) -> Vec<String> {
    let sa = subjects(a.description.as_deref());
    let sb = subjects(b.description.as_deref());
    sa.intersection(&sb).take(MAX_LISTED_TERMS).cloned().collect()
}

fn same_author(a: &Book, b: &Book) -> Option<String> {
    let (Some(x), Some(y)) = (a.author.as_deref(), b.author.as_deref()) else { return None };
    (x.trim().to_lowercase() == y.trim().to_lowercase() && !x.trim().is_empty()).then(|| y.trim().to_string())
}

fn similar_period(a: &Book, b: &Book) -> bool {
    matches!(
        (a.published_year, b.published_year),
        (Some(x), Some(y)) if (x - y).abs() <= SIMILAR_PERIOD_YEARS
    )
}

/// Query terms that appear in the candidate's title, subtitle, or description.
fn matched_terms(ctx: &ExplainContext, candidate: &Book) -> Vec<String> {
    let haystack: BTreeSet<String> = [
        Some(candidate.title.as_str()),
        candidate.subtitle.as_deref(),
        candidate.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .flat_map(content_terms)
    .collect();

    ctx.query_terms
        .iter()
        .filter(|t| haystack.contains(*t))
        .take(MAX_LISTED_TERMS)
        .cloned()
        .collect()
}

fn seed_cues(seed: &Book, candidate: &Book) -> Vec<String> {
    let mut cues = Vec::new();
    if let Some(author) = same_author(seed, candidate) {
        cues.push(format!("same author ({author})"));
    } else if similar_period(seed, candidate) {
        cues.push("published in a similar period".to_string());
    }
    let overlap = shared_subjects(seed, candidate);
    if !overlap.is_empty() {
        cues.push(format!("shared subjects: {}", overlap.join(", ")));
    }
    cues
}

fn channel_cues(semantic: Option<f64>, cf: Option<f64>) -> Vec<String> {
    let mut cues = Vec::new();
    if cf.is_some_and(|s| s > CHANNEL_CUE_THRESHOLD) {
        cues.push("liked by similar readers".to_string());
    }
    if semantic.is_some_and(|s| s > CHANNEL_CUE_THRESHOLD) {
        cues.push("close in theme/description".to_string());
    }
    cues
}

fn quoted(terms: &[String]) -> String {
    terms.iter().map(|t| format!("\"{t}\"")).collect::<Vec<_>>().join(", ")
}

/// Short advisory sentence for one result. Never empty.
pub fn explain(ctx: &ExplainContext, candidate: Option<&Book>, semantic: Option<f64>, cf: Option<f64>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let terms = candidate.map(|c| matched_terms(ctx, c)).unwrap_or_default();

    match (&ctx.seed, ctx.has_text) {
        (Some(seed), true) => {
            let mut lead = format!("Sits between your prompt and \"{}\"", seed.title);
            if !terms.is_empty() {
                lead.push_str(&format!(": matches {} and", quoted(&terms)));
            } else {
                lead.push(',');
            }
            lead.push_str(&format!(" shares thematic ground with \"{}\"", seed.title));
            parts.push(lead);
            if let Some(c) = candidate {
                parts.extend(seed_cues(seed, c));
            }
        }
        (Some(seed), false) => {
            parts.push(format!("Close in theme and style to \"{}\"", seed.title));
            if let Some(c) = candidate {
                parts.extend(seed_cues(seed, c));
            }
        }
        (None, true) => {
            if terms.is_empty() {
                parts.push("Close in meaning to your prompt".to_string());
            } else {
                parts.push(format!("Matches your prompt on {}", quoted(&terms)));
            }
        }
        (None, false) => {}
    }

    // The lead sentence already covers the semantic channel whenever there is one.
    let semantic_cue = if parts.is_empty() { semantic } else { None };
    parts.extend(channel_cues(semantic_cue, cf));

    if parts.is_empty() {
        return FALLBACK_REASON.to_string();
    }
    capitalize(&format!("{}.", parts.join("; ")))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
