use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::brands::KNOWN_BRANDS;

/// A line item parsed out of one contract line. Fields the heuristics
/// could not extract with confidence are empty strings, never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCandidate {
    /// Original line, preserved for display.
    pub raw_line: String,
    pub brand: String,
    /// Uppercased for matching; the raw line keeps the original casing.
    pub model_number: String,
    pub product_name: String,
}

/// A line excluded from item creation. Informational, not an error —
/// skipped lines are reported so nothing disappears silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub line: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    /// Labor, notes, allowances and other non-product entries.
    Administrative,
    /// No token that could plausibly be a model number.
    NoModelToken,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank line",
            Self::Administrative => "administrative entry, not a product",
            Self::NoModelToken => "could not extract a model number",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Quantity markers: "2x", "x2", "QTY", "qty.", "(3)".
static QUANTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+x|x\d+|qty\.?|\(\d+\))$").expect("quantity regex"));

// Pricing and bare-number noise: "$899", "$1,299.00", "2,499", "4".
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?\d[\d,]*(\.\d+)?$").expect("numeric regex"));

// Non-product entries per supplier conventions.
static ADMIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(note|allowance|labor|labour|wiring|programming|installation|freight|shipping|service call|misc)\b")
        .expect("admin regex")
});

/// Parse one raw contract line into a candidate line item.
///
/// Pure function of the input text plus the static brand list: strips
/// quantity/pricing noise, finds a model-number-like token (letters and
/// digits together), matches a brand, and treats the rest as the product
/// name. Lines with no plausible model token fail with a reason.
pub fn parse_line(raw_line: &str) -> Result<ParsedCandidate, ParseFailure> {
    let collapsed = raw_line.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(failure(raw_line, SkipReason::Blank));
    }
    if ADMIN_RE.is_match(&collapsed) {
        return Err(failure(raw_line, SkipReason::Administrative));
    }

    let tokens: Vec<&str> = collapsed
        .split(' ')
        .filter(|t| !is_noise_token(t))
        .collect();

    let model_idx = tokens
        .iter()
        .position(|t| is_model_token(t))
        .ok_or_else(|| failure(raw_line, SkipReason::NoModelToken))?;
    let model_number = clean_token(tokens[model_idx]).to_uppercase();

    let (brand, brand_span) = match find_known_brand(&tokens, model_idx) {
        Some(hit) => hit,
        None => fallback_brand(&tokens, model_idx),
    };

    let product_name = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != model_idx && !brand_span.contains(i))
        .map(|(_, t)| *t)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(ParsedCandidate {
        raw_line: raw_line.trim().to_string(),
        brand,
        model_number,
        product_name,
    })
}

fn failure(line: &str, reason: SkipReason) -> ParseFailure {
    ParseFailure {
        line: line.trim().to_string(),
        reason,
    }
}

fn is_noise_token(token: &str) -> bool {
    QUANTITY_RE.is_match(token)
        || NUMERIC_RE.is_match(token)
        || token.chars().all(|c| !c.is_alphanumeric())
}

fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

/// A model number is an alphanumeric token carrying both letters and
/// digits (hyphens and slashes allowed), at least 3 characters long.
fn is_model_token(token: &str) -> bool {
    let cleaned = clean_token(token);
    cleaned.len() >= 3
        && cleaned
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
        && cleaned.chars().any(|c| c.is_ascii_alphabetic())
        && cleaned.chars().any(|c| c.is_ascii_digit())
}

/// Scan token windows for a known brand, skipping any window that
/// overlaps the model token. Returns the canonical brand name and the
/// token range it occupied.
fn find_known_brand(
    tokens: &[&str],
    model_idx: usize,
) -> Option<(String, std::ops::Range<usize>)> {
    for brand in KNOWN_BRANDS {
        let words: Vec<String> = brand.split(' ').map(str::to_lowercase).collect();
        if words.len() > tokens.len() {
            continue;
        }
        for start in 0..=(tokens.len() - words.len()) {
            let span = start..start + words.len();
            if span.contains(&model_idx) {
                continue;
            }
            let matches = words
                .iter()
                .zip(&tokens[span.clone()])
                .all(|(w, t)| clean_token(t).to_lowercase() == *w);
            if matches {
                return Some((brand.to_string(), span));
            }
        }
    }
    None
}

/// Fall back to the first capitalized, purely alphabetic token.
fn fallback_brand(tokens: &[&str], model_idx: usize) -> (String, std::ops::Range<usize>) {
    for (i, token) in tokens.iter().enumerate() {
        if i == model_idx {
            continue;
        }
        let cleaned = clean_token(token);
        if cleaned.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && cleaned.chars().all(|c| c.is_ascii_alphabetic())
        {
            return (cleaned.to_string(), i..i + 1);
        }
    }
    (String::new(), 0..0)
}
