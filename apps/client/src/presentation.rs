//! Result presentation: formatting only, no scoring.
//!
//! Analysis payloads are read section by section out of the raw JSON, so a
//! missing or malformed section renders as "No data available" instead of
//! failing the whole view.

use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::Value;

use crate::models::resume::CandidateResult;

pub const NO_DATA: &str = "No data available";
const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Rounds to two decimals and drops trailing zeros: 1.50 → "1.5", 2.00 → "2".
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn format_percent(score: f64) -> String {
    format!("{}%", format_decimal(score))
}

/// Base-1024 size with Bytes/KB/MB/GB suffixes. Anything past GB stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", format_decimal(value), SIZE_UNITS[unit])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTone {
    Good,
    Fair,
    Poor,
}

impl RatingTone {
    pub fn from_rating(rating: &str) -> Self {
        match rating {
            "Good" => RatingTone::Good,
            "Fair" => RatingTone::Fair,
            _ => RatingTone::Poor,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            RatingTone::Good => "[+]",
            RatingTone::Fair => "[~]",
            RatingTone::Poor => "[-]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AtsScore {
    pub score: f64,
    #[serde(default)]
    pub rating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordMatch {
    pub score: f64,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SemanticSimilarity {
    pub score: f64,
}

/// Read-only view over an analysis payload. Each section is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisView {
    pub ats_score: Option<AtsScore>,
    pub missing_keywords: Option<Vec<String>>,
    pub suggestions: Option<Vec<String>>,
    pub keyword_match: Option<KeywordMatch>,
    pub semantic_similarity: Option<SemanticSimilarity>,
}

impl AnalysisView {
    /// Accepts either the full `{ "analysis": {...} }` response or the inner object.
    pub fn from_payload(payload: &Value) -> Self {
        let analysis = payload.get("analysis").unwrap_or(payload);
        Self {
            ats_score: section(analysis, "ats_score"),
            missing_keywords: section(analysis, "missing_keywords"),
            suggestions: section(analysis, "suggestions"),
            keyword_match: section(analysis, "keyword_match"),
            semantic_similarity: section(analysis, "semantic_similarity"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn section<T: for<'de> Deserialize<'de>>(analysis: &Value, key: &str) -> Option<T> {
    analysis
        .get(key)
        .filter(|v| !v.is_null())
        .and_then(|v| T::deserialize(v).ok())
}

fn push_list(out: &mut String, items: Option<&[String]>) {
    match items {
        Some(items) if !items.is_empty() => {
            for item in items {
                let _ = writeln!(out, "  - {item}");
            }
        }
        _ => {
            let _ = writeln!(out, "  {NO_DATA}");
        }
    }
}

/// Plain-text rendering of one analysis.
pub fn render_analysis(view: &AnalysisView) -> String {
    let mut out = String::new();

    out.push_str("Overall ATS Score\n");
    match &view.ats_score {
        Some(ats) => {
            let _ = writeln!(out, "  {}", format_percent(ats.score));
            match ats.rating.as_deref() {
                Some(rating) => {
                    let tone = RatingTone::from_rating(rating);
                    let _ = writeln!(out, "  Rating: {} {rating}", tone.marker());
                }
                None => {
                    let _ = writeln!(out, "  Rating: {NO_DATA}");
                }
            }
        }
        None => {
            let _ = writeln!(out, "  {NO_DATA}");
        }
    }

    out.push_str("\nMissing Keywords\n");
    push_list(&mut out, view.missing_keywords.as_deref());

    out.push_str("\nSuggestions\n");
    push_list(&mut out, view.suggestions.as_deref());

    out.push_str("\nKeyword Match\n");
    match &view.keyword_match {
        Some(km) => {
            let _ = writeln!(out, "  {}", format_percent(km.score));
            push_list(&mut out, Some(&km.matched_keywords));
        }
        None => {
            let _ = writeln!(out, "  {NO_DATA}");
        }
    }

    out.push_str("\nSemantic Similarity\n");
    match &view.semantic_similarity {
        Some(sim) => {
            let _ = writeln!(out, "  {}", format_percent(sim.score));
        }
        None => {
            let _ = writeln!(out, "  {NO_DATA}");
        }
    }

    out
}

/// Plain-text candidate cards, numbered from 1 in the given order.
pub fn render_candidates(results: &[CandidateResult]) -> String {
    if results.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let mut out = String::new();
    for (i, c) in results.iter().enumerate() {
        let _ = writeln!(out, "Candidate {}", i + 1);
        if let Some(file) = &c.file {
            let _ = writeln!(out, "  File:          {file}");
        }
        let _ = writeln!(out, "  ATS Score:     {}", format_percent(c.ats_score));
        let _ = writeln!(out, "  Keyword Match: {}", format_percent(c.keyword_match));
        let _ = writeln!(out, "  Skill Match:   {}", format_percent(c.skill_match));
        out.push_str("  Resume Suggestions:\n");
        if c.suggestions.is_empty() {
            let _ = writeln!(out, "    {NO_DATA}");
        }
        for s in &c.suggestions {
            let _ = writeln!(out, "    - {s}");
        }
    }
    out
}
