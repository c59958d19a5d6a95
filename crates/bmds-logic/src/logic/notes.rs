//! Display helpers shared by rule tables and classification summaries.

use super::evaluator::{RuleVerdict, VerdictStatus};
use super::registry::RuleDefinition;

/// Placeholder shown wherever a value is absent.
pub const EMPTY_CELL: &str = "-";
/// Shown for rules that do not apply, or that carry no threshold.
pub const NOT_APPLICABLE: &str = "N/A";
/// Note attached to a verdict whose statistic was not reported.
pub const VALUE_UNAVAILABLE: &str = "value unavailable";

pub fn threshold_text(threshold: Option<f64>) -> String {
    match threshold {
        Some(value) => format!("{value}"),
        None => EMPTY_CELL.to_string(),
    }
}

/// Threshold cell for a rule row: `N/A` when the rule never carries one.
pub fn threshold_cell(definition: &RuleDefinition, threshold: Option<f64>) -> String {
    if definition.has_threshold() {
        threshold_text(threshold)
    } else {
        NOT_APPLICABLE.to_string()
    }
}

pub fn check_or_empty(value: bool) -> &'static str {
    if value {
        "✓"
    } else {
        ""
    }
}

pub fn verdict_label(verdict: &RuleVerdict) -> &'static str {
    match verdict.status {
        VerdictStatus::NotApplicable => NOT_APPLICABLE,
        VerdictStatus::Passed => "Pass",
        VerdictStatus::Unavailable => VALUE_UNAVAILABLE,
        VerdictStatus::Triggered => verdict.bin.map(|bin| bin.label()).unwrap_or(EMPTY_CELL),
    }
}

/// Drop inline markup and decode the handful of entities used in rule notes.
pub fn plain_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&le;", "≤")
        .replace("&ge;", "≥")
        .replace("&amp;", "&")
}
