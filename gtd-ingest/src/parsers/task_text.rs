//! Free text → candidate task fields.
//!
//! Deterministic heuristics only:
//! - title: first sentence (3-80 chars), otherwise the first 80 chars
//! - due date: "due by/on X", "deadline is X", "complete by X"
//! - effort: keyword after "takes/requires", or an "easy/hard/... task" phrase
//! - consequences / desire: 5, +1 per cue word, capped at 10

use anyhow::Result;
use chrono::NaiveDateTime;
use gtd_core::task::DEFAULT_RATING;
use regex::{Regex, RegexBuilder};

use crate::parsers::natural_date::parse_natural_date;
use crate::types::ExtractedTask;

const TITLE_MAX_CHARS: usize = 80;
const RATING_MAX: i32 = 10;

const URGENCY_CUES: [&str; 6] = ["urgent", "critical", "important", "crucial", "vital", "essential"];
const DESIRE_CUES: [&str; 6] = ["want", "hope", "wish", "excited", "looking forward", "eager"];

fn effort_for_keyword(word: &str) -> Option<i32> {
    let effort = match word {
        "minimal" | "quick" => 9,
        "little" | "easy" | "simple" => 8,
        "some" => 6,
        "moderate" => 5,
        "significant" => 3,
        "substantial" | "considerable" | "lot" | "difficult" | "hard" | "challenging" => 2,
        _ => return None,
    };
    Some(effort)
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

fn split_title(text: &str) -> Result<(String, Option<String>)> {
    let title_re = Regex::new(r"^([^.!?]{3,80})[.!?]?")?;

    if let Some(caps) = title_re.captures(text) {
        let title = caps[1].trim().to_string();
        let rest = text[caps[0].len()..].trim();
        let description = (!rest.is_empty()).then(|| rest.to_string());
        return Ok((title, description));
    }

    let title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    let rest: String = text.chars().skip(TITLE_MAX_CHARS).collect();
    let rest = rest.trim();
    let description = (!rest.is_empty()).then(|| rest.to_string());
    Ok((title.trim().to_string(), description))
}

fn find_due_date(text: &str, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
    let patterns = [
        r"due\s+(?:(?:by|on)\s+)?(.+?)(?:\.|$|\n)",
        r"deadline(?:\s+is)?\s+(.+?)(?:\.|$|\n)",
        r"complete\s+by\s+(.+?)(?:\.|$|\n)",
    ];

    for pattern in patterns {
        let re = case_insensitive(pattern)?;
        if let Some(caps) = re.captures(text) {
            if let Some(date) = parse_natural_date(caps[1].trim(), now)? {
                return Ok(Some(date));
            }
        }
    }
    Ok(None)
}

fn find_effort(text: &str) -> Result<Option<i32>> {
    let takes_re = case_insensitive(r"(?:takes|requires)\s+(\w+)\s+(?:effort|time|work)")?;
    if let Some(caps) = takes_re.captures(text) {
        if let Some(effort) = effort_for_keyword(&caps[1].to_lowercase()) {
            return Ok(Some(effort));
        }
    }

    let adjective_re = case_insensitive(r"(easy|simple|quick|difficult|hard|challenging)\s+task")?;
    Ok(adjective_re
        .captures(text)
        .and_then(|caps| effort_for_keyword(&caps[1].to_lowercase())))
}

fn cue_rating(lower: &str, cues: &[&str]) -> i32 {
    let hits = cues.iter().filter(|cue| lower.contains(*cue)).count() as i32;
    (DEFAULT_RATING + hits).min(RATING_MAX)
}

/// Extract candidate task fields from `text`, resolving relative dates against local `now`.
pub fn extract_task_fields(text: &str, now: NaiveDateTime) -> Result<ExtractedTask> {
    let text = text.trim();
    let lower = text.to_lowercase();
    let (title, description) = split_title(text)?;

    Ok(ExtractedTask {
        title,
        description,
        due_date: find_due_date(text, now)?,
        effort: find_effort(text)?.unwrap_or(DEFAULT_RATING),
        consequences: cue_rating(&lower, &URGENCY_CUES),
        desire: cue_rating(&lower, &DESIRE_CUES),
    })
}
