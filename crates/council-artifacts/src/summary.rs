//! Lazy summary generation (§4.5, §9): `Audit` is the raw payload; the
//! other tiers are cheap heuristic extractions, generated once per
//! `(artifact_id, tier)` and cached by the store so a repeat request is a
//! file read, not a recompute.

use crate::model::SummaryTier;

const GIST_MAX_CHARS: usize = 280;
const FINDINGS_MAX_LINES: usize = 12;
const ACTIONS_MAX_LINES: usize = 12;

/// Generate the summary text for `tier` from a payload's raw text. Callers
/// only invoke this for non-`Audit` tiers; `Audit` is served from the raw
/// payload directly.
#[must_use]
pub fn generate(tier: SummaryTier, payload: &str) -> String {
    match tier {
        SummaryTier::Gist => gist(payload),
        SummaryTier::Findings => bullets_with_keyword(payload, FINDINGS_MAX_LINES, &["find", "issue", "bug", "flaw", "risk"]),
        SummaryTier::Actions => bullets_with_keyword(payload, ACTIONS_MAX_LINES, &["fix", "should", "must", "action", "recommend"]),
        SummaryTier::Rationale => first_paragraph(payload),
        SummaryTier::Audit => payload.to_string(),
    }
}

/// First ~`GIST_MAX_CHARS` characters, cut at a word boundary and marked
/// with an ellipsis if truncated.
fn gist(payload: &str) -> String {
    let trimmed = payload.trim();
    if trimmed.chars().count() <= GIST_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut cut = trimmed
        .char_indices()
        .take_while(|(idx, _)| *idx < GIST_MAX_CHARS)
        .last()
        .map_or(0, |(idx, c)| idx + c.len_utf8());
    while cut > 0 && !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &trimmed[..cut];
    let head = head.rsplit_once(char::is_whitespace).map_or(head, |(before, _)| before);
    format!("{}…", head.trim_end())
}

/// The first non-empty paragraph, used for `RATIONALE`: usually the
/// synthesis/critique author's own framing of why a decision was made.
fn first_paragraph(payload: &str) -> String {
    payload
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or(payload.trim())
        .to_string()
}

/// Pull up to `max_lines` non-empty lines that look like list items or that
/// mention one of `keywords`, preserving original order.
fn bullets_with_keyword(payload: &str, max_lines: usize, keywords: &[&str]) -> String {
    let selected: Vec<&str> = payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            is_bullet(line) || keywords.iter().any(|kw| lower.contains(kw))
        })
        .take(max_lines)
        .collect();

    if selected.is_empty() {
        return first_paragraph(payload);
    }
    selected.join("\n")
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('-') || line.starts_with('*') || line.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gist_passes_short_text_through() {
        assert_eq!(gist("short text"), "short text");
    }

    #[test]
    fn gist_truncates_long_text_at_word_boundary() {
        let payload = "word ".repeat(100);
        let gist = gist(&payload);
        assert!(gist.ends_with('…'));
        assert!(gist.chars().count() <= GIST_MAX_CHARS + 1);
    }

    #[test]
    fn findings_extracts_bullet_lines() {
        let payload = "Intro text.\n- found a race condition\n- looks fine otherwise\nTrailer.";
        let findings = generate(SummaryTier::Findings, payload);
        assert!(findings.contains("race condition"));
    }

    #[test]
    fn rationale_takes_first_paragraph() {
        let payload = "First paragraph.\n\nSecond paragraph.";
        assert_eq!(generate(SummaryTier::Rationale, payload), "First paragraph.");
    }

    #[test]
    fn actions_falls_back_to_first_paragraph_when_nothing_matches() {
        let payload = "Just a plain sentence with no markers.";
        assert_eq!(generate(SummaryTier::Actions, payload), payload);
    }
}
