//! Verdict extraction from reviewer output and review files.
//!
//! Grammar, case-insensitive:
//! - labeled form: a line starting with `Verdict:` or `**Verdict:**`
//!   (optionally under a markdown heading), followed by one keyword.
//!   Emphasis, emoji and punctuation may sit between label and keyword;
//!   words may not, so `Verdict: not approved` carries no label.
//! - bare form: the first of `APPROVED`, `NEEDS_REVISION`, `REJECTED`
//!   appearing anywhere as a whole word
//!
//! The labeled form wins when present. Anything else is `Verdict::Unknown`.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::workflow::Verdict;

static LABELED_VERDICT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*verdict:\*\*|\*\*verdict\*\*:|verdict:)[^\w\r\n]*(approved|needs_revision|rejected)\b",
    )
    .unwrap()
});

static BARE_VERDICT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(approved|needs_revision|rejected)\b").unwrap());

/// Extract the governing verdict from free text.
pub fn parse_verdict(text: &str) -> Verdict {
    if let Some(verdict) = labeled_verdict(text) {
        return verdict;
    }
    BARE_VERDICT_REGEX
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| Verdict::from_keyword(m.as_str()))
        .unwrap_or(Verdict::Unknown)
}

/// The first labeled verdict in `text`, if any.
pub fn labeled_verdict(text: &str) -> Option<Verdict> {
    LABELED_VERDICT_REGEX
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| Verdict::from_keyword(m.as_str()))
}

/// Whether any labeled verdict line in `text` says APPROVED.
pub fn has_approved_label(text: &str) -> bool {
    LABELED_VERDICT_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .any(|m| Verdict::from_keyword(m.as_str()) == Verdict::Approved)
}

/// Whether the review file at `path` carries an APPROVED verdict line.
///
/// Absent or unreadable files count as not approved.
pub fn review_approved(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(content) => has_approved_label(&content),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "could not read review file");
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_labeled_plain() {
        assert_eq!(parse_verdict("Verdict: NEEDS_REVISION"), Verdict::NeedsRevision);
    }

    #[test]
    fn test_parse_labeled_bold() {
        let text = "# Review\n\n**Verdict:** APPROVED\n\nLooks good.";
        assert_eq!(parse_verdict(text), Verdict::Approved);
    }

    #[test]
    fn test_parse_labeled_bold_variants() {
        assert_eq!(parse_verdict("**Verdict**: rejected"), Verdict::Rejected);
        assert_eq!(parse_verdict("## Verdict: **APPROVED**"), Verdict::Approved);
        assert_eq!(parse_verdict("  verdict:   needs_revision"), Verdict::NeedsRevision);
    }

    #[test]
    fn test_parse_labeled_with_decoration() {
        assert_eq!(parse_verdict("**Verdict:** ✅ APPROVED"), Verdict::Approved);
        assert_eq!(parse_verdict("Verdict: [NEEDS_REVISION]"), Verdict::NeedsRevision);
        assert_eq!(parse_verdict("Verdict: ❌ - REJECTED"), Verdict::Rejected);
        assert_eq!(labeled_verdict("Verdict: not approved"), None);
        assert!(has_approved_label("# Review

**Verdict:** ✅ APPROVED
"));
    }

    #[test]
    fn test_label_takes_precedence_over_earlier_keyword() {
        let text = "The earlier draft was APPROVED by mistake.\nVerdict: REJECTED";
        assert_eq!(parse_verdict(text), Verdict::Rejected);
    }

    #[test]
    fn test_first_bare_keyword_wins() {
        assert_eq!(
            parse_verdict("NEEDS_REVISION before this can be approved"),
            Verdict::NeedsRevision
        );
        assert_eq!(parse_verdict("The review is APPROVED"), Verdict::Approved);
        assert_eq!(
            parse_verdict("REJECTED due to security issues"),
            Verdict::Rejected
        );
    }

    #[test]
    fn test_bare_keyword_is_case_insensitive() {
        assert_eq!(parse_verdict("approved"), Verdict::Approved);
        assert_eq!(parse_verdict("Needs_Revision"), Verdict::NeedsRevision);
        assert_eq!(parse_verdict("rejected"), Verdict::Rejected);
    }

    #[test]
    fn test_bare_keyword_needs_word_boundary() {
        assert_eq!(parse_verdict("This is UNAPPROVED work"), Verdict::Unknown);
    }

    #[test]
    fn test_no_verdict_is_unknown() {
        assert_eq!(parse_verdict(""), Verdict::Unknown);
        assert_eq!(parse_verdict("I looked at the code."), Verdict::Unknown);
    }

    #[test]
    fn test_labeled_verdict_must_start_line() {
        assert_eq!(labeled_verdict("The Verdict: APPROVED"), None);
        assert_eq!(labeled_verdict("x\nVerdict: APPROVED"), Some(Verdict::Approved));
    }

    #[test]
    fn test_has_approved_label_scans_all_lines() {
        let text = "Verdict: NEEDS_REVISION\n\n## Re-review\nVerdict: APPROVED\n";
        assert!(has_approved_label(text));
        assert!(!has_approved_label("Verdict: REJECTED\nall good, approved"));
    }

    #[test]
    fn test_review_approved_missing_file() {
        assert!(!review_approved(Path::new("/nonexistent/review.md")));
    }

    #[test]
    fn test_review_approved_file_contents() {
        let dir = tempdir().unwrap();
        let approved = dir.path().join("review-a.md");
        let rejected = dir.path().join("review-b.md");
        let unlabeled = dir.path().join("review-c.md");
        std::fs::write(&approved, "**Verdict:** APPROVED\n").unwrap();
        std::fs::write(&rejected, "**Verdict:** REJECTED\n").unwrap();
        std::fs::write(&unlabeled, "APPROVED\n").unwrap();

        assert!(review_approved(&approved));
        assert!(!review_approved(&rejected));
        assert!(!review_approved(&unlabeled));
    }
}
