//! Label-anchored field extraction from raw OCR text
//!
//! Pure functions over text: no IO, no state. A fixed set of label
//! phrases anchors the search for an account-holder name and an account
//! number; a rejection set keeps other labels and generic form words
//! from being mistaken for values.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Label phrases that may precede an account-holder name (document order
/// decides ties between lines; alternation order decides ties within one)
const NAME_LABELS: &[&str] = &[
    "Name of Account Holder",
    "First name",
    "First names",
    "Surname",
    "Surnames",
    "Other name",
    "Other names",
    "Print name",
    "Account Name",
    "Institution Name",
    "Account Number",
    "Account number",
    "Account no",
    "CSD Number",
    "Client CSD Securities Account No",
    "ID number",
    "UMB-IHL ID Number",
    "Name",
    "Name of Organisation",
    "Name of Organization",
];

/// Labels that may precede an account number, in priority order
const ACCOUNT_LABELS: &[&str] = &[
    "Account Number",
    "Account number",
    "Account no",
    "CSD Number",
    "Client CSD Securities Account No",
    "ID number",
    "UMB-IHL ID Number",
];

/// Generic form words that can never be accepted as an extracted value
const STOP_WORDS: &[&str] = &[
    "branch", "account", "name", "surname", "other", "print", "institution",
    "organization", "organisation", "no", "number", "holder", "csd", "id",
    "client", "details", "purpose", "period", "address", "tel", "email",
    "photo", "reference", "date", "relationship", "employer", "spouse",
    "failed", "partial", "indexed", "fully", "of", "the", "and", "or", "as",
    "it", "is", "are", "was", "be", "on", "in", "at", "to", "for", "by",
    "with", "from", "this", "that", "these", "those", "a", "an",
];

/// Normalized forms of every known label
static LABEL_NORMS: Lazy<HashSet<String>> =
    Lazy::new(|| NAME_LABELS.iter().map(|l| normalize(l)).collect());

/// Full rejection set: label norms plus generic stop words
static REJECTED: Lazy<HashSet<String>> = Lazy::new(|| {
    let mut set: HashSet<String> = NAME_LABELS.iter().map(|l| normalize(l)).collect();
    set.extend(STOP_WORDS.iter().map(|w| normalize(w)));
    set
});

/// Matches any name label, optionally followed by a colon
static NAME_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = NAME_LABELS
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)({})\s*:?", alternation)).expect("name label regex")
});

/// One regex per account label, keeping the priority order
static ACCOUNT_LABEL_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ACCOUNT_LABELS
        .iter()
        .map(|label| {
            Regex::new(&format!(r"(?i){}\s*:?\s*([A-Za-z0-9\-]+)", regex::escape(label)))
                .expect("account label regex")
        })
        .collect()
});

/// Best-effort extraction result; either field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub account: Option<String>,
}

impl ExtractedFields {
    /// True when both identifying fields were recovered
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.account.is_some()
    }

    /// True when neither field was recovered
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.account.is_none()
    }
}

/// Lowercase and strip everything but ASCII letters and digits
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Extract (name, account) from raw OCR text. Both searches are
/// independent; a failed extraction yields `None`, never a guess.
pub fn parse_fields(text: &str) -> ExtractedFields {
    let lines: Vec<&str> = text.lines().collect();
    ExtractedFields {
        name: extract_name(&lines),
        account: extract_account(&lines),
    }
}

/// First label match in document order that yields an accepted candidate
fn extract_name(lines: &[&str]) -> Option<String> {
    for (idx, line) in lines.iter().enumerate() {
        let m = match NAME_LABEL_RE.find(line) {
            Some(m) => m,
            None => continue,
        };

        let after = line[m.end()..].trim();
        let mut words = collect_value_tokens(after);

        // Some forms print the value on the line below the label
        if words.is_empty() {
            if let Some(next) = lines.get(idx + 1) {
                words = collect_value_tokens(next.trim());
            }
        }

        let candidate = words.join(" ");
        let norm = normalize(&candidate);
        if !candidate.is_empty() && !REJECTED.contains(&norm) && norm.len() > 2 {
            return Some(candidate);
        }
    }
    None
}

/// Collect whitespace-separated tokens up to the first rejected one
fn collect_value_tokens(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for word in text.split_whitespace() {
        let norm = normalize(word);
        if LABEL_NORMS.contains(&norm) || REJECTED.contains(&norm) {
            break;
        }
        words.push(word.to_string());
    }
    words
}

/// First accepted candidate while iterating labels in priority order;
/// label priority, not document order, decides ties
fn extract_account(lines: &[&str]) -> Option<String> {
    for re in ACCOUNT_LABEL_RES.iter() {
        for line in lines {
            let caps = match re.captures(line) {
                Some(c) => c,
                None => continue,
            };
            let candidate = caps[1].trim().to_string();
            let norm = normalize(&candidate);
            let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
            if !REJECTED.contains(&norm) && (10..=20).contains(&digits) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_only() {
        let fields = parse_fields("Account Number: 1234567890");
        assert_eq!(fields.account.as_deref(), Some("1234567890"));
        assert_eq!(fields.name, None);
    }

    #[test]
    fn test_surname_and_account() {
        let fields = parse_fields("Surname: Doe\nAccount no: 9988776655");
        assert_eq!(fields.name.as_deref(), Some("Doe"));
        assert_eq!(fields.account.as_deref(), Some("9988776655"));
        assert!(fields.is_complete());
    }

    #[test]
    fn test_empty_text() {
        let fields = parse_fields("");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_account_digit_length_boundaries() {
        // 9 digits: rejected
        assert_eq!(parse_fields("Account Number: 123456789").account, None);
        // 10 digits: accepted
        assert_eq!(
            parse_fields("Account Number: 1234567890").account.as_deref(),
            Some("1234567890")
        );
        // 20 digits: accepted
        assert_eq!(
            parse_fields("Account Number: 12345678901234567890")
                .account
                .as_deref(),
            Some("12345678901234567890")
        );
        // 21 digits: rejected
        assert_eq!(
            parse_fields("Account Number: 123456789012345678901").account,
            None
        );
    }

    #[test]
    fn test_account_keeps_hyphenated_form() {
        let fields = parse_fields("CSD Number: AB-12345-67890");
        assert_eq!(fields.account.as_deref(), Some("AB-12345-67890"));
    }

    #[test]
    fn test_account_label_priority_beats_document_order() {
        // "CSD Number" appears first in the document, but "Account no"
        // ranks higher in the priority list.
        let text = "CSD Number: 1111111111\nAccount no: 2222222222";
        let fields = parse_fields(text);
        assert_eq!(fields.account.as_deref(), Some("2222222222"));
    }

    #[test]
    fn test_name_on_next_line() {
        let fields = parse_fields("Name of Account Holder:\nJane Mensah");
        assert_eq!(fields.name.as_deref(), Some("Jane Mensah"));
    }

    #[test]
    fn test_name_stops_at_other_label() {
        let fields = parse_fields("Surname: Mensah Account Number: 1234567890");
        assert_eq!(fields.name.as_deref(), Some("Mensah"));
    }

    #[test]
    fn test_stop_word_is_not_a_name() {
        // "Branch" is a generic form word, never a value
        let fields = parse_fields("Account Name: Branch");
        assert_eq!(fields.name, None);
    }

    #[test]
    fn test_short_name_rejected() {
        // Normalized length must exceed 2 characters
        let fields = parse_fields("Surname: Jo");
        assert_eq!(fields.name, None);
    }

    #[test]
    fn test_first_matching_line_wins_for_name() {
        let text = "Surname: Asante\nPrint name: Kwame";
        let fields = parse_fields(text);
        assert_eq!(fields.name.as_deref(), Some("Asante"));
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Account-Number!"), "accountnumber");
        assert_eq!(normalize("  J.O. "), "jo");
    }
}
