//! Workflow engine
//!
//! The state machines behind the platform: organization verification,
//! job applications, class enrollments, resume management and job
//! publishing. Every operation takes the acting account explicitly as
//! `operate(actor, input)`; authorization preconditions are ordinary,
//! testable parameters rather than ambient lookups.

pub mod applications;
pub mod enrollments;
pub mod jobs;
pub mod resumes;
pub mod verification;

use regex_lite::Regex;
use std::sync::OnceLock;

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

/// Slugs are lowercase alphanumerics and dashes
pub fn is_valid_slug(slug: &str) -> bool {
    let re = SLUG_RE.get_or_init(|| Regex::new("^[a-z0-9-]+$").expect("slug regex is valid"));
    !slug.is_empty() && re.is_match(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_format() {
        assert!(is_valid_slug("tokyo-waiter-2026"));
        assert!(is_valid_slug("n3"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Tokyo-Waiter"));
        assert!(!is_valid_slug("tokyo waiter"));
        assert!(!is_valid_slug("tokyo_waiter"));
        assert!(!is_valid_slug("jobs/../admin"));
    }
}
