//! Target URL classification.
//!
//! # Responsibilities
//! - Map a candidate target string to a routing category
//! - Evaluate rules in a fixed order with first-match-wins semantics
//!
//! # Design Decisions
//! - API rules run first: categories are not disjoint in principle, and an
//!   API-shaped target must never fall into a content category
//! - Matching is case-insensitive and anchored to the start of the string
//! - The scheme is optional inside each rule; extraction guarantees the
//!   string carries one by the time it reaches the classifier

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Routing category of a target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// REST API origin.
    ApiCall,
    /// API sub-path hosted on a pages subdomain.
    PagesApi,
    /// Release and source-archive downloads.
    ReleaseOrArchive,
    /// Gist raw content.
    Gist,
    /// Tags listing.
    Tags,
    /// Smart-HTTP metadata endpoints (`info/`, `git-*`).
    InfoOrGit,
    /// Blob and raw views on the main host.
    BlobOrRaw,
    /// Raw-content host.
    RawContent,
    /// Everything else; never proxied.
    Unsupported,
}

impl Category {
    /// True for categories representing REST API calls rather than file
    /// or content delivery.
    pub fn is_api_surface(self) -> bool {
        matches!(self, Category::ApiCall | Category::PagesApi)
    }

    /// Short label for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Category::ApiCall => "api",
            Category::PagesApi => "pages_api",
            Category::ReleaseOrArchive => "release",
            Category::Gist => "gist",
            Category::Tags => "tags",
            Category::InfoOrGit => "info",
            Category::BlobOrRaw => "blob",
            Category::RawContent => "raw",
            Category::Unsupported => "unsupported",
        }
    }
}

fn rule(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("classifier rule pattern")
}

// Ordered rule table. Order is load-bearing: first match wins.
static RULES: Lazy<Vec<(Regex, Category)>> = Lazy::new(|| {
    vec![
        (rule(r"^(?:https?://)?api\.github\.com/"), Category::ApiCall),
        (
            rule(r"^(?:https?://)?[^/]+\.github\.io/api/"),
            Category::PagesApi,
        ),
        (
            rule(r"^(?:https?://)?github\.com/.+?/.+?/(?:releases|archive)/"),
            Category::ReleaseOrArchive,
        ),
        (
            rule(r"^(?:https?://)?gist\.(?:githubusercontent|github)\.com/.+?/.+?/.+"),
            Category::Gist,
        ),
        (
            rule(r"^(?:https?://)?github\.com/.+?/.+?/tags"),
            Category::Tags,
        ),
        (
            rule(r"^(?:https?://)?github\.com/.+?/.+?/(?:info|git-)"),
            Category::InfoOrGit,
        ),
        (
            rule(r"^(?:https?://)?github\.com/.+?/.+?/(?:blob|raw)/"),
            Category::BlobOrRaw,
        ),
        (
            rule(r"^(?:https?://)?raw\.(?:githubusercontent|github)\.com/.+?/.+?/.+?/.+"),
            Category::RawContent,
        ),
    ]
});

/// Classify a target URL. Pure and total: every input maps to exactly one
/// category, `Unsupported` when no rule matches.
pub fn classify(target: &str) -> Category {
    RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(target))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Unsupported)
}
