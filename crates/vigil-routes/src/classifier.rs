//! Policy and classifier: path → trust tier.

use serde::{Deserialize, Serialize};

use crate::RouteTier;

// ---------------------------------------------------------------------------
// RoutePolicy
// ---------------------------------------------------------------------------

/// The curated route lists, loadable from configuration.
///
/// Which routes are "mixed" versus "protected" is a product decision
/// that changes as pages ship; deployments override this rather than
/// recompiling. Matching order (public before mixed, protected as the
/// fallback) is what makes the tiers mutually exclusive, so the lists
/// themselves don't need to be disjoint — a path in both lists is
/// simply purely-public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Locale segments stripped before matching (`/en/about` → `/about`).
    pub locales: Vec<String>,

    /// Prefixes of pages whose content is identical with or without a
    /// session.
    pub public_prefixes: Vec<String>,

    /// Prefixes of pages that are public but personalized when signed in.
    /// The entry `/` matches only the root path, not everything.
    pub mixed_prefixes: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            locales: vec!["en".into(), "de".into()],
            public_prefixes: vec![
                "/about".into(),
                "/imprint".into(),
                "/privacy".into(),
                "/terms".into(),
                "/contact".into(),
                "/auth".into(),
            ],
            mixed_prefixes: vec![
                "/".into(),
                "/courses".into(),
                "/coaching".into(),
                "/coaches".into(),
                "/offers".into(),
            ],
        }
    }
}

impl RoutePolicy {
    /// Normalizes the policy so it is safe to match against.
    ///
    /// - Empty prefix entries are dropped (an empty entry would be a
    ///   catch-all and silently swallow the protected fallback).
    /// - Entries get a leading `/` if missing.
    /// - Locale entries are lowercased.
    pub fn validated(mut self) -> Self {
        for list in [&mut self.public_prefixes, &mut self.mixed_prefixes] {
            list.retain(|entry| {
                let keep = !entry.trim_matches('/').is_empty() || entry == "/";
                if !keep {
                    tracing::warn!(entry = %entry, "dropping empty route prefix");
                }
                keep
            });
            for entry in list.iter_mut() {
                if !entry.starts_with('/') {
                    *entry = format!("/{entry}");
                }
            }
        }
        for locale in &mut self.locales {
            *locale = locale.to_ascii_lowercase();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// RouteClassifier
// ---------------------------------------------------------------------------

/// Classifies paths into trust tiers. Pure and deterministic: the same
/// path always yields the same tier.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    locales: Vec<String>,
    public_prefixes: Vec<Vec<String>>,
    mixed_prefixes: Vec<Vec<String>>,
}

impl RouteClassifier {
    /// Builds a classifier from a policy. The policy is validated first;
    /// prefixes are pre-split into segments so matching is allocation-free.
    pub fn new(policy: RoutePolicy) -> Self {
        let policy = policy.validated();
        Self {
            locales: policy.locales,
            public_prefixes: policy
                .public_prefixes
                .iter()
                .map(|p| split_segments(p))
                .collect(),
            mixed_prefixes: policy
                .mixed_prefixes
                .iter()
                .map(|p| split_segments(p))
                .collect(),
        }
    }

    /// Classifies a path.
    ///
    /// Steps, in order:
    /// 1. strip query/fragment and split into segments
    /// 2. strip a leading locale segment
    /// 3. purely-public prefixes
    /// 4. mixed prefixes
    /// 5. fallback: `Protected`
    pub fn classify(&self, path: &str) -> RouteTier {
        let mut segments = split_segments(path);

        if let Some(first) = segments.first() {
            if self.locales.iter().any(|l| l == &first.to_ascii_lowercase()) {
                segments.remove(0);
            }
        }

        if matches_any(&self.public_prefixes, &segments) {
            return RouteTier::PurelyPublic;
        }
        if matches_any(&self.mixed_prefixes, &segments) {
            return RouteTier::Mixed;
        }
        RouteTier::Protected
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new(RoutePolicy::default())
    }
}

/// Splits a path into its non-empty segments, ignoring query and
/// fragment. `/en/courses/42?tab=info` → `["en", "courses", "42"]`.
fn split_segments(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Segment-aligned prefix match. An empty prefix (the `/` entry) matches
/// only the root path — never acts as a catch-all.
fn matches_any(prefixes: &[Vec<String>], segments: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        if prefix.is_empty() {
            segments.is_empty()
        } else {
            segments.len() >= prefix.len() && segments[..prefix.len()] == prefix[..]
        }
    })
}

// =========================================================================
// Tests
// =========================================================================
