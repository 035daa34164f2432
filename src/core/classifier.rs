//! Small-talk fast path.
//!
//! A fixed set of greeting phrases is answered locally so trivial turns never
//! touch the inbox assistant API. Matching is exact (after trimming and
//! lowercasing) — no fuzzy matching, no substring containment — so the fast
//! path stays deterministic and side-effect free.

/// Canonical greeting phrases handled without a backend call.
///
/// Entries must be lowercase; incoming text is normalized before matching.
pub const SMALL_TALK: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "what's up",
    "whats up",
    "yo",
];

/// Returns true when the question is a canned greeting.
pub fn is_small_talk(question: &str) -> bool {
    let normalized = question.trim().to_lowercase();
    SMALL_TALK.contains(&normalized.as_str())
}
