//! Key-path segmentation and subscription matching
//!
//! A key path is a separator-joined list of segments (`"user.name"`). The
//! empty path addresses the root. There is no escaping, so a key that
//! contains the separator cannot be addressed.
//!
//! Matching works on whole segments: `"user"` is an ancestor of
//! `"user.name"`, but `"us"` is not.

/// Split a path into segments; the empty path has none
pub fn segments(path: &str, separator: char) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split(separator).collect()
    }
}

/// Whether a write at `trigger` notifies a subscriber at `subscription`
///
/// True when either path is the root, when the paths are equal, or when one
/// is a segment-wise ancestor of the other.
pub fn overlaps(subscription: &str, trigger: &str, separator: char) -> bool {
    if subscription.is_empty() || trigger.is_empty() || subscription == trigger {
        return true;
    }

    let watched = segments(subscription, separator);
    let written = segments(trigger, separator);

    watched.starts_with(&written) || written.starts_with(&watched)
}
