//! Configurable limits for bounded decoding.

/// Wire-level limits for packet decoding.
///
/// These limits are enforced during decoding to prevent resource exhaustion
/// from malformed or hostile input. Per-item semantics belong to higher
/// layers (state/packed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum packet size in bytes.
    pub max_packet_bytes: usize,

    /// Maximum number of items a single packed list may declare.
    pub max_list_items: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Comfortably above a typical MTU-bounded send budget
            max_packet_bytes: 16 * 1024,
            max_list_items: 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_packet_bytes: 2048,
            max_list_items: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_packet_bytes: usize::MAX,
            max_list_items: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_limits_smaller_than_default() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();
        assert!(test_limits.max_packet_bytes < default_limits.max_packet_bytes);
        assert!(test_limits.max_list_items < default_limits.max_list_items);
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_packet_bytes, usize::MAX);
        assert_eq!(limits.max_list_items, usize::MAX);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_packet_bytes, 2048);
    }
}
