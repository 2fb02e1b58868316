//! Centralized limits for template substitution.
//!
//! The substitution engine recurses once per level of nested type arguments
//! (`array<string, list<T>>` is three levels deep). Declared types are
//! well-formed by the time they reach the engine, but nothing stops a
//! declaration from being self-referential through class metadata, so the
//! callers need a ceiling. These constants are that ceiling.
//!
//! Exceeding a limit is never an error: the engine stops descending and
//! keeps the declared (un-narrowed) nested type.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth for standin substitution.
///
/// The `depth` argument of a substitution starts at 0 and grows by one per
/// nested container. Past this depth nested type arguments are emitted
/// unchanged and no further bindings are recorded.
///
/// ```text
/// // Each `array<…>` layer is one level:
/// array<array<array<array< /* ... 64 layers ... */ T>>>>
/// ```
pub const MAX_STANDIN_DEPTH: u32 = 64;

/// Maximum nesting depth for replacing template parameters with their
/// inferred bindings.
///
/// Bindings may themselves contain containers of template parameters, so
/// this is kept in line with [`MAX_STANDIN_DEPTH`].
pub const MAX_INFERRED_REPLACE_DEPTH: u32 = MAX_STANDIN_DEPTH;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Inline capacity of the atomic buffers built per union during substitution.
///
/// Declared unions rarely have more than a handful of members
/// (`T|null`, `int|string|false`).
pub const INLINE_ATOMIC_CAPACITY: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inferred_replace_depth_tracks_standin_depth() {
        assert_eq!(MAX_INFERRED_REPLACE_DEPTH, MAX_STANDIN_DEPTH);
        assert!(INLINE_ATOMIC_CAPACITY >= 2);
    }
}
