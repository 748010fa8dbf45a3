// ========== Core merge trait ==========

/// Combines partial statistics. Implementations must be associative and commutative so that
/// partial results can be folded in any order or grouping with identical outcome.
pub trait Merge {
    fn merge(&mut self, other: Self);

    fn merged(mut self, other: Self) -> Self
    where
        Self: Sized,
    {
        self.merge(other);
        self
    }
}
