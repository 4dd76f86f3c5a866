//! Transaction visibility gate.
//!
//! The messaging core does not run a transaction manager; it records write
//! pointers alongside messages and asks the gate at fetch time which of them
//! a consumer's snapshot may see. Embedders plug in their coordinator by
//! implementing [`TransactionGate`].

/// Decides visibility of transactionally published messages.
///
/// Implementations must be cheap to call per message; fetch consults the
/// gate once per transactional row it scans.
pub trait TransactionGate: Send + Sync {
    /// Whether the transaction behind `write_pointer` is committed and
    /// visible to a consumer reading at `snapshot`.
    fn is_visible(&self, write_pointer: i64, snapshot: i64) -> bool;

    /// Whether the transaction behind `write_pointer` was rolled back. Its
    /// messages are skipped regardless of snapshot.
    fn is_invalidated(&self, write_pointer: i64) -> bool;
}

/// Gate that treats every transactional write as committed.
///
/// Suitable for embedders that publish transactionally for atomicity but do
/// not need snapshot isolation on the consumer side.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl TransactionGate for OpenGate {
    fn is_visible(&self, _write_pointer: i64, _snapshot: i64) -> bool {
        true
    }

    fn is_invalidated(&self, _write_pointer: i64) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_gate_sees_everything() {
        let gate = OpenGate;
        assert!(gate.is_visible(42, 0));
        assert!(!gate.is_invalidated(42));
    }
}
