//! Append-only, totally ordered log of turns for one session.

use voxchat_core::Turn;

use crate::error::ChatError;

/// Ordered log of a session's turns.
///
/// Turns can only be appended or the whole log cleared; nothing hands out
/// mutable access to a committed turn.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    turns: Vec<Turn>,
    next_seq: u64,
    epoch: u64,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `turn` at the end of the log and return the committed copy.
    ///
    /// Fails with [`ChatError::InvalidTurn`] when the content is blank.
    pub fn append(&mut self, turn: Turn) -> Result<&Turn, ChatError> {
        if !turn.is_valid() {
            return Err(ChatError::InvalidTurn);
        }
        self.next_seq += 1;
        let floor = self.turns.last().map(Turn::timestamp);
        self.turns.push(turn.committed(self.next_seq, floor));
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// All turns in append order.
    ///
    /// The iterator is lazy and `Clone`, so a caller can walk it more than
    /// once (for example to count and then render).
    pub fn all(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    /// The most recent `n` turns in append order; `n == 0` means all.
    pub fn recent(&self, n: usize) -> &[Turn] {
        if n == 0 || n >= self.turns.len() {
            &self.turns
        } else {
            &self.turns[self.turns.len() - n..]
        }
    }

    /// Drop every turn. Idempotent.
    ///
    /// Sequence numbers keep counting across clears so a turn's `seq` is
    /// never reused within one session. The epoch advances on every call.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.epoch += 1;
    }

    /// Number of clears so far; lets a caller detect a reset between two
    /// observations.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
