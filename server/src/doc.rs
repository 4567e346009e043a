//! The per-room shared document: an opaque ordered stroke log.
//!
//! DESIGN
//! ======
//! The relay does not implement merge semantics — the log is append-only
//! from the server's point of view, with a whole-document clear as the only
//! delete. The single invariant owned here is the append boundary: a stroke
//! with zero points is never admitted, and the wire carries exactly one
//! stroke per append (never a batch-of-one wrapper).

use sketch::Stroke;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocError {
    #[error("stroke has no points")]
    EmptyStroke,
}

/// Ordered log of finalized strokes, created eagerly with its room and
/// disposed with it.
#[derive(Debug, Default)]
pub struct StrokeLog {
    strokes: Vec<Stroke>,
}

impl StrokeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one stroke.
    ///
    /// # Errors
    ///
    /// Rejects a stroke with an empty point list; the log is unchanged.
    pub fn push(&mut self, stroke: Stroke) -> Result<(), DocError> {
        if stroke.points.is_empty() {
            return Err(DocError::EmptyStroke);
        }
        self.strokes.push(stroke);
        Ok(())
    }

    /// Snapshot of the log in append order, for syncing a new joiner.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.strokes.clone()
    }

    /// Empty the log (undo-all / clear-canvas).
    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

#[cfg(test)]
#[path = "doc_test.rs"]
mod tests;
