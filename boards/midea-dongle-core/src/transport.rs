//! The byte transport the scheduler drives. Implemented by the embedder; this
//! crate only consumes it.

/// Non-blocking byte-oriented UART collaborator.
///
/// `read_byte` returns `None` when nothing is currently available; `write`
/// is assumed non-blocking or to perform its own buffering, matching the
/// "no operation inside the core blocks longer than copying a few hundred
/// bytes" resource model.
pub trait Transport {
    fn read_byte(&mut self) -> Option<u8>;
    fn write(&mut self, bytes: &[u8]);
}
