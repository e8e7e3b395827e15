//! Pull-based PCM stream traits.

use std::io::{Read, Seek};

/// A seekable stream of interleaved 16-bit stereo PCM.
///
/// Anything that is `Read + Seek + Send` qualifies: decoders, in-memory
/// cursors, effects and players. `read` returning `Ok(0)` signals
/// end-of-stream.
pub trait Source: Read + Seek + Send {}

impl<T: Read + Seek + Send + ?Sized> Source for T {}

/// Frame-aligned prefix length of a read of `n` bytes.
pub(crate) fn aligned(n: usize) -> usize {
    n - n % super::buffer::BYTES_PER_FRAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn accepts_source(_: &mut dyn Source) {}

    #[test]
    fn test_cursor_is_a_source() {
        let mut cursor = Cursor::new(vec![0u8; 8]);
        accepts_source(&mut cursor);
    }

    #[test]
    fn test_aligned() {
        assert_eq!(aligned(0), 0);
        assert_eq!(aligned(3), 0);
        assert_eq!(aligned(8), 8);
        assert_eq!(aligned(11), 8);
    }
}
