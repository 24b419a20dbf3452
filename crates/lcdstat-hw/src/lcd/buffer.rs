//! Off-screen character buffer for batched display updates.

use crate::{Error, Result};

/// Character used for empty cells.
pub const BLANK: u8 = b' ';

/// Row-major character buffer with a write cursor.
///
/// The size is fixed at construction. Writes past the last cell are
/// rejected rather than wrapped.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// Character cells, row-major.
    cells: Vec<u8>,
    /// Number of columns.
    columns: usize,
    /// Linear index of the next write.
    cursor: usize,
}

impl TextBuffer {
    /// Creates a blank buffer.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            cells: vec![BLANK; rows * columns],
            columns,
            cursor: 0,
        }
    }

    /// Returns the number of cells.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Returns the linear write position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the write position to a cell. Coordinates must already be in range.
    pub fn set_cursor(&mut self, row: usize, column: usize) {
        self.cursor = row * self.columns + column;
    }

    /// Moves the write position back to the first cell.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Stores a character at the write position and advances it.
    pub fn put(&mut self, byte: u8) -> Result<()> {
        let capacity = self.cells.len();
        let cell = self
            .cells
            .get_mut(self.cursor)
            .ok_or(Error::BufferOverrun {
                position: self.cursor,
                capacity,
            })?;
        *cell = byte;
        self.cursor += 1;
        Ok(())
    }

    /// Fills every cell with blanks. The write position is unchanged.
    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
    }

    /// Returns the characters of one row.
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.columns;
        &self.cells[start..start + self.columns]
    }

    /// Returns all cells, row-major.
    pub fn data(&self) -> &[u8] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_blank() {
        let buffer = TextBuffer::new(4, 20);
        assert_eq!(buffer.capacity(), 80);
        assert!(buffer.data().iter().all(|&c| c == BLANK));
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn test_put_advances_across_rows() {
        let mut buffer = TextBuffer::new(2, 3);
        buffer.set_cursor(0, 2);
        buffer.put(b'a').unwrap();
        buffer.put(b'b').unwrap();
        assert_eq!(buffer.row(0), b"  a");
        assert_eq!(buffer.row(1), b"b  ");
        assert_eq!(buffer.cursor(), 4);
    }

    #[test]
    fn test_overrun_is_rejected() {
        let mut buffer = TextBuffer::new(1, 2);
        buffer.put(b'x').unwrap();
        buffer.put(b'y').unwrap();
        let err = buffer.put(b'z').unwrap_err();
        assert!(matches!(
            err,
            Error::BufferOverrun {
                position: 2,
                capacity: 2
            }
        ));
        assert_eq!(buffer.data(), b"xy");
    }

    #[test]
    fn test_clear_keeps_cursor() {
        let mut buffer = TextBuffer::new(2, 2);
        buffer.put(b'x').unwrap();
        buffer.clear();
        assert_eq!(buffer.data(), b"    ");
        assert_eq!(buffer.cursor(), 1);
        buffer.rewind();
        assert_eq!(buffer.cursor(), 0);
    }
}
