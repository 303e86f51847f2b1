use crate::AmlError;
use alloc::{string::String, vec::Vec};

/// A cursor over an AML byte buffer with nested scope tracking.
///
/// Every `PkgLength`-delimited construct pushes a scope whose end offset bounds
/// all reads inside it. Reading across the current scope's end, or popping a
/// scope before its content is fully consumed, fails with
/// [`AmlError::ScopeMismatch`] so that a misparse can never silently bleed into
/// the next construct.
pub struct Stream<'a> {
    data: &'a [u8],
    cursor: usize,
    scopes: Vec<usize>,
}

impl<'a> Stream<'a> {
    pub fn new(data: &'a [u8]) -> Stream<'a> {
        Stream { data, cursor: 0, scopes: Vec::new() }
    }

    pub fn offset(&self) -> usize {
        self.cursor
    }

    /// The end offset of the innermost scope (the buffer end if none is open).
    pub fn scope_end(&self) -> usize {
        self.scopes.last().copied().unwrap_or(self.data.len())
    }

    pub fn remaining(&self) -> usize {
        self.scope_end().saturating_sub(self.cursor)
    }

    pub fn at_scope_end(&self) -> bool {
        self.cursor >= self.scope_end()
    }

    fn check_avail(&self, count: usize) -> Result<(), AmlError> {
        if self.cursor + count > self.scope_end() {
            if self.cursor + count > self.data.len() {
                Err(AmlError::UnexpectedEndOfStream)
            } else {
                Err(AmlError::ScopeMismatch)
            }
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, AmlError> {
        self.check_avail(1)?;
        let byte = self.data[self.cursor];
        self.cursor += 1;
        Ok(byte)
    }

    pub fn peek_u8(&self) -> Result<u8, AmlError> {
        self.check_avail(1)?;
        Ok(self.data[self.cursor])
    }

    /// Reads `count` bytes (1, 2, 4, or 8) as a little-endian unsigned integer.
    pub fn read_integer(&mut self, count: usize) -> Result<u64, AmlError> {
        self.check_avail(count)?;
        let mut value = 0;
        for i in 0..count {
            value |= (self.data[self.cursor + i] as u64) << (i * 8);
        }
        self.cursor += count;
        Ok(value)
    }

    pub fn peek_integer(&self, count: usize) -> Result<u64, AmlError> {
        self.check_avail(count)?;
        let mut value = 0;
        for i in 0..count {
            value |= (self.data[self.cursor + i] as u64) << (i * 8);
        }
        Ok(value)
    }

    /// Reads a 1- or 2-byte opcode. A leading extension prefix (`0x5b`) pulls
    /// in the following byte, producing `(second << 8) | 0x5b`.
    pub fn read_opcode(&mut self) -> Result<u16, AmlError> {
        let first = self.read_u8()?;
        if first == crate::opcode::EXT_OP_PREFIX {
            let second = self.read_u8()?;
            Ok(((second as u16) << 8) | (first as u16))
        } else {
            Ok(first as u16)
        }
    }

    pub fn peek_opcode(&self) -> Result<u16, AmlError> {
        let first = self.peek_u8()?;
        if first == crate::opcode::EXT_OP_PREFIX {
            self.check_avail(2)?;
            let second = self.data[self.cursor + 1];
            Ok(((second as u16) << 8) | (first as u16))
        } else {
            Ok(first as u16)
        }
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], AmlError> {
        self.check_avail(count)?;
        let slice = &self.data[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(slice)
    }

    /// Reads exactly `count` bytes as a Latin-1 string (used for name segments).
    pub fn read_fixed_string(&mut self, count: usize) -> Result<String, AmlError> {
        let bytes = self.read_bytes(count)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    /// Reads a NUL-terminated Latin-1 string, consuming the terminator.
    pub fn read_string(&mut self) -> Result<String, AmlError> {
        let mut string = String::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0x00 {
                break;
            }
            string.push(byte as char);
        }
        Ok(string)
    }

    /// Consumes and returns all bytes up to the end of the current scope.
    pub fn read_to_scope_end(&mut self) -> Result<&'a [u8], AmlError> {
        self.read_bytes(self.remaining())
    }

    pub fn push_scope(&mut self, length: usize) -> Result<(), AmlError> {
        if self.cursor + length > self.scope_end() {
            return Err(AmlError::ScopeMismatch);
        }
        self.scopes.push(self.cursor + length);
        Ok(())
    }

    /// Closes the innermost scope. Unless `force` is set, the cursor must sit
    /// exactly at the scope's end.
    pub fn pop_scope(&mut self, force: bool) -> Result<(), AmlError> {
        let end = match self.scopes.last() {
            Some(&end) => end,
            None => return Err(AmlError::ScopeMismatch),
        };
        if !force && self.cursor != end {
            return Err(AmlError::ScopeMismatch);
        }
        self.scopes.pop();
        Ok(())
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Discards scopes down to a recorded depth, regardless of cursor
    /// position. Used when recovering from a failed parse inside a package.
    pub fn truncate_scopes(&mut self, depth: usize) {
        self.scopes.truncate(depth);
    }

    /// Relocates the cursor to an absolute offset. Used when jumping into a
    /// deferred byte range for second-pass expansion.
    pub fn seek(&mut self, offset: usize) -> Result<(), AmlError> {
        if offset > self.data.len() {
            return Err(AmlError::UnexpectedEndOfStream);
        }
        self.cursor = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers() {
        let mut stream = Stream::new(&[0x34, 0x12, 0xff]);
        assert_eq!(stream.peek_integer(2), Ok(0x1234));
        assert_eq!(stream.read_integer(2), Ok(0x1234));
        assert_eq!(stream.read_u8(), Ok(0xff));
        assert_eq!(stream.read_u8(), Err(AmlError::UnexpectedEndOfStream));
    }

    #[test]
    fn test_opcodes() {
        let mut stream = Stream::new(&[0x10, 0x5b, 0x82]);
        assert_eq!(stream.read_opcode(), Ok(0x0010));
        assert_eq!(stream.peek_opcode(), Ok(0x825b));
        assert_eq!(stream.read_opcode(), Ok(0x825b));
    }

    #[test]
    fn test_strings() {
        let mut stream = Stream::new(&[b'_', b'S', b'B', b'_', b'h', b'i', 0x00]);
        assert_eq!(stream.read_fixed_string(4).unwrap(), "_SB_");
        assert_eq!(stream.read_string().unwrap(), "hi");
        assert!(stream.at_scope_end());
    }

    #[test]
    fn test_scopes() {
        let mut stream = Stream::new(&[1, 2, 3, 4, 5]);
        stream.push_scope(3).unwrap();
        assert_eq!(stream.remaining(), 3);
        // Reading past the scope end is a mismatch, not an end-of-stream.
        assert_eq!(stream.read_integer(4), Err(AmlError::ScopeMismatch));
        assert_eq!(stream.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert_eq!(stream.pop_scope(false), Ok(()));
        assert_eq!(stream.read_u8(), Ok(4));
    }

    #[test]
    fn test_unbalanced_pop() {
        let mut stream = Stream::new(&[1, 2, 3]);
        stream.push_scope(3).unwrap();
        stream.read_u8().unwrap();
        assert_eq!(stream.pop_scope(false), Err(AmlError::ScopeMismatch));
        assert_eq!(stream.pop_scope(true), Ok(()));
    }

    #[test]
    fn test_seek() {
        let mut stream = Stream::new(&[1, 2, 3]);
        stream.read_u8().unwrap();
        stream.seek(0).unwrap();
        assert_eq!(stream.read_u8(), Ok(1));
        assert_eq!(stream.seek(7), Err(AmlError::UnexpectedEndOfStream));
    }
}
