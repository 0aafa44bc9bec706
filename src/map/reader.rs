use byteorder::{
	ByteOrder,
	LittleEndian,
};

use crate::{
	MpzResult, MpzError,
};

/// A forward-only cursor over the fully decompressed body of a map file.
/// Every read advances the cursor by exactly the encoded width; there is no
/// seeking backward. All multi-byte primitives are little-endian with no
/// padding or alignment between fields.
///
/// Reading past the end of the buffer fails with [MpzError::Truncated] and
/// leaves the cursor where it was.
pub struct MapReader<'a> {
	data: &'a [u8],
	offset: usize,
}

impl<'a> MapReader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self {
			data,
			offset: 0,
		}
	}

	/// The current read position, measured from the start of the buffer.
	pub fn offset(&self) -> usize {
		self.offset
	}

	/// How many bytes are left unread.
	pub fn remaining(&self) -> usize {
		self.data.len() - self.offset
	}

	/// Takes the next `count` raw bytes and advances the cursor.
	pub fn read_bytes(&mut self, count: usize) -> MpzResult<&'a [u8]> {
		if self.remaining() < count {
			return Err(MpzError::Truncated {
				offset: self.offset,
				wanted: count,
			});
		}
		let bytes = &self.data[self.offset..self.offset + count];
		self.offset += count;
		Ok(bytes)
	}

	pub fn read_uchar(&mut self) -> MpzResult<u8> {
		Ok(self.read_bytes(1)?[0])
	}

	pub fn read_ushort(&mut self) -> MpzResult<u16> {
		Ok(LittleEndian::read_u16(self.read_bytes(2)?))
	}

	pub fn read_int(&mut self) -> MpzResult<i32> {
		Ok(LittleEndian::read_i32(self.read_bytes(4)?))
	}

	pub fn read_float(&mut self) -> MpzResult<f32> {
		Ok(LittleEndian::read_f32(self.read_bytes(4)?))
	}

	/// Reads a string of `len` characters. When `null_terminated` is set the
	/// wire field is `len + 1` bytes wide and the trailing byte is dropped.
	/// The bytes must be valid UTF-8.
	pub fn read_str(&mut self, len: usize, null_terminated: bool) -> MpzResult<String> {
		let width = if null_terminated { len + 1 } else { len };
		let bytes = self.read_bytes(width)?;
		Ok(String::from_utf8(bytes[..len].to_vec())?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn primitives_test() {
		let data = [
			0x2A, 0x00, 0x00, 0x00,       // 42i32
			0x34, 0x12,                   // 0x1234u16
			0x00, 0x00, 0x80, 0x3F,       // 1.0f32
			0xFF,                         // 255u8
		];
		let mut reader = MapReader::new(&data);
		assert_eq!(reader.read_int().unwrap(), 42);
		assert_eq!(reader.read_ushort().unwrap(), 0x1234);
		assert_eq!(reader.read_float().unwrap(), 1.0);
		assert_eq!(reader.read_uchar().unwrap(), 0xFF);
		assert_eq!(reader.remaining(), 0);
		assert_eq!(reader.offset(), data.len());
	}

	#[test]
	fn negative_int_test() {
		let data = (-5i32).to_le_bytes();
		let mut reader = MapReader::new(&data);
		assert_eq!(reader.read_int().unwrap(), -5);
	}

	#[test]
	fn truncation_test() {
		let data = [0x01, 0x02];
		let mut reader = MapReader::new(&data);
		match reader.read_int() {
			Err(MpzError::Truncated { offset, wanted }) => {
				assert_eq!(offset, 0);
				assert_eq!(wanted, 4);
			}
			other => panic!("expected truncation, got {other:?}"),
		}
		// The failed read must not have moved the cursor.
		assert_eq!(reader.offset(), 0);
		assert_eq!(reader.read_ushort().unwrap(), 0x0201);
	}

	#[test]
	fn read_str_test() {
		let data = b"fps\0rest";
		let mut reader = MapReader::new(data);
		assert_eq!(reader.read_str(3, true).unwrap(), "fps");
		// The terminator was consumed along with the characters.
		assert_eq!(reader.offset(), 4);
		assert_eq!(reader.read_str(4, false).unwrap(), "rest");
	}

	#[test]
	fn read_str_bad_utf8_test() {
		let data = [0xFF, 0xFE, 0x00];
		let mut reader = MapReader::new(&data);
		assert!(matches!(
			reader.read_str(2, true),
			Err(MpzError::FromUtf8Error(_))
		));
	}
}
