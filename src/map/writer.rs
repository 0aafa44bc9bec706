use byteorder::{
	ByteOrder,
	LittleEndian,
};

/// An append-only cursor that builds the uncompressed body of a map file.
/// The mirror image of [MapReader]: same primitive widths, same
/// little-endian packing, no padding. Primitives themselves cannot fail;
/// compression happens in one pass after the body is complete.
///
/// [MapReader]: super::MapReader
pub struct MapWriter {
	data: Vec<u8>,
}

impl MapWriter {
	pub fn new() -> Self {
		Self {
			data: Vec::new(),
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			data: Vec::with_capacity(capacity),
		}
	}

	/// Bytes written so far.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.data.extend_from_slice(bytes);
	}

	pub fn write_uchar(&mut self, value: u8) {
		self.data.push(value);
	}

	pub fn write_ushort(&mut self, value: u16) {
		let mut buffer = [0u8; 2];
		LittleEndian::write_u16(&mut buffer, value);
		self.data.extend_from_slice(&buffer);
	}

	pub fn write_int(&mut self, value: i32) {
		let mut buffer = [0u8; 4];
		LittleEndian::write_i32(&mut buffer, value);
		self.data.extend_from_slice(&buffer);
	}

	pub fn write_float(&mut self, value: f32) {
		let mut buffer = [0u8; 4];
		LittleEndian::write_f32(&mut buffer, value);
		self.data.extend_from_slice(&buffer);
	}

	/// Writes the string bytes, plus a trailing NUL when `null_terminated`.
	pub fn write_str(&mut self, value: &str, null_terminated: bool) {
		self.data.extend_from_slice(value.as_bytes());
		if null_terminated {
			self.data.push(0);
		}
	}

	/// Finish writing and return the built buffer.
	pub fn finish(self) -> Vec<u8> {
		self.data
	}
}

impl Default for MapWriter {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::map::MapReader;

	#[test]
	fn round_trip_test() {
		let mut writer = MapWriter::new();
		writer.write_int(-123456);
		writer.write_ushort(40000);
		writer.write_float(0.25);
		writer.write_uchar(7);
		writer.write_str("sky", true);
		writer.write_str("raw", false);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		assert_eq!(reader.read_int().unwrap(), -123456);
		assert_eq!(reader.read_ushort().unwrap(), 40000);
		assert_eq!(reader.read_float().unwrap(), 0.25);
		assert_eq!(reader.read_uchar().unwrap(), 7);
		assert_eq!(reader.read_str(3, true).unwrap(), "sky");
		assert_eq!(reader.read_str(3, false).unwrap(), "raw");
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn little_endian_test() {
		let mut writer = MapWriter::new();
		writer.write_int(0x0102_0304);
		let data = writer.finish();
		assert_eq!(data, [0x04, 0x03, 0x02, 0x01]);
	}
}
