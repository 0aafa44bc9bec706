use crate::{
	MpzResult,
	map::{
		MapReader,
		MapWriter,
	},
};

/// A record that can be decoded from a map cursor without outside context.
/// Context-dependent codecs (the vslot chain, the cube tree) live as free
/// functions in their own modules instead.
pub trait Readable: Sized {
	fn read_from(reader: &mut MapReader<'_>) -> MpzResult<Self>;
}

/// A record that can be encoded onto a map cursor.
/// `write_to` reports how many bytes it appended.
pub trait Writable {
	fn write_to(&self, writer: &mut MapWriter) -> MpzResult<usize>;
}
