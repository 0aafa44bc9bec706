use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
	MpzResult, MpzError,
	ioext::{Readable, Writable},
};

use super::{
	MapReader,
	MapWriter,
};

/// A typed map variable. The wire encoding is an int32 type tag (0, 1 or 2)
/// followed by the payload; a string payload carries its own int32 length and
/// a trailing NUL. Any other tag is unrecoverable corruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapVariable {
	Int(i32),
	Float(f32),
	Str(String),
}

impl MapVariable {
	/// The wire tag this variable is stored with.
	pub fn type_tag(&self) -> i32 {
		match self {
			MapVariable::Int(_) => 0,
			MapVariable::Float(_) => 1,
			MapVariable::Str(_) => 2,
		}
	}
}

impl Readable for MapVariable {
	fn read_from(reader: &mut MapReader<'_>) -> MpzResult<Self> {
		let tag = reader.read_int()?;
		Ok(match tag {
			0 => MapVariable::Int(reader.read_int()?),
			1 => MapVariable::Float(reader.read_float()?),
			2 => {
				let len = reader.read_int()?.max(0) as usize;
				MapVariable::Str(reader.read_str(len, true)?)
			}
			other => return Err(MpzError::UnknownVariableType(other)),
		})
	}
}

impl Writable for MapVariable {
	fn write_to(&self, writer: &mut MapWriter) -> MpzResult<usize> {
		let start = writer.len();
		writer.write_int(self.type_tag());
		match self {
			MapVariable::Int(value) => writer.write_int(*value),
			MapVariable::Float(value) => writer.write_float(*value),
			MapVariable::Str(value) => {
				writer.write_int(value.len() as i32);
				writer.write_str(value, true);
			}
		}
		Ok(writer.len() - start)
	}
}

/// Reads the map-variables block: `numvars` repetitions of a length-prefixed,
/// null-terminated name followed by a typed payload. Wire order is preserved
/// in the returned map.
pub fn read_variables(
	reader: &mut MapReader<'_>,
	numvars: i32,
) -> MpzResult<IndexMap<String, MapVariable>> {
	let mut variables = IndexMap::new();
	for _ in 0..numvars.max(0) {
		let name_len = reader.read_int()?.max(0) as usize;
		let name = reader.read_str(name_len, true)?;
		let value = MapVariable::read_from(reader)?;
		variables.insert(name, value);
	}
	Ok(variables)
}

/// Mirror of [read_variables]. Name lengths are re-derived from the strings.
pub fn write_variables(
	writer: &mut MapWriter,
	variables: &IndexMap<String, MapVariable>,
) -> MpzResult<usize> {
	let start = writer.len();
	for (name, value) in variables {
		writer.write_int(name.len() as i32);
		writer.write_str(name, true);
		value.write_to(writer)?;
	}
	Ok(writer.len() - start)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn variables_round_trip_test() {
		let mut variables = IndexMap::new();
		variables.insert("maptitle".to_owned(), MapVariable::Str("untitled".to_owned()));
		variables.insert("gravity".to_owned(), MapVariable::Int(50));
		variables.insert("ambient".to_owned(), MapVariable::Float(0.1));

		let mut writer = MapWriter::new();
		write_variables(&mut writer, &variables).unwrap();
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let decoded = read_variables(&mut reader, 3).unwrap();
		assert_eq!(decoded, variables);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn unknown_type_test() {
		let mut writer = MapWriter::new();
		writer.write_int(4);          // name length
		writer.write_str("skyr", true);
		writer.write_int(9);          // no such type tag
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		assert!(matches!(
			read_variables(&mut reader, 1),
			Err(MpzError::UnknownVariableType(9))
		));
	}

	#[test]
	fn wire_layout_test() {
		// One string variable: name "a", value "bc".
		let mut variables = IndexMap::new();
		variables.insert("a".to_owned(), MapVariable::Str("bc".to_owned()));
		let mut writer = MapWriter::new();
		write_variables(&mut writer, &variables).unwrap();
		let data = writer.finish();
		assert_eq!(
			data,
			[
				1, 0, 0, 0,        // name length
				b'a', 0,           // name + NUL
				2, 0, 0, 0,        // type tag: string
				2, 0, 0, 0,        // payload length
				b'b', b'c', 0,     // payload + NUL
			]
		);
	}
}
