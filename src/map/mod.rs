use std::{
	fs::File,
	io::{Read, Write},
	path::Path,
};

use flate2::{
	Compression,
	read::GzDecoder,
	write::GzEncoder,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
	MpzResult, MpzError,
	ioext::{Readable, Writable},
	octree::{
		codec::{load_children, save_children},
		validate::validate,
		World,
	},
};

pub mod entity;
mod json;
pub mod reader;
pub mod variable;
pub mod vslot;
pub mod writer;

pub use entity::{Entity, EntityKind, MAX_ENT_ATTRS};
pub use reader::MapReader;
pub use variable::{MapVariable, read_variables, write_variables};
pub use vslot::{SlotShaderParam, VSlot, VSlotChanged, load_vslots, save_vslots};
pub use writer::MapWriter;

/// Format version this library writes.
pub const MAP_VERSION: i32 = 43;
/// Byte length of everything from the magic through the variable count.
pub const MAP_HEADER_SIZE: i32 = 52;
/// Game protocol version stamped into new maps.
pub const GAME_VERSION: i32 = 229;
/// Game identifier stamped into new maps.
pub const GAME_IDENT: &str = "fps";
/// Longest accepted length for counted strings such as shader parameter
/// names. Anything at or past this is treated as stream corruption.
pub const MAX_STR_LEN: usize = 512;

/// The two magic tags a map file may open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapMagic {
	#[serde(rename = "MAPZ")]
	Mapz,
	#[serde(rename = "BFGZ")]
	Bfgz,
}

impl MapMagic {
	pub fn as_bytes(self) -> &'static [u8; 4] {
		match self {
			MapMagic::Mapz => b"MAPZ",
			MapMagic::Bfgz => b"BFGZ",
		}
	}

	pub fn from_bytes(bytes: [u8; 4]) -> MpzResult<Self> {
		match &bytes {
			b"MAPZ" => Ok(MapMagic::Mapz),
			b"BFGZ" => Ok(MapMagic::Bfgz),
			_ => Err(MpzError::BadMagic(bytes)),
		}
	}
}

/// The fixed header meta block: 8 int32 fields, the game identifier and the
/// variable count, in wire order.
///
/// The counts here describe what the file claims to contain. On encode the
/// worldsize, entity, vslot and variable counts are re-derived from the live
/// sequences; `numpvs`, `lightmaps` and `blendmap` describe sections this
/// library never parses and are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMeta {
	pub worldsize: i32,
	pub numents: i32,
	pub numpvs: i32,
	pub lightmaps: i32,
	pub blendmap: i32,
	pub numvslots: i32,
	pub gamever: i32,
	pub revision: i32,
	pub gameident: String,
	pub numvars: i32,
}

impl Readable for MapMeta {
	fn read_from(reader: &mut MapReader<'_>) -> MpzResult<Self> {
		Ok(Self {
			worldsize: reader.read_int()?,
			numents: reader.read_int()?,
			numpvs: reader.read_int()?,
			lightmaps: reader.read_int()?,
			blendmap: reader.read_int()?,
			numvslots: reader.read_int()?,
			gamever: reader.read_int()?,
			revision: reader.read_int()?,
			// 3 characters plus a terminator on the wire.
			gameident: reader.read_str(3, true)?,
			numvars: reader.read_int()?,
		})
	}
}

impl Writable for MapMeta {
	fn write_to(&self, writer: &mut MapWriter) -> MpzResult<usize> {
		MpzError::range_check(self.gameident.len(), 3..=3)?;
		let start = writer.len();
		writer.write_int(self.worldsize);
		writer.write_int(self.numents);
		writer.write_int(self.numpvs);
		writer.write_int(self.lightmaps);
		writer.write_int(self.blendmap);
		writer.write_int(self.numvslots);
		writer.write_int(self.gamever);
		writer.write_int(self.revision);
		writer.write_str(&self.gameident, true);
		writer.write_int(self.numvars);
		Ok(writer.len() - start)
	}
}

/// A whole map: header, variables, texture MRU, entities, the vslot chain
/// and the cube tree, exactly the sections of the on-disk container.
///
/// [Map::open] and [Map::save] handle the gzip wrapping; [Map::decode] and
/// [Map::encode] work on the decompressed body. The world field is skipped
/// when deserializing from JSON, see [Map::from_json].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
	pub magic: MapMagic,
	pub version: i32,
	pub headersize: i32,
	pub meta: MapMeta,
	pub variables: IndexMap<String, MapVariable>,
	pub texmru: Vec<u16>,
	pub entities: Vec<Entity>,
	pub vslots: Vec<VSlot>,
	pub vslot_codes: Vec<i32>,
	#[serde(skip_deserializing)]
	pub world: World,
}

impl Map {
	/// A fresh, empty map of the given power-of-two world size, stamped with
	/// the current format and game versions.
	pub fn new(worldsize: i32) -> MpzResult<Self> {
		if worldsize < 2 || (worldsize & (worldsize - 1)) != 0 {
			return Err(MpzError::OutOfRange);
		}
		Ok(Self {
			magic: MapMagic::Mapz,
			version: MAP_VERSION,
			headersize: MAP_HEADER_SIZE,
			meta: MapMeta {
				worldsize,
				numents: 0,
				numpvs: 0,
				lightmaps: 0,
				blendmap: 0,
				numvslots: 0,
				gamever: GAME_VERSION,
				revision: 1,
				gameident: GAME_IDENT.to_owned(),
				numvars: 0,
			},
			variables: IndexMap::new(),
			texmru: Vec::new(),
			entities: Vec::new(),
			vslots: Vec::new(),
			vslot_codes: Vec::new(),
			world: World::empty(worldsize),
		})
	}

	/// Decodes a decompressed map body. The world is validated before it is
	/// returned, so the tree already honors the engine's shape invariants.
	pub fn decode(data: &[u8]) -> MpzResult<Self> {
		let mut reader = MapReader::new(data);
		let mut magic = [0u8; 4];
		magic.copy_from_slice(reader.read_bytes(4)?);
		let magic = MapMagic::from_bytes(magic)?;
		let version = reader.read_int()?;
		let headersize = reader.read_int()?;
		let meta = MapMeta::read_from(&mut reader)?;
		log::debug!(
			"{magic:?} v{version}: worldsize {}, {} entities, {} vslots",
			meta.worldsize,
			meta.numents,
			meta.numvslots,
		);
		let variables = read_variables(&mut reader, meta.numvars)?;
		let texmru_len = reader.read_ushort()?;
		let mut texmru = Vec::with_capacity(texmru_len as usize);
		for _ in 0..texmru_len {
			texmru.push(reader.read_ushort()?);
		}
		MpzError::range_check(meta.numents, 0..)?;
		let mut entities = Vec::new();
		for _ in 0..meta.numents {
			entities.push(Entity::read_from(&mut reader)?);
		}
		let (vslots, vslot_codes) = load_vslots(&mut reader, meta.numvslots)?;
		let roots = load_children(&mut reader)?;
		let mut world = World {
			size: meta.worldsize,
			roots,
		};
		validate(&mut world);
		if reader.remaining() > 0 {
			log::debug!("ignoring {} trailing bytes after the world block", reader.remaining());
		}
		Ok(Self {
			magic,
			version,
			headersize,
			meta,
			variables,
			texmru,
			entities,
			vslots,
			vslot_codes,
			world,
		})
	}

	/// Encodes the decompressed map body. Counts in the written meta block
	/// come from the live sequences, never from stale header fields.
	pub fn encode(&self) -> MpzResult<Vec<u8>> {
		let meta = MapMeta {
			worldsize: self.world.size,
			numents: self.entities.len() as i32,
			numvslots: self.vslots.len() as i32,
			numvars: self.variables.len() as i32,
			..self.meta.clone()
		};
		let mut writer = MapWriter::new();
		writer.write_bytes(self.magic.as_bytes());
		writer.write_int(self.version);
		writer.write_int(self.headersize);
		meta.write_to(&mut writer)?;
		write_variables(&mut writer, &self.variables)?;
		MpzError::range_check(self.texmru.len(), 0..=u16::MAX as usize)?;
		writer.write_ushort(self.texmru.len() as u16);
		for &texture in self.texmru.iter() {
			writer.write_ushort(texture);
		}
		for entity in self.entities.iter() {
			entity.write_to(&mut writer)?;
		}
		save_vslots(&mut writer, &self.vslots, &self.vslot_codes)?;
		save_children(&mut writer, &self.world.roots)?;
		Ok(writer.finish())
	}

	/// Reads and decodes a gzip-compressed map file.
	pub fn open<P: AsRef<Path>>(path: P) -> MpzResult<Self> {
		let file = File::open(path)?;
		let mut decoder = GzDecoder::new(file);
		let mut data = Vec::new();
		decoder.read_to_end(&mut data)?;
		Self::decode(&data)
	}

	/// Encodes and writes a gzip-compressed map file. The bytes go to a
	/// scratch file next to the destination first and only replace it once
	/// the whole write has succeeded, so a failure partway through never
	/// leaves a truncated map behind.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> MpzResult<()> {
		let data = self.encode()?;
		let path = path.as_ref();
		let dir = match path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};
		let scratch = tempfile::NamedTempFile::new_in(dir)?;
		let mut encoder = GzEncoder::new(scratch, Compression::default());
		encoder.write_all(&data)?;
		let scratch = encoder.finish()?;
		scratch.persist(path).map_err(|err| err.error)?;
		Ok(())
	}
}
