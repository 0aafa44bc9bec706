use serde::{Deserialize, Serialize};

use crate::{
	MpzResult,
	ioext::{Readable, Writable},
};

use super::{
	MapReader,
	MapWriter,
};

/// Soft advisory bound on entity attribute counts. The wire format itself
/// enforces nothing; exceeding it is logged and kept.
pub const MAX_ENT_ATTRS: usize = 100;

/// Entity type tags. Unknown tags are preserved numerically through
/// [EntityKind::Other] so maps carrying content this library does not
/// recognize still round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
	Empty,
	Light,
	MapModel,
	PlayerStart,
	EnvMap,
	Particles,
	Sound,
	LightFx,
	Sunlight,
	Weapon,
	Teleport,
	Actor,
	Trigger,
	Pusher,
	Affinity,
	Checkpoint,
	Route,
	Unused,
	Other(u8),
}

impl EntityKind {
	pub fn from_tag(tag: u8) -> Self {
		match tag {
			0 => EntityKind::Empty,
			1 => EntityKind::Light,
			2 => EntityKind::MapModel,
			3 => EntityKind::PlayerStart,
			4 => EntityKind::EnvMap,
			5 => EntityKind::Particles,
			6 => EntityKind::Sound,
			7 => EntityKind::LightFx,
			8 => EntityKind::Sunlight,
			9 => EntityKind::Weapon,
			10 => EntityKind::Teleport,
			11 => EntityKind::Actor,
			12 => EntityKind::Trigger,
			13 => EntityKind::Pusher,
			14 => EntityKind::Affinity,
			15 => EntityKind::Checkpoint,
			16 => EntityKind::Route,
			17 => EntityKind::Unused,
			other => EntityKind::Other(other),
		}
	}

	pub fn tag(self) -> u8 {
		match self {
			EntityKind::Empty => 0,
			EntityKind::Light => 1,
			EntityKind::MapModel => 2,
			EntityKind::PlayerStart => 3,
			EntityKind::EnvMap => 4,
			EntityKind::Particles => 5,
			EntityKind::Sound => 6,
			EntityKind::LightFx => 7,
			EntityKind::Sunlight => 8,
			EntityKind::Weapon => 9,
			EntityKind::Teleport => 10,
			EntityKind::Actor => 11,
			EntityKind::Trigger => 12,
			EntityKind::Pusher => 13,
			EntityKind::Affinity => 14,
			EntityKind::Checkpoint => 15,
			EntityKind::Route => 16,
			EntityKind::Unused => 17,
			EntityKind::Other(tag) => tag,
		}
	}
}

/// A map entity: a fixed 16-byte base record (position, type tag and 3
/// reserved bytes) followed by int32-counted attribute and link arrays.
/// The reserved bytes are nominally unused but have been observed carrying
/// data, so they are always preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	pub x: f32,
	pub y: f32,
	pub z: f32,
	pub kind: EntityKind,
	pub reserved: [u8; 3],
	pub attrs: Vec<i32>,
	pub links: Vec<i32>,
}

impl Entity {
	pub fn new(x: f32, y: f32, z: f32, kind: EntityKind) -> Self {
		Self {
			x,
			y,
			z,
			kind,
			reserved: [0; 3],
			attrs: Vec::new(),
			links: Vec::new(),
		}
	}
}

impl Readable for Entity {
	fn read_from(reader: &mut MapReader<'_>) -> MpzResult<Self> {
		let x = reader.read_float()?;
		let y = reader.read_float()?;
		let z = reader.read_float()?;
		let kind = EntityKind::from_tag(reader.read_uchar()?);
		let reserved = [
			reader.read_uchar()?,
			reader.read_uchar()?,
			reader.read_uchar()?,
		];
		let numattrs = reader.read_int()?;
		let mut attrs = Vec::new();
		for _ in 0..numattrs.max(0) {
			attrs.push(reader.read_int()?);
		}
		if attrs.len() > MAX_ENT_ATTRS {
			log::warn!(
				"entity at ({x}, {y}, {z}) carries {} attributes, advisory limit is {MAX_ENT_ATTRS}",
				attrs.len()
			);
		}
		let numlinks = reader.read_int()?;
		let mut links = Vec::new();
		for _ in 0..numlinks.max(0) {
			links.push(reader.read_int()?);
		}
		Ok(Self {
			x,
			y,
			z,
			kind,
			reserved,
			attrs,
			links,
		})
	}
}

impl Writable for Entity {
	fn write_to(&self, writer: &mut MapWriter) -> MpzResult<usize> {
		let start = writer.len();
		writer.write_float(self.x);
		writer.write_float(self.y);
		writer.write_float(self.z);
		writer.write_uchar(self.kind.tag());
		writer.write_bytes(&self.reserved);
		// Array counts always come from the live vectors.
		writer.write_int(self.attrs.len() as i32);
		for &attr in &self.attrs {
			writer.write_int(attr);
		}
		writer.write_int(self.links.len() as i32);
		for &link in &self.links {
			writer.write_int(link);
		}
		Ok(writer.len() - start)
	}
}
