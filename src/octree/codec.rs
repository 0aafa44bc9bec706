use crate::{
	MpzResult, MpzError,
	ioext::{Readable, Writable},
	map::{
		MapReader,
		MapWriter,
	},
};

use super::{
	CubeNode,
	LeafCube,
	LeafShape,
	SurfaceExtension,
	SurfaceInfo,
};

/// Deepest the cube tree may nest. No power-of-two world extent that fits in
/// an int32 can go deeper, so anything beyond this is corrupt input trying to
/// recurse forever.
pub const MAX_OCTREE_DEPTH: u32 = 32;

const OCTSAV_CHILDREN: u8 = 0;
const OCTSAV_EMPTY: u8 = 1;
const OCTSAV_SOLID: u8 = 2;
const OCTSAV_NORMAL: u8 = 3;
const OCTSAV_LODCUBE: u8 = 4;

impl Readable for SurfaceInfo {
	fn read_from(reader: &mut MapReader<'_>) -> MpzResult<Self> {
		Ok(Self {
			lmid: [reader.read_uchar()?, reader.read_uchar()?],
			verts: reader.read_uchar()?,
			numverts: reader.read_uchar()?,
		})
	}
}

impl Writable for SurfaceInfo {
	fn write_to(&self, writer: &mut MapWriter) -> MpzResult<usize> {
		writer.write_uchar(self.lmid[0]);
		writer.write_uchar(self.lmid[1]);
		writer.write_uchar(self.verts);
		writer.write_uchar(self.numverts);
		Ok(4)
	}
}

/// Decodes 8 sibling cubes, depth-first, child index 0 through 7. This
/// ordering is the wire contract shared with every other tool that touches
/// the format.
pub fn load_children(reader: &mut MapReader<'_>) -> MpzResult<Box<[CubeNode; 8]>> {
	load_children_at(reader, 0)
}

fn load_children_at(reader: &mut MapReader<'_>, depth: u32) -> MpzResult<Box<[CubeNode; 8]>> {
	if depth >= MAX_OCTREE_DEPTH {
		return Err(MpzError::OctreeTooDeep);
	}
	let mut children = CubeNode::empty_children();
	for child in children.iter_mut() {
		*child = load_cube(reader, depth)?;
	}
	Ok(children)
}

fn load_cube(reader: &mut MapReader<'_>, depth: u32) -> MpzResult<CubeNode> {
	let octsav = reader.read_uchar()?;
	let shape = match octsav & 0x7 {
		OCTSAV_CHILDREN => {
			return Ok(CubeNode::Children(load_children_at(reader, depth + 1)?));
		}
		OCTSAV_EMPTY => LeafShape::Empty,
		OCTSAV_SOLID => LeafShape::Solid,
		OCTSAV_NORMAL => {
			let mut edges = [0u8; 12];
			edges.copy_from_slice(reader.read_bytes(12)?);
			LeafShape::Normal(edges)
		}
		OCTSAV_LODCUBE => LeafShape::Lod,
		_ => return Err(MpzError::UnknownOctsav(octsav)),
	};
	let mut textures = [0u16; 6];
	for texture in textures.iter_mut() {
		*texture = reader.read_ushort()?;
	}
	let material = if octsav & 0x40 != 0 {
		Some(reader.read_ushort()?)
	} else {
		None
	};
	let merged = if octsav & 0x80 != 0 {
		Some(reader.read_uchar()?)
	} else {
		None
	};
	let surfaces = if octsav & 0x20 != 0 {
		Some(load_surfaces(reader)?)
	} else {
		None
	};
	Ok(CubeNode::Leaf(LeafCube {
		shape,
		textures,
		material,
		merged,
		surfaces,
	}))
}

fn load_surfaces(reader: &mut MapReader<'_>) -> MpzResult<SurfaceExtension> {
	let surfmask = reader.read_uchar()?;
	let total_verts = reader.read_uchar()?;
	let mut faces: [Option<SurfaceInfo>; 6] = [None; 6];
	for (index, face) in faces.iter_mut().enumerate() {
		if surfmask & (1 << index) == 0 {
			continue;
		}
		let mut surf = SurfaceInfo::read_from(reader)?;
		if surf.total_verts() != 0 {
			// Skipping the vertex payload would desynchronize every
			// following sibling, so refuse the whole map.
			return Err(MpzError::UnsupportedVertexData(surf.numverts));
		}
		surf.verts = 0;
		*face = Some(surf);
	}
	Ok(SurfaceExtension { total_verts, faces })
}

/// Encodes 8 sibling cubes, the mirror image of [load_children].
pub fn save_children(writer: &mut MapWriter, children: &[CubeNode; 8]) -> MpzResult<usize> {
	let start = writer.len();
	for child in children.iter() {
		save_cube(writer, child)?;
	}
	Ok(writer.len() - start)
}

fn save_cube(writer: &mut MapWriter, node: &CubeNode) -> MpzResult<()> {
	let leaf = match node {
		CubeNode::Children(children) => {
			writer.write_uchar(OCTSAV_CHILDREN);
			save_children(writer, children)?;
			return Ok(());
		}
		CubeNode::Leaf(leaf) => leaf,
	};
	writer.write_uchar(octsav_tag(leaf));
	if let LeafShape::Normal(edges) = &leaf.shape {
		writer.write_bytes(edges);
	}
	for &texture in leaf.textures.iter() {
		writer.write_ushort(texture);
	}
	if let Some(material) = leaf.material {
		writer.write_ushort(material);
	}
	if let Some(merged) = leaf.merged {
		writer.write_uchar(merged);
	}
	if let Some(surfaces) = &leaf.surfaces {
		save_surfaces(writer, surfaces)?;
	}
	Ok(())
}

/// The wire tag of a leaf is derived from its structure, never replayed from
/// the decode.
fn octsav_tag(leaf: &LeafCube) -> u8 {
	let mut tag = match leaf.shape {
		LeafShape::Empty => OCTSAV_EMPTY,
		LeafShape::Solid => OCTSAV_SOLID,
		LeafShape::Normal(_) => OCTSAV_NORMAL,
		LeafShape::Lod => OCTSAV_LODCUBE,
	};
	if leaf.surfaces.is_some() {
		tag |= 0x20;
	}
	if leaf.material.is_some() {
		tag |= 0x40;
	}
	if leaf.merged.is_some() {
		tag |= 0x80;
	}
	tag
}

fn save_surfaces(writer: &mut MapWriter, surfaces: &SurfaceExtension) -> MpzResult<()> {
	let mut surfmask = 0u8;
	for (index, face) in surfaces.faces.iter().enumerate() {
		if face.is_some() {
			surfmask |= 1 << index;
		}
	}
	writer.write_uchar(surfmask);
	writer.write_uchar(surfaces.total_verts);
	for surf in surfaces.faces.iter().flatten() {
		if surf.verts != 0 || surf.total_verts() != 0 {
			return Err(MpzError::UnsupportedVertexData(surf.numverts));
		}
		surf.write_to(writer)?;
	}
	Ok(())
}
