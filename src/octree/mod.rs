pub mod codec;
pub mod point;
pub mod validate;

use serde::{Deserialize, Serialize};

/// Face sentinel for a fully empty cube.
pub const F_EMPTY: u32 = 0;
/// Face sentinel for a fully solid cube.
pub const F_SOLID: u32 = 0x8080_8080;
/// Default per-face texture index for fresh geometry.
pub const DEFAULT_GEOM: u16 = 1;
/// Mask selecting the vertex count inside `SurfaceInfo::numverts`.
pub const MAX_FACE_VERTS: u8 = 15;
/// `numverts` flag marking a duplicated blend layer, which doubles the
/// effective vertex count.
pub const LAYER_DUP: u8 = 0x80;

/// Geometry of a leaf cube. `Normal` carries the 12 packed edge bytes, two
/// 4-bit offsets each; `Empty` and `Solid` stand for the all-0x00 and
/// all-0x80 edge patterns without storing them. `Lod` flags a leaf whose
/// children are supplied out of band and never re-decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafShape {
	Empty,
	Solid,
	Normal([u8; 12]),
	Lod,
}

/// Per-face lightmap and vertex-layout metadata. Only vertex-free surfaces
/// are supported; anything with a nonzero vertex count is rejected by the
/// codec in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceInfo {
	pub lmid: [u8; 2],
	pub verts: u8,
	pub numverts: u8,
}

impl SurfaceInfo {
	/// The effective vertex count, doubled for a duplicated blend layer.
	pub fn total_verts(&self) -> u8 {
		if self.numverts & LAYER_DUP != 0 {
			(self.numverts & MAX_FACE_VERTS) * 2
		} else {
			self.numverts & MAX_FACE_VERTS
		}
	}
}

/// The surface-extension block of a leaf: an overall vertex count plus up to
/// 6 per-face entries. The wire presence mask is derived from which entries
/// are `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfaceExtension {
	pub total_verts: u8,
	pub faces: [Option<SurfaceInfo>; 6],
}

/// A leaf of the cube tree: its geometry shape, per-face texture indices,
/// and the three optional blocks flagged in its wire tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafCube {
	pub shape: LeafShape,
	pub textures: [u16; 6],
	pub material: Option<u16>,
	pub merged: Option<u8>,
	pub surfaces: Option<SurfaceExtension>,
}

impl LeafCube {
	fn with_shape(shape: LeafShape) -> Self {
		Self {
			shape,
			textures: [DEFAULT_GEOM; 6],
			material: None,
			merged: None,
			surfaces: None,
		}
	}

	/// An empty leaf with default textures.
	pub fn empty() -> Self {
		Self::with_shape(LeafShape::Empty)
	}

	/// A solid leaf with default textures.
	pub fn solid() -> Self {
		Self::with_shape(LeafShape::Solid)
	}

	/// A solid leaf with every face set to `texture`.
	pub fn textured(texture: u16) -> Self {
		Self {
			textures: [texture; 6],
			..Self::solid()
		}
	}

	/// A normal-shape leaf over the given edge bytes.
	pub fn normal(edges: [u8; 12]) -> Self {
		Self::with_shape(LeafShape::Normal(edges))
	}

	/// Splits this leaf into 8 uniform copies of itself, one per octant.
	pub fn split(&self) -> Box<[CubeNode; 8]> {
		Box::new(std::array::from_fn(|_| CubeNode::Leaf(self.clone())))
	}
}

/// One node of the cube tree: either exactly 8 children, each spanning half
/// the parent's extent, or a leaf. Never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CubeNode {
	Children(Box<[CubeNode; 8]>),
	Leaf(LeafCube),
}

impl CubeNode {
	pub fn empty() -> Self {
		CubeNode::Leaf(LeafCube::empty())
	}

	pub fn solid() -> Self {
		CubeNode::Leaf(LeafCube::solid())
	}

	/// 8 fresh empty leaves.
	pub fn empty_children() -> Box<[CubeNode; 8]> {
		Box::new(std::array::from_fn(|_| CubeNode::empty()))
	}
}

/// The world volume: a power-of-two extent and its 8 root cubes, each
/// spanning half of it per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
	pub size: i32,
	pub roots: Box<[CubeNode; 8]>,
}

impl World {
	/// A world of 8 empty roots at the given extent.
	pub fn empty(size: i32) -> Self {
		Self {
			size,
			roots: CubeNode::empty_children(),
		}
	}

	/// log2 of the world extent, rounded up.
	pub fn scale(&self) -> u32 {
		let mut scale = 0;
		while (1i64 << scale) < self.size as i64 {
			scale += 1;
		}
		scale
	}
}

impl Default for World {
	fn default() -> Self {
		Self::empty(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scale_test() {
		assert_eq!(World::empty(1024).scale(), 10);
		assert_eq!(World::empty(2).scale(), 1);
		assert_eq!(World::empty(0).scale(), 0);
	}

	#[test]
	fn total_verts_test() {
		let surf = SurfaceInfo { lmid: [0, 0], verts: 0, numverts: 5 };
		assert_eq!(surf.total_verts(), 5);
		let dup = SurfaceInfo { lmid: [0, 0], verts: 0, numverts: LAYER_DUP | 5 };
		assert_eq!(dup.total_verts(), 10);
	}

	#[test]
	fn split_test() {
		let leaf = LeafCube::textured(12);
		let children = leaf.split();
		assert!(children.iter().all(|child| *child == CubeNode::Leaf(leaf.clone())));
	}
}
