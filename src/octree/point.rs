use crate::{MpzResult, MpzError};

use super::{
	CubeNode,
	LeafCube,
	LeafShape,
	World,
};

/// Which of the 8 children covers a point, given the child extent. Bit 0 is
/// x, bit 1 is y, bit 2 is z.
fn octant_index(x: i32, y: i32, z: i32, extent: i32) -> usize {
	let mut index = 0;
	if x & extent != 0 {
		index |= 1;
	}
	if y & extent != 0 {
		index |= 2;
	}
	if z & extent != 0 {
		index |= 4;
	}
	index
}

/// Walks down to the unit cell covering a point, splitting any larger leaf
/// along the way into 8 copies of itself. Callers check for no-op cases
/// before calling so the tree is never subdivided for nothing.
fn descend_mut(node: &mut CubeNode, x: i32, y: i32, z: i32, extent: i32) -> &mut CubeNode {
	if extent <= 1 {
		return node;
	}
	if let CubeNode::Leaf(leaf) = node {
		let children = leaf.split();
		*node = CubeNode::Children(children);
	}
	let half = extent >> 1;
	match node {
		CubeNode::Children(children) => {
			descend_mut(&mut children[octant_index(x, y, z, half)], x, y, z, half)
		}
		leaf => leaf,
	}
}

impl World {
	fn contains(&self, x: i32, y: i32, z: i32) -> bool {
		(0..self.size).contains(&x)
			&& (0..self.size).contains(&y)
			&& (0..self.size).contains(&z)
	}

	/// The leaf covering a point, however large that leaf happens to be.
	/// Returns [None] when the point lies outside the world, or when an
	/// unvalidated tree still has children at unit extent there.
	pub fn point_leaf(&self, x: i32, y: i32, z: i32) -> Option<&LeafCube> {
		if self.size < 2 || !self.contains(x, y, z) {
			return None;
		}
		let mut extent = self.size >> 1;
		let mut node = &self.roots[octant_index(x, y, z, extent)];
		while extent > 1 {
			extent >>= 1;
			match node {
				CubeNode::Children(children) => {
					node = &children[octant_index(x, y, z, extent)];
				}
				CubeNode::Leaf(_) => break,
			}
		}
		match node {
			CubeNode::Leaf(leaf) => Some(leaf),
			CubeNode::Children(_) => None,
		}
	}

	/// Whether the cell at a point holds geometry. Empty and LOD leaves and
	/// anything outside the world read as unpopulated.
	pub fn get_point(&self, x: i32, y: i32, z: i32) -> bool {
		match self.point_leaf(x, y, z) {
			Some(leaf) => matches!(leaf.shape, LeafShape::Solid | LeafShape::Normal(_)),
			None => false,
		}
	}

	/// Places a leaf at the unit cell covering a point, subdividing covering
	/// leaves as needed. Setting a cell to the value its covering leaf
	/// already holds leaves the tree untouched.
	pub fn set_point(&mut self, x: i32, y: i32, z: i32, leaf: LeafCube) -> MpzResult<()> {
		if self.size < 2 || !self.contains(x, y, z) {
			return Err(MpzError::OutOfRange);
		}
		if self.point_leaf(x, y, z) == Some(&leaf) {
			return Ok(());
		}
		let extent = self.size >> 1;
		let root = &mut self.roots[octant_index(x, y, z, extent)];
		let cell = descend_mut(root, x, y, z, extent);
		*cell = CubeNode::Leaf(leaf);
		Ok(())
	}

	/// Resets the unit cell covering a point back to empty. Clearing a cell
	/// whose covering leaf is already empty leaves the tree untouched.
	pub fn del_point(&mut self, x: i32, y: i32, z: i32) -> MpzResult<()> {
		if self.size < 2 || !self.contains(x, y, z) {
			return Err(MpzError::OutOfRange);
		}
		if matches!(self.point_leaf(x, y, z), Some(leaf) if leaf.shape == LeafShape::Empty) {
			return Ok(());
		}
		let extent = self.size >> 1;
		let root = &mut self.roots[octant_index(x, y, z, extent)];
		let cell = descend_mut(root, x, y, z, extent);
		*cell = CubeNode::Leaf(LeafCube::empty());
		Ok(())
	}
}
