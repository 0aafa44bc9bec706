use byteorder::{ByteOrder, LittleEndian};

use super::{
	CubeNode,
	LeafShape,
	World,
};

/// Largest half-extent a single leaf may cover before it gets subdivided.
const MAX_LEAF_EXTENT: i32 = 0x1000;

/// Repairs a freshly decoded world in place so the rest of the engine can
/// trust its shape:
///
/// * internal nodes at unit extent lose their children and become solid,
/// * leaves wider than [MAX_LEAF_EXTENT] are split into eight copies,
/// * freeform leaves whose edges describe no volume collapse to empty.
///
/// Empty, solid and LOD leaves always survive unchanged.
pub fn validate(world: &mut World) {
	validate_children(&mut world.roots, world.size >> 1);
}

fn validate_children(children: &mut [CubeNode; 8], size: i32) {
	for child in children.iter_mut() {
		validate_cube(child, size);
	}
}

fn validate_cube(node: &mut CubeNode, size: i32) {
	match node {
		CubeNode::Children(_) if size <= 1 => {
			*node = CubeNode::solid();
		}
		CubeNode::Children(children) => {
			validate_children(children, size >> 1);
		}
		CubeNode::Leaf(leaf) if size > MAX_LEAF_EXTENT => {
			let mut children = leaf.split();
			validate_children(&mut children, size >> 1);
			*node = CubeNode::Children(children);
		}
		CubeNode::Leaf(leaf) => {
			if let LeafShape::Normal(edges) = &leaf.shape {
				if degenerate(edges) {
					leaf.shape = LeafShape::Empty;
				}
			}
		}
	}
}

/// A freeform leaf is degenerate when any face has an edge pair that never
/// separates, or an endpoint outside the 0..=8 grid. The bit tricks work on
/// a whole face word at once, four edge bytes per axis.
fn degenerate(edges: &[u8; 12]) -> bool {
	face_words(edges).iter().any(|&face| {
		let e0 = face & 0x0F0F_0F0F;
		let e1 = (face >> 4) & 0x0F0F_0F0F;
		e0 == e1
			|| (e1.wrapping_add(0x0707_0707) | e1.wrapping_sub(e0)) & 0xF0F0_F0F0 != 0
	})
}

fn face_words(edges: &[u8; 12]) -> [u32; 3] {
	[
		LittleEndian::read_u32(&edges[0..4]),
		LittleEndian::read_u32(&edges[4..8]),
		LittleEndian::read_u32(&edges[8..12]),
	]
}
