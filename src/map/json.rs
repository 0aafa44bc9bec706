use crate::{
	MpzResult,
	octree::World,
};

use super::Map;

/// Best-effort JSON interchange for debugging and tooling. Everything except
/// the world survives a round trip; the world is serialized for inspection
/// but deliberately not read back, since JSON is not a fidelity format for
/// the cube tree.
impl Map {
	pub fn to_json(&self) -> MpzResult<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn to_json_pretty(&self) -> MpzResult<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Parses a map from its JSON form. The world comes back empty at the
	/// size the meta block claims, ready to be repopulated by generation
	/// code.
	pub fn from_json(text: &str) -> MpzResult<Self> {
		let mut map: Map = serde_json::from_str(text)?;
		map.world = World::empty(map.meta.worldsize);
		Ok(map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::map::{Entity, EntityKind, MapVariable, VSlot};
	use crate::octree::CubeNode;

	fn sample_map() -> Map {
		let mut map = Map::new(16).unwrap();
		map.variables.insert("maptitle".to_owned(), MapVariable::Str("json test".to_owned()));
		map.variables.insert("skybox".to_owned(), MapVariable::Int(3));
		map.texmru = vec![1, 8];
		map.entities.push(Entity::new(4.0, 4.0, 12.0, EntityKind::Light));
		map.vslots = vec![VSlot::default(); 2];
		map.vslot_codes = vec![-2];
		map.meta.numents = 1;
		map.meta.numvslots = 2;
		map.meta.numvars = 2;
		map
	}

	#[test]
	fn json_round_trip_test() {
		let map = sample_map();
		let text = map.to_json().unwrap();
		let parsed = Map::from_json(&text).unwrap();
		assert_eq!(parsed.magic, map.magic);
		assert_eq!(parsed.meta, map.meta);
		assert_eq!(parsed.variables, map.variables);
		assert_eq!(parsed.texmru, map.texmru);
		assert_eq!(parsed.entities, map.entities);
		assert_eq!(parsed.vslots, map.vslots);
		assert_eq!(parsed.vslot_codes, map.vslot_codes);
	}

	#[test]
	fn json_world_is_lossy_test() {
		let mut map = sample_map();
		for root in map.world.roots.iter_mut() {
			*root = CubeNode::solid();
		}
		let text = map.to_json().unwrap();
		// The world is present in the output for inspection.
		assert!(text.contains("\"world\""));
		assert!(text.contains("\"magic\":\"MAPZ\""));
		// Parsing drops the geometry but keeps the declared size.
		let parsed = Map::from_json(&text).unwrap();
		assert_eq!(parsed.world, World::empty(16));
	}

	#[test]
	fn json_pretty_parses_back_test() {
		let map = sample_map();
		let text = map.to_json_pretty().unwrap();
		let parsed = Map::from_json(&text).unwrap();
		assert_eq!(parsed.entities, map.entities);
	}
}
