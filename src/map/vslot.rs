use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
	MpzResult, MpzError,
};

use super::{
	MapReader,
	MapWriter,
	MAX_STR_LEN,
};

bitflags! {
	/// Field presence bits of a vslot change code, low to high. They gate
	/// the body fields in exactly this order on the wire.
	pub struct VSlotChanged: u32 {
		const SHPARAM  = 1 << 0;
		const SCALE    = 1 << 1;
		const ROTATION = 1 << 2;
		const OFFSET   = 1 << 3;
		const SCROLL   = 1 << 4;
		const LAYER    = 1 << 5;
		const ALPHA    = 1 << 6;
		const COLOR    = 1 << 7;
		const PALETTE  = 1 << 8;
		const COAST    = 1 << 9;
	}
}

/// A named shader parameter carried by a vslot. The palette pair is only
/// present on the wire when the parameter block's flags word says so; it
/// stays zeroed otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotShaderParam {
	pub val: [f32; 4],
	pub palette: i32,
	pub palindex: i32,
}

/// One node of the vslot delta chain. A base slot (produced by a negative
/// skip code) carries every default below; a changed slot overrides just the
/// fields its bitmask names and records a back-reference to its predecessor.
///
/// `changed` keeps the raw wire bitmask, including bits this library does not
/// interpret. `prev` holds the back-reference only when the wire value was a
/// valid index into the declared slot range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VSlot {
	pub changed: u32,
	pub prev: Option<usize>,
	pub params: IndexMap<String, SlotShaderParam>,
	pub scale: f32,
	pub rotation: i32,
	pub offset: (i32, i32),
	pub scroll: (i32, i32),
	pub layer: i32,
	pub alpha_front: f32,
	pub alpha_back: f32,
	pub color_scale: [f32; 3],
	pub palette: i32,
	pub palindex: i32,
	pub coast_scale: f32,
}

impl Default for VSlot {
	fn default() -> Self {
		Self {
			changed: 0,
			prev: None,
			params: IndexMap::new(),
			scale: 1.0,
			rotation: 0,
			offset: (0, 0),
			scroll: (0, 0),
			layer: 0,
			alpha_front: 0.5,
			alpha_back: 0.0,
			color_scale: [1.0, 1.0, 1.0],
			palette: 0,
			palindex: 0,
			coast_scale: 1.0,
		}
	}
}

/// Decodes the vslot chain, consuming exactly `numvslots` logical slots.
/// Returns the slots alongside the raw change codes in read order; the codes
/// are what [save_vslots] replays on encode.
///
/// A skip code that overshoots the declared count, or a chain that ends short
/// of it, is a fatal [MpzError::SlotCountMismatch].
pub fn load_vslots(
	reader: &mut MapReader<'_>,
	numvslots: i32,
) -> MpzResult<(Vec<VSlot>, Vec<i32>)> {
	let declared = numvslots as i64;
	let mut slots = Vec::new();
	let mut codes = Vec::new();
	let mut remaining = declared;
	while remaining > 0 {
		let changed = reader.read_int()?;
		codes.push(changed);
		if changed < 0 {
			let skip = -(changed as i64);
			if skip > remaining {
				return Err(MpzError::SlotCountMismatch {
					expected: declared,
					found: slots.len() as i64 + skip,
				});
			}
			for _ in 0..skip {
				slots.push(VSlot::default());
			}
			remaining -= skip;
		} else {
			let prev = reader.read_int()?;
			let mut slot = VSlot::default();
			slot.prev = usize::try_from(prev)
				.ok()
				.filter(|&index| index < numvslots.max(0) as usize);
			load_vslot(reader, &mut slot, changed as u32)?;
			slots.push(slot);
			remaining -= 1;
		}
	}
	if slots.len() as i64 != declared {
		return Err(MpzError::SlotCountMismatch {
			expected: declared,
			found: slots.len() as i64,
		});
	}
	Ok((slots, codes))
}

/// Decodes one slot body gated by `changed`. Bits beyond the known set read
/// no fields; the raw mask is still recorded on the slot.
fn load_vslot(reader: &mut MapReader<'_>, slot: &mut VSlot, changed: u32) -> MpzResult<()> {
	slot.changed = changed;
	let flags = VSlotChanged::from_bits_truncate(changed);
	if flags.contains(VSlotChanged::SHPARAM) {
		let param_flags = reader.read_ushort()?;
		let numparams = param_flags & 0x7FFF;
		for _ in 0..numparams {
			let name_len = reader.read_ushort()?;
			if name_len as usize >= MAX_STR_LEN {
				return Err(MpzError::ShaderNameTooLong(name_len));
			}
			let name = reader.read_str(name_len as usize, false)?;
			let val = [
				reader.read_float()?,
				reader.read_float()?,
				reader.read_float()?,
				reader.read_float()?,
			];
			let (palette, palindex) = if param_flags & 0x8000 != 0 {
				(reader.read_int()?, reader.read_int()?)
			} else {
				(0, 0)
			};
			slot.params.insert(name, SlotShaderParam { val, palette, palindex });
		}
	}
	if flags.contains(VSlotChanged::SCALE) {
		slot.scale = reader.read_float()?;
	}
	if flags.contains(VSlotChanged::ROTATION) {
		slot.rotation = reader.read_int()?;
	}
	if flags.contains(VSlotChanged::OFFSET) {
		slot.offset = (reader.read_int()?, reader.read_int()?);
	}
	if flags.contains(VSlotChanged::SCROLL) {
		slot.scroll = (reader.read_int()?, reader.read_int()?);
	}
	if flags.contains(VSlotChanged::LAYER) {
		slot.layer = reader.read_int()?;
	}
	if flags.contains(VSlotChanged::ALPHA) {
		slot.alpha_front = reader.read_float()?;
		slot.alpha_back = reader.read_float()?;
	}
	if flags.contains(VSlotChanged::COLOR) {
		slot.color_scale = [
			reader.read_float()?,
			reader.read_float()?,
			reader.read_float()?,
		];
	}
	if flags.contains(VSlotChanged::PALETTE) {
		slot.palette = reader.read_int()?;
		slot.palindex = reader.read_int()?;
	}
	if flags.contains(VSlotChanged::COAST) {
		slot.coast_scale = reader.read_float()?;
	}
	Ok(())
}

/// Replays the recorded change codes. Only skip codes can be re-emitted: a
/// non-negative code means the chain held interpreted slots, and re-encoding
/// those is deliberately unsupported rather than risking silent corruption.
/// The skip magnitudes must cover `slots` exactly.
pub fn save_vslots(writer: &mut MapWriter, slots: &[VSlot], codes: &[i32]) -> MpzResult<usize> {
	let start = writer.len();
	let mut covered: i64 = 0;
	for &code in codes {
		if code >= 0 {
			return Err(MpzError::UnsupportedSlotCode(code));
		}
		writer.write_int(code);
		covered += -(code as i64);
	}
	if covered != slots.len() as i64 {
		return Err(MpzError::SlotCountMismatch {
			expected: slots.len() as i64,
			found: covered,
		});
	}
	Ok(writer.len() - start)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skip_only_test() {
		// One -5 code stands for five untouched base slots.
		let mut writer = MapWriter::new();
		writer.write_int(-5);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (slots, codes) = load_vslots(&mut reader, 5).unwrap();
		assert_eq!(slots.len(), 5);
		assert_eq!(codes, vec![-5]);
		assert!(slots.iter().all(|slot| slot.prev.is_none()));
		assert!(slots.iter().all(|slot| *slot == VSlot::default()));
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn changed_slot_test() {
		let mut writer = MapWriter::new();
		writer.write_int(-1);
		writer.write_int((VSlotChanged::SCALE | VSlotChanged::ROTATION).bits() as i32);
		writer.write_int(0);        // prev
		writer.write_float(2.0);    // scale
		writer.write_int(3);        // rotation
		writer.write_int(-1);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (slots, codes) = load_vslots(&mut reader, 3).unwrap();
		assert_eq!(slots.len(), 3);
		assert_eq!(codes, vec![-1, 6, -1]);
		assert_eq!(slots[1].prev, Some(0));
		assert_eq!(slots[1].scale, 2.0);
		assert_eq!(slots[1].rotation, 3);
		// Untouched fields keep their defaults.
		assert_eq!(slots[1].layer, 0);
		assert_eq!(slots[1].coast_scale, 1.0);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn shader_params_test() {
		let mut writer = MapWriter::new();
		writer.write_int(VSlotChanged::SHPARAM.bits() as i32);
		writer.write_int(0);           // prev
		writer.write_ushort(0x8001);   // one param, palette pair follows each
		writer.write_ushort(9);
		writer.write_str("glowcolor", false);
		writer.write_float(1.0);
		writer.write_float(0.5);
		writer.write_float(0.25);
		writer.write_float(0.0);
		writer.write_int(2);           // palette
		writer.write_int(7);           // palindex
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (slots, _) = load_vslots(&mut reader, 1).unwrap();
		let param = &slots[0].params["glowcolor"];
		assert_eq!(param.val, [1.0, 0.5, 0.25, 0.0]);
		assert_eq!(param.palette, 2);
		assert_eq!(param.palindex, 7);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn shader_params_without_palette_test() {
		let mut writer = MapWriter::new();
		writer.write_int(VSlotChanged::SHPARAM.bits() as i32);
		writer.write_int(0);
		writer.write_ushort(1);        // one param, no palette pairs
		writer.write_ushort(7);
		writer.write_str("specmap", false);
		for _ in 0..4 {
			writer.write_float(0.0);
		}
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (slots, _) = load_vslots(&mut reader, 1).unwrap();
		let param = &slots[0].params["specmap"];
		assert_eq!(param.palette, 0);
		assert_eq!(param.palindex, 0);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn shader_name_too_long_test() {
		let mut writer = MapWriter::new();
		writer.write_int(VSlotChanged::SHPARAM.bits() as i32);
		writer.write_int(0);
		writer.write_ushort(1);
		writer.write_ushort(600);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		assert!(matches!(
			load_vslots(&mut reader, 1),
			Err(MpzError::ShaderNameTooLong(600))
		));
	}

	#[test]
	fn overshooting_skip_test() {
		let mut writer = MapWriter::new();
		writer.write_int(-5);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		assert!(matches!(
			load_vslots(&mut reader, 2),
			Err(MpzError::SlotCountMismatch { expected: 2, found: 5 })
		));
	}

	#[test]
	fn negative_declared_count_test() {
		let mut reader = MapReader::new(&[]);
		assert!(matches!(
			load_vslots(&mut reader, -3),
			Err(MpzError::SlotCountMismatch { expected: -3, found: 0 })
		));
	}

	#[test]
	fn prev_out_of_range_test() {
		let mut writer = MapWriter::new();
		writer.write_int(0);     // changed nothing, still one interpreted slot
		writer.write_int(99);    // back-reference beyond the declared range
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (slots, _) = load_vslots(&mut reader, 1).unwrap();
		assert_eq!(slots[0].prev, None);
	}

	#[test]
	fn unknown_changed_bits_test() {
		// Bits past the known set gate nothing but stay recorded.
		let mut writer = MapWriter::new();
		writer.write_int(1 << 12);
		writer.write_int(0);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (slots, codes) = load_vslots(&mut reader, 1).unwrap();
		assert_eq!(slots[0].changed, 1 << 12);
		assert_eq!(codes, vec![1 << 12]);
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn save_skip_codes_test() {
		let slots = vec![VSlot::default(); 7];
		let codes = vec![-3, -4];
		let mut writer = MapWriter::new();
		let written = save_vslots(&mut writer, &slots, &codes).unwrap();
		assert_eq!(written, 8);
		let data = writer.finish();

		let mut reader = MapReader::new(&data);
		let (decoded, decoded_codes) = load_vslots(&mut reader, 7).unwrap();
		assert_eq!(decoded, slots);
		assert_eq!(decoded_codes, codes);
	}

	#[test]
	fn save_rejects_positive_code_test() {
		let slots = vec![VSlot::default()];
		let mut writer = MapWriter::new();
		assert!(matches!(
			save_vslots(&mut writer, &slots, &[6]),
			Err(MpzError::UnsupportedSlotCode(6))
		));
	}

	#[test]
	fn save_rejects_bad_cover_test() {
		let slots = vec![VSlot::default(); 3];
		let mut writer = MapWriter::new();
		assert!(matches!(
			save_vslots(&mut writer, &slots, &[-2]),
			Err(MpzError::SlotCountMismatch { expected: 3, found: 2 })
		));
	}
}
