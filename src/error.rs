use thiserror::Error;

/// The master error type.
///
/// Variants fall into three families: format errors (the stream is not a valid
/// map), unsupported encodings (valid data this library deliberately refuses to
/// handle), and truncation. All of them are fatal; no codec in this crate
/// recovers partway through a read or write.
#[derive(Debug, Error)]
pub enum MpzError {
	#[error("{0}")]
	Custom(String),
	#[error("IO Error: {0}")]
	IoError(#[from] std::io::Error),
	#[error("Failed to convert to UTF-8 string.")]
	FromUtf8Error(#[from] std::string::FromUtf8Error),
	#[error("JSON Error: {0}")]
	JsonError(#[from] serde_json::Error),
	#[error("Invalid map magic: {0:?}.")]
	BadMagic([u8; 4]),
	#[error("Unknown map variable type: {0}")]
	UnknownVariableType(i32),
	#[error("Unknown octree node type: {0}")]
	UnknownOctsav(u8),
	#[error("Shader parameter name length {0} exceeds the maximum.")]
	ShaderNameTooLong(u16),
	#[error("VSlot chain produced {found} slots where {expected} were declared.")]
	SlotCountMismatch { expected: i64, found: i64 },
	#[error("Octree nesting exceeds the maximum depth.")]
	OctreeTooDeep,
	#[error("Out of range error.")]
	OutOfRange,
	#[error("Surface carries unsupported lit-geometry vertex data (numverts {0}).")]
	UnsupportedVertexData(u8),
	#[error("Cannot re-encode vslot change code {0}.")]
	UnsupportedSlotCode(i32),
	#[error("Unexpected end of map data at offset {offset} (wanted {wanted} more bytes).")]
	Truncated { offset: usize, wanted: usize },
}

impl MpzError {

	pub fn range_check<T, R>(value: T, range: R) -> Result<(),MpzError>
	where
	T: PartialOrd + Sized,
	R: std::ops::RangeBounds<T> {
		if range.contains(&value) {
			Ok(())
		} else {
			Err(MpzError::OutOfRange)
		}
	}

	#[inline(always)]
	pub fn custom<T, S: AsRef<str>>(msg: S) -> Result<T,Self> {
		Err(MpzError::Custom(msg.as_ref().to_owned()))
	}
}

pub type MpzResult<T> = Result<T,MpzError>;
