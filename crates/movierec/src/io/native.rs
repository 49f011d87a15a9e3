//! Binary framing for `.mrec` model artifacts.
//!
//! Every artifact starts with a fixed 32-byte header and is followed by the
//! Postcard-encoded [`Payload`](super::Payload). The header is enough to reject
//! foreign files, newer formats and corrupted payloads before any decoding.
//!
//! ```text
//!  offset  len  content
//!  0       4    b"MREC"
//!  4       2    format version (major, minor)
//!  6       1    model kind tag
//!  7       5    zero
//!  12      4    payload length, little endian
//!  16      4    CRC-32 of the payload, little endian
//!  20      8    shape: two little-endian u32 sizes
//!  28      4    zero
//!  32      ..   payload
//! ```

use std::io::{ErrorKind, Read, Write};
use std::ops::Range;

use thiserror::Error;

// ============================================================================
// Layout
// ============================================================================

/// Leading bytes of every artifact.
pub const MAGIC: &[u8; 4] = b"MREC";

/// Length of the fixed header that precedes the payload.
pub const HEADER_SIZE: usize = 32;

/// Format version written by this build. Readers accept any minor of this major.
pub const FORMAT_VERSION: (u8, u8) = (1, 0);

const MAGIC_AT: Range<usize> = 0..4;
const MAJOR_AT: usize = 4;
const MINOR_AT: usize = 5;
const KIND_AT: usize = 6;
const LEN_AT: usize = 12;
const CRC_AT: usize = 16;
const SHAPE_AT: [usize; 2] = [20, 24];

fn put_u32(buf: &mut [u8; HEADER_SIZE], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn get_u32(buf: &[u8; HEADER_SIZE], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(word)
}

/// Read until `buf` is full or the reader is exhausted, returning the bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ============================================================================
// ModelType
// ============================================================================

/// Which model family an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModelType {
    MatrixFactorization = 0,
    FieldAware = 1,
}

impl TryFrom<u8> for ModelType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, u8> {
        match tag {
            0 => Ok(Self::MatrixFactorization),
            1 => Ok(Self::FieldAware),
            other => Err(other),
        }
    }
}

// ============================================================================
// FormatHeader
// ============================================================================

/// Decoded form of the fixed header.
///
/// `shape` carries two model-specific sizes so a loader can cross-check the
/// payload: key counts for matrix factorization, feature count and latent
/// dimension for the field-aware model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version: (u8, u8),
    pub model_type: ModelType,
    pub payload_len: u32,
    pub crc: u32,
    pub shape: [u32; 2],
}

impl FormatHeader {
    /// Header for a fresh artifact. Length and CRC are filled in by [`NativeCodec::write_to`].
    pub fn new(model_type: ModelType, shape: [u32; 2]) -> Self {
        Self {
            version: FORMAT_VERSION,
            model_type,
            payload_len: 0,
            crc: 0,
            shape,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[MAGIC_AT].copy_from_slice(MAGIC);
        buf[MAJOR_AT] = self.version.0;
        buf[MINOR_AT] = self.version.1;
        buf[KIND_AT] = self.model_type as u8;
        put_u32(&mut buf, LEN_AT, self.payload_len);
        put_u32(&mut buf, CRC_AT, self.crc);
        for (at, size) in SHAPE_AT.into_iter().zip(self.shape) {
            put_u32(&mut buf, at, size);
        }
        buf
    }

    /// Decode a header, rejecting foreign files, newer majors and unknown model tags.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self, DeserializeError> {
        if buf[MAGIC_AT] != MAGIC[..] {
            return Err(DeserializeError::NotAModel);
        }
        let (major, minor) = (buf[MAJOR_AT], buf[MINOR_AT]);
        if major > FORMAT_VERSION.0 {
            return Err(DeserializeError::UnsupportedVersion { major, minor });
        }
        let model_type = ModelType::try_from(buf[KIND_AT])
            .map_err(|tag| DeserializeError::CorruptPayload(format!("unknown model tag {tag}")))?;

        Ok(Self {
            version: (major, minor),
            model_type,
            payload_len: get_u32(buf, LEN_AT),
            crc: get_u32(buf, CRC_AT),
            shape: SHAPE_AT.map(|at| get_u32(buf, at)),
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode payload: {0}")]
    Postcard(#[from] postcard::Error),

    /// Payload length does not fit the header's 32-bit field.
    #[error("payload of {0} bytes exceeds the format limit")]
    TooLarge(usize),
}

/// Reasons an artifact is rejected on load.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a movierec model artifact")]
    NotAModel,

    #[error("artifact uses format {major}.{minor}, newer than this build supports")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("payload CRC {actual:#010x} differs from recorded {expected:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("artifact ends early: needed {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload decoded but its content is inconsistent.
    #[error("malformed payload: {0}")]
    CorruptPayload(String),

    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode payload: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("header declares a {header:?} model but the payload holds {payload:?}")]
    TypeMismatch { header: ModelType, payload: ModelType },

    /// The stored input schema is not the one this model kind reads.
    #[error("unexpected input schema for {0:?} model")]
    SchemaMismatch(ModelType),
}

// ============================================================================
// NativeCodec
// ============================================================================

/// Frames payload bytes with a [`FormatHeader`] and verifies them on the way back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        Self
    }

    /// Write `header` then `payload`, stamping the payload's length and CRC into `header`.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        header: &mut FormatHeader,
        payload: &[u8],
    ) -> Result<(), SerializeError> {
        header.payload_len =
            u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;
        header.crc = crc32fast::hash(payload);
        writer.write_all(&header.encode())?;
        writer.write_all(payload)?;
        Ok(())
    }

    /// Read one framed artifact. The payload is returned only if its CRC matches.
    pub fn read_from<R: Read>(
        &self,
        reader: &mut R,
    ) -> Result<(FormatHeader, Vec<u8>), DeserializeError> {
        let mut raw = [0u8; HEADER_SIZE];
        let got = fill(reader, &mut raw)?;
        if got < HEADER_SIZE {
            return Err(DeserializeError::Truncated {
                expected: HEADER_SIZE,
                actual: got,
            });
        }
        let header = FormatHeader::decode(&raw)?;

        // `take` bounds the allocation by what the reader actually holds.
        let want = header.payload_len as usize;
        let mut payload = Vec::new();
        reader.take(u64::from(header.payload_len)).read_to_end(&mut payload)?;
        if payload.len() != want {
            return Err(DeserializeError::Truncated {
                expected: want,
                actual: payload.len(),
            });
        }

        let crc = crc32fast::hash(&payload);
        if crc != header.crc {
            return Err(DeserializeError::ChecksumMismatch {
                expected: header.crc,
                actual: crc,
            });
        }
        Ok((header, payload))
    }

    /// Encode `payload` with Postcard and frame it.
    pub fn serialize<T: serde::Serialize>(
        &self,
        model_type: ModelType,
        shape: [u32; 2],
        payload: &T,
    ) -> Result<Vec<u8>, SerializeError> {
        let body = postcard::to_allocvec(payload)?;
        let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
        self.write_to(&mut out, &mut FormatHeader::new(model_type, shape), &body)?;
        Ok(out)
    }

    /// Verify the framing of `bytes` and decode the payload.
    pub fn deserialize<T: serde::de::DeserializeOwned>(
        &self,
        bytes: &[u8],
    ) -> Result<(FormatHeader, T), DeserializeError> {
        let (header, body) = self.read_from(&mut &bytes[..])?;
        Ok((header, postcard::from_bytes(&body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(model_type: ModelType, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        NativeCodec::new()
            .write_to(&mut out, &mut FormatHeader::new(model_type, [7, 3]), payload)
            .unwrap();
        out
    }

    #[test]
    fn header_fields_land_at_fixed_offsets() {
        let header = FormatHeader {
            version: (1, 4),
            model_type: ModelType::FieldAware,
            payload_len: 0x0102_0304,
            crc: 0xCAFE_F00D,
            shape: [2050, 20],
        };
        let raw = header.encode();

        assert_eq!(&raw[..4], b"MREC");
        assert_eq!(raw[4..7], [1, 4, 1]);
        assert_eq!(raw[12..16], [4, 3, 2, 1]);
        assert_eq!(&raw[20..24], &2050u32.to_le_bytes());
        assert!(raw[7..12].iter().chain(&raw[28..]).all(|&b| b == 0));
        assert_eq!(FormatHeader::decode(&raw).unwrap(), header);
    }

    #[test]
    fn foreign_bytes_are_not_a_model() {
        let mut raw = [0u8; HEADER_SIZE];
        raw[..4].copy_from_slice(b"\x89PNG");
        assert!(matches!(FormatHeader::decode(&raw), Err(DeserializeError::NotAModel)));
    }

    #[test]
    fn newer_major_is_refused_but_newer_minor_is_read() {
        let mut header = FormatHeader::new(ModelType::MatrixFactorization, [10, 12]);
        header.version = (FORMAT_VERSION.0 + 1, 0);
        assert!(matches!(
            FormatHeader::decode(&header.encode()),
            Err(DeserializeError::UnsupportedVersion { major: 2, minor: 0 })
        ));

        header.version = (FORMAT_VERSION.0, 9);
        assert_eq!(FormatHeader::decode(&header.encode()).unwrap().version, (1, 9));
    }

    #[test]
    fn unknown_model_tag_is_corrupt() {
        let mut raw = FormatHeader::new(ModelType::MatrixFactorization, [1, 1]).encode();
        raw[6] = 7;
        assert!(matches!(
            FormatHeader::decode(&raw),
            Err(DeserializeError::CorruptPayload(msg)) if msg.contains('7')
        ));
        assert_eq!(ModelType::try_from(1), Ok(ModelType::FieldAware));
    }

    #[test]
    fn framed_payload_reads_back() {
        let bytes = framed(ModelType::MatrixFactorization, b"latent factors");
        let (header, payload) = NativeCodec::new().read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(header.model_type, ModelType::MatrixFactorization);
        assert_eq!(header.shape, [7, 3]);
        assert_eq!(header.payload_len, 14);
        assert_eq!(payload, b"latent factors");
    }

    #[test]
    fn flipped_payload_bit_fails_crc() {
        let mut bytes = framed(ModelType::FieldAware, b"field weights");
        bytes[HEADER_SIZE + 2] ^= 0x01;
        assert!(matches!(
            NativeCodec::new().read_from(&mut bytes.as_slice()),
            Err(DeserializeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn short_input_is_truncated() {
        let codec = NativeCodec::new();
        let bytes = framed(ModelType::FieldAware, b"0123456789");

        assert!(matches!(
            codec.read_from(&mut &bytes[..bytes.len() - 3]),
            Err(DeserializeError::Truncated { expected: 10, actual: 7 })
        ));
        assert!(matches!(
            codec.read_from(&mut &bytes[..10]),
            Err(DeserializeError::Truncated { expected: HEADER_SIZE, actual: 10 })
        ));
        assert!(matches!(
            codec.read_from(&mut &bytes[..0]),
            Err(DeserializeError::Truncated { actual: 0, .. })
        ));
    }

    #[test]
    fn typed_payload_survives_framing() {
        let codec = NativeCodec::new();
        let value = (vec![1.5f32, -0.25], String::from("genre"));
        let bytes = codec.serialize(ModelType::FieldAware, [2, 1], &value).unwrap();
        let (header, back): (_, (Vec<f32>, String)) = codec.deserialize(&bytes).unwrap();
        assert_eq!(header.shape, [2, 1]);
        assert_eq!(back, value);
    }
}
