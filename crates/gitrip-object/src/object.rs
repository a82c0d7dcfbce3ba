//! Loose object decoding.
//!
//! A loose object is a zlib stream inflating to
//! `"<type> <size>\0<payload>"`. See: https://git-scm.com/book/en/v2/Git-Internals-Git-Objects

use crate::{ObjectError, Result};
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Git object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// File content.
    Blob,
    /// Directory listing.
    Tree,
    /// Commit object.
    Commit,
    /// Annotated tag.
    Tag,
}

impl ObjectType {
    /// Returns the string representation used in git.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    /// Parses an object type from a string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            "tag" => Ok(Self::Tag),
            _ => Err(ObjectError::InvalidObject(format!(
                "unknown object type: {}",
                s
            ))),
        }
    }
}

/// A decoded loose object: its type and uncompressed payload.
#[derive(Debug, Clone)]
pub struct LooseObject {
    /// The type of object.
    pub object_type: ObjectType,
    /// The payload, without the loose header.
    pub data: Bytes,
}

impl LooseObject {
    /// Decodes a loose object from its zlib-compressed on-disk form.
    pub fn decode(compressed: &[u8]) -> Result<Self> {
        let mut decoder = ZlibDecoder::new(compressed);
        let mut inflated = Vec::new();
        decoder
            .read_to_end(&mut inflated)
            .map_err(|e| ObjectError::Compression(e.to_string()))?;

        // Parse header: "type size\0data"
        let null_pos = inflated.iter().position(|&b| b == 0).ok_or_else(|| {
            ObjectError::InvalidObject("missing null byte in header".to_string())
        })?;

        let header = String::from_utf8_lossy(&inflated[..null_pos]);
        let parts: Vec<&str> = header.split(' ').collect();
        if parts.len() != 2 {
            return Err(ObjectError::InvalidObject(format!(
                "invalid header: {}",
                header
            )));
        }

        let object_type = ObjectType::parse(parts[0])?;
        let size: usize = parts[1]
            .parse()
            .map_err(|_| ObjectError::InvalidObject("invalid size".to_string()))?;

        let data = &inflated[null_pos + 1..];
        if data.len() != size {
            return Err(ObjectError::InvalidObject(format!(
                "size mismatch: header says {}, payload is {}",
                size,
                data.len()
            )));
        }

        Ok(Self {
            object_type,
            data: Bytes::from(data.to_vec()),
        })
    }

    /// Returns the size of the object payload.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_blob() {
        let compressed = deflate(b"blob 6\0hello\n");
        let obj = LooseObject::decode(&compressed).unwrap();
        assert_eq!(obj.object_type, ObjectType::Blob);
        assert_eq!(obj.data.as_ref(), b"hello\n");
        assert_eq!(obj.size(), 6);
    }

    #[test]
    fn test_decode_rejects_size_mismatch() {
        let compressed = deflate(b"blob 99\0hello\n");
        assert!(LooseObject::decode(&compressed).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_null() {
        let compressed = deflate(b"blob 6 hello!");
        assert!(LooseObject::decode(&compressed).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(LooseObject::decode(b"not zlib at all").is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let compressed = deflate(b"blorb 2\0hi");
        assert!(LooseObject::decode(&compressed).is_err());
    }

    #[test]
    fn test_object_type_roundtrip() {
        for ot in [
            ObjectType::Blob,
            ObjectType::Tree,
            ObjectType::Commit,
            ObjectType::Tag,
        ] {
            assert_eq!(ObjectType::parse(ot.as_str()).unwrap(), ot);
        }
    }
}
