//! Future extensions: a tagged union whose only member today is `void`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::codec::{ByteReader, ByteWriter, Decode, Encode};
use shared_types::CodecError;

/// Extension slot carried by transactions and some operations.
///
/// Encodes as its varint tag (`0`) with no body; JSON form is `[0, {}]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Void,
}

impl Encode for Extension {
    fn encode(&self, writer: &mut ByteWriter) {
        match self {
            Extension::Void => writer.write_varint(0),
        }
    }
}

impl Decode for Extension {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        match reader.read_varint()? {
            0 => Ok(Extension::Void),
            tag => Err(CodecError::UnsupportedExtension(tag)),
        }
    }
}

impl Serialize for Extension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Extension::Void => (0u64, serde_json::Map::new()).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Extension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (tag, _body) = <(u64, serde_json::Value)>::deserialize(deserializer)?;
        match tag {
            0 => Ok(Extension::Void),
            other => Err(serde::de::Error::custom(format!(
                "unsupported extension tag {other}"
            ))),
        }
    }
}
