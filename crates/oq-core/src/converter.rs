//! Byte conversion for entries stored in a durable queue

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::marker::PhantomData;

/// Converts entries to and from the bytes stored in a [`FileObjectQueue`].
///
/// Only durable queues need a converter. Failures are reported as
/// `io::Error`s and surface to callers as [`QueueError::Io`].
///
/// [`FileObjectQueue`]: crate::queue::FileObjectQueue
/// [`QueueError::Io`]: crate::QueueError::Io
pub trait Converter<T> {
    /// Decode an entry from the bytes of one record.
    fn from_bytes(&self, bytes: &[u8]) -> io::Result<T>;

    /// Encode `value` into `sink`.
    fn to_writer(&self, value: &T, sink: &mut dyn Write) -> io::Result<()>;
}

/// UTF-8 text entries
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Converter<String> for StringConverter {
    fn from_bytes(&self, bytes: &[u8]) -> io::Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn to_writer(&self, value: &String, sink: &mut dyn Write) -> io::Result<()> {
        sink.write_all(value.as_bytes())
    }
}

/// JSON-encoded entries for any serde type
pub struct JsonConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonConverter<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonConverter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonConverter")
    }
}

impl<T> Converter<T> for JsonConverter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn from_bytes(&self, bytes: &[u8]) -> io::Result<T> {
        serde_json::from_slice(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn to_writer(&self, value: &T, sink: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(sink, value).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Upload {
        id: u64,
        path: String,
    }

    #[test]
    fn test_string_converter_rejects_invalid_utf8() {
        let err = StringConverter.from_bytes(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_string_converter_writes_raw_bytes() {
        let mut buf = Vec::new();
        StringConverter
            .to_writer(&"héllo".to_string(), &mut buf)
            .unwrap();
        assert_eq!(buf, "héllo".as_bytes());
        assert_eq!(StringConverter.from_bytes(&buf).unwrap(), "héllo");
    }

    #[test]
    fn test_json_converter_struct() {
        let converter = JsonConverter::<Upload>::new();
        let upload = Upload {
            id: 7,
            path: "photos/cat.jpg".to_string(),
        };

        let mut buf = Vec::new();
        converter.to_writer(&upload, &mut buf).unwrap();
        assert!(String::from_utf8(buf.clone()).unwrap().contains("\"id\":7"));
        assert_eq!(converter.from_bytes(&buf).unwrap(), upload);
    }

    #[test]
    fn test_json_converter_bad_payload() {
        let converter = JsonConverter::<Upload>::new();
        let err = converter.from_bytes(b"{\"id\":").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
