//! TFRecord framing: length-delimited records with masked CRC-32C checksums,
//! as read and written by TensorFlow's record readers and writers.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::masked_crc::MaskedCrc;

/// A single TFRecord: a payload plus the checksum stored in its footer.
///
/// The wire format of a record is:
///
/// ```text
/// u64    length        (little-endian)
/// u32    masked CRC of the length bytes
/// [u8]   payload, `length` bytes
/// u32    masked CRC of the payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfRecord {
    pub data: Vec<u8>,
    pub data_crc: MaskedCrc,
}

/// A buffer's checksum was computed, but it did not match the expected value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("checksum mismatch: got {got:?}, want {want:?}")]
pub struct ChecksumError {
    pub got: MaskedCrc,
    pub want: MaskedCrc,
}

/// Error returned by [`TfRecord::read`].
#[derive(Debug, thiserror::Error)]
pub enum ReadRecordError {
    /// The length header's checksum did not match, so the record boundary
    /// cannot be trusted.
    #[error("bad length checksum: {0}")]
    BadLengthCrc(ChecksumError),
    /// The underlying reader ended mid-record.
    #[error("truncated record")]
    Truncated,
    /// Record claims to be longer than the whole addressable space.
    #[error("record too large: {0} bytes")]
    TooLarge(u64),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TfRecord {
    /// Creates a record from a payload, computing its checksum.
    pub fn from_data(data: Vec<u8>) -> Self {
        let data_crc = MaskedCrc::compute(&data);
        TfRecord { data, data_crc }
    }

    /// Validates the payload against the stored checksum. This can be
    /// expensive for large payloads and is never required for writing.
    pub fn checksum(&self) -> Result<(), ChecksumError> {
        let got = MaskedCrc::compute(&self.data);
        if got == self.data_crc {
            Ok(())
        } else {
            Err(ChecksumError {
                got,
                want: self.data_crc,
            })
        }
    }

    /// Serializes the record, including its header and footer, to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut len_bytes = [0u8; 8];
        (&mut len_bytes[..]).write_u64::<LittleEndian>(self.data.len() as u64)?;
        writer.write_all(&len_bytes)?;
        writer.write_u32::<LittleEndian>(MaskedCrc::compute(&len_bytes).0)?;
        writer.write_all(&self.data)?;
        writer.write_u32::<LittleEndian>(self.data_crc.0)?;
        Ok(())
    }

    /// Reads one record from a reader. The length checksum is always
    /// validated, since a corrupt length would desynchronize the stream; the
    /// payload checksum is stored on the record for the caller to validate
    /// via [`checksum`][Self::checksum] if desired.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, ReadRecordError> {
        let mut len_bytes = [0u8; 8];
        reader.read_exact(&mut len_bytes).map_err(truncation)?;
        let len_crc = MaskedCrc(reader.read_u32::<LittleEndian>().map_err(truncation)?);
        let expected = MaskedCrc::compute(&len_bytes);
        if len_crc != expected {
            return Err(ReadRecordError::BadLengthCrc(ChecksumError {
                got: expected,
                want: len_crc,
            }));
        }
        let len = (&len_bytes[..]).read_u64::<LittleEndian>()?;
        if len > usize::MAX as u64 {
            return Err(ReadRecordError::TooLarge(len));
        }
        let mut data = vec![0u8; len as usize];
        reader.read_exact(&mut data).map_err(truncation)?;
        let data_crc = MaskedCrc(reader.read_u32::<LittleEndian>().map_err(truncation)?);
        Ok(TfRecord { data, data_crc })
    }
}

fn truncation(e: io::Error) -> ReadRecordError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ReadRecordError::Truncated
    } else {
        ReadRecordError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_roundtrip() {
        let record = TfRecord::from_data(b"loss went down, i promise".to_vec());
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        assert_eq!(buf.len(), 8 + 4 + record.data.len() + 4);

        let read = TfRecord::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(read, record);
        read.checksum().unwrap();
    }

    #[test]
    fn test_wire_layout() {
        let record = TfRecord::from_data(vec![1, 2, 3]);
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        // Little-endian length header.
        assert_eq!(&buf[0..8], &[3, 0, 0, 0, 0, 0, 0, 0]);
        // Payload sits between the two checksums.
        assert_eq!(&buf[12..15], &[1, 2, 3]);
    }

    #[test]
    fn test_empty_payload() {
        let record = TfRecord::from_data(Vec::new());
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        let read = TfRecord::read(&mut Cursor::new(&buf)).unwrap();
        assert!(read.data.is_empty());
        read.checksum().unwrap();
    }

    #[test]
    fn test_corrupt_payload_fails_checksum() {
        let record = TfRecord::from_data(b"step 7".to_vec());
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        buf[13] ^= 0xff;
        let read = TfRecord::read(&mut Cursor::new(&buf)).unwrap();
        assert!(read.checksum().is_err());
    }

    #[test]
    fn test_corrupt_length_rejected() {
        let record = TfRecord::from_data(b"step 7".to_vec());
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        buf[0] ^= 0xff;
        match TfRecord::read(&mut Cursor::new(&buf)) {
            Err(ReadRecordError::BadLengthCrc(_)) => (),
            other => panic!("expected BadLengthCrc, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_stream() {
        let record = TfRecord::from_data(b"step 7".to_vec());
        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();
        buf.truncate(buf.len() - 2);
        match TfRecord::read(&mut Cursor::new(&buf)) {
            Err(ReadRecordError::Truncated) => (),
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_records_in_sequence() {
        let mut buf = Vec::new();
        for payload in [&b"a"[..], b"bb", b"ccc"] {
            TfRecord::from_data(payload.to_vec()).write(&mut buf).unwrap();
        }
        let mut cursor = Cursor::new(&buf);
        for payload in [&b"a"[..], b"bb", b"ccc"] {
            let record = TfRecord::read(&mut cursor).unwrap();
            assert_eq!(record.data, payload);
        }
    }
}
