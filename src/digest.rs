//! SHA-1 content addressing for build outputs.

use crate::error::Result;
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 8 * 1024;

/// A 160-bit SHA-1 digest with its lowercase hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha1Digest {
    bytes: [u8; 20],
    hex: String,
}

impl Sha1Digest {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self {
            hex: hex::encode(bytes),
            bytes,
        }
    }

    /// Hash everything a reader yields, in fixed-size chunks.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = Sha1::new();
        let mut buffer = [0u8; CHUNK_SIZE];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(Self::from_bytes(hasher.finalize().into()))
    }

    /// Hash a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Hash an in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        Self::from_bytes(Sha1::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }

    pub fn to_hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Sha1Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}
