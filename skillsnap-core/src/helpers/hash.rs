//! SHA-256 hashing utilities.

use fs_err::File;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::SnapError;

/// Read buffer size used when streaming a file through the hasher.
pub const CHUNK_SIZE: usize = 8192;

/// Compute the SHA-256 hash of a file as lowercase hex.
///
/// The file is streamed in fixed-size chunks, never read whole.
pub fn get_file_hash(path: &Path) -> Result<String, SnapError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute the SHA-256 hash of an in-memory buffer as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        fs::write(&path, b"hello world").unwrap();

        let hash = get_file_hash(&path).unwrap();
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(hash, hash_bytes(b"hello world"));
    }

    #[test]
    fn test_multi_chunk_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.bin");
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(get_file_hash(&path).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn test_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        assert!(get_file_hash(&temp.path().join("absent")).is_err());
    }
}
