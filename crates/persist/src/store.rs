//! File-backed universe persistence.
//!
//! Layout of `universe.bin` (all integers little endian):
//! ```text
//! 0   8   magic "COSMOSU\0"
//! 8   4   schema version
//! 12  4   reserved (0)
//! 16  8   payload length N
//! 24  32  SHA-256 of the payload
//! 56  N   zstd-compressed CBOR universe
//! ..      zero padding up to the requested target size (sparse)
//! ```

use cosmos_kernel::{GenerationConfig, KernelError, Universe};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const MAGIC: [u8; 8] = *b"COSMOSU\0";
pub const SCHEMA_VERSION: u32 = 1;
pub const HEADER_LEN: u64 = 56;

const ZSTD_LEVEL: i32 = 3;

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a universe file (bad magic)")]
    BadMagic,
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("file truncated: need {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Decoded header of a universe file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub schema_version: u32,
    pub payload_len: u64,
    pub payload_sha256: String,
    /// Size of the file on disk, padding included.
    pub file_len: u64,
}

/// Whether [`open_or_generate`] found an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Loaded,
    Generated,
}

/// Reader and writer for the single-file universe format.
pub struct UniverseFile;

impl UniverseFile {
    /// Write `universe` to `path`, replacing any existing file atomically.
    ///
    /// A `target_size` larger than the encoded file extends it with zeros;
    /// 0 disables padding.
    pub fn write(
        path: impl AsRef<Path>,
        universe: &Universe,
        target_size: u64,
    ) -> Result<FileHeader, PersistError> {
        let path = path.as_ref();
        let _span = tracing::info_span!("write_universe", path = %path.display()).entered();

        let cbor_bytes = cbor_serialize(universe)?;
        let payload = zstd_compress(&cbor_bytes)?;
        let digest = sha256(&payload);

        let mut header = Vec::with_capacity(HEADER_LEN as usize);
        header.extend_from_slice(&MAGIC);
        header.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        header.extend_from_slice(&digest);

        // A uniquely named temp file in the target directory, renamed into place.
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let file = tmp.as_file_mut();
            file.write_all(&header)?;
            file.write_all(&payload)?;
            let written = HEADER_LEN + payload.len() as u64;
            if target_size > written {
                // set_len leaves a hole; no zeros are actually written.
                file.set_len(target_size)?;
            } else if target_size != 0 {
                tracing::warn!(
                    target_size,
                    written,
                    "target size smaller than encoded universe, not padding"
                );
            }
            file.sync_all()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        let file_len = std::fs::metadata(path)?.len();
        tracing::info!(
            cbor = cbor_bytes.len(),
            payload = payload.len(),
            file_len,
            "universe written"
        );
        Ok(FileHeader {
            schema_version: SCHEMA_VERSION,
            payload_len: payload.len() as u64,
            payload_sha256: hex(&digest),
            file_len,
        })
    }

    /// Read and validate only the header.
    pub fn read_header(path: impl AsRef<Path>) -> Result<FileHeader, PersistError> {
        let mut file = File::open(path.as_ref())?;
        let file_len = file.metadata()?.len();
        read_header_from(&mut file, file_len).map(|(header, _)| header)
    }

    /// Load a universe, verifying schema version and payload hash.
    pub fn read(path: impl AsRef<Path>) -> Result<Universe, PersistError> {
        let path = path.as_ref();
        let _span = tracing::info_span!("read_universe", path = %path.display()).entered();
        let (_, universe) = Self::load(path)?;
        Ok(universe)
    }

    /// Full verification: header, hash, and a complete decode.
    pub fn verify(path: impl AsRef<Path>) -> Result<FileHeader, PersistError> {
        let (header, universe) = Self::load(path.as_ref())?;
        universe.config().validate()?;
        Ok(header)
    }

    fn load(path: &Path) -> Result<(FileHeader, Universe), PersistError> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let (header, digest) = read_header_from(&mut file, file_len)?;

        let mut payload = vec![0u8; header.payload_len as usize];
        file.read_exact(&mut payload)?;

        let actual = sha256(&payload);
        if actual != digest {
            return Err(PersistError::IntegrityMismatch {
                expected: hex(&digest),
                actual: hex(&actual),
            });
        }

        let cbor_bytes = zstd_decompress(&payload)?;
        let universe: Universe = cbor_deserialize(&cbor_bytes)?;
        tracing::debug!(
            seed = universe.seed(),
            galaxies = universe.galaxies().len(),
            "universe decoded"
        );
        Ok((header, universe))
    }
}

/// Load the universe at `path`, or generate and persist it if absent.
///
/// An existing file always wins: the universe is never regenerated behind
/// the caller's back, even if `seed` or `config` differ from what was saved.
pub fn open_or_generate(
    path: impl AsRef<Path>,
    seed: u64,
    config: &GenerationConfig,
    target_size: u64,
) -> Result<(Universe, Origin), PersistError> {
    let path = path.as_ref();
    if path.exists() {
        let universe = UniverseFile::read(path)?;
        if universe.seed() != seed || universe.config() != config {
            tracing::warn!(
                saved_seed = universe.seed(),
                requested_seed = seed,
                "existing universe differs from requested parameters; keeping saved universe"
            );
        }
        tracing::info!(path = %path.display(), "universe loaded");
        return Ok((universe, Origin::Loaded));
    }

    let universe = Universe::generate(seed, config.clone())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    UniverseFile::write(path, &universe, target_size)?;
    Ok((universe, Origin::Generated))
}

fn read_header_from(
    file: &mut File,
    file_len: u64,
) -> Result<(FileHeader, [u8; 32]), PersistError> {
    if file_len < HEADER_LEN {
        return Err(PersistError::Truncated {
            expected: HEADER_LEN,
            actual: file_len,
        });
    }
    let mut raw = [0u8; HEADER_LEN as usize];
    file.read_exact(&mut raw)?;

    if raw[0..8] != MAGIC {
        return Err(PersistError::BadMagic);
    }
    let schema_version = u32::from_le_bytes(le_array(&raw[8..12]));
    if schema_version != SCHEMA_VERSION {
        return Err(PersistError::SchemaMismatch {
            file_version: schema_version,
            expected_version: SCHEMA_VERSION,
        });
    }
    let payload_len = u64::from_le_bytes(le_array(&raw[16..24]));
    let needed = HEADER_LEN.saturating_add(payload_len);
    if file_len < needed {
        return Err(PersistError::Truncated {
            expected: needed,
            actual: file_len,
        });
    }
    let digest: [u8; 32] = le_array(&raw[24..56]);

    Ok((
        FileHeader {
            schema_version,
            payload_len,
            payload_sha256: hex(&digest),
            file_len,
        },
        digest,
    ))
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PersistError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| PersistError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, PersistError> {
    ciborium::from_reader(data).map_err(|e| PersistError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, PersistError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, PersistError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom};

    fn open_rw(path: &Path) -> std::io::Result<File> {
        std::fs::OpenOptions::new().read(true).write(true).open(path)
    }

    fn small_universe(seed: u64) -> Universe {
        Universe::generate(seed, GenerationConfig::small()).unwrap()
    }

    #[test]
    fn write_then_read_preserves_state_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        let universe = small_universe(42);

        let header = UniverseFile::write(&path, &universe, 0).unwrap();
        assert_eq!(header.schema_version, SCHEMA_VERSION);
        assert_eq!(header.file_len, HEADER_LEN + header.payload_len);

        let loaded = UniverseFile::read(&path).unwrap();
        assert_eq!(loaded.state_hash(), universe.state_hash());
        assert_eq!(loaded, universe);
    }

    #[test]
    fn header_matches_written() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        let written = UniverseFile::write(&path, &small_universe(1), 0).unwrap();
        let read = UniverseFile::read_header(&path).unwrap();
        assert_eq!(written, read);
        assert_eq!(read.payload_sha256.len(), 64);
    }

    #[test]
    fn padding_extends_file_without_touching_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        let universe = small_universe(3);
        let target = 4 * 1024 * 1024;

        let header = UniverseFile::write(&path, &universe, target).unwrap();
        assert_eq!(header.file_len, target);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), target);
        assert_eq!(UniverseFile::read(&path).unwrap(), universe);
        UniverseFile::verify(&path).unwrap();
    }

    #[test]
    fn small_target_size_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        let header = UniverseFile::write(&path, &small_universe(3), 10).unwrap();
        assert_eq!(header.file_len, HEADER_LEN + header.payload_len);
    }

    #[test]
    fn overwrite_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        UniverseFile::write(&path, &small_universe(1), 0).unwrap();
        UniverseFile::write(&path, &small_universe(2), 0).unwrap();
        assert_eq!(UniverseFile::read(&path).unwrap().seed(), 2);
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_write_cleans_up_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail.
        let path = tmp.path().join("universe.bin");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        assert!(matches!(
            UniverseFile::write(&path, &small_universe(4), 0),
            Err(PersistError::Io(_))
        ));
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(path.is_dir());
    }

    #[test]
    fn corrupted_payload_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        UniverseFile::write(&path, &small_universe(7), 0).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        if let Some(byte) = data.last_mut() {
            *byte ^= 0xff;
        }
        std::fs::write(&path, &data).unwrap();

        assert!(matches!(
            UniverseFile::read(&path),
            Err(PersistError::IntegrityMismatch { .. })
        ));
        assert!(UniverseFile::verify(&path).is_err());
    }

    #[test]
    fn bad_magic_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        std::fs::write(&path, vec![0u8; 128]).unwrap();
        assert!(matches!(
            UniverseFile::read(&path),
            Err(PersistError::BadMagic)
        ));
    }

    #[test]
    fn schema_mismatch_fail_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        UniverseFile::write(&path, &small_universe(7), 0).unwrap();

        let mut file = open_rw(&path).unwrap();
        file.seek(SeekFrom::Start(8)).unwrap();
        file.write_all(&999u32.to_le_bytes()).unwrap();
        drop(file);

        match UniverseFile::read(&path) {
            Err(PersistError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, SCHEMA_VERSION);
            }
            Err(e) => panic!("expected SchemaMismatch, got: {e}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn truncated_file_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        UniverseFile::write(&path, &small_universe(7), 0).unwrap();
        let data = std::fs::read(&path).unwrap();
        std::fs::write(&path, &data[..data.len() - 10]).unwrap();
        assert!(matches!(
            UniverseFile::read(&path),
            Err(PersistError::Truncated { .. })
        ));

        std::fs::write(&path, &data[..20]).unwrap();
        assert!(matches!(
            UniverseFile::read_header(&path),
            Err(PersistError::Truncated { expected: HEADER_LEN, actual: 20 })
        ));
    }

    #[test]
    fn open_or_generate_generates_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("universe.bin");
        let cfg = GenerationConfig::small();

        let (first, origin) = open_or_generate(&path, 9, &cfg, 0).unwrap();
        assert_eq!(origin, Origin::Generated);
        assert!(path.exists());

        let (second, origin) = open_or_generate(&path, 9, &cfg, 0).unwrap();
        assert_eq!(origin, Origin::Loaded);
        assert_eq!(first.state_hash(), second.state_hash());
    }

    #[test]
    fn open_or_generate_never_regenerates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        let cfg = GenerationConfig::small();
        let (first, _) = open_or_generate(&path, 9, &cfg, 0).unwrap();

        let other = GenerationConfig {
            galaxy_count: 5,
            ..GenerationConfig::small()
        };
        let (second, origin) = open_or_generate(&path, 10, &other, 0).unwrap();
        assert_eq!(origin, Origin::Loaded);
        assert_eq!(second.seed(), 9);
        assert_eq!(second, first);
    }

    #[test]
    fn open_or_generate_propagates_invalid_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("universe.bin");
        let cfg = GenerationConfig {
            life_probability: 2.0,
            ..GenerationConfig::small()
        };
        assert!(matches!(
            open_or_generate(&path, 1, &cfg, 0),
            Err(PersistError::Kernel(_))
        ));
        assert!(!path.exists());
    }
}
