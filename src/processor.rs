//! Encryption engine: streams files into and out of `.zesec` containers.
//!
//! Every file call follows the same shape: validate, derive, stream through
//! one [`Stream`] into a staging file next to the destination, then sync and
//! rename. Nothing is written at the destination path until the data is
//! complete and, for decryption, authenticated. Destructive steps (cleaning
//! the original) only run after the container is durable.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zeroize::Zeroizing;

use crate::cipher::{Derive, EncryptionKey, Stream, generate_nonce, generate_salt};
use crate::config::{Config, MIN_CONTAINER_SIZE, PREAMBLE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::eraser::Eraser;
use crate::error::{Error, PathContext, Result};
use crate::file;
use crate::header::{Container, Header, Preamble};
use crate::keyfile::KeyFile;
use crate::secret::{KeyMaterial, Password};
use crate::types::{EncryptionResult, Hooks, Operation, Phase};

pub struct Processor {
    config: Config,
    eraser: Eraser,
}

impl Processor {
    /// # Errors
    ///
    /// Returns [`Error::WeakParameter`] if `config` fails validation.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, eraser: Eraser::new(config.chunk_size) })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encrypts `input` into a container at `output` (default `input.zesec`).
    ///
    /// With `clean_original`, the input is wiped with `config.passes` passes
    /// and deleted once the container is on disk. If that wipe fails the
    /// result is unsuccessful but still names the written container. A
    /// symlinked input is refused up front when cleaning is requested.
    pub fn encrypt(&self, input: &Path, password: &Password, key_file: Option<&Path>, output: Option<&Path>, clean_original: bool, hooks: Hooks<'_>) -> EncryptionResult {
        let output = output.map_or_else(|| file::output_path(input, Operation::Encrypt), Path::to_path_buf);

        let sealed = check_password(password)
            .and_then(|()| check_clean_source(input, clean_original))
            .and_then(|()| load_key_file(key_file))
            .and_then(|material| self.seal_file(input, &output, password, material.as_ref(), hooks));

        match sealed {
            Ok(bytes) => self.finish_encrypt(input, output, bytes, clean_original, hooks),
            Err(error) => EncryptionResult::err(Operation::Encrypt, error),
        }
    }

    /// Decrypts the container at `input` into `output`.
    ///
    /// The default output strips `.zesec`, or appends `.decrypted` when the
    /// input has no such suffix. Plaintext only appears at `output` after the
    /// tag has verified.
    pub fn decrypt(&self, input: &Path, password: &Password, key_file: Option<&Path>, output: Option<&Path>, hooks: Hooks<'_>) -> EncryptionResult {
        let output = output.map_or_else(|| file::output_path(input, Operation::Decrypt), Path::to_path_buf);

        let opened = check_password(password).and_then(|()| load_key_file(key_file)).and_then(|material| self.open_file(input, &output, password, material.as_ref(), hooks));

        match opened {
            Ok(bytes) => EncryptionResult::ok(Operation::Decrypt, output, bytes),
            Err(error) => EncryptionResult::err(Operation::Decrypt, error),
        }
    }

    /// Encrypts every regular file under `dir` that is not already a container.
    ///
    /// Links are not followed. A failure on one file is recorded in its
    /// result and the batch continues; cancellation ends the batch after
    /// recording the cancelled entry.
    ///
    /// # Errors
    ///
    /// Fails before touching any file if the password is empty, the key file
    /// cannot be read, or `dir` is not a directory.
    pub fn encrypt_directory(&self, dir: &Path, password: &Password, key_file: Option<&Path>, clean_originals: bool, recursive: bool, hooks: Hooks<'_>) -> Result<Vec<EncryptionResult>> {
        check_password(password)?;
        let material = load_key_file(key_file)?;

        if !std::fs::symlink_metadata(dir).at(dir)?.is_dir() {
            return Err(Error::io(dir, std::io::Error::new(ErrorKind::InvalidInput, "not a directory")));
        }

        let mut walker = WalkDir::new(dir).follow_links(false).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut results = Vec::new();
        let mut targets = Vec::new();

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && !file::is_encrypted_file(entry.path()) => targets.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                    results.push(EncryptionResult::err(Operation::Encrypt, Error::io(path, std::io::Error::from(e))));
                }
            }
        }

        debug!(dir = %dir.display(), files = targets.len(), "encrypting directory");

        for input in targets {
            let output = file::output_path(&input, Operation::Encrypt);
            let result = match self.seal_file(&input, &output, password, material.as_ref(), hooks) {
                Ok(bytes) => self.finish_encrypt(&input, output, bytes, clean_originals, hooks),
                Err(error) => EncryptionResult::err(Operation::Encrypt, error),
            };

            let cancelled = matches!(result.error, Some(Error::Cancelled));
            results.push(result);

            if cancelled {
                break;
            }
        }

        Ok(results)
    }

    /// Seals `plaintext` into an in-memory container.
    ///
    /// # Errors
    ///
    /// [`Error::WeakParameter`] for an empty password.
    pub fn encrypt_bytes(&self, plaintext: &[u8], password: &Password, key_material: Option<&KeyMaterial>) -> Result<Vec<u8>> {
        check_password(password)?;

        let salt = generate_salt();
        let nonce = generate_nonce();
        let key = derive_key(password, key_material, &salt, self.config.iterations)?;

        let preamble = Preamble::new(Header::new(self.config.iterations), salt, nonce);
        let mut ciphertext = plaintext.to_vec();

        let mut stream = Stream::new(&key, &nonce, &preamble.serialize());
        stream.encrypt_chunk(&mut ciphertext)?;
        let tag = stream.tag();

        Ok(Container { preamble, ciphertext: &ciphertext, tag }.encode())
    }

    /// Opens an in-memory container produced by [`Processor::encrypt_bytes`]
    /// or read whole from a `.zesec` file.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedContainer`] for a structurally invalid container and
    /// [`Error::Authentication`] for a wrong factor or modified data.
    pub fn decrypt_bytes(&self, container: &[u8], password: &Password, key_material: Option<&KeyMaterial>) -> Result<Vec<u8>> {
        check_password(password)?;

        let container = Container::decode(container)?;
        let preamble = &container.preamble;
        let key = derive_key(password, key_material, &preamble.salt, preamble.header.iterations)?;

        let mut plaintext = Zeroizing::new(container.ciphertext.to_vec());
        let mut stream = Stream::new(&key, &preamble.nonce, &preamble.serialize());
        stream.decrypt_chunk(&mut plaintext)?;
        stream.verify(&container.tag)?;

        Ok(std::mem::take(&mut *plaintext))
    }

    /// Reads the header of a container without any secret.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be opened, or
    /// [`Error::MalformedContainer`] if its preamble is invalid.
    pub fn inspect(path: &Path) -> Result<Header> {
        let mut reader = File::open(path).at(path)?;
        Ok(Preamble::read_from(&mut reader, path)?.header)
    }

    fn finish_encrypt(&self, input: &Path, output: PathBuf, bytes: u64, clean_original: bool, hooks: Hooks<'_>) -> EncryptionResult {
        let cleaned = || check_clean_source(input, true).and_then(|()| self.eraser.wipe(input, self.config.passes, true, hooks));

        if clean_original && let Err(error) = cleaned() {
            debug!(input = %input.display(), %error, "cleaning original failed after encryption");
            return EncryptionResult { operation: Operation::Encrypt, success: false, output_path: Some(output), bytes_processed: bytes, error: Some(error) };
        }

        EncryptionResult::ok(Operation::Encrypt, output, bytes)
    }

    fn seal_file(&self, input: &Path, output: &Path, password: &Password, material: Option<&KeyMaterial>, hooks: Hooks<'_>) -> Result<u64> {
        file::ensure_distinct(input, output)?;

        let mut reader = File::open(input).at(input)?;
        let metadata = reader.metadata().at(input)?;
        if !metadata.is_file() {
            return Err(Error::io(input, std::io::Error::new(ErrorKind::InvalidInput, "not a regular file")));
        }
        let total = metadata.len();

        debug!(input = %input.display(), output = %output.display(), total, "encrypting");

        let salt = generate_salt();
        let nonce = generate_nonce();
        let key = derive_key(password, material, &salt, self.config.iterations)?;

        let aad = Preamble::new(Header::new(self.config.iterations), salt, nonce).serialize();
        let mut stream = Stream::new(&key, &nonce, &aad);

        let mut staged = file::stage(output)?;
        staged.write_all(&aad).at(output)?;

        let mut buffer = Zeroizing::new(vec![0u8; self.config.chunk_size]);
        let mut processed = 0u64;

        loop {
            hooks.checkpoint()?;

            let n = read_chunk(&mut reader, &mut buffer).at(input)?;
            if n == 0 {
                break;
            }

            stream.encrypt_chunk(&mut buffer[..n])?;
            staged.write_all(&buffer[..n]).at(output)?;

            processed += n as u64;
            hooks.report(Phase::Encrypting, processed, total);
        }

        staged.write_all(&stream.tag()).at(output)?;
        hooks.checkpoint()?;

        file::commit(staged, output, (PREAMBLE_SIZE + TAG_SIZE) as u64 + processed)?;
        debug!(output = %output.display(), processed, "container written");

        Ok(processed)
    }

    fn open_file(&self, input: &Path, output: &Path, password: &Password, material: Option<&KeyMaterial>, hooks: Hooks<'_>) -> Result<u64> {
        file::ensure_distinct(input, output)?;

        let mut reader = File::open(input).at(input)?;
        let len = reader.metadata().at(input)?.len();
        if len < MIN_CONTAINER_SIZE as u64 {
            return Err(Error::malformed(format!("container too short: need at least {MIN_CONTAINER_SIZE} bytes, got {len}")));
        }

        let preamble = Preamble::read_from(&mut reader, input)?;
        let total = len - MIN_CONTAINER_SIZE as u64;

        debug!(input = %input.display(), output = %output.display(), total, iterations = preamble.header.iterations, "decrypting");

        let key = derive_key(password, material, &preamble.salt, preamble.header.iterations)?;
        let mut stream = Stream::new(&key, &preamble.nonce, &preamble.serialize());

        let mut staged = file::stage(output)?;
        let mut buffer = Zeroizing::new(vec![0u8; self.config.chunk_size]);
        let mut processed = 0u64;

        while processed < total {
            hooks.checkpoint()?;

            let n = usize::try_from(total - processed).map_or(buffer.len(), |left| left.min(buffer.len()));
            reader.read_exact(&mut buffer[..n]).at(input)?;

            stream.decrypt_chunk(&mut buffer[..n])?;
            staged.write_all(&buffer[..n]).at(output)?;

            processed += n as u64;
            hooks.report(Phase::Decrypting, processed, total);
        }

        let mut tag = [0u8; TAG_SIZE];
        reader.read_exact(&mut tag).at(input)?;

        // The staging file is dropped, and removed, on any error from here on.
        stream.verify(&tag)?;
        hooks.checkpoint()?;

        file::commit(staged, output, total)?;
        debug!(output = %output.display(), processed, "plaintext written");

        Ok(processed)
    }
}

fn derive_key(password: &Password, material: Option<&KeyMaterial>, salt: &[u8; SALT_SIZE], iterations: u32) -> Result<EncryptionKey> {
    Derive::new(password.expose_secret(), material.map(KeyMaterial::expose_secret))?.derive_key(salt, iterations)
}

fn check_password(password: &Password) -> Result<()> {
    if password.is_empty() {
        return Err(Error::weak("password cannot be empty"));
    }
    Ok(())
}

/// Wiping a symlink only unlinks it, so cleaning through one would leave the
/// plaintext that was just encrypted in place.
fn check_clean_source(input: &Path, clean_original: bool) -> Result<()> {
    if clean_original && std::fs::symlink_metadata(input).at(input)?.file_type().is_symlink() {
        return Err(Error::io(input, std::io::Error::new(ErrorKind::InvalidInput, "refusing to clean a symlinked input")));
    }
    Ok(())
}

fn load_key_file(path: Option<&Path>) -> Result<Option<KeyMaterial>> {
    path.map(KeyFile::load).transpose()
}

/// Fills `buffer` as far as the reader allows; returns 0 only at end of input.
fn read_chunk<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;

    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::config::{MIN_CHUNK_SIZE, MIN_ITERATIONS};
    use crate::types::{Cancellation, Progress};

    fn processor() -> Processor {
        Processor::new(Config::default().with_iterations(MIN_ITERATIONS).with_chunk_size(MIN_CHUNK_SIZE).with_passes(1)).unwrap()
    }

    fn password() -> Password {
        Password::from("correct horse battery staple")
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("source.txt");
        let original = b"Hello, World! This is a test file for encryption.";
        fs::write(&src, original).unwrap();

        let p = processor();
        let sealed = p.encrypt(&src, &password(), None, None, false, Hooks::new());
        assert!(sealed.success, "{sealed}");
        let container = sealed.output_path.clone().unwrap();
        assert_eq!(container, dir.path().join("source.txt.zesec"));
        assert_eq!(fs::metadata(&container).unwrap().len(), (original.len() + MIN_CONTAINER_SIZE) as u64);

        let out = dir.path().join("restored.txt");
        let opened = p.decrypt(&container, &password(), None, Some(&out), Hooks::new());
        assert!(opened.success, "{opened}");
        assert_eq!(opened.bytes_processed, original.len() as u64);
        assert_eq!(fs::read(&out).unwrap(), original);
    }

    #[test]
    fn test_multi_chunk_roundtrip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("big.bin");
        let original = sample(MIN_CHUNK_SIZE * 3 + 123);
        fs::write(&src, &original).unwrap();

        let p = processor();
        let container = p.encrypt(&src, &password(), None, None, false, Hooks::new()).output_path.unwrap();
        fs::remove_file(&src).unwrap();

        let opened = p.decrypt(&container, &password(), None, None, Hooks::new());
        assert_eq!(opened.output_path.as_deref(), Some(src.as_path()));
        assert_eq!(fs::read(&src).unwrap(), original);
    }

    #[test]
    fn test_file_container_matches_in_memory_decoder() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("data.bin");
        let original = sample(10_000);
        fs::write(&src, &original).unwrap();

        let p = processor();
        let container = p.encrypt(&src, &password(), None, None, false, Hooks::new()).output_path.unwrap();
        let bytes = fs::read(container).unwrap();

        assert_eq!(p.decrypt_bytes(&bytes, &password(), None).unwrap(), original);
    }

    #[test]
    fn test_empty_file_roundtrip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty");
        fs::write(&src, b"").unwrap();

        let p = processor();
        let container = p.encrypt(&src, &password(), None, None, false, Hooks::new()).output_path.unwrap();
        assert_eq!(fs::metadata(&container).unwrap().len(), MIN_CONTAINER_SIZE as u64);

        let out = dir.path().join("empty.out");
        assert!(p.decrypt(&container, &password(), None, Some(&out), Hooks::new()).success);
        assert!(fs::read(&out).unwrap().is_empty());
    }

    #[test]
    fn test_key_file_roundtrip_and_rejection() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("doc.txt");
        let key = dir.path().join("doc.key");
        let other = dir.path().join("other.key");
        fs::write(&src, b"two factors").unwrap();
        KeyFile::generate(&key, false).unwrap();
        KeyFile::generate(&other, false).unwrap();

        let p = processor();
        let container = p.encrypt(&src, &password(), Some(&key), None, false, Hooks::new()).output_path.unwrap();
        let out = dir.path().join("out.txt");

        let missing = p.decrypt(&container, &password(), None, Some(&out), Hooks::new());
        assert!(missing.error.unwrap().is_authentication());

        let wrong = p.decrypt(&container, &password(), Some(&other), Some(&out), Hooks::new());
        assert!(wrong.error.unwrap().is_authentication());
        assert!(!out.exists());

        let right = p.decrypt(&container, &password(), Some(&key), Some(&out), Hooks::new());
        assert!(right.success);
        assert_eq!(fs::read(&out).unwrap(), b"two factors");
    }

    #[test]
    fn test_wrong_password() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("source.txt");
        fs::write(&src, b"Test content").unwrap();

        let p = processor();
        let container = p.encrypt(&src, &Password::from("correct_password"), None, None, false, Hooks::new()).output_path.unwrap();

        let out = dir.path().join("out.txt");
        let result = p.decrypt(&container, &Password::from("wrong_password"), None, Some(&out), Hooks::new());
        assert!(!result.success);
        assert!(matches!(result.error, Some(Error::Authentication)));
        assert!(result.output_path.is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_tampering_is_detected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("source.txt");
        fs::write(&src, sample(500)).unwrap();

        let p = processor();
        let container = p.encrypt(&src, &password(), None, None, false, Hooks::new()).output_path.unwrap();
        let pristine = fs::read(&container).unwrap();

        // iterations, salt, nonce, ciphertext, tag
        for index in [15, 20, 40, PREAMBLE_SIZE + 10, pristine.len() - 1] {
            let mut bytes = pristine.clone();
            bytes[index] ^= 0x01;
            fs::write(&container, &bytes).unwrap();

            let out = dir.path().join("out.txt");
            let result = p.decrypt(&container, &password(), None, Some(&out), Hooks::new());
            assert!(!result.success, "byte {index}");
            assert!(!out.exists(), "byte {index}");
        }
    }

    #[test]
    fn test_rejects_excessive_iteration_count() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("source.txt");
        fs::write(&src, sample(100)).unwrap();

        let p = processor();
        let container = p.encrypt(&src, &password(), None, None, false, Hooks::new()).output_path.unwrap();
        let mut bytes = fs::read(&container).unwrap();
        bytes[12..16].copy_from_slice(&u32::MAX.to_be_bytes());
        fs::write(&container, &bytes).unwrap();

        let out = dir.path().join("out.txt");
        let result = p.decrypt(&container, &password(), None, Some(&out), Hooks::new());
        assert!(matches!(result.error, Some(Error::MalformedContainer(_))));
        assert!(!out.exists());

        assert!(matches!(p.decrypt_bytes(&bytes, &password(), None), Err(Error::MalformedContainer(_))));
        assert!(matches!(Processor::inspect(&container), Err(Error::MalformedContainer(_))));
    }

    #[test]
    fn test_malformed_container() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("bogus.zesec");
        fs::write(&bogus, b"ZSEC but far too short").unwrap();

        let result = processor().decrypt(&bogus, &password(), None, None, Hooks::new());
        assert!(matches!(result.error, Some(Error::MalformedContainer(_))));
        assert!(!dir.path().join("bogus").exists());
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_encryption() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("same.txt");
        fs::write(&src, b"identical input").unwrap();

        let p = processor();
        let a = p.encrypt(&src, &password(), None, Some(&dir.path().join("a.zesec")), false, Hooks::new()).output_path.unwrap();
        let b = p.encrypt(&src, &password(), None, Some(&dir.path().join("b.zesec")), false, Hooks::new()).output_path.unwrap();

        let a = Preamble::read_from(&mut File::open(&a).unwrap(), &a).unwrap();
        let b = Preamble::read_from(&mut File::open(&b).unwrap(), &b).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_clean_original() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain.txt");
        fs::write(&src, b"wipe me after").unwrap();

        let result = processor().encrypt(&src, &password(), None, None, true, Hooks::new());
        assert!(result.success);
        assert!(!src.exists());
        assert!(result.output_path.unwrap().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_original_refuses_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("plain.txt");
        let link = dir.path().join("link.txt");
        fs::write(&target, b"top secret plaintext").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let result = processor().encrypt(&link, &password(), None, None, true, Hooks::new());

        assert!(!result.success);
        assert!(matches!(result.error, Some(Error::Io { ref source, .. }) if source.kind() == ErrorKind::InvalidInput));
        assert!(result.output_path.is_none());
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&target).unwrap(), b"top secret plaintext");
        assert!(!dir.path().join("link.txt.zesec").exists());

        // Without cleaning, the link is read through as before.
        let result = processor().encrypt(&link, &password(), None, None, false, Hooks::new());
        assert!(result.success, "{result}");
        assert_eq!(fs::read(&target).unwrap(), b"top secret plaintext");
    }

    #[test]
    fn test_cancellation_leaves_no_output() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain.txt");
        fs::write(&src, sample(MIN_CHUNK_SIZE * 4)).unwrap();

        let cancel = Cancellation::new();
        let trigger = |_: Progress| cancel.cancel();
        let hooks = Hooks::new().with_progress(&trigger).with_cancel(&cancel);

        let result = processor().encrypt(&src, &password(), None, None, true, hooks);
        assert!(matches!(result.error, Some(Error::Cancelled)));
        assert!(src.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_rejects_output_equal_to_input() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain.txt");
        fs::write(&src, b"data").unwrap();

        let result = processor().encrypt(&src, &password(), None, Some(&src), false, Hooks::new());
        assert!(matches!(result.error, Some(Error::Io { .. })));
        assert_eq!(fs::read(&src).unwrap(), b"data");
    }

    #[test]
    fn test_weak_parameters_fail_before_io() {
        assert!(matches!(Processor::new(Config::default().with_iterations(MIN_ITERATIONS - 1)), Err(Error::WeakParameter(_))));

        let result = processor().encrypt(Path::new("/definitely/missing"), &Password::new(b""), None, None, false, Hooks::new());
        assert!(matches!(result.error, Some(Error::WeakParameter(_))));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let result = processor().encrypt(&dir.path().join("nope"), &password(), None, None, false, Hooks::new());
        assert!(matches!(result.error, Some(Error::Io { .. })));
    }

    #[test]
    fn test_progress_reaches_total() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("data.bin");
        fs::write(&src, sample(MIN_CHUNK_SIZE * 2 + 7)).unwrap();

        let last = Cell::new(None::<Progress>);
        let record = |p: Progress| last.set(Some(p));
        processor().encrypt(&src, &password(), None, None, false, Hooks::new().with_progress(&record));

        let last = last.get().unwrap();
        assert_eq!(last.phase, Phase::Encrypting);
        assert_eq!(last.processed, last.total);
        assert_eq!(last.total, (MIN_CHUNK_SIZE * 2 + 7) as u64);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let p = processor();
        let material = KeyMaterial::from_vec(vec![9u8; 32]);

        let sealed = p.encrypt_bytes(b"in memory", &password(), Some(&material)).unwrap();
        assert_eq!(sealed.len(), 9 + MIN_CONTAINER_SIZE);
        assert_eq!(p.decrypt_bytes(&sealed, &password(), Some(&material)).unwrap(), b"in memory");
        assert!(p.decrypt_bytes(&sealed, &password(), None).unwrap_err().is_authentication());
    }

    #[test]
    fn test_bytes_header_is_authenticated() {
        let p = processor();
        let mut sealed = p.encrypt_bytes(b"payload", &password(), None).unwrap();

        // Still a valid header, different iteration count.
        sealed[15] ^= 0x01;
        assert!(p.decrypt_bytes(&sealed, &password(), None).is_err());
    }

    #[test]
    fn test_encrypt_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("nested/b.txt"), b"b").unwrap();
        fs::write(dir.path().join("old.zesec"), b"already sealed").unwrap();

        let results = processor().encrypt_directory(dir.path(), &password(), None, true, true, Hooks::new()).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert!(dir.path().join("a.txt.zesec").exists());
        assert!(dir.path().join("nested/b.txt.zesec").exists());
        assert!(!dir.path().join("a.txt").exists());
        assert_eq!(fs::read(dir.path().join("old.zesec")).unwrap(), b"already sealed");
    }

    #[test]
    fn test_encrypt_directory_non_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("nested/b.txt"), b"b").unwrap();

        let results = processor().encrypt_directory(dir.path(), &password(), None, false, false, Hooks::new()).unwrap();

        assert_eq!(results.len(), 1);
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("nested/b.txt.zesec").exists());
    }

    #[test]
    fn test_inspect() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"a").unwrap();

        let container = processor().encrypt(&src, &password(), None, None, false, Hooks::new()).output_path.unwrap();
        let header = Processor::inspect(&container).unwrap();
        assert_eq!(header, Header::new(MIN_ITERATIONS));

        assert!(matches!(Processor::inspect(&src), Err(Error::MalformedContainer(_))));
    }
}
