//! Identifiers and the streaming hasher that produces them
//!
//! Both identifier roles are SHA-256 digests. `ActionId` names a computation,
//! `OutputId` names a blob of content; they are separate types so the two can
//! never be swapped by accident.

use crate::errors::{CacheError, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Write};

/// Size in bytes of every identifier
pub const ID_SIZE: usize = 32;

/// URL-safe alphabet, padded on encode, padding optional on decode
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; ID_SIZE]);

        impl $name {
            /// Wrap raw digest bytes
            #[must_use]
            pub const fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
                Self(bytes)
            }

            /// Raw digest bytes
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; ID_SIZE] {
                &self.0
            }

            /// Lowercase hex encoding, as used in file names
            #[must_use]
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse a lowercase or uppercase hex encoding
            pub fn from_hex(input: &str) -> Result<Self> {
                let mut bytes = [0u8; ID_SIZE];
                hex::decode_to_slice(input, &mut bytes)
                    .map_err(|e| CacheError::malformed(input, e.to_string()))?;
                Ok(Self(bytes))
            }

            /// URL-safe base64 encoding, as used in remote protocol paths
            #[must_use]
            pub fn to_base64url(&self) -> String {
                URL_SAFE_LENIENT.encode(self.0)
            }

            /// Parse a URL-safe base64 segment.
            ///
            /// The decoded length must be exactly [`ID_SIZE`].
            pub fn from_base64url(input: &str) -> Result<Self> {
                let decoded = URL_SAFE_LENIENT
                    .decode(input)
                    .map_err(|e| CacheError::malformed(input, e.to_string()))?;
                let bytes: [u8; ID_SIZE] = decoded.as_slice().try_into().map_err(|_| {
                    CacheError::malformed(
                        input,
                        format!("decoded to {} bytes, expected {ID_SIZE}", decoded.len()),
                    )
                })?;
                Ok(Self(bytes))
            }

            /// Two-hex-digit shard directory name
            #[must_use]
            pub fn shard(&self) -> String {
                hex::encode(&self.0[..1])
            }
        }

        impl From<[u8; ID_SIZE]> for $name {
            fn from(bytes: [u8; ID_SIZE]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

identifier! {
    /// Cache action key: the hash of a complete description of a repeatable
    /// computation (command line, relevant environment, input contents).
    ActionId
}

identifier! {
    /// Cache output key: the hash of the output of a computation.
    OutputId
}

impl ActionId {
    /// Hash a full computation description into an action key
    #[must_use]
    pub fn new(description: &[u8]) -> Self {
        sum(description)
    }

    /// Derive the key for a command invocation.
    ///
    /// The description is the decimal argument count, a NUL, every argument
    /// followed by a NUL, and finally the digest of the piped input if any.
    /// Arguments are hashed as raw OS bytes and need not be UTF-8.
    #[must_use]
    pub fn from_command<S: AsRef<OsStr>>(args: &[S], stdin_digest: Option<&[u8; ID_SIZE]>) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(format!("{}\0", args.len()).as_bytes());
        for arg in args {
            hasher.update(arg.as_ref().as_encoded_bytes());
            hasher.update(b"\0");
        }
        if let Some(digest) = stdin_digest {
            hasher.update(digest);
        }
        hasher.finish()
    }
}

impl OutputId {
    /// Content address of a byte slice
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        sum(content)
    }
}

/// One-shot digest of a byte slice
#[must_use]
pub fn sum<T: From<[u8; ID_SIZE]>>(bytes: &[u8]) -> T {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finish()
}

/// Incremental SHA-256 accumulator
#[derive(Clone, Default)]
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Finalize into any identifier type (or a raw `[u8; ID_SIZE]`)
    #[must_use]
    pub fn finish<T: From<[u8; ID_SIZE]>>(self) -> T {
        let mut digest = [0u8; ID_SIZE];
        digest.copy_from_slice(&self.inner.finalize());
        T::from(digest)
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}

/// Writer adapter that hashes and counts everything passing through it
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    hasher: Hasher,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            written: 0,
        }
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Return the wrapped writer, the digest, and the byte count
    pub fn finish<T: From<[u8; ID_SIZE]>>(self) -> (W, T, u64) {
        (self.inner, self.hasher.finish(), self.written)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let id = OutputId::of(b"hello");
        assert_eq!(
            id.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(id.shard(), "2c");
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut hasher = Hasher::new();
        hasher.update(b"hel");
        hasher.update(b"lo");
        let streamed: OutputId = hasher.finish();
        assert_eq!(streamed, OutputId::of(b"hello"));
    }

    #[test]
    fn test_hashing_writer_counts_and_hashes() {
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"def").unwrap();
        assert_eq!(writer.written(), 6);

        let (buffer, id, size): (Vec<u8>, OutputId, u64) = writer.finish();
        assert_eq!(buffer, b"abcdef");
        assert_eq!(size, 6);
        assert_eq!(id, OutputId::of(b"abcdef"));
    }

    #[test]
    fn test_base64url_accepts_padded_and_unpadded() {
        let id = ActionId::new(b"echo hi");
        let padded = id.to_base64url();
        assert!(padded.ends_with('='));
        assert_eq!(ActionId::from_base64url(&padded).unwrap(), id);
        assert_eq!(
            ActionId::from_base64url(padded.trim_end_matches('=')).unwrap(),
            id
        );
    }

    #[test]
    fn test_base64url_rejects_wrong_length() {
        let short = URL_SAFE_LENIENT.encode([7u8; ID_SIZE - 1]);
        let long = URL_SAFE_LENIENT.encode([7u8; ID_SIZE + 1]);

        assert!(matches!(
            ActionId::from_base64url(&short),
            Err(CacheError::Malformed { .. })
        ));
        assert!(matches!(
            ActionId::from_base64url(&long),
            Err(CacheError::Malformed { .. })
        ));
        assert!(matches!(
            ActionId::from_base64url("not-valid-base64!!"),
            Err(CacheError::Malformed { .. })
        ));
    }

    #[test]
    fn test_hex_round_trip_and_rejection() {
        let id = ActionId::new(b"x");
        assert_eq!(ActionId::from_hex(&id.to_hex()).unwrap(), id);
        assert!(ActionId::from_hex("abcd").is_err());
        assert!(ActionId::from_hex(&"zz".repeat(ID_SIZE)).is_err());
    }

    #[test]
    fn test_command_key_is_argument_boundary_sensitive() {
        let joined = ActionId::from_command(&["echo", "a b"], None);
        let split = ActionId::from_command(&["echo", "a", "b"], None);
        let glued = ActionId::from_command(&["echoa", "b"], None);
        assert_ne!(joined, split);
        assert_ne!(split, glued);

        let digest = [1u8; ID_SIZE];
        let with_stdin = ActionId::from_command(&["cat"], Some(&digest));
        assert_ne!(with_stdin, ActionId::from_command(&["cat"], None));
        assert_eq!(with_stdin, ActionId::from_command(&["cat"], Some(&digest)));
    }

    #[test]
    fn test_command_key_layout() {
        let expected = ActionId::new(b"2\0echo\0hi\0");
        assert_eq!(ActionId::from_command(&["echo", "hi"], None), expected);
        assert_eq!(
            ActionId::from_command(&[String::from("echo"), String::from("hi")], None),
            expected
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_command_key_accepts_non_utf8_arguments() {
        use std::os::unix::ffi::OsStrExt;

        let latin1 = OsStr::from_bytes(b"caf\xe9");
        let action = ActionId::from_command(&[OsStr::new("cat"), latin1], None);

        assert_eq!(action, ActionId::new(b"2\0cat\0caf\xe9\0"));
        assert_ne!(action, ActionId::from_command(&["cat", "caf\u{e9}"], None));
    }
}
