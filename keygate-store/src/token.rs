use rand::RngCore;
use std::fmt::Write;

/// `len` bytes from the thread-local CSPRNG, lowercase hex encoded.
///
/// `rand::rng()` is ChaCha-based and seeded from the OS, so the output is
/// safe to use as a secret.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(len * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
