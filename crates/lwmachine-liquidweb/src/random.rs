//! Random hostnames and passwords
//!
//! Callers own the generator; nothing here touches process-wide random state.

use rand::Rng;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ01234567890123456789";
const WITH_SPECIAL: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ01234567890123456789#_@$%";

/// Random string of `length` characters, optionally including `#_@$%`
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, length: usize, special: bool) -> String {
    let charset = if special { WITH_SPECIAL } else { ALPHANUMERIC };
    (0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Hostname of the form `dockerhost-<3>.<10>.io`
pub fn random_hostname<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "dockerhost-{}.{}.io",
        random_string(rng, 3, false),
        random_string(rng, 10, false)
    )
}
