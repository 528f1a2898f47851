//! Short code generation.
//!
//! Codes are drawn from a 62-character alphanumeric alphabet using the
//! operating system CSPRNG. Each character index is sampled uniformly by
//! rejecting random bytes that would bias a plain modulo.

/// Characters a generated code may contain.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the alphabet size that fits in a byte (62 * 4).
/// Bytes at or above this bound are discarded.
const REJECTION_BOUND: u8 = 248;

/// The operating system entropy source failed.
#[derive(Debug, thiserror::Error)]
#[error("random source failure: {0}")]
pub struct RandomSourceError(pub String);

/// Produces candidate short codes.
///
/// Uniqueness is not this trait's concern: callers check candidates against
/// the store and retry.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> Result<String, RandomSourceError>;
}

/// [`CodeGenerator`] backed by `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self, length: usize) -> Result<String, RandomSourceError> {
        generate_code(length)
    }
}

/// Generates a random code of exactly `length` characters from [`ALPHABET`].
///
/// # Errors
///
/// Returns [`RandomSourceError`] if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(6)?;
/// assert_eq!(code.len(), 6);
/// assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
/// ```
pub fn generate_code(length: usize) -> Result<String, RandomSourceError> {
    let mut code = String::with_capacity(length);
    // Oversized buffer so a single fill usually covers the rejected bytes too.
    let mut buffer = [0u8; 32];

    while code.len() < length {
        getrandom::fill(&mut buffer).map_err(|e| RandomSourceError(e.to_string()))?;

        for &byte in buffer.iter().filter(|&&b| b < REJECTION_BOUND) {
            if code.len() == length {
                break;
            }
            code.push(ALPHABET[(byte % 62) as usize] as char);
        }
    }

    Ok(code)
}
