use crate::error::ProtocolError;
use crate::types::UserId;

/// End-to-end cipher for chat message bodies.
///
/// Bodies are encrypted for a specific peer before sending and decrypted
/// after receipt. Key management lives with the implementation.
pub trait MessageCipher: Send + Sync {
    /// Encrypts `plaintext` for `peer`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Cipher` if no key is available for the peer
    /// or encryption fails.
    fn encrypt(&self, plaintext: &str, peer: UserId) -> Result<String, ProtocolError>;

    /// Decrypts `ciphertext` received from `peer`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Cipher` if the body cannot be decrypted.
    fn decrypt(&self, ciphertext: &str, peer: UserId) -> Result<String, ProtocolError>;
}

/// Identity cipher. Bodies travel as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCipher;

impl MessageCipher for PlaintextCipher {
    fn encrypt(&self, plaintext: &str, _peer: UserId) -> Result<String, ProtocolError> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str, _peer: UserId) -> Result<String, ProtocolError> {
        Ok(ciphertext.to_string())
    }
}
