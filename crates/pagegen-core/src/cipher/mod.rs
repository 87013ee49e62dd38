//! Symmetric stream cipher for the published configuration blob
//!
//! The blob is RC4-encrypted UTF-8 JSON, hex encoded for transport.
//! RC4 only obfuscates the fallback credentials against casual reading;
//! it is kept for compatibility with configuration blobs already deployed.

mod rc4;

pub use rc4::Rc4;

use thiserror::Error;

/// Errors produced while decoding or decrypting a configuration blob
#[derive(Error, Debug, PartialEq)]
pub enum CipherError {
    #[error("cipher key is empty")]
    EmptyKey,

    #[error("ciphertext is not valid hex: {0}")]
    InvalidEncoding(#[from] hex::FromHexError),

    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

pub type CipherResult<T> = Result<T, CipherError>;

/// Encrypt `plaintext` under `key` and hex encode the result
pub fn encrypt_to_hex(plaintext: &str, key: &str) -> CipherResult<String> {
    let mut cipher = Rc4::new(key.as_bytes())?;
    let mut buf = plaintext.as_bytes().to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(hex::encode(buf))
}

/// Decode hex `ciphertext` and decrypt it under `key`
pub fn decrypt_from_hex(ciphertext: &str, key: &str) -> CipherResult<String> {
    let mut cipher = Rc4::new(key.as_bytes())?;
    let mut buf = hex::decode(ciphertext.trim())?;
    cipher.apply_keystream(&mut buf);
    String::from_utf8(buf).map_err(|_| CipherError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrypt_recovers_config_json() {
        let json = r#"{"apiUrl":"https://api.example.com/v1","apiKey":"sk-1","modelName":"m"}"#;
        let sealed = encrypt_to_hex(json, "deploy-key").unwrap();
        assert_ne!(sealed, hex::encode(json));
        assert_eq!(decrypt_from_hex(&sealed, "deploy-key").unwrap(), json);
    }

    #[test]
    fn test_known_vector() {
        // Published vector: key "Key", plaintext "Plaintext"
        assert_eq!(encrypt_to_hex("Plaintext", "Key").unwrap(), "bbf316e8d940af0ad3");
        assert_eq!(decrypt_from_hex("BBF316E8D940AF0AD3", "Key").unwrap(), "Plaintext");
    }

    #[test]
    fn test_wrong_key_does_not_yield_plaintext() {
        let sealed = encrypt_to_hex("{\"apiUrl\":\"x\"}", "right").unwrap();
        let opened = decrypt_from_hex(&sealed, "wrong");
        assert_ne!(opened.as_deref(), Ok("{\"apiUrl\":\"x\"}"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(decrypt_from_hex("abcd", ""), Err(CipherError::EmptyKey));
        assert!(matches!(decrypt_from_hex("not hex!", "k"), Err(CipherError::InvalidEncoding(_))));
        assert_eq!(
            decrypt_from_hex("abc", "k"),
            Err(CipherError::InvalidEncoding(hex::FromHexError::OddLength))
        );
        assert_ne!(CipherError::EmptyKey, CipherError::InvalidUtf8);
    }
}
