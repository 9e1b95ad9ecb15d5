//! Chiffrement des secrets stockés dans `config.yaml`
//!
//! Les mots de passe (celui de la FritzBox en particulier) sont écrits sous
//! la forme `encrypted:BASE64`, où BASE64 encode `nonce(12 octets) + ciphertext`
//! AES-256-GCM. La clé est dérivée de l'identifiant de la machine : un
//! fichier de configuration copié ailleurs ne se déchiffre pas.
//!
//! Une valeur sans préfixe est lue telle quelle, ce qui permet d'éditer le
//! fichier à la main avec un mot de passe en clair.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Préfixe des valeurs chiffrées
pub const ENCRYPTED_PREFIX: &str = "encrypted:";

const KEY_SALT: &[u8] = b"pmofritz-config-encryption-v1";
const NONCE_SALT: &[u8] = b"pmofritz-nonce-v1";
const NONCE_LEN: usize = 12;

/// Identifiant stable de la machine
///
/// - Linux : `/etc/machine-id`, puis `/var/lib/dbus/machine-id`
/// - macOS : `IOPlatformUUID` d'après `ioreg`
/// - Windows : `wmic csproduct get UUID`
fn machine_id() -> Result<String> {
    #[cfg(target_os = "linux")]
    {
        ["/etc/machine-id", "/var/lib/dbus/machine-id"]
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .map(|id| id.trim().to_string())
            .find(|id| !id.is_empty())
            .ok_or_else(|| anyhow!("Failed to read machine-id"))
    }

    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("ioreg")
            .args(["-d2", "-c", "IOPlatformExpertDevice"])
            .output()?;

        // "IOPlatformUUID" = "XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX"
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .find(|line| line.contains("IOPlatformUUID"))
            .and_then(|line| line.split('"').nth(3))
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Failed to extract IOPlatformUUID from ioreg"))
    }

    #[cfg(target_os = "windows")]
    {
        let output = std::process::Command::new("wmic")
            .args(["csproduct", "get", "UUID"])
            .output()?;

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .nth(1)
            .map(|line| line.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow!("Failed to extract UUID from wmic"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        Err(anyhow!("Unsupported platform for machine id extraction"))
    }
}

fn derive_key(seed: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(KEY_SALT);

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

fn machine_key() -> Result<[u8; 32]> {
    Ok(derive_key(&machine_id()?))
}

fn encrypt_with_key(key: &[u8; 32], password: &str) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    // Nonce dérivé du mot de passe : même mot de passe, même valeur écrite
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(NONCE_SALT);
    let digest = hasher.finalize();
    let nonce_bytes = &digest[..NONCE_LEN];

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce_bytes), password.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(format!("{}{}", ENCRYPTED_PREFIX, STANDARD.encode(&combined)))
}

fn decrypt_with_key(key: &[u8; 32], encrypted: &str) -> Result<String> {
    let data = encrypted
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid encrypted password format (missing prefix)"))?;

    let combined = STANDARD
        .decode(data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;
    if combined.len() < NONCE_LEN {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }
    let (nonce, ciphertext) = combined.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// Chiffre `password` avec la clé de la machine
///
/// ```rust,ignore
/// let stored = encrypt_password("secret")?;
/// assert!(stored.starts_with("encrypted:"));
/// ```
pub fn encrypt_password(password: &str) -> Result<String> {
    encrypt_with_key(&machine_key()?, password)
}

/// Déchiffre une valeur `encrypted:...`
///
/// # Errors
///
/// Préfixe absent, base64 invalide, ou valeur chiffrée sur une autre machine.
pub fn decrypt_password(encrypted: &str) -> Result<String> {
    decrypt_with_key(&machine_key()?, encrypted)
}

pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Mot de passe en clair, que la valeur stockée soit chiffrée ou non
pub fn get_password(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_password(value)
    } else {
        Ok(value.to_string())
    }
}
