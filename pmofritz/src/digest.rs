//! Réponse au challenge du login `login_sid.lua`
//!
//! La box envoie un challenge ; la réponse attendue est
//! `<challenge>-<md5(challenge-password)>`, le MD5 étant calculé sur
//! l'encodage UTF-16LE de la chaîne. Les caractères hors Latin-1 du mot de
//! passe sont remplacés par `.` avant le calcul, comme le fait le firmware.
//!
//! Voir la note technique AVM « Session ID » (version du 2021-05-03).

use md5::{Digest, Md5};

/// Calcule la réponse au challenge de login
///
/// # Exemple
///
/// ```
/// use pmofritz::digest::compute_response;
///
/// assert_eq!(
///     compute_response("challenge", "password"),
///     "challenge-086fa48e27e8826c94437d10380e11ba"
/// );
/// ```
pub fn compute_response(challenge: &str, password: &str) -> String {
    let together = format!("{}-{}", challenge, fix_password(password));
    format!("{}-{}", challenge, utf16le_md5_hex(&together))
}

/// Remplace chaque unité UTF-16 supérieure à 255 par un `.`
///
/// Un caractère hors plan de base (emoji…) occupe deux unités UTF-16 et
/// produit donc deux points.
pub fn fix_password(input: &str) -> String {
    let mut fixed = String::with_capacity(input.len());
    for c in input.chars() {
        if u32::from(c) > 255 {
            fixed.extend(std::iter::repeat_n('.', c.len_utf16()));
        } else {
            fixed.push(c);
        }
    }
    fixed
}

/// MD5 hexadécimal de la chaîne encodée en UTF-16LE
pub fn utf16le_md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    for unit in input.encode_utf16() {
        hasher.update(unit.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_response() {
        assert_eq!(
            compute_response("challenge", "password"),
            "challenge-086fa48e27e8826c94437d10380e11ba"
        );
        assert_eq!(
            compute_response("ec9ef619", "57hsbj§$"),
            "ec9ef619-5b45550d9d5a4956449aea4574d3e110"
        );
    }

    #[test]
    fn test_response_format() {
        for (challenge, password) in [("1234567z", "äbc"), ("", ""), ("abc", "😋😋")] {
            let response = compute_response(challenge, password);
            let (prefix, hash) = response.rsplit_once('-').unwrap();
            assert_eq!(prefix, challenge);
            assert_eq!(hash.len(), 32);
            assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
            // déterministe
            assert_eq!(response, compute_response(challenge, password));
        }
    }

    #[test]
    fn test_fix_password() {
        assert_eq!(fix_password("password"), "password");
        assert_eq!(fix_password("password1@test"), "password1@test");
        assert_eq!(fix_password("😋s😋¶Ħ"), "..s..¶.");
    }

    #[test]
    fn test_fix_password_idempotent() {
        for input in ["😋s😋¶Ħ", "Grüße€", "plain"] {
            let once = fix_password(input);
            assert_eq!(fix_password(&once), once);
            assert!(once.chars().all(|c| u32::from(c) <= 255));
        }
    }

    #[test]
    fn test_utf16le_md5_hex() {
        assert_eq!(
            utf16le_md5_hex("ashsadhjhagb"),
            "cb9b86a5caf164041fc409c77910090d"
        );
        assert_eq!(utf16le_md5_hex("string"), "b80467f35b449736162b64cbaa3a2a2d");
        assert_eq!(utf16le_md5_hex("test"), "c8059e2ec7419f590e79d7f1b774bfe6");
    }
}
