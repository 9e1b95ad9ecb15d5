//! Authentification HTTP Digest (RFC 2617) des appels SOAP
//!
//! La box répond `401` avec un en-tête `WWW-Authenticate: Digest ...` ; la
//! requête est rejouée une fois avec l'en-tête `Authorization` calculé ici.

use super::Credentials;
use crate::error::{FritzError, Result};
use md5::{Digest, Md5};

/// Paramètres d'un challenge `WWW-Authenticate: Digest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
    pub algorithm: String,
}

impl DigestChallenge {
    /// Vrai si le serveur accepte `qop=auth`
    fn supports_auth_qop(&self) -> bool {
        self.qop
            .as_deref()
            .is_some_and(|qop| qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")))
    }
}

/// Découpe les paramètres `clé=valeur` en respectant les guillemets
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in params.chars().chain(std::iter::once(',')) {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                if let Some((key, value)) = current.split_once('=') {
                    pairs.push((
                        key.trim().to_ascii_lowercase(),
                        value.trim().trim_matches('"').to_string(),
                    ));
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    pairs
}

/// Décode la valeur d'un en-tête `WWW-Authenticate`
pub fn parse_www_authenticate(input: &str) -> Result<DigestChallenge> {
    let invalid = |what: &str| FritzError::invalid_document(format!("digest challenge: {what}"));

    let (scheme, params) = input.trim().split_once(' ').ok_or_else(|| invalid("no parameters"))?;
    if !scheme.eq_ignore_ascii_case("digest") {
        return Err(invalid("unsupported scheme"));
    }

    let mut realm = None;
    let mut nonce = None;
    let mut qop = None;
    let mut opaque = None;
    let mut algorithm = String::from("MD5");

    for (key, value) in split_params(params) {
        match key.as_str() {
            "realm" => realm = Some(value),
            "nonce" => nonce = Some(value),
            "qop" => qop = Some(value),
            "opaque" => opaque = Some(value),
            "algorithm" => algorithm = value,
            _ => {}
        }
    }

    Ok(DigestChallenge {
        realm: realm.ok_or_else(|| invalid("missing realm"))?,
        nonce: nonce.ok_or_else(|| invalid("missing nonce"))?,
        qop,
        opaque,
        algorithm,
    })
}

fn md5_hex(data: &str) -> String {
    hex::encode(Md5::digest(data.as_bytes()))
}

/// Calcule la réponse digest
///
/// Avec `qop=auth` : `MD5(HA1:nonce:nc:cnonce:auth:HA2)`, sinon la forme
/// RFC 2069 `MD5(HA1:nonce:HA2)`.
pub fn compute_digest_response(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
    nc: &str,
    cnonce: &str,
) -> String {
    let ha1 = md5_hex(&format!(
        "{}:{}:{}",
        credentials.username, challenge.realm, credentials.password
    ));
    let ha2 = md5_hex(&format!("{}:{}", method, uri));

    if challenge.supports_auth_qop() {
        md5_hex(&format!("{}:{}:{}:{}:auth:{}", ha1, challenge.nonce, nc, cnonce, ha2))
    } else {
        md5_hex(&format!("{}:{}:{}", ha1, challenge.nonce, ha2))
    }
}

/// Construit la valeur de l'en-tête `Authorization`
pub fn authorization_header(
    challenge: &DigestChallenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
) -> String {
    let nc = "00000001";
    let cnonce = format!("{:016x}", rand::random::<u64>());
    let response = compute_digest_response(challenge, credentials, method, uri, nc, &cnonce);

    let mut header = format!(
        r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}", algorithm={}"#,
        credentials.username, challenge.realm, challenge.nonce, uri, response, challenge.algorithm
    );
    if challenge.supports_auth_qop() {
        header.push_str(&format!(r#", qop=auth, nc={}, cnonce="{}""#, nc, cnonce));
    }
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(r#", opaque="{}""#, opaque));
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mufasa() -> Credentials {
        Credentials::new("Mufasa", "Circle Of Life")
    }

    #[test]
    fn test_parse_challenge_with_quoted_commas() {
        let challenge = parse_www_authenticate(
            r#"Digest realm="HTTPS Access", nonce="A1B2C3", qop="auth,auth-int", opaque="5ccc069c""#,
        )
        .unwrap();
        assert_eq!(challenge.realm, "HTTPS Access");
        assert_eq!(challenge.nonce, "A1B2C3");
        assert_eq!(challenge.qop.as_deref(), Some("auth,auth-int"));
        assert_eq!(challenge.opaque.as_deref(), Some("5ccc069c"));
        assert_eq!(challenge.algorithm, "MD5");
    }

    #[test]
    fn test_rejects_basic_scheme() {
        assert!(parse_www_authenticate(r#"Basic realm="x""#).is_err());
        assert!(parse_www_authenticate(r#"Digest realm="x""#).is_err());
    }

    #[test]
    fn test_rfc2617_reference_vector() {
        let challenge = parse_www_authenticate(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let response = compute_digest_response(
            &challenge,
            &mufasa(),
            "GET",
            "/dir/index.html",
            "00000001",
            "0a4f113b",
        );
        assert_eq!(response, "6629fae49393a05397450978507c4ef1");
    }

    #[test]
    fn test_without_qop() {
        let challenge = parse_www_authenticate(
            r#"Digest realm="testrealm@host.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", algorithm=MD5"#,
        )
        .unwrap();
        let response =
            compute_digest_response(&challenge, &mufasa(), "GET", "/dir/index.html", "", "");
        assert_eq!(response, "670fd8c2df070c60b045671b8b24ff02");

        let header = authorization_header(&challenge, &mufasa(), "GET", "/dir/index.html");
        assert!(header.contains(r#"response="670fd8c2df070c60b045671b8b24ff02""#));
        assert!(!header.contains("qop="));
    }

    #[test]
    fn test_header_fields() {
        let challenge = parse_www_authenticate(
            r#"Digest realm="F!Box SOAP-Auth", nonce="n0", qop="auth""#,
        )
        .unwrap();
        let header =
            authorization_header(&challenge, &mufasa(), "POST", "/upnp/control/x_contact");
        assert!(header.starts_with(r#"Digest username="Mufasa", realm="F!Box SOAP-Auth""#));
        assert!(header.contains(r#"uri="/upnp/control/x_contact""#));
        assert!(header.contains("qop=auth, nc=00000001, cnonce=\""));
    }
}
