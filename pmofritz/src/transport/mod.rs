//! Accès réseau du client
//!
//! Le client ne parle à la box qu'à travers le trait [`Transport`], ce qui
//! permet de le piloter avec des documents enregistrés dans les tests.
//! [`HttpTransport`] est l'implémentation `reqwest` utilisée par défaut.

pub mod digest_auth;
mod http;

pub use http::{HttpTransport, HttpTransportBuilder};

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Identifiants utilisés pour le login et le digest HTTP
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Échanges HTTP nécessaires au protocole
///
/// Chaque méthode retourne le corps de la réponse en texte.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET simple ; un statut non 2xx est une erreur
    async fn get(&self, url: &str) -> Result<String>;

    /// POST `application/x-www-form-urlencoded` ; un statut non 2xx est une erreur
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<String>;

    /// POST d'une enveloppe SOAP
    ///
    /// Le corps est retourné quel que soit le statut : les faults SOAP
    /// arrivent avec un HTTP 500.
    async fn post_soap(
        &self,
        url: &str,
        soap_action: &str,
        body: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String>;
}
