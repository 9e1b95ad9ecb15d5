//! Documents `SessionInfo` renvoyés par `login_sid.lua`

use crate::error::{FritzError, Result};
use crate::xml::XmlValue;
use std::fmt;

/// Point d'entrée du login (sans port explicite)
pub const LOGIN_PATH: &str = "/login_sid.lua?version=1";

/// Identifiant de session délivré par la box
///
/// La valeur `0000000000000000` (ou un `<SID>` vide) signale un login refusé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sid(String);

impl Sid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Vrai pour le SID nul (que des zéros) ou vide
    pub fn is_placeholder(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Utilisateur listé dans la réponse de login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub name: String,
    /// Dernier utilisateur connecté
    pub last: bool,
}

/// Contenu décodé d'un document `SessionInfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub sid: Sid,
    pub challenge: String,
    /// Délai imposé avant un nouvel essai, en secondes
    pub block_time: u32,
    pub users: Vec<SessionUser>,
}

impl SessionInfo {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = XmlValue::parse(xml)?;
        let info = doc
            .get("sessioninfo")
            .ok_or_else(|| FritzError::invalid_document("missing SessionInfo element"))?;

        let sid = Sid::new(info.required_text("sid", "SessionInfo")?);
        let challenge = info.child_text("challenge").unwrap_or_default().to_string();
        let block_time = info
            .child_text("blocktime")
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);

        let users = info
            .path(&["users", "user"])
            .map(|users| {
                users
                    .items()
                    .into_iter()
                    .filter_map(|user| {
                        Some(SessionUser {
                            name: user.text()?.to_string(),
                            last: user.attribute("last") == Some("1"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            sid,
            challenge,
            block_time,
            users,
        })
    }
}
