//! Extension pour lire la configuration de la FritzBox depuis pmoconfig
//!
//! Ce module fournit le trait `FritzConfigExt` qui ajoute à
//! `pmoconfig::Config` les accesseurs de la section `fritzbox`.

use anyhow::{anyhow, Result};
use pmoconfig::{Config, encryption};
use serde_yaml::Value;

/// Adresse utilisée quand la configuration n'en fournit pas
pub const DEFAULT_ADDRESS: &str = "fritz.box";

/// Trait d'extension pour la section `fritzbox` de la configuration
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmofritz::FritzConfigExt;
///
/// let config = get_config();
/// let (username, password) = config.get_fritzbox_credentials()?;
/// println!("FritzBox user: {}", username);
/// ```
pub trait FritzConfigExt {
    /// Adresse IP ou nom d'hôte de la box (défaut : `fritz.box`)
    fn get_fritzbox_address(&self) -> Result<String>;

    fn set_fritzbox_address(&self, address: &str) -> Result<()>;

    /// Nom d'utilisateur (peut être vide pour un login sans utilisateur)
    fn get_fritzbox_username(&self) -> Result<String>;

    fn set_fritzbox_username(&self, username: &str) -> Result<()>;

    /// Mot de passe en clair
    ///
    /// Une valeur `encrypted:...` est déchiffrée avec la clé de la machine,
    /// une valeur sans préfixe est rendue telle quelle.
    ///
    /// # Errors
    ///
    /// Retourne une erreur si le mot de passe n'est pas configuré ou ne se
    /// déchiffre pas (fichier venant d'une autre machine)
    fn get_fritzbox_password(&self) -> Result<String>;

    /// Enregistre le mot de passe chiffré (`encrypted:...`)
    fn set_fritzbox_password(&self, password: &str) -> Result<()>;

    /// Récupère les credentials (username, password)
    fn get_fritzbox_credentials(&self) -> Result<(String, String)>;

    /// HTTPS (ports 443/49443) plutôt que HTTP (ports 80/49000)
    fn get_fritzbox_secure(&self) -> Result<bool>;

    fn set_fritzbox_secure(&self, secure: bool) -> Result<()>;

    /// Accepte le certificat auto-signé de la box en HTTPS
    fn get_fritzbox_accept_invalid_certs(&self) -> Result<bool>;
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl FritzConfigExt for Config {
    fn get_fritzbox_address(&self) -> Result<String> {
        match self.get_value(&["fritzbox", "address"]).ok().and_then(scalar_to_string) {
            Some(address) if !address.is_empty() => Ok(address),
            _ => Ok(DEFAULT_ADDRESS.to_string()),
        }
    }

    fn set_fritzbox_address(&self, address: &str) -> Result<()> {
        self.set_value(&["fritzbox", "address"], Value::String(address.to_string()))
    }

    fn get_fritzbox_username(&self) -> Result<String> {
        Ok(self
            .get_value(&["fritzbox", "username"])
            .ok()
            .and_then(scalar_to_string)
            .unwrap_or_default())
    }

    fn set_fritzbox_username(&self, username: &str) -> Result<()> {
        self.set_value(&["fritzbox", "username"], Value::String(username.to_string()))
    }

    fn get_fritzbox_password(&self) -> Result<String> {
        let stored = self
            .get_value(&["fritzbox", "password"])
            .ok()
            .and_then(scalar_to_string)
            .filter(|password| !password.is_empty())
            .ok_or_else(|| anyhow!("FritzBox password not configured"))?;

        encryption::get_password(&stored).map_err(|e| anyhow!("Failed to decrypt FritzBox password: {}", e))
    }

    fn set_fritzbox_password(&self, password: &str) -> Result<()> {
        let encrypted = encryption::encrypt_password(password)?;
        self.set_value(&["fritzbox", "password"], Value::String(encrypted))
    }

    fn get_fritzbox_credentials(&self) -> Result<(String, String)> {
        let username = self.get_fritzbox_username()?;
        let password = self.get_fritzbox_password()?;
        Ok((username, password))
    }

    fn get_fritzbox_secure(&self) -> Result<bool> {
        match self.get_value(&["fritzbox", "secure"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => Ok(false),
        }
    }

    fn set_fritzbox_secure(&self, secure: bool) -> Result<()> {
        self.set_value(&["fritzbox", "secure"], Value::Bool(secure))
    }

    fn get_fritzbox_accept_invalid_certs(&self) -> Result<bool> {
        match self.get_value(&["fritzbox", "accept_invalid_certs"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config.get_fritzbox_address().unwrap(), "fritz.box");
        assert_eq!(config.get_fritzbox_username().unwrap(), "");
        assert!(!config.get_fritzbox_secure().unwrap());
        assert!(config.get_fritzbox_accept_invalid_certs().unwrap());
        assert!(config.get_fritzbox_password().is_err());
    }

    #[test]
    fn test_configured_values() {
        let config = Config::from_yaml_str(
            "fritzbox:\n  address: 192.168.178.1\n  username: admin\n  password: 1234\n  secure: true\n",
        )
        .unwrap();
        assert_eq!(config.get_fritzbox_address().unwrap(), "192.168.178.1");
        assert_eq!(
            config.get_fritzbox_credentials().unwrap(),
            ("admin".to_string(), "1234".to_string())
        );
        assert!(config.get_fritzbox_secure().unwrap());
    }

    #[test]
    fn test_setters_in_memory() {
        let config = Config::from_yaml_str("{}").unwrap();
        config.set_fritzbox_address("box.local").unwrap();
        config.set_fritzbox_username("user").unwrap();
        config.set_fritzbox_secure(true).unwrap();
        assert_eq!(config.get_fritzbox_address().unwrap(), "box.local");
        assert_eq!(config.get_fritzbox_username().unwrap(), "user");
        assert!(config.get_fritzbox_secure().unwrap());
    }

    #[test]
    fn test_password_stored_encrypted() {
        let config = Config::from_yaml_str("{}").unwrap();
        config.set_fritzbox_password("äbc secret").unwrap();

        let stored = match config.get_value(&["fritzbox", "password"]).unwrap() {
            Value::String(s) => s,
            other => panic!("unexpected value {other:?}"),
        };
        assert!(encryption::is_encrypted(&stored));
        assert!(!stored.contains("secret"));

        assert_eq!(config.get_fritzbox_password().unwrap(), "äbc secret");
    }

    #[test]
    fn test_encrypted_password_in_yaml() {
        let encrypted = encryption::encrypt_password("1234").unwrap();
        let config = Config::from_yaml_str(&format!("fritzbox:\n  password: \"{encrypted}\"\n")).unwrap();
        assert_eq!(config.get_fritzbox_password().unwrap(), "1234");
    }

    #[test]
    fn test_undecryptable_password() {
        // chiffré sur une autre machine ou corrompu
        let config = Config::from_yaml_str("fritzbox:\n  password: \"encrypted:AAAAAAAAAAAAAAAAAAAAAAAAAAAA\"\n").unwrap();
        assert!(config.get_fritzbox_password().is_err());
    }
}
