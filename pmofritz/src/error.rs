//! Gestion des erreurs pour le client TR-064

use crate::soap::SoapFault;
use thiserror::Error;

/// Type Result personnalisé pour pmofritz
pub type Result<T> = std::result::Result<T, FritzError>;

/// Erreurs possibles lors du dialogue avec la FritzBox
#[derive(Error, Debug)]
pub enum FritzError {
    /// Le login a été refusé (SID nul retourné par la box)
    #[error("Could not login to FritzBox")]
    LoginFailed,

    /// Aucune entrée du catalogue pour ce serviceId
    #[error("Service {0} not found")]
    ServiceNotFound(String),

    /// Le SCPD du service ne déclare aucune action
    #[error("Actions for Service {0} not found")]
    ActionsNotFound(String),

    #[error("Invalid Action {action} for Service {service_id}")]
    InvalidAction { action: String, service_id: String },

    /// Argument fourni mais absent du schéma de l'action
    #[error("Invalid Argument {name} for Action {action}")]
    InvalidArgument { name: String, action: String },

    /// Aucun argument fourni alors que l'action en attend au moins un
    #[error("Missing Argument {name} for Action {action}")]
    MissingArgument { name: String, action: String },

    /// Arguments d'entrée manquants, séparés par des virgules
    #[error("Missing Arguments: {0}")]
    MissingArguments(String),

    /// Erreur SOAP renvoyée par la box
    #[error("{0}")]
    SoapFault(SoapFault),

    /// La box ne répond pas (connexion refusée, timeout)
    #[error("Device unreachable: {0}")]
    DeviceUnreachable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("XML parsing error: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("XML writing error: {0}")]
    XmlWrite(#[from] xmltree::Error),

    /// Document XML valide mais ne respectant pas la structure attendue
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl FritzError {
    pub(crate) fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    /// Vérifie si l'erreur est une erreur de validation des arguments d'une action
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            FritzError::InvalidArgument { .. }
                | FritzError::MissingArgument { .. }
                | FritzError::MissingArguments(_)
        )
    }

    /// Retourne le fault SOAP porté par l'erreur, s'il y en a un
    pub fn soap_fault(&self) -> Option<&SoapFault> {
        match self {
            FritzError::SoapFault(fault) => Some(fault),
            _ => None,
        }
    }
}
