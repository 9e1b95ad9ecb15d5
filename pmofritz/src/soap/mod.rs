//! Couche SOAP 1.1 : construction des requêtes et décodage des réponses

mod builder;
mod fault;
mod response;

pub use builder::{build_action_envelope, build_phonebook_entry, build_soap_action};
pub use fault::SoapFault;
pub use response::{decode_soap_response, response_field};

/// Namespace de l'enveloppe SOAP 1.1
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Style d'encodage déclaré sur l'enveloppe
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Content-Type des requêtes SOAP
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
