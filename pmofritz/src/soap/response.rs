use super::SoapFault;
use crate::error::{FritzError, Result};
use crate::xml::XmlValue;
use tracing::warn;

/// Décode une réponse SOAP
///
/// Retourne le document complet (racine anonyme, voir [`XmlValue::parse`])
/// ou `FritzError::SoapFault` si le corps contient un fault.
pub fn decode_soap_response(xml: &str) -> Result<XmlValue> {
    let doc = XmlValue::parse(xml)?;

    if let Some(fault) = SoapFault::from_document(&doc) {
        warn!(
            faultcode = %fault.faultcode,
            errorcode = %fault.errorcode,
            "SOAP fault: {}",
            fault.errordescription
        );
        return Err(FritzError::SoapFault(fault));
    }

    Ok(doc)
}

/// Lit `envelope.body.<action>response.<field>` dans une réponse décodée
pub fn response_field<'a>(doc: &'a XmlValue, action: &str, field: &str) -> Option<&'a str> {
    let response = format!("{}response", action);
    doc.path(&["envelope", "body", response.as_str(), field])
        .and_then(XmlValue::text)
}
