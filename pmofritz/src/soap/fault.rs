use crate::xml::XmlValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fault SOAP renvoyé par la box
///
/// Les codes UPnP (`errorcode`, `errordescription`) viennent de
/// `detail/UPnPError`. Un champ absent du document reste vide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapFault {
    pub faultcode: String,
    pub faultstring: String,
    pub errorcode: String,
    pub errordescription: String,
}

impl SoapFault {
    /// Extrait le fault d'une réponse décodée, s'il y en a un
    pub fn from_document(doc: &XmlValue) -> Option<SoapFault> {
        let fault = doc.path(&["envelope", "body", "fault"])?;
        let text = |value: Option<&XmlValue>| {
            value
                .and_then(XmlValue::text)
                .unwrap_or_default()
                .to_string()
        };
        let upnp = fault.path(&["detail", "upnperror"]);

        Some(SoapFault {
            faultcode: text(fault.get("faultcode")),
            faultstring: text(fault.get("faultstring")),
            errorcode: text(upnp.and_then(|e| e.get("errorcode"))),
            errordescription: text(upnp.and_then(|e| e.get("errordescription"))),
        })
    }
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
