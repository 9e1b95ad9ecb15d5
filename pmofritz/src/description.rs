//! Vue typée de la description TR-064 (`/tr64desc.xml`)

use crate::error::{FritzError, Result};
use crate::xml::XmlValue;
use serde::Serialize;

/// Chemin de la description TR-064 sur la box
pub const TR64_DESCRIPTION_PATH: &str = "/tr64desc.xml";

/// Un service exposé par la box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    /// URN du service (ex: "urn:dslforum-org:service:X_AVM-DE_OnTel:1")
    pub service_type: String,
    /// Identifiant unique, clé du catalogue
    pub service_id: String,
    /// Chemin du point de contrôle SOAP
    pub control_url: String,
    pub event_sub_url: String,
    /// Chemin du document SCPD
    pub scpd_url: String,
}

impl ServiceEntry {
    fn from_xml(service: &XmlValue) -> Result<Self> {
        let context = "service";
        Ok(Self {
            service_type: service.required_text("servicetype", context)?,
            service_id: service.required_text("serviceid", context)?,
            control_url: service.required_text("controlurl", context)?,
            event_sub_url: service
                .child_text("eventsuburl")
                .unwrap_or_default()
                .to_string(),
            scpd_url: service.required_text("scpdurl", context)?,
        })
    }
}

/// Informations d'identification du device racine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_type: Option<String>,
    pub friendly_name: Option<String>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub udn: Option<String>,
}

/// Description TR-064 décodée
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescription {
    pub device: DeviceInfo,
    /// Services du device racine, dans l'ordre du document
    pub services: Vec<ServiceEntry>,
}

impl DeviceDescription {
    /// Décode `tr64desc.xml`
    ///
    /// Seule la `serviceList` du device racine est prise en compte. Un
    /// document sans service est rejeté.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = XmlValue::parse(xml)?;
        let device = doc
            .path(&["root", "device"])
            .ok_or_else(|| FritzError::invalid_document("missing root.device in description"))?;

        let info = DeviceInfo {
            device_type: device.child_text("devicetype").map(str::to_string),
            friendly_name: device.child_text("friendlyname").map(str::to_string),
            manufacturer: device.child_text("manufacturer").map(str::to_string),
            model_name: device.child_text("modelname").map(str::to_string),
            udn: device.child_text("udn").map(str::to_string),
        };

        let services = device
            .path(&["servicelist", "service"])
            .ok_or_else(|| FritzError::invalid_document("no service in device description"))?
            .items()
            .into_iter()
            .map(ServiceEntry::from_xml)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            device: info,
            services,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:dslforum-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:dslforum-org:device:InternetGatewayDevice:1</deviceType>
    <friendlyName>FRITZ!Box 7590</friendlyName>
    <manufacturer>AVM</manufacturer>
    <modelName>FRITZ!Box 7590</modelName>
    <UDN>uuid:739f2409-bccb-40e7-8e6c-3431C4AE4F5C</UDN>
    <serviceList>
      <service>
        <serviceType>urn:dslforum-org:service:DeviceInfo:1</serviceType>
        <serviceId>urn:DeviceInfo-com:serviceId:DeviceInfo1</serviceId>
        <controlURL>/upnp/control/deviceinfo</controlURL>
        <eventSubURL>/upnp/control/deviceinfo</eventSubURL>
        <SCPDURL>/deviceinfoSCPD.xml</SCPDURL>
      </service>
      <service>
        <serviceType>urn:dslforum-org:service:X_AVM-DE_OnTel:1</serviceType>
        <serviceId>urn:X_AVM-DE_OnTel-com:serviceId:X_AVM-DE_OnTel1</serviceId>
        <controlURL>/upnp/control/x_contact</controlURL>
        <eventSubURL>/upnp/control/x_contact</eventSubURL>
        <SCPDURL>/x_contactSCPD.xml</SCPDURL>
      </service>
    </serviceList>
  </device>
</root>"#;

    #[test]
    fn test_parse_description() {
        let description = DeviceDescription::from_xml(DESCRIPTION).unwrap();
        assert_eq!(
            description.device.friendly_name.as_deref(),
            Some("FRITZ!Box 7590")
        );
        assert_eq!(description.services.len(), 2);

        let ontel = &description.services[1];
        assert_eq!(
            ontel.service_id,
            "urn:X_AVM-DE_OnTel-com:serviceId:X_AVM-DE_OnTel1"
        );
        assert_eq!(ontel.service_type, "urn:dslforum-org:service:X_AVM-DE_OnTel:1");
        assert_eq!(ontel.control_url, "/upnp/control/x_contact");
        assert_eq!(ontel.scpd_url, "/x_contactSCPD.xml");
    }

    #[test]
    fn test_single_service() {
        let xml = r#"<root><device><serviceList><service>
            <serviceType>urn:t</serviceType><serviceId>urn:id</serviceId>
            <controlURL>/c</controlURL><SCPDURL>/s.xml</SCPDURL>
        </service></serviceList></device></root>"#;
        let description = DeviceDescription::from_xml(xml).unwrap();
        assert_eq!(description.services.len(), 1);
        assert_eq!(description.services[0].event_sub_url, "");
    }

    #[test]
    fn test_description_without_services() {
        let xml = "<root><device><serviceList/></device></root>";
        assert!(matches!(
            DeviceDescription::from_xml(xml),
            Err(FritzError::InvalidDocument(_))
        ));
    }
}
