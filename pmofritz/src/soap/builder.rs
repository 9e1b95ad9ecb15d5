//! Construction des requêtes SOAP TR-064

use super::{SOAP_ENCODING_STYLE, SOAP_ENVELOPE_NS};
use crate::catalog::ServiceCatalog;
use crate::error::Result;
use crate::phonebook::PhoneNumber;
use crate::validation::ActionArgs;
use xmltree::{Element, XMLNode};

fn write_document(root: &Element) -> Result<String> {
    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    root.write_with_config(&mut buf, config)?;

    // l'émetteur ne produit que de l'UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn text_element(name: &str, text: &str) -> Element {
    let mut element = Element::new(name);
    // valeur vide : élément auto-fermant
    if !text.is_empty() {
        element.children.push(XMLNode::Text(text.to_string()));
    }
    element
}

/// Construit l'enveloppe SOAP d'un appel d'action
///
/// Les arguments ne sont pas validés ici, voir
/// [`crate::validation::check_arguments`].
///
/// # Arguments
///
/// * `service_type` - URN du service (ex: "urn:dslforum-org:service:X_AVM-DE_OnTel:1")
/// * `action` - Nom de l'action (ex: "GetCallList")
/// * `args` - Arguments, émis dans l'ordre de la map
pub fn build_action_envelope(
    service_type: &str,
    action: &str,
    args: Option<&ActionArgs>,
) -> Result<String> {
    let mut request = Element::new(&format!("u:{}", action));
    request
        .attributes
        .insert("xmlns:u".to_string(), service_type.to_string());

    for (name, value) in args.into_iter().flatten() {
        request.children.push(XMLNode::Element(text_element(name, value)));
    }

    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(request));

    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "s:encodingStyle".to_string(),
        SOAP_ENCODING_STYLE.to_string(),
    );
    envelope
        .attributes
        .insert("xmlns:s".to_string(), SOAP_ENVELOPE_NS.to_string());
    envelope.children.push(XMLNode::Element(body));

    write_document(&envelope)
}

/// Valeur de l'en-tête HTTP `SOAPAction` : `<serviceType>#<action>`
pub fn build_soap_action(catalog: &ServiceCatalog, action: &str, service_id: &str) -> Result<String> {
    let service = catalog.service(service_id)?;
    Ok(format!("{}#{}", service.service_type, action))
}

/// Construit le document d'un contact du répertoire
///
/// Les numéros sont émis dans l'ordre fourni.
pub fn build_phonebook_entry(name: &str, numbers: &[PhoneNumber]) -> Result<String> {
    let mut person = Element::new("person");
    person
        .children
        .push(XMLNode::Element(text_element("realName", name)));

    let mut telephony = Element::new("telephony");
    for number in numbers {
        let mut element = text_element("number", &number.number);
        element
            .attributes
            .insert("type".to_string(), number.kind.as_str().to_string());
        telephony.children.push(XMLNode::Element(element));
    }

    let mut contact = Element::new("contact");
    contact
        .children
        .push(XMLNode::Element(text_element("category", "0")));
    contact.children.push(XMLNode::Element(person));
    contact.children.push(XMLNode::Element(telephony));

    write_document(&contact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::ServiceEntry;
    use crate::phonebook::NumberType;
    use crate::xml::XmlValue;

    const ONTEL: &str = "urn:dslforum-org:service:X_AVM-DE_OnTel:1";

    #[test]
    fn test_envelope_without_arguments() {
        let xml = build_action_envelope(ONTEL, "GetInfo", None).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/""#));
        assert!(xml.contains(r#"xmlns:s="http://schemas.xmlsoap.org/soap/envelope/""#));
        assert!(xml.contains(r#"<u:GetInfo xmlns:u="urn:dslforum-org:service:X_AVM-DE_OnTel:1""#));
        assert!(!xml.contains("</u:GetInfo>"));
    }

    #[test]
    fn test_envelope_arguments_keep_order() {
        let mut args = ActionArgs::new();
        args.insert("NewPhonebookName".to_string(), "Test".to_string());
        args.insert("NewPhonebookExtraID".to_string(), String::new());

        let xml = build_action_envelope(ONTEL, "AddPhonebook", Some(&args)).unwrap();
        assert!(xml.contains("<NewPhonebookName>Test</NewPhonebookName>"));
        assert!(!xml.contains("<NewPhonebookExtraID>"));
        assert!(xml.contains("<NewPhonebookExtraID"));

        // relu comme le ferait la box
        let doc = XmlValue::parse(&xml).unwrap();
        let request = doc.path(&["envelope", "body", "addphonebook"]).unwrap();
        let XmlValue::Node(node) = request else {
            panic!("expected a node, got {request:?}");
        };
        assert_eq!(
            node.attributes.get("u"),
            None,
            "les déclarations de namespace ne sont pas des attributs"
        );
        let echoed = node
            .children
            .iter()
            .map(|(name, value)| (name.as_str(), value.text().unwrap_or_default()))
            .collect::<Vec<_>>();
        assert_eq!(
            echoed,
            vec![("newphonebookname", "Test"), ("newphonebookextraid", "")]
        );
    }

    #[test]
    fn test_argument_values_survive_decoding() {
        let mut args = ActionArgs::new();
        args.insert("NewName".to_string(), "  two  spaces ".to_string());
        args.insert("NewNote".to_string(), " <a & b> ".to_string());

        let xml = build_action_envelope(ONTEL, "SetInfo", Some(&args)).unwrap();
        let doc = XmlValue::parse(&xml).unwrap();
        let request = doc.path(&["envelope", "body", "setinfo"]).unwrap();

        assert_eq!(request.child_text("newname"), Some("  two  spaces "));
        assert_eq!(request.child_text("newnote"), Some(" <a & b> "));
    }

    #[test]
    fn test_soap_action_header() {
        let catalog = ServiceCatalog::from_entries([ServiceEntry {
            service_type: ONTEL.to_string(),
            service_id: "urn:X_AVM-DE_OnTel-com:serviceId:X_AVM-DE_OnTel1".to_string(),
            control_url: "/upnp/control/x_contact".to_string(),
            event_sub_url: String::new(),
            scpd_url: "/x_contactSCPD.xml".to_string(),
        }]);

        assert_eq!(
            build_soap_action(
                &catalog,
                "GetPhonebookList",
                "urn:X_AVM-DE_OnTel-com:serviceId:X_AVM-DE_OnTel1"
            )
            .unwrap(),
            "urn:dslforum-org:service:X_AVM-DE_OnTel:1#GetPhonebookList"
        );
        let err = build_soap_action(&catalog, "", "S").unwrap_err();
        assert_eq!(err.to_string(), "Service S not found");
    }

    #[test]
    fn test_phonebook_entry() {
        let xml = build_phonebook_entry(
            "Test Person",
            &[
                PhoneNumber::new("0552", NumberType::Work),
                PhoneNumber::new("542", NumberType::Home),
            ],
        )
        .unwrap();

        assert!(xml.contains(
            r#"<contact><category>0</category><person><realName>Test Person</realName></person><telephony><number type="work">0552</number><number type="home">542</number></telephony></contact>"#
        ));
    }
}
