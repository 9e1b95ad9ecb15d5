//! Décodage XML en arbre typé
//!
//! Les documents TR-064 (description, SCPD, login, réponses SOAP) sont
//! décodés en un arbre [`XmlValue`] avant d'être projetés sur des vues
//! typées. Règles de normalisation :
//!
//! - noms d'éléments et d'attributs en minuscules, préfixes de namespace retirés ;
//! - le texte est conservé sans rognage ; un texte fait uniquement de blancs
//!   compte comme absent ;
//! - un élément sans attribut ni enfant devient [`XmlValue::Text`] (chaîne vide si vide) ;
//! - sinon il devient un [`XmlNode`] : attributs, texte (seulement s'il n'est
//!   pas blanc) et enfants indexés par nom ;
//! - des frères de même nom sont regroupés dans un [`XmlValue::List`] ordonné.
//!
//! Sérialisé en JSON, l'arbre utilise `$` pour les attributs et `_` pour le texte.

use crate::error::{FritzError, Result};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use xmltree::{Element, XMLNode};

/// Noeud de l'arbre décodé
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    /// Élément feuille sans attribut
    Text(String),
    /// Élément avec attributs et/ou enfants
    Node(XmlNode),
    /// Éléments frères portant le même nom, dans l'ordre du document
    List(Vec<XmlValue>),
}

/// Élément structuré : attributs, texte éventuel et enfants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub attributes: IndexMap<String, String>,
    pub text: Option<String>,
    pub children: IndexMap<String, XmlValue>,
}

impl XmlValue {
    /// Décode un document XML complet
    ///
    /// Le résultat est un noeud anonyme dont l'unique enfant est l'élément
    /// racine, indexé par son nom normalisé.
    ///
    /// ```
    /// use pmofritz::xml::XmlValue;
    ///
    /// let doc = XmlValue::parse(r#"<u:Root xmlns:u="urn:x"><Item>1</Item><Item>2</Item></u:Root>"#).unwrap();
    /// let items = doc.path(&["root", "item"]).unwrap().items();
    /// assert_eq!(items.len(), 2);
    /// assert_eq!(items[1].text(), Some("2"));
    /// ```
    pub fn parse(xml: &str) -> Result<XmlValue> {
        let root = Element::parse(xml.as_bytes())?;
        let mut document = XmlNode::default();
        document
            .children
            .insert(normalize_name(&root.name), decode_element(&root));
        Ok(XmlValue::Node(document))
    }

    /// Enfant direct par nom (insensible à la casse)
    pub fn get(&self, name: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Node(node) => node.children.get(&name.to_lowercase()),
            _ => None,
        }
    }

    /// Descend dans l'arbre en suivant une suite de noms
    pub fn path(&self, names: &[&str]) -> Option<&XmlValue> {
        names
            .iter()
            .try_fold(self, |current, name| current.get(name))
    }

    /// Texte de l'élément : la feuille elle-même ou le texte d'un noeud
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            XmlValue::Node(node) => node.text.as_deref(),
            XmlValue::List(_) => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            XmlValue::Node(node) => node.attributes.get(&name.to_lowercase()).map(String::as_str),
            _ => None,
        }
    }

    /// Vue uniforme « un ou plusieurs » : une liste rend ses éléments, tout
    /// autre noeud est une liste à un élément
    pub fn items(&self) -> Vec<&XmlValue> {
        match self {
            XmlValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// Texte de l'enfant `name`, s'il existe
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(XmlValue::text)
    }

    /// Texte obligatoire de l'enfant `name`
    pub(crate) fn required_text(&self, name: &str, context: &str) -> Result<String> {
        self.child_text(name)
            .map(str::to_string)
            .ok_or_else(|| FritzError::invalid_document(format!("missing {name} in {context}")))
    }

    /// Conversion en JSON (`$` pour les attributs, `_` pour le texte)
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn normalize_name(name: &str) -> String {
    // xmltree sépare déjà le préfixe, on retire tout reliquat par sécurité
    let local = name.rsplit(':').next().unwrap_or(name);
    local.to_lowercase()
}

fn decode_element(element: &Element) -> XmlValue {
    let mut text = String::new();
    let mut children: IndexMap<String, XmlValue> = IndexMap::new();

    for child in &element.children {
        match child {
            XMLNode::Element(elem) => {
                let name = normalize_name(&elem.name);
                let value = decode_element(elem);
                match children.get_mut(&name) {
                    Some(XmlValue::List(items)) => items.push(value),
                    Some(existing) => {
                        let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
                        *existing = XmlValue::List(vec![first, value]);
                    }
                    None => {
                        children.insert(name, value);
                    }
                }
            }
            XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
            _ => {}
        }
    }

    // texte conservé tel quel, sauf s'il n'est fait que de blancs
    if text.trim().is_empty() {
        text.clear();
    }
    if element.attributes.is_empty() && children.is_empty() {
        return XmlValue::Text(text);
    }

    let attributes = element
        .attributes
        .iter()
        .map(|(name, value)| (normalize_name(name), value.clone()))
        .collect();

    XmlValue::Node(XmlNode {
        attributes,
        text: (!text.is_empty()).then_some(text),
        children,
    })
}

impl Serialize for XmlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            XmlValue::Text(text) => serializer.serialize_str(text),
            XmlValue::List(items) => serializer.collect_seq(items),
            XmlValue::Node(node) => {
                let mut map = serializer.serialize_map(None)?;
                if !node.attributes.is_empty() {
                    map.serialize_entry("$", &node.attributes)?;
                }
                if let Some(text) = &node.text {
                    map.serialize_entry("_", text)?;
                }
                for (name, child) in &node.children {
                    map.serialize_entry(name, child)?;
                }
                map.end()
            }
        }
    }
}
