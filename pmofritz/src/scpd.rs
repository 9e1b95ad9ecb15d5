//! Vue typée des documents SCPD (actions et arguments d'un service)

use crate::error::{FritzError, Result};
use crate::xml::XmlValue;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Sens d'un argument d'action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(FritzError::invalid_document(format!(
                "unknown argument direction '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Argument d'une action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentEntry {
    pub name: String,
    pub direction: Direction,
    pub related_state_variable: String,
}

/// Arguments d'une action, uniques par nom et dans l'ordre du schéma
pub type ArgumentSet = IndexMap<String, ArgumentEntry>;

/// Action déclarée par un service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEntry {
    pub name: String,
    pub arguments: ArgumentSet,
}

/// Document SCPD décodé
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scpd {
    /// Actions du service, dans l'ordre du document
    pub actions: Vec<ActionEntry>,
}

impl Scpd {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = XmlValue::parse(xml)?;
        let scpd = doc
            .get("scpd")
            .ok_or_else(|| FritzError::invalid_document("missing scpd root element"))?;

        let Some(actions) = scpd.path(&["actionlist", "action"]) else {
            return Ok(Self::default());
        };

        let actions = actions
            .items()
            .into_iter()
            .map(parse_action)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { actions })
    }

    pub fn action(&self, name: &str) -> Option<&ActionEntry> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Arguments de l'action `action` (comparaison exacte, sensible à la casse)
    ///
    /// # Errors
    ///
    /// * `ActionsNotFound` - le service ne déclare aucune action
    /// * `InvalidAction` - l'action n'existe pas dans ce service
    pub fn action_arguments(&self, action: &str, service_id: &str) -> Result<ArgumentSet> {
        if self.actions.is_empty() {
            return Err(FritzError::ActionsNotFound(service_id.to_string()));
        }
        self.action(action)
            .map(|entry| entry.arguments.clone())
            .ok_or_else(|| FritzError::InvalidAction {
                action: action.to_string(),
                service_id: service_id.to_string(),
            })
    }
}

fn parse_action(action: &XmlValue) -> Result<ActionEntry> {
    let name = action.required_text("name", "action")?;
    let mut arguments = ArgumentSet::new();

    if let Some(list) = action.path(&["argumentlist", "argument"]) {
        for argument in list.items() {
            let entry = ArgumentEntry {
                name: argument.required_text("name", &name)?,
                direction: Direction::parse(&argument.required_text("direction", &name)?)?,
                related_state_variable: argument
                    .child_text("relatedstatevariable")
                    .unwrap_or_default()
                    .to_string(),
            };
            arguments.insert(entry.name.clone(), entry);
        }
    }

    Ok(ActionEntry { name, arguments })
}
