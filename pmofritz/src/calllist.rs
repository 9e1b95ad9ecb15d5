//! Journal d'appels (`X_AVM-DE_OnTel` / `GetCallList`)
//!
//! La box ne renvoie pas directement le journal : l'action `GetCallList`
//! donne une URL temporaire (avec un SID) qu'il faut ensuite télécharger.

use crate::client::FritzBox;
use crate::error::{FritzError, Result};
use crate::soap::response_field;
use crate::xml::XmlValue;
use serde::Serialize;
use std::fmt;
use tracing::debug;
use url::Url;

/// Service portant l'action `GetCallList`
pub const ONTEL_SERVICE_ID: &str = "urn:X_AVM-DE_OnTel-com:serviceId:X_AVM-DE_OnTel1";

const GET_CALL_LIST: &str = "GetCallList";

/// Format de téléchargement du journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallListFormat {
    #[default]
    Xml,
    /// La première ligne est une méta-ligne `sep=;`, voir [`remove_first_line`]
    Csv,
}

impl CallListFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallListFormat::Xml => "xml",
            CallListFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for CallListFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type d'un appel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Incoming,
    Missed,
    Rejected,
    Outgoing,
    /// Appel entrant encore en cours au moment du téléchargement
    ActiveIncoming,
    /// Appel sortant encore en cours au moment du téléchargement
    ActiveOutgoing,
    Unknown(u8),
}

impl CallType {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => CallType::Incoming,
            2 => CallType::Missed,
            3 => CallType::Rejected,
            4 => CallType::Outgoing,
            5 => CallType::ActiveIncoming,
            6 => CallType::ActiveOutgoing,
            other => CallType::Unknown(other),
        }
    }
}

/// Entrée du journal d'appels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallEntry {
    pub id: String,
    pub call_type: CallType,
    pub called: String,
    pub caller: String,
    pub caller_number: Option<String>,
    pub called_number: Option<String>,
    pub name: String,
    pub number_type: String,
    pub device: String,
    pub port: String,
    pub date: String,
    pub duration: String,
    pub count: String,
    pub path: String,
}

/// Journal d'appels décodé depuis sa forme XML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallList {
    pub timestamp: String,
    pub calls: Vec<CallEntry>,
}

impl CallList {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = XmlValue::parse(xml)?;
        let root = doc
            .get("root")
            .ok_or_else(|| FritzError::invalid_document("missing root element in call list"))?;

        let timestamp = root.child_text("timestamp").unwrap_or_default().to_string();
        let calls = root
            .get("call")
            .map(|calls| calls.items().into_iter().map(parse_call).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self { timestamp, calls })
    }
}

fn parse_call(call: &XmlValue) -> Result<CallEntry> {
    let field = |name: &str| call.child_text(name).unwrap_or_default().to_string();
    let optional = |name: &str| {
        call.child_text(name)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let code = call.required_text("type", "call")?;
    let code = code
        .parse::<u8>()
        .map_err(|_| FritzError::invalid_document(format!("invalid call type '{code}'")))?;

    Ok(CallEntry {
        id: call.required_text("id", "call")?,
        call_type: CallType::from_code(code),
        called: field("called"),
        caller: field("caller"),
        caller_number: optional("callernumber"),
        called_number: optional("callednumber"),
        name: field("name"),
        number_type: field("numbertype"),
        device: field("device"),
        port: field("port"),
        date: field("date"),
        duration: field("duration"),
        count: field("count"),
        path: field("path"),
    })
}

/// Retire la première ligne de `input`, les lignes étant séparées par `newline`
///
/// ```
/// use pmofritz::remove_first_line;
///
/// assert_eq!(remove_first_line("sep=;\r\nTyp;Datum", "\r\n"), "Typ;Datum");
/// ```
pub fn remove_first_line<'a>(input: &'a str, newline: &str) -> &'a str {
    input.split_once(newline).map(|(_, rest)| rest).unwrap_or("")
}

impl FritzBox {
    /// URL de téléchargement du journal d'appels
    pub async fn get_call_list_url(&self) -> Result<String> {
        self.initialize().await?;
        let response = self.exec_action(GET_CALL_LIST, ONTEL_SERVICE_ID, None).await?;

        response_field(&response, GET_CALL_LIST, "newcalllisturl")
            .map(str::to_string)
            .ok_or_else(|| FritzError::invalid_document("missing NewCallListURL in GetCallList response"))
    }

    /// Télécharge le journal d'appels brut au format demandé
    pub async fn get_call_list(&self, format: CallListFormat) -> Result<String> {
        self.initialize().await?;
        let raw = self.get_call_list_url().await?;
        let url = self.resolve_call_list_url(&raw, format)?;

        debug!(url = %url, format = %format, "downloading call list");
        self.transport().get(url.as_str()).await
    }

    /// Résout l'URL renvoyée par la box et ajoute `type=<format>`
    fn resolve_call_list_url(&self, raw: &str, format: CallListFormat) -> Result<Url> {
        let mut url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&self.api_url("/", true))?.join(raw)?
            }
            Err(err) => return Err(err.into()),
        };
        url.query_pairs_mut().append_pair("type", format.as_str());
        Ok(url)
    }
}
