//! Entrées de répertoire téléphonique
//!
//! Le service `X_AVM-DE_OnTel` attend les contacts sous forme d'un petit
//! document XML (`NewPhonebookEntryData`), construit par
//! [`crate::soap::build_phonebook_entry`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type d'un numéro dans le répertoire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberType {
    Home,
    Work,
    Mobile,
    FaxWork,
}

impl NumberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberType::Home => "home",
            NumberType::Work => "work",
            NumberType::Mobile => "mobile",
            NumberType::FaxWork => "fax_work",
        }
    }
}

impl fmt::Display for NumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Un numéro de téléphone et son type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub number: String,
    #[serde(rename = "type")]
    pub kind: NumberType,
}

impl PhoneNumber {
    pub fn new(number: impl Into<String>, kind: NumberType) -> Self {
        Self {
            number: number.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_type_names() {
        assert_eq!(NumberType::FaxWork.to_string(), "fax_work");
        let number: PhoneNumber =
            serde_json::from_str(r#"{"number":"0552","type":"fax_work"}"#).unwrap();
        assert_eq!(number, PhoneNumber::new("0552", NumberType::FaxWork));
    }
}
