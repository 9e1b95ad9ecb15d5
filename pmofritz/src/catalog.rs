//! Catalogue des services découverts sur la box
//!
//! Le catalogue est immuable : chaque passe de découverte en construit un
//! nouveau qui remplace l'ancien d'un bloc (voir `FritzBox::parse_device_tree`).

use crate::description::ServiceEntry;
use crate::error::{FritzError, Result};
use indexmap::IndexMap;

/// Services indexés par serviceId
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: IndexMap<String, ServiceEntry>,
}

impl ServiceCatalog {
    /// Construit un catalogue ; un serviceId répété remplace l'entrée précédente
    pub fn from_entries(entries: impl IntoIterator<Item = ServiceEntry>) -> Self {
        let mut services = IndexMap::new();
        for entry in entries {
            services.insert(entry.service_id.clone(), entry);
        }
        Self { services }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.services.contains_key(service_id)
    }

    pub fn get(&self, service_id: &str) -> Option<&ServiceEntry> {
        self.services.get(service_id)
    }

    /// Entrée du service, ou `ServiceNotFound`
    pub fn service(&self, service_id: &str) -> Result<&ServiceEntry> {
        self.get(service_id)
            .ok_or_else(|| FritzError::ServiceNotFound(service_id.to_string()))
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.services.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, control: &str) -> ServiceEntry {
        ServiceEntry {
            service_type: format!("urn:type:{id}"),
            service_id: id.to_string(),
            control_url: control.to_string(),
            event_sub_url: String::new(),
            scpd_url: format!("/{id}.xml"),
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = ServiceCatalog::from_entries([entry("a", "/a"), entry("b", "/b")]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.service("b").unwrap().control_url, "/b");
        assert_eq!(catalog.service_ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_service() {
        let catalog = ServiceCatalog::default();
        assert!(catalog.is_empty());
        let err = catalog.service("S").unwrap_err();
        assert_eq!(err.to_string(), "Service S not found");
    }

    #[test]
    fn test_duplicate_id_keeps_single_entry() {
        let catalog = ServiceCatalog::from_entries([entry("a", "/old"), entry("a", "/new")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.service("a").unwrap().control_url, "/new");
    }
}
