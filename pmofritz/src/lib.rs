//! # pmofritz - Client TR-064 pour FritzBox
//!
//! Cette crate fournit un client Rust pour le protocole TR-064 (SOAP sur
//! HTTP) des routeurs AVM FritzBox.
//!
//! ## Vue d'ensemble
//!
//! `pmofritz` prend en charge :
//! - Le login par challenge-réponse sur `login_sid.lua` (obtention d'un SID)
//! - La découverte des services depuis `tr64desc.xml`
//! - La lecture des schémas d'action (SCPD) et la validation des arguments
//! - La construction des enveloppes SOAP et l'exécution des actions
//! - Le décodage des faults SOAP renvoyés par la box
//! - La récupération du journal d'appels (XML ou CSV)
//!
//! ## Structure des modules
//!
//! ```text
//! pmofritz/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # FritzBox : session, catalogue, exécution
//! │   ├── digest.rs           # Réponse au challenge de login
//! │   ├── xml.rs              # Arbre XML normalisé
//! │   ├── description.rs      # tr64desc.xml
//! │   ├── catalog.rs          # Catalogue des services
//! │   ├── scpd.rs             # Schémas d'action
//! │   ├── session_info.rs     # Réponses de login_sid.lua
//! │   ├── validation.rs       # Validation des arguments
//! │   ├── soap/               # Enveloppes, réponses et faults SOAP
//! │   ├── transport/          # Trait Transport et implémentation reqwest
//! │   ├── calllist.rs         # Journal d'appels
//! │   ├── phonebook.rs        # Entrées de répertoire
//! │   ├── config_ext.rs       # Extension pmoconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmofritz::{CallListFormat, FritzBox};
//!
//! #[tokio::main]
//! async fn main() -> pmofritz::Result<()> {
//!     // Utilise la section `fritzbox` de pmoconfig
//!     let fritz = FritzBox::from_config()?;
//!
//!     let calls = fritz.get_call_list(CallListFormat::Xml).await?;
//!     println!("{}", calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Gestion des erreurs
//!
//! Les erreurs de validation et de protocole reprennent les messages
//! historiques du client (`Service X not found`, `Missing Arguments: A, B`,
//! ...). Un fault SOAP s'affiche comme un objet JSON :
//!
//! ```rust,ignore
//! match fritz.exec_action("GetPhonebook", ONTEL_SERVICE_ID, Some(&args)).await {
//!     Err(FritzError::SoapFault(fault)) => println!("code UPnP {}", fault.errorcode),
//!     Err(e) => println!("Error: {}", e),
//!     Ok(response) => println!("{}", response.to_json()),
//! }
//! ```

pub mod calllist;
pub mod catalog;
pub mod client;
pub mod config_ext;
pub mod description;
pub mod digest;
pub mod error;
pub mod phonebook;
pub mod scpd;
pub mod session_info;
pub mod soap;
pub mod transport;
pub mod validation;
pub mod xml;

pub use calllist::{CallEntry, CallList, CallListFormat, CallType, ONTEL_SERVICE_ID, remove_first_line};
pub use catalog::ServiceCatalog;
pub use client::{AuthOutcome, FritzBox, FritzBoxBuilder};
pub use config_ext::FritzConfigExt;
pub use description::ServiceEntry;
pub use digest::compute_response;
pub use error::{FritzError, Result};
pub use phonebook::{NumberType, PhoneNumber};
pub use scpd::{ArgumentEntry, ArgumentSet, Direction};
pub use session_info::Sid;
pub use soap::SoapFault;
pub use transport::{Credentials, HttpTransport, Transport};
pub use validation::ActionArgs;
pub use xml::XmlValue;
