//! TR-064 client for a FritzBox
//!
//! [`FritzBox`] owns the session (login state and SID) and the service
//! catalog discovered from `tr64desc.xml`. Every network exchange goes
//! through a [`Transport`].

use crate::catalog::ServiceCatalog;
use crate::config_ext::{DEFAULT_ADDRESS, FritzConfigExt};
use crate::description::{DeviceDescription, TR64_DESCRIPTION_PATH};
use crate::digest::compute_response;
use crate::error::{FritzError, Result};
use crate::scpd::{ArgumentSet, Scpd};
use crate::session_info::{LOGIN_PATH, SessionInfo, Sid};
use crate::soap::{build_action_envelope, build_soap_action, decode_soap_response};
use crate::transport::{Credentials, HttpTransport, Transport};
use crate::validation::{ActionArgs, check_arguments};
use crate::xml::XmlValue;
use parking_lot::RwLock;
use pmoconfig::Config;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// TR-064 port over plain HTTP
pub const TR64_PORT: u16 = 49000;

/// TR-064 port over HTTPS
pub const TR64_SECURE_PORT: u16 = 49443;

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The box granted a session
    Authenticated(Sid),
    /// The box answered with the all-zero SID
    AuthFailed,
}

#[derive(Debug, Clone, Default)]
struct Session {
    initialized: bool,
    sid: Option<Sid>,
}

/// FritzBox TR-064 client
///
/// # Example
///
/// ```no_run
/// use pmofritz::FritzBox;
///
/// #[tokio::main]
/// async fn main() -> pmofritz::Result<()> {
///     let fritz = FritzBox::builder()
///         .address("192.168.178.1")
///         .credentials("admin", "secret")
///         .build()?;
///
///     fritz.initialize().await?;
///     println!("{}", fritz.get_call_list_url().await?);
///     Ok(())
/// }
/// ```
pub struct FritzBox {
    address: String,
    credentials: Credentials,
    secure: bool,
    transport: Arc<dyn Transport>,
    session: RwLock<Session>,
    catalog: RwLock<Arc<ServiceCatalog>>,
}

impl fmt::Debug for FritzBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FritzBox")
            .field("address", &self.address)
            .field("credentials", &self.credentials)
            .field("secure", &self.secure)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl FritzBox {
    pub fn builder() -> FritzBoxBuilder {
        FritzBoxBuilder::new()
    }

    /// Client for `fritz.box` over plain HTTP
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::builder().credentials(username, password).build()
    }

    /// Client configured from the global `pmoconfig` configuration
    pub fn from_config() -> Result<Self> {
        Self::from_config_obj(&pmoconfig::get_config())
    }

    /// Client configured from the `fritzbox` section of `config`
    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let (username, password) = config.get_fritzbox_credentials()?;
        Self::builder()
            .address(config.get_fritzbox_address()?)
            .credentials(username, password)
            .secure(config.get_fritzbox_secure()?)
            .accept_invalid_certs(config.get_fritzbox_accept_invalid_certs()?)
            .build()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn is_initialized(&self) -> bool {
        self.session.read().initialized
    }

    /// Last SID granted by the box
    pub fn session_id(&self) -> Option<Sid> {
        self.session.read().sid.clone()
    }

    /// Snapshot of the current service catalog
    pub fn catalog(&self) -> Arc<ServiceCatalog> {
        self.catalog.read().clone()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Forces the next `initialize` to log in and rediscover services
    pub fn reset(&self) {
        self.session.write().initialized = false;
    }

    /// Builds `scheme://address[:port]endpoint`
    ///
    /// The port is only set for TR-064 endpoints: 49443 in secure mode,
    /// 49000 otherwise.
    pub fn api_url(&self, endpoint: &str, tr64: bool) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        if tr64 {
            let port = if self.secure { TR64_SECURE_PORT } else { TR64_PORT };
            format!("{}://{}:{}{}", scheme, self.address, port, endpoint)
        } else {
            format!("{}://{}{}", scheme, self.address, endpoint)
        }
    }

    /// Challenge-response login on `login_sid.lua`
    pub async fn authenticate(&self) -> Result<AuthOutcome> {
        let url = self.api_url(LOGIN_PATH, false);

        let challenge = SessionInfo::from_xml(&self.transport.get(&url).await?)?.challenge;
        let response = compute_response(&challenge, &self.credentials.password);
        debug!(url = %url, "sending login response");

        let body = self
            .transport
            .post_form(
                &url,
                &[
                    ("username", self.credentials.username.as_str()),
                    ("response", response.as_str()),
                ],
            )
            .await?;
        let info = SessionInfo::from_xml(&body)?;

        if info.sid.is_placeholder() {
            warn!(
                address = %self.address,
                username = %self.credentials.username,
                block_time = info.block_time,
                "FritzBox rejected the login"
            );
            return Ok(AuthOutcome::AuthFailed);
        }

        info!(address = %self.address, "logged in to FritzBox");
        self.session.write().sid = Some(info.sid.clone());
        Ok(AuthOutcome::Authenticated(info.sid))
    }

    /// Logs in and discovers services, once
    ///
    /// Returns `Ok(true)` without any request when already initialized.
    pub async fn initialize(&self) -> Result<bool> {
        if self.is_initialized() {
            return Ok(true);
        }

        if self.authenticate().await? == AuthOutcome::AuthFailed {
            return Err(FritzError::LoginFailed);
        }
        self.parse_device_tree().await?;

        self.session.write().initialized = true;
        Ok(true)
    }

    /// Fetches `tr64desc.xml` and replaces the service catalog
    pub async fn parse_device_tree(&self) -> Result<()> {
        let url = self.api_url(TR64_DESCRIPTION_PATH, true);
        let description = DeviceDescription::from_xml(&self.transport.get(&url).await?)?;

        let catalog = ServiceCatalog::from_entries(description.services);
        info!(
            services = catalog.len(),
            device = description.device.friendly_name.as_deref().unwrap_or("unknown"),
            "service catalog rebuilt"
        );
        *self.catalog.write() = Arc::new(catalog);
        Ok(())
    }

    /// Arguments of `action` from the live SCPD of `service_id`
    pub async fn parse_action_schema(&self, action: &str, service_id: &str) -> Result<ArgumentSet> {
        let scpd_url = self.catalog().service(service_id)?.scpd_url.clone();
        let url = self.api_url(&scpd_url, true);

        let scpd = Scpd::from_xml(&self.transport.get(&url).await?)?;
        scpd.action_arguments(action, service_id)
    }

    /// Checks `args` against the schema of `action`
    pub async fn validate_arguments(
        &self,
        action: &str,
        service_id: &str,
        args: Option<&ActionArgs>,
    ) -> Result<()> {
        self.catalog().service(service_id)?;
        let schema = self.parse_action_schema(action, service_id).await?;
        check_arguments(action, &schema, args)
    }

    /// Validated SOAP envelope for `action`
    pub async fn build_soap_message(
        &self,
        action: &str,
        service_id: &str,
        args: Option<&ActionArgs>,
    ) -> Result<String> {
        let service_type = self.catalog().service(service_id)?.service_type.clone();
        self.validate_arguments(action, service_id, args).await?;
        build_action_envelope(&service_type, action, args)
    }

    /// Posts `envelope` to the control URL of `service_id`
    ///
    /// Fails with `FritzError::SoapFault` when the response carries a fault.
    pub async fn soap_request(
        &self,
        service_id: &str,
        envelope: &str,
        soap_action: &str,
    ) -> Result<XmlValue> {
        let control_url = self.catalog().service(service_id)?.control_url.clone();
        let url = self.api_url(&control_url, true);

        let body = self
            .transport
            .post_soap(&url, soap_action, envelope, Some(&self.credentials))
            .await?;
        decode_soap_response(&body)
    }

    /// Runs `action` on `service_id`
    ///
    /// ```no_run
    /// # async fn run(fritz: &pmofritz::FritzBox) -> pmofritz::Result<()> {
    /// use pmofritz::ActionArgs;
    ///
    /// let mut args = ActionArgs::new();
    /// args.insert("NewPhonebookID".to_string(), "0".to_string());
    /// let response = fritz
    ///     .exec_action(
    ///         "GetPhonebook",
    ///         "urn:X_AVM-DE_OnTel-com:serviceId:X_AVM-DE_OnTel1",
    ///         Some(&args),
    ///     )
    ///     .await?;
    /// println!("{}", response.to_json());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn exec_action(
        &self,
        action: &str,
        service_id: &str,
        args: Option<&ActionArgs>,
    ) -> Result<XmlValue> {
        self.initialize().await?;
        let envelope = self.build_soap_message(action, service_id, args).await?;
        let soap_action = build_soap_action(&self.catalog(), action, service_id)?;
        debug!(soap_action = %soap_action, "executing action");
        self.soap_request(service_id, &envelope, &soap_action).await
    }
}

/// Builder for [`FritzBox`]
pub struct FritzBoxBuilder {
    address: String,
    username: String,
    password: String,
    secure: bool,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for FritzBoxBuilder {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            username: String::new(),
            password: String::new(),
            secure: false,
            accept_invalid_certs: true,
            timeout: None,
            transport: None,
        }
    }
}

impl FritzBoxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// IP address or host name (default: `fritz.box`)
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Use HTTPS (default: false)
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Ignored when a custom transport is set
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Ignored when a custom transport is set
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the default [`HttpTransport`]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<FritzBox> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut builder =
                    HttpTransport::builder().accept_invalid_certs(self.accept_invalid_certs);
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                Arc::new(builder.build()?)
            }
        };

        Ok(FritzBox {
            address: self.address,
            credentials: Credentials::new(self.username, self.password),
            secure: self.secure,
            transport,
            session: RwLock::new(Session::default()),
            catalog: RwLock::new(Arc::new(ServiceCatalog::default())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(secure: bool) -> FritzBox {
        FritzBox::builder()
            .credentials("admin", "secret")
            .secure(secure)
            .build()
            .unwrap()
    }

    #[test]
    fn test_api_url() {
        let plain = client(false);
        assert_eq!(
            plain.api_url("/login_sid.lua?version=1", false),
            "http://fritz.box/login_sid.lua?version=1"
        );
        assert_eq!(
            plain.api_url("/tr64desc.xml", true),
            "http://fritz.box:49000/tr64desc.xml"
        );

        let secure = client(true);
        assert_eq!(
            secure.api_url("/upnp/control/x_contact", true),
            "https://fritz.box:49443/upnp/control/x_contact"
        );
        assert_eq!(secure.api_url("/", false), "https://fritz.box/");
    }

    #[test]
    fn test_new_client_state() {
        let fritz = FritzBox::new("admin", "secret").unwrap();
        assert_eq!(fritz.address(), "fritz.box");
        assert_eq!(fritz.username(), "admin");
        assert!(!fritz.secure());
        assert!(!fritz.is_initialized());
        assert!(fritz.session_id().is_none());
        assert!(fritz.catalog().is_empty());
        assert!(!format!("{fritz:?}").contains("secret"));
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_yaml_str(
            "fritzbox:\n  address: 10.0.0.1\n  username: admin\n  password: pw\n  secure: true\n",
        )
        .unwrap();
        let fritz = FritzBox::from_config_obj(&config).unwrap();
        assert_eq!(fritz.address(), "10.0.0.1");
        assert!(fritz.secure());

        let missing = Config::from_yaml_str("{}").unwrap();
        assert!(matches!(
            FritzBox::from_config_obj(&missing),
            Err(FritzError::Config(_))
        ));
    }
}
