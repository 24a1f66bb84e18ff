//! The client session and its directory operations.

use ldap3::{
	exop::{WhoAmI, WhoAmIResp},
	result::ExopResult,
	Ldap, LdapConnAsync, LdapResult, Scope, SearchEntry, SearchResult,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::{
	auth::{Credentials, SaslCredentials},
	config::ClientConfig,
	error::{diagnostic, Error},
	search::{self, ResponseMessage, SearchRequest},
};

/// resultCode success (RFC 4511).
const SUCCESS: u32 = 0;
/// resultCode noSuchObject (RFC 4511); a soft failure for searches.
const NO_SUCH_OBJECT: u32 = 32;

/// The attributes requested when reading the root DSE.
const ROOT_DSE_ATTRS: [&str; 6] = [
	"namingContexts",
	"altServer",
	"supportedExtension",
	"supportedControl",
	"supportedSASLMechanisms",
	"supportedLDAPVersion",
];

/// The identity reported by [`LdapClient::whoami`] for an anonymous session.
const ANONYMOUS_IDENTITY: &str = "anonym";

/// A stateful session with an LDAP directory server.
///
/// A session is constructed unconnected, bound once with
/// [`connect`](Self::connect), used for any number of operations, and torn
/// down with [`close`](Self::close) (or by dropping it). Every operation
/// takes `&mut self` and resolves once the server has answered, so the
/// borrow checker enforces that a session is driven from one task at a
/// time; callers that want to share one session add their own
/// synchronization around it.
#[derive(Debug)]
pub struct LdapClient {
	/// The server URL and connection settings.
	config: ClientConfig,
	/// The live connection. Present exactly while the session is bound.
	conn: Option<Connection>,
}

/// The transport handle together with the task driving its message loop.
#[derive(Debug)]
struct Connection {
	/// Handle used to issue operations.
	ldap: Ldap,
	/// Task that owns the socket and dispatches protocol messages.
	driver: JoinHandle<()>,
}

impl LdapClient {
	/// Create an unconnected session for the given configuration.
	///
	/// When the URL scheme is `ldaps` the connection is encrypted at the
	/// socket layer already, so a requested StartTLS upgrade is switched
	/// off to keep a second TLS layer from being negotiated inside it.
	#[must_use]
	pub fn new(mut config: ClientConfig) -> Self {
		if config.url.scheme() == "ldaps" {
			config.connection.tls.starttls = false;
		}
		LdapClient { config, conn: None }
	}

	/// Create an unconnected session for a server URL string, with default
	/// connection settings.
	///
	/// # Errors
	/// Fails with [`Error::InvalidUrl`] on a malformed URL or a non-LDAP
	/// scheme, before any network activity.
	pub fn from_url(url: &str) -> Result<Self, Error> {
		Ok(Self::new(ClientConfig::from_url(url)?))
	}

	/// The URL of the directory server this session points at.
	#[must_use]
	pub fn url(&self) -> &Url {
		&self.config.url
	}

	/// Whether the connection will be upgraded via StartTLS.
	#[must_use]
	pub fn uses_starttls(&self) -> bool {
		self.config.connection.tls.starttls
	}

	/// Whether the session currently holds a bound connection.
	#[must_use]
	pub fn is_connected(&self) -> bool {
		self.conn.is_some()
	}

	/// Establish the connection and bind with the given credentials.
	///
	/// The transport is set up first (performing the StartTLS upgrade when
	/// configured, so that credentials never travel a plaintext channel),
	/// then exactly one bind is issued according to the credential variant.
	/// On any failure the session remains unconnected.
	///
	/// # Errors
	/// [`Error::Tls`] when the encrypted channel cannot be negotiated,
	/// [`Error::Bind`] when the server rejects the credentials or the SASL
	/// mechanism is unavailable, [`Error::Protocol`] when the session is
	/// already connected.
	pub async fn connect(&mut self, credentials: &Credentials) -> Result<(), Error> {
		if self.conn.is_some() {
			return Err(Error::Protocol("session is already connected".to_owned()));
		}

		debug!("connecting to {}", self.config.url);
		let starttls = self.uses_starttls();
		let settings = self.config.connection.to_settings().await?;
		let (conn, mut ldap) = LdapConnAsync::from_url_with_settings(settings, &self.config.url)
			.await
			.map_err(|err| {
				if starttls {
					Error::Tls(err.to_string())
				} else {
					Error::Ldap(err)
				}
			})?;
		let driver = tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("LDAP connection error: {err}");
			}
		});

		if let Err(err) = self.bind(&mut ldap, credentials).await {
			driver.abort();
			return Err(err);
		}
		self.conn = Some(Connection { ldap, driver });
		Ok(())
	}

	/// Issues the bind matching the credential variant.
	async fn bind(&self, ldap: &mut Ldap, credentials: &Credentials) -> Result<(), Error> {
		match credentials {
			Credentials::Simple { bind_dn, password } => {
				let result = ldap.simple_bind(bind_dn, password).await?;
				check_bind(&result)
			}
			Credentials::Sasl(sasl) => self.sasl_bind(ldap, sasl).await,
		}
	}

	/// Dispatches a SASL bind to the mechanism implementation the transport
	/// provides. Mechanisms the transport does not implement are a bind
	/// error, not a protocol violation.
	async fn sasl_bind(&self, ldap: &mut Ldap, sasl: &SaslCredentials) -> Result<(), Error> {
		debug!("SASL bind to {} via {}", self.config.url, sasl.mechanism);
		let result = match sasl.mechanism.to_ascii_uppercase().as_str() {
			"EXTERNAL" => ldap.sasl_external_bind().await?,
			#[cfg(feature = "gssapi")]
			"GSSAPI" => {
				let server = self
					.config
					.url
					.host_str()
					.ok_or_else(|| Error::Bind("GSSAPI needs a server host name".to_owned()))?;
				ldap.sasl_gssapi_bind(server).await?
			}
			other => {
				return Err(Error::Bind(format!("unsupported SASL mechanism: {other}")));
			}
		};
		check_bind(&result)
	}

	/// Unbind and release the connection.
	///
	/// Does nothing on a session that is not connected, so it is safe to
	/// call any number of times. The transport handle is released even when
	/// the unbind request fails.
	///
	/// # Errors
	/// [`Error::Protocol`] when the server rejects the unbind request.
	pub async fn close(&mut self) -> Result<(), Error> {
		let Some(mut conn) = self.conn.take() else {
			return Ok(());
		};
		let unbind = conn.ldap.unbind().await;
		if let Err(err) = conn.driver.await {
			warn!("failed to join the connection driver: {err}");
		}
		unbind.map_err(|err| Error::Protocol(err.to_string()))
	}

	/// Search the directory, returning every matching entry in the order
	/// the server sent them. Entries without a single readable attribute
	/// are dropped; continuation references are not followed.
	///
	/// A search whose base does not exist is an empty result, not an error.
	///
	/// # Errors
	/// [`Error::NotConnected`] on an unbound session, [`Error::Search`]
	/// with the server diagnostic on any other non-success result.
	pub async fn search(&mut self, request: &SearchRequest) -> Result<Vec<SearchEntry>, Error> {
		match self.run_search(request).await? {
			Some(messages) => Ok(search::collect_entries(messages)),
			None => Ok(Vec::new()),
		}
	}

	/// Search the directory and return the first entry that carries
	/// attributes, or `None` when nothing matches.
	///
	/// # Errors
	/// Same as [`search`](Self::search).
	pub async fn search_first(
		&mut self,
		request: &SearchRequest,
	) -> Result<Option<SearchEntry>, Error> {
		Ok(self.run_search(request).await?.and_then(search::first_entry))
	}

	/// Return the entry with the given distinguished name, or `None` when
	/// the entry doesn't exist.
	///
	/// # Errors
	/// Same as [`search`](Self::search).
	pub async fn get_entry(&mut self, dn: &str) -> Result<Option<SearchEntry>, Error> {
		self.search_first(&SearchRequest::new(dn, Scope::Base)).await
	}

	/// Return the root DSE, the entry describing the server's capabilities.
	///
	/// # Errors
	/// Same as [`search`](Self::search).
	pub async fn get_root_dse(&mut self) -> Result<Option<SearchEntry>, Error> {
		let attributes = ROOT_DSE_ATTRS.iter().map(|attr| (*attr).to_owned()).collect();
		let request = SearchRequest::new("", Scope::Base).attributes(attributes);
		self.search_first(&request).await
	}

	/// Delete the entry with the given distinguished name. An empty DN is a
	/// no-op success and never reaches the server.
	///
	/// # Errors
	/// [`Error::NotConnected`] on an unbound session, [`Error::Protocol`]
	/// with the server diagnostic on a non-success result.
	pub async fn delete_entry(&mut self, dn: &str) -> Result<(), Error> {
		let ldap = self.ldap()?;
		if dn.is_empty() {
			return Ok(());
		}
		let result = ldap.delete(dn).await?;
		if result.rc != SUCCESS {
			return Err(Error::Protocol(diagnostic(&result)));
		}
		Ok(())
	}

	/// The "Who am I?" extended operation (RFC 4532). When the server
	/// reports no authorization identity (an anonymous session), the
	/// literal string `"anonym"` is returned instead.
	///
	/// # Errors
	/// [`Error::NotConnected`] on an unbound session, [`Error::Protocol`]
	/// with the server diagnostic on a non-success result.
	pub async fn whoami(&mut self) -> Result<String, Error> {
		let ldap = self.ldap()?;
		let ExopResult(exop, result) = ldap.extended(WhoAmI).await?;
		if result.rc != SUCCESS {
			return Err(Error::Protocol(diagnostic(&result)));
		}
		let authzid = if exop.val.is_some() {
			exop.parse::<WhoAmIResp>().authzid
		} else {
			String::new()
		};
		if authzid.is_empty() {
			Ok(ANONYMOUS_IDENTITY.to_owned())
		} else {
			Ok(authzid)
		}
	}

	/// Issues one search and classifies the response stream. `None` stands
	/// for a base that does not exist on the server.
	async fn run_search(
		&mut self,
		request: &SearchRequest,
	) -> Result<Option<Vec<ResponseMessage>>, Error> {
		let options = request.to_options();
		let ldap = self.ldap()?;
		let SearchResult(messages, result) = ldap
			.with_search_options(options)
			.search(
				request.base(),
				request.scope(),
				request.effective_filter(),
				request.attribute_list(),
			)
			.await?;
		match result.rc {
			SUCCESS => Ok(Some(messages.into_iter().map(ResponseMessage::classify).collect())),
			NO_SUCH_OBJECT => Ok(None),
			_ => Err(Error::Search(diagnostic(&result))),
		}
	}

	/// The transport handle, with the per-operation timeout applied. Every
	/// operation other than [`connect`](Self::connect) goes through here,
	/// which is what enforces the connected-session precondition.
	fn ldap(&mut self) -> Result<&mut Ldap, Error> {
		let timeout = self.config.connection.operation_timeout;
		match self.conn.as_mut() {
			Some(conn) => Ok(conn.ldap.with_timeout(timeout)),
			None => Err(Error::NotConnected),
		}
	}
}

impl Default for LdapClient {
	fn default() -> Self {
		Self::new(ClientConfig::default())
	}
}

impl Drop for LdapClient {
	fn drop(&mut self) {
		if let Some(conn) = self.conn.take() {
			conn.driver.abort();
		}
	}
}

/// Maps a bind result onto the error taxonomy.
fn check_bind(result: &LdapResult) -> Result<(), Error> {
	if result.rc == SUCCESS {
		Ok(())
	} else {
		Err(Error::Bind(diagnostic(result)))
	}
}
