//! Config for the LDAP client.
use std::{
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};

use ldap3::LdapConnSettings;
use rustls::{Certificate, PrivateKey, RootCertStore};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// The server URL a session points at when none is given.
pub const DEFAULT_URL: &str = "ldap://localhost:389/";

/// LDAP client configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ClientConfig {
	/// The URL to connect to the server with. Supports ldap, ldaps, and ldapi
	/// schemes
	pub url: Url,
	/// Connection settings.
	pub connection: ConnectionConfig,
}

impl ClientConfig {
	/// Parses and validates a server URL string, combining it with default
	/// connection settings.
	///
	/// # Errors
	/// Returns [`Error::InvalidUrl`] when the string does not parse or names
	/// a non-LDAP scheme. No network activity takes place.
	pub fn from_url(url: &str) -> Result<Self, Error> {
		Ok(ClientConfig { url: parse_server_url(url)?, connection: ConnectionConfig::default() })
	}
}

impl Default for ClientConfig {
	fn default() -> Self {
		#[allow(clippy::expect_used)]
		let url = Url::parse(DEFAULT_URL).expect("the default LDAP URL parses");
		ClientConfig { url, connection: ConnectionConfig::default() }
	}
}

/// Parses a directory server URL, rejecting anything but the LDAP schemes.
pub(crate) fn parse_server_url(raw: &str) -> Result<Url, Error> {
	let url = Url::parse(raw).map_err(|err| Error::InvalidUrl(err.to_string()))?;
	match url.scheme() {
		"ldap" | "ldaps" | "ldapi" => Ok(url),
		scheme => Err(Error::InvalidUrl(format!("unsupported scheme `{scheme}`"))),
	}
}

/// Configuration for how to connect to the LDAP server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// LDAP operation timeout. Applied to every request sent on the session.
	pub operation_timeout: Duration,

	/// TLS config
	pub tls: TLSConfig,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		ConnectionConfig {
			timeout: 30,
			operation_timeout: Duration::from_secs(120),
			tls: TLSConfig::default(),
		}
	}
}

/// TLS Configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TLSConfig {
	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	pub starttls: bool,

	/// Disable verification of TLS certificates
	pub no_tls_verify: bool,

	/// TLS root certificates path
	pub root_certificates_path: Option<PathBuf>,

	/// Path of the TLS client key to use for the connection
	pub client_key_path: Option<PathBuf>,

	/// Path of the TLS client certificate to use for the connection
	pub client_certificate_path: Option<PathBuf>,
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) async fn to_settings(&self) -> Result<LdapConnSettings, Error> {
		let mut settings = LdapConnSettings::new()
			.set_conn_timeout(Duration::from_secs(self.timeout))
			.set_starttls(self.tls.starttls)
			.set_no_tls_verify(self.tls.no_tls_verify);

		if let Some(path) = &self.tls.root_certificates_path {
			let identity = match (&self.tls.client_key_path, &self.tls.client_certificate_path) {
				(Some(key), Some(certificate)) => Some((key, certificate)),
				(None, None) => None,
				_ => {
					return Err(Error::Tls(
						"both a client certificate and key file in PKCS8 format must be specified"
							.to_owned(),
					))
				}
			};

			let mut roots = RootCertStore::empty();
			for certificate in read_pem_certificates(path).await? {
				roots
					.add(&certificate)
					.map_err(|_| Error::Tls("could not read root certificate".to_owned()))?;
			}
			let builder =
				rustls::ClientConfig::builder().with_safe_defaults().with_root_certificates(roots);

			let tls_config = match identity {
				Some((key_path, certificate_path)) => {
					let certificates = read_pem_certificates(certificate_path).await?;
					let key = read_pem_key(key_path).await?;
					builder.with_client_auth_cert(certificates, key).map_err(|_| {
						Error::Tls("could not read client certificates".to_owned())
					})?
				}
				None => builder.with_no_client_auth(),
			};
			settings = settings.set_config(Arc::new(tls_config));
		}
		Ok(settings)
	}
}

/// Reads every certificate in a PEM file.
async fn read_pem_certificates(path: &Path) -> Result<Vec<Certificate>, Error> {
	let pem = tokio::fs::read(path).await?;
	let certificates = rustls_pemfile::certs(&mut pem.as_slice())?;
	if certificates.is_empty() {
		return Err(Error::Tls(format!("no certificates in {}", path.display())));
	}
	Ok(certificates.into_iter().map(Certificate).collect())
}

/// Reads the first PKCS8 private key in a PEM file.
async fn read_pem_key(path: &Path) -> Result<PrivateKey, Error> {
	let pem = tokio::fs::read(path).await?;
	let keys = rustls_pemfile::pkcs8_private_keys(&mut pem.as_slice())?;
	keys.into_iter()
		.next()
		.map(PrivateKey)
		.ok_or_else(|| Error::Tls(format!("no PKCS8 private key in {}", path.display())))
}
