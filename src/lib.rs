//! A stateful client session for LDAP directory servers.
//!
//! The library wraps one connection to a directory server in a session
//! object: construct it with a server URL, [`connect`](LdapClient::connect)
//! once with simple or SASL credentials (negotiating StartTLS first when
//! configured), then issue searches and the other directory operations
//! against it. Search responses are decoded into [`SearchEntry`] values,
//! arriving in server order with attribute-less placeholder entries already
//! filtered out.
//!
//! Readers new to LDAP itself are well served by the [primer] shipped with
//! the `ldap3` crate, which this library uses for the wire protocol.
//!
//! [primer]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! A minimal session might look like so:
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use ldap_client::{Credentials, LdapClient, Scope, SearchRequest};
//!
//! let mut client = LdapClient::from_url("ldap://localhost:389/")?;
//! client.connect(&Credentials::simple("cn=admin,dc=example,dc=org", "verysecret")).await?;
//!
//! println!("bound as {}", client.whoami().await?);
//!
//! let request = SearchRequest::new("dc=example,dc=org", Scope::Subtree)
//! 	.filter("(objectClass=inetOrgPerson)")
//! 	.attributes(vec!["cn".to_owned(), "mail".to_owned()]);
//! for entry in client.search(&request).await? {
//! 	println!("{}", entry.dn);
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * Search continuation references are not followed; they are dropped
//!   from results (visible at debug level in the logs).
//! * SASL support extends exactly as far as the underlying transport's
//!   mechanisms: EXTERNAL, and GSSAPI behind the `gssapi` cargo feature.
//! * [secrecy](https://docs.rs/secrecy) is not used for storing bind
//!   passwords, it probably should be

pub mod auth;
pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod search;

pub use ldap3::{self, Scope, SearchEntry};

pub use crate::{
	auth::{Credentials, SaslCredentials},
	client::LdapClient,
	config::{ClientConfig, ConnectionConfig, TLSConfig},
	entry::SearchEntryExt,
	error::Error,
	search::SearchRequest,
};
