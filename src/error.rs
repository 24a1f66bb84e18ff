//! Error codes

use ldap3::LdapResult;

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The server URL could not be parsed, or carries a non-LDAP scheme.
	#[error("invalid LDAP URL: {0}")]
	InvalidUrl(String),
	/// An operation that needs a bound session was invoked before
	/// [`connect`](crate::LdapClient::connect) succeeded, or after
	/// [`close`](crate::LdapClient::close).
	#[error("not connected to a directory server")]
	NotConnected,
	/// Negotiating the encrypted channel failed. The session remains
	/// unconnected.
	#[error("TLS negotiation failed: {0}")]
	Tls(String),
	/// The server rejected the bind. Carries the server's diagnostic text;
	/// the session remains unconnected.
	#[error("bind failed: {0}")]
	Bind(String),
	/// A search ended with a non-success result other than `noSuchObject`.
	#[error("search failed: {0}")]
	Search(String),
	/// Any other operation ended with a non-success result.
	#[error("operation failed: {0}")]
	Protocol(String),
	/// Reading TLS certificate material from disk failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	/// An underlying protocol error or similar occurred, or the LDAP library
	/// was used incorrectly.
	#[error(transparent)]
	Ldap(#[from] ldap3::LdapError),
}

/// Renders the server's view of a failed operation, for the categorized
/// error variants.
pub(crate) fn diagnostic(result: &LdapResult) -> String {
	if result.text.is_empty() {
		format!("result code {}", result.rc)
	} else {
		format!("{} (result code {})", result.text, result.rc)
	}
}

#[cfg(test)]
mod tests {
	use ldap3::LdapResult;

	use super::diagnostic;

	#[test]
	fn diagnostic_prefers_server_text() {
		let result = LdapResult {
			rc: 49,
			matched: String::new(),
			text: String::from("invalid credentials"),
			refs: Vec::new(),
			ctrls: Vec::new(),
		};
		assert_eq!(diagnostic(&result), "invalid credentials (result code 49)");
	}

	#[test]
	fn diagnostic_falls_back_to_the_result_code() {
		let result = LdapResult {
			rc: 50,
			matched: String::new(),
			text: String::new(),
			refs: Vec::new(),
			ctrls: Vec::new(),
		};
		assert_eq!(diagnostic(&result), "result code 50");
	}
}
