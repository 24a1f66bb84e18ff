//! Bind credentials.

/// How a session authenticates when it connects.
///
/// Exactly one variant is active per bind attempt; the ambiguity of
/// "mechanism present means the password-only fields are ignored" style
/// parameter lists does not arise.
#[derive(Clone, Debug)]
pub enum Credentials {
	/// Simple bind. An empty DN and password bind anonymously.
	Simple {
		/// The distinguished name to bind as.
		bind_dn: String,
		/// The bind password, zero-length when absent.
		password: String,
	},
	/// SASL bind; the mechanism decides which of the identity fields apply.
	Sasl(SaslCredentials),
}

impl Credentials {
	/// Simple bind credentials for the given DN and password.
	#[must_use]
	pub fn simple(bind_dn: &str, password: &str) -> Self {
		Credentials::Simple { bind_dn: bind_dn.to_owned(), password: password.to_owned() }
	}

	/// Anonymous simple bind.
	#[must_use]
	pub fn anonymous() -> Self {
		Self::simple("", "")
	}
}

impl From<SaslCredentials> for Credentials {
	fn from(sasl: SaslCredentials) -> Self {
		Credentials::Sasl(sasl)
	}
}

/// Identity material handed to the SASL negotiation.
///
/// The fields mirror what interactive mechanisms prompt for. Mechanisms that
/// need none of them (EXTERNAL) simply leave the defaults in place.
#[derive(Clone, Debug)]
pub struct SaslCredentials {
	/// The SASL mechanism name, e.g. `EXTERNAL` or `GSSAPI`.
	pub mechanism: String,
	/// The authentication identity (who is logging in).
	pub authentication_id: Option<String>,
	/// The realm the authentication identity belongs to.
	pub realm: Option<String>,
	/// The authorization identity (whose rights to assume), when it differs
	/// from the authentication identity.
	pub authorization_id: Option<String>,
	/// The password. Never absent on the wire; unset means the empty string.
	pub password: String,
}

impl SaslCredentials {
	/// Credentials for the given mechanism with every identity field unset
	/// and an empty password.
	#[must_use]
	pub fn new(mechanism: &str) -> Self {
		SaslCredentials {
			mechanism: mechanism.to_owned(),
			authentication_id: None,
			realm: None,
			authorization_id: None,
			password: String::new(),
		}
	}

	/// Sets the authentication identity.
	#[must_use]
	pub fn authentication_id(mut self, authentication_id: &str) -> Self {
		self.authentication_id = Some(authentication_id.to_owned());
		self
	}

	/// Sets the realm.
	#[must_use]
	pub fn realm(mut self, realm: &str) -> Self {
		self.realm = Some(realm.to_owned());
		self
	}

	/// Sets the authorization identity.
	#[must_use]
	pub fn authorization_id(mut self, authorization_id: &str) -> Self {
		self.authorization_id = Some(authorization_id.to_owned());
		self
	}

	/// Sets the password.
	#[must_use]
	pub fn password(mut self, password: &str) -> Self {
		self.password = password.to_owned();
		self
	}
}
