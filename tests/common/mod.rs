use std::error::Error;

use ldap3::LdapConnAsync;

/// Suffix of the docker fixture directory.
const BASE_DN: &str = "dc=example,dc=org";

fn ou_dn(ou: &str) -> String {
	format!("ou={ou},{BASE_DN}")
}

fn user_dn(cn: &str) -> String {
	format!("cn={cn},ou=users,{BASE_DN}")
}

/// Opens an administrative fixture connection, bypassing the crate under
/// test.
pub async fn ldap_connect() -> Result<ldap3::Ldap, Box<dyn Error>> {
	let (conn, mut ldap) = LdapConnAsync::new("ldap://localhost:1389").await?;
	let _handle = tokio::spawn(async move {
		if let Err(err) = conn.drive().await {
			panic!("Ldap connection error {err}");
		}
	});
	ldap.simple_bind(&format!("cn=admin,{BASE_DN}"), "adminpassword").await?;
	Ok(ldap)
}

pub async fn ldap_add_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(&ou_dn(ou), vec![("objectClass", ["organizationalUnit"].into())]).await?.success()?;
	Ok(())
}

pub async fn ldap_delete_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.delete(&ou_dn(ou)).await?.success()?;
	Ok(())
}

pub async fn ldap_add_user(
	ldap: &mut ldap3::Ldap,
	cn: &str,
	sn: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(
		&user_dn(cn),
		vec![("objectClass", ["inetOrgPerson"].into()), ("sn", [sn].into())],
	)
	.await?
	.success()?;
	Ok(())
}

pub async fn ldap_delete_user(ldap: &mut ldap3::Ldap, cn: &str) -> Result<(), Box<dyn Error>> {
	ldap.delete(&user_dn(cn)).await?.success()?;
	Ok(())
}
