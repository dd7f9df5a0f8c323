//! Tenant registry resolving which sign-in identity owns a resource.

// self
use crate::{_prelude::*, auth::ResourceUri};

/// Failures raised while resolving a sign-in identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum TenantError {
	/// A directory resource was requested but no registered tenant carries the target role.
	#[error("No registered tenant carries the target role.")]
	NoTargetTenant,
}

/// One registered tenant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tenant {
	/// Tenant name matched against resource URIs; a case-insensitive identity.
	pub name: String,
	/// Sign-in identity used for resources under this tenant.
	pub login_identity: String,
	/// Whether this tenant is the migration target.
	pub is_target: bool,
}

/// Registry of known tenants with first-registered-wins resolution order.
pub struct TenantRegistry {
	directory_host: String,
	tenants: RwLock<Vec<Tenant>>,
}
impl TenantRegistry {
	/// Creates an empty registry.
	///
	/// `directory_host` is the identity provider's directory API host; resources mentioning it
	/// always resolve to the target tenant's sign-in identity.
	pub fn new(directory_host: impl Into<String>) -> Self {
		Self {
			directory_host: directory_host.into().to_lowercase(),
			tenants: RwLock::new(Vec::new()),
		}
	}

	/// Registers a tenant, keeping the existing entry when the name is already present.
	///
	/// Names compare case-insensitively and the first registration wins, so re-registering never
	/// reorders resolution and never replaces a sign-in identity.
	pub fn register(
		&self,
		name: impl Into<String>,
		login_identity: impl Into<String>,
		is_target: bool,
	) {
		let name = name.into();
		let mut tenants = self.tenants.write();

		if tenants.iter().any(|tenant| tenant.name.eq_ignore_ascii_case(&name)) {
			tracing::debug!(
				tenant = name.as_str(),
				"Tenant is already registered; keeping the existing entry.",
			);

			return;
		}

		tenants.push(Tenant { name, login_identity: login_identity.into(), is_target });
	}

	/// Number of registered tenants.
	pub fn len(&self) -> usize {
		self.tenants.read().len()
	}

	/// Returns `true` when no tenant has been registered.
	pub fn is_empty(&self) -> bool {
		self.tenants.read().is_empty()
	}

	/// Resolves which sign-in identity should request tokens for the given resource.
	///
	/// Directory resources resolve to the target tenant's identity and fail when no target is
	/// registered. Any other resource resolves to the first registered tenant whose name occurs
	/// inside the URI, or `None` when no tenant matches.
	pub fn resolve_username(&self, resource: &ResourceUri) -> Result<Option<String>, TenantError> {
		let haystack = resource.as_str().to_lowercase();
		let tenants = self.tenants.read();

		if haystack.contains(&self.directory_host) {
			return tenants
				.iter()
				.find(|tenant| tenant.is_target)
				.map(|tenant| Some(tenant.login_identity.clone()))
				.ok_or(TenantError::NoTargetTenant);
		}

		Ok(tenants
			.iter()
			.find(|tenant| haystack.contains(&tenant.name.to_lowercase()))
			.map(|tenant| tenant.login_identity.clone()))
	}
}
