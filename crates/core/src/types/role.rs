//! User roles and role sets used by the access gate.

use serde::{Deserialize, Serialize};

/// The single role attached to every account.
///
/// Serialized as `USER`, `ADMIN`, `SUPER_ADMIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Storefront customer.
    #[default]
    User,
    /// Full access to catalog, order, and user management.
    Admin,
    /// Admin access plus the super-admin-only operations.
    SuperAdmin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Self; 3] = [Self::User, Self::Admin, Self::SuperAdmin];

    /// The wire/database spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::User => 0b001,
            Self::Admin => 0b010,
            Self::SuperAdmin => 0b100,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// A closed set of roles a resource requires.
///
/// Membership is a bit test, never a string comparison.
///
/// ```
/// use autocatalog_core::{Role, RoleSet};
///
/// assert!(RoleSet::ADMIN.contains(Role::SuperAdmin));
/// assert!(!RoleSet::ADMIN.contains(Role::User));
/// assert!(!RoleSet::SUPER_ADMIN.contains(Role::Admin));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Every signed-in account.
    pub const ANY: Self = Self::of(&Role::ALL);
    /// Admin panel and `/api/admin/*`.
    pub const ADMIN: Self = Self::of(&[Role::Admin, Role::SuperAdmin]);
    /// Super-admin-only subset.
    pub const SUPER_ADMIN: Self = Self::of(&[Role::SuperAdmin]);

    /// Build a set from a list of roles.
    #[must_use]
    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Whether `role` is a member of this set.
    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }

    #[test]
    fn test_role_from_str_is_lenient_for_cli_input() {
        assert_eq!("super_admin".parse::<Role>(), Ok(Role::SuperAdmin));
        assert_eq!("super-admin".parse::<Role>(), Ok(Role::SuperAdmin));
        assert_eq!("User".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_sets() {
        for role in Role::ALL {
            assert!(RoleSet::ANY.contains(role));
        }
        assert!(!RoleSet::ADMIN.contains(Role::User));
        assert!(RoleSet::ADMIN.contains(Role::Admin));
        assert!(RoleSet::ADMIN.contains(Role::SuperAdmin));
        assert!(!RoleSet::SUPER_ADMIN.contains(Role::User));
        assert!(!RoleSet::SUPER_ADMIN.contains(Role::Admin));
        assert!(RoleSet::SUPER_ADMIN.contains(Role::SuperAdmin));
    }
}
