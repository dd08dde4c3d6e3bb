//! Staff roles and the single rule deciding whether a role grants access.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Role held by a console user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access; satisfies every role check.
    Administrator,
    Salesperson,
    Warehouse,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Salesperson, Role::Warehouse];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Salesperson => "salesperson",
            Self::Warehouse => "warehouse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "administrator" => Ok(Self::Administrator),
            "salesperson" => Ok(Self::Salesperson),
            "warehouse" => Ok(Self::Warehouse),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Whether a user holding `actual` may access something that needs `required`.
///
/// Administrators are implicitly granted every role.
#[must_use]
pub fn satisfies(required: Role, actual: Role) -> bool {
    actual == Role::Administrator || actual == required
}

/// Whether `actual` satisfies at least one of `allowed`.
#[must_use]
pub fn satisfies_any(allowed: &[Role], actual: Role) -> bool {
    actual == Role::Administrator || allowed.contains(&actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_satisfies_every_role() {
        for required in Role::ALL {
            assert!(satisfies(required, Role::Administrator));
        }
        assert!(satisfies_any(&[], Role::Administrator));
    }

    #[test]
    fn other_roles_only_satisfy_themselves() {
        assert!(satisfies(Role::Salesperson, Role::Salesperson));
        assert!(!satisfies(Role::Administrator, Role::Salesperson));
        assert!(!satisfies(Role::Warehouse, Role::Salesperson));
        assert!(satisfies_any(
            &[Role::Salesperson, Role::Warehouse],
            Role::Warehouse
        ));
        assert!(!satisfies_any(&[Role::Salesperson], Role::Warehouse));
    }

    #[test]
    fn role_parses_its_own_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!(
            "Administrator".parse::<Role>(),
            Err(UnknownRole("Administrator".to_string()))
        );
    }

    #[test]
    fn role_serializes_snake_case() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::to_string(&Role::Salesperson)?,
            "\"salesperson\""
        );
        let role: Role = serde_json::from_str("\"warehouse\"")?;
        assert_eq!(role, Role::Warehouse);
        Ok(())
    }
}
