//! Access roles and their permission sets.

use serde::Serialize;
use sqlx::FromRow;
use tracing::{info, instrument};

use crate::database::Database;
use crate::error::{Result, map_query_err, map_write_err};

/// Name of the role granted to superusers.
pub const ADMINISTRATOR: &str = "Administrator";

/// Permission bits granted by a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions {
    bits: i32,
}

impl Permissions {
    /// Follow other users.
    pub const FOLLOW: Self = Self { bits: 0b0_0001 };
    /// Comment on content.
    pub const COMMENT: Self = Self { bits: 0b0_0010 };
    /// Publish content.
    pub const WRITE: Self = Self { bits: 0b0_0100 };
    /// Moderate other users' content.
    pub const MODERATE: Self = Self { bits: 0b0_1000 };
    /// Full administrative access.
    pub const ADMIN: Self = Self { bits: 0b1_0000 };

    /// Build a set from its stored representation.
    #[must_use]
    pub const fn from_bits(bits: i32) -> Self {
        Self { bits }
    }

    /// Stored representation.
    #[must_use]
    pub const fn bits(self) -> i32 {
        self.bits
    }

    /// Union of two sets.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Whether every bit of `other` is present.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }
}

/// A role the application guarantees to exist.
#[derive(Debug, Clone, Copy)]
pub struct RoleSeed {
    /// Role name.
    pub name: &'static str,
    /// Permissions granted.
    pub permissions: Permissions,
    /// Whether new users receive this role.
    pub is_default: bool,
}

/// The fixed role set, from least to most privileged.
pub const ROLE_SEEDS: [RoleSeed; 3] = [
    RoleSeed {
        name: "User",
        permissions: Permissions::FOLLOW
            .with(Permissions::COMMENT)
            .with(Permissions::WRITE),
        is_default: true,
    },
    RoleSeed {
        name: "Moderator",
        permissions: Permissions::FOLLOW
            .with(Permissions::COMMENT)
            .with(Permissions::WRITE)
            .with(Permissions::MODERATE),
        is_default: false,
    },
    RoleSeed {
        name: ADMINISTRATOR,
        permissions: Permissions::FOLLOW
            .with(Permissions::COMMENT)
            .with(Permissions::WRITE)
            .with(Permissions::MODERATE)
            .with(Permissions::ADMIN),
        is_default: false,
    },
];

/// Row projection of the `roles` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Role {
    /// Primary key.
    pub id: i32,
    /// Unique role name.
    pub name: String,
    /// Whether new users receive this role.
    pub is_default: bool,
    /// Stored permission bits.
    pub permissions: i32,
}

impl Role {
    /// Typed view of the stored permission bits.
    #[must_use]
    pub const fn permission_set(&self) -> Permissions {
        Permissions::from_bits(self.permissions)
    }
}

const UPSERT_ROLE: &str = r"
    INSERT INTO roles (name, permissions, is_default)
    VALUES ($1, $2, $3)
    ON CONFLICT (name) DO UPDATE
        SET permissions = EXCLUDED.permissions,
            is_default = EXCLUDED.is_default
";

const SELECT_ROLE_BY_NAME: &str =
    r"SELECT id, name, is_default, permissions FROM roles WHERE name = $1";

const SELECT_ROLES: &str = r"SELECT id, name, is_default, permissions FROM roles ORDER BY id";

impl Database {
    /// Ensure every seeded role exists with its current permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if any upsert fails.
    #[instrument(name = "roles.insert_roles", skip(self))]
    pub async fn insert_roles(&self) -> Result<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(map_query_err("roles.insert_roles.begin"))?;
        for seed in &ROLE_SEEDS {
            sqlx::query(UPSERT_ROLE)
                .bind(seed.name)
                .bind(seed.permissions.bits())
                .bind(seed.is_default)
                .execute(&mut *tx)
                .await
                .map_err(map_write_err("roles.upsert"))?;
        }
        tx.commit()
            .await
            .map_err(map_query_err("roles.insert_roles.commit"))?;
        info!(roles = ROLE_SEEDS.len(), "role set ensured");
        Ok(())
    }

    /// Look up a role by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>(SELECT_ROLE_BY_NAME)
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_query_err("roles.find_by_name"))
    }

    /// All roles ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument(name = "roles.list", skip(self))]
    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        sqlx::query_as::<_, Role>(SELECT_ROLES)
            .fetch_all(self.pool())
            .await
            .map_err(map_query_err("roles.list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_seeds_grow_in_privilege() {
        let [user, moderator, admin] = ROLE_SEEDS;
        assert!(user.is_default);
        assert!(!moderator.is_default && !admin.is_default);
        assert!(moderator.permissions.contains(user.permissions));
        assert!(admin.permissions.contains(moderator.permissions));
        assert!(admin.permissions.contains(Permissions::ADMIN));
        assert!(!moderator.permissions.contains(Permissions::ADMIN));
        assert_eq!(admin.name, ADMINISTRATOR);
    }

    #[test]
    fn permission_bits_match_stored_values() {
        assert_eq!(ROLE_SEEDS[0].permissions.bits(), 7);
        assert_eq!(ROLE_SEEDS[1].permissions.bits(), 15);
        assert_eq!(ROLE_SEEDS[2].permissions.bits(), 31);
    }

    #[test]
    fn role_exposes_typed_permissions() {
        let role = Role {
            id: 1,
            name: "Moderator".into(),
            is_default: false,
            permissions: 15,
        };
        assert!(role.permission_set().contains(Permissions::MODERATE));
    }
}
