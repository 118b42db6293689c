//! Administrative account creation.

use anyhow::Context as _;
use keystone_data::{ADMINISTRATOR, DataError, Database, NewUser, User};
use tracing::info;

use crate::context::CommandContext;
use crate::error::{CliError, CliResult};
use crate::prompt::{OptionSpec, Prompter, fill};

pub(crate) const EMAIL: OptionSpec = OptionSpec {
    name: "email",
    prompt: "Enter email",
    secret: false,
    confirm: false,
};

pub(crate) const USERNAME: OptionSpec = OptionSpec {
    name: "username",
    prompt: "Enter username",
    secret: false,
    confirm: false,
};

pub(crate) const PASSWORD: OptionSpec = OptionSpec {
    name: "password",
    prompt: "Enter password",
    secret: true,
    confirm: true,
};

/// Resolved account details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SuperuserInput {
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) password: String,
}

impl SuperuserInput {
    /// Fill every missing field by prompting, in flag order.
    pub(crate) fn resolve(
        email: Option<String>,
        username: Option<String>,
        password: Option<String>,
        prompter: &mut dyn Prompter,
    ) -> CliResult<Self> {
        Ok(Self {
            email: fill(&EMAIL, email, prompter)?,
            username: fill(&USERNAME, username, prompter)?,
            password: fill(&PASSWORD, password, prompter)?,
        })
    }
}

pub(crate) async fn handle_createsuperuser(
    ctx: &CommandContext,
    input: SuperuserInput,
) -> CliResult<()> {
    let db = ctx.database().await?;
    let user = create_superuser(db, &input)
        .await
        .with_context(|| format!("superuser `{}` not created", input.username))
        .map_err(CliError::failure)?;
    info!(user_id = user.id, username = %user.username, "superuser created");
    println!("superuser created successfully");
    Ok(())
}

/// Ensure schema and roles, then insert a confirmed administrator.
///
/// Nothing is checked before the insert; duplicate emails or usernames
/// surface as [`DataError::Conflict`].
pub(crate) async fn create_superuser(
    db: &Database,
    input: &SuperuserInput,
) -> Result<User, DataError> {
    db.create_all().await?;
    db.insert_roles().await?;
    let role = db
        .find_role_by_name(ADMINISTRATOR)
        .await?
        .ok_or_else(|| DataError::RoleMissing {
            name: ADMINISTRATOR.to_string(),
        })?;
    db.create_user(NewUser {
        email: &input.email,
        username: &input.username,
        password: &input.password,
        confirmed: true,
        role_id: Some(role.id),
    })
    .await
}
