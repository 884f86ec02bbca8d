//! Startup provisioning.
//!
//! Creates the configured admin account on first start so a fresh in-memory
//! instance is usable without going through the signup endpoint.

use recipebox_auth::{AuthError, UserStorage, hash_password};
use recipebox_core::{NewUser, User, normalize_email};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Creates the bootstrap superuser if one is configured and missing.
///
/// Returns the created user, or `None` when nothing was configured or the
/// account already exists.
pub async fn bootstrap_admin_user(
    users: &dyn UserStorage,
    cfg: &AppConfig,
) -> anyhow::Result<Option<User>> {
    let Some(admin) = cfg.bootstrap.admin_user.as_ref() else {
        return Ok(None);
    };

    let email = normalize_email(&admin.email)
        .map_err(|e| anyhow::anyhow!("bootstrap.admin_user.email: {e}"))?;

    if users.find_user_by_email(&email).await?.is_some() {
        info!(email = %email, "Admin user already exists, skipping bootstrap");
        return Ok(None);
    }

    let password = admin.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    let new_user = NewUser::new(email.clone(), admin.name.clone().unwrap_or_default(), hash)
        .superuser();

    match users.create_user(new_user).await {
        Ok(user) => {
            info!(email = %email, user_id = %user.id, "Bootstrapped admin user");
            Ok(Some(user))
        }
        Err(AuthError::EmailTaken { .. }) => {
            warn!(email = %email, "Admin user was created concurrently, skipping bootstrap");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
