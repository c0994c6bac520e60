use tracing::warn;

use super::claims::SessionClaim;
use crate::{
    error::AppError,
    users::{repo::UserRepo, repo_types::User},
};

/// The stored user behind an authenticated request.
#[derive(Debug, Clone)]
pub struct Principal(User);

impl Principal {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn is_privileged(&self) -> bool {
        self.0.is_privileged()
    }

    pub fn into_user(self) -> User {
        self.0
    }
}

/// Looks up the user named by the claim's subject. One lookup, no side effects.
pub async fn resolve(
    users: &dyn UserRepo,
    claim: &SessionClaim,
) -> Result<Option<Principal>, AppError> {
    Ok(users
        .find_by_username(&claim.subject)
        .await?
        .map(Principal))
}

/// Like [`resolve`], but a claim naming no stored user is an auth failure.
pub async fn require(users: &dyn UserRepo, claim: &SessionClaim) -> Result<Principal, AppError> {
    match resolve(users, claim).await? {
        Some(p) => Ok(p),
        None => {
            warn!(subject = %claim.subject, "session subject has no user");
            Err(AppError::Unauthenticated)
        }
    }
}

#[cfg(test)]
pub(crate) fn principal_for(user: User) -> Principal {
    Principal(user)
}
