//! Ownership policy for users and artworks.
//!
//! Every handler asks this module before mutating anything. Checks run in a
//! fixed order: identity (is this the owner, or staff), then privilege (role
//! flags, artwork owner), and only after an allow does persistence get to
//! report uniqueness conflicts. A caller who fails the identity check never
//! learns anything about the target beyond that.

use serde::Deserialize;

use crate::{
    artworks::repo_types::Artwork, auth::identity::Principal, error::AppError,
    users::repo_types::User,
};

/// A record with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for User {
    fn owner_id(&self) -> i64 {
        self.id
    }
}

impl Owned for Artwork {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

fn is_owner_or_staff(principal: &Principal, target: &impl Owned) -> bool {
    target.owner_id() == principal.id() || principal.is_privileged()
}

/// Privileged flags as they arrive on a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RoleChanges {
    #[serde(default)]
    pub is_staff: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl RoleChanges {
    fn grants_any(&self) -> bool {
        self.is_staff == Some(true) || self.is_admin == Some(true)
    }
}

/// Role flag changes the policy has approved. Only this module can build one,
/// so privileged flags reach a stored user through [`check_user_update`] alone.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoleGrant {
    is_staff: Option<bool>,
    is_admin: Option<bool>,
}

impl RoleGrant {
    pub fn is_empty(&self) -> bool {
        self.is_staff.is_none() && self.is_admin.is_none()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.is_staff {
            user.is_staff = v;
        }
        if let Some(v) = self.is_admin {
            user.is_admin = v;
        }
    }
}

pub fn check_user_create(roles: &RoleChanges) -> Result<(), AppError> {
    if roles.grants_any() {
        return Err(AppError::PrivilegeEscalation("cannot create admin user"));
    }
    Ok(())
}

/// Decide whether `principal` may update `target` and which role flags may change.
pub fn check_user_update(
    principal: &Principal,
    target: &User,
    roles: &RoleChanges,
) -> Result<RoleGrant, AppError> {
    if !is_owner_or_staff(principal, target) {
        return Err(AppError::Forbidden("cannot alter foreign user"));
    }

    let is_self = target.id == principal.id();
    let mut grant = RoleGrant::default();
    for (requested, current, slot) in [
        (roles.is_staff, target.is_staff, &mut grant.is_staff),
        (roles.is_admin, target.is_admin, &mut grant.is_admin),
    ] {
        let Some(requested) = requested else { continue };
        if requested == current {
            continue;
        }
        // Applies to existing admins too: nobody changes their own flags.
        if is_self {
            return Err(AppError::PrivilegeEscalation("cannot change own privileges"));
        }
        if !principal.is_privileged() {
            return Err(AppError::PrivilegeEscalation("cannot make user admin"));
        }
        *slot = Some(requested);
    }
    Ok(grant)
}

/// Self-deletion only; staff get no override here.
pub fn check_user_delete(principal: &Principal, target: &User) -> Result<(), AppError> {
    if target.id != principal.id() {
        return Err(AppError::Forbidden("cannot delete foreign user"));
    }
    Ok(())
}

pub fn can_view_artwork(principal: &Principal, artwork: &Artwork) -> bool {
    artwork.public || is_owner_or_staff(principal, artwork)
}

/// Private artworks read as absent to anyone who may not see them.
pub fn check_artwork_read(principal: &Principal, artwork: &Artwork) -> Result<(), AppError> {
    if !can_view_artwork(principal, artwork) {
        return Err(AppError::NotFound("artwork"));
    }
    Ok(())
}

/// Owner of a new artwork, whatever the request body claimed.
pub fn owner_for_new_artwork(principal: &Principal) -> i64 {
    principal.id()
}

pub fn check_artwork_update(
    principal: &Principal,
    artwork: &Artwork,
    requested_owner: Option<i64>,
) -> Result<(), AppError> {
    check_artwork_read(principal, artwork)?;
    if !is_owner_or_staff(principal, artwork) {
        return Err(AppError::Forbidden("cannot alter foreign artwork"));
    }
    match requested_owner {
        Some(owner) if owner != artwork.owner_id => {
            Err(AppError::PrivilegeEscalation("artwork owner is fixed"))
        }
        _ => Ok(()),
    }
}

pub fn check_artwork_delete(principal: &Principal, artwork: &Artwork) -> Result<(), AppError> {
    check_artwork_read(principal, artwork)?;
    if !is_owner_or_staff(principal, artwork) {
        return Err(AppError::Forbidden("cannot delete foreign artwork"));
    }
    Ok(())
}

pub fn check_star(principal: &Principal, artwork: &Artwork) -> Result<(), AppError> {
    check_artwork_read(principal, artwork)
}
