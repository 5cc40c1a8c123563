//! The Identity Resolver: maps an inbound [`Principal`] to a canonical
//! [`User`] row.
//!
//! Resolution is a two-step strategy. The principal's id is tried as a
//! primary key first; if that misses (or names a user with a different
//! role) the `(email, role)` pair is tried instead, and the row it finds is
//! authoritative from then on. Falling back is silent. Only when both steps
//! miss does the caller see [`Error::ActorNotFound`].

use rand_core::{OsRng, RngCore as _};
use tracing::{debug, info};

use crate::{
  Error, Result,
  store::RollStore,
  user::{NewUser, Principal, Role, User},
};

pub struct IdentityResolver<'a, S> {
  store: &'a S,
}

impl<'a, S: RollStore> IdentityResolver<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// `resolveActor(principal)`. Never creates rows.
  pub async fn resolve(&self, principal: &Principal) -> Result<User> {
    self.lookup(principal).await?.ok_or(Error::ActorNotFound)
  }

  /// Get-or-create for teachers on a write path.
  ///
  /// If neither lookup matches and the principal claims the teacher role, a
  /// minimal teacher row is created with an unusable placeholder credential.
  /// Any other role falls through to [`Error::ActorNotFound`].
  pub async fn resolve_or_provision(&self, principal: &Principal) -> Result<User> {
    if let Some(user) = self.lookup(principal).await? {
      return Ok(user);
    }
    let email = principal.email.trim();
    if principal.role != Role::Teacher || email.is_empty() {
      return Err(Error::ActorNotFound);
    }

    let user = self
      .store
      .create_user(NewUser {
        name:       name_from_email(email),
        email:      email.to_owned(),
        role:       Role::Teacher,
        credential: Some(placeholder_credential()),
      })
      .await
      .map_err(Error::store)?;

    info!(
      user_id = user.id,
      email = %user.email,
      principal_id = %principal.id,
      "provisioned teacher record for unknown principal"
    );
    Ok(user)
  }

  async fn lookup(&self, principal: &Principal) -> Result<Option<User>> {
    if let Some(id) = principal.numeric_id() {
      match self.store.get_user(id).await.map_err(Error::store)? {
        Some(user) if user.role == principal.role => return Ok(Some(user)),
        Some(user) => debug!(
          user_id = user.id,
          stored_role = %user.role,
          claimed_role = %principal.role,
          "principal id names a user with another role; falling back to email"
        ),
        None => debug!(principal_id = id, "principal id not found; falling back to email"),
      }
    }

    let user = self
      .store
      .find_user_by_email(principal.email.trim().to_owned(), principal.role)
      .await
      .map_err(Error::store)?;
    if let Some(u) = &user {
      debug!(principal_id = %principal.id, user_id = u.id, "resolved actor by email");
    }
    Ok(user)
  }
}

/// A credential no password can ever verify against. The leading `!` is not
/// a valid PHC prefix.
pub fn placeholder_credential() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  format!("!{}", hex::encode(bytes))
}

fn name_from_email(email: &str) -> String {
  email
    .split_once('@')
    .map_or(email, |(local, _)| local)
    .to_owned()
}
