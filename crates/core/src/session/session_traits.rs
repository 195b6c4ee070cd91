use crate::errors::Result;

/// Identity collaborator: supplies the opaque authenticated user id.
///
/// The core never inspects credentials; it only needs a stable key for the
/// stores. Implementations fail with [`Error::Unauthenticated`] when there
/// is no session.
///
/// [`Error::Unauthenticated`]: crate::errors::Error::Unauthenticated
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Result<String>;
}
