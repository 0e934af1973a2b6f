//! [`IdentifierProvider`] adapters.
//!
//! Every overlay lookup goes through an id, so items either act as their own
//! id or have one extracted by a closure.

use std::fmt;
use std::hash::Hash;

use crate::error::IdentityError;
use crate::traits::IdentifierProvider;

/// Uses a clone of the item itself as its id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueIdentity;

impl<T> IdentifierProvider<T> for ValueIdentity
where
    T: Clone + Eq + Hash,
{
    type Id = T;

    fn identify(&self, item: &T) -> Result<T, IdentityError> {
        Ok(item.clone())
    }
}

/// Extracts ids with a closure.
///
/// ```
/// use itemstore::error::IdentityError;
/// use itemstore::provider::FnIdentity;
/// use itemstore::traits::IdentifierProvider;
///
/// struct User { id: u64, name: String }
///
/// let ids = FnIdentity::new(|user: &User| Ok::<_, IdentityError>(user.id));
/// let user = User { id: 7, name: "ada".into() };
/// assert_eq!(ids.identify(&user).unwrap(), 7);
/// ```
#[derive(Clone)]
pub struct FnIdentity<F> {
    extract: F,
}

impl<F> FnIdentity<F> {
    pub fn new(extract: F) -> Self {
        Self { extract }
    }
}

impl<T, Id, F> IdentifierProvider<T> for FnIdentity<F>
where
    F: Fn(&T) -> Result<Id, IdentityError>,
    Id: Clone + Eq + Hash,
{
    type Id = Id;

    fn identify(&self, item: &T) -> Result<Id, IdentityError> {
        (self.extract)(item)
    }
}

impl<F> fmt::Debug for FnIdentity<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnIdentity").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_identity_is_the_item() {
        assert_eq!(ValueIdentity.identify(&"x").unwrap(), "x");
    }

    #[test]
    fn fn_identity_propagates_failure() {
        let ids = FnIdentity::new(|value: &i32| {
            u32::try_from(*value).map_err(|err| IdentityError::with_source("negative id", err))
        });
        assert_eq!(ids.identify(&3).unwrap(), 3);
        let err = ids.identify(&-1).unwrap_err();
        assert_eq!(err.message(), "negative id");
    }
}
