//! Scope-prefixing of returned identifiers.
//!
//! Anything the gateway hands back from a non-default backend must stay
//! addressable, so its identifier becomes `"<scope>/<local>"`. Resources
//! opt in by implementing [`Identified`]; [`Scoped`] lifts the rewrite to
//! the shapes dispatched operations return (single value, optional value,
//! sets, nothing).

use futures::StreamExt;

use crate::backend::LogFeed;
use crate::routing::prefixed_id;

/// A resource with a gettable and settable identifier
pub trait Identified {
    /// Current identifier
    fn id(&self) -> &str;

    /// Replace the identifier
    fn set_id(&mut self, id: String);
}

/// A dispatch result that can be rewritten into a scope
pub trait Scoped {
    /// Prefix every identifier held by `self` with `scope`
    fn apply_scope(&mut self, scope: &str);
}

/// Rewrite a single resource identifier to `"<scope>/<id>"`.
pub fn scope_identifier<T: Identified + ?Sized>(item: &mut T, scope: &str) {
    let id = prefixed_id(item.id(), Some(scope));
    item.set_id(id);
}

// `None` signals "not found"; nothing to rewrite.
impl<T: Identified> Scoped for Option<T> {
    fn apply_scope(&mut self, scope: &str) {
        if let Some(item) = self {
            scope_identifier(item, scope);
        }
    }
}

impl<T: Identified> Scoped for Vec<T> {
    fn apply_scope(&mut self, scope: &str) {
        for item in self.iter_mut() {
            scope_identifier(item, scope);
        }
    }
}

impl Scoped for () {
    fn apply_scope(&mut self, _scope: &str) {}
}

// Log lines name their app; prefix it as each line passes through.
impl Scoped for LogFeed {
    fn apply_scope(&mut self, scope: &str) {
        let scope = scope.to_string();
        let feed = std::mem::replace(self, Box::pin(futures::stream::empty()));
        *self = Box::pin(feed.map(move |mut line| {
            line.app_name = prefixed_id(&line.app_name, Some(&scope));
            line
        }));
    }
}

/// Implement [`Identified`] and [`Scoped`] for resources keyed by a
/// `String` field.
#[macro_export]
macro_rules! identified {
    ($($ty:ty => $field:ident),+ $(,)?) => {
        $(
            impl $crate::scoped::Identified for $ty {
                fn id(&self) -> &str {
                    &self.$field
                }

                fn set_id(&mut self, id: String) {
                    self.$field = id;
                }
            }

            impl $crate::scoped::Scoped for $ty {
                fn apply_scope(&mut self, scope: &str) {
                    $crate::scoped::scope_identifier(self, scope);
                }
            }
        )+
    };
}
