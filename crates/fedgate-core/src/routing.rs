//! Routing helpers for composite resource names.
//!
//! Callers address resources as `"scope/local"` or just `"local"`. The
//! scope is everything left of the **last** `/`, so scopes may themselves
//! contain separators (`"acme/us-east/web"` is scope `"acme/us-east"`,
//! local name `"web"`). An empty scope selects the registry default.

/// Separator between a scope and a local name
pub const SCOPE_SEPARATOR: char = '/';

/// A name split into the scope that owns it and its backend-local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeName<'a> {
    /// Scope identifier; empty means "use the default backend"
    pub scope: &'a str,
    /// Name as known to the owning backend
    pub local: &'a str,
}

impl<'a> CompositeName<'a> {
    /// Split `name` on its last separator. Never fails.
    ///
    /// ```
    /// # use fedgate_core::routing::CompositeName;
    /// let name = CompositeName::parse("acme/us-east/web");
    /// assert_eq!(name.scope, "acme/us-east");
    /// assert_eq!(name.local, "web");
    /// assert!(CompositeName::parse("web").is_default_scope());
    /// ```
    pub fn parse(name: &'a str) -> Self {
        match name.rfind(SCOPE_SEPARATOR) {
            Some(idx) => Self {
                scope: &name[..idx],
                local: &name[idx + 1..],
            },
            None => Self {
                scope: "",
                local: name,
            },
        }
    }

    /// Whether no explicit scope was given
    pub fn is_default_scope(&self) -> bool {
        self.scope.is_empty()
    }
}

/// Prepend `"prefix/"` to an ID, or return the ID unchanged when
/// `prefix` is `None`.
///
/// ```
/// # use fedgate_core::routing::prefixed_id;
/// assert_eq!(prefixed_id("web", Some("acme")), "acme/web");
/// assert_eq!(prefixed_id("web", None), "web");
/// ```
pub fn prefixed_id(id: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(pfx) => format!("{}{}{}", pfx, SCOPE_SEPARATOR, id),
        None => id.to_string(),
    }
}

/// Scope that owns the siblings of `scope`: everything left of its last
/// separator. `None` when `scope` has no parent of at least two
/// characters (`"a/proj"` has none, `"acme/eu"` has `"acme"`).
///
/// ```
/// # use fedgate_core::routing::parent_scope;
/// assert_eq!(parent_scope("acorn.io/user/proj"), Some("acorn.io/user"));
/// assert_eq!(parent_scope("proj"), None);
/// ```
pub fn parent_scope(scope: &str) -> Option<&str> {
    scope
        .rfind(SCOPE_SEPARATOR)
        .filter(|&idx| idx > 1)
        .map(|idx| &scope[..idx])
}
