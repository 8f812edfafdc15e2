//! Per-request context.

/// State that travels with one request through the middleware chain.
///
/// Created fresh by [`Router::dispatch`](crate::Router::dispatch) for every
/// matched request and dropped when the chain returns. It is passed as
/// `&mut Context`, so middleware can attach data (the authenticated identity)
/// for the layers beneath it.
#[derive(Debug, Default, Clone)]
pub struct Context {
    params: Vec<(String, String)>,
    identity: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_params(params: Vec<(String, String)>) -> Self {
        Self { params, identity: None }
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `cx.param("id")` on `/users/42` returns
    /// `Some("42")`. If a name is bound more than once along the path, the
    /// binding closest to the root wins.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All path parameters in the order they were bound, root first.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The identity attached by an authentication middleware, if any ran and
    /// succeeded.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.identity = Some(identity.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_binding_wins() {
        let cx = Context::with_params(vec![
            ("id".to_owned(), "outer".to_owned()),
            ("id".to_owned(), "inner".to_owned()),
        ]);
        assert_eq!(cx.param("id"), Some("outer"));
        assert_eq!(cx.param("missing"), None);
        assert_eq!(cx.params().count(), 2);
    }

    #[test]
    fn identity_is_absent_until_set() {
        let mut cx = Context::new();
        assert_eq!(cx.identity(), None);
        cx.set_identity("alice");
        assert_eq!(cx.identity(), Some("alice"));
    }
}
