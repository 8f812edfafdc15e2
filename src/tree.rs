//! Per-method segment tree.
//!
//! Each HTTP method gets its own tree. A path pattern is split on `/`, empty
//! segments are dropped, and each remaining segment becomes one level of the
//! tree: `:name` segments are variables, everything else is a literal matched
//! case-insensitively.
//!
//! At any one level a node has either a single variable child or any number
//! of literal children, never both. [`Children`] encodes that directly, so a
//! concrete path can reach at most one node and lookup never has to rank
//! candidates. Registrations that would break the rule fail with a
//! [`RouteError`].
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. They are
//! created during setup and never removed.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::error::RouteError;
use crate::handler::BoxedHandler;
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::route::Route;

const SEPARATOR: char = '/';
const VARIABLE_MARKER: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Root,
    Literal,
    Variable,
}

enum Children {
    Empty,
    /// Keyed by the lowercased label.
    Literals(HashMap<String, NodeId>),
    Variable(NodeId),
}

struct Node {
    kind: Kind,
    /// Lowercased literal text, or the variable's bind name.
    label: String,
    children: Children,
    route: Option<Route>,
    middleware: Vec<BoxedMiddleware>,
}

impl Node {
    fn new(kind: Kind, label: String) -> Self {
        Self {
            kind,
            label,
            children: Children::Empty,
            route: None,
            middleware: Vec::new(),
        }
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Percent-decodes one request segment. Segments that do not decode to
/// UTF-8 are matched as sent.
fn decode_segment(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(segment))
}

fn parse_segment(segment: &str) -> Segment<'_> {
    match segment.strip_prefix(VARIABLE_MARKER) {
        Some(name) => Segment::Variable(name),
        None => Segment::Literal(segment),
    }
}

/// Result of walking a request path.
pub(crate) struct Resolved<'t> {
    /// The route at the terminal node, if the walk completed and one exists.
    pub(crate) route: Option<&'t Route>,
    /// Variable bindings in the order they were made, root first.
    pub(crate) params: Vec<(String, String)>,
    /// Subtree middleware of every node entered, root first.
    pub(crate) middleware: Vec<BoxedMiddleware>,
}

pub(crate) struct MethodTree {
    nodes: Vec<Node>,
}

impl MethodTree {
    pub(crate) fn new() -> Self {
        Self { nodes: vec![Node::new(Kind::Root, String::new())] }
    }

    /// Attaches `handler` at the node for `pattern`, creating nodes on the
    /// way. Returns the new route and whether it replaced an existing one.
    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(&mut Route, bool), RouteError> {
        let id = self.node_for(pattern)?;
        let node = &mut self.nodes[id.0];
        let replaced = node.route.is_some();
        Ok((node.route.insert(Route::new(handler)), replaced))
    }

    /// Appends subtree middleware at the node for `pattern`. The node need
    /// not carry a route.
    pub(crate) fn layer_at(
        &mut self,
        pattern: &str,
        middleware: impl Middleware,
    ) -> Result<(), RouteError> {
        let id = self.node_for(pattern)?;
        self.nodes[id.0].middleware.push(Arc::new(middleware));
        Ok(())
    }

    /// Walks `path` from the root. Never fails: a segment with no matching
    /// child or a terminal node without a route both yield `route: None`.
    ///
    /// Segments are split before they are percent-decoded, so an encoded
    /// `%2F` stays inside its segment.
    pub(crate) fn resolve(&self, path: &str) -> Resolved<'_> {
        let mut params = Vec::new();
        let mut middleware: Vec<BoxedMiddleware> = self.nodes[ROOT.0].middleware.clone();
        let mut current = ROOT;

        for raw in segments(path) {
            let segment = decode_segment(raw);
            let Some(next) = self.child(current, &segment) else {
                debug!(segment = raw, "no matching path segment");
                return Resolved { route: None, params, middleware };
            };
            let node = &self.nodes[next.0];
            if node.kind == Kind::Variable {
                params.push((node.label.clone(), segment.into_owned()));
            }
            middleware.extend(node.middleware.iter().cloned());
            current = next;
        }

        Resolved {
            route: self.nodes[current.0].route.as_ref(),
            params,
            middleware,
        }
    }

    fn child(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        match &self.nodes[parent.0].children {
            Children::Variable(id) => Some(*id),
            Children::Literals(map) => map.get(&segment.to_lowercase()).copied(),
            Children::Empty => None,
        }
    }

    fn node_for(&mut self, pattern: &str) -> Result<NodeId, RouteError> {
        let mut current = ROOT;
        for segment in segments(pattern) {
            current = match parse_segment(segment) {
                Segment::Literal(label) => self.literal_child(current, label, pattern)?,
                Segment::Variable(name) => self.variable_child(current, name, pattern)?,
            };
        }
        Ok(current)
    }

    fn literal_child(
        &mut self,
        parent: NodeId,
        label: &str,
        pattern: &str,
    ) -> Result<NodeId, RouteError> {
        let key = label.to_lowercase();

        match &self.nodes[parent.0].children {
            Children::Variable(var) => {
                return Err(RouteError::LiteralAfterVariable {
                    pattern: pattern.to_owned(),
                    segment: label.to_owned(),
                    existing: self.nodes[var.0].label.clone(),
                });
            }
            Children::Literals(map) => {
                if let Some(&id) = map.get(&key) {
                    debug!(segment = %key, "found literal segment");
                    return Ok(id);
                }
            }
            Children::Empty => {}
        }

        debug!(segment = %key, "creating literal segment");
        let id = self.push(Node::new(Kind::Literal, key.clone()));
        match &mut self.nodes[parent.0].children {
            Children::Literals(map) => {
                map.insert(key, id);
            }
            children => *children = Children::Literals(HashMap::from([(key, id)])),
        }
        Ok(id)
    }

    fn variable_child(
        &mut self,
        parent: NodeId,
        name: &str,
        pattern: &str,
    ) -> Result<NodeId, RouteError> {
        match &self.nodes[parent.0].children {
            Children::Variable(var) => {
                let existing = &self.nodes[var.0].label;
                if existing == name {
                    debug!(variable = name, "found variable segment");
                    return Ok(*var);
                }
                return Err(RouteError::ConflictingVariable {
                    pattern: pattern.to_owned(),
                    segment: name.to_owned(),
                    existing: existing.clone(),
                });
            }
            Children::Literals(_) => {
                return Err(RouteError::VariableAfterLiteral {
                    pattern: pattern.to_owned(),
                    segment: name.to_owned(),
                });
            }
            Children::Empty => {}
        }

        debug!(variable = name, "creating variable segment");
        let id = self.push(Node::new(Kind::Variable, name.to_owned()));
        self.nodes[parent.0].children = Children::Variable(id);
        Ok(id)
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::middleware::from_fn;

    fn noop() -> BoxedHandler {
        handler_fn(|_, _, _| {})
    }

    fn passthrough() -> impl Middleware {
        from_fn(|next: BoxedHandler| next)
    }

    #[test]
    fn binds_variable_segments() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/:id/details/:detail", noop()).unwrap();

        let resolved = tree.resolve("/tests/42/DETAILS/7");
        assert!(resolved.route.is_some());
        assert_eq!(
            resolved.params,
            [("id".to_owned(), "42".to_owned()), ("detail".to_owned(), "7".to_owned())]
        );
    }

    #[test]
    fn request_segments_are_percent_decoded() {
        let mut tree = MethodTree::new();
        tree.insert("/users/:name/files/:file", noop()).unwrap();
        tree.insert("/café", noop()).unwrap();

        let resolved = tree.resolve("/users/john%20doe/FILES/a%2Fb");
        assert!(resolved.route.is_some());
        assert_eq!(
            resolved.params,
            [("name".to_owned(), "john doe".to_owned()), ("file".to_owned(), "a/b".to_owned())]
        );
        assert!(tree.resolve("/caf%C3%A9").route.is_some());
        assert!(tree.resolve("/CAF%C3%89").route.is_some());

        let undecodable = tree.resolve("/users/bad%FF/files/x");
        assert_eq!(undecodable.params[0].1, "bad%FF");
    }

    #[test]
    fn literal_matching_ignores_case() {
        let mut tree = MethodTree::new();
        tree.insert("/Tests/Green", noop()).unwrap();
        assert!(tree.resolve("/tests/green").route.is_some());
        assert!(tree.resolve("/TESTS/GREEN").route.is_some());
        assert!(tree.resolve("/tests/blue").route.is_none());
    }

    #[test]
    fn empty_segments_are_ignored() {
        let mut tree = MethodTree::new();
        tree.insert("tests//green/", noop()).unwrap();
        assert!(tree.resolve("/tests/green").route.is_some());
        assert!(tree.resolve("//tests/green//").route.is_some());
    }

    #[test]
    fn too_deep_and_too_shallow_are_misses() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/:id", noop()).unwrap();
        assert!(tree.resolve("/tests/42/details").route.is_none());
        assert!(tree.resolve("/tests").route.is_none());
    }

    #[test]
    fn root_pattern_attaches_at_root() {
        let mut tree = MethodTree::new();
        tree.insert("/", noop()).unwrap();
        let resolved = tree.resolve("/");
        assert!(resolved.route.is_some());
        assert!(resolved.params.is_empty());
        assert!(tree.resolve("").route.is_some());
    }

    #[test]
    fn literal_after_variable_conflicts() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/:id", noop()).unwrap();
        let err = tree.insert("/tests/green", noop()).err().unwrap();
        assert!(matches!(err, RouteError::LiteralAfterVariable { ref existing, .. } if existing == "id"));
    }

    #[test]
    fn variable_after_literal_conflicts() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/green", noop()).unwrap();
        let err = tree.insert("/tests/:id", noop()).err().unwrap();
        assert!(matches!(err, RouteError::VariableAfterLiteral { .. }));
    }

    #[test]
    fn differently_named_variables_conflict() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/:testId", noop()).unwrap();
        let err = tree.insert("/tests/:id", noop()).err().unwrap();
        assert_eq!(
            err,
            RouteError::ConflictingVariable {
                pattern: "/tests/:id".to_owned(),
                segment: "id".to_owned(),
                existing: "testId".to_owned(),
            }
        );
    }

    #[test]
    fn same_segments_reuse_nodes() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/:id", noop()).unwrap();
        let before = tree.len();
        tree.insert("/tests/:id/details", noop()).unwrap();
        tree.insert("/TESTS/:id", noop()).unwrap();
        assert_eq!(tree.len(), before + 1);
    }

    #[test]
    fn reinserting_reports_replacement() {
        let mut tree = MethodTree::new();
        assert!(!tree.insert("/tests", noop()).unwrap().1);
        assert!(tree.insert("/tests", noop()).unwrap().1);
    }

    #[test]
    fn collects_subtree_middleware_root_first() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/a/b", noop()).unwrap();
        tree.insert("/other", noop()).unwrap();
        tree.layer_at("/", passthrough()).unwrap();
        tree.layer_at("/tests", passthrough()).unwrap();
        tree.layer_at("/tests/a/b", passthrough()).unwrap();

        assert_eq!(tree.resolve("/tests/a/b").middleware.len(), 3);
        assert_eq!(tree.resolve("/other").middleware.len(), 1);
    }

    #[test]
    fn subtree_middleware_checks_conflicts() {
        let mut tree = MethodTree::new();
        tree.insert("/tests/:id", noop()).unwrap();
        assert!(tree.layer_at("/tests/green", passthrough()).is_err());
        assert!(tree.layer_at("/tests/:id", passthrough()).is_ok());
    }
}
