//! # Dependency Resolver
//!
//! Orders divisions so every division comes after the divisions it depends
//! on.
//!
//! ## Algorithm
//!
//! Depth-first traversal with two markers per node:
//!
//! - **temporary**: the node is on the current DFS path
//! - **permanent**: the node and all its dependencies are already ordered
//!
//! Roots are visited in input order and dependencies in declared order, so
//! the output is deterministic for a given input. Reaching a temporary node
//! again means the path closed on itself: resolution fails with the cycle
//! path. Dependencies that name no known division are skipped.

use std::collections::{HashMap, HashSet};

use division_types::DivisionError;
use tracing::debug;

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub name: String,
    pub depends_on: Vec<String>,
}

impl DependencyNode {
    pub fn new<I, S>(name: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
        }
    }
}

/// Produce a dependency-first ordering of `nodes`.
///
/// # Errors
///
/// Returns [`DivisionError::Cycle`] with the whole traversal path from the
/// root that reached the cycle through the repeated node, e.g.
/// `root -> a -> b -> a`.
pub fn resolve_order(nodes: &[DependencyNode]) -> Result<Vec<String>, DivisionError> {
    let index: HashMap<&str, &DependencyNode> =
        nodes.iter().map(|node| (node.name.as_str(), node)).collect();

    let mut resolver = Resolver {
        index,
        permanent: HashSet::new(),
        temporary: HashSet::new(),
        path: Vec::new(),
        order: Vec::with_capacity(nodes.len()),
    };

    for node in nodes {
        resolver.visit(node)?;
    }

    debug!("[Resolver] Resolved order: {}", resolver.order.join(", "));
    Ok(resolver.order)
}

struct Resolver<'a> {
    index: HashMap<&'a str, &'a DependencyNode>,
    permanent: HashSet<&'a str>,
    temporary: HashSet<&'a str>,
    path: Vec<&'a str>,
    order: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, node: &'a DependencyNode) -> Result<(), DivisionError> {
        let name = node.name.as_str();

        if self.permanent.contains(name) {
            return Ok(());
        }

        if self.temporary.contains(name) {
            return Err(self.cycle_error(name));
        }

        self.temporary.insert(name);
        self.path.push(name);

        for dependency in &node.depends_on {
            // Unknown dependencies impose no ordering
            if let Some(dep_node) = self.index.get(dependency.as_str()).copied() {
                self.visit(dep_node)?;
            }
        }

        self.path.pop();
        self.temporary.remove(name);
        self.permanent.insert(name);
        self.order.push(node.name.clone());

        Ok(())
    }

    fn cycle_error(&self, repeated: &str) -> DivisionError {
        let path = self
            .path
            .iter()
            .copied()
            .chain(std::iter::once(repeated))
            .map(str::to_string)
            .collect();

        DivisionError::Cycle { path }
    }
}
