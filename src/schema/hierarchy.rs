//! Type hierarchy index.
//!
//! A directed graph with one edge per base → derived relation. Entity types
//! and complex types each get their own hierarchy.
//!
//! Construction rejects cycles, but every upward walk still tracks visited
//! names so that no query can loop, whatever the input looked like.

use std::collections::{HashMap, HashSet, VecDeque};

use once_cell::sync::OnceCell;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::error::{EntityKind, SchemaError, SchemaResult};

/// Base/derived adjacency for one kind of type.
#[derive(Debug)]
pub struct TypeHierarchy {
    kind: EntityKind,
    /// Edges point from base to derived.
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// Derived name -> base name.
    bases: HashMap<String, String>,
    /// Transitive derived types, computed on first request.
    derived_cache: HashMap<String, OnceCell<Vec<String>>>,
}

impl TypeHierarchy {
    /// Build the hierarchy from `(name, base)` pairs in definition order.
    ///
    /// Fails with `DanglingReference` if a base is not among the names, and
    /// with `CyclicHierarchy` if the base relation loops.
    pub fn build<'a>(
        kind: EntityKind,
        types: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> SchemaResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut bases = HashMap::new();

        for (name, base) in types {
            let idx = graph.add_node(name.to_string());
            node_indices.insert(name.to_string(), idx);
            if let Some(base) = base {
                bases.insert(name.to_string(), base.to_string());
            }
        }

        for (derived, base) in &bases {
            let base_idx = node_indices
                .get(base)
                .ok_or_else(|| SchemaError::dangling(kind, derived, kind, base))?;
            graph.add_edge(*base_idx, node_indices[derived], ());
        }

        let derived_cache = node_indices
            .keys()
            .map(|name| (name.clone(), OnceCell::new()))
            .collect();

        let hierarchy = Self {
            kind,
            graph,
            node_indices,
            bases,
            derived_cache,
        };

        if is_cyclic_directed(&hierarchy.graph) {
            for idx in hierarchy.graph.node_indices() {
                hierarchy.chain(&hierarchy.graph[idx])?;
            }
        }

        Ok(hierarchy)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.node_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_indices.is_empty()
    }

    /// Direct base type of `name`.
    pub fn base_of(&self, name: &str) -> Option<&str> {
        self.bases.get(name).map(String::as_str)
    }

    /// All ancestors of `name`, nearest first.
    pub fn ancestors<'a>(&'a self, name: &'a str) -> SchemaResult<Vec<&'a str>> {
        let mut chain = self.chain(name)?;
        chain.remove(0);
        Ok(chain)
    }

    /// The top of `name`'s inheritance chain (`name` itself for a root).
    pub fn root_of<'a>(&'a self, name: &'a str) -> SchemaResult<&'a str> {
        let chain = self.chain(name)?;
        Ok(chain.last().copied().unwrap_or(name))
    }

    /// Number of ancestors above `name`.
    pub fn depth(&self, name: &str) -> usize {
        self.ancestors(name).map(|a| a.len()).unwrap_or(0)
    }

    /// True if `candidate` is `base` or transitively derives from it.
    pub fn is_base_of(&self, base: &str, candidate: &str) -> SchemaResult<bool> {
        if base == candidate {
            return Ok(true);
        }
        Ok(self.chain(candidate)?.contains(&base))
    }

    /// Types whose base is `name`, in definition order.
    pub fn direct_derived(&self, name: &str) -> Vec<&str> {
        let Some(idx) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(*idx, Direction::Outgoing)
            .collect();
        children.sort();
        children.into_iter().map(|c| self.graph[c].as_str()).collect()
    }

    /// All transitive derived types of `name`, breadth first.
    ///
    /// Computed once per type and cached.
    pub fn derived_types(&self, name: &str) -> &[String] {
        match self.derived_cache.get(name) {
            Some(cell) => cell.get_or_init(|| self.collect_derived(name)),
            None => &[],
        }
    }

    /// Types without a base, in definition order.
    pub fn roots(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].as_str())
            .filter(|name| !self.bases.contains_key(*name))
            .collect()
    }

    /// `name` followed by its ancestors, nearest first.
    fn chain<'a>(&'a self, name: &'a str) -> SchemaResult<Vec<&'a str>> {
        let mut chain = vec![name];
        let mut visited: HashSet<&str> = HashSet::from([name]);
        let mut current = name;

        while let Some(base) = self.bases.get(current) {
            let base = base.as_str();
            if !visited.insert(base) {
                let start = chain.iter().position(|n| *n == base).unwrap_or(0);
                let mut cycle: Vec<String> = chain[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(base.to_string());
                return Err(SchemaError::CyclicHierarchy(cycle));
            }
            chain.push(base);
            current = base;
        }

        Ok(chain)
    }

    fn collect_derived(&self, name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([name]);
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            for child in self.direct_derived(current) {
                if visited.insert(child) {
                    result.push(child.to_string());
                    queue.push_back(child);
                }
            }
        }

        result
    }
}
