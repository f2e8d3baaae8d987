//! Category hierarchy: path resolution and descendant expansion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tradepost_core::{CategoryId, DomainError, DomainResult, Entity};

/// A node in the category hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
}

impl Category {
    pub fn root(id: CategoryId, name: impl Into<String>) -> DomainResult<Self> {
        Self::new(id, None, name)
    }

    pub fn new(
        id: CategoryId,
        parent_id: Option<CategoryId>,
        name: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self { id, parent_id, name })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

/// Immutable snapshot of the hierarchy for path/descendant queries.
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
    children: HashMap<CategoryId, Vec<CategoryId>>,
}

impl CategoryTree {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut nodes = HashMap::new();
        let mut children: HashMap<CategoryId, Vec<CategoryId>> = HashMap::new();

        for c in categories {
            if let Some(parent) = c.parent_id {
                children.entry(parent).or_default().push(c.id);
            }
            nodes.insert(c.id, c);
        }

        // Deterministic traversal order.
        for v in children.values_mut() {
            v.sort();
        }

        Self { nodes, children }
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    /// Root-to-node id path.
    ///
    /// A dangling parent or a parent cycle is data corruption, reported as an
    /// invariant violation rather than looping forever.
    pub fn path(&self, id: CategoryId) -> DomainResult<Vec<CategoryId>> {
        let mut path = Vec::new();
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            let node = self.nodes.get(&current).ok_or(DomainError::NotFound)?;
            if path.contains(&current) {
                return Err(DomainError::invariant(format!(
                    "category parent cycle at {current}"
                )));
            }
            path.push(current);
            cursor = node.parent_id;
        }

        path.reverse();
        Ok(path)
    }

    /// The node itself plus every descendant (breadth-first).
    pub fn descendants(&self, id: CategoryId) -> DomainResult<Vec<CategoryId>> {
        if !self.nodes.contains_key(&id) {
            return Err(DomainError::NotFound);
        }

        let mut out = vec![id];
        let mut queue = vec![id];

        while let Some(current) = queue.pop() {
            if let Some(kids) = self.children.get(&current) {
                for &kid in kids {
                    if out.contains(&kid) {
                        return Err(DomainError::invariant(format!(
                            "category parent cycle at {kid}"
                        )));
                    }
                    out.push(kid);
                    queue.push(kid);
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (CategoryTree, CategoryId, CategoryId, CategoryId, CategoryId) {
        let machinery = CategoryId::new();
        let pumps = CategoryId::new();
        let centrifugal = CategoryId::new();
        let textiles = CategoryId::new();

        let tree = CategoryTree::new([
            Category::root(machinery, "Machinery").unwrap(),
            Category::new(pumps, Some(machinery), "Pumps").unwrap(),
            Category::new(centrifugal, Some(pumps), "Centrifugal pumps").unwrap(),
            Category::root(textiles, "Textiles").unwrap(),
        ]);

        (tree, machinery, pumps, centrifugal, textiles)
    }

    #[test]
    fn path_runs_root_to_leaf() {
        let (tree, machinery, pumps, centrifugal, _) = tree();
        assert_eq!(tree.path(centrifugal).unwrap(), vec![machinery, pumps, centrifugal]);
        assert_eq!(tree.path(machinery).unwrap(), vec![machinery]);
    }

    #[test]
    fn descendants_include_self_and_all_children() {
        let (tree, machinery, pumps, centrifugal, textiles) = tree();

        let mut got = tree.descendants(machinery).unwrap();
        got.sort();
        let mut want = vec![machinery, pumps, centrifugal];
        want.sort();
        assert_eq!(got, want);

        assert_eq!(tree.descendants(textiles).unwrap(), vec![textiles]);
    }

    #[test]
    fn unknown_node_is_not_found() {
        let (tree, ..) = tree();
        assert_eq!(tree.path(CategoryId::new()).unwrap_err(), DomainError::NotFound);
        assert_eq!(
            tree.descendants(CategoryId::new()).unwrap_err(),
            DomainError::NotFound
        );
    }

    #[test]
    fn parent_cycles_are_detected() {
        let a = CategoryId::new();
        let b = CategoryId::new();
        let tree = CategoryTree::new([
            Category::new(a, Some(b), "A").unwrap(),
            Category::new(b, Some(a), "B").unwrap(),
        ]);

        assert!(matches!(tree.path(a).unwrap_err(), DomainError::InvariantViolation(_)));
        assert!(matches!(
            tree.descendants(a).unwrap_err(),
            DomainError::InvariantViolation(_)
        ));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(Category::root(CategoryId::new(), "  ").is_err());
    }
}
