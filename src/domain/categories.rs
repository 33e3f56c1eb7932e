//! Category tree resolution over the self-referencing `categories` table.
//!
//! The whole table is small and fetched in one query; closure and tree
//! building run in memory with a visited-set guard and a depth cap so a
//! corrupted parent-pointer cycle terminates instead of recursing forever.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::Category;

/// Hard ceiling on tree depth; real catalogs sit at two or three levels.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub children: Vec<CategoryNode>,
}

/// Transitive closure of `root` and everything below it. Always contains
/// `root` itself, even when it has no children or is absent from `rows`.
pub fn descendant_ids(rows: &[Category], root: Uuid) -> Vec<Uuid> {
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut out = vec![root];
    visited.insert(root);

    let mut frontier = vec![root];
    for _ in 0..MAX_DEPTH {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for row in rows {
            let Some(parent) = row.parent_id else { continue };
            if frontier.contains(&parent) && visited.insert(row.id) {
                out.push(row.id);
                next.push(row.id);
            }
        }
        frontier = next;
    }
    out
}

/// Materialize the nested forest under `root` (`None` for the full forest),
/// ordered by name ascending at every level.
pub fn build_forest(rows: &[Category], root: Option<Uuid>) -> Vec<CategoryNode> {
    let mut visited = HashSet::new();
    children_of(rows, root, &mut visited, 0)
}

fn children_of(
    rows: &[Category],
    parent: Option<Uuid>,
    visited: &mut HashSet<Uuid>,
    depth: usize,
) -> Vec<CategoryNode> {
    if depth >= MAX_DEPTH {
        return Vec::new();
    }
    let mut level: Vec<&Category> = rows
        .iter()
        .filter(|r| r.parent_id == parent && !visited.contains(&r.id))
        .collect();
    level.sort_by(|a, b| a.name.cmp(&b.name));

    level
        .into_iter()
        .map(|row| {
            visited.insert(row.id);
            CategoryNode {
                id: row.id,
                name: row.name.clone(),
                slug: row.slug.clone(),
                children: children_of(rows, Some(row.id), visited, depth + 1),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cat(id: u128, name: &str, parent: Option<u128>) -> Category {
        Category {
            id: Uuid::from_u128(id),
            name: name.into(),
            slug: name.to_lowercase().replace(' ', "-"),
            parent_id: parent.map(Uuid::from_u128),
            created_at: Utc::now(),
        }
    }

    /// Balanced 3-level tree, branching factor 2.
    fn balanced() -> Vec<Category> {
        vec![
            cat(1, "Apparel", None),
            cat(2, "Men", Some(1)),
            cat(3, "Women", Some(1)),
            cat(4, "Shirts", Some(2)),
            cat(5, "Pants", Some(2)),
            cat(6, "Dresses", Some(3)),
            cat(7, "Skirts", Some(3)),
        ]
    }

    #[test]
    fn closure_of_balanced_tree_has_seven_members() {
        let ids = descendant_ids(&balanced(), Uuid::from_u128(1));
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn closure_always_contains_the_root_itself() {
        let leaf = descendant_ids(&balanced(), Uuid::from_u128(7));
        assert_eq!(leaf, vec![Uuid::from_u128(7)]);

        let unknown = Uuid::from_u128(99);
        assert_eq!(descendant_ids(&balanced(), unknown), vec![unknown]);
    }

    #[test]
    fn closure_of_mid_level_node() {
        let ids = descendant_ids(&balanced(), Uuid::from_u128(2));
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&Uuid::from_u128(4)));
        assert!(ids.contains(&Uuid::from_u128(5)));
    }

    #[test]
    fn forest_is_nested_and_name_ordered_at_every_level() {
        let forest = build_forest(&balanced(), None);
        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.name, "Apparel");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "Men");
        assert_eq!(root.children[1].name, "Women");
        let men = &root.children[0];
        assert_eq!(men.children[0].name, "Pants");
        assert_eq!(men.children[1].name, "Shirts");
    }

    #[test]
    fn subtree_root_can_be_requested() {
        let forest = build_forest(&balanced(), Some(Uuid::from_u128(3)));
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "Dresses");
    }

    #[test]
    fn parent_pointer_cycle_terminates() {
        let mut rows = vec![cat(1, "A", Some(2)), cat(2, "B", Some(1))];
        rows.push(cat(3, "C", Some(1)));
        let ids = descendant_ids(&rows, Uuid::from_u128(1));
        assert_eq!(ids.len(), 3); // 1, 2, 3 each visited once
        let forest = build_forest(&rows, Some(Uuid::from_u128(1)));
        assert_eq!(forest.len(), 2); // B and C, no infinite descent
    }
}
