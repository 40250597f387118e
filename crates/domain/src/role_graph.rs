use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::RoleEdge;

/// In-memory view of the superrole/subrole edge set.
///
/// Acyclicity is not enforced anywhere, so every traversal tracks visited
/// nodes and terminates on cyclic input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGraph {
    superroles: BTreeMap<String, BTreeSet<String>>,
    subroles: BTreeMap<String, BTreeSet<String>>,
}

impl RoleGraph {
    /// Builds a graph from stored edges. Duplicate edges collapse.
    #[must_use]
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a RoleEdge>) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            graph.insert(edge);
        }

        graph
    }

    /// Adds one edge.
    pub fn insert(&mut self, edge: &RoleEdge) {
        self.superroles
            .entry(edge.subrole_id.clone())
            .or_default()
            .insert(edge.superrole_id.clone());
        self.subroles
            .entry(edge.superrole_id.clone())
            .or_default()
            .insert(edge.subrole_id.clone());
    }

    /// Returns `role_id` plus every role reachable by following superrole
    /// edges upward.
    #[must_use]
    pub fn ancestors_of(&self, role_id: &str) -> BTreeSet<String> {
        closure(&self.superroles, [role_id])
    }

    /// Returns `role_id` plus every role reachable by following subrole
    /// edges downward.
    #[must_use]
    pub fn descendants_of(&self, role_id: &str) -> BTreeSet<String> {
        closure(&self.subroles, [role_id])
    }

    /// Union of [`Self::ancestors_of`] over several starting roles.
    #[must_use]
    pub fn ancestors_of_all<'a>(
        &self,
        role_ids: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<String> {
        closure(&self.superroles, role_ids)
    }

    /// Direct subroles of one role.
    #[must_use]
    pub fn subroles_of(&self, role_id: &str) -> BTreeSet<String> {
        self.subroles.get(role_id).cloned().unwrap_or_default()
    }
}

fn closure<'a>(
    adjacency: &BTreeMap<String, BTreeSet<String>>,
    start: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<String> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();

    for role_id in start {
        if visited.insert(role_id.to_owned()) {
            queue.push_back(role_id.to_owned());
        }
    }

    while let Some(current) = queue.pop_front() {
        let Some(next) = adjacency.get(current.as_str()) else {
            continue;
        };

        for role_id in next {
            if visited.insert(role_id.clone()) {
                queue.push_back(role_id.clone());
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::RoleGraph;
    use crate::RoleEdge;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    fn chain() -> Vec<RoleEdge> {
        vec![
            RoleEdge::new("styrelsen", "d-sys"),
            RoleEdge::new("d-sys", "dfunk"),
            RoleEdge::new("drek", "dfunk"),
        ]
    }

    #[test]
    fn ancestors_include_start_and_walk_upward() {
        let graph = RoleGraph::from_edges(&chain());

        assert_eq!(
            graph.ancestors_of("dfunk"),
            set(&["dfunk", "d-sys", "drek", "styrelsen"])
        );
        assert_eq!(graph.ancestors_of("styrelsen"), set(&["styrelsen"]));
    }

    #[test]
    fn descendants_walk_downward() {
        let graph = RoleGraph::from_edges(&chain());

        assert_eq!(
            graph.descendants_of("styrelsen"),
            set(&["styrelsen", "d-sys", "dfunk"])
        );
        assert_eq!(graph.descendants_of("unknown"), set(&["unknown"]));
    }

    #[test]
    fn cyclic_graph_terminates() {
        let graph = RoleGraph::from_edges(&[
            RoleEdge::new("a", "b"),
            RoleEdge::new("b", "c"),
            RoleEdge::new("c", "a"),
            RoleEdge::new("x", "x"),
        ]);

        assert_eq!(graph.ancestors_of("a"), set(&["a", "b", "c"]));
        assert_eq!(graph.descendants_of("b"), set(&["a", "b", "c"]));
        assert_eq!(graph.ancestors_of("x"), set(&["x"]));
    }

    #[test]
    fn ancestors_of_all_unions_closures() {
        let graph = RoleGraph::from_edges(&chain());

        assert_eq!(
            graph.ancestors_of_all(["d-sys", "drek"]),
            set(&["d-sys", "drek", "styrelsen"])
        );
    }

    /// Reference closure computed by repeated relaxation over the edge list.
    fn reachable_upward(edges: &[RoleEdge], start: &str) -> BTreeSet<String> {
        let mut reached = set(&[start]);
        loop {
            let before = reached.len();
            for edge in edges {
                if reached.contains(&edge.subrole_id) {
                    reached.insert(edge.superrole_id.clone());
                }
            }
            if reached.len() == before {
                return reached;
            }
        }
    }

    fn edge_strategy() -> impl Strategy<Value = Vec<RoleEdge>> {
        prop::collection::vec((0u8..8, 0u8..8), 0..24).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(superrole, subrole)| {
                    RoleEdge::new(format!("r{superrole}"), format!("r{subrole}"))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn ancestors_match_reference_closure(edges in edge_strategy(), start in 0u8..8) {
            let start = format!("r{start}");
            let graph = RoleGraph::from_edges(&edges);

            prop_assert_eq!(graph.ancestors_of(&start), reachable_upward(&edges, &start));
        }

        #[test]
        fn ancestors_are_stable_under_edge_order(edges in edge_strategy(), start in 0u8..8) {
            let start = format!("r{start}");
            let mut reversed = edges.clone();
            reversed.reverse();

            prop_assert_eq!(
                RoleGraph::from_edges(&edges).ancestors_of(&start),
                RoleGraph::from_edges(&reversed).ancestors_of(&start)
            );
        }

        #[test]
        fn descendants_mirror_ancestors(edges in edge_strategy(), left in 0u8..8, right in 0u8..8) {
            let left = format!("r{left}");
            let right = format!("r{right}");
            let graph = RoleGraph::from_edges(&edges);

            prop_assert_eq!(
                graph.ancestors_of(&left).contains(&right),
                graph.descendants_of(&right).contains(&left)
            );
        }
    }
}
