use shoroshim_core::{
    build_hierarchy, Gender, HierarchyBuilder, HierarchyDirection, Person, RelationshipEdge,
    RelationshipType,
};

fn people(ids: &[i64]) -> Vec<Person> {
    ids.iter()
        .map(|id| Person::new(*id, format!("Person {id}"), Gender::Female))
        .collect()
}

fn edge(parent: i64, child: i64, role: RelationshipType) -> RelationshipEdge {
    RelationshipEdge::new(parent, child, role)
}

#[test]
fn ancestor_tree_lists_both_parents_as_leaves() {
    let edges = [
        edge(1, 2, RelationshipType::Father),
        edge(3, 2, RelationshipType::Mother),
    ];

    let tree = build_hierarchy(2, HierarchyDirection::Ancestor, &people(&[1, 2, 3]), &edges);

    assert_eq!(tree.person_id, 2);
    assert_eq!(tree.child_ids(), vec![1, 3]);
    assert!(tree.children.iter().all(|child| child.is_leaf()));
    assert!(tree.children.iter().all(|child| child.weight == 1));
}

#[test]
fn descendant_tree_follows_parent_to_child_edges() {
    let edges = [
        edge(10, 20, RelationshipType::Father),
        edge(10, 21, RelationshipType::Father),
    ];

    let tree = build_hierarchy(
        10,
        HierarchyDirection::Descendant,
        &people(&[10, 20, 21]),
        &edges,
    );

    assert_eq!(tree.child_ids(), vec![20, 21]);
}

#[test]
fn cyclic_input_terminates_with_bounded_depth() {
    let edges = [
        edge(1, 2, RelationshipType::Father),
        edge(2, 1, RelationshipType::Father),
    ];
    let builder = HierarchyBuilder::new(&people(&[1, 2]), &edges);

    for direction in [HierarchyDirection::Ancestor, HierarchyDirection::Descendant] {
        let tree = builder.build(1, direction);
        assert!(tree.depth() <= 3, "depth {} for {direction:?}", tree.depth());
        assert_eq!(tree.child_ids(), vec![2]);
        assert_eq!(tree.children[0].child_ids(), vec![1]);
        assert!(tree.children[0].children[0].is_leaf());
    }
}

#[test]
fn long_cycle_is_cut_where_it_closes() {
    let ids = (1..=500).collect::<Vec<i64>>();
    let mut edges = ids
        .windows(2)
        .map(|pair| edge(pair[0], pair[1], RelationshipType::Mother))
        .collect::<Vec<_>>();
    edges.push(edge(500, 1, RelationshipType::Mother));

    let tree = build_hierarchy(1, HierarchyDirection::Descendant, &people(&ids), &edges);

    assert_eq!(tree.depth(), 501);
    assert_eq!(tree.node_count(), 501);
}

#[test]
fn children_keep_input_edge_order_and_include_every_role() {
    let edges = [
        edge(9, 1, RelationshipType::AdoptedMother),
        edge(4, 1, RelationshipType::Father),
        edge(6, 1, RelationshipType::StepFather),
    ];

    let tree = build_hierarchy(1, HierarchyDirection::Ancestor, &people(&[1, 4, 6, 9]), &edges);

    assert_eq!(tree.child_ids(), vec![9, 4, 6]);
}

#[test]
fn pedigree_collapse_duplicates_shared_ancestors() {
    // 1 and 2 are both children of 3; 4 is the child of 1 and 2.
    let edges = [
        edge(3, 1, RelationshipType::Father),
        edge(3, 2, RelationshipType::Father),
        edge(1, 4, RelationshipType::Father),
        edge(2, 4, RelationshipType::Mother),
    ];

    let tree = build_hierarchy(4, HierarchyDirection::Ancestor, &people(&[1, 2, 3, 4]), &edges);

    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.total_weight(), 5);
    assert_eq!(tree.children[0].child_ids(), vec![3]);
    assert_eq!(tree.children[1].child_ids(), vec![3]);
}

#[test]
fn negative_edges_are_not_followed() {
    let edges = [
        edge(1, 2, RelationshipType::ChildOfFather),
        edge(3, 2, RelationshipType::Mother),
    ];

    let tree = build_hierarchy(2, HierarchyDirection::Ancestor, &people(&[1, 2, 3]), &edges);

    assert_eq!(tree.child_ids(), vec![3]);
}

#[test]
fn unknown_root_without_edges_yields_single_unresolved_node() {
    let edges = [edge(1, 2, RelationshipType::Father)];

    let tree = build_hierarchy(77, HierarchyDirection::Ancestor, &people(&[1, 2]), &edges);

    assert_eq!(tree.person_id, 77);
    assert!(!tree.is_resolved());
    assert!(tree.is_leaf());
}

#[test]
fn unknown_parent_is_kept_as_unresolved_node() {
    let edges = [edge(40, 2, RelationshipType::Father)];

    let tree = build_hierarchy(2, HierarchyDirection::Ancestor, &people(&[2]), &edges);

    assert_eq!(tree.child_ids(), vec![40]);
    assert!(!tree.children[0].is_resolved());
    assert_eq!(tree.display_name.as_deref(), Some("Person 2"));
}

#[test]
fn unknown_root_with_edges_is_still_expanded() {
    let edges = [
        edge(1, 2, RelationshipType::Father),
        edge(3, 2, RelationshipType::Mother),
    ];

    let tree = build_hierarchy(2, HierarchyDirection::Ancestor, &[], &edges);

    assert_eq!(tree.person_id, 2);
    assert!(!tree.is_resolved());
    assert_eq!(tree.child_ids(), vec![1, 3]);
    assert!(tree.children.iter().all(|child| !child.is_resolved()));
}
