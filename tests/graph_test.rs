//! Tests for the network graph projection

use tonnage::domain::{
    build_graph, Allocation, Commune, Department, Hierarchy, Level, Operator, Region, SizeScale,
};

/// Department `id` with a single allocation of `target` T.
fn department_with_target(id: &str, target: f64) -> Department {
    Department {
        id: id.to_string(),
        name: format!("Department {id}"),
        communes: vec![Commune {
            id: format!("{id}-c"),
            name: "Commune".into(),
            operators: vec![Operator {
                id: format!("{id}-o"),
                name: "Operator".into(),
                is_cooperative: true,
                allocations: vec![Allocation {
                    id: format!("{id}-a"),
                    key: format!("{id}-KEY"),
                    target,
                    delivered: target / 4.0,
                    deliveries: Vec::new(),
                }],
            }],
        }],
    }
}

/// Region holding one department with a single allocation of `target` T.
fn region_with_target(id: &str, target: f64) -> Region {
    Region {
        id: id.to_string(),
        name: format!("Region {id}"),
        departments: vec![department_with_target(&format!("{id}-d"), target)],
    }
}

#[test]
fn given_three_regions_when_building_graph_then_sizes_by_sqrt_of_ratio() {
    let hierarchy = Hierarchy::new(vec![
        region_with_target("a", 100.0),
        region_with_target("b", 100.0),
        region_with_target("c", 400.0),
    ]);

    let graph = build_graph(&hierarchy, &SizeScale::default());

    let sizes: Vec<f64> = graph.nodes_at(Level::Region).map(|n| n.size).collect();
    let expected = [63.6, 63.6, 127.3];
    assert_eq!(sizes.len(), 3);
    for (size, want) in sizes.iter().zip(expected) {
        assert!((size - want).abs() < 0.05, "size {size} != {want}");
    }
}

#[test]
fn given_regions_with_departments_when_building_graph_then_links_departments_to_regions() {
    let hierarchy = Hierarchy::new(vec![region_with_target("a", 100.0), region_with_target("b", 300.0)]);

    let graph = build_graph(&hierarchy, &SizeScale::default());

    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(graph.edges[0].source, "dept:a-d");
    assert_eq!(graph.edges[0].target, "region:a");
    let dept = graph.node("dept:b-d").unwrap();
    assert_eq!(dept.level, Level::Department);
    assert_eq!(dept.completion, 25.0);
    assert_eq!(dept.target, 300.0);
}

#[test]
fn given_extreme_targets_when_building_graph_then_clamps_into_scale() {
    let hierarchy = Hierarchy::new(vec![
        region_with_target("tiny", 0.0),
        region_with_target("mid", 10.0),
        region_with_target("huge", 10_000.0),
    ]);
    let scale = SizeScale {
        base: 120.0,
        ..SizeScale::default()
    };

    let graph = build_graph(&hierarchy, &scale);

    assert_eq!(graph.node("region:tiny").unwrap().size, scale.min);
    assert_eq!(graph.node("region:mid").unwrap().size, scale.min);
    assert_eq!(graph.node("region:huge").unwrap().size, scale.max);
}

#[test]
fn given_all_zero_targets_when_building_graph_then_every_node_gets_min_size() {
    let hierarchy = Hierarchy::new(vec![region_with_target("a", 0.0), region_with_target("b", 0.0)]);
    let scale = SizeScale {
        base: 120.0,
        min: 40.0,
        max: 200.0,
    };

    let graph = build_graph(&hierarchy, &scale);

    assert!(graph.nodes.iter().all(|n| n.size == 40.0));
    assert!(graph.nodes.iter().all(|n| n.completion == 0.0));
}

#[test]
fn given_departments_in_several_regions_when_building_graph_then_sizes_against_own_region() {
    let hierarchy = Hierarchy::new(vec![
        Region {
            id: "a".into(),
            name: "Thiès".into(),
            departments: vec![
                department_with_target("a-1", 100.0),
                department_with_target("a-2", 400.0),
            ],
        },
        Region {
            id: "b".into(),
            name: "Kaolack".into(),
            departments: vec![department_with_target("b-1", 1_000.0)],
        },
    ]);

    let graph = build_graph(&hierarchy, &SizeScale::default());

    // average of Thiès departments is 250 T, Kaolack's lone department is its own average
    let size = |id: &str| graph.node(id).unwrap().size;
    assert!((size("dept:a-1") - 56.92).abs() < 0.01, "got {}", size("dept:a-1"));
    assert!((size("dept:a-2") - 113.84).abs() < 0.01, "got {}", size("dept:a-2"));
    assert_eq!(size("dept:b-1"), 90.0);
}
