use std::collections::BTreeMap;

use stackblocks::{
    BlockGraph, BlockId, BlockKind, CollapseState, DragGesture, GraphError, Point, RenderLog,
    StandardShapes,
};

type Graph = BlockGraph<StandardShapes, RenderLog>;

/// Start { forward; group { print } } with an argument on the forward block.
struct Program {
    graph: Graph,
    start: BlockId,
    forward: BlockId,
    distance: BlockId,
    group: BlockId,
    print: BlockId,
}

fn program() -> Program {
    let mut graph = BlockGraph::new(StandardShapes::default(), RenderLog::new());
    let start = graph.add_block(BlockKind::Start).expect("add start");
    let forward = graph.add_block(BlockKind::Forward).expect("add forward");
    let distance = graph.add_block(BlockKind::Number).expect("add number");
    let group = graph.add_block(BlockKind::Group).expect("add group");
    let print = graph.add_block(BlockKind::Print).expect("add print");
    graph.connect(start, 1, forward).expect("start body");
    graph.connect(forward, 1, distance).expect("argument");
    graph.connect(forward, 2, group).expect("next");
    graph.connect(group, 1, print).expect("group body");
    graph.adjust_docks(start, true).expect("seat");
    Program {
        graph,
        start,
        forward,
        distance,
        group,
        print,
    }
}

fn visibility(graph: &Graph) -> BTreeMap<BlockId, bool> {
    graph.iter().map(|b| (b.id(), b.is_visible())).collect()
}

#[test]
fn collapse_hides_group_but_keeps_structure() {
    let mut p = program();
    let links_before: Vec<_> = p
        .graph
        .iter()
        .map(|b| b.connections().to_vec())
        .collect();

    let state = p.graph.toggle_collapse(p.start).expect("toggle");
    assert_eq!(state, CollapseState::Collapsed);

    let start = p.graph.block(p.start).expect("start");
    assert!(start.is_collapsed());
    assert!(start.is_visible());
    for id in [p.forward, p.distance, p.group, p.print] {
        assert!(!p.graph.block(id).expect("member").is_visible());
    }
    let links_after: Vec<_> = p
        .graph
        .iter()
        .map(|b| b.connections().to_vec())
        .collect();
    assert_eq!(links_after, links_before);
    assert!(p.graph.renderer().visibility_changes().any(|id| id == p.start));
    p.graph.check_invariants().expect("invariants hold");
}

#[test]
fn toggle_twice_restores_visibility() {
    let mut p = program();
    // Fold the nested group first so the visibility set is not trivial.
    p.graph.toggle_collapse(p.group).expect("fold group");
    let before = visibility(&p.graph);
    assert!(!before[&p.print]);

    p.graph.toggle_collapse(p.start).expect("collapse");
    p.graph.toggle_collapse(p.start).expect("expand");

    assert_eq!(visibility(&p.graph), before);
    assert_eq!(
        p.graph.collapse_state(p.start).expect("state"),
        CollapseState::Expanded
    );
}

#[test]
fn nested_collapsible_keeps_its_own_flag() {
    let mut p = program();
    p.graph.collapse(p.group).expect("fold group");
    p.graph.collapse(p.start).expect("fold start");
    p.graph.expand(p.start).expect("unfold start");

    let group = p.graph.block(p.group).expect("group");
    assert!(group.is_visible());
    assert!(group.is_collapsed());
    assert!(!p.graph.block(p.print).expect("print").is_visible());

    p.graph.expand(p.group).expect("unfold group");
    assert!(p.graph.block(p.print).expect("print").is_visible());
}

#[test]
fn collapse_and_expand_are_idempotent() {
    let mut p = program();
    p.graph.collapse(p.start).expect("collapse");
    let once = visibility(&p.graph);
    p.graph.renderer_mut().clear();

    p.graph.collapse(p.start).expect("collapse again");
    assert_eq!(visibility(&p.graph), once);
    assert!(p.graph.renderer().events.is_empty());

    p.graph.expand(p.start).expect("expand");
    let expanded = visibility(&p.graph);
    p.graph.expand(p.start).expect("expand again");
    assert_eq!(visibility(&p.graph), expanded);
    assert!(expanded.values().all(|&v| v));
}

#[test]
fn only_collapsible_kinds_toggle() {
    let mut p = program();
    assert_eq!(
        p.graph.toggle_collapse(p.forward),
        Err(GraphError::NotCollapsible(p.forward))
    );
    assert!(!p.graph.block(p.forward).expect("forward").is_collapsed());
    assert!(p.graph.block(p.distance).expect("number").is_visible());
}

#[test]
fn nested_toggle_under_collapsed_ancestor_stays_hidden() {
    let mut p = program();
    p.graph.collapse(p.start).expect("fold start");
    let before = visibility(&p.graph);

    p.graph.toggle_collapse(p.group).expect("fold group");
    p.graph.toggle_collapse(p.group).expect("unfold group");
    assert_eq!(visibility(&p.graph), before);
    assert!(!p.graph.block(p.print).expect("print").is_visible());
    p.graph.check_invariants().expect("invariants hold");

    // Unfolding the group while hidden leaves it expanded once the start opens.
    p.graph.collapse(p.group).expect("fold group");
    p.graph.expand(p.group).expect("unfold group");
    p.graph.expand(p.start).expect("unfold start");
    assert!(p.graph.block(p.print).expect("print").is_visible());
}

#[test]
fn detaching_from_a_collapsed_block_shows_the_stack() {
    let mut p = program();
    p.graph.collapse(p.group).expect("fold group");
    p.graph.collapse(p.start).expect("fold start");

    let detached = p.graph.disconnect(p.start, 1).expect("disconnect");
    assert_eq!(detached, Some(p.forward));
    for id in [p.forward, p.distance, p.group] {
        assert!(p.graph.block(id).expect("member").is_visible());
    }
    // Still folded inside the group.
    assert!(!p.graph.block(p.print).expect("print").is_visible());
    p.graph.check_invariants().expect("invariants hold");

    // As a root of its own the folded group still hides its body.
    p.graph.disconnect(p.group, 0).expect("cut group away");
    assert!(p.graph.block(p.group).expect("group").is_root());
    assert!(p.graph.block(p.group).expect("group").is_visible());
    assert!(!p.graph.block(p.print).expect("print").is_visible());
    p.graph.check_invariants().expect("invariants hold");
}

#[test]
fn docking_into_a_collapsed_block_hides_the_stack() {
    let mut graph = BlockGraph::standard();
    let start = graph
        .add_block_at(BlockKind::Start, Point::new(0.0, 0.0))
        .expect("add start");
    graph.collapse(start).expect("fold start");
    // Notch exactly on the start body socket at (40, 42).
    let print = graph
        .add_block_at(BlockKind::Print, Point::new(20.0, 42.0))
        .expect("add print");
    let text = graph.add_block(BlockKind::Text).expect("add text");
    graph.connect(print, 1, text).expect("argument");

    assert_eq!(graph.find_snap_dock(print).expect("snap"), None);

    let gesture = DragGesture::begin(&graph, print).expect("begin");
    gesture
        .drop_on(&mut graph, Some((start, 1)))
        .expect("drop into folded body");
    assert_eq!(graph.block(print).expect("print").parent(), Some(start));
    for id in [print, text] {
        assert!(!graph.block(id).expect("member").is_visible());
    }
    graph.check_invariants().expect("invariants hold");

    graph.expand(start).expect("unfold start");
    for id in [print, text] {
        assert!(graph.block(id).expect("member").is_visible());
    }
}
