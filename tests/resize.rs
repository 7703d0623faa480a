use stackblocks::{
    BlockGraph, BlockKind, DockRole, GraphError, Point, RenderLog, ShapeGenerator, StandardShapes,
};

fn recording_graph() -> BlockGraph<StandardShapes, RenderLog> {
    BlockGraph::new(StandardShapes::default(), RenderLog::new())
}

#[test]
fn growing_slots_shifts_trailing_connection() {
    let mut graph = BlockGraph::standard();
    let call = graph.add_block(BlockKind::DoArg).expect("add do-arg");
    let arg = graph.add_block(BlockKind::Number).expect("add number");
    let after = graph.add_block(BlockKind::Print).expect("add print");
    // [upstream, name, slot 0, next]
    graph.connect(call, 2, arg).expect("slot 0");
    graph.connect(call, 3, after).expect("next");

    let detached = graph.apply_arg_slot_change(call, &[2]).expect("grow");
    assert!(detached.is_empty());

    let block = graph.block(call).expect("call");
    assert_eq!(block.docks().len(), 5);
    assert_eq!(block.connection(2), Some(arg));
    assert_eq!(block.connection(3), None);
    assert_eq!(block.connection(4), Some(after));
    assert_eq!(block.docks()[4].role, DockRole::Next);
    assert_eq!(graph.block(after).expect("print").parent(), Some(call));
    graph.check_invariants().expect("invariants hold");
}

#[test]
fn shrinking_clamp_body_below_one_row_changes_nothing() {
    let mut graph = recording_graph();
    let repeat = graph.add_block(BlockKind::Repeat).expect("add repeat");
    let body = graph.add_block(BlockKind::Forward).expect("add forward");
    graph.connect(repeat, 2, body).expect("body");
    graph.adjust_docks(repeat, true).expect("seat");
    graph.renderer_mut().clear();

    let before = graph.block(repeat).expect("repeat").clone();
    let err = graph
        .apply_clamp_body_delta(repeat, 0, -1)
        .expect_err("already at one row");
    assert!(matches!(err, GraphError::InvalidResize { block, .. } if block == repeat));

    let after = graph.block(repeat).expect("repeat");
    assert_eq!(after.configuration(), before.configuration());
    assert_eq!(after.docks(), before.docks());
    assert_eq!(after.connections(), before.connections());
    assert_eq!(after.geometry(), before.geometry());
    assert_eq!(after.outline(), before.outline());
    assert!(graph.renderer().events.is_empty());
}

#[test]
fn arg_clamp_grows_by_one_dock_per_row() {
    let mut graph = recording_graph();
    let call = graph
        .add_block_at(BlockKind::NamedDoArg, Point::new(0.0, 0.0))
        .expect("add named do-arg");
    let arg = graph.add_block(BlockKind::Number).expect("add number");
    let after = graph.add_block(BlockKind::Forward).expect("add forward");
    // [upstream, slot 0, next]
    graph.connect(call, 1, arg).expect("slot 0");
    graph.connect(call, 2, after).expect("next");
    graph.adjust_docks(call, true).expect("seat");

    let before = graph.block(call).expect("call").clone();
    assert_eq!(before.configuration().clamp_body_counts, vec![1]);
    graph.renderer_mut().clear();

    graph.apply_clamp_body_delta(call, 0, 1).expect("grow to 2");
    graph.apply_clamp_body_delta(call, 0, 1).expect("grow to 3");

    let block = graph.block(call).expect("call");
    assert_eq!(block.configuration().clamp_body_counts, vec![3]);
    assert_eq!(block.configuration().arg_slot_counts, vec![3]);
    assert_eq!(block.docks().len(), before.docks().len() + 2);

    let expected = StandardShapes::default().generate(BlockKind::NamedDoArg, block.configuration());
    assert_eq!(block.geometry().width, expected.width);
    assert!(block.geometry().width > before.geometry().width);

    // Occupied docks keep their neighbours.
    assert_eq!(block.connection(1), Some(arg));
    assert_eq!(block.connection(4), Some(after));

    // The following statement was moved down to the new next dock.
    assert_eq!(
        graph.block(after).expect("forward").position(),
        Point::new(0.0, expected.height)
    );
    assert!(graph.renderer().geometry_changes().any(|id| id == after));
    graph.check_invariants().expect("invariants hold");
}

#[test]
fn flow_clamp_rows_change_height_only() {
    let mut graph = BlockGraph::standard();
    let repeat = graph.add_block(BlockKind::Repeat).expect("add repeat");
    let after = graph.add_block(BlockKind::Forward).expect("add forward");
    graph.connect(repeat, 3, after).expect("next");
    graph.adjust_docks(repeat, true).expect("seat");
    let before = graph.block(repeat).expect("repeat").clone();
    let before_y = graph.block(after).expect("forward").position().y;

    let detached = graph.apply_clamp_body_delta(repeat, 0, 1).expect("grow");
    assert!(detached.is_empty());

    let block = graph.block(repeat).expect("repeat");
    assert_eq!(block.docks().len(), before.docks().len());
    assert_eq!(block.configuration().clamp_body_counts, vec![2]);
    assert!(block.configuration().arg_slot_counts.is_empty());
    assert_eq!(block.geometry().height, before.geometry().height + 42.0);
    assert_eq!(block.geometry().width, before.geometry().width);
    assert_eq!(
        graph.block(after).expect("forward").position().y,
        before_y + 42.0
    );
}

#[test]
fn resize_inside_stack_moves_everything_below() {
    let mut graph = BlockGraph::standard();
    let start = graph.add_block(BlockKind::Start).expect("add start");
    let branch = graph.add_block(BlockKind::IfThenElse).expect("add if-else");
    let after = graph.add_block(BlockKind::Forward).expect("add forward");
    let in_else = graph.add_block(BlockKind::Print).expect("add print");
    // If-then-else: [upstream, condition, then, else, next]
    graph.connect(start, 1, branch).expect("start body");
    graph.connect(branch, 4, after).expect("next");
    graph.connect(branch, 3, in_else).expect("else body");
    graph.adjust_docks(start, true).expect("seat");

    let after_y = graph.block(after).expect("forward").position().y;
    let else_y = graph.block(in_else).expect("print").position().y;

    graph
        .apply_clamp_body_delta(branch, 0, 1)
        .expect("grow the then-body");

    assert_eq!(graph.block(after).expect("forward").position().y, after_y + 42.0);
    assert_eq!(graph.block(in_else).expect("print").position().y, else_y + 42.0);
    assert_eq!(graph.block(branch).expect("if-else").parent(), Some(start));
    graph.check_invariants().expect("invariants hold");
}

#[test]
fn shrinking_drops_empty_rows_before_occupied_ones() {
    let mut graph = BlockGraph::standard();
    let calc = graph.add_block(BlockKind::NamedCalcArg).expect("add calc");
    graph.apply_arg_slot_change(calc, &[3]).expect("grow");
    let arg = graph.add_block(BlockKind::Text).expect("add text");
    // [upstream, slot 0, slot 1, slot 2]; only the last slot is occupied.
    graph.connect(calc, 3, arg).expect("slot 2");

    let detached = graph.apply_arg_slot_change(calc, &[1]).expect("shrink");
    assert!(detached.is_empty());
    let block = graph.block(calc).expect("calc");
    assert_eq!(block.docks().len(), 2);
    assert_eq!(block.connection(1), Some(arg));
    graph.check_invariants().expect("invariants hold");
}

#[test]
fn shrinking_occupied_row_forces_disconnect() {
    let mut graph = BlockGraph::standard();
    let calc = graph
        .add_block_at(BlockKind::NamedCalcArg, Point::new(50.0, 50.0))
        .expect("add calc");
    graph.apply_arg_slot_change(calc, &[2]).expect("grow");
    let first = graph.add_block(BlockKind::Number).expect("add first");
    let second = graph.add_block(BlockKind::Number).expect("add second");
    graph.connect(calc, 1, first).expect("slot 0");
    graph.connect(calc, 2, second).expect("slot 1");
    graph.adjust_docks(calc, true).expect("seat");
    let left_at = graph.block(second).expect("second").position();

    let detached = graph
        .apply_clamp_body_delta(calc, 0, -1)
        .expect("shrink to one row");

    assert_eq!(detached, vec![second]);
    let dropped = graph.block(second).expect("second");
    assert!(dropped.is_root());
    assert_eq!(dropped.position(), left_at);
    assert_eq!(graph.block(calc).expect("calc").connection(1), Some(first));
    graph.check_invariants().expect("invariants hold");
}

#[test]
fn malformed_resizes_are_rejected() {
    let mut graph = BlockGraph::standard();
    let repeat = graph.add_block(BlockKind::Repeat).expect("add repeat");
    let call = graph.add_block(BlockKind::DoArg).expect("add do-arg");
    let print = graph.add_block(BlockKind::Print).expect("add print");

    let invalid = |r: Result<Vec<_>, GraphError>| matches!(r, Err(GraphError::InvalidResize { .. }));
    assert!(invalid(graph.apply_arg_slot_change(repeat, &[2])));
    assert!(invalid(graph.apply_arg_slot_change(call, &[0])));
    assert!(invalid(graph.apply_arg_slot_change(call, &[1, 1])));
    assert!(invalid(graph.apply_arg_slot_change(call, &[65])));
    assert!(invalid(graph.apply_clamp_body_delta(repeat, 0, 2)));
    assert!(invalid(graph.apply_clamp_body_delta(repeat, 1, 1)));
    assert!(invalid(graph.apply_clamp_body_delta(print, 0, 1)));

    assert_eq!(
        graph.block(call).expect("call").configuration().arg_slot_counts,
        vec![1]
    );
    graph.check_invariants().expect("invariants hold");
}
