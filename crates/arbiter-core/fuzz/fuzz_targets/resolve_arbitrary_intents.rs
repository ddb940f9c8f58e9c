#![no_main]

use std::collections::HashSet;

use arbiter_core::{
    resolve, Coord, Direction, Grid, GridLayout, Intent, PortRef, StackBank,
};
use libfuzzer_sys::fuzz_target;

fn port(byte: u8) -> PortRef {
    match byte % 5 {
        4 => PortRef::Any,
        index => PortRef::Dir(Direction::ALL[usize::from(index)]),
    }
}

fn intent(kind: u8, value: u8) -> Intent {
    match kind % 3 {
        0 => Intent::Idle,
        1 => Intent::Read(port(kind / 3)),
        _ => Intent::Write(port(kind / 3), i8::from_le_bytes([value])),
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let width = u16::from(data[0] % 4) + 1;
    let height = u16::from(data[1] % 4) + 1;
    let stack_mask = data[2];

    let mut layout = GridLayout::rectangle(width, height);
    for bit in 0..8_i32 {
        if stack_mask & (1 << bit) != 0 {
            layout = layout.with_stack(Coord::new(bit % 4, bit / 4));
        }
    }
    let Ok(grid) = Grid::from_layout(&layout) else {
        return;
    };

    let body = &data[3..];
    let intents: Vec<Intent> = grid
        .node_ids()
        .map(|node| {
            let at = node.index() * 2;
            match (body.get(at), body.get(at + 1)) {
                (Some(kind), Some(value)) if !grid.is_stack(node) => intent(*kind, *value),
                _ => Intent::Idle,
            }
        })
        .collect();

    let mut stacks = StackBank::for_grid(&grid);
    for stack in grid.stack_ids() {
        let seed = body.get(stack.index()).copied().unwrap_or(0);
        let _ = stacks.load(stack, vec![i8::from_le_bytes([seed]); usize::from(seed % 3)]);
    }

    let Ok(resolution) = resolve(&grid, &intents, &stacks) else {
        return;
    };

    let mut writers = HashSet::new();
    for transfer in &resolution.transfers {
        assert!(writers.insert(transfer.writer));
        assert!(grid.direction_to(transfer.writer, transfer.reader).is_some());
    }
    for node in grid.compute_ids() {
        assert!(resolution.result(node).is_some());
    }
    for (stack, effect) in &resolution.stack_effects {
        let _ = stacks.apply(*stack, effect);
    }
});
