use super::{Ledger, Pairing};
use crate::{ArbitrationError, Grid, Intent, PortRef};

/// Rejects intent sets that do not fit the topology.
pub(super) fn validate(grid: &Grid, intents: &[Intent]) -> Result<(), ArbitrationError> {
    if intents.len() != grid.len() {
        return Err(ArbitrationError::IntentCountMismatch {
            expected: grid.len(),
            actual: intents.len(),
        });
    }

    for (node, intent) in grid.node_ids().zip(intents) {
        if grid.is_stack(node) && !intent.is_idle() {
            return Err(ArbitrationError::PassiveNodeIntent { node });
        }
        if let Some(PortRef::Dir(direction)) = intent.port() {
            if grid.neighbor(node, direction).is_none() {
                return Err(ArbitrationError::MalformedIntent { node, direction });
            }
        }
    }

    Ok(())
}

/// Commits every explicit writer whose neighbor explicitly reads back, and
/// every explicit write into a stack. These pairs never contend.
pub(super) fn pair_direct(ledger: &mut Ledger<'_>) {
    let grid = ledger.grid;
    for writer in grid.compute_ids() {
        let Intent::Write(PortRef::Dir(direction), _) = ledger.intent(writer) else {
            continue;
        };
        let Some(reader) = grid.neighbor(writer, direction) else {
            continue;
        };
        let explicit_reader = matches!(ledger.intent(reader), Intent::Read(PortRef::Dir(_)));
        if !grid.is_stack(reader) && !explicit_reader {
            continue;
        }
        if let Pairing::Open(value) = ledger.pairing(writer, reader) {
            ledger.commit(writer, reader, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::{ArbitrationError, Coord, Direction, Grid, GridLayout, Intent, NodeId, NodeKind};

    #[test]
    fn missing_neighbor_is_malformed() {
        let grid = Grid::from_layout(&GridLayout::rectangle(2, 1)).expect("valid layout");
        let intents = [Intent::read(Direction::Up), Intent::Idle];
        assert_eq!(
            validate(&grid, &intents),
            Err(ArbitrationError::MalformedIntent {
                node: NodeId::new(0),
                direction: Direction::Up,
            })
        );
    }

    #[test]
    fn port_past_coordinate_space_edge_is_malformed() {
        let layout = GridLayout::new().with_node(Coord::new(i32::MAX, 0), NodeKind::Compute);
        let grid = Grid::from_layout(&layout).expect("valid layout");
        assert_eq!(
            validate(&grid, &[Intent::write(Direction::Right, 1)]),
            Err(ArbitrationError::MalformedIntent {
                node: NodeId::new(0),
                direction: Direction::Right,
            })
        );
    }

    #[test]
    fn any_port_on_isolated_node_is_not_malformed() {
        let grid = Grid::from_layout(&GridLayout::rectangle(1, 1)).expect("valid layout");
        assert_eq!(validate(&grid, &[Intent::read_any()]), Ok(()));
        assert_eq!(validate(&grid, &[Intent::write_any(1)]), Ok(()));
    }

    #[test]
    fn stack_intents_and_short_sets_are_rejected() {
        let layout = GridLayout::rectangle(2, 1).with_stack(Coord::new(0, 0));
        let grid = Grid::from_layout(&layout).expect("valid layout");

        assert_eq!(
            validate(&grid, &[Intent::write(Direction::Right, 1), Intent::Idle]),
            Err(ArbitrationError::PassiveNodeIntent {
                node: NodeId::new(0)
            })
        );
        assert_eq!(
            validate(&grid, &[Intent::Idle]),
            Err(ArbitrationError::IntentCountMismatch {
                expected: 2,
                actual: 1,
            })
        );
    }
}
