use crate::grid::Position;
use crate::world::ItemHandle;

/// Faults reported by the world adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A sink-shaped position whose container state is neither a chest nor
    /// a dispenser.
    #[error("unknown node kind at {0}")]
    UnknownNodeKind(Position),
    /// The position holds no state the request can use (e.g. text of a
    /// non-sign block).
    #[error("no node state at {0}")]
    MissingNode(Position),
    #[error("unknown item {0:?}")]
    UnknownItem(ItemHandle),
    #[error("host fault: {0}")]
    Host(String),
}

/// Failure while routing a single item. Never fatal to the tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("deposit target {0} is not a sink")]
    NotASink(Position),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let p = Position::new(1, 2, 3);
        assert_eq!(
            WorldError::UnknownNodeKind(p).to_string(),
            "unknown node kind at X1/Y2/Z3"
        );
        assert_eq!(
            WorldError::Host("chunk unloaded".into()).to_string(),
            "host fault: chunk unloaded"
        );
        let route: RouteError = WorldError::MissingNode(p).into();
        assert_eq!(route.to_string(), "no node state at X1/Y2/Z3");
        assert_eq!(
            RouteError::NotASink(p).to_string(),
            "deposit target X1/Y2/Z3 is not a sink"
        );
    }
}
