//! Proposed state changes emitted by the intention phase, resolved
//! deterministically by [`crate::resolution`].

/// A global cell coordinate, also used as the deterministic "linear
/// identifier" the spec's resolution rules sort and break ties on:
/// lexicographic order on `(x, y, z)` is a total order independent of
/// which worker thread touched which region, which is all the ordering
/// contract requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalCoord {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl GlobalCoord {
    /// Construct a coordinate directly.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbor at the given offset.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// A proposed move: `source` wants to occupy the empty `destination`.
/// `priority` is the source's pre-cycle need-debt `D`, used to rank
/// competing proposals for the same destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveIntention {
    /// Proposing cell's coordinate, also the resolution sort/tie-break key
    pub source: GlobalCoord,
    /// Coordinate the source wants to move into
    pub destination: GlobalCoord,
    /// Source's pre-cycle need-debt, used to rank collisions
    pub priority: f32,
}

/// A proposed division: `source` (the mother) wants to place a
/// daughter at the empty `destination`. `priority` is the mother's
/// pre-cycle energy, used to rank competing proposals for the same
/// destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivisionIntention {
    /// Mother cell's coordinate
    pub source: GlobalCoord,
    /// Coordinate of the proposed daughter
    pub destination: GlobalCoord,
    /// Mother's pre-cycle energy, used to rank collisions
    pub priority: f32,
}

/// A proposed energy-osmosis transfer from `source` to `target`.
/// `delta` is the (signed) amount to move from source to target; it is
/// always emitted with `source < target` by [`GlobalCoord`] order so
/// each pair is considered once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyExchangeIntention {
    /// Lower-ordered cell of the pair
    pub source: GlobalCoord,
    /// Higher-ordered cell of the pair
    pub target: GlobalCoord,
    /// Signed amount to subtract from source / add to target
    pub delta: f32,
}

/// A proposed psychic exchange, applied unilaterally to `source`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsychicExchangeIntention {
    /// Cell the exchange is applied to
    pub source: GlobalCoord,
    /// Neighbor the stress/boredom figures were read from
    pub target: GlobalCoord,
    /// Amount added to source's stress
    pub delta_c: f32,
    /// Amount subtracted from source's boredom debt
    pub delta_l: f32,
}

/// One worker's append-only proposal lists for a single parallel phase.
#[derive(Debug, Clone, Default)]
pub struct IntentionBuffer {
    /// Proposed moves
    pub moves: Vec<MoveIntention>,
    /// Proposed divisions
    pub divisions: Vec<DivisionIntention>,
    /// Proposed energy exchanges
    pub exchanges: Vec<EnergyExchangeIntention>,
    /// Proposed psychic exchanges
    pub psychic: Vec<PsychicExchangeIntention>,
}

/// Per-worker intention buffers for one parallel intention phase.
/// Buffers are indexed by worker id, so concatenating them in index
/// order is, by construction, "ascending worker id" merge order.
#[derive(Debug, Clone, Default)]
pub struct IntentionBuffers {
    /// One buffer per worker
    pub workers: Vec<IntentionBuffer>,
}

impl IntentionBuffers {
    /// Allocate `worker_count` empty buffers.
    pub fn new(worker_count: usize) -> Self {
        Self {
            workers: (0..worker_count).map(|_| IntentionBuffer::default()).collect(),
        }
    }

    /// Concatenate all workers' moves, in ascending worker-id order.
    pub fn merged_moves(&self) -> Vec<MoveIntention> {
        self.workers.iter().flat_map(|b| b.moves.iter().copied()).collect()
    }

    /// Concatenate all workers' divisions, in ascending worker-id order.
    pub fn merged_divisions(&self) -> Vec<DivisionIntention> {
        self.workers.iter().flat_map(|b| b.divisions.iter().copied()).collect()
    }

    /// Concatenate all workers' energy exchanges, in ascending worker-id order.
    pub fn merged_exchanges(&self) -> Vec<EnergyExchangeIntention> {
        self.workers.iter().flat_map(|b| b.exchanges.iter().copied()).collect()
    }

    /// Concatenate all workers' psychic exchanges, in ascending worker-id order.
    pub fn merged_psychic(&self) -> Vec<PsychicExchangeIntention> {
        self.workers.iter().flat_map(|b| b.psychic.iter().copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_coord_orders_lexicographically() {
        assert!(GlobalCoord::new(0, 0, 0) < GlobalCoord::new(1, 0, 0));
        assert!(GlobalCoord::new(1, 0, 0) < GlobalCoord::new(1, 1, 0));
        assert!(GlobalCoord::new(1, 1, 0) < GlobalCoord::new(1, 1, 1));
    }

    #[test]
    fn merge_preserves_ascending_worker_order() {
        let mut buffers = IntentionBuffers::new(2);
        buffers.workers[0].moves.push(MoveIntention {
            source: GlobalCoord::new(0, 0, 0),
            destination: GlobalCoord::new(1, 0, 0),
            priority: 1.0,
        });
        buffers.workers[1].moves.push(MoveIntention {
            source: GlobalCoord::new(5, 0, 0),
            destination: GlobalCoord::new(6, 0, 0),
            priority: 2.0,
        });
        let merged = buffers.merged_moves();
        assert_eq!(merged[0].source, GlobalCoord::new(0, 0, 0));
        assert_eq!(merged[1].source, GlobalCoord::new(5, 0, 0));
    }
}
