//! The fixed 26-neighbor enumeration order shared by every law kernel

use crate::cell::synapse_slot;

/// One of the 26 offsets from a cell to a neighbor, carrying the stable
/// synaptic-weight slot index that offset maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborOffset {
    /// Offset along X
    pub dx: i32,
    /// Offset along Y
    pub dy: i32,
    /// Offset along Z
    pub dz: i32,
    /// Index into [`crate::cell::Cell::w`] for this offset
    pub slot: usize,
}

/// The 26 neighbor offsets of `(0,0,0)`, in the fixed order obtained by
/// iterating `dz` outermost, then `dy`, then `dx`, skipping `(0,0,0)`.
/// Every law kernel and the neural sub-scheduler iterate neighbors in
/// exactly this order so that argmax ties resolve deterministically.
pub fn offsets() -> impl Iterator<Item = NeighborOffset> {
    (-1..=1).flat_map(move |dz: i32| {
        (-1..=1).flat_map(move |dy: i32| {
            (-1..=1).filter_map(move |dx: i32| {
                if dx == 0 && dy == 0 && dz == 0 {
                    None
                } else {
                    Some(NeighborOffset {
                        dx,
                        dy,
                        dz,
                        slot: synapse_slot(dx, dy, dz),
                    })
                }
            })
        })
    })
}
