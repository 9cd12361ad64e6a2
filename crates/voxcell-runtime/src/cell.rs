//! The per-voxel agent record

/// Morphogenetic type of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    /// Undifferentiated, can still transition to `Soma` or `Neuron`
    Stem,
    /// Differentiated, non-neural
    Soma,
    /// Differentiated, participates in the neural sub-scheduler
    Neuron,
    /// Immutable floor cell, never moves/divides/metabolizes/dies
    Bedrock,
}

impl CellType {
    /// Decode from the wire/on-disk discriminant used by [`Cell`].
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Stem),
            1 => Some(Self::Soma),
            2 => Some(Self::Neuron),
            3 => Some(Self::Bedrock),
            _ => None,
        }
    }

    /// Encode to the wire/on-disk discriminant used by [`Cell`].
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Stem => 0,
            Self::Soma => 1,
            Self::Neuron => 2,
            Self::Bedrock => 3,
        }
    }
}

/// Number of synaptic weight slots (26 neighbors, center slot unused).
pub const SYNAPSE_SLOTS: usize = 27;

/// Index into [`Cell::w`] for a neighbor offset `(dx, dy, dz)` each in
/// `{-1, 0, 1}`.
pub const fn synapse_slot(dx: i32, dy: i32, dz: i32) -> usize {
    ((dz + 1) * 9 + (dy + 1) * 3 + (dx + 1)) as usize
}

/// A single lattice voxel: either empty (`alive = false`, all numeric
/// fields zero by convention) or an autonomous agent carrying physical,
/// morphogenetic, genetic, mnemonic and neural state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Morphogenetic type
    pub cell_type: CellType,
    /// Innate genetic resistance, in `[0,1]`
    pub r: f32,
    /// Innate critical stress threshold, in `[0,1]`
    pub sc: f32,
    /// Energy reserve, `>= 0`
    pub e: f32,
    /// Need/hunger debt, `>= 0`
    pub d: f32,
    /// Stress, in `[0,1]`
    pub c: f32,
    /// Boredom debt, `>= 0`
    pub l: f32,
    /// Memory of recent peak neighbor energy, `>= 0`
    pub m: f32,
    /// Age in cycles
    pub a: u32,
    /// Neural membrane potential, in `[-1,1]`
    pub p: f32,
    /// Refractory counter
    pub refractory: u32,
    /// Spike cost accumulated since the last metabolism phase
    pub e_cost: f32,
    /// Spike history shift register, newest bit = bit 0
    pub h: u32,
    /// Differentiation gradient, in `[0,1]`
    pub g: f32,
    /// Synaptic weights, indexed by [`synapse_slot`]
    pub w: [f32; SYNAPSE_SLOTS],
    /// Whether this voxel is occupied
    pub alive: bool,
}

impl Cell {
    /// Size in bytes of the fixed on-disk/wire encoding produced by
    /// [`Cell::encode`].
    pub const ENCODED_LEN: usize = 1 // cell_type
        + 4 * 9 // r, sc, e, d, c, l, m, p, g
        + 4 // a
        + 4 // refractory
        + 4 // e_cost
        + 4 // h
        + 4 * SYNAPSE_SLOTS // w
        + 1; // alive

    /// The canonical empty voxel: `alive = false`, every numeric field zero.
    pub const EMPTY: Cell = Cell {
        cell_type: CellType::Stem,
        r: 0.0,
        sc: 0.0,
        e: 0.0,
        d: 0.0,
        c: 0.0,
        l: 0.0,
        m: 0.0,
        a: 0,
        p: 0.0,
        refractory: 0,
        e_cost: 0.0,
        h: 0,
        g: 0.0,
        w: [0.0; SYNAPSE_SLOTS],
        alive: false,
    };

    /// Construct a bedrock floor cell.
    pub fn bedrock() -> Self {
        Self {
            cell_type: CellType::Bedrock,
            alive: true,
            ..Self::EMPTY
        }
    }

    /// Reset this cell in place to the empty voxel.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Encode this cell to its fixed-length little-endian byte form.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.cell_type.as_u8());
        for v in [self.r, self.sc, self.e, self.d, self.c, self.l, self.m, self.p, self.g] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&self.a.to_le_bytes());
        out.extend_from_slice(&self.refractory.to_le_bytes());
        out.extend_from_slice(&self.e_cost.to_le_bytes());
        out.extend_from_slice(&self.h.to_le_bytes());
        for v in &self.w {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.push(self.alive as u8);
    }

    /// Decode a cell from `Self::ENCODED_LEN` bytes at the front of `bytes`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::ENCODED_LEN {
            return None;
        }
        let mut off = 0usize;
        let cell_type = CellType::from_u8(bytes[off])?;
        off += 1;
        let mut scalars = [0f32; 9];
        for s in &mut scalars {
            *s = f32::from_le_bytes(bytes[off..off + 4].try_into().ok()?);
            off += 4;
        }
        let a = u32::from_le_bytes(bytes[off..off + 4].try_into().ok()?);
        off += 4;
        let refractory = u32::from_le_bytes(bytes[off..off + 4].try_into().ok()?);
        off += 4;
        let e_cost = f32::from_le_bytes(bytes[off..off + 4].try_into().ok()?);
        off += 4;
        let h = u32::from_le_bytes(bytes[off..off + 4].try_into().ok()?);
        off += 4;
        let mut w = [0f32; SYNAPSE_SLOTS];
        for slot in &mut w {
            *slot = f32::from_le_bytes(bytes[off..off + 4].try_into().ok()?);
            off += 4;
        }
        let alive = bytes[off] != 0;
        Some(Self {
            cell_type,
            r: scalars[0],
            sc: scalars[1],
            e: scalars[2],
            d: scalars[3],
            c: scalars[4],
            l: scalars[5],
            m: scalars[6],
            a,
            p: scalars[7],
            refractory,
            e_cost,
            h,
            g: scalars[8],
            w,
            alive,
        })
    }
}
