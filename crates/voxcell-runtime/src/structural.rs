//! Structural law: irreversible stem-cell differentiation

use crate::cell::CellType;
use crate::intentions::GlobalCoord;
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// Compute the mean coordinate of every alive cell, as the cycle's
/// barycentre. Returns the origin if the world is empty.
pub fn compute_barycentre(map: &ChunkMap) -> (f64, f64, f64) {
    let mut sum = (0.0f64, 0.0f64, 0.0f64);
    let mut count = 0u64;
    for (coord, chunk) in map.iter_chunks_ordered() {
        for lz in 0..16u8 {
            for ly in 0..16u8 {
                for lx in 0..16u8 {
                    let idx = crate::chunk::Chunk::local_index(lx, ly, lz);
                    let cell = chunk.cell(idx);
                    if !cell.alive {
                        continue;
                    }
                    let x = coord.cx * 16 + lx as i32;
                    let y = coord.cy * 16 + ly as i32;
                    let z = coord.cz * 16 + lz as i32;
                    sum.0 += x as f64;
                    sum.1 += y as f64;
                    sum.2 += z as f64;
                    count += 1;
                }
            }
        }
    }
    if count == 0 {
        return (0.0, 0.0, 0.0);
    }
    (sum.0 / count as f64, sum.1 / count as f64, sum.2 / count as f64)
}

/// Apply the structural law in place to one cell: update its gradient
/// from distance to `barycentre`, and irreversibly differentiate stem
/// cells whose gradient crosses the soma/neuron thresholds.
pub fn apply_structural_law(
    coord: GlobalCoord,
    cell: &mut crate::cell::Cell,
    barycentre: (f64, f64, f64),
    params: &ParameterBlock,
) {
    if !cell.alive || cell.cell_type == CellType::Bedrock {
        return;
    }
    let dx = coord.x as f64 - barycentre.0;
    let dy = coord.y as f64 - barycentre.1;
    let dz = coord.z as f64 - barycentre.2;
    let distance = (dx * dx + dy * dy + dz * dz).sqrt();
    cell.g = (-(params.lambda_gradient as f64) * distance).exp() as f32;

    if cell.cell_type == CellType::Stem {
        if cell.g < params.seuil_soma {
            cell.cell_type = CellType::Soma;
        } else if cell.g >= params.seuil_neuro {
            cell.cell_type = CellType::Neuron;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn empty_world_has_origin_barycentre() {
        let map = ChunkMap::new(None);
        assert_eq!(compute_barycentre(&map), (0.0, 0.0, 0.0));
    }

    #[test]
    fn barycentre_is_mean_of_alive_coords() {
        let mut map = ChunkMap::new(None);
        map.cell_mut(0, 0, 0).alive = true;
        map.cell_mut(2, 0, 0).alive = true;
        let (bx, _, _) = compute_barycentre(&map);
        assert!((bx - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stem_cell_differentiates_to_soma_far_from_barycentre() {
        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.cell_type = CellType::Stem;
        let params = ParameterBlock {
            lambda_gradient: 1.0,
            seuil_soma: 0.5,
            seuil_neuro: 0.9,
            ..ParameterBlock::default()
        };
        apply_structural_law(GlobalCoord::new(10, 0, 0), &mut cell, (0.0, 0.0, 0.0), &params);
        assert_eq!(cell.cell_type, CellType::Soma);
    }

    #[test]
    fn stem_cell_differentiates_to_neuron_near_barycentre() {
        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.cell_type = CellType::Stem;
        let params = ParameterBlock {
            lambda_gradient: 1.0,
            seuil_soma: 0.3,
            seuil_neuro: 0.7,
            ..ParameterBlock::default()
        };
        apply_structural_law(GlobalCoord::new(0, 0, 0), &mut cell, (0.0, 0.0, 0.0), &params);
        assert_eq!(cell.cell_type, CellType::Neuron);
    }

    #[test]
    fn bedrock_is_never_touched() {
        let mut cell = Cell::bedrock();
        let before = cell;
        apply_structural_law(GlobalCoord::new(0, 0, 0), &mut cell, (5.0, 5.0, 5.0), &ParameterBlock::default());
        assert_eq!(cell, before);
    }
}
