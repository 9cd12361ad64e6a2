//! Tunable law constants and engine-construction options

use std::io::BufRead;
use std::path::Path;

use crate::error::{EngineError, Result};

/// The constants governing every law kernel. Field names mirror the
/// recognised `key=value` names from `load_parameters_text`, translated
/// to `snake_case`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterBlock {
    /// Weight of need-debt in the movement score
    pub k_d: f32,
    /// Weight of stress (negated) in the movement score
    pub k_c: f32,
    /// Weight of per-age memory in the movement score
    pub k_m: f32,
    /// Weight of same-type adhesion in the movement score
    pub k_adh: f32,
    /// Flat energy cost of a winning move
    pub cost_movement: f32,
    /// Energy threshold above which division is proposed
    pub seuil_energie_division: f32,
    /// Flat energy cost subtracted from the mother on division
    pub cost_division: f32,
    /// Radius parameter for field diffusion (reserved for host-side rendering use)
    pub rayon_diffusion: f32,
    /// Attenuation exponent for field diffusion (reserved for host-side rendering use)
    pub alpha_attenuation: f32,
    /// Weight of neighboring energy in the movement score's field term
    pub k_champ_e: f32,
    /// Weight of neighboring stress in the movement score's field term
    pub k_champ_c: f32,
    /// Fraction of energy difference transferred per osmosis exchange
    pub facteur_echange_energie: f32,
    /// Minimum energy difference gate for osmosis (reserved; spec only gates on `|delta| > eps`)
    pub seuil_difference_energie: f32,
    /// Maximum resistance difference for two cells to be osmosis-compatible
    pub seuil_similarite_r: f32,
    /// Clamp bound on a single osmosis exchange
    pub max_flux_energie: f32,
    /// Fraction of neighbor stress/boredom transferred per psychic exchange
    pub facteur_echange_psychique: f32,
    /// Decay rate of the differentiation gradient with distance from the barycentre
    pub lambda_gradient: f32,
    /// Gradient threshold below which a stem cell differentiates into soma
    pub seuil_soma: f32,
    /// Gradient threshold at/above which a stem cell differentiates into a neuron
    pub seuil_neuro: f32,
    /// Number of neural sub-ticks per physical cycle
    pub ticks_neuraux_par_physique: u32,
    /// Spike cost added to `e_cost` on firing
    pub cout_spike: f32,
    /// Refractory period length, in sub-ticks
    pub periode_refractaire: u32,
    /// Potential threshold above which a neuron fires
    pub seuil_fire: f32,
    /// Per-sub-tick multiplicative decay applied to synaptic weights
    pub decay_synapse: f32,
    /// Hebbian learning rate
    pub learn_rate: f32,
    /// Per-cycle multiplicative forgetting rate applied to memory
    pub taux_oubli: f32,
    /// Baseline metabolic energy cost per cycle
    pub k_thermo: f32,
    /// Need-debt accrual per cycle
    pub d_per_tick: f32,
    /// Boredom-debt accrual per cycle
    pub l_per_tick: f32,
    /// Energy gained per cycle above the sunlight height threshold
    pub sensibilite_soleil: f32,
    /// Fraction of `world_height` above which sunlight applies
    pub hauteur_soleil: f32,
    /// World height used by the sunlight height threshold
    pub world_height: f32,
}

impl Default for ParameterBlock {
    fn default() -> Self {
        Self {
            k_d: 1.0,
            k_c: 0.5,
            k_m: 0.5,
            k_adh: 0.5,
            cost_movement: 0.01,
            seuil_energie_division: 1.8,
            cost_division: 0.0,
            rayon_diffusion: 2.0,
            alpha_attenuation: 1.0,
            k_champ_e: 1.0,
            k_champ_c: 1.0,
            facteur_echange_energie: 0.1,
            seuil_difference_energie: 0.2,
            seuil_similarite_r: 0.1,
            max_flux_energie: 0.05,
            facteur_echange_psychique: 0.1,
            lambda_gradient: 0.1,
            seuil_soma: 0.3,
            seuil_neuro: 0.7,
            ticks_neuraux_par_physique: 5,
            cout_spike: 0.005,
            periode_refractaire: 2,
            seuil_fire: 0.85,
            decay_synapse: 0.999,
            learn_rate: 0.05,
            taux_oubli: 0.01,
            k_thermo: 0.001,
            d_per_tick: 0.002,
            l_per_tick: 0.001,
            sensibilite_soleil: 0.005,
            hauteur_soleil: 0.8,
            world_height: 32.0,
        }
    }
}

impl ParameterBlock {
    /// Set a single parameter by its recognised `key=value` name
    /// (case-sensitive, matching `load_parameters_text`). Returns
    /// `false` for an unrecognised key so the caller can log a warning
    /// without aborting the parse.
    pub fn set_by_key(&mut self, key: &str, value: f32) -> bool {
        match key {
            "K_D" => self.k_d = value,
            "K_C" => self.k_c = value,
            "K_M" => self.k_m = value,
            "K_ADH" => self.k_adh = value,
            "COST_MOVEMENT" => self.cost_movement = value,
            "SEUIL_ENERGIE_DIVISION" => self.seuil_energie_division = value,
            "COST_DIVISION" => self.cost_division = value,
            "RAYON_DIFFUSION" => self.rayon_diffusion = value,
            "ALPHA_ATTENUATION" => self.alpha_attenuation = value,
            "K_CHAMP_E" => self.k_champ_e = value,
            "K_CHAMP_C" => self.k_champ_c = value,
            "FACTEUR_ECHANGE_ENERGIE" => self.facteur_echange_energie = value,
            "SEUIL_DIFFERENCE_ENERGIE" => self.seuil_difference_energie = value,
            "SEUIL_SIMILARITE_R" => self.seuil_similarite_r = value,
            "MAX_FLUX_ENERGIE" => self.max_flux_energie = value,
            "FACTEUR_ECHANGE_PSYCHIQUE" => self.facteur_echange_psychique = value,
            "LAMBDA_GRADIENT" => self.lambda_gradient = value,
            "SEUIL_SOMA" => self.seuil_soma = value,
            "SEUIL_NEURO" => self.seuil_neuro = value,
            "TICKS_NEURAUX_PAR_PHYSIQUE" => self.ticks_neuraux_par_physique = value.max(0.0) as u32,
            "COUT_SPIKE" => self.cout_spike = value,
            "PERIODE_REFRACTAIRE" => self.periode_refractaire = value.max(0.0) as u32,
            "SEUIL_FIRE" => self.seuil_fire = value,
            "DECAY_SYNAPSE" => self.decay_synapse = value,
            "LEARN_RATE" => self.learn_rate = value,
            "TAUX_OUBLI" => self.taux_oubli = value,
            "K_THERMO" => self.k_thermo = value,
            "D_PER_TICK" => self.d_per_tick = value,
            "L_PER_TICK" => self.l_per_tick = value,
            "SENSIBILITE_SOLEIL" => self.sensibilite_soleil = value,
            "HAUTEUR_SOLEIL" => self.hauteur_soleil = value,
            "WORLD_HEIGHT" => self.world_height = value,
            _ => return false,
        }
        true
    }

    /// Parse `key=value` lines (blank lines and `#`-prefixed comments
    /// skipped) from a reader, applying each to `self` in place.
    /// Unknown keys and unparsable values are logged at `warn` and
    /// skipped, matching the original loader's tolerant behavior.
    pub fn apply_text(&mut self, reader: impl BufRead) -> Result<()> {
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                log::warn!("parameter file line {}: malformed, missing '=': {trimmed:?}", lineno + 1);
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match value.parse::<f32>() {
                Ok(parsed) => {
                    if !self.set_by_key(key, parsed) {
                        log::warn!("parameter file line {}: unknown key {key:?}, ignored", lineno + 1);
                    }
                }
                Err(_) => {
                    log::warn!("parameter file line {}: value {value:?} for key {key:?} is not a number", lineno + 1);
                }
            }
        }
        Ok(())
    }

    /// Load and apply a `key=value` parameter file from disk.
    pub fn load_text(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::open(path)?;
        self.apply_text(std::io::BufReader::new(file))
    }

    /// Number of `f32`s in [`ParameterBlock::encode`]'s output (every
    /// field, with the two counters widened to `f32`).
    pub const ENCODED_FIELD_COUNT: usize = 32;

    /// Encode every field to a fixed-length little-endian byte block,
    /// for embedding in a world save file.
    pub fn encode(&self) -> Vec<u8> {
        let fields: [f32; Self::ENCODED_FIELD_COUNT] = [
            self.k_d,
            self.k_c,
            self.k_m,
            self.k_adh,
            self.cost_movement,
            self.seuil_energie_division,
            self.cost_division,
            self.rayon_diffusion,
            self.alpha_attenuation,
            self.k_champ_e,
            self.k_champ_c,
            self.facteur_echange_energie,
            self.seuil_difference_energie,
            self.seuil_similarite_r,
            self.max_flux_energie,
            self.facteur_echange_psychique,
            self.lambda_gradient,
            self.seuil_soma,
            self.seuil_neuro,
            self.ticks_neuraux_par_physique as f32,
            self.cout_spike,
            self.periode_refractaire as f32,
            self.seuil_fire,
            self.decay_synapse,
            self.learn_rate,
            self.taux_oubli,
            self.k_thermo,
            self.d_per_tick,
            self.l_per_tick,
            self.sensibilite_soleil,
            self.hauteur_soleil,
            self.world_height,
        ];
        let mut out = Vec::with_capacity(Self::ENCODED_FIELD_COUNT * 4);
        for v in fields {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Decode a parameter block from [`ParameterBlock::encode`]'s output.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let expected = Self::ENCODED_FIELD_COUNT * 4;
        if bytes.len() < expected {
            return None;
        }
        let mut words = [0f32; Self::ENCODED_FIELD_COUNT];
        for (i, word) in words.iter_mut().enumerate() {
            *word = f32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().ok()?);
        }
        Some(Self {
            k_d: words[0],
            k_c: words[1],
            k_m: words[2],
            k_adh: words[3],
            cost_movement: words[4],
            seuil_energie_division: words[5],
            cost_division: words[6],
            rayon_diffusion: words[7],
            alpha_attenuation: words[8],
            k_champ_e: words[9],
            k_champ_c: words[10],
            facteur_echange_energie: words[11],
            seuil_difference_energie: words[12],
            seuil_similarite_r: words[13],
            max_flux_energie: words[14],
            facteur_echange_psychique: words[15],
            lambda_gradient: words[16],
            seuil_soma: words[17],
            seuil_neuro: words[18],
            ticks_neuraux_par_physique: words[19] as u32,
            cout_spike: words[20],
            periode_refractaire: words[21] as u32,
            seuil_fire: words[22],
            decay_synapse: words[23],
            learn_rate: words[24],
            taux_oubli: words[25],
            k_thermo: words[26],
            d_per_tick: words[27],
            l_per_tick: words[28],
            sensibilite_soleil: words[29],
            hauteur_soleil: words[30],
            world_height: words[31],
        })
    }
}

/// Engine-construction-time options that the original implementation
/// hardcoded as globals: worker pool size, the invariant audit pass
/// toggle, and resource guards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Rayon thread pool size to use; `None` uses rayon's global default.
    pub worker_threads: Option<usize>,
    /// Whether to run the invariant audit pass (§4.15) after finalization.
    pub audit_invariants: bool,
    /// Soft ceiling on total alive cells; `None` disables the guard.
    pub max_cells: Option<u64>,
    /// Soft ceiling on estimated RAM usage, in megabytes; `None` disables the guard.
    pub max_ram_mb: Option<u64>,
    /// When `true`, resource guard breaches are logged and allowed
    /// through instead of rejected.
    pub limit_safety_override: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            audit_invariants: false,
            max_cells: None,
            max_ram_mb: None,
            limit_safety_override: false,
        }
    }
}

impl EngineConfig {
    /// Construct a config, validating that `worker_threads`, if set, is nonzero.
    pub fn new(worker_threads: Option<usize>) -> Result<Self> {
        let config = Self {
            worker_threads,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check documented invariants on this config.
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            return Err(EngineError::invalid_parameter(
                "worker_threads",
                0,
                "must be nonzero when set",
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_constants() {
        let params = ParameterBlock::default();
        assert_eq!(params.seuil_energie_division, 1.8);
        assert_eq!(params.ticks_neuraux_par_physique, 5);
        assert_eq!(params.seuil_fire, 0.85);
    }

    #[test]
    fn set_by_key_rejects_unknown_key() {
        let mut params = ParameterBlock::default();
        assert!(!params.set_by_key("NOT_A_KEY", 1.0));
    }

    #[test]
    fn apply_text_skips_comments_and_blanks_and_unknown_keys() {
        let text = "# a comment\n\nK_D=2.5\nNOT_A_KEY=9\nmalformed line\nCOST_MOVEMENT=oops\n";
        let mut params = ParameterBlock::default();
        params.apply_text(text.as_bytes()).unwrap();
        assert_eq!(params.k_d, 2.5);
        assert_eq!(params.cost_movement, ParameterBlock::default().cost_movement);
    }

    #[test]
    fn engine_config_rejects_zero_worker_threads() {
        let err = EngineConfig::new(Some(0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
    }
}
