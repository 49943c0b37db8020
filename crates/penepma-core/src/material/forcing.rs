use super::info::MaterialProperties;
use crate::domain::{InteractionForcing, PenelopeResult};

/// Forcing factor written to `IFORCE`.
///
/// A negative forcer is replaced by `|forcer| * mfp / range` evaluated at the
/// beam energy, so the forcing does not depend on the absorption energies
/// PENEPMA would otherwise use for its own estimate.
pub fn correct_forcer(
    forcing: &InteractionForcing,
    beam_energy_ev: f64,
    properties: &dyn MaterialProperties,
) -> PenelopeResult<f64> {
    if forcing.forcer >= 0.0 {
        return Ok(forcing.forcer);
    }

    tracing::debug!(forcer = forcing.forcer, "recalculating forcer");

    let icol = forcing.icol()?;
    let range_m = properties.range_m(beam_energy_ev, forcing.particle)?;
    let mean_free_path_m = properties.mean_free_path_m(beam_energy_ev, forcing.particle, icol)?;
    let forcer = forcing.forcer.abs() * mean_free_path_m / range_m;

    tracing::debug!(forcer, "new forcer value");
    Ok(forcer)
}
