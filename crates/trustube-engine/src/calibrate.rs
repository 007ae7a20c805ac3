//! Residual-based calibration of the envelope width.

use trustube_collection::SignalSet;
use trustube_stats::tail::TailPool;

use crate::{TrainError, envelope, params::TubeParams, tube::VariableEnsemble};

/// Derives per-variable scale factors from whole-collection residuals.
///
/// For every unit and trained variable the raw ensemble triple (scale
/// `(1,1)`) is compared against the observed values. Upward excesses
/// `(y − z) / (zmax − z)` over rows with spread above the center, and the
/// symmetric downward excesses, are normalized so that `1.0` means "right
/// on the raw bound". Each side keeps the `ceil(tube_threshold ×
/// total_rows)` largest excesses in a [`TailPool`]; the smallest retained
/// value of each pool becomes the side's scale factor, defaulting to `1.0`
/// when no positive excess was observed at all.
///
/// Scale pairs are overwritten wholesale; rerunning calibration never
/// merges with previous factors.
pub(crate) fn calibrate(
    set: &mut SignalSet,
    ensembles: &mut [VariableEnsemble],
    params: &TubeParams,
    total_rows: usize,
) -> Result<(), TrainError> {
    let keep = keep_count(params.tube_threshold, total_rows);
    let target_indices = ensembles
        .iter()
        .map(|ensemble| set.column_index(ensemble.variable()))
        .collect::<Result<Vec<_>, _>>()?;
    let mut pools: Vec<(TailPool, TailPool)> = ensembles
        .iter()
        .map(|_| (TailPool::new(keep), TailPool::new(keep)))
        .collect();

    for pos in 0..set.len() {
        set.seek(pos)?;
        let unit = set.current()?;
        for (ensemble, (&target_index, (up_pool, dn_pool))) in ensembles
            .iter()
            .zip(target_indices.iter().zip(&mut pools))
        {
            if ensemble.candidates().is_empty() {
                continue;
            }
            let observed = unit.column(target_index);
            let raw = envelope::raw_envelope(ensemble.candidates(), set, unit)?;

            let mut up = Vec::new();
            let mut dn = Vec::new();
            for row in 0..raw.len() {
                let center = raw.center[row];
                let y = observed[row];
                if raw.upper[row] > center {
                    let excess = (y - center) / (raw.upper[row] - center);
                    if excess > 0.0 {
                        up.push(excess);
                    }
                }
                if center > raw.lower[row] {
                    let excess = (center - y) / (center - raw.lower[row]);
                    if excess > 0.0 {
                        dn.push(excess);
                    }
                }
            }
            up_pool.extend(up);
            dn_pool.extend(dn);
        }
    }

    for (ensemble, (up_pool, dn_pool)) in ensembles.iter_mut().zip(pools) {
        ensemble.set_scale(envelope::ScalePair {
            qmin: dn_pool.threshold().unwrap_or(1.0),
            qmax: up_pool.threshold().unwrap_or(1.0),
        });
    }
    Ok(())
}

/// Pool size: `ceil(tube_threshold × total_rows)`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn keep_count(tube_threshold: f64, total_rows: usize) -> usize {
    (tube_threshold * total_rows as f64).ceil() as usize
}
