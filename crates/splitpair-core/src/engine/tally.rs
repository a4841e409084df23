use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::ModelError;
use nalgebra::Vector3;

/// Which accumulators a force computation fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TallyFlags {
    pub energy: bool,
    pub virial: bool,
    pub per_atom_energy: bool,
    pub per_atom_virial: bool,
}

impl TallyFlags {
    pub fn global() -> Self {
        Self {
            energy: true,
            virial: true,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            energy: true,
            virial: true,
            per_atom_energy: true,
            per_atom_virial: true,
        }
    }

    pub fn any(&self) -> bool {
        self.energy || self.virial || self.per_atom_energy || self.per_atom_virial
    }
}

/// Energy and virial accumulated over one force computation.
///
/// Virial components are ordered `xx, yy, zz, xy, xz, yz`. When reaction forces are not applied
/// to ghosts (newton off), each owned particle of a pair receives half of the pair's share so
/// that summing over all processes counts every pair once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tally {
    flags: TallyFlags,
    pub energy: EnergyTerm,
    pub virial: [f64; 6],
    pub per_atom_energy: Vec<f64>,
    pub per_atom_virial: Vec<[f64; 6]>,
}

impl Tally {
    pub fn new(flags: TallyFlags, nparticles: usize) -> Self {
        Self {
            flags,
            energy: EnergyTerm::default(),
            virial: [0.0; 6],
            per_atom_energy: if flags.per_atom_energy {
                vec![0.0; nparticles]
            } else {
                Vec::new()
            },
            per_atom_virial: if flags.per_atom_virial {
                vec![[0.0; 6]; nparticles]
            } else {
                Vec::new()
            },
        }
    }

    pub fn flags(&self) -> TallyFlags {
        self.flags
    }

    /// Checks that every enabled per-particle array holds `nparticles` entries.
    pub fn check(&self, nparticles: usize) -> Result<(), ModelError> {
        let lengths = [
            (self.flags.per_atom_energy, "per_atom_energy", self.per_atom_energy.len()),
            (self.flags.per_atom_virial, "per_atom_virial", self.per_atom_virial.len()),
        ];
        for (enabled, what, found) in lengths {
            if enabled && found != nparticles {
                return Err(ModelError::LengthMismatch {
                    what,
                    expected: nparticles,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Resets every accumulator, resizing the per-particle arrays to `nparticles`.
    pub fn reset(&mut self, nparticles: usize) {
        *self = Self::new(self.flags, nparticles);
    }

    /// Adds one pair; `del = x_i - x_j` and `fpair` is force divided by distance.
    #[allow(clippy::too_many_arguments)]
    pub fn pair(
        &mut self,
        i: usize,
        j: usize,
        nlocal: usize,
        newton: bool,
        energy: EnergyTerm,
        fpair: f64,
        del: &Vector3<f64>,
    ) {
        let i_owned = newton || i < nlocal;
        let j_owned = newton || j < nlocal;

        if self.flags.energy {
            if newton {
                self.energy += energy;
            } else {
                let half = energy.scaled(0.5);
                if i < nlocal {
                    self.energy += half;
                }
                if j < nlocal {
                    self.energy += half;
                }
            }
        }

        if self.flags.per_atom_energy {
            let half = 0.5 * energy.total();
            if i_owned {
                self.per_atom_energy[i] += half;
            }
            if j_owned {
                self.per_atom_energy[j] += half;
            }
        }

        if self.flags.virial || self.flags.per_atom_virial {
            let v = [
                del.x * del.x * fpair,
                del.y * del.y * fpair,
                del.z * del.z * fpair,
                del.x * del.y * fpair,
                del.x * del.z * fpair,
                del.y * del.z * fpair,
            ];
            if self.flags.virial {
                if newton {
                    add(&mut self.virial, &v, 1.0);
                } else {
                    if i < nlocal {
                        add(&mut self.virial, &v, 0.5);
                    }
                    if j < nlocal {
                        add(&mut self.virial, &v, 0.5);
                    }
                }
            }
            if self.flags.per_atom_virial {
                if i_owned {
                    add(&mut self.per_atom_virial[i], &v, 0.5);
                }
                if j_owned {
                    add(&mut self.per_atom_virial[j], &v, 0.5);
                }
            }
        }
    }
}

#[inline]
fn add(target: &mut [f64; 6], v: &[f64; 6], scale: f64) {
    for (t, x) in target.iter_mut().zip(v) {
        *t += scale * x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn del() -> Vector3<f64> {
        Vector3::new(1.0, 2.0, 3.0)
    }

    #[test]
    fn newton_on_tallies_full_pair_once() {
        let mut tally = Tally::new(TallyFlags::global(), 2);
        tally.pair(0, 1, 1, true, EnergyTerm::new(2.0, 4.0), 0.5, &del());
        assert_eq!(tally.energy, EnergyTerm::new(2.0, 4.0));
        assert_eq!(tally.virial, [0.5, 2.0, 4.5, 1.0, 1.5, 3.0]);
    }

    #[test]
    fn check_ignores_disabled_per_atom_arrays() {
        assert!(Tally::new(TallyFlags::global(), 0).check(5).is_ok());
        let mut tally = Tally::new(TallyFlags::all(), 3);
        assert!(tally.check(3).is_ok());
        tally.per_atom_virial.pop();
        assert!(matches!(
            tally.check(3),
            Err(ModelError::LengthMismatch {
                what: "per_atom_virial",
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn newton_off_with_ghost_neighbor_tallies_half() {
        let mut tally = Tally::new(TallyFlags::global(), 2);
        tally.pair(0, 1, 1, false, EnergyTerm::new(2.0, 4.0), 0.5, &del());
        assert_eq!(tally.energy, EnergyTerm::new(1.0, 2.0));
        assert_eq!(tally.virial[0], 0.25);
    }

    #[test]
    fn newton_off_with_owned_pair_tallies_both_halves() {
        let mut tally = Tally::new(TallyFlags::global(), 2);
        tally.pair(0, 1, 2, false, EnergyTerm::new(2.0, 4.0), 0.5, &del());
        assert_eq!(tally.energy, EnergyTerm::new(2.0, 4.0));
        assert_eq!(tally.virial[2], 4.5);
    }

    #[test]
    fn per_atom_accumulators_split_between_owned_particles() {
        let mut tally = Tally::new(TallyFlags::all(), 2);
        tally.pair(0, 1, 1, false, EnergyTerm::new(1.0, 1.0), 1.0, &del());
        assert_eq!(tally.per_atom_energy, vec![1.0, 0.0]);
        assert_eq!(tally.per_atom_virial[0][0], 0.5);
        assert_eq!(tally.per_atom_virial[1], [0.0; 6]);

        tally.reset(2);
        tally.pair(0, 1, 1, true, EnergyTerm::new(1.0, 1.0), 1.0, &del());
        assert_eq!(tally.per_atom_energy, vec![1.0, 1.0]);
    }

    #[test]
    fn disabled_flags_leave_accumulators_untouched() {
        let mut tally = Tally::new(TallyFlags::default(), 2);
        tally.pair(0, 1, 2, true, EnergyTerm::new(1.0, 1.0), 1.0, &del());
        assert_eq!(tally.energy, EnergyTerm::default());
        assert!(tally.per_atom_energy.is_empty());
        assert!(!tally.flags().any());
    }
}
