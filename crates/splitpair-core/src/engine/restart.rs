//! Binary checkpoint of pair settings and explicitly set coefficients.
//!
//! All values are little-endian. The settings record is followed by one entry per type pair
//! `i <= j` in row-major order: an `i32` flag, and when the flag is `1`, `epsilon`, `sigma`
//! and `cutoff` as `f64`.

use super::config::{ConfigError, InteractionMode, PairSettings, PairSettingsBuilder};
use crate::core::forcefield::params::{MixingRule, PairCoeffs, ParameterError, ParameterTable};
use crate::core::forcefield::table::TableSettings;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Byte length of the settings record.
pub const SETTINGS_RECORD_LEN: usize = 56;

const COULOMB_BIT: i32 = 1 << 1;
const DISPERSION_BIT: i32 = 1 << 6;

#[derive(Debug, Error)]
pub enum RestartError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid coefficient flag {flag} for types ({i},{j})")]
    InvalidFlag { i: usize, j: usize, flag: i32 },
    #[error("Unknown mixing rule code {0}")]
    InvalidMixing(i32),
    #[error("Inconsistent interaction mode bits (order {order:#x}, off {off:#x})")]
    InvalidModes { order: i32, off: i32 },
    #[error("Invalid table resolution {0}")]
    InvalidTableBits(i32),
    #[error("Restored settings are invalid: {0}")]
    Settings(#[from] ConfigError),
    #[error("Restored coefficients are invalid: {0}")]
    Parameter(#[from] ParameterError),
}

fn mode_bits(mode: InteractionMode, bit: i32) -> (i32, i32) {
    match mode {
        InteractionMode::Long => (bit, 0),
        InteractionMode::Off => (0, bit),
        InteractionMode::Cut => (0, 0),
    }
}

fn mode_from_bits(order: i32, off: i32, bit: i32) -> Result<InteractionMode, RestartError> {
    match (order & bit != 0, off & bit != 0) {
        (true, false) => Ok(InteractionMode::Long),
        (false, true) => Ok(InteractionMode::Off),
        (false, false) => Ok(InteractionMode::Cut),
        (true, true) => Err(RestartError::InvalidModes { order, off }),
    }
}

fn table_bits(bits: u32) -> i32 {
    i32::try_from(bits).unwrap_or(i32::MAX)
}

/// Serialises the settings into their fixed-size record.
pub fn encode_settings(settings: &PairSettings) -> [u8; SETTINGS_RECORD_LEN] {
    let (coul_order, coul_off) = mode_bits(settings.coulomb, COULOMB_BIT);
    let (disp_order, disp_off) = mode_bits(settings.dispersion, DISPERSION_BIT);

    let mut record = Vec::with_capacity(SETTINGS_RECORD_LEN);
    record.extend_from_slice(&settings.cut_lj_global.to_le_bytes());
    record.extend_from_slice(&settings.cut_coul.to_le_bytes());
    record.extend_from_slice(&i32::from(settings.shift).to_le_bytes());
    record.extend_from_slice(&settings.mixing.code().to_le_bytes());
    record.extend_from_slice(&table_bits(settings.table.bits).to_le_bytes());
    record.extend_from_slice(&settings.table.inner.to_le_bytes());
    record.extend_from_slice(&(coul_order | disp_order).to_le_bytes());
    record.extend_from_slice(&(coul_off | disp_off).to_le_bytes());
    record.extend_from_slice(&table_bits(settings.dispersion_table_bits).to_le_bytes());
    record.extend_from_slice(&settings.table.tolerance.to_le_bytes());

    let mut out = [0u8; SETTINGS_RECORD_LEN];
    out.copy_from_slice(&record);
    out
}

struct RecordCursor<'a> {
    bytes: &'a [u8],
}

impl RecordCursor<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let (head, rest) = self.bytes.split_at(N);
        self.bytes = rest;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        out
    }

    fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }
}

fn unsigned_bits(bits: i32) -> Result<u32, RestartError> {
    u32::try_from(bits).map_err(|_| RestartError::InvalidTableBits(bits))
}

/// Rebuilds settings from a record.
///
/// The Coulomb cutoff is only passed on when it is an independent setting, so that a style
/// with both modes long is restored through the same validation as a freshly configured one.
/// `qqrd2e` and `newton_pair` are not part of the record and come back at their defaults.
pub fn decode_settings(record: &[u8; SETTINGS_RECORD_LEN]) -> Result<PairSettings, RestartError> {
    let mut cursor = RecordCursor { bytes: record };
    let cut_lj = cursor.f64();
    let cut_coul = cursor.f64();
    let shift = cursor.i32() != 0;
    let mixing_code = cursor.i32();
    let bits = unsigned_bits(cursor.i32())?;
    let inner = cursor.f64();
    let order = cursor.i32();
    let off = cursor.i32();
    let dispersion_bits = unsigned_bits(cursor.i32())?;
    let tolerance = cursor.f64();

    let mixing = MixingRule::from_code(mixing_code).ok_or(RestartError::InvalidMixing(mixing_code))?;
    let coulomb = mode_from_bits(order, off, COULOMB_BIT)?;
    let dispersion = mode_from_bits(order, off, DISPERSION_BIT)?;

    let mut builder = PairSettingsBuilder::new()
        .dispersion(dispersion)
        .coulomb(coulomb)
        .cut_lj(cut_lj)
        .mixing(mixing)
        .shift(shift)
        .table(TableSettings {
            bits,
            inner,
            tolerance,
        })
        .dispersion_table_bits(dispersion_bits);
    if !(dispersion == InteractionMode::Long && coulomb == InteractionMode::Long) {
        builder = builder.cut_coul(cut_coul);
    }
    Ok(builder.build()?)
}

pub fn write_settings<W: Write + ?Sized>(
    writer: &mut W,
    settings: &PairSettings,
) -> Result<(), RestartError> {
    writer.write_all(&encode_settings(settings))?;
    Ok(())
}

pub fn read_settings<R: Read + ?Sized>(reader: &mut R) -> Result<PairSettings, RestartError> {
    let mut record = [0u8; SETTINGS_RECORD_LEN];
    reader.read_exact(&mut record)?;
    decode_settings(&record)
}

/// Writes the explicit coefficients of every `i <= j` pair.
pub fn write_coefficients<W: Write + ?Sized>(
    writer: &mut W,
    table: &ParameterTable,
) -> Result<(), RestartError> {
    for (_, _, coeffs) in table.upper_triangle() {
        match coeffs {
            Some(c) => {
                writer.write_all(&1i32.to_le_bytes())?;
                for value in [c.epsilon, c.sigma, c.cutoff] {
                    writer.write_all(&value.to_le_bytes())?;
                }
            }
            None => writer.write_all(&0i32.to_le_bytes())?,
        }
    }
    Ok(())
}

fn read_i32<R: Read + ?Sized>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64<R: Read + ?Sized>(reader: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

pub fn read_coefficients<R: Read + ?Sized>(
    reader: &mut R,
    ntypes: usize,
) -> Result<ParameterTable, RestartError> {
    let mut table = ParameterTable::new(ntypes);
    for i in 1..=ntypes {
        for j in i..=ntypes {
            match read_i32(reader)? {
                0 => {}
                1 => {
                    let epsilon = read_f64(reader)?;
                    let sigma = read_f64(reader)?;
                    let cutoff = read_f64(reader)?;
                    table.set(i, j, PairCoeffs::new(epsilon, sigma, cutoff)?)?;
                }
                flag => return Err(RestartError::InvalidFlag { i, j, flag }),
            }
        }
    }
    Ok(table)
}

/// Writes the settings record followed by the coefficient records.
pub fn write_restart<W: Write + ?Sized>(
    writer: &mut W,
    settings: &PairSettings,
    coefficients: &ParameterTable,
) -> Result<(), RestartError> {
    write_settings(writer, settings)?;
    write_coefficients(writer, coefficients)
}

/// Reads a full checkpoint for a system with `ntypes` atom types.
pub fn read_restart<R: Read + ?Sized>(
    reader: &mut R,
    ntypes: usize,
) -> Result<(PairSettings, ParameterTable), RestartError> {
    let settings = read_settings(reader)?;
    let coefficients = read_coefficients(reader, ntypes)?;
    Ok((settings, coefficients))
}
