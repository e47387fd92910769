//! # BDF 输出解析器
//!
//! 解析 BDF 输出文件（频率部分由 UniMoVib 给出），提取：
//! - 几何优化各步的构型、能量与收敛值（或单点计算）
//! - 振动分析（每块最多 3 个模式，含不可约表示）
//! - 热力学量与频率计算后的收敛诊断
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 分派
//! - 使用 `parsers/cursor.rs`, `models/`

use super::cursor::{LineCursor, TextSource};
use super::{extract_number_after, extract_value_after_eq, numbers_in, parse_fortran_float};
use crate::models::element::normalize_symbol;
use crate::models::{
    Atom, ComputationRecord, ConvergenceMetrics, OptimizationStep, ThermoConvergence,
    Thermochemistry, VibrationalMode,
};
use tracing::{debug, info};

const STEP_MARKER: &str = "Geometry Optimization step :";
const ENERGY_TAG: &str = "Energy=";
const FALLBACK_ENERGY_TAG: &str = "E_tot =";
const CURRENT_VALUES_MARKER: &str = "Current values";
const VIBRATION_MARKER: &str = "Results of vibrations:";
const TRANSLATION_MARKER: &str = "Results of translations";
const THERMO_MARKER: &str = "Thermal Contributions to Energies";
const THERMO_END_MARKER: &str = "UniMoVib job terminated";

pub const KEYWORDS: &[&str] = &[
    "Geometry Optimization step",
    VIBRATION_MARKER,
    THERMO_MARKER,
    "Atom         Coord",
];

/// BDF 解析器
#[derive(Debug, Default)]
pub struct BdfParser;

impl BdfParser {
    pub fn new() -> Self {
        BdfParser
    }

    pub fn parse(&mut self, source: &TextSource) -> ComputationRecord {
        let mut record = ComputationRecord::new();
        let mut cur = source.cursor();

        if cur.find(STEP_MARKER).is_some() {
            info!("Found geometry optimization");
            record.has_optimization = true;
            cur.reset();
            parse_optimization_steps(&mut cur, &mut record);
        } else {
            info!("Single point calculation detected");
            cur.reset();
            let mut step = parse_step_window(cur, 1);
            step.converged = true;
            record.push_step(step, None);
        }

        cur.reset();
        parse_frequencies(&mut cur, &mut record);

        cur.reset();
        parse_thermochemistry(&mut cur, &mut record);

        record
    }
}

// ─────────────────────────────────────────────────────────────
// 几何优化 / 单点
// ─────────────────────────────────────────────────────────────

fn parse_optimization_steps(cur: &mut LineCursor, record: &mut ComputationRecord) {
    while let Some(line) = cur.find(STEP_MARKER) {
        let index = extract_number_after(line, ":")
            .map(|v| v as usize)
            .unwrap_or(record.steps.len() + 1);

        let window = cur.until(STEP_MARKER);
        let mut step = parse_step_window(window, index);

        if let Some(metrics) = parse_current_values(window) {
            step.set_convergence(metrics);
        } else {
            debug!("Step {}: no convergence values", index);
        }

        let energy = step.energy;
        if record.push_step(step, None) {
            debug!("Added step {} (E = {:.9})", index, energy);
        }
    }

    info!("Total optimization steps: {}", record.steps.len());
}

fn parse_step_window(window: LineCursor, index: usize) -> OptimizationStep {
    let mut step = OptimizationStep::new(index);

    let mut geo = window;
    while let Some(line) = geo.next_line() {
        if line.contains("Atom") && line.contains("Coord") {
            step.atoms = read_atoms(&mut geo);
            break;
        }
    }

    step.energy = last_energy(window).unwrap_or(0.0);
    step
}

fn read_atoms(cur: &mut LineCursor) -> Vec<Atom> {
    let mut atoms = Vec::new();

    while let Some(line) = cur.next_line() {
        let t = line.trim();
        if t.is_empty() || t.contains("State=") || t.contains(ENERGY_TAG) {
            break;
        }

        let tokens: Vec<&str> = t.split_whitespace().collect();
        if tokens.len() < 4 {
            continue;
        }
        let coords: Vec<f64> = tokens[1..4]
            .iter()
            .filter_map(|s| parse_fortran_float(s))
            .collect();
        if coords.len() == 3 {
            atoms.push(Atom::new(
                normalize_symbol(tokens[0]),
                [coords[0], coords[1], coords[2]],
            ));
        }
    }

    atoms
}

/// 窗口内最后一个 `Energy=`，没有时退回 `E_tot =`
fn last_energy(mut window: LineCursor) -> Option<f64> {
    let mut energy = None;
    let mut fallback = None;

    while let Some(line) = window.next_line() {
        if line.contains(ENERGY_TAG) {
            energy = extract_number_after(line, ENERGY_TAG).or(energy);
        } else if line.contains(FALLBACK_ENERGY_TAG) {
            fallback = extract_number_after(line, FALLBACK_ENERGY_TAG).or(fallback);
        }
    }

    energy.or(fallback)
}

/// `Current values  :  rms-force max-force rms-step max-step`（数值可能在下一行）
fn parse_current_values(mut window: LineCursor) -> Option<ConvergenceMetrics> {
    let line = window.find(CURRENT_VALUES_MARKER)?;

    let after_colon = line.split_once(':').map(|(_, rest)| rest).unwrap_or("");
    let mut values = numbers_in(after_colon);
    if values.len() < 4 {
        values = numbers_in(window.next_line()?);
    }

    (values.len() >= 4)
        .then(|| ConvergenceMetrics::new(values[0], values[1], values[2], values[3]))
}

// ─────────────────────────────────────────────────────────────
// 振动分析
// ─────────────────────────────────────────────────────────────

fn parse_frequencies(cur: &mut LineCursor, record: &mut ComputationRecord) {
    if cur.find(VIBRATION_MARKER).is_none() {
        debug!("Frequency analysis not found");
        return;
    }

    let mut window = cur.until(TRANSLATION_MARKER);
    let n_atoms = record.last_atom_count();
    let mut modes: Vec<VibrationalMode> = Vec::new();

    while let Some(line) = window.next_line() {
        let Some(count) = block_header_count(line) else {
            continue;
        };

        let start = modes.len();
        for _ in 0..count {
            let mut mode = VibrationalMode::new(0.0);
            mode.reset_displacements(n_atoms);
            modes.push(mode);
        }
        parse_frequency_block(&mut window, &mut modes[start..], n_atoms);
    }

    if modes.is_empty() {
        return;
    }

    info!("Parsed {} vibrational modes", modes.len());
    record.modes = modes;
    record.has_frequencies = true;
}

/// 块首行只含模式编号，如 `1  2  3`
fn block_header_count(line: &str) -> Option<usize> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 3 {
        return None;
    }
    tokens
        .iter()
        .all(|t| t.parse::<usize>().map(|n| n >= 1).unwrap_or(false))
        .then_some(tokens.len())
}

fn parse_frequency_block(cur: &mut LineCursor, block: &mut [VibrationalMode], n_atoms: usize) {
    while let Some(line) = cur.peek() {
        if block_header_count(line).is_some() {
            return;
        }
        cur.next_line();

        let t = line.trim();
        if let Some(rest) = t.strip_prefix("Irreps") {
            for (mode, label) in block.iter_mut().zip(rest.split_whitespace()) {
                mode.symmetry = label.to_string();
            }
        } else if t.starts_with("Frequencies") {
            for (mode, v) in block.iter_mut().zip(numbers_in(t)) {
                mode.frequency = v;
            }
        } else if t.starts_with("Reduced masses") {
            for (mode, v) in block.iter_mut().zip(numbers_in(t)) {
                mode.reduced_mass = v;
            }
        } else if t.starts_with("Force constants") {
            for (mode, v) in block.iter_mut().zip(numbers_in(t)) {
                mode.force_constant = v;
            }
        } else if t.starts_with("IR intensities") {
            for (mode, v) in block.iter_mut().zip(numbers_in(t)) {
                mode.ir_intensity = v;
            }
        } else if t.contains("Atom") && t.contains("ZA") {
            for _ in 0..n_atoms {
                let Some(row) = cur.next_line() else { break };
                apply_displacement_row(row, block);
            }
            return;
        }
    }
}

/// `atom za  x y z  x y z ...`
fn apply_displacement_row(line: &str, block: &mut [VibrationalMode]) {
    let values = numbers_in(line);
    if values.len() < 2 || values[0] < 1.0 {
        return;
    }
    let atom = values[0] as usize - 1;

    for (k, mode) in block.iter_mut().enumerate() {
        let base = 2 + 3 * k;
        if let Some(xyz) = values.get(base..base + 3) {
            for (axis, &v) in xyz.iter().enumerate() {
                mode.set_displacement(atom, axis, v);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 热力学
// ─────────────────────────────────────────────────────────────

fn parse_thermochemistry(cur: &mut LineCursor, record: &mut ComputationRecord) {
    if cur.find(THERMO_MARKER).is_none() {
        debug!("Thermodynamic data not found");
        return;
    }

    let mut window = cur.until(THERMO_END_MARKER);
    let mut thermo = Thermochemistry::default();
    let mut conv = ThermoConvergence::default();
    let mut has_conv = false;

    while let Some(line) = window.next_line() {
        let t = line.trim();

        if t.contains("Electronic total energy") {
            thermo.electronic_energy = value_after_colon(t).or(thermo.electronic_energy);
        } else if t.contains("Temperature") && t.contains("Kelvin") {
            if let Some(pos) = t.find("Temperature") {
                thermo.temperature = extract_value_after_eq(&t[pos..]).or(thermo.temperature);
            }
            if let Some(pos) = t.find("Pressure") {
                thermo.pressure = extract_value_after_eq(&t[pos..]).or(thermo.pressure);
            }
        } else if t.contains("Zero-point Energy") {
            thermo.zero_point_energy = value_after_colon(t).or(thermo.zero_point_energy);
        } else if t.contains("Thermal correction to Energy") {
            thermo.thermal_energy_correction =
                value_after_colon(t).or(thermo.thermal_energy_correction);
        } else if t.contains("Thermal correction to Enthalpy") {
            thermo.thermal_enthalpy_correction =
                value_after_colon(t).or(thermo.thermal_enthalpy_correction);
        } else if t.contains("Thermal correction to Gibbs Free Energy") {
            thermo.thermal_gibbs_correction =
                value_after_colon(t).or(thermo.thermal_gibbs_correction);
        } else if let Some(value) = diagnostic_value(t) {
            let slot = if t.starts_with("Maximum Delta-X") {
                &mut conv.max_delta_x
            } else if t.starts_with("RMS Delta-X") {
                &mut conv.rms_delta_x
            } else if t.starts_with("Maximum Force") {
                &mut conv.max_force
            } else if t.starts_with("RMS Force") {
                &mut conv.rms_force
            } else {
                &mut conv.expected_delta_e
            };
            *slot = Some(value);
            has_conv = true;
        }
    }

    if has_conv {
        thermo.convergence = Some(conv);
    }

    debug!("Thermodynamic data: {:?}", thermo);
    record.thermo = Some(thermo);
}

fn value_after_colon(s: &str) -> Option<f64> {
    extract_number_after(s, ":")
}

/// 收敛诊断行 `Maximum Delta-X   0.000060   0.004000   Yes`
fn diagnostic_value(t: &str) -> Option<f64> {
    const LABELS: [&str; 5] = [
        "Maximum Delta-X",
        "RMS Delta-X",
        "Maximum Force",
        "RMS Force",
        "Expected Delta-E",
    ];

    let label = LABELS.iter().find(|l| t.starts_with(*l))?;
    let rest = &t[label.len()..];
    parse_fortran_float(rest.split_whitespace().next()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPT_LOG: &str = r#"
 Geometry Optimization step :    1
   Atom         Coord
     O      0.000000    0.000000    0.117790
     H      0.000000    0.755453   -0.471161
     H      0.000000   -0.755453   -0.471161
   State=   1  Energy=     -76.30000000
   Energy=     -76.31000000

                      Force-RMS    Force-Max     Step-RMS     Step-Max
    Conv. tolerance :  0.2000E-03   0.3000E-03   0.8000E-03   0.1200E-02
    Current values  :  0.5000E-03   0.9000E-03   0.2000E-02   0.4000E-02
    Geom. converge  :     No          No           No           No

 Geometry Optimization step :    2
   Atom         Coord

 Geometry Optimization step :    3
   Atom         Coord
     O      0.000000    0.000000    0.118000
     H      0.000000    0.756000   -0.472000
     H      0.000000   -0.756000   -0.472000
   State=   1  Energy=     -76.32000000
    Current values  :
       0.1000E-03   0.2000E-03   0.5000E-03   0.7000E-03

 Results of vibrations:
 Normal frequencies (cm^-1), reduced masses (AMU), force constants (mDyn/A), IR intensities (km/mol)

                                 1                        2                        3
         Irreps                 A1                       A1                       B2
     Frequencies           1650.1000                3800.2000                3900.3000
  Reduced masses              1.0800                   1.0400                   1.0800
 Force constants              1.7300                   8.8600                   9.7300
  IR intensities             70.1200                   2.5000                  45.0000
            Atom  ZA               X         Y         Z             X         Y         Z             X         Y         Z
               1   8          0.000     0.000     0.071         0.000     0.000    -0.049         0.000     0.068     0.000
               2   1          0.000     0.430    -0.561         0.000    -0.585     0.395         0.000    -0.543    -0.431
               3   1          0.000    -0.430    -0.561         0.000     0.585     0.395         0.000    -0.543     0.431

                                 4
         Irreps                 B1
     Frequencies           4000.0000
  Reduced masses              1.0000
 Force constants              9.9000
            Atom  ZA               X         Y         Z
               1   8          0.100     0.200     0.300
               2   1          0.400     0.500     0.600
               3   1          0.700     0.800     0.900

 Results of translations and rotations:

 Thermal Contributions to Energies
 #   1    Temperature =       298.15000 Kelvin         Pressure =         1.00000 Atm
   Electronic total energy   :      -76.320000    Hartree
   Zero-point Energy                          :            0.021179            13.29
   Thermal correction to Energy               :            0.024014            15.07
   Thermal correction to Enthalpy             :            0.024958            15.66
   Thermal correction to Gibbs Free Energy    :            0.003540             2.22
  Maximum Delta-X              0.000060      0.004000            Yes
  RMS Delta-X                  0.000030      0.002000            Yes
  Maximum Force                0.000010      0.000450            Yes
  RMS Force                    0.000005      0.000300            Yes
  Expected Delta-E             0.27D-08      0.10D-05            Yes
 UniMoVib job terminated normally
"#;

    fn parse(text: &str) -> ComputationRecord {
        let source = TextSource::from_string("water.out", text);
        BdfParser::new().parse(&source)
    }

    #[test]
    fn test_steps_energy_and_convergence() {
        let record = parse(OPT_LOG);

        assert!(record.has_optimization);
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[1].index, 3);

        assert!((record.steps[0].energy + 76.31).abs() < 1e-9);
        assert!((record.steps[0].convergence.max_force - 9.0e-4).abs() < 1e-12);
        assert!(!record.steps[0].converged);

        // 数值在下一行
        assert!((record.steps[1].energy + 76.32).abs() < 1e-9);
        assert!((record.steps[1].convergence.max_displacement - 7.0e-4).abs() < 1e-12);
        assert!(record.steps[1].converged);
    }

    #[test]
    fn test_vibration_blocks() {
        let record = parse(OPT_LOG);

        assert!(record.has_frequencies);
        assert_eq!(record.modes.len(), 4);
        assert_eq!(record.modes[2].symmetry, "B2");
        assert!((record.modes[1].frequency - 3800.2).abs() < 1e-9);
        assert!((record.modes[0].reduced_mass - 1.08).abs() < 1e-12);
        assert!((record.modes[2].ir_intensity - 45.0).abs() < 1e-12);
        assert!((record.modes[1].displacements[2][1] - 0.585).abs() < 1e-12);

        // 第二块没有 IR intensities 行
        assert_eq!(record.modes[3].ir_intensity, 0.0);
        assert_eq!(record.modes[3].displacements[2], [0.7, 0.8, 0.9]);
    }

    #[test]
    fn test_thermochemistry_and_diagnostics() {
        let record = parse(OPT_LOG);
        let thermo = record.thermo.expect("thermo present");

        assert_eq!(thermo.temperature, Some(298.15));
        assert_eq!(thermo.pressure, Some(1.0));
        assert_eq!(thermo.electronic_energy, Some(-76.32));
        assert_eq!(thermo.zero_point_energy, Some(0.021179));
        assert_eq!(thermo.thermal_enthalpy_correction, Some(0.024958));
        assert_eq!(thermo.thermal_gibbs_correction, Some(0.00354));

        let conv = thermo.convergence.expect("diagnostics present");
        assert_eq!(conv.max_delta_x, Some(0.00006));
        assert_eq!(conv.rms_force, Some(0.000005));
        assert!((conv.expected_delta_e.unwrap() - 0.27e-8).abs() < 1e-20);
    }

    #[test]
    fn test_single_point() {
        let text = r#"
   Atom         Coord
     N      0.000000    0.000000    0.000000
     N      0.000000    0.000000    1.100000

   E_tot =     -109.50000000
"#;
        let record = parse(text);

        assert!(!record.has_optimization);
        assert_eq!(record.steps.len(), 1);
        assert!(record.steps[0].converged);
        assert!((record.steps[0].energy + 109.5).abs() < 1e-9);
        assert!(record.modes.is_empty());
        assert!(record.thermo.is_none());
    }

    #[test]
    fn test_header_only_has_no_geometry() {
        let record = parse(" BDF program\n Geometry Optimization step :    1\n");
        assert!(!record.is_usable());
    }
}
