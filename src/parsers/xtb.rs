//! # xtb / Gaussian 格式日志解析器
//!
//! xtb 以 Gaussian 的版式输出结果（`g98.out`、作为 Gaussian External
//! 程序运行时的日志），因此本解析器按 Gaussian 日志的标记读取：
//! - `Standard orientation:`（无则退回 `Input orientation:`）坐标表
//! - `SCF Done:` / `Recovered energy=` 能量
//! - `Maximum Force` 等四行收敛表
//! - `Charge = c Multiplicity = m`
//! - `Harmonic frequencies` 振动块与 `- Thermochemistry -` 热力学
//!
//! 本程序自身生成的文件也能被它重新读回。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 分派
//! - 使用 `parsers/cursor.rs`, `models/`

use super::cursor::{LineCursor, TextSource};
use super::{extract_number_after, extract_value_after_eq, is_dash_line, numbers_in, parse_fortran_float};
use crate::models::{
    Atom, ComputationRecord, ConvergenceMetrics, OptimizationStep, Thermochemistry,
    VibrationalMode,
};
use tracing::{debug, info};

const STANDARD_ORIENTATION: &str = "Standard orientation:";
const INPUT_ORIENTATION: &str = "Input orientation:";
const SCF_DONE: &str = "SCF Done:";
const RECOVERED_ENERGY: &str = "Recovered energy=";
const FREQUENCY_BANNER: &str = "Harmonic frequencies";
const THERMO_BANNER: &str = "- Thermochemistry -";

pub const KEYWORDS: &[&str] = &[
    STANDARD_ORIENTATION,
    INPUT_ORIENTATION,
    SCF_DONE,
    RECOVERED_ENERGY,
    FREQUENCY_BANNER,
    THERMO_BANNER,
];

/// xtb / Gaussian 格式解析器
#[derive(Debug, Default)]
pub struct XtbParser;

impl XtbParser {
    pub fn new() -> Self {
        XtbParser
    }

    pub fn parse(&mut self, source: &TextSource) -> ComputationRecord {
        let mut record = ComputationRecord::new();
        let mut cur = source.cursor();

        let marker = if cur.find(STANDARD_ORIENTATION).is_some() {
            STANDARD_ORIENTATION
        } else {
            debug!("No standard orientation, falling back to input orientation");
            INPUT_ORIENTATION
        };

        cur.reset();
        parse_charge_spin(&mut cur, &mut record);

        cur.reset();
        let found_table = parse_steps(&mut cur, &mut record, marker);
        record.has_optimization = record.steps.len() > 1 || found_table;
        if !record.has_optimization {
            if let Some(step) = record.steps.first_mut() {
                step.converged = true;
            }
        }
        info!("Parsed {} geometries", record.steps.len());

        cur.reset();
        parse_frequencies(&mut cur, &mut record);

        cur.reset();
        parse_thermochemistry(&mut cur, &mut record);

        record
    }
}

// ─────────────────────────────────────────────────────────────
// 电荷与多重度
// ─────────────────────────────────────────────────────────────

fn parse_charge_spin(cur: &mut LineCursor, record: &mut ComputationRecord) {
    while let Some(line) = cur.find("Multiplicity =") {
        let charge = extract_number_after(line, "Charge =");
        let mult = extract_number_after(line, "Multiplicity =");
        if let (Some(c), Some(m)) = (charge, mult) {
            record.set_charge_spin(c as i32, m as i32);
            debug!("Charge = {} Multiplicity = {}", c, m);
            return;
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 构型 / 能量 / 收敛
// ─────────────────────────────────────────────────────────────

/// 返回是否见到过收敛表
fn parse_steps(cur: &mut LineCursor, record: &mut ComputationRecord, marker: &str) -> bool {
    let mut found_table = false;
    let mut index = 0;

    while cur.find(marker).is_some() {
        index += 1;
        let window = cur.until(marker);

        let mut step = OptimizationStep::new(index);
        let mut geo = window;
        step.atoms = read_orientation(&mut geo);
        step.energy = last_energy(window).unwrap_or(0.0);

        if let Some(metrics) = parse_convergence_table(window) {
            step.set_convergence(metrics);
            found_table = true;
        }

        if !record.push_step(step, None) {
            debug!("Orientation block {} is empty, skipped", index);
        }
    }

    found_table
}

/// 坐标表：两条分隔线之后到第三条分隔线为止
fn read_orientation(cur: &mut LineCursor) -> Vec<Atom> {
    let mut atoms = Vec::new();
    let mut dashes = 0;

    while let Some(line) = cur.next_line() {
        if is_dash_line(line) {
            dashes += 1;
            if dashes == 3 {
                break;
            }
            continue;
        }
        if dashes < 2 {
            continue;
        }

        // center Z [type] x y z
        let values = numbers_in(line);
        let (z, xyz) = match values.len() {
            6 => (values[1], &values[3..6]),
            5 => (values[1], &values[2..5]),
            _ => break,
        };
        atoms.push(Atom::from_atomic_number(z as u32, [xyz[0], xyz[1], xyz[2]]));
    }

    atoms
}

fn last_energy(mut window: LineCursor) -> Option<f64> {
    let mut energy = None;

    while let Some(line) = window.next_line() {
        if line.contains(SCF_DONE) {
            energy = extract_value_after_eq(line).or(energy);
        } else if line.contains(RECOVERED_ENERGY) {
            energy = extract_number_after(line, RECOVERED_ENERGY).or(energy);
        }
    }

    energy
}

fn parse_convergence_table(mut window: LineCursor) -> Option<ConvergenceMetrics> {
    let mut metrics = ConvergenceMetrics::default();
    let mut found = 0;

    while let Some(line) = window.next_line() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        let Some(value) = parse_fortran_float(tokens[2]) else {
            continue;
        };

        match (tokens[0], tokens[1]) {
            ("Maximum", "Force") => metrics.max_force = value,
            ("RMS", "Force") => metrics.rms_force = value,
            ("Maximum", "Displacement") => metrics.max_displacement = value,
            ("RMS", "Displacement") => metrics.rms_displacement = value,
            _ => continue,
        }
        found += 1;
    }

    (found > 0).then_some(metrics)
}

// ─────────────────────────────────────────────────────────────
// 振动分析
// ─────────────────────────────────────────────────────────────

fn parse_frequencies(cur: &mut LineCursor, record: &mut ComputationRecord) {
    if cur.find(FREQUENCY_BANNER).is_none() {
        debug!("Frequency analysis not found");
        return;
    }

    let mut window = cur.until(THERMO_BANNER);
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

/// 块首行只含模式编号
fn block_header_count(line: &str) -> Option<usize> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 5 {
        return None;
    }
    tokens
        .iter()
        .all(|t| t.parse::<usize>().map(|n| n >= 1).unwrap_or(false))
        .then_some(tokens.len())
}

fn parse_frequency_block(cur: &mut LineCursor, block: &mut [VibrationalMode], n_atoms: usize) {
    let mut labeled = false;

    while let Some(line) = cur.peek() {
        if block_header_count(line).is_some() {
            return;
        }
        cur.next_line();

        if let Some((label, rest)) = line.split_once("--") {
            let values = numbers_in(rest);
            for (mode, v) in block.iter_mut().zip(values) {
                match label.trim() {
                    "Frequencies" => mode.frequency = v,
                    "Red. masses" => mode.reduced_mass = v,
                    "Frc consts" => mode.force_constant = v,
                    "IR Inten" => mode.ir_intensity = v,
                    _ => {}
                }
            }
            labeled = true;
        } else if line.contains("Atom") && line.contains("AN") {
            for _ in 0..n_atoms {
                let Some(row) = cur.next_line() else { break };
                apply_displacement_row(row, block);
            }
            return;
        } else if !labeled {
            let labels: Vec<&str> = line.split_whitespace().collect();
            if labels.len() == block.len() {
                for (mode, label) in block.iter_mut().zip(labels) {
                    mode.symmetry = label.to_string();
                }
            }
        }
    }
}

/// `atom AN  x y z  x y z ...`
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
    if cur.find(THERMO_BANNER).is_none() {
        debug!("Thermochemistry not found");
        return;
    }

    let mut thermo = Thermochemistry::default();
    let mut zpe_sum = None;

    while let Some(line) = cur.next_line() {
        let t = line.trim();

        if t.starts_with("Temperature") && t.contains("Kelvin") {
            thermo.temperature = extract_number_after(t, "Temperature").or(thermo.temperature);
            thermo.pressure = extract_number_after(t, "Pressure").or(thermo.pressure);
        } else if t.starts_with("Zero-point correction=") {
            thermo.zero_point_energy = extract_value_after_eq(t);
        } else if t.starts_with("Thermal correction to Energy=") {
            thermo.thermal_energy_correction = extract_value_after_eq(t);
        } else if t.starts_with("Thermal correction to Enthalpy=") {
            thermo.thermal_enthalpy_correction = extract_value_after_eq(t);
        } else if t.starts_with("Thermal correction to Gibbs Free Energy=") {
            thermo.thermal_gibbs_correction = extract_value_after_eq(t);
        } else if t.starts_with("Electronic energy (EE)=") {
            thermo.electronic_energy = extract_value_after_eq(t);
        } else if t.starts_with("Sum of electronic and zero-point Energies=") {
            zpe_sum = extract_value_after_eq(t);
        }
    }

    if thermo.electronic_energy.is_none() {
        if let (Some(sum), Some(zpe)) = (zpe_sum, thermo.zero_point_energy) {
            thermo.electronic_energy = Some(sum - zpe);
        }
    }

    if thermo.has_thermal_data() {
        record.thermo = Some(thermo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G98_LOG: &str = r#"
 Charge =  0 Multiplicity = 1
                         Standard orientation:
 ---------------------------------------------------------------------
 Center     Atomic      Atomic             Coordinates (Angstroms)
 Number     Number       Type             X           Y           Z
 ---------------------------------------------------------------------
      1          8           0        0.000000    0.000000    0.117790
      2          1           0        0.000000    0.755453   -0.471161
      3          1           0        0.000000   -0.755453   -0.471161
 ---------------------------------------------------------------------
 SCF Done:  E(RB3LYP) =  -76.4000000000     A.U. after   10 cycles
 SCF Done:  E(RB3LYP) =  -76.4100000000     A.U. after    5 cycles
         Item               Value     Threshold  Converged?
 Maximum Force            0.000800     0.000450     NO
 RMS     Force            0.000500     0.000300     NO
 Maximum Displacement     0.003000     0.001800     NO
 RMS     Displacement     0.002000     0.001200     NO
                         Standard orientation:
 ---------------------------------------------------------------------
 Center     Atomic      Atomic             Coordinates (Angstroms)
 Number     Number       Type             X           Y           Z
 ---------------------------------------------------------------------
 ---------------------------------------------------------------------
                         Standard orientation:
 ---------------------------------------------------------------------
 Center     Atomic      Atomic             Coordinates (Angstroms)
 Number     Number       Type             X           Y           Z
 ---------------------------------------------------------------------
      1          8           0        0.000000    0.000000    0.118000
      2          1           0        0.000000    0.756000   -0.472000
      3          1           0        0.000000   -0.756000   -0.472000
 ---------------------------------------------------------------------
 Recovered energy=  -76.4200000000
 Maximum Force            0.000010     0.000450     YES
 RMS     Force            0.000005     0.000300     YES
 Maximum Displacement     0.000100     0.001800     YES
 RMS     Displacement     0.000050     0.001200     YES

 Harmonic frequencies (cm**-1), IR intensities (km/mol),
 Raman scattering activities (A**4/amu), Raman depolarization ratios,
 reduced masses (AMU), force constants (mDyne/A) and normal coordinates:
                     1                      2                      3
                     a                      a                      a
 Frequencies --  1569.7590              3640.7137              3727.0568
 Red. masses --     2.0000                 2.0000                 2.0000
 Frc consts  --     0.0000                 0.0000                 0.0000
 IR Inten    --    88.6282                 7.6898                39.6244
 Raman Activ --     0.0000                 0.0000                 0.0000
 Atom AN      X      Y      Z        X      Y      Z        X      Y      Z
   1   8    -0.00  -0.00  -0.07    -0.00   0.00  -0.05     0.00   0.07   0.00
   2   1     0.00  -0.43   0.56     0.00   0.58   0.40    -0.00  -0.56  -0.43
   3   1    -0.00   0.43   0.56    -0.00  -0.58   0.40    -0.00  -0.56   0.43

 -------------------
 - Thermochemistry -
 -------------------
 Temperature   298.150 Kelvin.  Pressure   1.00000 Atm.
 Zero-point correction=                           0.021234 (Hartree/Particle)
 Thermal correction to Energy=                    0.024070
 Thermal correction to Enthalpy=                  0.025014
 Thermal correction to Gibbs Free Energy=         0.003580
 Sum of electronic and zero-point Energies=            -76.398766
"#;

    fn parse(text: &str) -> ComputationRecord {
        let source = TextSource::from_string("g98.out", text);
        XtbParser::new().parse(&source)
    }

    #[test]
    fn test_orientation_steps() {
        let record = parse(G98_LOG);

        assert!(record.has_optimization);
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[0].atoms[0].symbol(), "O");
        assert_eq!(record.steps[1].atoms[2].position(), [0.0, -0.756, -0.472]);

        assert!((record.steps[0].energy + 76.41).abs() < 1e-9);
        assert!(!record.steps[0].converged);
        assert!((record.steps[1].energy + 76.42).abs() < 1e-9);
        assert!(record.steps[1].converged);
    }

    #[test]
    fn test_charge_multiplicity() {
        let record = parse(G98_LOG);
        assert!(record.has_charge_spin());
        assert_eq!(record.charge_spin().multiplicity, 1);

        let text = G98_LOG.replace("Charge =  0 Multiplicity = 1", "Charge = -1 Multiplicity = 2");
        let record = parse(&text);
        assert_eq!(record.charge_spin().charge, -1);
        assert_eq!(record.charge_spin().multiplicity, 2);
    }

    #[test]
    fn test_gaussian_frequency_block() {
        let record = parse(G98_LOG);

        assert!(record.has_frequencies);
        assert_eq!(record.modes.len(), 3);
        assert_eq!(record.modes[0].symmetry, "a");
        assert!((record.modes[2].frequency - 3727.0568).abs() < 1e-9);
        assert!((record.modes[0].ir_intensity - 88.6282).abs() < 1e-9);
        assert!((record.modes[1].reduced_mass - 2.0).abs() < 1e-12);
        assert_eq!(record.modes[1].displacements[1], [0.0, 0.58, 0.40]);
    }

    #[test]
    fn test_thermochemistry() {
        let record = parse(G98_LOG);
        let thermo = record.thermo.expect("thermo present");

        assert_eq!(thermo.temperature, Some(298.15));
        assert_eq!(thermo.pressure, Some(1.0));
        assert_eq!(thermo.thermal_energy_correction, Some(0.02407));
        assert!((thermo.electronic_energy.unwrap() + 76.42).abs() < 1e-9);
    }

    #[test]
    fn test_input_orientation_single_point() {
        let text = r#"
                          Input orientation:
 ---------------------------------------------------------------------
 Center     Atomic      Atomic             Coordinates (Angstroms)
 Number     Number       Type             X           Y           Z
 ---------------------------------------------------------------------
      1          1           0        0.000000    0.000000    0.000000
      2          1           0        0.000000    0.000000    0.740000
 ---------------------------------------------------------------------
 SCF Done:  E(RHF) =  -1.1300000000     A.U. after    3 cycles
"#;
        let record = parse(text);

        assert!(!record.has_optimization);
        assert_eq!(record.steps.len(), 1);
        assert!(record.steps[0].converged);
        assert!(!record.has_charge_spin());
        assert!(record.modes.is_empty());
    }

    #[test]
    fn test_header_only_has_no_geometry() {
        let record = parse(" xtb version 6.7.0\n");
        assert!(!record.is_usable());
    }
}
