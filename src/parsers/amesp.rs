//! # AMESP 输出解析器
//!
//! 解析 AMESP 的 `.aop` 输出文件，提取：
//! - 几何优化各步的构型、能量与收敛表（或单点计算）
//! - 谐振频率、红外强度与简正模式
//! - 热力学量
//! - TDDFT 激发态（含优化所跟踪的激发态）
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 分派
//! - 使用 `parsers/cursor.rs`, `models/`

use super::cursor::{LineCursor, TextSource};
use super::{extract_number_after, extract_value_after_eq, is_dash_line, parse_fortran_float};
use crate::models::element::normalize_symbol;
use crate::models::{
    Atom, ComputationRecord, ConvergenceMetrics, ExcitedState, OptimizationStep,
    OrbitalTransition, Spin, TddftBlock, Thermochemistry, TransitionDirection, VibrationalMode,
};
use tracing::{debug, info};

const STEP_MARKER: &str = "Geom Opt Step:";
const GEOMETRY_MARKER: &str = "Current Geometry(angstroms):";
const CONVERGENCE_MARKER: &str = "Geometry Convergence:";
const CONVERGENCE_HEADER: &str = "Converged?";
const FREQUENCY_BANNER: &str = "========================== Frequency ===========================";
const HARMONIC_MARKER: &str = "Harmonic frequencies(cm-1):";
const IR_MARKER: &str = "IR spectrum (T^2,KM/Mole)";
const NORMAL_MODES_MARKER: &str = "Normal Modes:";
const TDDFT_BANNER: &str = "Excitation energies and oscillator strengths:";
const EXCITATION_TAG: &str = "E[Eexc]";
const DFT_TAG: &str = "E[DFT]";

/// 简正模式表每块最多列数
const MODES_PER_BLOCK: usize = 5;

/// 跟踪激发态时总能量与 E[Eexc] 的容差 (Hartree)
pub const TRACKING_TOLERANCE: f64 = 1.0e-5;

pub const KEYWORDS: &[&str] = &[
    STEP_MARKER,
    GEOMETRY_MARKER,
    CONVERGENCE_MARKER,
    HARMONIC_MARKER,
    NORMAL_MODES_MARKER,
    TDDFT_BANNER,
];

/// AMESP 解析器
#[derive(Debug, Default)]
pub struct AmespParser;

impl AmespParser {
    pub fn new() -> Self {
        AmespParser
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
            parse_single_point(cur, &mut record);
        }

        cur.reset();
        parse_frequencies(&mut cur, &mut record);

        cur.reset();
        parse_thermochemistry(&mut cur, &mut record);

        debug!("AMESP parsing finished: {} steps", record.steps.len());
        record
    }
}

// ─────────────────────────────────────────────────────────────
// 几何优化 / 单点
// ─────────────────────────────────────────────────────────────

fn parse_optimization_steps(cur: &mut LineCursor, record: &mut ComputationRecord) {
    while let Some(line) = cur.find(STEP_MARKER) {
        let index = extract_number_after(line, STEP_MARKER)
            .map(|v| v as usize)
            .unwrap_or(record.steps.len() + 1);

        let window = cur.until(STEP_MARKER);
        let (mut step, tddft) = parse_step_window(window, index);

        let mut conv = window;
        if let Some(metrics) = parse_convergence(&mut conv) {
            step.set_convergence(metrics);
        }

        let n_atoms = step.atom_count();
        if record.push_step(step, tddft) {
            debug!("Added step {} with {} atoms", index, n_atoms);
        } else {
            debug!("Step {} has no geometry, skipped", index);
        }
    }

    info!("Total optimization steps: {}", record.steps.len());
}

fn parse_single_point(window: LineCursor, record: &mut ComputationRecord) {
    let (mut step, tddft) = parse_step_window(window, 1);
    step.converged = true;
    record.push_step(step, tddft);
}

/// 在一个步骤窗口内读取构型、能量与激发态
fn parse_step_window(window: LineCursor, index: usize) -> (OptimizationStep, Option<TddftBlock>) {
    let mut step = OptimizationStep::new(index);

    let mut geo = window;
    if geo.find(GEOMETRY_MARKER).is_some() {
        geo.skip(1);
        step.atoms = read_atoms(&mut geo);
    }

    let (excitation, dft) = last_energy_tags(window);
    step.energy = excitation.or(dft).unwrap_or(0.0);
    if let Some(e) = excitation {
        debug!("Step {}: using {} = {:.9}", index, EXCITATION_TAG, e);
    }

    let tddft = parse_tddft(window, excitation);
    (step, tddft)
}

fn read_atoms(cur: &mut LineCursor) -> Vec<Atom> {
    let mut atoms = Vec::new();

    while let Some(line) = cur.next_line() {
        let t = line.trim();
        if t.is_empty() || is_dash_line(t) {
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

/// 窗口内最后一个 E[Eexc] 与最后一个 E[DFT]
fn last_energy_tags(mut window: LineCursor) -> (Option<f64>, Option<f64>) {
    let mut excitation = None;
    let mut dft = None;

    while let Some(line) = window.next_line() {
        if line.contains(EXCITATION_TAG) {
            if let Some(v) = extract_value_after_eq(line) {
                excitation = Some(v);
            }
        } else if line.contains(DFT_TAG) {
            if let Some(v) = extract_value_after_eq(line) {
                dft = Some(v);
            }
        }
    }

    (excitation, dft)
}

fn parse_convergence(cur: &mut LineCursor) -> Option<ConvergenceMetrics> {
    cur.find(CONVERGENCE_MARKER)?;
    cur.find(CONVERGENCE_HEADER)?;

    let mut metrics = ConvergenceMetrics::default();
    let mut found = 0;

    for _ in 0..6 {
        let Some(line) = cur.next_line() else { break };
        if is_dash_line(line) {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        let Some(value) = parse_fortran_float(tokens[2]) else {
            continue;
        };

        match (tokens[0], tokens[1]) {
            ("RMS", "Force") => metrics.rms_force = value,
            ("Max", "Force") => metrics.max_force = value,
            ("RMS", "Step") => metrics.rms_displacement = value,
            ("Max", "Step") => metrics.max_displacement = value,
            _ => continue,
        }

        found += 1;
        if found == 4 {
            break;
        }
    }

    (found > 0).then_some(metrics)
}

// ─────────────────────────────────────────────────────────────
// TDDFT 激发态
// ─────────────────────────────────────────────────────────────

fn parse_tddft(mut cur: LineCursor, reference: Option<f64>) -> Option<TddftBlock> {
    cur.find(TDDFT_BANNER)?;

    let mut block = TddftBlock::default();
    let mut current: Option<ExcitedState> = None;

    while let Some(line) = cur.next_line() {
        let t = line.trim();

        if t.starts_with("Excited State") {
            if let Some(state) = current.take() {
                block.states.push(state);
            }
            current = parse_state_header(t);
            continue;
        }

        let Some(state) = current.as_mut() else {
            continue;
        };

        if let Some(transition) = parse_transition(t) {
            state.transitions.push(transition);
        } else if t.starts_with("Total Energy") {
            let total = t
                .rsplit('=')
                .next()
                .and_then(|s| s.split_whitespace().next())
                .and_then(parse_fortran_float);
            state.total_energy = total;
            state.tracked = matches!(
                (total, reference),
                (Some(e), Some(r)) if (e - r).abs() < TRACKING_TOLERANCE
            );
            if let Some(done) = current.take() {
                block.states.push(done);
            }
        } else if t.is_empty() || t.contains("This state for optimization") {
            continue;
        } else if state.annotation.is_none() {
            state.annotation = Some(t.to_string());
        } else {
            // 连续两行无法识别的文本视为激发态块已结束
            break;
        }
    }

    if let Some(state) = current {
        block.states.push(state);
    }

    if block.is_present() {
        debug!("Parsed {} excited states", block.states.len());
        Some(block)
    } else {
        None
    }
}

/// `Excited State   1:   Singlet-A    4.1234 eV  300.68 nm  f=0.0123  <S**2>=0.000`
fn parse_state_header(line: &str) -> Option<ExcitedState> {
    let rest = line.strip_prefix("Excited State")?;
    let (index, body) = rest.split_once(':')?;
    let index: usize = index.trim().parse().ok()?;

    let mut state = ExcitedState::new(index);
    let tokens: Vec<&str> = body.split_whitespace().collect();

    if let Some(label) = tokens.first() {
        if parse_fortran_float(label).is_none() {
            state.symmetry = label.to_string();
        }
    }

    for pair in tokens.windows(2) {
        match pair[1] {
            "eV" => state.energy_ev = parse_fortran_float(pair[0]).unwrap_or(0.0),
            "nm" => state.wavelength_nm = parse_fortran_float(pair[0]).unwrap_or(0.0),
            _ => {}
        }
    }

    for token in &tokens {
        if let Some(v) = token.strip_prefix("f=") {
            state.oscillator_strength = parse_fortran_float(v).unwrap_or(0.0);
        } else if let Some(v) = token.strip_prefix("<S**2>=") {
            state.spin_contamination = parse_fortran_float(v).unwrap_or(0.0);
        }
    }

    Some(state)
}

/// `5 -> 6  0.70123`、`5B <- 7B  -0.1021`
fn parse_transition(line: &str) -> Option<OrbitalTransition> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 4 {
        return None;
    }

    let direction = match tokens[1] {
        "->" => TransitionDirection::Forward,
        "<-" => TransitionDirection::Backward,
        _ => return None,
    };

    let (from, spin) = parse_orbital(tokens[0])?;
    let (to, _) = parse_orbital(tokens[2])?;
    let coefficient = parse_fortran_float(tokens[3])?;

    Some(OrbitalTransition {
        from,
        to,
        coefficient,
        spin,
        direction,
    })
}

fn parse_orbital(token: &str) -> Option<(u32, Spin)> {
    let (digits, spin) = match token.strip_suffix('B') {
        Some(d) => (d, Spin::Beta),
        None => (token.strip_suffix('A').unwrap_or(token), Spin::Alpha),
    };
    Some((digits.parse().ok()?, spin))
}

// ─────────────────────────────────────────────────────────────
// 频率
// ─────────────────────────────────────────────────────────────

fn parse_frequencies(cur: &mut LineCursor, record: &mut ComputationRecord) {
    if cur.find(FREQUENCY_BANNER).is_none() {
        debug!("Frequency analysis not found");
        return;
    }
    if cur.find(HARMONIC_MARKER).is_none() {
        return;
    }
    cur.skip(1);

    let mut modes: Vec<VibrationalMode> = Vec::new();
    while let Some(line) = cur.next_line() {
        let t = line.trim();
        if t.is_empty() || t.contains("Zero-point") {
            break;
        }
        let tokens: Vec<&str> = t.split_whitespace().collect();
        if tokens.len() >= 2 && tokens[0].parse::<usize>().is_ok() {
            if let Some(freq) = parse_fortran_float(tokens[1]) {
                modes.push(VibrationalMode::new(freq));
            }
        }
    }

    if modes.is_empty() {
        return;
    }
    debug!("Parsed {} frequencies", modes.len());

    if cur.find(IR_MARKER).is_some() {
        cur.skip(2);
        for mode in modes.iter_mut() {
            let Some(line) = cur.next_line() else { break };
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() >= 3 {
                mode.ir_intensity = parse_fortran_float(tokens[2]).unwrap_or(0.0);
            }
        }
    } else {
        debug!("IR spectrum not found, intensities set to zero");
    }

    cur.reset();
    parse_normal_modes(cur, &mut modes, record.last_atom_count());

    info!("Frequency parsing completed: {} modes", modes.len());
    record.modes = modes;
    record.has_frequencies = true;
}

fn parse_normal_modes(cur: &mut LineCursor, modes: &mut [VibrationalMode], n_atoms: usize) {
    if cur.find(NORMAL_MODES_MARKER).is_none() {
        debug!("Normal Modes section not found");
        return;
    }
    if n_atoms == 0 {
        return;
    }

    for mode in modes.iter_mut() {
        mode.reset_displacements(n_atoms);
    }

    let mut start = 0;
    while start < modes.len() && !cur.is_eof() {
        let width = MODES_PER_BLOCK.min(modes.len() - start);
        let mut rows = 0;

        while let Some(line) = cur.next_line() {
            match parse_mode_row(line) {
                Some((atom, axis, values)) => {
                    for (k, value) in values.into_iter().take(width).enumerate() {
                        modes[start + k].set_displacement(atom, axis, value);
                    }
                    rows += 1;
                    if rows == n_atoms * 3 {
                        break;
                    }
                }
                None if rows > 0 => break,
                None => {}
            }
        }

        start += width;
    }
}

/// `idx atom X|Y|Z d1 .. d5`，返回 (原子下标, 分量, 位移)
fn parse_mode_row(line: &str) -> Option<(usize, usize, Vec<f64>)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    tokens[0].parse::<usize>().ok()?;
    let atom = tokens[1].parse::<usize>().ok()?.checked_sub(1)?;
    let axis = match tokens[2] {
        "X" | "x" => 0,
        "Y" | "y" => 1,
        "Z" | "z" => 2,
        _ => return None,
    };
    let values = tokens[3..].iter().filter_map(|s| parse_fortran_float(s)).collect();
    Some((atom, axis, values))
}

// ─────────────────────────────────────────────────────────────
// 热力学
// ─────────────────────────────────────────────────────────────

fn parse_thermochemistry(cur: &mut LineCursor, record: &mut ComputationRecord) {
    let mut thermo = Thermochemistry::default();

    while let Some(line) = cur.next_line() {
        let t = line.trim();

        if t.contains("Temperature:") {
            thermo.temperature = extract_number_after(t, "Temperature:").or(thermo.temperature);
        } else if t.contains("Pressure:") {
            thermo.pressure = extract_number_after(t, "Pressure:").or(thermo.pressure);
        } else if t.contains("Zero-point vibrational energy:") {
            thermo.zero_point_energy = extract_number_after(t, "energy:").or(thermo.zero_point_energy);
        } else if t.contains("Thermal correction to U(T):") {
            thermo.thermal_energy_correction =
                extract_number_after(t, "U(T):").or(thermo.thermal_energy_correction);
        } else if t.contains("Thermal correction to H(T):") {
            thermo.thermal_enthalpy_correction =
                extract_number_after(t, "H(T):").or(thermo.thermal_enthalpy_correction);
        } else if t.contains("Thermal correction to G(T):") {
            thermo.thermal_gibbs_correction =
                extract_number_after(t, "G(T):").or(thermo.thermal_gibbs_correction);
        } else if t.contains("Final Energy:") {
            thermo.electronic_energy = extract_number_after(t, "Final Energy:").or(thermo.electronic_energy);
        }
    }

    if thermo.has_thermal_data() {
        debug!("Thermodynamic data: {:?}", thermo);
        record.thermo = Some(thermo);
    } else {
        debug!("No thermodynamic data found");
    }
}
