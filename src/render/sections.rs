//! # Gaussian 输出各段落
//!
//! 每个函数向字符串追加一段固定版式的文本。
//! 列宽与 Gaussian 16 的日志保持一致，GaussView 等工具依赖这些列宽。

use super::RenderOptions;
use crate::models::structure::{
    MAX_DISPLACEMENT_THRESHOLD, MAX_FORCE_THRESHOLD, RMS_DISPLACEMENT_THRESHOLD,
    RMS_FORCE_THRESHOLD,
};
use crate::models::{
    Atom, ComputationRecord, ExcitedState, OptimizationStep, Spin, TddftBlock, Thermochemistry,
    VibrationalMode,
};

const DASHES: &str =
    " ---------------------------------------------------------------------";
const STARS: &str = " ******************************************";

pub const FOOTER: &str = " Normal termination of Gaussian 16.";

// ─────────────────────────────────────────────────────────────
// 文件头
// ─────────────────────────────────────────────────────────────

pub fn header(out: &mut String, record: &ComputationRecord, opts: &RenderOptions) {
    out.push_str(" Entering Gaussian System, Link 0=g16\n");
    if let Some(name) = &opts.input_name {
        out.push_str(&format!(" Input={}\n", name));
    }
    out.push_str(STARS);
    out.push('\n');
    out.push_str(&format!(
        " Gaussian 16:  {} {} (Gaussian-format log)\n",
        opts.program, opts.version
    ));
    out.push_str(&format!(" {}\n", opts.author));
    if let Some(dialect) = opts.source {
        out.push_str(&format!(" Converted from {} output\n", dialect));
    }
    out.push_str(STARS);
    out.push('\n');

    let route = route_line(record);
    let rule = format!(" {}", "-".repeat(route.len() + 1));
    out.push_str(&format!("{}\n #p {}\n{}\n\n", rule, route, rule));

    let cs = record.charge_spin();
    out.push_str(" Symbolic Z-matrix:\n");
    out.push_str(&format!(
        " Charge = {:>2} Multiplicity = {}\n",
        cs.charge, cs.multiplicity
    ));
    if let Some(first) = record.steps.first() {
        for atom in &first.atoms {
            let p = atom.position();
            out.push_str(&format!(
                " {:<2}{:>22.8}{:>14.8}{:>14.8}\n",
                atom.symbol(),
                p[0],
                p[1],
                p[2]
            ));
        }
    }
    out.push('\n');
}

fn route_line(record: &ComputationRecord) -> String {
    let mut keywords = Vec::new();
    if record.has_optimization {
        keywords.push("opt");
    }
    if !record.modes.is_empty() {
        keywords.push("freq");
    }
    if record.tddft.iter().any(|b| b.is_present()) {
        keywords.push("td");
    }
    if keywords.is_empty() {
        keywords.push("sp");
    }
    keywords.join(" ")
}

// ─────────────────────────────────────────────────────────────
// 优化步骤
// ─────────────────────────────────────────────────────────────

pub fn step(
    out: &mut String,
    record: &ComputationRecord,
    position: usize,
    opts: &RenderOptions,
) {
    let step = &record.steps[position];
    let is_last = position + 1 == record.steps.len();

    if record.has_optimization {
        out.push_str(&format!(
            " Step number {:>3} out of a maximum of {:>4}\n",
            position + 1,
            record.steps.len()
        ));
    }

    orientation(out, step);

    out.push_str(&format!(
        " SCF Done:  E({}) = {:>18.9}     A.U. after    1 cycles\n",
        opts.method_label(),
        step.energy
    ));

    if let Some(block) = record.tddft_for(position) {
        excited_states(out, block);
    }

    if record.has_optimization {
        convergence_table(out, step);
        if is_last && step.converged {
            out.push_str(" Optimization completed.\n");
            out.push_str("    -- Stationary point found.\n");
        }
    }

    out.push('\n');
}

fn orientation(out: &mut String, step: &OptimizationStep) {
    out.push_str("                         Standard orientation:\n");
    out.push_str(DASHES);
    out.push('\n');
    out.push_str(" Center     Atomic      Atomic             Coordinates (Angstroms)\n");
    out.push_str(" Number     Number       Type             X           Y           Z\n");
    out.push_str(DASHES);
    out.push('\n');

    for (i, atom) in step.atoms.iter().enumerate() {
        let p = atom.position();
        out.push_str(&format!(
            "{:>7}{:>11}{:>12}{:>16.6}{:>12.6}{:>12.6}\n",
            i + 1,
            atom.atomic_number(),
            0,
            p[0],
            p[1],
            p[2]
        ));
    }

    out.push_str(DASHES);
    out.push('\n');
}

fn convergence_table(out: &mut String, step: &OptimizationStep) {
    let c = &step.convergence;
    let rows = [
        ("Maximum Force", c.max_force, MAX_FORCE_THRESHOLD),
        ("RMS     Force", c.rms_force, RMS_FORCE_THRESHOLD),
        ("Maximum Displacement", c.max_displacement, MAX_DISPLACEMENT_THRESHOLD),
        ("RMS     Displacement", c.rms_displacement, RMS_DISPLACEMENT_THRESHOLD),
    ];

    out.push_str("         Item               Value     Threshold  Converged?\n");
    for (label, value, threshold) in rows {
        let flag = if value < threshold { "YES" } else { "NO" };
        out.push_str(&format!(
            " {:<20}{:>12.6}{:>13.6}     {}\n",
            label, value, threshold, flag
        ));
    }
}

// ─────────────────────────────────────────────────────────────
// 激发态
// ─────────────────────────────────────────────────────────────

fn excited_states(out: &mut String, block: &TddftBlock) {
    out.push_str("\n Excitation energies and oscillator strengths:\n");

    for state in &block.states {
        out.push('\n');
        excited_state(out, state);
    }
    out.push('\n');
}

fn excited_state(out: &mut String, state: &ExcitedState) {
    out.push_str(&format!(
        " Excited State {:>3}:  {:>12}{:>10.4} eV{:>9.2} nm  f={:.4}  <S**2>={:.3}\n",
        state.index,
        state.symmetry,
        state.energy_ev,
        state.wavelength_nm,
        state.oscillator_strength,
        state.spin_contamination
    ));

    let unrestricted = state.transitions.iter().any(|t| t.spin == Spin::Beta);
    for t in &state.transitions {
        let suffix = match (unrestricted, t.spin) {
            (false, _) => "",
            (true, Spin::Alpha) => "A",
            (true, Spin::Beta) => "B",
        };
        out.push_str(&format!(
            "  {:>8} {} {:<8}{:>12.5}\n",
            format!("{}{}", t.from, suffix),
            t.direction.arrow(),
            format!("{}{}", t.to, suffix),
            t.coefficient
        ));
    }

    if let Some(note) = &state.annotation {
        out.push_str(&format!(" {}\n", note));
    }

    if state.tracked {
        out.push_str(" This state for optimization and/or second-order correction.\n");
    }
    if let Some(total) = state.total_energy {
        out.push_str(&format!(" Total Energy, E(TD-HF/TD-DFT) = {:>18.9}\n", total));
    }
}

// ─────────────────────────────────────────────────────────────
// 频率
// ─────────────────────────────────────────────────────────────

pub fn frequencies(out: &mut String, modes: &[VibrationalMode], atoms: &[Atom], opts: &RenderOptions) {
    out.push_str(" Harmonic frequencies (cm**-1), IR intensities (KM/Mole), Raman scattering\n");
    out.push_str(" activities (A**4/AMU), depolarization ratios for plane and unpolarized\n");
    out.push_str(" incident light, reduced masses (AMU), force constants (mDyne/A),\n");
    out.push_str(" and normal coordinates:\n");

    let width = opts.block_width();
    for (block_index, block) in modes.chunks(width).enumerate() {
        frequency_block(out, block, block_index * width, atoms, opts.displacement_decimals());
    }
    out.push('\n');
}

fn frequency_block(
    out: &mut String,
    block: &[VibrationalMode],
    first: usize,
    atoms: &[Atom],
    decimals: usize,
) {
    let column = |k: usize, text: &str| -> String {
        if k == 0 {
            format!("{:>22}", text)
        } else {
            format!("{:>23}", text)
        }
    };

    let indices: String = (0..block.len())
        .map(|k| column(k, &(first + k + 1).to_string()))
        .collect();
    out.push_str(&indices);
    out.push('\n');

    let symmetries: String = block
        .iter()
        .enumerate()
        .map(|(k, m)| column(k, &m.symmetry))
        .collect();
    out.push_str(&symmetries);
    out.push('\n');

    value_row(out, " Frequencies --", block.iter().map(|m| m.frequency));
    value_row(out, " Red. masses --", block.iter().map(|m| m.reduced_mass));
    value_row(out, " Frc consts  --", block.iter().map(|m| m.force_constant));
    value_row(out, " IR Inten    --", block.iter().map(|m| m.ir_intensity));

    // 7 列对应两位小数，精度更高时同步加宽
    let w = decimals + 5;
    out.push_str("  Atom  AN");
    for _ in block {
        out.push_str("  ");
        for axis in ["X", "Y", "Z"] {
            out.push_str(&format!("{:>w$}", axis, w = w));
        }
    }
    out.push('\n');

    for (i, atom) in atoms.iter().enumerate() {
        out.push_str(&format!("{:>6}{:>4}", i + 1, atom.atomic_number()));
        for mode in block {
            let d = mode.displacements.get(i).copied().unwrap_or([0.0; 3]);
            out.push_str("  ");
            for v in d {
                out.push_str(&format!("{:>w$.d$}", v, w = w, d = decimals));
            }
        }
        out.push('\n');
    }
}

fn value_row(out: &mut String, label: &str, values: impl Iterator<Item = f64>) {
    out.push_str(label);
    for (k, v) in values.enumerate() {
        if k == 0 {
            out.push_str(&format!("{:>12.4}", v));
        } else {
            out.push_str(&format!("{:>23.4}", v));
        }
    }
    out.push('\n');
}

// ─────────────────────────────────────────────────────────────
// 热化学
// ─────────────────────────────────────────────────────────────

pub fn thermochemistry(out: &mut String, thermo: &Thermochemistry) {
    out.push_str(" -------------------\n");
    out.push_str(" - Thermochemistry -\n");
    out.push_str(" -------------------\n");

    match (thermo.temperature, thermo.pressure) {
        (Some(t), Some(p)) => {
            out.push_str(&format!(" Temperature {:>9.3} Kelvin.  Pressure {:>9.5} Atm.\n", t, p))
        }
        (Some(t), None) => out.push_str(&format!(" Temperature {:>9.3} Kelvin.\n", t)),
        (None, Some(p)) => out.push_str(&format!(" Pressure {:>9.5} Atm.\n", p)),
        (None, None) => {}
    }

    if let Some(zpe) = thermo.zero_point_energy {
        out.push_str(&format!(
            " {:<41}{:>15.6} (Hartree/Particle)\n",
            "Zero-point correction=", zpe
        ));
    }

    let corrections = [
        ("Thermal correction to Energy=", thermo.thermal_energy_correction),
        ("Thermal correction to Enthalpy=", thermo.thermal_enthalpy_correction),
        ("Thermal correction to Gibbs Free Energy=", thermo.thermal_gibbs_correction),
    ];
    for (label, value) in corrections {
        if let Some(v) = value {
            out.push_str(&format!(" {:<41}{:>15.6}\n", label, v));
        }
    }

    let sums = [
        ("Sum of electronic and zero-point Energies=", thermo.zero_point_energy),
        ("Sum of electronic and thermal Energies=", thermo.thermal_energy_correction),
        ("Sum of electronic and thermal Enthalpies=", thermo.thermal_enthalpy_correction),
        ("Sum of electronic and thermal Free Energies=", thermo.thermal_gibbs_correction),
    ];
    for (label, correction) in sums {
        if let Some(total) = thermo.sum_with(correction) {
            out.push_str(&format!(" {:<46}{:>16.6}\n", label, total));
        }
    }

    if let Some(conv) = &thermo.convergence {
        out.push_str(" Convergence of the frequency job (source program):\n");
        let rows = [
            ("Max Delta-X=", conv.max_delta_x),
            ("RMS Delta-X=", conv.rms_delta_x),
            ("Max Force=", conv.max_force),
            ("RMS Force=", conv.rms_force),
        ];
        for (label, value) in rows {
            if let Some(v) = value {
                out.push_str(&format!(" {:<18}{:>14.6}\n", label, v));
            }
        }
        if let Some(de) = conv.expected_delta_e {
            out.push_str(&format!(" {:<18}{:>14.4e}\n", "Expected Delta-E=", de));
        }
    }
    out.push('\n');
}
