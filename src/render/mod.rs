//! # Gaussian 格式输出模块
//!
//! 把 `ComputationRecord` 写成 Gaussian 16 风格的日志，供 GaussView 等
//! 可视化程序打开。输出依次包含：
//! - 文件头、路由行、电荷与多重度
//! - 每个步骤的坐标表、SCF 能量、TDDFT 激发态、收敛表
//! - 振动频率与简正模式
//! - 热化学
//! - `Normal termination` 结尾
//!
//! 生成的文件可以由 xtb 格式解析器读回。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: sections

mod sections;

use crate::error::{FakegError, Result};
use crate::models::ComputationRecord;
use crate::parsers::{Dialect, SourceParser};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TERMINATION_MARKER: &str = "Normal termination of Gaussian";

/// 输出选项
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub program: String,
    pub version: String,
    pub author: String,
    /// 每个频率块的模式数 (1..=5)
    pub block_width: usize,
    /// 简正位移的小数位数
    pub displacement_decimals: usize,
    pub source: Option<Dialect>,
    pub input_name: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            program: "FakeG".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: env!("CARGO_PKG_AUTHORS").to_string(),
            block_width: 3,
            displacement_decimals: 2,
            source: None,
            input_name: None,
        }
    }
}

impl RenderOptions {
    /// 按解析器的偏好设置块宽，并记录来源
    pub fn for_parser(parser: &SourceParser, input: &Path) -> Self {
        RenderOptions {
            block_width: parser.preferred_block_width(),
            source: Some(parser.dialect()),
            input_name: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            ..Self::default()
        }
    }

    pub fn with_block_width(mut self, width: usize) -> Self {
        self.block_width = width;
        self
    }

    pub fn block_width(&self) -> usize {
        self.block_width.clamp(1, 5)
    }

    pub fn displacement_decimals(&self) -> usize {
        self.displacement_decimals.clamp(1, 6)
    }

    /// `SCF Done:  E(...)` 括号中的方法名
    fn method_label(&self) -> String {
        match self.source {
            Some(dialect) => dialect.to_string(),
            None => "FakeG".to_string(),
        }
    }
}

/// 生成完整的 Gaussian 格式文本
pub fn render_to_string(record: &ComputationRecord, opts: &RenderOptions) -> String {
    let mut out = String::new();

    sections::header(&mut out, record, opts);

    for position in 0..record.steps.len() {
        sections::step(&mut out, record, position, opts);
    }

    if !record.modes.is_empty() {
        let atoms = record
            .steps
            .last()
            .map(|s| s.atoms.as_slice())
            .unwrap_or(&[]);
        sections::frequencies(&mut out, &record.modes, atoms, opts);
    }

    if let Some(thermo) = &record.thermo {
        sections::thermochemistry(&mut out, thermo);
    }

    out.push_str(sections::FOOTER);
    out.push('\n');
    out
}

/// 写入文件；目标目录必须已存在
pub fn render(record: &ComputationRecord, path: &Path, opts: &RenderOptions) -> Result<()> {
    let text = render_to_string(record, opts);
    fs::write(path, text).map_err(|e| FakegError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    debug!("Wrote {} steps to {}", record.steps.len(), path.display());
    Ok(())
}

/// 检查文件存在、非空且含正常结束标记
pub fn validate_output(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => {
            warn!("Output file {} is empty", path.display());
            false
        }
        Ok(text) => text.contains(TERMINATION_MARKER),
        Err(_) => false,
    }
}

/// `case1.out` -> `case1_fake.out`；无扩展名时直接追加后缀
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };

    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Atom, ConvergenceMetrics, ExcitedState, OptimizationStep, TddftBlock, Thermochemistry,
        VibrationalMode,
    };
    use crate::parsers::xtb::XtbParser;
    use crate::parsers::TextSource;
    use tempfile::TempDir;

    fn water(index: usize, energy: f64) -> OptimizationStep {
        let mut step = OptimizationStep::new(index);
        step.atoms = vec![
            Atom::new("O", [0.0, 0.0, 0.11779]),
            Atom::new("H", [0.0, 0.755453, -0.471161]),
            Atom::new("H", [0.0, -0.755453, -0.471161]),
        ];
        step.energy = energy;
        step
    }

    fn optimization_record() -> ComputationRecord {
        let mut record = ComputationRecord::new();
        let mut first = water(1, -76.4);
        first.set_convergence(ConvergenceMetrics::new(5e-4, 8e-4, 2e-3, 3e-3));
        let mut last = water(2, -76.41);
        last.set_convergence(ConvergenceMetrics::new(5e-6, 1e-5, 5e-5, 1e-4));
        record.push_step(first, None);
        record.push_step(last, None);
        record.has_optimization = true;
        record.set_charge_spin(0, 1);
        record
    }

    fn reparse(text: &str) -> ComputationRecord {
        let source = TextSource::from_string("fake.log", text);
        XtbParser::new().parse(&source)
    }

    #[test]
    fn test_derive_output_path() {
        assert_eq!(
            derive_output_path(Path::new("case1.out"), "_fake"),
            PathBuf::from("case1_fake.out")
        );
        assert_eq!(
            derive_output_path(Path::new("runs/opt.aop"), "_fake"),
            PathBuf::from("runs/opt_fake.aop")
        );
        assert_eq!(
            derive_output_path(Path::new("traj"), "_fake"),
            PathBuf::from("traj_fake")
        );
    }

    #[test]
    fn test_block_width_clamped() {
        assert_eq!(RenderOptions::default().with_block_width(0).block_width(), 1);
        assert_eq!(RenderOptions::default().with_block_width(9).block_width(), 5);
        assert_eq!(RenderOptions::default().with_block_width(4).block_width(), 4);
    }

    #[test]
    fn test_orientation_layout_and_footer() {
        let text = render_to_string(&optimization_record(), &RenderOptions::default());

        assert!(text.starts_with(" Entering Gaussian System"));
        assert!(text.contains(" Charge =  0 Multiplicity = 1"));
        assert!(text.contains(
            "      1          8           0        0.000000    0.000000    0.117790"
        ));
        assert!(text.contains(" SCF Done:  E(FakeG) ="));
        assert!(text.trim_end().ends_with("Normal termination of Gaussian 16."));
    }

    #[test]
    fn test_convergence_table_and_stationary_point() {
        let text = render_to_string(&optimization_record(), &RenderOptions::default());

        assert_eq!(text.matches("Maximum Force").count(), 2);
        assert!(text.contains(" Maximum Force"));
        assert!(text.contains(" RMS     Displacement"));
        assert_eq!(text.matches("Optimization completed.").count(), 1);
        assert!(text.contains("-- Stationary point found."));

        let mut record = optimization_record();
        record.steps[1].set_convergence(ConvergenceMetrics::new(5e-4, 8e-4, 2e-3, 3e-3));
        let text = render_to_string(&record, &RenderOptions::default());
        assert!(!text.contains("Stationary point found"));
    }

    #[test]
    fn test_single_point_has_no_convergence_table() {
        let mut record = ComputationRecord::new();
        record.push_step(water(1, -76.0), None);

        let text = render_to_string(&record, &RenderOptions::default());
        assert!(!text.contains("Maximum Force"));
        assert!(text.contains(" #p sp"));
    }

    #[test]
    fn test_steps_round_trip() {
        let record = optimization_record();
        let back = reparse(&render_to_string(&record, &RenderOptions::default()));

        assert_eq!(back.steps.len(), 2);
        assert!(back.has_optimization);
        assert_eq!(back.charge_spin(), record.charge_spin());
        for (a, b) in record.steps.iter().zip(&back.steps) {
            assert!((a.energy - b.energy).abs() < 1e-9);
            assert_eq!(a.converged, b.converged);
            for (x, y) in a.atoms.iter().zip(&b.atoms) {
                assert_eq!(x.symbol(), y.symbol());
                for k in 0..3 {
                    assert!((x.position()[k] - y.position()[k]).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_frequency_round_trip_across_blocks() {
        let mut record = optimization_record();
        for m in 0..7 {
            let mut mode = VibrationalMode::new(100.0 + m as f64 * 37.123456);
            mode.ir_intensity = m as f64 * 1.5;
            mode.reduced_mass = 1.0 + m as f64 * 0.1;
            mode.reset_displacements(3);
            for atom in 0..3 {
                for axis in 0..3 {
                    let v = ((m * 7 + atom * 3 + axis) % 19) as f64 / 20.0 - 0.45;
                    mode.set_displacement(atom, axis, v);
                }
            }
            record.modes.push(mode);
        }
        record.has_frequencies = true;

        let opts = RenderOptions::default().with_block_width(3);
        let text = render_to_string(&record, &opts);
        assert!(text.contains("  Atom  AN        X      Y      Z"));

        let back = reparse(&text);
        assert_eq!(back.modes.len(), 7);
        for (a, b) in record.modes.iter().zip(&back.modes) {
            assert!((a.frequency - b.frequency).abs() < 5e-5 + 1e-9);
            assert!((a.ir_intensity - b.ir_intensity).abs() < 5e-5 + 1e-9);
            assert_eq!(b.symmetry, "A");
            for (da, db) in a.displacements.iter().zip(&b.displacements) {
                for k in 0..3 {
                    assert!((da[k] - db[k]).abs() <= 0.005 + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_thermo_prints_only_populated_lines() {
        let mut record = optimization_record();
        record.thermo = Some(Thermochemistry {
            temperature: Some(298.15),
            ..Thermochemistry::default()
        });

        let text = render_to_string(&record, &RenderOptions::default());
        assert!(text.contains("- Thermochemistry -"));
        assert!(text.contains("Temperature"));
        assert!(!text.contains("Zero-point correction="));
        assert!(!text.contains("Sum of electronic"));

        record.thermo = Some(Thermochemistry {
            temperature: Some(298.15),
            pressure: Some(1.0),
            electronic_energy: Some(-76.42),
            zero_point_energy: Some(0.021234),
            thermal_gibbs_correction: Some(0.00358),
            ..Thermochemistry::default()
        });
        let text = render_to_string(&record, &RenderOptions::default());
        assert!(text.contains("Zero-point correction="));
        assert!(text.contains("Sum of electronic and zero-point Energies="));
        assert!(text.contains("Sum of electronic and thermal Free Energies="));
        assert!(!text.contains("Thermal correction to Enthalpy="));
        assert!(!text.contains("Sum of electronic and thermal Enthalpies="));

        let thermo = reparse(&text).thermo.expect("thermo");
        assert_eq!(thermo.temperature, Some(298.15));
        assert_eq!(thermo.zero_point_energy, Some(0.021234));
        assert!((thermo.electronic_energy.unwrap_or(0.0) + 76.42).abs() < 1e-6);
    }

    #[test]
    fn test_tracked_excited_state() {
        let mut record = ComputationRecord::new();
        let mut state = ExcitedState::new(1);
        state.energy_ev = 4.1234;
        state.wavelength_nm = 300.68;
        state.tracked = true;
        state.total_energy = Some(-76.25);
        let block = TddftBlock {
            states: vec![state, ExcitedState::new(2)],
        };
        record.push_step(water(1, -76.25), Some(block));

        let text = render_to_string(&record, &RenderOptions::default());
        assert!(text.contains(" #p td"));
        assert_eq!(text.matches(" Excited State").count(), 2);
        assert_eq!(
            text.matches("This state for optimization and/or second-order correction.")
                .count(),
            1
        );
        assert!(text.contains("Total Energy, E(TD-HF/TD-DFT) ="));
    }

    #[test]
    fn test_render_and_validate_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("water_fake.log");

        render(&optimization_record(), &path, &RenderOptions::default()).unwrap();
        assert!(validate_output(&path));

        let back = reparse(&fs::read_to_string(&path).unwrap());
        assert_eq!(back.steps.len(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_output() {
        let dir = TempDir::new().unwrap();

        assert!(!validate_output(&dir.path().join("missing.log")));

        let empty = dir.path().join("empty.log");
        fs::write(&empty, "").unwrap();
        assert!(!validate_output(&empty));

        let truncated = dir.path().join("truncated.log");
        fs::write(&truncated, " Entering Gaussian System\n").unwrap();
        assert!(!validate_output(&truncated));
    }

    #[test]
    fn test_render_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_such_dir").join("out.log");

        let err = render(&optimization_record(), &path, &RenderOptions::default());
        assert!(matches!(err, Err(FakegError::FileWriteError { .. })));
    }
}
