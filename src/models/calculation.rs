//! # 计算结果数据模型
//!
//! 一次转换的规范化中间表示：优化步骤、振动模式、热化学数据、
//! 电荷/自旋多重度以及 TDDFT 激发态。
//!
//! ## 生命周期
//! 由解析器一次性填充，之后只读交给 `render/` 输出。
//!
//! ## 依赖关系
//! - 被 `parsers/` 填充，被 `render/` 和 `commands/` 读取
//! - 使用 `models/structure.rs`

use crate::models::structure::OptimizationStep;
use serde::Serialize;

/// 振动模式
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibrationalMode {
    /// 频率 (cm⁻¹)
    pub frequency: f64,
    /// 红外强度 (km/mol)
    pub ir_intensity: f64,
    /// 约化质量 (AMU)，源文件未给出时为 0
    pub reduced_mass: f64,
    /// 力常数 (mDyne/Å)，源文件未给出时为 0
    pub force_constant: f64,
    /// 不可约表示标签
    pub symmetry: String,
    /// 每个原子的位移向量 [atom][xyz]
    pub displacements: Vec<[f64; 3]>,
}

impl VibrationalMode {
    pub fn new(frequency: f64) -> Self {
        VibrationalMode {
            frequency,
            ir_intensity: 0.0,
            reduced_mass: 0.0,
            force_constant: 0.0,
            symmetry: "A".to_string(),
            displacements: Vec::new(),
        }
    }

    /// 按原子数重置位移表（全部置零）
    pub fn reset_displacements(&mut self, n_atoms: usize) {
        self.displacements = vec![[0.0; 3]; n_atoms];
    }

    /// 写入单个位移分量，越界时忽略
    pub fn set_displacement(&mut self, atom: usize, axis: usize, value: f64) {
        if let Some(row) = self.displacements.get_mut(atom) {
            if axis < 3 {
                row[axis] = value;
            }
        }
    }
}

/// 频率计算后的收敛诊断
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThermoConvergence {
    pub max_delta_x: Option<f64>,
    pub rms_delta_x: Option<f64>,
    pub max_force: Option<f64>,
    pub rms_force: Option<f64>,
    pub expected_delta_e: Option<f64>,
}

/// 热化学数据
///
/// 所有字段都可能缺失，输出时只写出已解析到的量。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Thermochemistry {
    /// 温度 (K)
    pub temperature: Option<f64>,
    /// 压力 (atm)
    pub pressure: Option<f64>,
    /// 电子能量 (Hartree)
    pub electronic_energy: Option<f64>,
    /// 零点能 (Hartree)
    pub zero_point_energy: Option<f64>,
    /// 内能热校正 (Hartree)
    pub thermal_energy_correction: Option<f64>,
    /// 焓热校正 (Hartree)
    pub thermal_enthalpy_correction: Option<f64>,
    /// Gibbs 自由能热校正 (Hartree)
    pub thermal_gibbs_correction: Option<f64>,
    /// 收敛诊断
    pub convergence: Option<ThermoConvergence>,
}

impl Thermochemistry {
    /// 是否含有任何热力学量（不含单独的电子能量）
    pub fn has_thermal_data(&self) -> bool {
        self.temperature.is_some()
            || self.pressure.is_some()
            || self.zero_point_energy.is_some()
            || self.thermal_energy_correction.is_some()
            || self.thermal_enthalpy_correction.is_some()
            || self.thermal_gibbs_correction.is_some()
    }

    /// 可选量求和，任一缺失则为 None
    pub fn sum_with(&self, correction: Option<f64>) -> Option<f64> {
        match (self.electronic_energy, correction) {
            (Some(e), Some(c)) => Some(e + c),
            _ => None,
        }
    }
}

/// 自旋通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Spin {
    Alpha,
    Beta,
}

/// 跃迁方向：`->` 激发，`<-` 退激发
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionDirection {
    Forward,
    Backward,
}

impl TransitionDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            TransitionDirection::Forward => "->",
            TransitionDirection::Backward => "<-",
        }
    }
}

/// 轨道跃迁
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalTransition {
    pub from: u32,
    pub to: u32,
    pub coefficient: f64,
    pub spin: Spin,
    pub direction: TransitionDirection,
}

/// 激发态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcitedState {
    pub index: usize,
    /// 如 `Singlet-A`
    pub symmetry: String,
    /// 激发能 (eV)
    pub energy_ev: f64,
    /// 波长 (nm)
    pub wavelength_nm: f64,
    /// 振子强度
    pub oscillator_strength: f64,
    /// <S**2>
    pub spin_contamination: f64,
    pub transitions: Vec<OrbitalTransition>,
    /// 激发态总能量 (Hartree)
    pub total_energy: Option<f64>,
    /// 是否为优化所跟踪的激发态
    pub tracked: bool,
    pub annotation: Option<String>,
}

impl ExcitedState {
    pub fn new(index: usize) -> Self {
        ExcitedState {
            index,
            symmetry: "Singlet-A".to_string(),
            energy_ev: 0.0,
            wavelength_nm: 0.0,
            oscillator_strength: 0.0,
            spin_contamination: 0.0,
            transitions: Vec::new(),
            total_energy: None,
            tracked: false,
            annotation: None,
        }
    }
}

/// 一个优化步骤对应的 TDDFT 结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TddftBlock {
    pub states: Vec<ExcitedState>,
}

impl TddftBlock {
    pub fn is_present(&self) -> bool {
        !self.states.is_empty()
    }

    pub fn tracked_state(&self) -> Option<&ExcitedState> {
        self.states.iter().find(|s| s.tracked)
    }
}

/// 电荷与自旋多重度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargeSpin {
    pub charge: i32,
    pub multiplicity: i32,
}

impl Default for ChargeSpin {
    fn default() -> Self {
        ChargeSpin {
            charge: 0,
            multiplicity: 1,
        }
    }
}

/// 一次转换的完整计算记录
#[derive(Debug, Clone, Default)]
pub struct ComputationRecord {
    /// 优化步骤（成功解析时非空）
    pub steps: Vec<OptimizationStep>,
    /// 振动模式
    pub modes: Vec<VibrationalMode>,
    /// 热化学数据
    pub thermo: Option<Thermochemistry>,
    /// TDDFT 结果，按下标与 `steps` 对齐
    pub tddft: Vec<TddftBlock>,
    /// 是否为优化 / 轨迹
    pub has_optimization: bool,
    /// 是否含频率
    pub has_frequencies: bool,
    charge_spin: Option<ChargeSpin>,
}

impl ComputationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个步骤；没有原子的步骤连同其 TDDFT 结果一起丢弃
    pub fn push_step(&mut self, step: OptimizationStep, tddft: Option<TddftBlock>) -> bool {
        if step.is_empty() {
            return false;
        }

        self.steps.push(step);

        if let Some(block) = tddft.filter(|b| b.is_present()) {
            self.tddft.resize(self.steps.len(), TddftBlock::default());
            if let Some(slot) = self.tddft.last_mut() {
                *slot = block;
            }
        }

        true
    }

    /// 第 `index` 步的 TDDFT 结果
    pub fn tddft_for(&self, index: usize) -> Option<&TddftBlock> {
        self.tddft.get(index).filter(|b| b.is_present())
    }

    /// 设置电荷与多重度，已设置时不覆盖
    pub fn set_charge_spin(&mut self, charge: i32, multiplicity: i32) -> bool {
        if self.charge_spin.is_some() {
            return false;
        }
        self.charge_spin = Some(ChargeSpin {
            charge,
            multiplicity,
        });
        true
    }

    pub fn has_charge_spin(&self) -> bool {
        self.charge_spin.is_some()
    }

    /// 电荷与多重度，未设置时为 (0, 1)
    pub fn charge_spin(&self) -> ChargeSpin {
        self.charge_spin.unwrap_or_default()
    }

    /// 至少有一个含原子的步骤
    pub fn is_usable(&self) -> bool {
        self.steps.iter().any(|s| !s.is_empty())
    }

    /// 最后一步的原子数（振动位移表的维度）
    pub fn last_atom_count(&self) -> usize {
        self.steps.last().map(|s| s.atom_count()).unwrap_or(0)
    }

    pub fn has_thermo(&self) -> bool {
        self.thermo.is_some()
    }
}
