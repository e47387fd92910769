//! # 几何结构数据模型
//!
//! 定义原子、优化步骤与收敛判据。
//! 优化步骤既可以是几何优化的一步，也可以是单点计算或轨迹中的一帧。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `render/` 使用
//! - 使用 `models/element.rs`

use crate::models::element;
use serde::Serialize;

/// RMS 力收敛阈值 (Hartree/Bohr)
pub const RMS_FORCE_THRESHOLD: f64 = 3.0e-4;
/// 最大力收敛阈值 (Hartree/Bohr)
pub const MAX_FORCE_THRESHOLD: f64 = 4.5e-4;
/// RMS 位移收敛阈值 (Bohr)
pub const RMS_DISPLACEMENT_THRESHOLD: f64 = 1.2e-3;
/// 最大位移收敛阈值 (Bohr)
pub const MAX_DISPLACEMENT_THRESHOLD: f64 = 1.8e-3;

/// 原子信息（构造后不可变）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atom {
    symbol: String,
    atomic_number: u32,
    /// 笛卡尔坐标 (Å)
    position: [f64; 3],
}

impl Atom {
    /// 由元素符号创建，原子序数查表得到
    pub fn new(symbol: impl Into<String>, position: [f64; 3]) -> Self {
        let symbol = symbol.into();
        let atomic_number = element::atomic_number(&symbol);
        Atom {
            symbol,
            atomic_number,
            position,
        }
    }

    /// 由原子序数创建（Gaussian 格式的坐标表只给出原子序数）
    pub fn from_atomic_number(atomic_number: u32, position: [f64; 3]) -> Self {
        match element::symbol_for(atomic_number) {
            Some(symbol) => Atom::new(symbol, position),
            None => Atom {
                symbol: "X".to_string(),
                atomic_number,
                position,
            },
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }
}

/// 几何收敛指标
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConvergenceMetrics {
    pub rms_force: f64,
    pub max_force: f64,
    pub rms_displacement: f64,
    pub max_displacement: f64,
}

impl ConvergenceMetrics {
    pub fn new(rms_force: f64, max_force: f64, rms_displacement: f64, max_displacement: f64) -> Self {
        ConvergenceMetrics {
            rms_force,
            max_force,
            rms_displacement,
            max_displacement,
        }
    }

    /// 统一阈值判断是否收敛
    ///
    /// 所有程序共用同一组阈值，与各程序自身的判据无关。
    pub fn is_converged(&self) -> bool {
        self.rms_force < RMS_FORCE_THRESHOLD
            && self.max_force < MAX_FORCE_THRESHOLD
            && self.rms_displacement < RMS_DISPLACEMENT_THRESHOLD
            && self.max_displacement < MAX_DISPLACEMENT_THRESHOLD
    }
}

/// 优化步骤 / 单点 / 轨迹帧
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationStep {
    /// 步骤编号（来自源文件，从 1 开始）
    pub index: usize,
    /// 该步的构型
    pub atoms: Vec<Atom>,
    /// 能量 (Hartree)
    pub energy: f64,
    /// 收敛指标
    pub convergence: ConvergenceMetrics,
    /// 是否收敛
    pub converged: bool,
}

impl OptimizationStep {
    pub fn new(index: usize) -> Self {
        OptimizationStep {
            index,
            atoms: Vec::new(),
            energy: 0.0,
            convergence: ConvergenceMetrics::default(),
            converged: false,
        }
    }

    /// 写入收敛指标并重新判定收敛状态
    pub fn set_convergence(&mut self, metrics: ConvergenceMetrics) {
        self.convergence = metrics;
        self.converged = metrics.is_converged();
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
