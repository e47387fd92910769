//! # 数据模型模块
//!
//! 定义统一的计算记录数据模型与元素表。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`render/` 和 `commands/` 使用
//! - 子模块: element, structure, calculation

pub mod calculation;
pub mod element;
pub mod structure;

pub use calculation::{
    ChargeSpin, ComputationRecord, ExcitedState, OrbitalTransition, Spin, TddftBlock,
    Thermochemistry, ThermoConvergence, TransitionDirection, VibrationalMode,
};
pub use structure::{Atom, ConvergenceMetrics, OptimizationStep};
