//! # 元素周期表
//!
//! 元素符号与原子序数之间的双向映射。
//!
//! ## 说明
//! - 未知元素符号的原子序数按氢 (1) 处理
//! - 构造后只读，可被任意多个解析器同时查询
//!
//! ## 依赖关系
//! - 被 `models/structure.rs` 和 `parsers/` 使用
//! - 纯静态数据，无外部依赖

use std::collections::HashMap;
use std::sync::LazyLock;

/// 元素符号表，下标 = 原子序数 - 1
const SYMBOLS: [&str; 118] = [
    // 第 1 周期
    "H", "He",
    // 第 2 周期
    "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    // 第 3 周期
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    // 第 4 周期
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se",
    "Br", "Kr",
    // 第 5 周期
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te",
    "I", "Xe",
    // 第 6 周期（含镧系）
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    // 第 7 周期（含锕系）
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No",
    "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 元素符号 -> 原子序数
pub static ELEMENT_TABLE: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, &symbol)| (symbol, i as u32 + 1))
        .collect()
});

/// 查询原子序数，未知符号返回 None
pub fn lookup(symbol: &str) -> Option<u32> {
    ELEMENT_TABLE.get(symbol).copied()
}

/// 查询原子序数，未知符号按氢处理
pub fn atomic_number(symbol: &str) -> u32 {
    lookup(symbol).unwrap_or(1)
}

/// 由原子序数取元素符号
pub fn symbol_for(atomic_number: u32) -> Option<&'static str> {
    if atomic_number == 0 {
        return None;
    }
    SYMBOLS.get(atomic_number as usize - 1).copied()
}

/// 规范化元素符号
///
/// 各程序输出的大小写不一致（`CL`、`cl`），也有以原子序数代替符号的。
/// 能识别则返回标准写法，否则原样返回。
pub fn normalize_symbol(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(z) = raw.parse::<u32>() {
        if let Some(symbol) = symbol_for(z) {
            return symbol.to_string();
        }
        return raw.to_string();
    }

    let mut chars = raw.chars();
    let candidate = match chars.next() {
        Some(first) => {
            let mut s = first.to_ascii_uppercase().to_string();
            s.push_str(&chars.as_str().to_ascii_lowercase());
            s
        }
        None => return String::new(),
    };

    if lookup(&candidate).is_some() {
        candidate
    } else {
        raw.to_string()
    }
}
