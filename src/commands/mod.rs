//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `render/`, `utils/`
//! - 子模块: convert, check

pub mod check;
pub mod convert;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands, quiet: bool) -> Result<()> {
    match cmd {
        Commands::Convert(args) => convert::execute(args, quiet),
        Commands::Check(args) => check::execute(args),
    }
}
