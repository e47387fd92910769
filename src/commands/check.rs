//! # check 命令实现
//!
//! 检查生成的 Gaussian 格式日志：存在、非空、含正常结束标记。
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `render::validate_output`

use crate::cli::check::CheckArgs;
use crate::error::{FakegError, Result};
use crate::render;
use crate::utils::output;

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    if !render::validate_output(&args.file) {
        return Err(FakegError::InvalidOutput {
            path: args.file.display().to_string(),
        });
    }

    output::print_success(&format!("{} is a complete Gaussian log", args.file.display()));
    Ok(())
}
