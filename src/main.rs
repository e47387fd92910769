//! # FakeG - 伪 Gaussian 日志生成器
//!
//! 把 AMESP、BDF、xtb 与 XYZ 轨迹的输出转换为 Gaussian 16 风格的日志，
//! 以便用 GaussView 等只认 Gaussian 格式的程序查看优化过程、振动与激发态。
//!
//! ## 子命令
//! - `convert` - 转换一个输出文件
//! - `check`   - 检查生成的日志是否完整
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (源程序解析器)
//!   │     ├── render/    (Gaussian 格式输出)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出、进度、日志)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod render;
mod utils;

use clap::Parser;
use cli::Cli;
use std::error::Error;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = utils::logging::setup_logging(cli.debug, cli.quiet, cli.log_file.as_deref()) {
        fail(&e);
    }

    if let Err(e) = commands::run(cli.command, cli.quiet) {
        fail(&e);
    }
}

fn fail(e: &error::FakegError) -> ! {
    let msg = match e.source() {
        Some(cause) => format!("{}: {}", e, cause),
        None => e.to_string(),
    };
    utils::output::print_error(&msg);
    std::process::exit(1);
}
