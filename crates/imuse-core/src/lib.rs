//! # imuse-core
//!
//! iMUS 音频资源管理器核心库, 提供错误类型与 FourCC 标签等基础设施.
//!
//! 本 crate 为 `imuse-format` 与命令行工具提供共用的底层类型.

pub mod error;
pub mod tag;

// 重导出常用类型
pub use error::{ImuseError, ImuseResult};
pub use tag::FourCc;
