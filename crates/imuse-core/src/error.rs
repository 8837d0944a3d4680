//! 统一错误类型定义.
//!
//! 所有 imuse crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

use crate::tag::FourCc;

/// iMUS 资源管理器统一错误类型
#[derive(Debug, Error)]
pub enum ImuseError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (损坏的资源头等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 未知的块标签, 资源无法继续解析
    #[error("未知的块标签 '{tag}' (偏移 {position})")]
    UnknownChunk {
        /// 读到的标签
        tag: FourCc,
        /// 标签在资源中的字节偏移
        position: usize,
    },

    /// 数据被截断
    #[error("数据被截断: 需要 {needed} 字节, 仅剩 {available} 字节 (偏移 {position})")]
    Truncated {
        /// 读取起始偏移
        position: usize,
        /// 需要的字节数
        needed: usize,
        /// 实际剩余字节数
        available: usize,
    },

    /// 资源槽位已耗尽
    #[error("无法分配空闲音频槽位: 全部 {0} 个槽位均被占用")]
    PoolExhausted(usize),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// iMUS 资源管理器统一 Result 类型
pub type ImuseResult<T> = Result<T, ImuseError>;
