//! FourCC 块标签.
//!
//! iMUS 容器中的每个块都以 4 字节 ASCII 标签开头 (如 `FRMT`, `REGN`).

use std::fmt;

/// 4 字节块标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// 资源魔数 `iMUS`
    pub const IMUS: Self = Self(*b"iMUS");
    /// 描述文本块
    pub const TEXT: Self = Self(*b"TEXT");
    /// 结束标记块
    pub const STOP: Self = Self(*b"STOP");
    /// 格式参数块
    pub const FRMT: Self = Self(*b"FRMT");
    /// 区域标记块
    pub const REGN: Self = Self(*b"REGN");
    /// 跳转标记块
    pub const JUMP: Self = Self(*b"JUMP");
    /// 同步标记块
    pub const SYNC: Self = Self(*b"SYNC");
    /// 采样数据起始块
    pub const DATA: Self = Self(*b"DATA");

    /// 由 4 个字节创建标签
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// 由大端 u32 创建标签
    pub const fn from_be_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// 转为大端 u32
    pub const fn to_be_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// 原始字节
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCc {
    /// 不可打印字节以 `.` 代替, 便于日志输出
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}
