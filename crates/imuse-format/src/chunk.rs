//! iMUS 块扫描器.
//!
//! 资源头部由一串变长块组成, 每块结构为:
//! ```text
//! tag(4) + length(BE32) + payload(length)
//! ```
//! 扫描在读到 `DATA` 块的标签与长度后立即停止, `DATA` 的负载 (采样数据)
//! 不在头部扫描中消费, 而是由数据读取阶段按需获取.
//!
//! 格式没有声明块的数量, 因此解析分两遍: 先用 [`count_elements`] 统计区域/跳转/
//! 同步块数量, 再按数量分配表并进行填充扫描.

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use imuse_core::{FourCc, ImuseError, ImuseResult};

/// 块标签 (4 字节) + 长度字段 (4 字节)
pub const CHUNK_HEADER_SIZE: usize = 8;

/// 已识别的块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// 描述文本
    Text,
    /// 结束标记
    Stop,
    /// 格式参数 (位深、采样率、声道数)
    Format,
    /// 区域标记
    Region,
    /// 跳转标记
    Jump,
    /// 同步标记
    Sync,
    /// 采样数据起始
    Data,
}

impl ChunkKind {
    /// 根据标签识别块类型, 未知标签返回 None
    pub fn from_tag(tag: FourCc) -> Option<Self> {
        match tag {
            FourCc::TEXT => Some(Self::Text),
            FourCc::STOP => Some(Self::Stop),
            FourCc::FRMT => Some(Self::Format),
            FourCc::REGN => Some(Self::Region),
            FourCc::JUMP => Some(Self::Jump),
            FourCc::SYNC => Some(Self::Sync),
            FourCc::DATA => Some(Self::Data),
            _ => None,
        }
    }

    /// 对应的标签
    pub fn tag(self) -> FourCc {
        match self {
            Self::Text => FourCc::TEXT,
            Self::Stop => FourCc::STOP,
            Self::Format => FourCc::FRMT,
            Self::Region => FourCc::REGN,
            Self::Jump => FourCc::JUMP,
            Self::Sync => FourCc::SYNC,
            Self::Data => FourCc::DATA,
        }
    }
}

/// 扫描得到的单个块
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// 块类型
    pub kind: ChunkKind,
    /// 标签在资源中的字节偏移
    pub position: usize,
    /// 负载字节 (`DATA` 块为空)
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// 获取至少 `min_len` 字节的负载, 不足时报错
    pub fn fields(&self, min_len: usize) -> ImuseResult<&'a [u8]> {
        if self.payload.len() < min_len {
            return Err(ImuseError::InvalidData(format!(
                "{} 块长度 {} 小于所需的 {} 字节 (偏移 {})",
                self.kind.tag(),
                self.payload.len(),
                min_len,
                self.position,
            )));
        }
        Ok(self.payload)
    }

    /// 读取负载中 `index` 处的大端 u32 字段
    ///
    /// 调用前须已通过 [`Chunk::fields`] 校验长度.
    pub(crate) fn be_u32(payload: &[u8], index: usize) -> u32 {
        BigEndian::read_u32(&payload[index * 4..index * 4 + 4])
    }
}

/// 块扫描器
///
/// 在字节缓冲区上逐块前进, 读到 `DATA` 后结束.
/// 遇到未知标签或越界的块时返回错误, 之后不再产出任何块.
pub struct ChunkScanner<'a> {
    /// 整个资源的字节
    data: &'a [u8],
    /// 当前读取位置 (相对资源起始)
    pos: usize,
    /// 是否已结束 (读到 DATA 或出错)
    finished: bool,
}

impl<'a> ChunkScanner<'a> {
    /// 从 `start` 处开始扫描
    pub fn new(data: &'a [u8], start: usize) -> Self {
        Self {
            data,
            pos: start,
            finished: false,
        }
    }

    /// 当前位置 (读到 DATA 后即为采样数据起始偏移)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 读取下一个块
    pub fn next_chunk(&mut self) -> ImuseResult<Option<Chunk<'a>>> {
        if self.finished {
            return Ok(None);
        }
        let result = self.read_chunk();
        match &result {
            Ok(chunk) if chunk.kind == ChunkKind::Data => self.finished = true,
            Ok(_) => {}
            Err(_) => self.finished = true,
        }
        result.map(Some)
    }

    fn read_chunk(&mut self) -> ImuseResult<Chunk<'a>> {
        let position = self.pos;
        let tag = FourCc::from_be_u32(BigEndian::read_u32(self.take(4)?));
        let kind =
            ChunkKind::from_tag(tag).ok_or(ImuseError::UnknownChunk { tag, position })?;
        let declared_len = BigEndian::read_u32(self.take(4)?) as usize;

        // DATA 只消费标签与长度
        let payload = if kind == ChunkKind::Data {
            &[][..]
        } else {
            self.take(declared_len)?
        };

        debug!("块 '{}': 偏移={}, 长度={}", tag, position, declared_len);
        Ok(Chunk {
            kind,
            position,
            payload,
        })
    }

    fn take(&mut self, count: usize) -> ImuseResult<&'a [u8]> {
        let available = self.data.len().saturating_sub(self.pos);
        if count > available {
            return Err(ImuseError::Truncated {
                position: self.pos,
                needed: count,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }
}

impl<'a> Iterator for ChunkScanner<'a> {
    type Item = ImuseResult<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// 计数扫描的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCounts {
    /// REGN 块数量
    pub regions: usize,
    /// JUMP 块数量
    pub jumps: usize,
    /// SYNC 块数量
    pub syncs: usize,
}

/// 计数扫描: 统计从 `start` 开始到 `DATA` 为止的区域/跳转/同步块数量
pub fn count_elements(data: &[u8], start: usize) -> ImuseResult<ElementCounts> {
    let mut counts = ElementCounts::default();
    for chunk in ChunkScanner::new(data, start) {
        match chunk?.kind {
            ChunkKind::Region => counts.regions += 1,
            ChunkKind::Jump => counts.jumps += 1,
            ChunkKind::Sync => counts.syncs += 1,
            ChunkKind::Text | ChunkKind::Stop | ChunkKind::Format | ChunkKind::Data => {}
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 写入一个块
    fn push_chunk(buf: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
        buf.extend_from_slice(tag);
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);
    }

    fn make_stream() -> Vec<u8> {
        let mut buf = Vec::new();
        push_chunk(&mut buf, b"FRMT", &[0u8; 20]);
        push_chunk(&mut buf, b"TEXT", b"intro\0");
        push_chunk(&mut buf, b"REGN", &[0u8; 8]);
        push_chunk(&mut buf, b"REGN", &[0u8; 8]);
        push_chunk(&mut buf, b"JUMP", &[0u8; 16]);
        push_chunk(&mut buf, b"SYNC", &[1, 2, 3]);
        push_chunk(&mut buf, b"STOP", &[0u8; 4]);
        buf.extend_from_slice(b"DATA");
        buf.extend_from_slice(&1000u32.to_be_bytes());
        buf
    }

    #[test]
    fn test_计数扫描() {
        let data = make_stream();
        let counts = count_elements(&data, 0).unwrap();
        assert_eq!(
            counts,
            ElementCounts {
                regions: 2,
                jumps: 1,
                syncs: 1
            }
        );
    }

    #[test]
    fn test_扫描在_data_处停止() {
        let mut data = make_stream();
        let data_end = data.len();
        // DATA 之后的字节不应被解析
        data.extend_from_slice(b"JUNKJUNK");

        let mut scanner = ChunkScanner::new(&data, 0);
        let kinds: Vec<ChunkKind> = scanner
            .by_ref()
            .map(|c| c.unwrap().kind)
            .collect();
        assert_eq!(kinds.len(), 8);
        assert_eq!(kinds.last(), Some(&ChunkKind::Data));
        assert!(scanner.next().is_none());
        assert_eq!(scanner.position(), data_end);
    }

    #[test]
    fn test_data_负载不要求存在() {
        // 只有头部, DATA 声明 1000 字节但缓冲区中没有
        let data = make_stream();
        assert!(count_elements(&data, 0).is_ok());
    }

    #[test]
    fn test_未知标签报错() {
        let mut data = Vec::new();
        push_chunk(&mut data, b"FRMT", &[0u8; 20]);
        push_chunk(&mut data, b"ABCD", &[0u8; 4]);
        let err = count_elements(&data, 0).unwrap_err();
        match err {
            ImuseError::UnknownChunk { tag, position } => {
                assert_eq!(tag, FourCc::new(*b"ABCD"));
                assert_eq!(position, 28);
            }
            other => panic!("意外的错误: {other:?}"),
        }
    }

    #[test]
    fn test_出错后不再产出块() {
        let mut data = Vec::new();
        push_chunk(&mut data, b"ZZZZ", &[]);
        let mut scanner = ChunkScanner::new(&data, 0);
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_截断的块报错() {
        let mut data = Vec::new();
        data.extend_from_slice(b"REGN");
        data.extend_from_slice(&8u32.to_be_bytes());
        data.extend_from_slice(&[0u8; 3]);
        let err = count_elements(&data, 0).unwrap_err();
        assert!(matches!(
            err,
            ImuseError::Truncated {
                position: 8,
                needed: 8,
                available: 3
            }
        ));
    }

    #[test]
    fn test_缺少_data_报截断() {
        let mut data = Vec::new();
        push_chunk(&mut data, b"FRMT", &[0u8; 20]);
        assert!(matches!(
            count_elements(&data, 0),
            Err(ImuseError::Truncated { .. })
        ));
    }

    #[test]
    fn test_负载长度校验() {
        let chunk = Chunk {
            kind: ChunkKind::Jump,
            position: 0,
            payload: &[0u8; 4],
        };
        assert!(chunk.fields(16).is_err());
        assert!(chunk.fields(4).is_ok());
    }
}
