//! iMUS 资源头部解析.
//!
//! 资源结构:
//! ```text
//! "iMUS" + size(BE32) + "MAP " + map_size(BE32)        -- 16 字节前导区, 本库不解释
//! FRMT:  tag + len + 8 字节保留 + bits(BE32) + rate(BE32) + channels(BE32)
//! TEXT:  tag + len + 文本
//! REGN:  tag + len + offset(BE32) + length(BE32)
//! JUMP:  tag + len + offset(BE32) + dest(BE32) + hook_id(BE32) + fade_delay(BE32)
//! SYNC:  tag + len + 不透明同步数据
//! STOP:  tag + len + ...
//! DATA:  tag + len                                      -- 之后即为采样数据
//! ```

use log::debug;

use imuse_core::{FourCc, ImuseError, ImuseResult};

use crate::chunk::{Chunk, ChunkKind, ChunkScanner, ElementCounts, count_elements};

/// 魔数与容器簿记字段所占的前导区大小 (从资源起始计)
pub const PREAMBLE_SIZE: usize = 16;

/// FRMT 负载: 8 字节保留 + 3 个 BE32 字段
pub const FORMAT_PAYLOAD_SIZE: usize = 20;
/// REGN 负载: offset + length
pub const REGION_PAYLOAD_SIZE: usize = 8;
/// JUMP 负载: offset + dest + hook_id + fade_delay
pub const JUMP_PAYLOAD_SIZE: usize = 16;

/// 区域: 采样数据中的一段可播放范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    /// 区域起始偏移 (资源内绝对字节偏移)
    pub offset: u32,
    /// 区域长度 (字节)
    pub length: u32,
}

/// 跳转: 播放到 `offset` 所在区域时, 按 hook 选择跳往 `dest` 所在区域
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jump {
    /// 触发位置, 与某个区域的 offset 相同
    pub offset: u32,
    /// 目标位置, 与另一个区域的 offset 相同
    pub dest: u32,
    /// hook 标识, 用于在同一区域的多个跳转中选择
    pub hook_id: u32,
    /// 淡出延迟
    pub fade_delay: u32,
}

/// 同步标记: 独立持有的不透明缓冲区
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMarker(pub Vec<u8>);

impl SyncMarker {
    /// 数据字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 数据长度
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 解析后的资源头部
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundHeader {
    /// 位深
    pub bits: u32,
    /// 采样率
    pub freq: u32,
    /// 声道数
    pub channels: u32,
    /// 采样数据在资源中的起始偏移
    pub data_offset: usize,
    /// 区域表
    pub regions: Vec<Region>,
    /// 跳转表
    pub jumps: Vec<Jump>,
    /// 同步标记表
    pub syncs: Vec<SyncMarker>,
    /// TEXT 块内容
    pub texts: Vec<String>,
}

impl SoundHeader {
    /// 解析完整资源头部
    ///
    /// 校验魔数, 跳过前导区, 计数扫描后按数量分配表, 再填充扫描.
    pub fn parse(data: &[u8]) -> ImuseResult<Self> {
        if data.len() < 4 || data[0..4] != *FourCc::IMUS.as_bytes() {
            let magic = data.get(0..4).map(|m| String::from_utf8_lossy(m).into_owned());
            return Err(ImuseError::InvalidData(format!(
                "未知的音频资源格式, 魔数: {:?}",
                magic.unwrap_or_default()
            )));
        }
        if data.len() < PREAMBLE_SIZE {
            return Err(ImuseError::Truncated {
                position: 0,
                needed: PREAMBLE_SIZE,
                available: data.len(),
            });
        }

        let counts = count_elements(data, PREAMBLE_SIZE)?;
        let mut header = Self::with_counts(counts);
        header.populate(data)?;

        debug!(
            "iMUS 头部: {} 位, {} Hz, {} 声道, 区域={}, 跳转={}, 同步={}, 数据偏移={}",
            header.bits,
            header.freq,
            header.channels,
            header.regions.len(),
            header.jumps.len(),
            header.syncs.len(),
            header.data_offset,
        );
        Ok(header)
    }

    /// 按计数结果分配大小恰好的表
    fn with_counts(counts: ElementCounts) -> Self {
        Self {
            regions: vec![Region::default(); counts.regions],
            jumps: vec![Jump::default(); counts.jumps],
            syncs: vec![SyncMarker::default(); counts.syncs],
            ..Self::default()
        }
    }

    /// 填充扫描: 各表独立维护下一个空闲下标
    fn populate(&mut self, data: &[u8]) -> ImuseResult<()> {
        let mut cur_region = 0;
        let mut cur_jump = 0;
        let mut cur_sync = 0;

        let mut scanner = ChunkScanner::new(data, PREAMBLE_SIZE);
        while let Some(chunk) = scanner.next_chunk()? {
            match chunk.kind {
                ChunkKind::Format => {
                    let p = chunk.fields(FORMAT_PAYLOAD_SIZE)?;
                    self.bits = Chunk::be_u32(p, 2);
                    self.freq = Chunk::be_u32(p, 3);
                    self.channels = Chunk::be_u32(p, 4);
                }
                ChunkKind::Text => {
                    let text = String::from_utf8_lossy(chunk.payload);
                    self.texts.push(text.trim_end_matches('\0').to_string());
                }
                ChunkKind::Stop | ChunkKind::Data => {}
                ChunkKind::Region => {
                    let p = chunk.fields(REGION_PAYLOAD_SIZE)?;
                    let entry = table_slot(&mut self.regions, cur_region, &chunk)?;
                    entry.offset = Chunk::be_u32(p, 0);
                    entry.length = Chunk::be_u32(p, 1);
                    cur_region += 1;
                }
                ChunkKind::Jump => {
                    let p = chunk.fields(JUMP_PAYLOAD_SIZE)?;
                    let entry = table_slot(&mut self.jumps, cur_jump, &chunk)?;
                    entry.offset = Chunk::be_u32(p, 0);
                    entry.dest = Chunk::be_u32(p, 1);
                    entry.hook_id = Chunk::be_u32(p, 2);
                    entry.fade_delay = Chunk::be_u32(p, 3);
                    cur_jump += 1;
                }
                ChunkKind::Sync => {
                    let entry = table_slot(&mut self.syncs, cur_sync, &chunk)?;
                    entry.0 = chunk.payload.to_vec();
                    cur_sync += 1;
                }
            }
        }

        if cur_region != self.regions.len()
            || cur_jump != self.jumps.len()
            || cur_sync != self.syncs.len()
        {
            return Err(ImuseError::Internal(format!(
                "填充扫描与计数扫描不一致: 区域 {}/{}, 跳转 {}/{}, 同步 {}/{}",
                cur_region,
                self.regions.len(),
                cur_jump,
                self.jumps.len(),
                cur_sync,
                self.syncs.len(),
            )));
        }

        self.data_offset = scanner.position();
        Ok(())
    }
}

/// 取预分配表中的第 `index` 项
fn table_slot<'t, T>(
    table: &'t mut [T],
    index: usize,
    chunk: &Chunk<'_>,
) -> ImuseResult<&'t mut T> {
    let len = table.len();
    table.get_mut(index).ok_or_else(|| {
        ImuseError::Internal(format!(
            "{} 块数量超出预分配的 {} 项 (偏移 {})",
            chunk.kind.tag(),
            len,
            chunk.position,
        ))
    })
}
