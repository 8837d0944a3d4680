//! 音频描述符.
//!
//! 每个已打开的音频对应一个描述符, 由槽位池独占持有.

use crate::bundle::SoundResource;
use crate::header::SoundHeader;

/// 已打开音频的内存表示
#[derive(Debug, Clone)]
pub struct SoundDescriptor {
    /// 调用方给出的音频编号 (不同槽位可以重复)
    pub sound_id: i32,
    /// 资源名称, 空串表示按编号打开
    pub name: String,
    /// 音频类型
    pub sound_type: i32,
    /// 音量组
    pub volume_group: i32,
    /// 所在磁盘编号
    pub disk: i32,
    /// 解析出的头部 (格式参数与区域/跳转/同步表)
    pub header: SoundHeader,
    /// 原始资源字节
    pub(crate) resource: SoundResource,
    /// 是否持有外部资源锁
    pub(crate) locked: bool,
    /// 最近一次区域读取是否到达区域末尾
    pub(crate) end_flag: bool,
}

impl SoundDescriptor {
    pub(crate) fn new(
        sound_id: i32,
        name: &str,
        sound_type: i32,
        volume_group: i32,
        disk: i32,
        header: SoundHeader,
        resource: SoundResource,
    ) -> Self {
        Self {
            sound_id,
            name: name.to_string(),
            sound_type,
            volume_group,
            disk,
            header,
            resource,
            locked: false,
            end_flag: false,
        }
    }

    /// 位深
    pub fn bits(&self) -> u32 {
        self.header.bits
    }

    /// 采样率
    pub fn freq(&self) -> u32 {
        self.header.freq
    }

    /// 声道数
    pub fn channels(&self) -> u32 {
        self.header.channels
    }

    /// 采样数据起始偏移
    pub fn data_offset(&self) -> usize {
        self.header.data_offset
    }

    pub fn num_regions(&self) -> usize {
        self.header.regions.len()
    }

    pub fn num_jumps(&self) -> usize {
        self.header.jumps.len()
    }

    pub fn num_syncs(&self) -> usize {
        self.header.syncs.len()
    }

    /// 是否持有外部资源锁
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// 原始资源
    pub fn resource(&self) -> &SoundResource {
        &self.resource
    }
}
