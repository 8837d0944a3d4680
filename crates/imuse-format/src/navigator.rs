//! 区域/跳转导航.
//!
//! 对描述符表的只读查询. 下标越界属于调用方错误, 直接 panic;
//! 查找不到匹配项 (如跳转目标悬空) 则返回 `None`, 由调用方决定如何降级.

use crate::descriptor::SoundDescriptor;
use crate::header::{Jump, Region, SyncMarker};

impl SoundDescriptor {
    /// 第 `region` 个区域
    ///
    /// # Panics
    /// 下标越界时 panic.
    pub fn region(&self, region: usize) -> &Region {
        assert!(
            region < self.header.regions.len(),
            "区域下标越界: {} (共 {} 个区域)",
            region,
            self.header.regions.len()
        );
        &self.header.regions[region]
    }

    /// 第 `jump` 个跳转
    ///
    /// # Panics
    /// 下标越界时 panic.
    pub fn jump(&self, jump: usize) -> &Jump {
        assert!(
            jump < self.header.jumps.len(),
            "跳转下标越界: {} (共 {} 个跳转)",
            jump,
            self.header.jumps.len()
        );
        &self.header.jumps[jump]
    }

    /// 第 `index` 个同步标记
    ///
    /// # Panics
    /// 下标越界时 panic.
    pub fn sync_marker(&self, index: usize) -> &SyncMarker {
        assert!(
            index < self.header.syncs.len(),
            "同步标记下标越界: {} (共 {} 个)",
            index,
            self.header.syncs.len()
        );
        &self.header.syncs[index]
    }

    /// 区域起始偏移
    pub fn region_offset(&self, region: usize) -> u32 {
        self.region(region).offset
    }

    /// 区域长度
    pub fn region_length(&self, region: usize) -> u32 {
        self.region(region).length
    }

    /// 查找从 `region` 出发且 hook 为 `hook_id` 的第一个跳转
    ///
    /// 同一区域可以有多个跳转, 仅靠 hook 区分.
    pub fn jump_for_region_and_hook(&self, region: usize, hook_id: u32) -> Option<usize> {
        let offset = self.region(region).offset;
        self.header
            .jumps
            .iter()
            .position(|j| j.offset == offset && j.hook_id == hook_id)
    }

    /// 起始偏移为 `offset` 的第一个区域
    pub fn region_at_offset(&self, offset: u32) -> Option<usize> {
        self.header.regions.iter().position(|r| r.offset == offset)
    }

    /// 查找跳转目标所在的区域, 多个区域偏移相同时取第一个
    pub fn region_for_jump_destination(&self, jump: usize) -> Option<usize> {
        self.region_at_offset(self.jump(jump).dest)
    }

    /// 跳转的 hook 标识
    pub fn jump_hook_id(&self, jump: usize) -> u32 {
        self.jump(jump).hook_id
    }

    /// 跳转的淡出延迟
    pub fn jump_fade_delay(&self, jump: usize) -> u32 {
        self.jump(jump).fade_delay
    }

    /// 最近一次区域读取是否到达区域末尾
    ///
    /// 返回的是描述符上的瞬时标志, 只反映最近一次读取的结果,
    /// 须在读取 `region` 的数据后立即调用.
    pub fn is_end_of_region(&self, region: usize) -> bool {
        self.region(region);
        self.end_flag
    }
}
