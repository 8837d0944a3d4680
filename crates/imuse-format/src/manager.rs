//! 音频槽位池.
//!
//! 固定容量的描述符槽位表, 负责打开/关闭/克隆/校验音频句柄,
//! 并对外提供基于句柄的导航与区域数据读取接口.
//!
//! 错误分类:
//! - 前置条件违例 (非法编号/类型, 下标越界, 无效句柄): 调用方错误, 直接 panic
//! - 资源损坏 (魔数错误, 未知块): 返回错误, 槽位在返回前释放
//! - 资源不存在: 返回 `Ok(None)`, 槽位释放
//! - 槽位耗尽: 返回 [`ImuseError::PoolExhausted`]

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, warn};

use imuse_core::{ImuseError, ImuseResult};

use crate::bundle::{BundleReader, SoundKey};
use crate::config::SoundManagerConfig;
use crate::decoder::{RawSliceDecoder, SampleDecoder};
use crate::descriptor::SoundDescriptor;
use crate::extractor::RegionRead;
use crate::header::{SoundHeader, SyncMarker};
use crate::lock::{RefCountLocker, ResourceLocker};

/// 管理器实例编号, 用于识别其他管理器的句柄
static NEXT_MANAGER_ID: AtomicU32 = AtomicU32::new(1);

/// 多线程共享的管理器
pub type SharedSoundManager = Arc<Mutex<SoundManager>>;

/// 音频句柄
///
/// 只在创建它的管理器中有效; 槽位被关闭后旧句柄随即失效.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    manager: u32,
    slot: usize,
    generation: u32,
}

impl SoundHandle {
    /// 槽位下标
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// 槽位
#[derive(Debug, Default)]
struct SoundSlot {
    /// 每次释放后递增, 使旧句柄失效
    generation: u32,
    sound: Option<SoundDescriptor>,
}

/// 音频资源管理器
pub struct SoundManager {
    id: u32,
    slots: Vec<SoundSlot>,
    /// 空闲槽位, 总是先分配下标最小的槽位
    free: BinaryHeap<Reverse<usize>>,
    bundle: Box<dyn BundleReader>,
    locker: Box<dyn ResourceLocker>,
    decoder: Box<dyn SampleDecoder>,
}

impl SoundManager {
    /// 以给定配置与协作组件创建管理器
    pub fn new(
        config: &SoundManagerConfig,
        bundle: Box<dyn BundleReader>,
        locker: Box<dyn ResourceLocker>,
        decoder: Box<dyn SampleDecoder>,
    ) -> ImuseResult<Self> {
        config.validate()?;
        Ok(Self::build(config.max_sounds, bundle, locker, decoder))
    }

    /// 使用默认配置、引用计数锁和切片解码器创建管理器
    pub fn with_bundle(bundle: Box<dyn BundleReader>) -> Self {
        Self::build(
            SoundManagerConfig::default().max_sounds,
            bundle,
            Box::new(RefCountLocker::new()),
            Box::new(RawSliceDecoder),
        )
    }

    fn build(
        capacity: usize,
        bundle: Box<dyn BundleReader>,
        locker: Box<dyn ResourceLocker>,
        decoder: Box<dyn SampleDecoder>,
    ) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            slots: (0..capacity).map(|_| SoundSlot::default()).collect(),
            free: (0..capacity).map(Reverse).collect(),
            bundle,
            locker,
            decoder,
        }
    }

    /// 转为多线程共享的管理器
    pub fn into_shared(self) -> SharedSoundManager {
        Arc::new(Mutex::new(self))
    }

    /// 槽位池容量
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 已打开的音频数
    pub fn open_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// 所有已打开音频的句柄
    pub fn handles(&self) -> impl Iterator<Item = SoundHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, s)| {
            s.sound.as_ref().map(|_| SoundHandle {
                manager: self.id,
                slot,
                generation: s.generation,
            })
        })
    }

    // ========================
    // 槽位管理
    // ========================

    /// 分配空闲槽位
    fn allocate_slot(&mut self) -> ImuseResult<usize> {
        self.free
            .pop()
            .map(|Reverse(slot)| slot)
            .ok_or(ImuseError::PoolExhausted(self.slots.len()))
    }

    /// 清空并归还槽位
    fn release_slot(&mut self, slot: usize) {
        let entry = &mut self.slots[slot];
        entry.sound = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(Reverse(slot));
    }

    /// 除 `except` 外是否还有持锁的槽位使用该 sound_id
    fn lock_shared(&self, sound_id: i32, except: Option<usize>) -> bool {
        self.slots.iter().enumerate().any(|(i, s)| {
            Some(i) != except
                && s.sound
                    .as_ref()
                    .is_some_and(|d| d.locked && d.sound_id == sound_id)
        })
    }

    /// 校验句柄: 必须指向本管理器中正在使用的槽位
    pub fn validate(&self, handle: SoundHandle) -> bool {
        handle.manager == self.id
            && self
                .slots
                .get(handle.slot)
                .is_some_and(|s| s.sound.is_some() && s.generation == handle.generation)
    }

    /// 句柄对应的描述符
    ///
    /// # Panics
    /// 句柄无效时 panic.
    pub fn sound(&self, handle: SoundHandle) -> &SoundDescriptor {
        self.slots
            .get(handle.slot)
            .filter(|s| handle.manager == self.id && s.generation == handle.generation)
            .and_then(|s| s.sound.as_ref())
            .unwrap_or_else(|| panic!("无效的音频句柄: {handle:?}"))
    }

    fn sound_mut(&mut self, handle: SoundHandle) -> &mut SoundDescriptor {
        let id = self.id;
        self.slots
            .get_mut(handle.slot)
            .filter(|s| handle.manager == id && s.generation == handle.generation)
            .and_then(|s| s.sound.as_mut())
            .unwrap_or_else(|| panic!("无效的音频句柄: {handle:?}"))
    }

    // ========================
    // 打开/关闭
    // ========================

    /// 打开音频
    ///
    /// `name` 为空时按 `sound_id` 获取资源. 资源不存在时返回 `Ok(None)`.
    ///
    /// # Panics
    /// `sound_id < 0` 或 `sound_type == 0` 时 panic.
    pub fn open_sound(
        &mut self,
        sound_id: i32,
        name: &str,
        sound_type: i32,
        volume_group: i32,
        disk: i32,
    ) -> ImuseResult<Option<SoundHandle>> {
        assert!(sound_id >= 0, "非法的音频编号: {sound_id}");
        assert!(sound_type != 0, "未指定音频类型: {sound_id}/{name}");

        let slot = self.allocate_slot().inspect_err(|e| error!("{e}"))?;
        let key = SoundKey::from_identity(sound_id, name);

        let resource = match self.bundle.fetch(key) {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                warn!("无法获取音频资源 {}, 跳过", key);
                self.release_slot(slot);
                return Ok(None);
            }
            Err(e) => {
                self.release_slot(slot);
                return Err(e);
            }
        };

        let header = match SoundHeader::parse(&resource.data) {
            Ok(header) => header,
            Err(e) => {
                error!("解析音频资源 {} ({}) 失败: {}", key, sound_id, e);
                self.release_slot(slot);
                return Err(e);
            }
        };

        let mut desc = SoundDescriptor::new(
            sound_id,
            name,
            sound_type,
            volume_group,
            disk,
            header,
            resource,
        );
        if desc.resource.resident {
            if !self.lock_shared(sound_id, None) {
                self.locker.lock(sound_id);
            }
            desc.locked = true;
        }

        let entry = &mut self.slots[slot];
        entry.sound = Some(desc);
        let handle = SoundHandle {
            manager: self.id,
            slot,
            generation: entry.generation,
        };
        debug!("打开音频 {} -> 槽位 {}", key, slot);
        Ok(Some(handle))
    }

    /// 关闭音频, 释放表和同步缓冲区并归还槽位
    ///
    /// 持有资源锁且没有其他槽位共享该 sound_id 时释放外部锁.
    ///
    /// # Panics
    /// 句柄无效时 panic.
    pub fn close_sound(&mut self, handle: SoundHandle) {
        assert!(self.validate(handle), "无效的音频句柄: {handle:?}");

        let (sound_id, locked) = {
            let desc = self.sound(handle);
            (desc.sound_id, desc.locked)
        };
        if locked && !self.lock_shared(sound_id, Some(handle.slot)) {
            self.locker.unlock(sound_id);
        }
        self.release_slot(handle.slot);
        debug!("关闭音频 #{} (槽位 {})", sound_id, handle.slot);
    }

    /// 关闭全部已打开的音频
    pub fn close_all(&mut self) {
        let handles: Vec<SoundHandle> = self.handles().collect();
        for handle in handles {
            self.close_sound(handle);
        }
    }

    /// 以相同身份信息重新打开, 得到独立的描述符
    ///
    /// # Panics
    /// 句柄无效时 panic.
    pub fn clone_sound(&mut self, handle: SoundHandle) -> ImuseResult<Option<SoundHandle>> {
        let desc = self.sound(handle);
        let (sound_id, name, sound_type, volume_group, disk) = (
            desc.sound_id,
            desc.name.clone(),
            desc.sound_type,
            desc.volume_group,
            desc.disk,
        );
        self.open_sound(sound_id, &name, sound_type, volume_group, disk)
    }

    // ========================
    // 格式查询
    // ========================

    pub fn freq(&self, handle: SoundHandle) -> u32 {
        self.sound(handle).freq()
    }

    pub fn bits(&self, handle: SoundHandle) -> u32 {
        self.sound(handle).bits()
    }

    pub fn channels(&self, handle: SoundHandle) -> u32 {
        self.sound(handle).channels()
    }

    pub fn num_regions(&self, handle: SoundHandle) -> usize {
        self.sound(handle).num_regions()
    }

    pub fn num_jumps(&self, handle: SoundHandle) -> usize {
        self.sound(handle).num_jumps()
    }

    pub fn num_syncs(&self, handle: SoundHandle) -> usize {
        self.sound(handle).num_syncs()
    }

    // ========================
    // 导航
    // ========================

    /// 区域起始偏移
    pub fn region_offset(&self, handle: SoundHandle, region: usize) -> u32 {
        debug!("region_offset: region={}", region);
        self.sound(handle).region_offset(region)
    }

    /// 区域长度
    pub fn region_length(&self, handle: SoundHandle, region: usize) -> u32 {
        self.sound(handle).region_length(region)
    }

    /// 按区域和 hook 查找跳转
    pub fn jump_for_region_and_hook(
        &self,
        handle: SoundHandle,
        region: usize,
        hook_id: u32,
    ) -> Option<usize> {
        debug!("jump_for_region_and_hook: region={}, hook={}", region, hook_id);
        self.sound(handle).jump_for_region_and_hook(region, hook_id)
    }

    /// 跳转目标所在区域, 目标悬空时返回 None
    pub fn region_for_jump_destination(&self, handle: SoundHandle, jump: usize) -> Option<usize> {
        debug!("region_for_jump_destination: jump={}", jump);
        let found = self.sound(handle).region_for_jump_destination(jump);
        if found.is_none() {
            warn!("跳转 {} 的目标不对应任何区域", jump);
        }
        found
    }

    pub fn jump_hook_id(&self, handle: SoundHandle, jump: usize) -> u32 {
        debug!("jump_hook_id: jump={}", jump);
        self.sound(handle).jump_hook_id(jump)
    }

    pub fn jump_fade_delay(&self, handle: SoundHandle, jump: usize) -> u32 {
        debug!("jump_fade_delay: jump={}", jump);
        self.sound(handle).jump_fade_delay(jump)
    }

    /// 最近一次区域读取是否到达末尾, 须在读取 `region` 后立即调用
    pub fn is_end_of_region(&self, handle: SoundHandle, region: usize) -> bool {
        self.sound(handle).is_end_of_region(region)
    }

    /// 第 `index` 个同步标记
    pub fn sync_marker(&self, handle: SoundHandle, index: usize) -> &SyncMarker {
        self.sound(handle).sync_marker(index)
    }

    // ========================
    // 数据读取
    // ========================

    /// 读取区域数据
    ///
    /// 请求超出区域边界时截断并置位区域结束标志.
    ///
    /// # Panics
    /// 句柄无效或区域下标越界时 panic.
    pub fn read_region_data(
        &mut self,
        handle: SoundHandle,
        region: usize,
        offset: usize,
        size: usize,
    ) -> ImuseResult<RegionRead> {
        let desc = self.sound_mut(handle);
        debug!(
            "read_region_data: region={}, offset={}, size={}, regions={}",
            region,
            offset,
            size,
            desc.num_regions()
        );
        let span = desc.prepare_region_read(region, offset, size)?;
        let desc = self.sound(handle);
        let data = self
            .decoder
            .decode(&desc.resource, desc.header.data_offset, span.position, span.size)?;
        Ok(RegionRead {
            size: data.len(),
            data,
            end_of_region: span.end_of_region,
        })
    }
}

impl Drop for SoundManager {
    fn drop(&mut self) {
        self.close_all();
    }
}
