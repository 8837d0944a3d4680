//! 外部资源锁.
//!
//! 常驻资源在被打开期间需要保持锁定, 锁以 sound_id 为键.
//! 多个句柄可能指向同一个 sound_id, 由槽位池负责判断何时释放最后一个引用.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;

/// 资源锁 trait
pub trait ResourceLocker: Send {
    /// 锁定资源
    fn lock(&mut self, sound_id: i32);
    /// 解锁资源
    fn unlock(&mut self, sound_id: i32);
}

/// 引用计数资源锁
///
/// 克隆体共享同一张计数表, 便于在管理器之外观察锁状态.
#[derive(Debug, Clone, Default)]
pub struct RefCountLocker {
    counts: Arc<Mutex<HashMap<i32, u32>>>,
}

impl RefCountLocker {
    /// 创建空锁表
    pub fn new() -> Self {
        Self::default()
    }

    /// 资源当前的锁计数
    pub fn lock_count(&self, sound_id: i32) -> u32 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.get(&sound_id).copied().unwrap_or(0)
    }

    /// 资源是否被锁定
    pub fn is_locked(&self, sound_id: i32) -> bool {
        self.lock_count(sound_id) > 0
    }
}

impl ResourceLocker for RefCountLocker {
    fn lock(&mut self, sound_id: i32) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry(sound_id).or_insert(0) += 1;
    }

    fn unlock(&mut self, sound_id: i32) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        match counts.get_mut(&sound_id) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                counts.remove(&sound_id);
            }
            None => warn!("解锁未锁定的资源 #{}", sound_id),
        }
    }
}
