//! # imuse
//!
//! 纯 Rust 实现的 iMUS 音频资源管理器.
//!
//! 提供以下能力:
//! - **容器解析**: 两遍扫描 iMUS 分块头部 (格式、区域、跳转、同步标记)
//! - **槽位池**: 固定容量的音频句柄池, 带句柄校验与共享资源锁
//! - **导航**: 按 hook 查找跳转、解析跳转目标区域, 驱动自适应音乐的无缝衔接
//! - **数据读取**: 按区域边界截断的采样数据读取
//!
//! # 快速开始
//!
//! ```rust
//! use imuse::format::{ImusWriter, MemoryBundle, SoundResource};
//!
//! let data = ImusWriter::new()
//!     .format(16, 22050, 2)
//!     .region(100, 50)
//!     .jump(100, 100, 1, 0)
//!     .finish();
//!
//! let mut bundle = MemoryBundle::new();
//! bundle.insert_named("theme.imu", SoundResource::new(data));
//!
//! let mut manager = imuse::default_sound_manager(bundle);
//! let handle = manager.open_sound(1, "theme.imu", 1, 0, 0).unwrap().unwrap();
//! assert_eq!(manager.freq(handle), 22050);
//! assert_eq!(manager.jump_for_region_and_hook(handle, 0, 1), Some(0));
//! manager.close_sound(handle);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `imuse-core` | 错误类型与 FourCC 标签 |
//! | `imuse-format` | 容器解析、槽位池、导航与数据读取 |

/// 核心类型与错误
pub use imuse_core as core;

/// 容器解析与音频管理
pub use imuse_format as format;

/// 获取 imuse 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建使用默认配置的音频管理器
pub fn default_sound_manager(
    bundle: impl imuse_format::BundleReader + 'static,
) -> imuse_format::SoundManager {
    imuse_format::SoundManager::with_bundle(Box::new(bundle))
}
