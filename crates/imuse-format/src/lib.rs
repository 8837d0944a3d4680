//! # imuse-format
//!
//! iMUS 音频资源管理库: 解析分块的 iMUS 容器头部, 管理固定容量的音频槽位池,
//! 并提供区域/跳转/同步标记导航与区域数据读取.
//!
//! 典型流程:
//! ```text
//! open_sound → 分配槽位 → BundleReader 获取字节 → 计数扫描 → 分配表 → 填充扫描
//!            → 导航/读取 (navigator / extractor) → close_sound 回收槽位
//! ```

pub mod bundle;
pub mod chunk;
pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod extractor;
pub mod header;
pub mod lock;
pub mod manager;
pub mod navigator;
pub mod writer;

// 重导出常用类型
pub use bundle::{BundleReader, DirectoryBundle, MemoryBundle, SoundKey, SoundResource};
pub use chunk::{Chunk, ChunkKind, ChunkScanner, ElementCounts};
pub use config::SoundManagerConfig;
pub use decoder::{RawSliceDecoder, SampleDecoder};
pub use descriptor::SoundDescriptor;
pub use extractor::{RegionRead, RegionSpan};
pub use header::{Jump, Region, SoundHeader, SyncMarker};
pub use lock::{RefCountLocker, ResourceLocker};
pub use manager::{SharedSoundManager, SoundHandle, SoundManager};
pub use writer::ImusWriter;
