//! 资源包读取抽象.
//!
//! 管理器通过 [`BundleReader`] 按名称或编号获取音频资源的原始字节,
//! 取不到资源属于可恢复情况 (返回 `Ok(None)`).

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use log::{debug, warn};

use imuse_core::{ImuseError, ImuseResult};

/// 按编号查找时使用的文件扩展名
pub const ID_FILE_EXTENSION: &str = "imx";

/// 资源查找键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKey<'a> {
    /// 按名称查找
    Name(&'a str),
    /// 按编号查找
    Id(i32),
}

impl<'a> SoundKey<'a> {
    /// 名称为空时按编号查找, 否则按名称
    pub fn from_identity(sound_id: i32, name: &'a str) -> Self {
        if name.is_empty() {
            Self::Id(sound_id)
        } else {
            Self::Name(name)
        }
    }
}

impl fmt::Display for SoundKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// 获取到的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundResource {
    /// 完整资源字节 (头部 + 采样数据)
    pub data: Bytes,
    /// 是否为引擎常驻资源 (需要通过资源锁保持驻留)
    pub resident: bool,
}

impl SoundResource {
    /// 来自资源包的普通资源
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            resident: false,
        }
    }

    /// 引擎常驻资源
    pub fn resident(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            resident: true,
        }
    }
}

/// 资源包读取器 trait
///
/// 实现此 trait 以支持不同的资源来源 (归档包、目录、内存等).
pub trait BundleReader: Send {
    /// 获取资源, 不存在时返回 `Ok(None)`
    fn fetch(&mut self, key: SoundKey<'_>) -> ImuseResult<Option<SoundResource>>;
}

/// 内存资源包
///
/// 用于测试和内存中处理.
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    by_name: HashMap<String, SoundResource>,
    by_id: HashMap<i32, SoundResource>,
}

impl MemoryBundle {
    /// 创建空资源包
    pub fn new() -> Self {
        Self::default()
    }

    /// 按名称登记资源
    pub fn insert_named(&mut self, name: impl Into<String>, resource: SoundResource) {
        self.by_name.insert(name.into(), resource);
    }

    /// 按编号登记资源
    pub fn insert_id(&mut self, sound_id: i32, resource: SoundResource) {
        self.by_id.insert(sound_id, resource);
    }

    /// 已登记的资源数
    pub fn len(&self) -> usize {
        self.by_name.len() + self.by_id.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BundleReader for MemoryBundle {
    fn fetch(&mut self, key: SoundKey<'_>) -> ImuseResult<Option<SoundResource>> {
        let found = match key {
            SoundKey::Name(name) => self.by_name.get(name),
            SoundKey::Id(id) => self.by_id.get(&id),
        };
        Ok(found.cloned())
    }
}

/// 目录资源包
///
/// 按名称查找 `<root>/<name>`, 按编号查找 `<root>/<id>.imx`.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
    resident: bool,
}

impl DirectoryBundle {
    /// 以目录为根创建资源包
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resident: false,
        }
    }

    /// 读出的资源标记为常驻资源
    pub fn with_resident(mut self, resident: bool) -> Self {
        self.resident = resident;
        self
    }

    fn resolve(&self, key: SoundKey<'_>) -> ImuseResult<PathBuf> {
        match key {
            SoundKey::Name(name) => {
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
                    _ => Err(ImuseError::InvalidArgument(format!(
                        "资源名称必须是单个文件名: {name}"
                    ))),
                }
            }
            SoundKey::Id(id) => Ok(self.root.join(format!("{id}.{ID_FILE_EXTENSION}"))),
        }
    }
}

impl BundleReader for DirectoryBundle {
    fn fetch(&mut self, key: SoundKey<'_>) -> ImuseResult<Option<SoundResource>> {
        let path = self.resolve(key)?;
        match std::fs::read(&path) {
            Ok(data) => {
                debug!("读取资源 {}: {} ({} 字节)", key, path.display(), data.len());
                Ok(Some(SoundResource {
                    data: Bytes::from(data),
                    resident: self.resident,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("资源 {} 不存在: {}", key, path.display());
                Ok(None)
            }
            Err(e) => Err(ImuseError::Io(e)),
        }
    }
}
