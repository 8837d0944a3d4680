//! 管理器配置.

use std::path::Path;

use serde::{Deserialize, Serialize};

use imuse_core::{ImuseError, ImuseResult};

/// 默认的同时打开音频数上限
pub const DEFAULT_MAX_SOUNDS: usize = 16;

/// 音频管理器配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SoundManagerConfig {
    /// 槽位池容量, 即同时打开的音频数上限
    #[serde(default = "default_max_sounds")]
    pub max_sounds: usize,
}

fn default_max_sounds() -> usize {
    DEFAULT_MAX_SOUNDS
}

impl Default for SoundManagerConfig {
    fn default() -> Self {
        Self {
            max_sounds: DEFAULT_MAX_SOUNDS,
        }
    }
}

impl SoundManagerConfig {
    /// 指定容量的配置
    pub fn with_capacity(max_sounds: usize) -> Self {
        Self { max_sounds }
    }

    /// 从 JSON 文本解析并校验
    pub fn from_json_str(text: &str) -> ImuseResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ImuseError::Config(format!("解析配置失败: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> ImuseResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// 校验配置
    pub fn validate(&self) -> ImuseResult<()> {
        if self.max_sounds == 0 {
            return Err(ImuseError::Config("max_sounds 必须至少为 1".into()));
        }
        Ok(())
    }
}
