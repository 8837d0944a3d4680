//! 采样数据获取.
//!
//! 区域读取只负责计算起点与长度, 实际的解压/切片由 [`SampleDecoder`] 完成.

use bytes::Bytes;

use imuse_core::ImuseResult;

use crate::bundle::SoundResource;

/// 采样解码器 trait
pub trait SampleDecoder: Send {
    /// 从资源中取出采样数据
    ///
    /// - `header_size`: 头部大小 (采样数据起始偏移)
    /// - `position`: 相对采样数据起始的字节位置
    /// - `size`: 请求的字节数
    ///
    /// 返回实际取得的数据, 长度可能小于 `size`.
    fn decode(
        &self,
        resource: &SoundResource,
        header_size: usize,
        position: u64,
        size: usize,
    ) -> ImuseResult<Bytes>;
}

/// 未压缩 PCM 的零拷贝切片解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSliceDecoder;

impl SampleDecoder for RawSliceDecoder {
    fn decode(
        &self,
        resource: &SoundResource,
        header_size: usize,
        position: u64,
        size: usize,
    ) -> ImuseResult<Bytes> {
        let len = resource.data.len() as u64;
        let begin = header_size as u64 + position;
        if begin >= len {
            return Ok(Bytes::new());
        }
        let end = begin.saturating_add(size as u64).min(len);
        Ok(resource.data.slice(begin as usize..end as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_切片() {
        let resource = SoundResource::new((0u8..32).collect::<Vec<u8>>());
        let out = RawSliceDecoder.decode(&resource, 8, 4, 6).unwrap();
        assert_eq!(&out[..], &[12, 13, 14, 15, 16, 17]);
    }

    #[test]
    fn test_切片在资源末尾截断() {
        let resource = SoundResource::new(vec![0u8; 20]);
        assert_eq!(RawSliceDecoder.decode(&resource, 8, 10, 100).unwrap().len(), 2);
        assert!(RawSliceDecoder.decode(&resource, 8, 12, 4).unwrap().is_empty());
    }
}
