//! 区域数据读取.
//!
//! 计算读取请求在区域内经过边界截断后的起点与长度, 并更新区域结束标志.
//! 截断条件为 `offset + size + data_offset > region.length`, 其中 `data_offset`
//! 作为加项参与比较; 区域/跳转的无缝衔接依赖这一边界, 不可改写.
//! 只有最终的读取位置 `region.offset - data_offset + offset` 为负时才视为损坏.

use bytes::Bytes;

use imuse_core::{ImuseError, ImuseResult};

use crate::descriptor::SoundDescriptor;
use crate::header::Region;

/// 截断后的读取范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    /// 相对采样数据起始的读取位置 (区域起点 + 请求偏移)
    pub position: u64,
    /// 截断后的读取长度
    pub size: usize,
    /// 是否到达区域末尾
    pub end_of_region: bool,
}

/// 区域读取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRead {
    /// 实际取得的数据
    pub data: Bytes,
    /// 实际长度
    pub size: usize,
    /// 是否到达区域末尾
    pub end_of_region: bool,
}

impl RegionSpan {
    /// 计算区域内的读取范围
    ///
    /// 区域起点 `region.offset - data_offset` 可以为负, 只要加上 `offset`
    /// 后的实际读取位置不在采样数据起点之前即可.
    pub fn clamp(
        region: &Region,
        data_offset: usize,
        offset: usize,
        size: usize,
    ) -> ImuseResult<Self> {
        let (size, end_of_region) = clamp_size(region, data_offset, offset, size);
        Ok(Self {
            position: fetch_position(region, data_offset, offset)?,
            size,
            end_of_region,
        })
    }
}

/// 按区域长度截断读取长度, 返回 (长度, 是否到达区域末尾)
fn clamp_size(region: &Region, data_offset: usize, offset: usize, size: usize) -> (usize, bool) {
    let length = u64::from(region.length);
    let requested_end = offset as u64 + size as u64 + data_offset as u64;
    if requested_end > length {
        (length.saturating_sub(offset as u64) as usize, true)
    } else {
        (size, false)
    }
}

/// 相对采样数据起始的读取位置
fn fetch_position(region: &Region, data_offset: usize, offset: usize) -> ImuseResult<u64> {
    let position = i128::from(region.offset) - data_offset as i128 + offset as i128;
    u64::try_from(position).map_err(|_| {
        ImuseError::InvalidData(format!(
            "读取位置位于采样数据起点之前: 区域偏移 {}, 数据偏移 {}, 请求偏移 {}",
            region.offset, data_offset, offset
        ))
    })
}

impl SoundDescriptor {
    /// 计算读取范围并更新区域结束标志
    ///
    /// 结束标志在校验读取位置之前更新, 读取位置非法时同样反映本次请求.
    ///
    /// # Panics
    /// 区域下标越界时 panic.
    pub(crate) fn prepare_region_read(
        &mut self,
        region: usize,
        offset: usize,
        size: usize,
    ) -> ImuseResult<RegionSpan> {
        let region = *self.region(region);
        let data_offset = self.header.data_offset;
        let (size, end_of_region) = clamp_size(&region, data_offset, offset, size);
        self.end_flag = end_of_region;
        Ok(RegionSpan {
            position: fetch_position(&region, data_offset, offset)?,
            size,
            end_of_region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_OFFSET: usize = 100;

    fn region() -> Region {
        Region {
            offset: 300,
            length: 1000,
        }
    }

    #[test]
    fn test_未越界时长度不变() {
        // 0 + 900 + 100 == 1000, 恰好不越界
        let span = RegionSpan::clamp(&region(), DATA_OFFSET, 0, 900).unwrap();
        assert_eq!(
            span,
            RegionSpan {
                position: 200,
                size: 900,
                end_of_region: false
            }
        );
    }

    #[test]
    fn test_越界时截断到区域长度减偏移() {
        let span = RegionSpan::clamp(&region(), DATA_OFFSET, 400, 600).unwrap();
        assert_eq!(span.size, 600);
        assert!(span.end_of_region);
        assert_eq!(span.position, 600);

        // 400 + 501 + 100 > 1000
        let span = RegionSpan::clamp(&region(), DATA_OFFSET, 400, 501).unwrap();
        assert_eq!(span.size, 1000 - 400);
        assert!(span.end_of_region);

        let span = RegionSpan::clamp(&region(), DATA_OFFSET, 400, 500).unwrap();
        assert_eq!(span.size, 500);
        assert!(!span.end_of_region);
    }

    #[test]
    fn test_偏移超过区域长度() {
        let span = RegionSpan::clamp(&region(), DATA_OFFSET, 1200, 10).unwrap();
        assert_eq!(span.size, 0);
        assert!(span.end_of_region);
    }

    #[test]
    fn test_区域起点早于数据区但读取位置合法() {
        let low = Region {
            offset: 50,
            length: 1000,
        };
        // 50 - 100 + 60 = 10
        let span = RegionSpan::clamp(&low, DATA_OFFSET, 60, 10).unwrap();
        assert_eq!(
            span,
            RegionSpan {
                position: 10,
                size: 10,
                end_of_region: false
            }
        );
    }

    #[test]
    fn test_读取位置早于数据区() {
        let low = Region {
            offset: 50,
            length: 1000,
        };
        assert!(matches!(
            RegionSpan::clamp(&low, DATA_OFFSET, 0, 1),
            Err(ImuseError::InvalidData(_))
        ));
    }

    fn low_region_descriptor() -> SoundDescriptor {
        use crate::bundle::SoundResource;
        use crate::header::SoundHeader;
        use crate::writer::ImusWriter;

        // 数据偏移 = 16 + FRMT(28) + REGN(16) + DATA 头(8) = 68
        let data = ImusWriter::new()
            .format(16, 22050, 1)
            .region(50, 1000)
            .samples(vec![0u8; 200])
            .finish();
        let header = SoundHeader::parse(&data).unwrap();
        assert_eq!(header.data_offset, 68);
        SoundDescriptor::new(1, "", 1, 0, 0, header, SoundResource::new(data))
    }

    #[test]
    fn test_低偏移区域的读取与结束标志() {
        let mut desc = low_region_descriptor();

        // 990 + 100 + 68 > 1000, 截断为 10 字节
        let span = desc.prepare_region_read(0, 990, 100).unwrap();
        // 50 - 68 + 990
        assert_eq!(span.position, 972);
        assert_eq!(span.size, 10);
        assert!(desc.is_end_of_region(0));

        // 40 + 10 + 68 <= 1000
        let span = desc.prepare_region_read(0, 40, 10).unwrap();
        assert_eq!(span.position, 22);
        assert_eq!(span.size, 10);
        assert!(!desc.is_end_of_region(0));
    }

    #[test]
    fn test_读取位置非法时仍更新结束标志() {
        let mut desc = low_region_descriptor();
        desc.prepare_region_read(0, 990, 100).unwrap();
        assert!(desc.is_end_of_region(0));

        // 50 - 68 + 0 < 0
        assert!(matches!(
            desc.prepare_region_read(0, 0, 1),
            Err(ImuseError::InvalidData(_))
        ));
        assert!(!desc.is_end_of_region(0));
    }
}
