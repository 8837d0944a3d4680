//! iMUS 资源写入器.
//!
//! 按 `FRMT`, `TEXT`, `REGN`, `JUMP`, `SYNC`, `STOP`, `DATA` 的顺序生成资源,
//! 用于制作测试素材和基准数据.

use bytes::{BufMut, BytesMut};

use imuse_core::FourCc;

use crate::chunk::CHUNK_HEADER_SIZE;
use crate::header::{
    FORMAT_PAYLOAD_SIZE, JUMP_PAYLOAD_SIZE, Jump, PREAMBLE_SIZE, REGION_PAYLOAD_SIZE, Region,
};

/// 容器内 "MAP " 子块标签
const MAP_TAG: FourCc = FourCc::new(*b"MAP ");

/// iMUS 资源写入器
#[derive(Debug, Clone, Default)]
pub struct ImusWriter {
    /// 格式参数 (bits, freq, channels)
    format: Option<(u32, u32, u32)>,
    texts: Vec<String>,
    regions: Vec<Region>,
    jumps: Vec<Jump>,
    syncs: Vec<Vec<u8>>,
    stop: bool,
    samples: Vec<u8>,
    /// 区域/跳转偏移是否相对采样数据起始
    data_relative: bool,
}

impl ImusWriter {
    /// 创建空写入器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置格式参数
    pub fn format(mut self, bits: u32, freq: u32, channels: u32) -> Self {
        self.format = Some((bits, freq, channels));
        self
    }

    /// 追加 TEXT 块
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.texts.push(text.into());
        self
    }

    /// 追加区域
    pub fn region(mut self, offset: u32, length: u32) -> Self {
        self.regions.push(Region { offset, length });
        self
    }

    /// 追加跳转
    pub fn jump(mut self, offset: u32, dest: u32, hook_id: u32, fade_delay: u32) -> Self {
        self.jumps.push(Jump {
            offset,
            dest,
            hook_id,
            fade_delay,
        });
        self
    }

    /// 追加同步标记
    pub fn sync(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.syncs.push(data.into());
        self
    }

    /// 写入 STOP 块
    pub fn stop(mut self) -> Self {
        self.stop = true;
        self
    }

    /// 设置采样数据
    pub fn samples(mut self, samples: impl Into<Vec<u8>>) -> Self {
        self.samples = samples.into();
        self
    }

    /// 区域/跳转偏移按相对采样数据起始给出, 写入时加上数据偏移
    pub fn data_relative(mut self) -> Self {
        self.data_relative = true;
        self
    }

    /// 采样数据在生成资源中的起始偏移
    pub fn data_offset(&self) -> usize {
        let mut size = PREAMBLE_SIZE;
        if self.format.is_some() {
            size += CHUNK_HEADER_SIZE + FORMAT_PAYLOAD_SIZE;
        }
        size += self
            .texts
            .iter()
            .map(|t| CHUNK_HEADER_SIZE + t.len())
            .sum::<usize>();
        size += self.regions.len() * (CHUNK_HEADER_SIZE + REGION_PAYLOAD_SIZE);
        size += self.jumps.len() * (CHUNK_HEADER_SIZE + JUMP_PAYLOAD_SIZE);
        size += self
            .syncs
            .iter()
            .map(|s| CHUNK_HEADER_SIZE + s.len())
            .sum::<usize>();
        if self.stop {
            size += CHUNK_HEADER_SIZE + 4;
        }
        size + CHUNK_HEADER_SIZE
    }

    /// 生成资源字节
    pub fn finish(&self) -> Vec<u8> {
        let data_offset = self.data_offset();
        let base = if self.data_relative {
            data_offset as u32
        } else {
            0
        };

        let mut buf = BytesMut::with_capacity(data_offset + self.samples.len());
        buf.put_slice(FourCc::IMUS.as_bytes());
        buf.put_u32((data_offset + self.samples.len() - 8) as u32);
        buf.put_slice(MAP_TAG.as_bytes());
        buf.put_u32((data_offset - PREAMBLE_SIZE - CHUNK_HEADER_SIZE) as u32);

        if let Some((bits, freq, channels)) = self.format {
            put_header(&mut buf, FourCc::FRMT, FORMAT_PAYLOAD_SIZE);
            buf.put_bytes(0, 8);
            buf.put_u32(bits);
            buf.put_u32(freq);
            buf.put_u32(channels);
        }
        for text in &self.texts {
            put_header(&mut buf, FourCc::TEXT, text.len());
            buf.put_slice(text.as_bytes());
        }
        for region in &self.regions {
            put_header(&mut buf, FourCc::REGN, REGION_PAYLOAD_SIZE);
            buf.put_u32(region.offset + base);
            buf.put_u32(region.length);
        }
        for jump in &self.jumps {
            put_header(&mut buf, FourCc::JUMP, JUMP_PAYLOAD_SIZE);
            buf.put_u32(jump.offset + base);
            buf.put_u32(jump.dest + base);
            buf.put_u32(jump.hook_id);
            buf.put_u32(jump.fade_delay);
        }
        for sync in &self.syncs {
            put_header(&mut buf, FourCc::SYNC, sync.len());
            buf.put_slice(sync);
        }
        if self.stop {
            put_header(&mut buf, FourCc::STOP, 4);
            buf.put_u32(0);
        }
        put_header(&mut buf, FourCc::DATA, self.samples.len());
        buf.put_slice(&self.samples);

        buf.to_vec()
    }
}

fn put_header(buf: &mut BytesMut, tag: FourCc, len: usize) {
    buf.put_slice(tag.as_bytes());
    buf.put_u32(len as u32);
}
