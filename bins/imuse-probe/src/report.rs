//! 探测报告.
//!
//! 从已打开的音频中收集格式、区域、跳转与同步标记信息, 输出为文本或 JSON.

use std::fmt::Write as _;

use serde::Serialize;

use imuse_core::{ImuseError, ImuseResult};
use imuse_format::{SoundHandle, SoundManager};

/// `--read REGION:OFFSET:SIZE` 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub region: usize,
    pub offset: usize,
    pub size: usize,
}

/// 解析 `REGION:OFFSET:SIZE`
pub fn parse_read_request(text: &str) -> Result<ReadRequest, String> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("格式应为 REGION:OFFSET:SIZE, 实际为 '{text}'"));
    }
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|e| format!("无效数字 '{s}': {e}"))
    };
    Ok(ReadRequest {
        region: parse(parts[0])?,
        offset: parse(parts[1])?,
        size: parse(parts[2])?,
    })
}

/// 完整探测结果
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub file: String,
    pub format: FormatInfo,
    pub texts: Vec<String>,
    pub regions: Vec<RegionInfo>,
    pub jumps: Vec<JumpInfo>,
    pub syncs: Vec<SyncInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_routes: Option<Vec<HookRoute>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<ReadInfo>,
}

/// 格式信息
#[derive(Debug, Serialize)]
pub struct FormatInfo {
    pub bits: u32,
    pub freq: u32,
    pub channels: u32,
    pub data_offset: usize,
}

/// 区域信息
#[derive(Debug, Serialize)]
pub struct RegionInfo {
    pub index: usize,
    pub offset: u32,
    pub length: u32,
}

/// 跳转信息
#[derive(Debug, Serialize)]
pub struct JumpInfo {
    pub index: usize,
    pub offset: u32,
    pub dest: u32,
    pub hook_id: u32,
    pub fade_delay: u32,
    /// 触发区域, 不对应任何区域时为空
    pub from_region: Option<usize>,
    /// 目标区域, 悬空时为空
    pub dest_region: Option<usize>,
}

/// 同步标记信息
#[derive(Debug, Serialize)]
pub struct SyncInfo {
    pub index: usize,
    pub size: usize,
}

/// 指定 hook 下每个区域的去向
#[derive(Debug, Serialize)]
pub struct HookRoute {
    pub region: usize,
    pub jump: Option<usize>,
    pub dest_region: Option<usize>,
}

/// 区域读取结果
#[derive(Debug, Serialize)]
pub struct ReadInfo {
    pub region: usize,
    pub offset: usize,
    pub requested: usize,
    pub size: usize,
    pub end_of_region: bool,
}

/// 收集探测报告
pub fn build_report(
    manager: &mut SoundManager,
    handle: SoundHandle,
    file: &str,
    hook: Option<u32>,
    read: Option<ReadRequest>,
) -> ImuseResult<ProbeReport> {
    let desc = manager.sound(handle);

    let regions = desc
        .header
        .regions
        .iter()
        .enumerate()
        .map(|(index, r)| RegionInfo {
            index,
            offset: r.offset,
            length: r.length,
        })
        .collect();

    let jumps = desc
        .header
        .jumps
        .iter()
        .enumerate()
        .map(|(index, j)| JumpInfo {
            index,
            offset: j.offset,
            dest: j.dest,
            hook_id: j.hook_id,
            fade_delay: j.fade_delay,
            from_region: desc.region_at_offset(j.offset),
            dest_region: desc.region_for_jump_destination(index),
        })
        .collect();

    let syncs = desc
        .header
        .syncs
        .iter()
        .enumerate()
        .map(|(index, s)| SyncInfo {
            index,
            size: s.len(),
        })
        .collect();

    let hook_routes = hook.map(|hook_id| {
        (0..desc.num_regions())
            .map(|region| {
                let jump = desc.jump_for_region_and_hook(region, hook_id);
                HookRoute {
                    region,
                    jump,
                    dest_region: jump.and_then(|j| desc.region_for_jump_destination(j)),
                }
            })
            .collect()
    });

    let mut report = ProbeReport {
        file: file.to_string(),
        format: FormatInfo {
            bits: desc.bits(),
            freq: desc.freq(),
            channels: desc.channels(),
            data_offset: desc.data_offset(),
        },
        texts: desc.header.texts.clone(),
        regions,
        jumps,
        syncs,
        hook_routes,
        read: None,
    };

    if let Some(req) = read {
        let num_regions = manager.num_regions(handle);
        if req.region >= num_regions {
            return Err(ImuseError::InvalidArgument(format!(
                "区域 {} 不存在 (共 {} 个区域)",
                req.region, num_regions
            )));
        }
        let result = manager.read_region_data(handle, req.region, req.offset, req.size)?;
        report.read = Some(ReadInfo {
            region: req.region,
            offset: req.offset,
            requested: req.size,
            size: result.size,
            end_of_region: manager.is_end_of_region(handle, req.region),
        });
    }

    Ok(report)
}

fn opt(value: Option<usize>) -> String {
    value.map_or_else(|| "悬空".to_string(), |v| v.to_string())
}

/// 渲染为文本
pub fn render_text(report: &ProbeReport) -> String {
    let mut out = String::new();
    let f = &report.format;
    let _ = writeln!(out, "文件: {}", report.file);
    let _ = writeln!(
        out,
        "格式: {} 位, {} Hz, {} 声道, 数据偏移 {}",
        f.bits, f.freq, f.channels, f.data_offset
    );
    for text in &report.texts {
        let _ = writeln!(out, "文本: {text}");
    }

    let _ = writeln!(out, "区域 ({}):", report.regions.len());
    for r in &report.regions {
        let _ = writeln!(out, "  #{:<3} 偏移={:<8} 长度={}", r.index, r.offset, r.length);
    }

    let _ = writeln!(out, "跳转 ({}):", report.jumps.len());
    for j in &report.jumps {
        let _ = writeln!(
            out,
            "  #{:<3} 区域 {} -> 区域 {} hook={} fade={}",
            j.index,
            opt(j.from_region),
            opt(j.dest_region),
            j.hook_id,
            j.fade_delay
        );
    }

    let _ = writeln!(out, "同步标记 ({}):", report.syncs.len());
    for s in &report.syncs {
        let _ = writeln!(out, "  #{:<3} {} 字节", s.index, s.size);
    }

    if let Some(routes) = &report.hook_routes {
        let _ = writeln!(out, "hook 路由:");
        for route in routes {
            match route.jump {
                Some(jump) => {
                    let _ = writeln!(
                        out,
                        "  区域 {} 经跳转 #{} -> 区域 {}",
                        route.region,
                        jump,
                        opt(route.dest_region)
                    );
                }
                None => {
                    let _ = writeln!(out, "  区域 {} 无跳转", route.region);
                }
            }
        }
    }

    if let Some(read) = &report.read {
        let _ = writeln!(
            out,
            "读取: 区域 {} 偏移 {} 请求 {} 字节, 实际 {} 字节, 区域结束={}",
            read.region, read.offset, read.requested, read.size, read.end_of_region
        );
    }
    out
}
