//! 端到端集成测试: iMUS 资源从打包到导航、读取的完整流程.
//!
//! 测试流程: 生成资源 → 放入资源包 → 打开 → 查询表 → 导航跳转 → 读取区域 → 关闭

use std::sync::Arc;
use std::thread;

use imuse::core::ImuseError;
use imuse::format::{
    DirectoryBundle, ImusWriter, MemoryBundle, RawSliceDecoder, RefCountLocker, SoundManager,
    SoundManagerConfig, SoundResource,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 两段循环的战斗音乐: 区域 0 ↔ 区域 1, hook 2 时从区域 1 跳到尾声
fn battle_music() -> Vec<u8> {
    ImusWriter::new()
        .format(16, 22050, 2)
        .text("battle")
        .region(0, 4096)
        .region(1024, 4096)
        .region(2048, 4096)
        .jump(0, 1024, 1, 0)
        .jump(1024, 0, 1, 0)
        .jump(1024, 2048, 2, 120)
        .sync(vec![0xAA; 16])
        .stop()
        .samples((0..3072u32).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
        .data_relative()
        .finish()
}

fn manager_with(bundle: MemoryBundle, capacity: usize) -> (SoundManager, RefCountLocker) {
    let locker = RefCountLocker::new();
    let manager = SoundManager::new(
        &SoundManagerConfig::with_capacity(capacity),
        Box::new(bundle),
        Box::new(locker.clone()),
        Box::new(RawSliceDecoder),
    )
    .unwrap();
    (manager, locker)
}

#[test]
fn test_最小资源的打开与导航() {
    init_logger();
    let data = ImusWriter::new()
        .format(16, 22050, 2)
        .region(100, 50)
        .jump(100, 100, 1, 0)
        .finish();
    let mut bundle = MemoryBundle::new();
    bundle.insert_named("theme.imu", SoundResource::new(data));

    let mut manager = imuse::default_sound_manager(bundle);
    let handle = manager.open_sound(1, "theme.imu", 1, 0, 0).unwrap().unwrap();

    assert_eq!(manager.bits(handle), 16);
    assert_eq!(manager.freq(handle), 22050);
    assert_eq!(manager.channels(handle), 2);
    assert_eq!(manager.num_regions(handle), 1);
    assert_eq!(manager.num_jumps(handle), 1);
    assert_eq!(manager.region_offset(handle, 0), 100);
    assert_eq!(manager.jump_for_region_and_hook(handle, 0, 1), Some(0));
    assert_eq!(manager.jump_for_region_and_hook(handle, 0, 2), None);
    assert_eq!(manager.region_for_jump_destination(handle, 0), Some(0));

    manager.close_sound(handle);
    assert!(!manager.validate(handle));
    assert_eq!(manager.open_count(), 0);
}

#[test]
fn test_自适应音乐跳转链() {
    init_logger();
    let mut bundle = MemoryBundle::new();
    bundle.insert_named("battle.imu", SoundResource::new(battle_music()));
    let (mut manager, _) = manager_with(bundle, 4);
    let handle = manager.open_sound(7, "battle.imu", 1, 2, 0).unwrap().unwrap();

    assert_eq!(manager.num_syncs(handle), 1);
    assert_eq!(manager.sync_marker(handle, 0).len(), 16);
    assert_eq!(manager.sound(handle).header.texts, vec!["battle".to_string()]);

    // hook 1 在区域 0 和 1 之间往返
    let mut region = 0;
    let mut visited = Vec::new();
    for _ in 0..4 {
        let jump = manager.jump_for_region_and_hook(handle, region, 1).unwrap();
        region = manager.region_for_jump_destination(handle, jump).unwrap();
        visited.push(region);
    }
    assert_eq!(visited, vec![1, 0, 1, 0]);

    // hook 2 只在区域 1 上有出口
    assert_eq!(manager.jump_for_region_and_hook(handle, 0, 2), None);
    let exit = manager.jump_for_region_and_hook(handle, 1, 2).unwrap();
    assert_eq!(manager.jump_fade_delay(handle, exit), 120);
    assert_eq!(manager.jump_hook_id(handle, exit), 2);
    assert_eq!(manager.region_for_jump_destination(handle, exit), Some(2));
}

#[test]
fn test_区域读取与截断() {
    init_logger();
    let data = battle_music();
    let mut bundle = MemoryBundle::new();
    bundle.insert_named("battle.imu", SoundResource::new(data.clone()));
    let (mut manager, _) = manager_with(bundle, 4);
    let handle = manager.open_sound(7, "battle.imu", 1, 0, 0).unwrap().unwrap();
    let data_offset = manager.sound(handle).data_offset();

    // 区域 1 从采样第 1024 字节开始
    let read = manager.read_region_data(handle, 1, 0, 256).unwrap();
    assert_eq!(read.size, 256);
    assert!(!read.end_of_region);
    assert!(!manager.is_end_of_region(handle, 1));
    assert_eq!(&read.data[..], &data[data_offset + 1024..data_offset + 1280]);

    // offset + size + data_offset 超出区域长度时截断为 length - offset
    let read = manager.read_region_data(handle, 1, 100, 5000).unwrap();
    assert!(read.end_of_region);
    assert!(manager.is_end_of_region(handle, 1));
    // 截断后仍超出采样数据尾部, 解码器只返回剩余部分
    assert_eq!(read.size, 3072 - 1024 - 100);
    assert_eq!(&read.data[..], &data[data_offset + 1124..]);

    // 标志只反映最近一次读取
    manager.read_region_data(handle, 0, 0, 16).unwrap();
    assert!(!manager.is_end_of_region(handle, 0));
}

#[test]
fn test_槽位耗尽后可恢复() {
    init_logger();
    let mut bundle = MemoryBundle::new();
    bundle.insert_named("battle.imu", SoundResource::new(battle_music()));
    let (mut manager, _) = manager_with(bundle, 2);

    let a = manager.open_sound(1, "battle.imu", 1, 0, 0).unwrap().unwrap();
    let b = manager.clone_sound(a).unwrap().unwrap();
    assert_ne!(a.slot(), b.slot());
    assert!(matches!(
        manager.open_sound(1, "battle.imu", 1, 0, 0),
        Err(ImuseError::PoolExhausted(2))
    ));

    manager.close_sound(a);
    let c = manager.open_sound(1, "battle.imu", 1, 0, 0).unwrap().unwrap();
    assert_eq!(c.slot(), a.slot());
    assert!(!manager.validate(a));
    assert!(manager.validate(c));
}

#[test]
fn test_常驻资源共享锁() {
    init_logger();
    let mut bundle = MemoryBundle::new();
    bundle.insert_id(42, SoundResource::resident(battle_music()));
    let (mut manager, locker) = manager_with(bundle, 4);

    let a = manager.open_sound(42, "", 1, 0, 0).unwrap().unwrap();
    let b = manager.clone_sound(a).unwrap().unwrap();
    assert!(manager.sound(a).is_locked());
    assert!(manager.sound(b).is_locked());
    assert_eq!(locker.lock_count(42), 1);

    manager.close_sound(a);
    assert!(locker.is_locked(42));
    manager.close_sound(b);
    assert!(!locker.is_locked(42));
}

#[test]
fn test_缺失与损坏的资源() {
    init_logger();
    let mut bundle = MemoryBundle::new();
    bundle.insert_named("broken.imu", SoundResource::new(b"RIFF\0\0\0\0WAVE".to_vec()));
    let (mut manager, _) = manager_with(bundle, 2);

    assert!(manager.open_sound(1, "missing.imu", 1, 0, 0).unwrap().is_none());
    assert!(manager.open_sound(2, "broken.imu", 1, 0, 0).is_err());
    assert_eq!(manager.open_count(), 0);
}

#[test]
fn test_目录资源包() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("battle.imu"), battle_music()).unwrap();
    std::fs::write(dir.path().join("7.imx"), battle_music()).unwrap();

    let mut manager = SoundManager::with_bundle(Box::new(DirectoryBundle::new(dir.path())));
    let by_name = manager.open_sound(0, "battle.imu", 1, 0, 0).unwrap().unwrap();
    let by_id = manager.open_sound(7, "", 1, 0, 0).unwrap().unwrap();
    assert_eq!(manager.num_jumps(by_name), 3);
    assert_eq!(manager.num_jumps(by_id), 3);
    assert!(manager.open_sound(8, "", 1, 0, 0).unwrap().is_none());
}

#[test]
fn test_跨线程共享管理器() {
    init_logger();
    let mut bundle = MemoryBundle::new();
    bundle.insert_named("battle.imu", SoundResource::new(battle_music()));
    let shared = imuse::default_sound_manager(bundle).into_shared();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut manager = shared.lock().unwrap();
                let handle = manager.open_sound(3, "battle.imu", 1, 0, 0).unwrap().unwrap();
                let jump = manager.jump_for_region_and_hook(handle, 1, 2);
                manager.close_sound(handle);
                jump
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), Some(2));
    }
    assert_eq!(shared.lock().unwrap().open_count(), 0);
}
