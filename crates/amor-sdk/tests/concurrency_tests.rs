//! 共享句柄并发测试
//!
//! 关节空间控制器与笛卡尔控制器共享同一把硬件锁，读-改-写序列不会被其他线程打断。

use amor_driver::SimulatedArm;
use amor_sdk::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn open(arm: &SimulatedArm, config: &DeviceConfig) -> Arc<AmorDevice> {
    Arc::new(AmorDevice::open(arm.clone(), config).unwrap())
}

/// 两个线程同时做相对运动，结果等于所有增量之和
///
/// 模拟器的每次调用都有延迟，如果读与写之间没有持锁，增量会丢失。
#[test]
fn test_concurrent_relative_moves_do_not_lose_updates() {
    let arm = SimulatedArm::new();
    let device = open(&arm, &DeviceConfig::default());
    arm.set_latency(Duration::from_millis(1));

    let moves_per_thread = 20;
    let mut handles = Vec::new();
    for _ in 0..2 {
        let device = device.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..moves_per_thread {
                device.joints().relative_move(0, Deg(1.0)).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let positions = device.joints().encoders().unwrap();
    assert!((positions[Joint::A1].0 - 40.0).abs() < 1e-9);
    for joint in &Joint::ALL[1..] {
        assert!(positions[*joint].0.abs() < 1e-9);
    }
}

/// 不同关节上的并发写入互不覆盖
#[test]
fn test_concurrent_moves_on_different_joints() {
    let arm = SimulatedArm::new();
    let device = open(&arm, &DeviceConfig::default());
    arm.set_latency(Duration::from_micros(500));

    let handles: Vec<_> = (0..7)
        .map(|j| {
            let device = device.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    device.joints().relative_move(j, Deg(2.0)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let positions = device.joints().encoders().unwrap();
    for joint in Joint::ALL {
        assert!(
            (positions[joint].0 - 10.0).abs() < 1e-9,
            "{} = {}",
            joint,
            positions[joint]
        );
    }
}

/// 笛卡尔控制器与关节控制器使用同一把锁
#[test]
fn test_cartesian_and_joint_controllers_share_lock() {
    let arm = SimulatedArm::new();
    let config = DeviceConfig {
        cartesian_controller: Some("cartesian".to_string()),
        ..DeviceConfig::default()
    };
    let device = open(&arm, &config);

    let guard = device.handle().lock();

    let blocked = {
        let device = device.clone();
        thread::spawn(move || {
            let cartesian = device.cartesian().unwrap();
            cartesian.handle().try_lock_for(Duration::from_millis(20)).is_none()
        })
    };
    assert!(blocked.join().unwrap());

    drop(guard);
    assert!(device.cartesian().unwrap().stat().is_ok());
}

/// 等待可以被其他线程取消
#[test]
fn test_wait_cancelled_from_other_thread() {
    let arm = SimulatedArm::new();
    let config = DeviceConfig {
        cartesian_controller: Some("cartesian".to_string()),
        ..DeviceConfig::default()
    };
    let device = open(&arm, &config);
    arm.set_motion_polls(None);
    arm.reset_counts();

    device
        .cartesian()
        .unwrap()
        .move_linear(&Pose::identity())
        .unwrap();

    let waiter = {
        let device = device.clone();
        thread::spawn(move || device.cartesian().unwrap().wait_until_done(Duration::ZERO))
    };

    thread::sleep(Duration::from_millis(100));
    device.cartesian().unwrap().cancel_wait();

    assert!(waiter.join().unwrap().is_ok());
    assert_eq!(device.cartesian().unwrap().state(), ControllerState::Idle);
    assert_eq!(arm.call_count("amor_controlled_stop"), 1);
}
