//! Drives the fusion pipeline from a synthetic sensor source on three
//! threads: a depth producer, a color producer and a render consumer,
//! mimicking the callback cadence of a real sensing device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arfusion::session::{FusionSession, DEPTH_IMAGE_SIZE};
use arfusion::source::{CameraKind, ColorFrame, PixelFormat, SensorService};
use arfusion::PipelineError;
use arfusion_3d::camera::PinholeCameraIntrinsic;
use arfusion_3d::pose::{CoordinateFrame, PoseSample};
use glam::{Quat, Vec3};

#[derive(argh::FromArgs)]
/// Run the fusion pipeline against a synthetic sensor source.
struct Args {
    /// number of render ticks to run
    #[argh(option, default = "30")]
    ticks: usize,

    /// depth callback period in milliseconds (5 Hz device default)
    #[argh(option, default = "200")]
    depth_period_ms: u64,

    /// color callback period in milliseconds (30 Hz camera default)
    #[argh(option, default = "33")]
    color_period_ms: u64,
}

/// Synthetic device: a slowly orbiting pose and a wavy wall of depth points.
struct SyntheticDevice;

impl SensorService for SyntheticDevice {
    fn pose_at(
        &self,
        timestamp: f64,
        base: CoordinateFrame,
        _target: CoordinateFrame,
    ) -> Result<PoseSample, PipelineError> {
        if base == CoordinateFrame::Imu {
            // fixed mounting offsets
            return Ok(PoseSample::new(
                Quat::IDENTITY,
                Vec3::new(0.0, 0.01, 0.0),
                0.0,
            ));
        }
        let angle = timestamp as f32 * 0.1;
        Ok(PoseSample::new(
            Quat::from_rotation_y(angle),
            Vec3::new(angle.sin() * 0.5, 0.0, 0.0),
            timestamp,
        ))
    }

    fn camera_intrinsics(
        &self,
        _camera: CameraKind,
    ) -> Result<PinholeCameraIntrinsic, PipelineError> {
        Ok(PinholeCameraIntrinsic::new(
            (240.0, 240.0),
            (
                DEPTH_IMAGE_SIZE.width as f32 / 2.0,
                DEPTH_IMAGE_SIZE.height as f32 / 2.0,
            ),
            (
                DEPTH_IMAGE_SIZE.width as u32,
                DEPTH_IMAGE_SIZE.height as u32,
            ),
        ))
    }
}

/// A wavy wall roughly 1.5 m in front of the depth camera.
fn synthetic_depth_batch(t: f64) -> Vec<[f32; 3]> {
    let mut points = Vec::new();
    for i in -40..=40 {
        for j in -25..=25 {
            let x = i as f32 * 0.01;
            let y = j as f32 * 0.01;
            let z = 1.5 + 0.1 * (x * 10.0 + t as f32).sin();
            points.push([x, y, z]);
        }
    }
    points
}

/// A gray gradient frame in YUV 4:2:0 semi-planar layout.
fn synthetic_color_frame(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3 / 2);
    for y in 0..height {
        for x in 0..width {
            data.push(((x + y) % 256) as u8);
        }
    }
    data.extend(std::iter::repeat(128u8).take(width * height / 2));
    data
}

fn main() -> Result<(), PipelineError> {
    env_logger::init();
    let args: Args = argh::from_env();

    let session = Arc::new(FusionSession::new(Arc::new(SyntheticDevice)));
    session.connect()?;
    log::info!("session connected and extrinsics calibrated");

    let running = Arc::new(AtomicBool::new(true));

    let depth_thread = {
        let session = session.clone();
        let running = running.clone();
        let period = Duration::from_millis(args.depth_period_ms);
        thread::spawn(move || {
            let mut t = 0.0f64;
            while running.load(Ordering::Relaxed) {
                t += period.as_secs_f64();
                let batch = synthetic_depth_batch(t);
                session.on_depth_frame(&batch, t);
                thread::sleep(period);
            }
        })
    };

    let color_thread = {
        let session = session.clone();
        let running = running.clone();
        let period = Duration::from_millis(args.color_period_ms);
        thread::spawn(move || {
            let (width, height) = (1280, 720);
            let data = synthetic_color_frame(width, height);
            let mut t = 0.0f64;
            while running.load(Ordering::Relaxed) {
                t += period.as_secs_f64();
                let frame = ColorFrame {
                    data: &data,
                    width,
                    height,
                    format: PixelFormat::Yuv420Sp,
                    timestamp: t,
                };
                if let Err(e) = session.on_color_frame(&frame) {
                    log::error!("color stage failed: {e}");
                }
                thread::sleep(period);
            }
        })
    };

    // render consumer on the main thread
    for tick in 0..args.ticks {
        let frame = session.render_tick(Some(Duration::from_secs(2)));
        let t = frame.camera_transform.w_axis;
        println!(
            "tick {tick:3}: {} vertices, updated={}, camera at ({:.3}, {:.3}, {:.3})",
            frame.vertices.len() / 3,
            frame.updated,
            t.x,
            t.y,
            t.z,
        );
    }

    println!("last pose:  {}", session.pose_debug_string());
    println!("last event: {}", session.event_debug_string());

    running.store(false, Ordering::Relaxed);
    depth_thread.join().expect("depth thread panicked");
    color_thread.join().expect("color thread panicked");
    Ok(())
}
