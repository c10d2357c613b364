//! Fusion session owning all mutable pipeline state.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use arfusion_3d::camera::PinholeCameraIntrinsic;
use arfusion_3d::rasterize::{dequantize_depth, rasterize_depth, DEPTH_NO_DATA};
use arfusion_3d::reconstruct::reconstruct_pointcloud;
use arfusion_image::{ops, Image, ImageSize};
use arfusion_imgproc::color::{gray_from_rgb, yuv420sp_to_rgb};
use arfusion_imgproc::filter::guided_filter;
use arfusion_imgproc::resize::{resize_native, InterpolationMode};
use glam::{Mat4, Vec3};

use crate::error::PipelineError;
use crate::gate::{DropReason, FrameGate, FrameStatus};
use crate::pose::PoseManager;
use crate::source::{CameraKind, ColorFrame, EventSample, PixelFormat, SensorService};

/// Fixed resolution of the rasterized depth image.
pub const DEPTH_IMAGE_SIZE: ImageSize = ImageSize {
    width: 320,
    height: 180,
};

/// Fixed working resolution of the color/filter/reconstruction stages.
pub const WORKING_SIZE: ImageSize = ImageSize {
    width: 640,
    height: 360,
};

/// Fixed downscale factor from UI touch coordinates to depth image space.
pub const TOUCH_DOWNSCALE: i32 = 6;

/// Guided filter window radius used by the joint filter stage.
pub const GUIDED_FILTER_RADIUS: usize = 13;

/// Guided filter regularization, in squared normalized-intensity units.
pub const GUIDED_FILTER_EPS: f32 = 0.05;

/// Geometry and transforms handed to the renderer on each tick.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    /// The most recent reconstructed point cloud, flattened (X, Y, Z)
    /// triples in camera-relative coordinates. Copied by value to avoid
    /// torn reads; length is always a multiple of 3.
    pub vertices: Vec<f32>,
    /// World transform placing the reconstructed point cloud.
    pub point_cloud_transform: Mat4,
    /// World transform of the AR camera.
    pub camera_transform: Mat4,
    /// Whether this tick observed newly reconstructed geometry.
    pub updated: bool,
}

/// The sensor fusion session.
///
/// Owns every piece of mutable pipeline state and is driven entirely by
/// external execution contexts: the depth callback, the color callback and
/// the render tick. The [`FrameGate`] sequences the three so at most one
/// rasterization and one reconstruction run at a time; the individual
/// mutexes only make each buffer handoff atomic.
pub struct FusionSession<S: SensorService> {
    service: Arc<S>,
    gate: FrameGate,
    pose: PoseManager<S>,
    depth_intrinsics: OnceLock<PinholeCameraIntrinsic>,
    depth_image: Mutex<Image<u8, 1>>,
    vertices: Mutex<Vec<f32>>,
    last_event: Mutex<EventSample>,
    // frozen while paused; the camera transform is recomposed every tick
    point_cloud_transform: Mutex<Mat4>,
}

impl<S: SensorService> FusionSession<S> {
    /// Create a session backed by the given sensor service.
    pub fn new(service: Arc<S>) -> Self {
        Self {
            pose: PoseManager::new(service.clone()),
            service,
            gate: FrameGate::new(),
            depth_intrinsics: OnceLock::new(),
            depth_image: Mutex::new(Image::from_size_val(DEPTH_IMAGE_SIZE, DEPTH_NO_DATA)),
            vertices: Mutex::new(Vec::new()),
            last_event: Mutex::new(EventSample::default()),
            point_cloud_transform: Mutex::new(Mat4::IDENTITY),
        }
    }

    /// Connect the session: refresh the depth camera intrinsics and run the
    /// one-shot extrinsics calibration.
    ///
    /// Calibration failure is returned to the caller; the process stays
    /// alive but AR placement would be meaningless, so callers should treat
    /// it as fatal to the session.
    pub fn connect(&self) -> Result<(), PipelineError> {
        let intrinsics = self.service.camera_intrinsics(CameraKind::Depth)?;
        let _ = self.depth_intrinsics.set(intrinsics);
        self.pose.calibrate_extrinsics()
    }

    /// Entry point for the depth sample batch callback.
    ///
    /// Rasterizes the batch into the shared depth image unless the pipeline
    /// is busy or the renderer still owes a consume; in that case the frame
    /// is dropped and the newest one wins later. Never an error.
    pub fn on_depth_frame(&self, points: &[[f32; 3]], timestamp: f64) -> FrameStatus {
        let Some(intrinsics) = self.depth_intrinsics.get() else {
            log::debug!("skip depth frame: not connected");
            return FrameStatus::Dropped(DropReason::NotConnected);
        };
        if let Err(reason) = self.gate.try_begin_depth(points.len(), timestamp) {
            log::debug!("skip depth frame: {reason:?}");
            return FrameStatus::Dropped(reason);
        }

        log::debug!("rasterizing {} samples to depth image", points.len());
        {
            let mut depth = self.depth_image.lock().unwrap();
            rasterize_depth(points, intrinsics, &mut depth);
        }

        self.gate.end_depth();
        FrameStatus::Processed
    }

    /// Entry point for the color frame callback.
    ///
    /// Runs conversion, the joint filter and the reconstruction against the
    /// pending depth image, then publishes the new vertex buffer. Unsupported
    /// formats, a paused pipeline or missing depth data drop the frame.
    pub fn on_color_frame(&self, frame: &ColorFrame<'_>) -> Result<FrameStatus, PipelineError> {
        if frame.format != PixelFormat::Yuv420Sp {
            log::debug!("skip color frame: unsupported format {:?}", frame.format);
            return Ok(FrameStatus::Dropped(DropReason::UnsupportedFormat));
        }
        if let Err(reason) = self.gate.try_begin_color() {
            log::debug!("skip color frame: {reason:?}");
            return Ok(FrameStatus::Dropped(reason));
        }

        let result = self.process_color_frame(frame);
        match result {
            Ok(point_count) => {
                log::debug!("reconstructed {point_count} vertices");
                self.gate.end_color();
                Ok(FrameStatus::Processed)
            }
            Err(e) => {
                // release the pipeline without signaling geometry; the next
                // depth frame starts clean
                self.gate.abort_color();
                Err(e)
            }
        }
    }

    fn process_color_frame(&self, frame: &ColorFrame<'_>) -> Result<usize, PipelineError> {
        let intrinsics = self.depth_intrinsics.get().ok_or_else(|| {
            PipelineError::IntrinsicsQueryFailed("session not connected".to_string())
        })?;

        // convert the luma-chroma buffer and bring it to working resolution
        let native_size = ImageSize {
            width: frame.width,
            height: frame.height,
        };
        let mut rgb = Image::<u8, 3>::from_size_val(native_size, 0);
        yuv420sp_to_rgb(frame.data, native_size, &mut rgb)?;

        let mut rgb_scaled = Image::<u8, 3>::from_size_val(WORKING_SIZE, 0);
        resize_native(&rgb, &mut rgb_scaled, InterpolationMode::Bilinear)?;
        let mut gray = Image::<u8, 1>::from_size_val(WORKING_SIZE, 0);
        gray_from_rgb(&rgb_scaled, &mut gray)?;

        // upsample the pending depth image to the same resolution
        let mut depth_scaled = Image::<u8, 1>::from_size_val(WORKING_SIZE, 0);
        {
            let depth = self.depth_image.lock().unwrap();
            resize_native(&depth, &mut depth_scaled, InterpolationMode::Bilinear)?;
        }

        // joint filter: the gray edges guide the depth smoothing
        let mut guide_f = Image::<f32, 1>::from_size_val(WORKING_SIZE, 0.0);
        let mut depth_f = Image::<f32, 1>::from_size_val(WORKING_SIZE, 0.0);
        ops::convert_norm_u8_f32(&gray, &mut guide_f)?;
        ops::convert_norm_u8_f32(&depth_scaled, &mut depth_f)?;

        let mut filtered_f = Image::<f32, 1>::from_size_val(WORKING_SIZE, 0.0);
        guided_filter(
            &guide_f,
            &depth_f,
            &mut filtered_f,
            GUIDED_FILTER_RADIUS,
            GUIDED_FILTER_EPS,
        )?;
        ops::convert_norm_f32_u8(&filtered_f, &mut depth_scaled)?;

        // back-project with intrinsics scaled to the working resolution
        let scale = WORKING_SIZE.width as f32 / intrinsics.image_size.0 as f32;
        let mut vertices = Vec::new();
        reconstruct_pointcloud(&depth_scaled, &intrinsics.scaled(scale), &mut vertices);
        let point_count = vertices.len() / 3;

        {
            let mut shared = self.vertices.lock().unwrap();
            *shared = vertices;
        }
        Ok(point_count)
    }

    /// Entry point for the render consumer's tick.
    ///
    /// Waits until new geometry is signaled (bounded by `timeout`, unbounded
    /// when `None`), unless paused, in which case it proceeds immediately
    /// with the last geometry. Returns the vertex buffer by value together
    /// with the point cloud and camera world transforms for the stored depth
    /// timestamp. While paused the point cloud transform stays frozen.
    pub fn render_tick(&self, timeout: Option<Duration>) -> RenderFrame {
        let updated = self.gate.wait_for_geometry(timeout);
        let state = self.gate.snapshot();

        let point_cloud_transform = if state.paused {
            *self.point_cloud_transform.lock().unwrap()
        } else {
            let transform = self.pose.world_frame_at(state.timestamp);
            *self.point_cloud_transform.lock().unwrap() = transform;
            transform
        };
        let camera_transform = self.pose.world_frame_at(state.timestamp);

        self.gate.mark_consumed();

        let vertices = self.vertices.lock().unwrap().clone();
        RenderFrame {
            vertices,
            point_cloud_transform,
            camera_transform,
            updated,
        }
    }

    /// Inverse-project a 2D touch coordinate through the depth buffer.
    ///
    /// Maps the screen coordinate into depth image space with the fixed
    /// downscale factor, rejects out-of-range coordinates, and back-projects
    /// the stored depth with the unscaled depth intrinsics. Cells holding the
    /// no-data sentinel yield `None`; the anisotropic reconstruction
    /// correction is deliberately not applied here.
    pub fn locate_touch(&self, screen_x: i32, screen_y: i32) -> Option<Vec3> {
        let intrinsics = self.depth_intrinsics.get()?;
        if screen_x < 0 || screen_y < 0 {
            return None;
        }
        let x = (screen_x / TOUCH_DOWNSCALE) as usize;
        let y = (screen_y / TOUCH_DOWNSCALE) as usize;

        let value = {
            let depth = self.depth_image.lock().unwrap();
            depth.get_pixel(x, y).ok()?[0]
        };
        if value == DEPTH_NO_DATA {
            return None;
        }

        let z = dequantize_depth(value);
        let point = intrinsics.unproject(x as f32, y as f32, z);
        Some(Vec3::from_array(point))
    }

    /// Entry point for the service's event notification callback.
    pub fn on_event(&self, event: EventSample) {
        let mut last = self.last_event.lock().unwrap();
        *last = event;
    }

    /// Toggle the pause flag, returning the new value.
    ///
    /// Pausing freezes the visual point cloud while depth rasterization and
    /// hardware tracking keep running.
    pub fn toggle_pause(&self) -> bool {
        self.gate.toggle_paused()
    }

    /// Whether the pipeline is currently paused.
    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// Reset the session: gate flags, depth image, vertex buffer and cached
    /// pose all return to their initial state. Intrinsics and extrinsics are
    /// session constants and survive the reset.
    pub fn reset(&self) {
        self.gate.reset();
        self.depth_image.lock().unwrap().fill(DEPTH_NO_DATA);
        self.vertices.lock().unwrap().clear();
        *self.point_cloud_transform.lock().unwrap() = Mat4::IDENTITY;
        self.pose.reset();
    }

    /// Format the latest cached pose for debugging.
    pub fn pose_debug_string(&self) -> String {
        self.pose.pose_debug_string()
    }

    /// Format the last received service event for debugging.
    pub fn event_debug_string(&self) -> String {
        let event = self.last_event.lock().unwrap();
        format!("event @ {:.3}s: {}", event.timestamp, event.message)
    }

    /// The sample count of the depth frame currently in flight.
    pub fn point_count_string(&self) -> String {
        format!("{}", self.gate.snapshot().point_count)
    }
}
