//! Application state holding the wgpu graphics context
//!
//! Owns the render surface, the camera and tracking threads, the try-on
//! state, and the egui integration. The per-frame pipeline runs here:
//! poll camera, gate a frame into the tracker, smooth the anchors,
//! composite the overlay canvas, and draw video + overlay + UI.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::assets::{self, AssetLoader, JewelryCategory};
use crate::camera::{CameraCapture, CameraFrame};
use crate::config::AppConfig;
use crate::overlay::anchors;
use crate::overlay::canvas::OverlayCanvas;
use crate::overlay::compositor;
use crate::overlay::smoothing::AnchorSmoother;
use crate::snapshot;
use crate::state::{Mode, TryOnState};
use crate::tracking::{face_mesh::FaceMeshConfig, face_mesh::FaceMeshDetector, FaceTracker, VideoFrame};

/// How long a transient error banner stays visible.
const BANNER_DURATION: Duration = Duration::from_secs(5);

/// Aspect-fit uniform shared by the video and overlay passes, so overlay
/// pixels stay registered with the video under any window size.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FitParams {
    scale: [f32; 2],
    _pad: [f32; 2],
}

/// A texture plus the bind group that samples it.
struct SampledTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// Main application state
pub struct App {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,

    app_config: AppConfig,

    // Capture and tracking
    camera: Option<CameraCapture>,
    tracker: Option<FaceTracker>,
    current_frame: Option<CameraFrame>,
    last_uploaded_frame: u64,
    last_consumed_result: Option<u64>,

    // Overlay pipeline state
    smoother: AnchorSmoother,
    overlay_canvas: Option<OverlayCanvas>,
    tryon: TryOnState,

    // Asset handling
    asset_loader: Option<AssetLoader>,
    earring_selection: String,
    necklace_selection: String,

    // GPU resources
    video_texture: Option<SampledTexture>,
    overlay_texture: Option<SampledTexture>,
    video_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    fit_params_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,

    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // Status surfaces
    banner: Option<(String, Instant)>,
    fatal_error: Option<String>,

    // Frame timing
    frame_count: u64,
    fps: f64,
    last_fps_update: Instant,
    frames_since_update: u64,
}

impl App {
    /// Create a new App instance with initialized wgpu context
    pub async fn new(window: Arc<Window>, app_config: AppConfig) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find suitable GPU adapter");

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Jewelry TryOn Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Passthrough Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/passthrough.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Passthrough Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Passthrough Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let video_pipeline = make_pipeline("Video Pipeline", wgpu::BlendState::REPLACE);
        let overlay_pipeline = make_pipeline(
            "Overlay Pipeline",
            wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        );

        let fit_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Fit Params Buffer"),
            size: std::mem::size_of::<FitParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        // Background collaborators
        let asset_loader = match AssetLoader::new(app_config.assets_dir.clone()) {
            Ok(loader) => Some(loader),
            Err(e) => {
                log::warn!("Asset loader unavailable: {}", e);
                None
            }
        };

        let earring_selection = assets::default_selection(JewelryCategory::Earring);
        let necklace_selection = assets::default_selection(JewelryCategory::Necklace);
        if let Some(loader) = &asset_loader {
            loader.request(JewelryCategory::Earring, &earring_selection);
            loader.request(JewelryCategory::Necklace, &necklace_selection);
        }

        let mut fatal_error = None;
        let tracker = match FaceMeshDetector::new(FaceMeshConfig {
            max_faces: app_config.max_faces,
            refine_landmarks: app_config.refine_landmarks,
            min_detection_confidence: app_config.min_detection_confidence,
            min_tracking_confidence: app_config.min_tracking_confidence,
        }) {
            Ok(detector) => match FaceTracker::new(Box::new(detector)) {
                Ok(tracker) => Some(tracker),
                Err(e) => {
                    log::error!("Failed to start face tracker: {}", e);
                    fatal_error = Some(format!("Face tracking unavailable: {}", e));
                    None
                }
            },
            Err(e) => {
                log::error!("Failed to initialize face landmark detector: {}", e);
                fatal_error = Some(format!("Face tracking unavailable: {}", e));
                None
            }
        };

        let now = Instant::now();

        let mut app = Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            app_config,
            camera: None,
            tracker,
            current_frame: None,
            last_uploaded_frame: 0,
            last_consumed_result: None,
            smoother: AnchorSmoother::new(),
            overlay_canvas: None,
            tryon: TryOnState::new(),
            asset_loader,
            earring_selection,
            necklace_selection,
            video_texture: None,
            overlay_texture: None,
            video_pipeline,
            overlay_pipeline,
            bind_group_layout,
            fit_params_buffer,
            sampler,
            egui_ctx,
            egui_state,
            egui_renderer,
            banner: None,
            fatal_error,
            frame_count: 0,
            fps: 0.0,
            last_fps_update: now,
            frames_since_update: 0,
        };

        app.connect_camera(app.app_config.camera_index);
        app
    }

    /// Handle a window event, returning true if egui consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        response.consumed
    }

    /// Resize the surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Show a transient message in the error banner.
    fn show_banner(&mut self, message: String) {
        log::warn!("{}", message);
        self.banner = Some((message, Instant::now()));
    }

    /// Connect to a camera
    pub fn connect_camera(&mut self, camera_index: u32) {
        let width = self.app_config.camera_width;
        let height = self.app_config.camera_height;

        match CameraCapture::new(camera_index, width, height) {
            Ok(capture) => {
                log::info!("Camera capture started (requested: {}x{})", width, height);
                self.camera = Some(capture);
                self.video_texture = None;
                self.overlay_texture = None;
                self.overlay_canvas = None;
                self.current_frame = None;
                self.last_uploaded_frame = 0;
            }
            Err(e) => {
                self.show_banner(format!("Could not access camera: {}", e));
            }
        }
    }

    /// Disconnect the current camera
    pub fn disconnect_camera(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.stop();
        }
        self.video_texture = None;
        self.current_frame = None;
        log::info!("Camera disconnected");
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.tryon.set_mode(mode);
        log::info!("Mode: {:?}", mode);
    }

    pub fn mode(&self) -> Mode {
        self.tryon.mode()
    }

    fn select_asset(&mut self, category: JewelryCategory, filename: String) {
        match category {
            JewelryCategory::Earring => self.earring_selection = filename.clone(),
            JewelryCategory::Necklace => self.necklace_selection = filename.clone(),
        }
        if let Some(loader) = &self.asset_loader {
            loader.request(category, &filename);
        }
    }

    /// Export the current frame plus overlay as a PNG.
    pub fn take_snapshot(&mut self) {
        let Some(frame) = self.current_frame.clone() else {
            self.show_banner("No video frame to snapshot".to_string());
            return;
        };
        let anchors = self.smoother.smoothed();
        match snapshot::save(&self.app_config.snapshot_dir, &frame, &self.tryon, &anchors) {
            Ok(path) => self.show_banner(format!("Saved {}", path.display())),
            Err(e) => self.show_banner(format!("Failed to take snapshot: {}", e)),
        }
    }

    /// Per-frame update: camera poll, tracking, asset completions,
    /// overlay composition.
    pub fn update(&mut self) {
        self.update_camera();
        self.update_tracking();
        self.update_assets();
        self.compose_overlay();
    }

    fn update_camera(&mut self) {
        let open_error = self.camera.as_ref().and_then(|c| c.take_open_error());
        if let Some(error) = open_error {
            // Fatal to the session: the pipeline never starts.
            self.fatal_error = Some(error);
            self.camera = None;
            return;
        }

        let Some(frame) = self.camera.as_ref().and_then(|c| c.latest_frame()) else {
            return;
        };
        if self.video_texture.is_some() && frame.frame_number <= self.last_uploaded_frame {
            return;
        }
        self.last_uploaded_frame = frame.frame_number;

        let needs_new_texture = match &self.video_texture {
            None => true,
            Some(t) => t.width != frame.width || t.height != frame.height,
        };
        if needs_new_texture {
            log::info!("Creating video texture: {}x{}", frame.width, frame.height);
            self.video_texture = Some(self.create_sampled_texture(
                "Video Texture",
                frame.width,
                frame.height,
            ));
            self.overlay_texture = Some(self.create_sampled_texture(
                "Overlay Texture",
                frame.width,
                frame.height,
            ));
            self.overlay_canvas = Some(OverlayCanvas::new(frame.width, frame.height));
        }

        if let Some(video) = &self.video_texture {
            self.upload_rgba(&video.texture, &frame.data, frame.width, frame.height);
        }
        self.current_frame = Some(frame);
    }

    fn update_tracking(&mut self) {
        let Some(tracker) = &self.tracker else { return };
        let Some(frame) = &self.current_frame else { return };

        // Gate a copy of the current frame into the detector. A false
        // return means a detection is in flight and this frame is dropped.
        tracker.submit(VideoFrame {
            data: frame.data.clone(),
            width: frame.width,
            height: frame.height,
            frame_number: frame.frame_number,
        });

        // Feed the smoother once per completed detection.
        let result = tracker.latest_result();
        if self.last_consumed_result == Some(result.frame_number) {
            return;
        }
        self.last_consumed_result = Some(result.frame_number);

        if let Some(canvas) = &self.overlay_canvas {
            let triple = anchors::resolve(
                &result.landmarks,
                canvas.width() as f32,
                canvas.height() as f32,
            );
            self.smoother.observe(&triple);
        }
    }

    fn update_assets(&mut self) {
        let Some(loader) = &self.asset_loader else { return };
        while let Some(loaded) = loader.poll() {
            // Apply only if still the current selection, so a slow load
            // can never clobber a newer choice.
            let current = match loaded.category {
                JewelryCategory::Earring => &self.earring_selection,
                JewelryCategory::Necklace => &self.necklace_selection,
            };
            if &loaded.filename == current {
                self.tryon.set_asset(loaded.category, loaded.image);
            } else {
                log::debug!("Discarding stale asset load: {}", loaded.filename);
            }
        }
    }

    fn compose_overlay(&mut self) {
        let Some(canvas) = &mut self.overlay_canvas else { return };
        compositor::render(canvas, &self.tryon, &self.smoother.smoothed());

        if let Some(overlay) = &self.overlay_texture {
            let (w, h) = (canvas.width(), canvas.height());
            let pixels = canvas.pixels().to_vec();
            self.upload_rgba(&overlay.texture, &pixels, w, h);
        }
    }

    fn create_sampled_texture(&self, label: &str, width: u32, height: u32) -> SampledTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.fit_params_buffer.as_entire_binding(),
                },
            ],
        });
        SampledTexture {
            texture,
            bind_group,
            width,
            height,
        }
    }

    fn upload_rgba(&self, texture: &wgpu::Texture, data: &[u8], width: u32, height: u32) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn update_fit_params(&self) {
        let Some(video) = &self.video_texture else { return };
        let video_aspect = video.width as f32 / video.height as f32;
        let window_aspect = self.config.width.max(1) as f32 / self.config.height.max(1) as f32;
        let scale = if window_aspect > video_aspect {
            [video_aspect / window_aspect, 1.0]
        } else {
            [1.0, window_aspect / video_aspect]
        };
        let params = FitParams {
            scale,
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.fit_params_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Render a frame
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.update_fit_params();

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Video Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(video) = &self.video_texture {
                render_pass.set_pipeline(&self.video_pipeline);
                render_pass.set_bind_group(0, &video.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            if let Some(overlay) = &self.overlay_texture {
                render_pass.set_pipeline(&self.overlay_pipeline);
                render_pass.set_bind_group(0, &overlay.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        self.render_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_fps();
        Ok(())
    }

    fn render_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);

        // Expire the transient banner.
        if let Some((_, since)) = &self.banner {
            if since.elapsed() > BANNER_DURATION {
                self.banner = None;
            }
        }

        let mode = self.tryon.mode();
        let fps = self.fps;
        let camera_connected = self.camera.is_some();
        let camera_frame_count = self.camera.as_ref().map(|c| c.frame_count()).unwrap_or(0);
        let tracking_available = self.tracker.is_some();
        let banner = self.banner.clone();
        let fatal_error = self.fatal_error.clone();
        let earring_selection = self.earring_selection.clone();
        let necklace_selection = self.necklace_selection.clone();

        let mut new_mode: Option<Mode> = None;
        let mut new_selection: Option<(JewelryCategory, String)> = None;
        let mut snapshot_requested = false;
        let mut connect_camera_index: Option<u32> = None;
        let mut disconnect_camera = false;

        let available_cameras = if camera_connected {
            Vec::new()
        } else {
            CameraCapture::list_cameras()
        };

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Jewelry Try-On");
                    ui.separator();
                    ui.label(format!("FPS: {:.1}", fps));
                    ui.separator();
                    if camera_connected {
                        ui.label(format!("Camera frames: {}", camera_frame_count));
                    } else {
                        ui.label("No camera");
                    }
                    if !tracking_available {
                        ui.separator();
                        ui.colored_label(egui::Color32::YELLOW, "Tracking unavailable");
                    }
                });
            });

            egui::SidePanel::left("controls").show(ctx, |ui| {
                ui.heading("Try On");
                ui.separator();

                if ui.selectable_label(mode == Mode::None, "Off").clicked() {
                    new_mode = Some(Mode::None);
                }
                if ui
                    .selectable_label(mode == Mode::Earring, "Earrings")
                    .clicked()
                {
                    new_mode = Some(Mode::Earring);
                }
                if ui
                    .selectable_label(mode == Mode::Necklace, "Necklaces")
                    .clicked()
                {
                    new_mode = Some(Mode::Necklace);
                }

                match mode {
                    Mode::Earring => {
                        ui.separator();
                        ui.label("Earring options:");
                        for filename in assets::catalog(JewelryCategory::Earring) {
                            let selected = filename == earring_selection;
                            if ui.selectable_label(selected, &filename).clicked() {
                                new_selection = Some((JewelryCategory::Earring, filename));
                            }
                        }
                    }
                    Mode::Necklace => {
                        ui.separator();
                        ui.label("Necklace options:");
                        for filename in assets::catalog(JewelryCategory::Necklace) {
                            let selected = filename == necklace_selection;
                            if ui.selectable_label(selected, &filename).clicked() {
                                new_selection = Some((JewelryCategory::Necklace, filename));
                            }
                        }
                    }
                    Mode::None => {}
                }

                ui.separator();
                if ui.button("Snapshot (S)").clicked() {
                    snapshot_requested = true;
                }

                ui.separator();
                ui.heading("Camera");
                if camera_connected {
                    if ui.button("Disconnect").clicked() {
                        disconnect_camera = true;
                    }
                } else if available_cameras.is_empty() {
                    ui.label("No cameras found");
                } else {
                    for cam in &available_cameras {
                        if ui.button(format!("{}: {}", cam.index, cam.name)).clicked() {
                            connect_camera_index = Some(cam.index);
                        }
                    }
                }
            });

            // Fatal errors stay up; transient banners expire on their own.
            let message = fatal_error.as_deref().or(banner.as_ref().map(|(m, _)| m.as_str()));
            if let Some(message) = message {
                egui::TopBottomPanel::bottom("banner").show(ctx, |ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, message);
                });
            }
        });

        if let Some(mode) = new_mode {
            self.set_mode(mode);
        }
        if let Some((category, filename)) = new_selection {
            self.select_asset(category, filename);
        }
        if snapshot_requested {
            self.take_snapshot();
        }
        if let Some(index) = connect_camera_index {
            self.connect_camera(index);
        }
        if disconnect_camera {
            self.disconnect_camera();
        }

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let render_pass_static: &mut wgpu::RenderPass<'static> =
                unsafe { std::mem::transmute(&mut render_pass) };

            self.egui_renderer
                .render(render_pass_static, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn update_fps(&mut self) {
        self.frame_count += 1;
        self.frames_since_update += 1;

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = self.frames_since_update as f64 / elapsed;
            self.frames_since_update = 0;
            self.last_fps_update = now;
        }
    }
}
