//! Top-level application state machine.
//!
//! `AppState` owns one camera session, the photo pool and the formation
//! controller.  Each display frame it folds in uploads and decoded textures,
//! polls the gesture pipeline, and moves the particles one step.  It knows
//! nothing about the window; [`run`] pairs it with a [`SceneRenderer`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use nalgebra::Vector3;
use tracing::{info, warn};

use hand_gesture::{
    CameraError, CameraSession, CameraSource, GestureSymbol, HandTracker, PoseHandle,
    ThreadedTracker, VideoStream,
};
use photo_formation::{FormationController, PhotoPool};

use crate::backend;
use crate::config::AppConfig;
use crate::error::GalaxyError;
use crate::gesture::{Command, GesturePipeline};
use crate::textures::{TextureLoader, THUMB_SIZE};
use crate::uploader::{spawn_console, static_photos, ConsoleLink, UploadReport, Uploader};
use crate::visualizer::{FrameState, SceneRenderer};

/// How long an upload notice stays on screen, seconds.
const NOTICE_SECS: f32 = 6.0;

/// Longest step the animation takes after a stall, seconds.
const MAX_DT: f32 = 0.1;

// ════════════════════════════════════════════════════════════════════════════
// Phase
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the camera and the first tracker result.
    Starting,
    Live,
    /// Terminal until restart.  Holds the message shown in the banner.
    Failed(String),
}

/// What the camera session's callbacks have reported so far.
#[derive(Clone, Default)]
struct SessionSignals {
    ready: Rc<Cell<bool>>,
    error: Rc<RefCell<Option<String>>>,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState<T: HandTracker = ThreadedTracker> {
    // ── photos ───────────────────────────────────────────────────────────
    pool:       PhotoPool,
    textures:   TextureLoader,
    uploader:   Uploader,
    report_tx:  Sender<UploadReport>,
    report_rx:  Receiver<UploadReport>,

    // ── formation ────────────────────────────────────────────────────────
    controller: FormationController,

    // ── camera + gestures ────────────────────────────────────────────────
    session:    CameraSession<Box<dyn CameraSource>>,
    signals:    SessionSignals,
    pipeline:   Option<GesturePipeline<T>>,
    phase:      Phase,

    // ── upload notice ────────────────────────────────────────────────────
    notice:     Option<(String, f32)>,
}

impl<T: HandTracker> AppState<T> {
    /// Build a fresh session: load the static photos, queue every texture,
    /// open the camera and start tracking on it.
    ///
    /// Camera failures do not make this fail; they put the state in
    /// [`Phase::Failed`].
    pub fn new<F>(cfg: &AppConfig, camera: Box<dyn CameraSource>, spawn_tracker: F) -> Result<Self, GalaxyError>
    where
        F: FnOnce(VideoStream) -> Result<T, CameraError>,
    {
        let (mut pool, upload_tx) = PhotoPool::with_uploads();
        let range = pool.append(static_photos(&cfg.photos_dir, cfg.static_count));
        info!(photos = pool.len(), dir = %cfg.photos_dir.display(), "static photos listed");

        let mut textures = TextureLoader::spawn(THUMB_SIZE)?;
        textures.request(&pool, range);

        let mut controller = FormationController::new(cfg.layout, cfg.smoothing_rate);
        controller.sync_count(pool.len());

        let signals = SessionSignals::default();
        let ready = Rc::clone(&signals.ready);
        let error = Rc::clone(&signals.error);
        let mut session = CameraSession::new(
            camera,
            move || ready.set(true),
            move |msg| *error.borrow_mut() = Some(msg),
        );

        let pipeline = match session.start() {
            Some(stream) => match spawn_tracker(stream) {
                Ok(tracker) => Some(GesturePipeline::new(tracker, cfg.classifier, cfg.dwell_frames)),
                Err(e) => {
                    session.fail(e);
                    None
                }
            },
            None => None,
        };

        let (report_tx, report_rx) = mpsc::channel();
        let mut app = AppState {
            pool,
            textures,
            uploader: Uploader::new(upload_tx, cfg.max_upload_bytes),
            report_tx,
            report_rx,
            controller,
            session,
            signals,
            pipeline,
            phase: Phase::Starting,
            notice: None,
        };
        app.refresh_phase();

        if !cfg.initial_uploads.is_empty() {
            match app.uploader.upload(&cfg.initial_uploads) {
                Ok(report) => app.show_report(report),
                Err(e)     => warn!(error = %e, "initial uploads dropped"),
            }
        }
        Ok(app)
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn phase(&self) -> &Phase { &self.phase }

    pub fn pool(&self) -> &PhotoPool { &self.pool }

    pub fn controller(&self) -> &FormationController { &self.controller }

    /// The debounced gesture in force.  `None` before the tracker starts.
    pub fn gesture(&self) -> GestureSymbol {
        self.pipeline.as_ref().map_or(GestureSymbol::None, |p| p.stable())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// A handle for pushing uploads into this session from another thread.
    pub fn uploader(&self) -> Uploader { self.uploader.clone() }

    /// Where other threads report finished upload batches.
    pub fn report_sender(&self) -> Sender<UploadReport> { self.report_tx.clone() }

    // ── per-frame ────────────────────────────────────────────────────────

    /// Advance one display frame of `dt` seconds, seen from `viewer`.
    pub fn tick(&mut self, dt: f32, viewer: Vector3<f32>) {
        // 1. New photos and finished textures
        if let Some(range) = self.pool.drain_uploads() {
            self.textures.request(&self.pool, range);
        }
        self.textures.drain_into(&mut self.pool);
        while let Ok(report) = self.report_rx.try_recv() {
            self.show_report(report);
        }

        // 2. Every photo has a target before anything reads the formation
        self.controller.set_viewer(viewer);
        self.controller.sync_count(self.pool.len());

        // 3. Gestures
        if let Some(pipeline) = self.pipeline.as_mut() {
            let step = pipeline.poll();
            if let Some(err) = step.fatal {
                self.session.fail(err);
            } else {
                if step.first_result {
                    self.session.first_frame_processed();
                }
                if let Some(symbol) = step.changed {
                    self.controller.apply_gesture(symbol);
                }
            }
        }
        self.refresh_phase();

        // 4. Motion
        self.controller.update(dt);

        if let Some((_, ttl)) = self.notice.as_mut() {
            *ttl -= dt;
            if *ttl <= 0.0 {
                self.notice = None;
            }
        }
    }

    /// Everything the renderer needs for one frame.
    pub fn frame_state(&self) -> FrameState<'_> {
        FrameState {
            particles:  self.controller.particles(),
            photos:     self.pool.all(),
            formation:  self.controller.formation(),
            focus:      self.controller.focus_index(),
            gesture:    self.gesture(),
            live:       self.phase == Phase::Live,
            error:      match &self.phase {
                Phase::Failed(msg) => Some(msg.as_str()),
                _                  => None,
            },
            processing: self.textures.in_flight(),
            notice:     self.notice(),
        }
    }

    fn refresh_phase(&mut self) {
        if matches!(self.phase, Phase::Failed(_)) {
            return;
        }
        if let Some(msg) = self.signals.error.borrow_mut().take() {
            self.pipeline = None;
            self.phase = Phase::Failed(msg);
        } else if self.signals.ready.get() {
            self.phase = Phase::Live;
        }
    }

    fn show_report(&mut self, report: UploadReport) {
        if report.has_warnings() {
            warn!(summary = %report.summary(), "upload finished with warnings");
        } else if report.accepted.is_empty() {
            return;
        }
        self.notice = Some((report.summary(), NOTICE_SECS));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Main run loop
// ════════════════════════════════════════════════════════════════════════════

fn start_session(cfg: &AppConfig, pose: &PoseHandle) -> Result<AppState, GalaxyError> {
    AppState::new(cfg, backend::camera_source(cfg), |stream| {
        backend::spawn_tracker(stream, cfg, pose)
    })
}

pub fn run(cfg: AppConfig) -> Result<(), GalaxyError> {
    // ── Window ────────────────────────────────────────────────────────────
    let mut vis = SceneRenderer::new(cfg.layout.seed)?;
    let pose = PoseHandle::new();

    // ── Upload console (outlives restarts) ────────────────────────────────
    let console = ConsoleLink::default();
    if cfg.upload_console {
        spawn_console(console.clone())?;
    }

    // ── Sessions ──────────────────────────────────────────────────────────
    'session: loop {
        let mut app = start_session(&cfg, &pose)?;
        console.connect(app.uploader(), app.report_sender());
        let mut last = Instant::now();

        while vis.is_open() {
            // 1. Keys
            match vis.poll_input(&pose) {
                Some(Command::Quit) => return Ok(()),
                Some(Command::Restart) => {
                    info!("restarting session");
                    pose.set(None);
                    continue 'session;
                }
                None => {}
            }

            // 2. Per-frame logic
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32().min(MAX_DT);
            last = now;
            app.tick(dt, vis.viewer());

            // 3. Render
            vis.render(&app.frame_state(), dt);
        }
        return Ok(());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use hand_gesture::poses::synthetic_hand;
    use hand_gesture::{Placement, Pose, SimCamera, TrackerPoll};
    use photo_formation::{layout, Formation};

    const DT: f32 = 1.0 / 60.0;

    /// Replays a fixed list of polls, then keeps repeating the last one.
    struct Script {
        polls: VecDeque<TrackerPoll>,
        last:  TrackerPoll,
        fatal: Option<CameraError>,
    }

    impl HandTracker for Script {
        fn next_landmarks(&mut self) -> TrackerPoll {
            if let Some(p) = self.polls.pop_front() {
                self.last = p.clone();
                return p;
            }
            self.last.clone()
        }
        fn fatal_error(&mut self) -> Option<CameraError> {
            self.fatal.take()
        }
    }

    fn holding(pose: Pose) -> Script {
        Script {
            polls: VecDeque::new(),
            last:  TrackerPoll::Hand(synthetic_hand(pose, Placement::default())),
            fatal: None,
        }
    }

    /// Counts `start()` calls and fails every one of them.
    struct Refusing {
        calls: Rc<Cell<u32>>,
    }

    impl CameraSource for Refusing {
        fn start(&mut self) -> Result<VideoStream, CameraError> {
            self.calls.set(self.calls.get() + 1);
            Err(CameraError::permission_denied("access refused"))
        }
    }

    fn config(photos: usize) -> AppConfig {
        AppConfig {
            photos_dir:     PathBuf::from("/nonexistent/photos"),
            static_count:   photos,
            upload_console: false,
            ..AppConfig::default()
        }
    }

    fn app(photos: usize, tracker: Script) -> AppState<Script> {
        AppState::new(&config(photos), Box::new(SimCamera::new(30)), move |_| Ok(tracker)).unwrap()
    }

    fn viewer() -> Vector3<f32> { Vector3::new(0.0, 0.0, 25.0) }

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gesture_galaxy_app_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, [0u8; 16]).unwrap();
        path
    }

    #[test]
    fn permission_denied_fails_once_without_ready() {
        let calls = Rc::new(Cell::new(0));
        let camera = Box::new(Refusing { calls: Rc::clone(&calls) });
        let mut app: AppState<Script> =
            AppState::new(&config(5), camera, |_| -> Result<Script, CameraError> { unreachable!() }).unwrap();

        for _ in 0..10 {
            app.tick(DT, viewer());
        }
        assert_eq!(calls.get(), 1);
        assert!(matches!(app.phase(), Phase::Failed(msg) if msg.contains("access refused")));
        let frame = app.frame_state();
        assert!(frame.error.is_some());
        assert!(!frame.live);
    }

    #[test]
    fn tracker_spawn_failure_is_a_camera_failure() {
        let app: AppState<Script> = AppState::new(&config(2), Box::new(SimCamera::new(30)), |_| {
            Err(CameraError::not_supported("no model"))
        })
        .unwrap();
        assert!(matches!(app.phase(), Phase::Failed(_)));
        assert_eq!(app.gesture(), GestureSymbol::None);
    }

    #[test]
    fn first_result_makes_it_live() {
        let mut app = app(3, holding(Pose::Open));
        assert_eq!(app.phase(), &Phase::Starting);
        app.tick(DT, viewer());
        assert_eq!(app.phase(), &Phase::Live);
        assert!(app.frame_state().live);
    }

    #[test]
    fn held_fist_gathers_after_dwell() {
        let mut app = app(5, holding(Pose::Fist));
        for _ in 0..3 {
            app.tick(DT, viewer());
        }
        assert_eq!(app.controller().formation(), Formation::Scattered);
        app.tick(DT, viewer());
        assert_eq!(app.controller().formation(), Formation::Gathered);
        assert_eq!(app.gesture(), GestureSymbol::Fist);

        for _ in 0..600 {
            app.tick(DT, viewer());
        }
        assert!(app.controller().is_settled(1e-3));
    }

    #[test]
    fn uploads_join_the_gathered_sphere_in_place() {
        let mut app = app(5, holding(Pose::Fist));
        for _ in 0..10 {
            app.tick(DT, viewer());
        }
        assert_eq!(app.controller().formation(), Formation::Gathered);

        let files: Vec<_> = ["u1.jpg", "u2.jpg", "u3.jpg"].iter().map(|n| temp_file(n)).collect();
        let report = app.uploader().upload(&files).unwrap();
        assert_eq!(report.accepted.len(), 3);

        app.tick(DT, viewer());
        assert_eq!(app.pool().len(), 8);
        assert_eq!(app.controller().len(), 8);

        let params = *app.controller().params();
        let targets = layout(Formation::Gathered, 8, None, &params);
        for p in &app.controller().particles()[5..] {
            assert_eq!(p.current, targets[p.id]);
            assert_eq!(p.target, targets[p.id]);
        }
    }

    #[test]
    fn fatal_stream_error_moves_to_failed() {
        let mut script = holding(Pose::Open);
        script.fatal = Some(CameraError::unavailable("unplugged"));
        let mut app = app(1, script);
        app.tick(DT, viewer());
        assert!(matches!(app.phase(), Phase::Failed(msg) if msg.contains("unplugged")));
        assert_eq!(app.gesture(), GestureSymbol::None);
    }

    #[test]
    fn upload_reports_become_notices() {
        let mut app = app(0, holding(Pose::Open));
        app.report_sender()
            .send(UploadReport { accepted: vec!["a.jpg".into()], rejected: Vec::new() })
            .unwrap();
        app.tick(DT, viewer());
        assert_eq!(app.notice(), Some("1 photo(s) added"));

        for _ in 0..((NOTICE_SECS / DT) as usize + 2) {
            app.tick(DT, viewer());
        }
        assert_eq!(app.notice(), None);
    }
}
