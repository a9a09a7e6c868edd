use std::cell::Cell;
use std::rc::Rc;

use anyhow::{bail, Result};
use image::{Rgb, RgbImage};
use yolov8_person::config::KEY_POLL_MS;
use yolov8_person::{
    image_session, video_session, Annotator, BBox, Detection, Detector, Display, FrameSource,
    ImageSource, Pipeline, PipelineError, StopReason,
};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// 每帧返回同样结果的检测器
struct FixedDetector {
    detections: Vec<Detection>,
    calls: usize,
    fail_on: Option<usize>,
    last_conf: Option<f32>,
}

impl FixedDetector {
    fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: 0,
            fail_on: None,
            last_conf: None,
        }
    }
}

impl Detector for FixedDetector {
    fn detect(&mut self, _image: &RgbImage, conf: f32) -> Result<Vec<Detection>> {
        self.calls += 1;
        self.last_conf = Some(conf);
        if self.fail_on == Some(self.calls) {
            bail!("inference failed");
        }
        Ok(self.detections.clone())
    }
}

/// 读 `frames` 帧后失败的摄像头, Drop 时记录释放次数
struct ScriptedCamera {
    remaining: usize,
    released: Rc<Cell<u32>>,
}

impl ScriptedCamera {
    fn new(frames: usize, released: Rc<Cell<u32>>) -> Self {
        Self {
            remaining: frames,
            released,
        }
    }
}

impl FrameSource for ScriptedCamera {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::from_pixel(200, 240, BLACK)))
    }
}

impl Drop for ScriptedCamera {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

/// 记录显示内容, 按脚本返回按键
#[derive(Default)]
struct RecordingDisplay {
    shown: Vec<RgbImage>,
    keys: Vec<i32>,
    delays: Vec<i32>,
    closes: u32,
}

impl RecordingDisplay {
    fn with_keys(keys: Vec<i32>) -> Self {
        Self {
            keys,
            ..Default::default()
        }
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        self.shown.push(frame.clone());
        Ok(())
    }

    fn wait_key(&mut self, delay_ms: i32) -> Result<i32> {
        self.delays.push(delay_ms);
        let idx = self.delays.len() - 1;
        Ok(self.keys.get(idx).copied().unwrap_or(-1))
    }

    fn close(&mut self) -> Result<()> {
        self.closes += 1;
        Ok(())
    }
}

fn person(confidence: f32, bbox: BBox) -> Detection {
    Detection::new(0, confidence, bbox)
}

fn write_image(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("person.png");
    RgbImage::from_pixel(200, 240, BLACK).save(&path).unwrap();
    path
}

#[test]
fn test_missing_image_opens_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("person.jpg");

    let err = ImageSource::open(&missing).unwrap_err();
    assert!(matches!(err, PipelineError::MissingImage(_)));
    assert_eq!(
        err.to_string(),
        format!("Error: The image file '{}' was not found.", missing.display())
    );
}

#[test]
fn test_image_with_one_person() {
    let dir = tempfile::tempdir().unwrap();
    let source = ImageSource::open(write_image(&dir)).unwrap();
    let detector = FixedDetector::new(vec![person(0.87, BBox::new(10, 20, 100, 200))]);
    let mut pipeline = Pipeline::new(detector, Annotator::default(), 0.5);
    let mut display = RecordingDisplay::default();

    let frames = pipeline.run_image(source, &mut display).unwrap();

    assert_eq!(frames, 1);
    assert_eq!(pipeline.detector().calls, 1);
    assert_eq!(pipeline.detector().last_conf, Some(0.5));
    assert_eq!(display.shown.len(), 1);
    // 图片模式阻塞等待任意按键
    assert_eq!(display.delays, vec![0]);
    assert_eq!(display.closes, 1);

    let frame = &display.shown[0];
    assert_eq!(*frame.get_pixel(10, 20), GREEN);
    assert_eq!(*frame.get_pixel(100, 200), GREEN);
    assert_eq!(*frame.get_pixel(10, 150), GREEN);
    assert_eq!(*frame.get_pixel(50, 100), BLACK);
}

#[test]
fn test_image_with_one_person_draws_label() {
    let dir = tempfile::tempdir().unwrap();
    let source = ImageSource::open(write_image(&dir)).unwrap();
    let detector = FixedDetector::new(vec![person(0.87, BBox::new(10, 40, 100, 200))]);
    let annotator = Annotator::with_font_path(None).unwrap();
    let mut pipeline = Pipeline::new(detector, annotator, 0.5);
    let mut display = RecordingDisplay::default();

    pipeline.run_image(source, &mut display).unwrap();

    // 框上方 (y < 40) 只有标签像素, 最低一行在基线 y1 - 10 处
    let frame = &display.shown[0];
    let label_rows: Vec<u32> = (0..40)
        .filter(|&y| (0..200).any(|x| *frame.get_pixel(x, y) != BLACK))
        .collect();
    assert!(!label_rows.is_empty());
    assert!((29..=30).contains(label_rows.last().unwrap()));
}

#[test]
fn test_image_session_missing_file_skips_detector() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("person.jpg");
    let mut detector = FixedDetector::new(vec![person(0.9, BBox::new(1, 1, 5, 5))]);
    let detector_ref = &mut detector;
    let loaded = Cell::new(false);
    let mut display = RecordingDisplay::default();

    let frames = image_session(
        || ImageSource::open(&missing),
        || {
            loaded.set(true);
            Ok(Pipeline::new(detector_ref, Annotator::default(), 0.5))
        },
        &mut display,
    )
    .unwrap();

    assert_eq!(frames, None);
    assert!(!loaded.get());
    assert_eq!(detector.calls, 0);
    assert!(display.shown.is_empty());
    assert_eq!(display.closes, 0);
}

#[test]
fn test_image_session_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir);
    let mut detector = FixedDetector::new(vec![person(0.9, BBox::new(1, 1, 5, 5))]);
    let detector_ref = &mut detector;
    let mut display = RecordingDisplay::default();

    let frames = image_session(
        || ImageSource::open(&path),
        || Ok(Pipeline::new(detector_ref, Annotator::default(), 0.5)),
        &mut display,
    )
    .unwrap();

    assert_eq!(frames, Some(1));
    assert_eq!(detector.calls, 1);
    assert_eq!(display.closes, 1);
}

#[test]
fn test_video_session_camera_unavailable() {
    let mut detector = FixedDetector::new(Vec::new());
    let detector_ref = &mut detector;
    let mut display = RecordingDisplay::default();

    let summary = video_session(
        || Ok(Pipeline::new(detector_ref, Annotator::default(), 0.5)),
        || Err::<ScriptedCamera, _>(PipelineError::CameraUnavailable(7)),
        &mut display,
    )
    .unwrap();

    assert!(summary.is_none());
    assert_eq!(detector.calls, 0);
    assert!(display.shown.is_empty());
    assert!(display.delays.is_empty());
}

#[test]
fn test_video_session_runs_until_end_of_stream() {
    let released = Rc::new(Cell::new(0));
    let mut detector = FixedDetector::new(Vec::new());
    let detector_ref = &mut detector;
    let mut display = RecordingDisplay::default();

    let summary = video_session(
        || Ok(Pipeline::new(detector_ref, Annotator::default(), 0.5)),
        || Ok(ScriptedCamera::new(3, released.clone())),
        &mut display,
    )
    .unwrap()
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(detector.calls, 3);
    assert_eq!(released.get(), 1);
}

#[test]
fn test_image_with_vehicle_only() {
    let dir = tempfile::tempdir().unwrap();
    let source = ImageSource::open(write_image(&dir)).unwrap();
    let detector = FixedDetector::new(vec![Detection::new(2, 0.9, BBox::new(10, 20, 100, 200))]);
    let mut pipeline = Pipeline::new(detector, Annotator::default(), 0.5);
    let mut display = RecordingDisplay::default();

    pipeline.run_image(source, &mut display).unwrap();

    assert_eq!(display.shown.len(), 1);
    assert_eq!(display.shown[0], RgbImage::from_pixel(200, 240, BLACK));
}

#[test]
fn test_process_counts_people() {
    let detector = FixedDetector::new(vec![
        person(0.9, BBox::new(1, 1, 20, 20)),
        Detection::new(5, 0.8, BBox::new(30, 30, 50, 50)),
        person(0.6, BBox::new(60, 60, 90, 90)),
    ]);
    let mut pipeline = Pipeline::new(detector, Annotator::default(), 0.5);
    let mut frame = RgbImage::from_pixel(100, 100, BLACK);
    assert_eq!(pipeline.process(&mut frame).unwrap(), 2);
    assert_eq!(*frame.get_pixel(30, 30), BLACK);
    assert_eq!(*frame.get_pixel(60, 60), GREEN);
}

#[test]
fn test_video_stops_at_end_of_stream() {
    let released = Rc::new(Cell::new(0));
    let camera = ScriptedCamera::new(5, released.clone());
    let detector = FixedDetector::new(vec![person(0.7, BBox::new(5, 5, 50, 50))]);
    let mut pipeline = Pipeline::new(detector, Annotator::default(), 0.5);
    let mut display = RecordingDisplay::default();

    let summary = pipeline.run_video(camera, &mut display).unwrap();

    assert_eq!(summary.frames, 5);
    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(pipeline.detector().calls, 5);
    assert_eq!(display.shown.len(), 5);
    assert!(display.delays.iter().all(|&d| d == KEY_POLL_MS));
    assert_eq!(released.get(), 1);
    assert_eq!(display.closes, 1);
}

#[test]
fn test_video_quit_key_on_third_frame() {
    let released = Rc::new(Cell::new(0));
    let camera = ScriptedCamera::new(100, released.clone());
    let detector = FixedDetector::new(Vec::new());
    let mut pipeline = Pipeline::new(detector, Annotator::default(), 0.5);
    let mut display = RecordingDisplay::with_keys(vec![-1, 'x' as i32, 'q' as i32]);

    let summary = pipeline.run_video(camera, &mut display).unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.reason, StopReason::QuitKey);
    assert_eq!(pipeline.detector().calls, 3);
    assert_eq!(released.get(), 1);
    assert_eq!(display.closes, 1);
}

#[test]
fn test_video_with_no_frames() {
    let released = Rc::new(Cell::new(0));
    let camera = ScriptedCamera::new(0, released.clone());
    let mut pipeline = Pipeline::new(FixedDetector::new(Vec::new()), Annotator::default(), 0.5);
    let mut display = RecordingDisplay::default();

    let summary = pipeline.run_video(camera, &mut display).unwrap();

    assert_eq!(summary.frames, 0);
    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(pipeline.detector().calls, 0);
    assert!(display.shown.is_empty());
    assert_eq!(released.get(), 1);
}

#[test]
fn test_video_error_still_releases_camera() {
    let released = Rc::new(Cell::new(0));
    let camera = ScriptedCamera::new(10, released.clone());
    let mut detector = FixedDetector::new(Vec::new());
    detector.fail_on = Some(2);
    let mut pipeline = Pipeline::new(detector, Annotator::default(), 0.5);
    let mut display = RecordingDisplay::default();

    assert!(pipeline.run_video(camera, &mut display).is_err());
    assert_eq!(display.shown.len(), 1);
    assert_eq!(released.get(), 1);
    assert_eq!(display.closes, 1);
}
