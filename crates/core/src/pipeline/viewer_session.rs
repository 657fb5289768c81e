use crate::pipeline::frame_processor::{
    DetectionResult, FrameMetrics, FrameProcessor, ProcessingOptions,
};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Result of one [`ViewerSession::tick`].
#[derive(Debug)]
pub enum TickOutcome {
    Rendered {
        frame: Frame,
        result: DetectionResult,
        metrics: FrameMetrics,
    },
    /// The source had nothing this tick; try again on the next one.
    NoFrame,
    /// The session was stopped. No further frames will be produced.
    Stopped,
}

/// Capture-process loop body, independent of whoever schedules it.
///
/// The host calls [`tick`](Self::tick) on its own timer and calls
/// [`stop`](Self::stop) before tearing down its window, so the capture device
/// is released while the host is still alive.
pub struct ViewerSession {
    source: Box<dyn FrameSource>,
    processor: FrameProcessor,
    running: bool,
    ticks: usize,
}

impl ViewerSession {
    pub fn new(source: Box<dyn FrameSource>, processor: FrameProcessor) -> Self {
        log::info!("Viewer session started on {}", source.describe());
        Self {
            source,
            processor,
            running: true,
            ticks: 0,
        }
    }

    pub fn tick(&mut self, options: ProcessingOptions) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stopped;
        }
        let raw = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Skipping tick: {e}");
                return TickOutcome::NoFrame;
            }
        };
        let (frame, result, metrics) = self.processor.process(&raw, options);
        self.ticks += 1;
        self.processor.logger_mut().progress(self.ticks, 0);
        TickOutcome::Rendered {
            frame,
            result,
            metrics,
        }
    }

    /// Stops ticking and releases the capture device. Idempotent.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.source.release();
        log::info!("Viewer session stopped after {} frames", self.ticks);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of frames rendered so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn processor(&self) -> &FrameProcessor {
        &self.processor
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::pipeline::frame_processor::ProcessorConfig;
    use crate::shared::bounding_box::BoundingBox;
    use crate::video::domain::frame_source::CaptureError;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    // --- Stubs ---

    #[derive(Default)]
    struct SourceLog {
        released: usize,
        reads: usize,
    }

    /// Plays back a script of frames and failures, then runs dry.
    struct ScriptedSource {
        script: VecDeque<Result<Frame, CaptureError>>,
        log: Rc<RefCell<SourceLog>>,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Frame, CaptureError> {
            self.log.borrow_mut().reads += 1;
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(CaptureError::NoFrameAvailable("script ended".into())))
        }

        fn release(&mut self) {
            self.log.borrow_mut().released += 1;
        }
    }

    struct OneFace;

    impl FaceDetector for OneFace {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(vec![BoundingBox::new(2, 8, 8, 2)])
        }
    }

    fn session(script: Vec<Result<Frame, CaptureError>>) -> (ViewerSession, Rc<RefCell<SourceLog>>) {
        let log = Rc::new(RefCell::new(SourceLog::default()));
        let source = ScriptedSource {
            script: script.into(),
            log: Rc::clone(&log),
        };
        let processor = FrameProcessor::new(&ProcessorConfig::default(), Box::new(OneFace)).unwrap();
        (ViewerSession::new(Box::new(source), processor), log)
    }

    #[test]
    fn test_tick_renders_available_frame() {
        let (mut s, _) = session(vec![Ok(Frame::filled(100, 100, [0, 0, 0]))]);
        match s.tick(ProcessingOptions::default()) {
            TickOutcome::Rendered { frame, result, .. } => {
                assert_eq!((frame.width(), frame.height()), (60, 60));
                assert_eq!(result.boxes.len(), 1);
            }
            other => panic!("expected a rendered frame, got {other:?}"),
        }
        assert_eq!(s.ticks(), 1);
    }

    #[test]
    fn test_missing_frame_is_not_fatal() {
        let (mut s, _) = session(vec![
            Err(CaptureError::NoFrameAvailable("busy".into())),
            Ok(Frame::filled(20, 20, [0, 0, 0])),
        ]);
        assert!(matches!(s.tick(ProcessingOptions::default()), TickOutcome::NoFrame));
        assert!(matches!(
            s.tick(ProcessingOptions::default()),
            TickOutcome::Rendered { .. }
        ));
        assert!(s.is_running());
    }

    #[test]
    fn test_stop_releases_once_and_halts_ticks() {
        let (mut s, log) = session(vec![Ok(Frame::filled(20, 20, [0, 0, 0]))]);
        s.stop();
        s.stop();
        assert_eq!(log.borrow().released, 1);
        assert!(!s.is_running());
        assert!(matches!(s.tick(ProcessingOptions::default()), TickOutcome::Stopped));
        assert_eq!(log.borrow().reads, 0);
    }

    #[test]
    fn test_drop_releases_device() {
        let (s, log) = session(Vec::new());
        drop(s);
        assert_eq!(log.borrow().released, 1);
    }

    #[test]
    fn test_drop_after_stop_does_not_release_twice() {
        let (mut s, log) = session(Vec::new());
        s.stop();
        drop(s);
        assert_eq!(log.borrow().released, 1);
    }
}
