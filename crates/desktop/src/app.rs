use std::path::PathBuf;
use std::time::Duration;

use iced::widget::{checkbox, column, container, image, row, text, Space};
use iced::{window, Element, Length, Subscription, Task, Theme};

use facecam_core::pipeline::viewer_session::{TickOutcome, ViewerSession};
use facecam_core::shared::frame::Frame;

use crate::settings::Settings;
use crate::theme;

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    FacesToggled(bool),
    LandmarksToggled(bool),
    CloseRequested(window::Id),
}

pub struct App {
    session: Option<ViewerSession>,
    settings: Settings,
    /// Where toggles are persisted. `None` keeps them in memory only.
    settings_path: Option<PathBuf>,
    frame: Option<image::Handle>,
    fps: String,
}

impl App {
    pub fn new(
        session: Option<ViewerSession>,
        settings: Settings,
        settings_path: Option<PathBuf>,
    ) -> (Self, Task<Message>) {
        if session.is_none() {
            log::error!("Viewer started without a capture session");
        }
        (
            Self {
                session,
                settings,
                settings_path,
                frame: None,
                fps: "FPS: --".to_string(),
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.tick(),
            Message::FacesToggled(enabled) => {
                self.settings.detect_faces = enabled;
                self.persist();
            }
            Message::LandmarksToggled(enabled) => {
                self.settings.detect_landmarks = enabled;
                self.persist();
            }
            Message::CloseRequested(id) => {
                // Release the camera before the window goes away.
                if let Some(ref mut session) = self.session {
                    session.stop();
                }
                log::debug!("Close requested for window {id:?}");
                return iced::exit();
            }
        }
        Task::none()
    }

    fn persist(&self) {
        if let Some(ref path) = self.settings_path {
            self.settings.save_to(path);
        }
    }

    fn tick(&mut self) {
        let Some(ref mut session) = self.session else {
            return;
        };
        if let TickOutcome::Rendered { frame, metrics, .. } = session.tick(self.settings.options()) {
            let (width, height) = (frame.width(), frame.height());
            self.frame = Some(image::Handle::from_rgba(width, height, to_rgba(&frame)));
            self.fps = metrics.fps_label();
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let controls = column![
            checkbox(self.settings.detect_faces)
                .label("Detect faces")
                .on_toggle(Message::FacesToggled)
                .text_size(13),
            checkbox(self.settings.detect_landmarks)
                .label("Detect landmarks")
                .on_toggle(Message::LandmarksToggled)
                .text_size(13),
            Space::new().height(12),
            text(&self.fps).size(13),
        ]
        .spacing(8)
        .width(180);

        let video: Element<'_, Message> = match self.frame {
            Some(ref handle) => image(handle.clone()).into(),
            None => text("Waiting for camera...").size(14).into(),
        };

        row![
            controls,
            container(video)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill),
        ]
        .spacing(16)
        .padding(16)
        .into()
    }

    pub fn theme(&self) -> Theme {
        theme::viewer_theme()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let interval = Duration::from_millis(self.settings.tick_interval_ms.max(1));
        Subscription::batch([
            iced::time::every(interval).map(|_| Message::Tick),
            window::close_requests().map(Message::CloseRequested),
        ])
    }
}

/// Expands a frame to the RGBA layout iced image handles expect.
pub fn to_rgba(frame: &Frame) -> Vec<u8> {
    let rgb = frame.to_rgb();
    let mut out = Vec::with_capacity(rgb.data().len() / 3 * 4);
    for px in rgb.data().chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    out
}
