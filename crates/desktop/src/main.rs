mod app;
mod settings;
mod theme;

use std::cell::RefCell;
use std::process;

use facecam_core::pipeline::processor_factory::create_processor;
use facecam_core::pipeline::viewer_session::ViewerSession;
use facecam_core::video::infrastructure::camera_source::CameraSource;

use app::App;
use settings::Settings;

fn main() {
    env_logger::init();

    let settings = Settings::load();
    let session = match open_session(&settings) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // The boot closure may only hand the session over once.
    let session = RefCell::new(Some(session));
    let settings_path = Settings::config_path();

    let result = iced::application(
        move || App::new(session.borrow_mut().take(), settings.clone(), settings_path.clone()),
        App::update,
        App::view,
    )
    .title("FaceCam")
    .theme(App::theme)
    .subscription(App::subscription)
    .window(iced::window::Settings {
        size: iced::Size::new(980.0, 560.0),
        exit_on_close_request: false,
        ..Default::default()
    })
    .run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn open_session(settings: &Settings) -> Result<ViewerSession, Box<dyn std::error::Error>> {
    let engines = settings.engine_settings()?;
    let processor = create_processor(&settings.processor_config(), &engines, Some(download_progress))?;
    let camera = CameraSource::open(settings.camera_index)?;
    Ok(ViewerSession::new(Box::new(camera), processor))
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        log::debug!("Downloading {name}: {}%", downloaded * 100 / total);
    } else {
        log::debug!("Downloading {name}: {downloaded} bytes");
    }
}
