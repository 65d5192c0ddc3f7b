mod ui;

use std::cell::RefCell;
use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;

use logo_animator::app::{Controller, UiEvent};
use logo_animator::config::{Config, SharedApiKey};
use logo_animator::gemini::{GeminiRest, GenerationClient};
use ui::key_dialog::DialogKeySelector;

fn main() -> glib::ExitCode {
    env_logger::init();
    log::info!("Logo Animator starting");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            return glib::ExitCode::FAILURE;
        }
    };
    // The poll loop's timers are created on the GTK thread.
    let _guard = runtime.enter();
    let handle = runtime.handle().clone();

    let application = libadwaita::Application::builder()
        .application_id("com.github.tr4m0ryp.logo-animator")
        .build();

    application.connect_activate(move |app| on_activate(app, handle.clone()));
    application.run()
}

fn on_activate(app: &libadwaita::Application, runtime: tokio::runtime::Handle) {
    let config = Config::load();
    if !config.has_api_key() {
        log::warn!("No Gemini API key configured; you will be asked for one");
    }
    let api_key = SharedApiKey::new(config.gemini_api_key.clone());
    let backend = GeminiRest::new(&config, api_key.clone()).with_runtime(runtime);
    let client = GenerationClient::new(backend, &config);

    // Widgets -> controller
    let (ui_tx, ui_rx) = async_channel::unbounded::<UiEvent>();

    let widgets = Rc::new(ui::window::build_window(app, ui_tx));
    let keys = DialogKeySelector::new(
        widgets.window.clone(),
        Rc::new(RefCell::new(config)),
        api_key,
    );
    let controller = Rc::new(Controller::with_key_selector(client, keys.clone()));

    // Wire up the API key button
    widgets.api_key_button.connect_clicked(move |_| {
        let keys = keys.clone();
        glib::spawn_future_local(async move { keys.show().await });
    });

    // Re-render on every state change
    {
        let widgets_clone = widgets.clone();
        controller.subscribe(move |state| ui::window::render(&widgets_clone, state));
    }
    ui::window::render(&widgets, &controller.snapshot());
    widgets.window.present();

    // Attach UI event handler. Long actions get their own task so a running
    // animation does not hold up cancel or text edits.
    glib::spawn_future_local(async move {
        while let Ok(event) = ui_rx.recv().await {
            if event.is_long_running() {
                let controller = controller.clone();
                glib::spawn_future_local(async move { controller.handle_event(event).await });
            } else {
                controller.handle_event(event).await;
            }
        }
    });
}
