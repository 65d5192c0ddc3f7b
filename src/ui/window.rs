use std::cell::RefCell;

use gtk4::glib;
use gtk4::prelude::*;
use libadwaita::prelude::*;

use logo_animator::app::{DEFAULT_ANIMATION_PROMPT, UiEvent, UiState};
use logo_animator::asset::{AspectRatio, LogoAsset, VideoAsset};
use logo_animator::export;

/// Handles returned from building the main window.
pub struct WindowWidgets {
    pub window: libadwaita::ApplicationWindow,
    pub api_key_button: gtk4::Button,
    // Step 1: design
    pub description_view: gtk4::TextView,
    pub generate_button: gtk4::Button,
    pub upload_button: gtk4::Button,
    pub logo_picture: gtk4::Picture,
    pub logo_spinner: gtk4::Spinner,
    pub logo_status: gtk4::Label,
    // Step 2: animate
    pub animate_group: libadwaita::PreferencesGroup,
    pub prompt_view: gtk4::TextView,
    pub ratio_buttons: Vec<(AspectRatio, gtk4::ToggleButton)>,
    pub animate_button: gtk4::Button,
    pub cancel_button: gtk4::Button,
    pub save_button: gtk4::Button,
    pub video: gtk4::Video,
    pub video_spinner: gtk4::Spinner,
    pub progress_label: gtk4::Label,
    // Messages
    pub error_label: gtk4::Label,
    pub notice_label: gtk4::Label,
    // What is currently displayed, to avoid reloading media on every render
    shown_logo: RefCell<Option<LogoAsset>>,
    shown_video: RefCell<Option<String>>,
}

/// Build the main window. Widgets report user actions on `ui_sender`.
pub fn build_window(
    app: &libadwaita::Application,
    ui_sender: async_channel::Sender<UiEvent>,
) -> WindowWidgets {
    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Logo Animator")
        .default_width(720)
        .default_height(820)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();

    let api_key_button = gtk4::Button::from_icon_name("dialog-password-symbolic");
    api_key_button.set_tooltip_text(Some("Gemini API key"));
    header.pack_end(&api_key_button);

    toolbar_view.add_top_bar(&header);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.set_margin_top(12);
    content.set_margin_bottom(12);

    // --- Design group ---
    let design_group = libadwaita::PreferencesGroup::new();
    design_group.set_title("1. Design Your Logo");
    design_group.set_description(Some("Describe your company and the logo you envision."));

    let description_view = text_view(
        "",
        ui_sender.clone(),
        UiEvent::DescriptionChanged,
    );
    design_group.add(&framed(&description_view));

    let generate_button = gtk4::Button::builder()
        .label("Generate with AI")
        .margin_top(8)
        .build();
    generate_button.add_css_class("suggested-action");
    send_on_click(&generate_button, ui_sender.clone(), || UiEvent::GenerateLogo);
    design_group.add(&generate_button);

    let upload_button = gtk4::Button::builder()
        .label("Upload an Image")
        .margin_top(8)
        .build();
    {
        let sender = ui_sender.clone();
        let win = window.clone();
        upload_button.connect_clicked(move |_| {
            let sender = sender.clone();
            let win = win.clone();
            glib::spawn_future_local(async move {
                let filter = gtk4::FileFilter::new();
                filter.set_name(Some("Images"));
                filter.add_mime_type("image/*");
                let dialog = gtk4::FileDialog::builder()
                    .title("Upload an Image")
                    .modal(true)
                    .default_filter(&filter)
                    .build();
                match dialog.open_future(Some(&win)).await {
                    Ok(file) => match file.path() {
                        Some(path) => {
                            let _ = sender.send(UiEvent::UploadImage(path)).await;
                        }
                        None => log::warn!("Selected file has no local path"),
                    },
                    Err(e) => log::debug!("Upload dialog dismissed: {e}"),
                }
            });
        });
    }
    design_group.add(&upload_button);

    let logo_picture = gtk4::Picture::builder()
        .content_fit(gtk4::ContentFit::Contain)
        .height_request(280)
        .margin_top(12)
        .build();
    let logo_spinner = gtk4::Spinner::new();
    let logo_status = gtk4::Label::new(Some("Your generated logo will appear here"));
    logo_status.add_css_class("dim-label");
    design_group.add(&logo_picture);
    design_group.add(&status_row(&logo_spinner, &logo_status));

    content.append(&design_group);
    content.append(&gtk4::Separator::new(gtk4::Orientation::Horizontal));

    // --- Animate group ---
    let animate_group = libadwaita::PreferencesGroup::new();
    animate_group.set_title("2. Animate Your Logo");
    animate_group.set_description(Some("Describe the animation."));
    animate_group.set_margin_top(12);

    let prompt_view = text_view(
        DEFAULT_ANIMATION_PROMPT,
        ui_sender.clone(),
        UiEvent::AnimationPromptChanged,
    );
    animate_group.add(&framed(&prompt_view));

    let ratio_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    ratio_box.set_homogeneous(true);
    ratio_box.set_margin_top(8);
    let mut ratio_buttons: Vec<(AspectRatio, gtk4::ToggleButton)> = Vec::new();
    for ratio in AspectRatio::ALL {
        let button = gtk4::ToggleButton::with_label(ratio.label());
        if let Some((_, first)) = ratio_buttons.first() {
            button.set_group(Some(first));
        }
        button.set_active(ratio == AspectRatio::default());
        let sender = ui_sender.clone();
        button.connect_toggled(move |b| {
            if b.is_active() {
                let _ = sender.try_send(UiEvent::AspectRatioChanged(ratio));
            }
        });
        ratio_box.append(&button);
        ratio_buttons.push((ratio, button));
    }
    animate_group.add(&ratio_box);

    let button_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    button_box.set_margin_top(8);
    let animate_button = gtk4::Button::builder()
        .label("Animate Logo")
        .hexpand(true)
        .build();
    animate_button.add_css_class("suggested-action");
    send_on_click(&animate_button, ui_sender.clone(), || UiEvent::Animate);
    let cancel_button = gtk4::Button::with_label("Cancel");
    cancel_button.add_css_class("destructive-action");
    send_on_click(&cancel_button, ui_sender.clone(), || UiEvent::CancelAnimation);
    button_box.append(&animate_button);
    button_box.append(&cancel_button);
    animate_group.add(&button_box);

    let video = gtk4::Video::builder()
        .autoplay(true)
        .loop_(true)
        .height_request(320)
        .margin_top(12)
        .build();
    let video_spinner = gtk4::Spinner::new();
    let progress_label = gtk4::Label::new(None);
    progress_label.add_css_class("dim-label");
    animate_group.add(&video);
    animate_group.add(&status_row(&video_spinner, &progress_label));

    let save_button = gtk4::Button::builder()
        .label("Save Video…")
        .margin_top(8)
        .build();
    {
        let sender = ui_sender.clone();
        let win = window.clone();
        save_button.connect_clicked(move |_| {
            let sender = sender.clone();
            let win = win.clone();
            glib::spawn_future_local(async move {
                let dialog = gtk4::FileDialog::builder()
                    .title("Save Animation")
                    .modal(true)
                    .initial_name(export::default_file_name())
                    .initial_folder(&gtk4::gio::File::for_path(export::default_dir()))
                    .build();
                match dialog.save_future(Some(&win)).await {
                    Ok(file) => match file.path() {
                        Some(path) => {
                            let _ = sender.send(UiEvent::ExportVideo(path)).await;
                        }
                        None => log::warn!("Chosen location has no local path"),
                    },
                    Err(e) => log::debug!("Save dialog dismissed: {e}"),
                }
            });
        });
    }
    animate_group.add(&save_button);

    content.append(&animate_group);

    // --- Messages ---
    let error_label = gtk4::Label::new(None);
    error_label.add_css_class("error");
    error_label.set_wrap(true);
    error_label.set_margin_top(12);
    let notice_label = gtk4::Label::new(None);
    notice_label.add_css_class("accent");
    notice_label.set_wrap(true);
    notice_label.set_margin_top(12);
    let dismiss = gtk4::GestureClick::new();
    {
        let sender = ui_sender;
        dismiss.connect_released(move |_, _, _, _| {
            let _ = sender.try_send(UiEvent::DismissMessage);
        });
    }
    error_label.add_controller(dismiss);
    content.append(&error_label);
    content.append(&notice_label);

    // Assemble
    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .child(&content)
        .build();
    toolbar_view.set_content(Some(&scrolled));
    window.set_content(Some(&toolbar_view));

    WindowWidgets {
        window,
        api_key_button,
        description_view,
        generate_button,
        upload_button,
        logo_picture,
        logo_spinner,
        logo_status,
        animate_group,
        prompt_view,
        ratio_buttons,
        animate_button,
        cancel_button,
        save_button,
        video,
        video_spinner,
        progress_label,
        error_label,
        notice_label,
        shown_logo: RefCell::new(None),
        shown_video: RefCell::new(None),
    }
}

/// Bring every widget in line with `state`. Text inputs are left alone; they
/// are the source of their own values.
pub fn render(w: &WindowWidgets, state: &UiState) {
    let logo_busy = state.is_generating_logo;
    let video_busy = state.is_generating_video;
    let busy = state.is_busy();

    w.description_view.set_editable(!busy);
    w.generate_button.set_sensitive(!busy);
    w.generate_button
        .set_label(if logo_busy { "Generating..." } else { "Generate with AI" });
    w.upload_button.set_sensitive(!busy);
    w.logo_spinner.set_spinning(logo_busy);
    w.logo_spinner.set_visible(logo_busy);
    w.logo_status.set_text(if logo_busy {
        "Conjuring up your logo..."
    } else if state.logo.is_some() {
        ""
    } else {
        "Your generated logo will appear here"
    });
    show_logo(w, state.logo.as_ref());

    w.animate_group.set_visible(state.logo.is_some());
    w.prompt_view.set_editable(!video_busy);
    for (ratio, button) in &w.ratio_buttons {
        button.set_sensitive(!video_busy);
        if *ratio == state.aspect_ratio && !button.is_active() {
            button.set_active(true);
        }
    }
    w.animate_button.set_sensitive(state.can_animate() && !logo_busy);
    w.animate_button
        .set_label(if video_busy { "Animating..." } else { "Animate Logo" });
    w.cancel_button.set_visible(video_busy);
    w.video_spinner.set_spinning(video_busy);
    w.video_spinner.set_visible(video_busy);
    w.progress_label.set_text(if video_busy && state.progress.is_empty() {
        "Animating your vision..."
    } else {
        state.progress.as_str()
    });
    w.video.set_visible(state.video.is_some() && !video_busy);
    show_video(w, state.video.as_ref());
    w.save_button
        .set_sensitive(state.video.is_some() && !state.is_busy());

    let error = state.error.as_deref().unwrap_or_default();
    w.error_label.set_text(error);
    w.error_label.set_visible(!error.is_empty());
    let notice = state.notice.as_deref().unwrap_or_default();
    w.notice_label.set_text(notice);
    w.notice_label.set_visible(!notice.is_empty());
}

fn show_logo(w: &WindowWidgets, logo: Option<&LogoAsset>) {
    if w.shown_logo.borrow().as_ref() == logo {
        return;
    }
    *w.shown_logo.borrow_mut() = logo.cloned();

    let Some(logo) = logo else {
        w.logo_picture.set_paintable(None::<&gtk4::gdk::Paintable>);
        return;
    };
    let bytes = glib::Bytes::from(&logo.bytes[..]);
    match gtk4::gdk::Texture::from_bytes(&bytes) {
        Ok(texture) => w.logo_picture.set_paintable(Some(&texture)),
        Err(e) => {
            log::warn!("Could not decode logo image: {e}");
            w.logo_picture.set_paintable(None::<&gtk4::gdk::Paintable>);
        }
    }
}

fn show_video(w: &WindowWidgets, video: Option<&VideoAsset>) {
    let uri = video.map(|v| v.source_uri.clone());
    if *w.shown_video.borrow() == uri {
        return;
    }
    *w.shown_video.borrow_mut() = uri;

    let Some(video) = video else {
        w.video.set_media_stream(None::<&gtk4::MediaStream>);
        return;
    };
    let stream = gtk4::gio::MemoryInputStream::from_bytes(&glib::Bytes::from(&video.bytes[..]));
    let media = gtk4::MediaFile::for_input_stream(&stream);
    media.set_loop(true);
    w.video.set_media_stream(Some(&media));
    media.play();
}

fn text_view(
    initial: &str,
    sender: async_channel::Sender<UiEvent>,
    event: fn(String) -> UiEvent,
) -> gtk4::TextView {
    let view = gtk4::TextView::builder()
        .wrap_mode(gtk4::WrapMode::WordChar)
        .height_request(96)
        .top_margin(8)
        .bottom_margin(8)
        .left_margin(8)
        .right_margin(8)
        .build();
    let buffer = view.buffer();
    buffer.set_text(initial);
    buffer.connect_changed(move |b| {
        let text = b.text(&b.start_iter(), &b.end_iter(), false).to_string();
        let _ = sender.try_send(event(text));
    });
    view
}

fn framed(child: &impl IsA<gtk4::Widget>) -> gtk4::Frame {
    let frame = gtk4::Frame::new(None);
    frame.set_child(Some(child));
    frame
}

fn status_row(spinner: &gtk4::Spinner, label: &gtk4::Label) -> gtk4::Box {
    let row = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    row.set_halign(gtk4::Align::Center);
    row.set_margin_top(8);
    spinner.set_visible(false);
    row.append(spinner);
    row.append(label);
    row
}

fn send_on_click(
    button: &gtk4::Button,
    sender: async_channel::Sender<UiEvent>,
    event: impl Fn() -> UiEvent + 'static,
) {
    button.connect_clicked(move |_| {
        let _ = sender.try_send(event());
    });
}
