use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use libadwaita::prelude::*;

use logo_animator::app::KeySelector;
use logo_animator::config::{Config, SharedApiKey};

/// Key selection backed by a modal dialog and the config file.
#[derive(Clone)]
pub struct DialogKeySelector {
    parent: libadwaita::ApplicationWindow,
    config: Rc<RefCell<Config>>,
    api_key: SharedApiKey,
}

impl DialogKeySelector {
    pub fn new(
        parent: libadwaita::ApplicationWindow,
        config: Rc<RefCell<Config>>,
        api_key: SharedApiKey,
    ) -> Self {
        Self {
            parent,
            config,
            api_key,
        }
    }

    /// Show the key dialog and store the key if the user saves one.
    pub async fn show(&self) {
        let dialog = libadwaita::AlertDialog::builder()
            .heading("Select API Key")
            .body("Video generation requires a Gemini API key with billing enabled.\nSee https://ai.google.dev/gemini-api/docs/billing")
            .build();
        dialog.add_response("cancel", "Cancel");
        dialog.add_response("save", "Save");
        dialog.set_response_appearance("save", libadwaita::ResponseAppearance::Suggested);
        dialog.set_default_response(Some("save"));
        dialog.set_close_response("cancel");

        let key_row = libadwaita::PasswordEntryRow::builder()
            .title("API Key")
            .text(self.api_key.get().unwrap_or_default())
            .build();
        let list = gtk4::ListBox::new();
        list.add_css_class("boxed-list");
        list.append(&key_row);
        dialog.set_extra_child(Some(&list));

        let response = dialog.choose_future(Some(&self.parent)).await;
        if response.as_str() != "save" {
            log::info!("API key selection cancelled");
            return;
        }

        let key = key_row.text().trim().to_string();
        self.api_key.set(key.clone());
        let mut config = self.config.borrow_mut();
        config.gemini_api_key = key;
        if let Err(e) = config.save() {
            log::warn!("Failed to save config: {e}");
        }
        log::info!("API key updated");
    }
}

impl KeySelector for DialogKeySelector {
    async fn has_selected_key(&self) -> bool {
        self.api_key.get().is_some()
    }

    async fn open_key_selection(&self) {
        self.show().await;
    }
}
