pub mod key_dialog;
pub mod window;
