/// Host-provided API key selection.
///
/// Only some deployments have one; without it the key is expected to come
/// from the configuration or the environment.
#[allow(async_fn_in_trait)]
pub trait KeySelector {
    async fn has_selected_key(&self) -> bool;

    /// Open the selection flow. Gives no indication whether the user picked a key.
    async fn open_key_selection(&self);
}

/// Stand-in type for controllers built without a key selector.
#[derive(Debug, Clone, Copy)]
pub enum NoKeySelector {}

impl KeySelector for NoKeySelector {
    async fn has_selected_key(&self) -> bool {
        match *self {}
    }

    async fn open_key_selection(&self) {
        match *self {}
    }
}
