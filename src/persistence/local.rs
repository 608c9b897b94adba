//! Browser LocalStorage (wasm32)

use web_sys::wasm_bindgen::JsValue;

use super::Storage;
use crate::error::{Error, Result};

fn js_error(context: &str, err: JsValue) -> Error {
    Error::Storage(std::io::Error::other(format!("{}: {:?}", context, err)))
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// The window's LocalStorage, if the browser grants it
    pub fn open() -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| Error::Initialization("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| js_error("localStorage", e))?
            .ok_or_else(|| Error::Initialization("localStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(|e| js_error("getItem", e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| js_error("setItem", e))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| js_error("removeItem", e))
    }
}
