//! Toy catalog: sprite and geometry metadata per toy type
//!
//! The catalog is fetched once at startup. Any failure degrades to an empty
//! catalog; the machine still runs, every grab just misses.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::toys::ToyVisual;

/// Errors while loading the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog request failed: {0}")]
    Fetch(String),

    #[error("catalog entry `{id}` has a non-positive size")]
    InvalidSize { id: String },
}

/// Immutable metadata for one toy type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToyMeta {
    pub w: f32,
    pub h: f32,
    pub sprite_width: f32,
    pub sprite_height: f32,
    pub sprite_top: f32,
    pub sprite_left: f32,
    pub mime_type: String,
    /// Inline-encoded image payloads
    pub sprite_normal: String,
    #[serde(default)]
    pub sprite_grabbed: Option<String>,
    #[serde(default)]
    pub sprite_collected: Option<String>,
}

impl ToyMeta {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    /// Sprite payload for a visual state, falling back to the normal sprite
    pub fn sprite_for(&self, visual: ToyVisual) -> &str {
        let specific = match visual {
            ToyVisual::Normal | ToyVisual::Selected => None,
            ToyVisual::Grabbed => self.sprite_grabbed.as_deref(),
            ToyVisual::Collected => self.sprite_collected.as_deref(),
        };
        specific.unwrap_or(&self.sprite_normal)
    }

    /// `data:` URL for a visual state
    pub fn data_url(&self, visual: ToyVisual) -> String {
        format!("data:{};base64,{}", self.mime_type, self.sprite_for(visual))
    }
}

/// Toy type id -> metadata, ordered by id for reproducible sampling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, ToyMeta>,
}

impl Catalog {
    pub fn new(entries: BTreeMap<String, ToyMeta>) -> Self {
        Self { entries }
    }

    /// Parse the catalog response body
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        if let Some((id, _)) = catalog
            .entries
            .iter()
            .find(|(_, meta)| !(meta.w > 0.0 && meta.h > 0.0))
        {
            return Err(CatalogError::InvalidSize { id: id.clone() });
        }
        Ok(catalog)
    }

    /// Parse, logging and degrading to an empty catalog on failure
    pub fn from_json_or_empty(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(catalog) => {
                log::info!("Loaded toy catalog ({} entries)", catalog.len());
                catalog
            }
            Err(e) => {
                log::error!("Failed to load toy catalog: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ToyMeta> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch the catalog from `url` (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub async fn fetch(url: &str) -> Result<Self, CatalogError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let fetch_err = |e: wasm_bindgen::JsValue| CatalogError::Fetch(format!("{:?}", e));

        let window = web_sys::window().ok_or_else(|| CatalogError::Fetch("no window".into()))?;
        let init = web_sys::RequestInit::new();
        init.set_method("GET");
        init.set_mode(web_sys::RequestMode::Cors);
        let request = web_sys::Request::new_with_str_and_init(url, &init).map_err(fetch_err)?;

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(fetch_err)?;
        let response: web_sys::Response = response.dyn_into().map_err(fetch_err)?;
        if !response.ok() {
            return Err(CatalogError::Fetch(format!("HTTP {}", response.status())));
        }

        let text = JsFuture::from(response.text().map_err(fetch_err)?)
            .await
            .map_err(fetch_err)?;
        let body = text
            .as_string()
            .ok_or_else(|| CatalogError::Fetch("response body is not text".into()))?;
        Self::from_json(&body)
    }

    /// Fetch, logging and degrading to an empty catalog on failure (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub async fn fetch_or_empty(url: &str) -> Self {
        match Self::fetch(url).await {
            Ok(catalog) => {
                log::info!("Fetched toy catalog ({} entries)", catalog.len());
                catalog
            }
            Err(e) => {
                log::error!("Toy catalog unavailable, running without toys: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn meta(w: f32, h: f32) -> ToyMeta {
        ToyMeta {
            w,
            h,
            sprite_width: w,
            sprite_height: h,
            sprite_top: 0.0,
            sprite_left: 0.0,
            mime_type: "image/png".into(),
            sprite_normal: "Tk9STUFM".into(),
            sprite_grabbed: None,
            sprite_collected: Some("Q09MTA==".into()),
        }
    }

    pub fn catalog(ids: &[&str]) -> Catalog {
        Catalog::new(ids.iter().map(|id| (id.to_string(), meta(60.0, 40.0))).collect())
    }

    #[test]
    fn test_parse_camel_case() {
        let json = r#"{
            "bear": {
                "w": 60, "h": 40,
                "spriteWidth": 64, "spriteHeight": 48,
                "spriteTop": -4, "spriteLeft": -2,
                "mimeType": "image/webp",
                "spriteNormal": "AAAA",
                "spriteGrabbed": "BBBB"
            }
        }"#;
        let catalog = Catalog::from_json(json).expect("valid catalog");
        let bear = catalog.get("bear").expect("bear");
        assert_eq!(bear.size(), Vec2::new(60.0, 40.0));
        assert_eq!(bear.sprite_top, -4.0);
        assert!(bear.sprite_collected.is_none());
        assert_eq!(bear.data_url(ToyVisual::Grabbed), "data:image/webp;base64,BBBB");
        assert_eq!(bear.sprite_for(ToyVisual::Collected), "AAAA");
    }

    #[test]
    fn test_malformed_catalog_is_empty() {
        let catalog = Catalog::from_json_or_empty("{not json");
        assert!(catalog.is_empty());
        assert!(matches!(Catalog::from_json("[1,2]"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_rejects_degenerate_size() {
        let mut entries = BTreeMap::new();
        entries.insert("flat".to_string(), meta(60.0, 0.0));
        let json = serde_json::to_string(&Catalog::new(entries)).expect("serialize");
        assert!(matches!(
            Catalog::from_json(&json),
            Err(CatalogError::InvalidSize { id }) if id == "flat"
        ));
    }

    #[test]
    fn test_ids_are_sorted() {
        let catalog = catalog(&["owl", "bear", "cat"]);
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["bear", "cat", "owl"]);
    }
}
