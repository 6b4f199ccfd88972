//! DOM render surface
//!
//! Every object is an absolutely positioned element inside the machine
//! container. Machine parts bind to elements already in the page; toys get
//! elements created on first use, with the sprite as a background image.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use super::{Surface, claw_class, toy_class};
use crate::catalog::ToyMeta;
use crate::sim::{ClawVisual, ObjectId, Placement, Toy, ToyVisual};

const CLAW_CLASSES: [ClawVisual; 4] = [
    ClawVisual::Resting,
    ClawVisual::Open,
    ClawVisual::Grabbed,
    ClawVisual::Missed,
];

const TOY_CLASSES: [ToyVisual; 4] = [
    ToyVisual::Normal,
    ToyVisual::Grabbed,
    ToyVisual::Selected,
    ToyVisual::Collected,
];

pub struct DomSurface {
    document: Document,
    container: Element,
    elements: HashMap<ObjectId, HtmlElement>,
    /// Last placement written per object
    applied: HashMap<ObjectId, Placement>,
    claw: Option<HtmlElement>,
    /// Sprite URL currently shown per toy element
    sprites: HashMap<ObjectId, String>,
}

impl DomSurface {
    /// Attach to the container element with id `container_id`
    pub fn new(container_id: &str) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let container = document.get_element_by_id(container_id)?;
        Some(Self {
            document,
            container,
            elements: HashMap::new(),
            applied: HashMap::new(),
            claw: None,
            sprites: HashMap::new(),
        })
    }

    /// Drive an existing page element from `object`
    pub fn bind(&mut self, object: ObjectId, element_id: &str) {
        match self.html_element(element_id) {
            Some(el) => {
                if let Some(created) = self.elements.insert(object, el) {
                    created.remove();
                }
                self.applied.remove(&object);
            }
            None => log::warn!("No element #{} for {:?}", element_id, object),
        }
    }

    /// Element whose class reflects the claw state
    pub fn bind_claw(&mut self, element_id: &str) {
        self.claw = self.html_element(element_id);
        if self.claw.is_none() {
            log::warn!("No claw element #{}", element_id);
        }
    }

    fn html_element(&self, element_id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(element_id)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    /// Bound element for `object`, creating a new one in the container if needed
    fn element(&mut self, object: ObjectId) -> Option<HtmlElement> {
        if let Some(el) = self.elements.get(&object) {
            return Some(el.clone());
        }
        let el: HtmlElement = self.document.create_element("div").ok()?.dyn_into().ok()?;
        let _ = el.style().set_property("position", "absolute");
        let _ = el.set_attribute("data-object", &object.0.to_string());
        self.container.append_child(&el).ok()?;
        self.elements.insert(object, el.clone());
        Some(el)
    }
}

impl Surface for DomSurface {
    fn apply_placement(&mut self, object: ObjectId, placement: &Placement) {
        if self.applied.get(&object) == Some(placement) {
            return;
        }
        let Some(el) = self.element(object) else {
            log::warn!("Could not create element for {:?}", object);
            return;
        };
        let style = el.style();
        let _ = style.set_property("left", &format!("{}px", placement.pos.x));
        let _ = style.set_property("top", &format!("{}px", placement.pos.y));
        let _ = style.set_property("width", &format!("{}px", placement.size.x));
        let _ = style.set_property("height", &format!("{}px", placement.size.y));
        let _ = style.set_property("z-index", &placement.z.to_string());
        let _ = style.set_property(
            "transform-origin",
            &format!("{}px {}px", placement.origin.x, placement.origin.y),
        );
        let _ = style.set_property("transform", &format!("rotate({}deg)", placement.angle));
        self.applied.insert(object, *placement);
    }

    fn set_claw_visual(&mut self, visual: ClawVisual) {
        let Some(claw) = &self.claw else {
            return;
        };
        let classes = claw.class_list();
        for v in CLAW_CLASSES {
            let _ = classes.remove_1(claw_class(v));
        }
        let _ = classes.add_1(claw_class(visual));
    }

    fn set_toy_visual(&mut self, toy: &Toy, meta: Option<&ToyMeta>) {
        let Some(el) = self.element(toy.object) else {
            return;
        };
        let _ = el.set_attribute("data-spawn-index", &toy.spawn_index.to_string());
        let _ = el.set_attribute("data-toy-id", &toy.toy_id);

        let classes = el.class_list();
        let _ = classes.add_1("toy");
        for v in TOY_CLASSES {
            let _ = classes.remove_1(toy_class(v));
        }
        let _ = classes.add_1(toy_class(toy.visual));

        let Some(meta) = meta else {
            return;
        };
        let url = meta.data_url(toy.visual);
        if self.sprites.get(&toy.object) == Some(&url) {
            return;
        }
        let style = el.style();
        let _ = style.set_property("background-image", &format!("url(\"{}\")", url));
        let _ = style.set_property("background-repeat", "no-repeat");
        let _ = style.set_property(
            "background-size",
            &format!("{}px {}px", meta.sprite_width, meta.sprite_height),
        );
        let _ = style.set_property(
            "background-position",
            &format!("{}px {}px", meta.sprite_left, meta.sprite_top),
        );
        self.sprites.insert(toy.object, url);
    }
}
