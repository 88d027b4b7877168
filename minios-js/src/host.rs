//! Host bridge.
//!
//! The engine reaches the browser only through the five capabilities of
//! [`Host`]. Every call is synchronous, and none of them is handed the
//! executing context, so a callback cannot re-enter the evaluator.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Snapshot of a page element, copied out of host DOM state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Tag name.
    pub tag: String,
    /// Element ID.
    pub id: String,
    /// Class name.
    pub class_name: String,
    /// Inner text.
    pub inner_text: String,
    /// Inline style.
    pub style: String,
    /// Whether the element is rendered.
    pub visible: bool,
}

impl ElementSnapshot {
    /// Create a visible element with the given tag and ID.
    pub fn new(tag: &str, id: &str) -> Self {
        ElementSnapshot {
            tag: tag.into(),
            id: id.into(),
            visible: true,
            ..Self::default()
        }
    }

    /// Set the inner text.
    pub fn with_text(mut self, text: &str) -> Self {
        self.inner_text = text.into();
        self
    }

    /// Text property by its script-facing name.
    ///
    /// `visible` is not a text property and is read separately.
    pub fn text_property(&self, property: &str) -> Option<&str> {
        match property {
            "tag" | "tagName" => Some(&self.tag),
            "id" => Some(&self.id),
            "className" => Some(&self.class_name),
            "innerText" | "innerHTML" | "textContent" => Some(&self.inner_text),
            "style" => Some(&self.style),
            _ => None,
        }
    }
}

/// Browser capabilities available to scripts.
///
/// Every method defaults to doing nothing, so a host implements only what it
/// supports.
pub trait Host {
    /// Show a modal message.
    fn alert(&mut self, _message: &str) {}

    /// Append a line to the page console.
    fn console_log(&mut self, _message: &str) {}

    /// Look up an element by ID.
    fn get_element(&mut self, _id: &str) -> Option<ElementSnapshot> {
        None
    }

    /// Write an element property (`innerText`, `style`, `visible`, ...).
    fn set_element_property(&mut self, _id: &str, _property: &str, _value: &str) {}

    /// Start playing an audio source.
    fn play_audio(&mut self, _src: &str) {}
}

type MessageFn = Box<dyn FnMut(&str)>;
type GetElementFn = Box<dyn FnMut(&str) -> Option<ElementSnapshot>>;
type SetElementFn = Box<dyn FnMut(&str, &str, &str)>;

/// A [`Host`] assembled from independent closures.
///
/// Unset slots behave like the default no-op methods.
#[derive(Default)]
pub struct Callbacks {
    alert: Option<MessageFn>,
    console: Option<MessageFn>,
    get_element: Option<GetElementFn>,
    set_element: Option<SetElementFn>,
    play_audio: Option<MessageFn>,
}

impl Callbacks {
    /// Create an empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alert callback.
    pub fn on_alert(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.alert = Some(Box::new(f));
        self
    }

    /// Set the console callback.
    pub fn on_console(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.console = Some(Box::new(f));
        self
    }

    /// Set the element lookup callback.
    pub fn on_get_element(
        mut self,
        f: impl FnMut(&str) -> Option<ElementSnapshot> + 'static,
    ) -> Self {
        self.get_element = Some(Box::new(f));
        self
    }

    /// Set the element property callback.
    pub fn on_set_element(mut self, f: impl FnMut(&str, &str, &str) + 'static) -> Self {
        self.set_element = Some(Box::new(f));
        self
    }

    /// Set the audio callback.
    pub fn on_play_audio(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.play_audio = Some(Box::new(f));
        self
    }
}

impl Host for Callbacks {
    fn alert(&mut self, message: &str) {
        if let Some(f) = self.alert.as_mut() {
            f(message);
        }
    }

    fn console_log(&mut self, message: &str) {
        if let Some(f) = self.console.as_mut() {
            f(message);
        }
    }

    fn get_element(&mut self, id: &str) -> Option<ElementSnapshot> {
        self.get_element.as_mut().and_then(|f| f(id))
    }

    fn set_element_property(&mut self, id: &str, property: &str, value: &str) {
        if let Some(f) = self.set_element.as_mut() {
            f(id, property, value);
        }
    }

    fn play_audio(&mut self, src: &str) {
        if let Some(f) = self.play_audio.as_mut() {
            f(src);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("alert", &self.alert.is_some())
            .field("console", &self.console.is_some())
            .field("get_element", &self.get_element.is_some())
            .field("set_element", &self.set_element.is_some())
            .field("play_audio", &self.play_audio.is_some())
            .finish()
    }
}
