//! Synthetic pointer event types.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Bitmask value for the primary button in `MouseEvent.buttons`
pub const PRIMARY_BUTTON_MASK: u16 = 1;

/// Pointer event kinds dispatched by the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEventKind {
    /// Button pressed
    Press,
    /// Pointer moved
    Move,
    /// Button released
    Release,
    /// Click (dispatched right after release)
    Click,
    /// Pointer entered the element (does not bubble)
    Enter,
    /// Pointer left the element (does not bubble)
    Leave,
    /// Pointer moved over the element (bubbles)
    Over,
    /// Pointer moved out of the element (bubbles)
    Out,
}

impl PointerEventKind {
    /// DOM event type name
    #[must_use]
    pub const fn dom_type(self) -> &'static str {
        match self {
            Self::Press => "mousedown",
            Self::Move => "mousemove",
            Self::Release => "mouseup",
            Self::Click => "click",
            Self::Enter => "mouseenter",
            Self::Leave => "mouseleave",
            Self::Over => "mouseover",
            Self::Out => "mouseout",
        }
    }

    /// Whether this event bubbles to ancestors
    #[must_use]
    pub const fn bubbles(self) -> bool {
        !matches!(self, Self::Enter | Self::Leave)
    }

    /// Whether this event can be cancelled
    #[must_use]
    pub const fn cancelable(self) -> bool {
        !matches!(self, Self::Enter | Self::Leave)
    }
}

/// A fully-specified synthetic mouse event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticEvent {
    /// Event kind
    pub kind: PointerEventKind,
    /// Viewport coordinates
    pub client: Point,
    /// Screen coordinates
    pub screen: Point,
    /// Button that changed state (0 = primary)
    pub button: i16,
    /// Buttons currently held
    pub buttons: u16,
    /// Whether the event bubbles
    pub bubbles: bool,
    /// Whether the event is cancelable
    pub cancelable: bool,
}

impl SyntheticEvent {
    /// Create an event at a client point
    #[must_use]
    pub fn new(kind: PointerEventKind, client: Point, screen_offset: Point, buttons: u16) -> Self {
        Self {
            kind,
            client,
            screen: client.offset(screen_offset),
            button: 0,
            buttons,
            bubbles: kind.bubbles(),
            cancelable: kind.cancelable(),
        }
    }

    /// Whether the primary button is held during this event
    #[must_use]
    pub const fn primary_held(&self) -> bool {
        self.buttons & PRIMARY_BUTTON_MASK != 0
    }
}
