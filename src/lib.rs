//! Wire entity model for a logic circuit editor.
//!
//! A [`Wire`](wire::Wire) connects two [`Pin`](pin::Pin)s with an editable,
//! curved path. It follows its pins as they move, derives its colour and depth
//! from the source pin's state and theme, and deletes itself when either pin
//! goes away. Rendering and hit-testing are delegated to swappable
//! [`PathRenderer`](render::PathRenderer) and [`HitShape`](hitshape::HitShape)
//! objects.

#[macro_use]
mod macros;

pub mod backend;
pub mod containers;
pub mod error;
pub mod events;
pub mod ext;
pub mod graph;
pub mod hitshape;
pub mod io;
pub mod path;
pub mod pin;
pub mod render;
pub mod state;
pub mod style;
pub mod theme;
pub mod wire;

pub type RwLock<T> = parking_lot::RwLock<T>;
pub type Mutex<T> = parking_lot::Mutex<T>;

pub use backend::{CurveBackend, WireBackend};
pub use error::{ErrorList, WireError};
pub use graph::WireGraph;
pub use hitshape::{HitShape, PolylineHitShape};
pub use pin::{Pin, PinDirection, PinId};
pub use render::{CurvePathRenderer, PathRenderer};
pub use state::WireState;
pub use style::WireStyle;
pub use theme::{ThemePalette, WireColors, WireTheme};
pub use wire::{Wire, WireId, WireLifecycle, WireRef};
