//! Live element tree: the per-instance, mutable elements a component
//! owns after its template has been converted. Elements are handles
//! (clone = same node), carry attributes, typed properties, event
//! listeners and optionally a shadow root.

pub mod kstr;
pub mod property;
pub mod element;
pub mod print;
pub mod snapshot;

pub use element::{Element, DomEvent, Listener};
pub use property::PropertyValue;
pub use print::Print;
pub use snapshot::Snapshot;
pub use kstr::IntoKString;
