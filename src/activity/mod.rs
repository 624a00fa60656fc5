//! Host activity signals and the state they drive.

pub mod events;
pub mod feed;
pub mod reconciler;
pub mod store;

pub use events::HostEvent;
pub use reconciler::{Reaction, Reconciler};
pub use store::{ActivityStore, DisplayState, StoreChange};
