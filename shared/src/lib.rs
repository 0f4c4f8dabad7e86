pub mod assets;
pub mod catalog;
pub mod compositor;
pub mod draw;
pub mod filter;
pub mod landmark;
pub mod render_data;
pub mod session;
pub mod store;

pub use assets::AssetRemap;
pub use catalog::{CatalogState, CatalogWarning, DatasetError, MapLayout, SeedCatalog, SeedRecord};
pub use compositor::{RenderPlan, plan};
pub use filter::{FilterOutcome, filter_seeds};
pub use landmark::*;
pub use render_data::RenderDataset;
pub use session::{Generation, Session, SessionError};
pub use store::LandmarkStore;

/// Side length of the interactive marking canvas, in canvas pixels.
pub const CANVAS_SIZE: f64 = 768.0;
/// Marker diameter on the marking canvas; also the hit-test diameter.
pub const ICON_SIZE: f64 = 38.0;
