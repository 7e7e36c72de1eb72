pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, RouterData, default_catalog, load_router_data};
pub use schema::RouterConfig;
