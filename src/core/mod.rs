pub mod events;
pub mod models;
pub mod prefs;
pub mod registry;
pub mod routing;
pub mod scope;
pub mod store;
pub mod visibility;
