pub mod chat;
pub mod events;
pub mod feed;
pub mod models;
pub mod params;
pub mod request;
pub mod store;
pub mod templates;
