pub mod capabilities;
pub mod converters;
pub mod handlers;
pub mod server;

pub use server::Backend;
