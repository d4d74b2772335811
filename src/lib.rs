pub mod api;
pub mod config;
pub mod error;
pub mod ident;
pub mod negotiate;
pub mod observability;
pub mod routing;
pub mod sequence;
pub mod state;

mod util;
