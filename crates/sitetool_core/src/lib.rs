pub mod audit;
pub mod config;
pub mod error;
mod html;
pub mod inject;
pub mod locales;
pub mod prerender;
pub mod reconcile;
pub mod routes;
pub mod runtime;
pub mod sitemap;
