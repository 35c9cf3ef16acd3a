pub mod budget;
pub mod fetcher;
pub mod frontier;
pub mod render;
pub mod web;

pub use fetcher::{Fetcher, HttpFetcher};
pub use render::Renderer;
pub use web::{CrawlProgress, SiteCrawler};
