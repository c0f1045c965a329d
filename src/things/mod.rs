pub mod db;
pub mod fetch;
pub mod locate;

pub use db::{RecordSource, ThingsDb};
pub use fetch::{next_watermark, Fetcher};
pub use locate::locate_database;
