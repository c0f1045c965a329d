pub mod files;
pub mod section;
pub mod settings;
pub mod state;

pub use files::{atomic_write, ensure_logbook_dir, init_local_dir, settings_file, state_file};
pub use section::write_section;
pub use settings::{load_settings, save_settings, Settings};
pub use state::{load_state, save_state};
