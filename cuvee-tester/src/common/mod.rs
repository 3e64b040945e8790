pub mod util;

pub use util::{load_process_config, split_csv};
