pub mod header;
pub mod status;
pub mod utils;

pub use header::draw_header;
pub use status::{draw_status_bar, entry_label};
pub use utils::{active_color, format_amount, truncate};
