pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, muted, section, status, success, summary_row, warn};
pub use table::{stats_table, vendor_table};
pub use theme::{theme, Theme, Tone};
