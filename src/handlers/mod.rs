mod shortcode;

pub use shortcode::{batch_handler, get_record_handler, redirect_handler, shorten_handler};
