use chrono::{DateTime, Local};
use teloxide::utils::markdown;

pub mod bacco_api;
pub mod recipe_msg;

fn session_time_fmt(time: DateTime<Local>) -> String {
    time.format("%d/%m %H:%M").to_string()
}

// markdown helpers don't escape their input
fn bold(text: &str) -> String {
    markdown::bold(&markdown::escape(text))
}

fn italic(text: &str) -> String {
    markdown::italic(&markdown::escape(text))
}
