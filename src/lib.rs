pub mod bot_command_handlers;
pub mod bot_command_helpers;
pub mod constants;
pub mod data_backend;
pub mod data_types;
pub mod debounce;
pub mod errors;
pub mod recipe_engine;
pub mod session;
pub mod shared_main;

#[cfg(test)]
mod test_support;
