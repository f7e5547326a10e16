use bacco_telegram_rs::bot_command_handlers::{
    cancel_cmd, filter_cmd, history_cmd, invalid_cmd, login_cmd, photo_msg, recipes_cmd,
    register_cmd, reply_comment, reply_recipe_search_text, reply_search_term, search_cmd, start,
};
use bacco_telegram_rs::constants::{DEFAULT_API_URL, SEARCH_DEBOUNCE};
use bacco_telegram_rs::data_backend::bacco_api::BaccoApi;
use bacco_telegram_rs::data_types::{Command, DialogueState, SearchDebouncer};
use bacco_telegram_rs::session::SessionStore;
use bacco_telegram_rs::shared_main::{callback_handler, logger_init};

use clap::Parser;
use log::log_enabled;
use std::time::Duration;
use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        UpdateHandler,
    },
    prelude::*,
    utils::command::BotCommands,
};

/// Telegram bot that recognizes bottles from photos and suggests cocktail recipes
/// for what you have at hand.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The telegram bot token to be used
    #[arg(short, long, env = "TELOXIDE_TOKEN")]
    token: String,
    /// Base URL of the recipe and classifier backend
    #[arg(short, long, env = "BACCO_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Quiet time before a typed search term is looked up
    #[arg(long, env = "BACCO_SEARCH_DELAY_MS", default_value_t = SEARCH_DEBOUNCE.as_millis() as u64)]
    search_delay_ms: u64,
    /// Enable verbose logging (mostly request timings){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    //// Args setup
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());
    log::info!("Starting bot...");

    if !(log_enabled!(log::Level::Debug) || log_enabled!(log::Level::Trace)) {
        log::info!("Enable verbose logging for request timings");
    }

    let api = BaccoApi::new(&args.api_url);
    log::info!("Using backend at {}", args.api_url);

    let bot = Bot::new(args.token);
    bot.set_my_commands(Command::bot_commands()).await?;

    let command_handler_deps = dptree::deps![
        InMemStorage::<DialogueState>::new(),
        api,
        SessionStore::default(),
        SearchDebouncer::new(Duration::from_millis(args.search_delay_ms))
    ];
    Dispatcher::builder(bot, schema())
        .dependencies(command_handler_deps)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Bebida].endpoint(search_cmd))
        .branch(case![Command::Ingrediente].endpoint(search_cmd))
        .branch(case![Command::Historial].endpoint(history_cmd))
        .branch(case![Command::Recetas].endpoint(recipes_cmd))
        .branch(case![Command::Filtrar].endpoint(filter_cmd))
        .branch(case![Command::Login(args)].endpoint(login_cmd))
        .branch(case![Command::Registro(args)].endpoint(register_cmd))
        .branch(case![Command::Cancelar].endpoint(cancel_cmd));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(photo_msg))
        .branch(case![DialogueState::AwaitSearchTerm { kind }].endpoint(reply_search_term))
        .branch(case![DialogueState::AwaitRecipeSearchText].endpoint(reply_recipe_search_text))
        .branch(case![DialogueState::AwaitComment { recipe_id }].endpoint(reply_comment))
        .branch(dptree::endpoint(invalid_cmd));

    let callback_query_handler = Update::filter_callback_query().endpoint(callback_handler);

    dialogue::enter::<Update, InMemStorage<DialogueState>, DialogueState, _>()
        .branch(message_handler)
        .branch(callback_query_handler)
}
