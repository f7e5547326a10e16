use regex_lite::Regex;
use static_init::dynamic;
use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};
use teloxide_core::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::constants::{beverage_emoji, EMPTY_HISTORY_MSG, FETCH_FAILED_MSG, NO_CANDIDATES_MSG};
use crate::data_backend::{
    bacco_api::{option_names, BaccoApi},
    recipe_msg::{filter_msg, history_msg, recipe_list_msg},
};
use crate::data_types::{CallbackAction, HandlerResult, ItemKey};
use crate::errors::CommandArgsError;
use crate::recipe_engine::{match_annotator::AnnotatedRecipe, ItemKind};
use crate::session::{with_session, ScanSession, SessionStore};

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_data())
}

pub fn make_commands_keyrow() -> KeyboardMarkup {
    let keyboard = vec![
        vec![
            KeyboardButton::new("/bebida"),
            KeyboardButton::new("/ingrediente"),
            KeyboardButton::new("/historial"),
        ],
        vec![
            KeyboardButton::new("/recetas"),
            KeyboardButton::new("/filtrar"),
        ],
    ];
    KeyboardMarkup::new(keyboard).resize_keyboard(true)
}

pub fn make_scan_keyboard(name: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        button("Confirmar", CallbackAction::ConfirmScan(ItemKey::of(name))),
        button("Cancelar", CallbackAction::RejectScan),
    ]])
}

pub fn make_options_keyboard(kind: ItemKind, options: &[String]) -> InlineKeyboardMarkup {
    let keyboard = options.iter().map(|option| {
        [button(
            option.to_uppercase(),
            CallbackAction::Pick(kind, ItemKey::of(option)),
        )]
    });
    InlineKeyboardMarkup::new(keyboard)
}

pub fn make_history_keyboard(session: &ScanSession) -> InlineKeyboardMarkup {
    let mut keyboard = Vec::new();

    for kind in [ItemKind::Beverage, ItemKind::Ingredient] {
        for entry in session.selection.entries(kind) {
            let icon = match kind {
                ItemKind::Beverage => beverage_emoji(entry),
                ItemKind::Ingredient => "🍒",
            };
            keyboard.push([button(
                format!("✖ {} {}", icon, entry),
                CallbackAction::Remove(kind, ItemKey::of(entry)),
            )]);
        }
    }
    InlineKeyboardMarkup::new(keyboard)
}

pub fn make_recipes_keyboard(visible: &[AnnotatedRecipe]) -> InlineKeyboardMarkup {
    let keyboard = visible.iter().map(|recipe| {
        let complete = recipe.has_all_beverages() && recipe.has_all_ingredients();
        [button(
            format!(
                "{}{} ({}/{})",
                if complete { "✅ " } else { "" },
                recipe.recipe.name,
                recipe.have(),
                recipe.have() + recipe.missing()
            ),
            CallbackAction::ShowRecipe(recipe.recipe.id),
        )]
    });
    InlineKeyboardMarkup::new(keyboard)
}

/// History chips (two per row) followed by the search/apply/reset row.
pub fn make_filter_keyboard(session: &ScanSession) -> InlineKeyboardMarkup {
    let mut chips = Vec::new();
    for kind in [ItemKind::Beverage, ItemKind::Ingredient] {
        for chip in session.chips(kind) {
            let toggle = CallbackAction::ToggleChip(kind, ItemKey::of(&chip.name));
            let (label, action) = if !chip.enabled {
                (format!("🚫 {}", chip.name), CallbackAction::DisabledChip)
            } else if chip.selected {
                (format!("☑ {}", chip.name), toggle)
            } else {
                (format!("☐ {}", chip.name), toggle)
            };
            chips.push(button(label, action));
        }
    }

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> =
        chips.chunks(2).map(|row| row.to_vec()).collect();
    keyboard.push(vec![button("🔎 Buscar por nombre", CallbackAction::EditSearchText)]);
    keyboard.push(vec![
        button("Aplicar", CallbackAction::ApplyFilters),
        button("Limpiar", CallbackAction::ResetFilters),
    ]);
    InlineKeyboardMarkup::new(keyboard)
}

pub fn make_recipe_detail_keyboard(recipe_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[button(
        "💬 Comentar",
        CallbackAction::WriteComment(recipe_id),
    )]])
}

pub fn parse_login_args(args: &str) -> Result<(String, String), CommandArgsError> {
    #[dynamic]
    static RE: Regex = Regex::new(r"^\s*(\S+)\s+(\S+)\s*$").unwrap();

    let caps = RE.captures(args).ok_or(CommandArgsError::Login)?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// The name may contain spaces, email and password may not.
pub fn parse_register_args(args: &str) -> Result<(String, String, String), CommandArgsError> {
    #[dynamic]
    static RE: Regex = Regex::new(r"^\s*(.+?)\s+(\S+@\S+)\s+(\S+)\s*$").unwrap();

    let caps = RE.captures(args).ok_or(CommandArgsError::Register)?;
    Ok((
        caps[1].to_string(),
        caps[2].to_string(),
        caps[3].to_string(),
    ))
}

pub async fn send_history(bot: &Bot, chat_id: ChatId, sessions: &SessionStore) -> HandlerResult {
    let rendered = with_session(sessions, chat_id.0, |session| {
        if session.selection.is_empty() {
            None
        } else {
            Some((
                history_msg(&session.selection, session.started_at),
                make_history_keyboard(session),
            ))
        }
    })
    .await;

    match rendered {
        Some((text, keyboard)) => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, EMPTY_HISTORY_MSG).await?;
        }
    }
    Ok(())
}

/// Renders the ranked and filtered candidates of the session.
pub async fn send_recipe_list(
    bot: &Bot,
    chat_id: ChatId,
    sessions: &SessionStore,
) -> HandlerResult {
    let rendered = with_session(sessions, chat_id.0, |session| {
        let total = session.candidates.as_ref()?.recipes.len();
        let visible = session.visible_recipes()?;
        Some((
            recipe_list_msg(&visible, &session.criteria, total),
            make_recipes_keyboard(&visible),
        ))
    })
    .await;

    match rendered {
        Some((text, keyboard)) => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, NO_CANDIDATES_MSG).await?;
        }
    }
    Ok(())
}

pub async fn send_filter_panel(
    bot: &Bot,
    chat_id: ChatId,
    sessions: &SessionStore,
) -> HandlerResult {
    let rendered = with_session(sessions, chat_id.0, |session| {
        session.candidates.as_ref()?;
        Some((filter_msg(&session.criteria), make_filter_keyboard(session)))
    })
    .await;

    match rendered {
        Some((text, keyboard)) => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(keyboard)
                .await?;
        }
        None => {
            bot.send_message(chat_id, NO_CANDIDATES_MSG).await?;
        }
    }
    Ok(())
}

/// Looks up catalog names for the manual add flow and offers them as buttons.
/// The names are kept in the session so a pick can be resolved from its key.
pub async fn send_search_options(
    bot: &Bot,
    api: &BaccoApi,
    sessions: &SessionStore,
    chat_id: ChatId,
    kind: ItemKind,
    term: &str,
) -> HandlerResult {
    let options = match kind {
        ItemKind::Beverage => api
            .search_beverages(term)
            .await
            .map(|found| option_names(found.iter().map(|b| &b.name))),
        ItemKind::Ingredient => api
            .search_ingredients(term)
            .await
            .map(|found| option_names(found.iter().map(|i| &i.name))),
    };

    match options {
        Ok(options) if options.is_empty() => {
            bot.send_message(
                chat_id,
                format!("No se encontró nada para \"{}\". Probá con otro nombre:", term),
            )
            .await?;
        }
        Ok(options) => {
            let keyboard = make_options_keyboard(kind, &options);
            with_session(sessions, chat_id.0, |session| {
                session.offer_search_options(kind, options)
            })
            .await;
            bot.send_message(chat_id, "Elegí una opción:")
                .reply_markup(keyboard)
                .await?;
        }
        Err(e) => {
            log::warn!("Search for '{}' failed: {}", term, e);
            bot.send_message(chat_id, FETCH_FAILED_MSG).await?;
        }
    }
    Ok(())
}

/// Adds a confirmed item to the history. A manually picked beverage is sent
/// back together with the last photo so the classifier can learn it.
pub async fn add_to_history(
    bot: &Bot,
    api: &BaccoApi,
    sessions: &SessionStore,
    chat_id: ChatId,
    kind: ItemKind,
    name: &str,
    retrain: bool,
) -> HandlerResult {
    let (added, photo) = with_session(sessions, chat_id.0, |session| {
        session.add_history_entry(kind, name, retrain)
    })
    .await;

    if let Some(photo) = photo {
        log::info!(
            "Retraining with '{}' (classifier said {:?})",
            name,
            photo.classification
        );
        if let Err(e) = api.retrain(photo.bytes, &photo.file_name, name).await {
            log::warn!("Retrain upload failed: {}", e);
        }
    }

    let text = if added {
        format!("Agregado al historial: {}", name)
    } else {
        format!("{} ya estaba en el historial.", name)
    };
    bot.send_message(chat_id, text)
        .reply_markup(make_commands_keyrow())
        .await?;
    Ok(())
}
