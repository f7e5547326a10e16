use std::time::Instant;

use teloxide::{net::Download, prelude::*, types::ParseMode, utils::command::BotCommands};

use crate::bot_command_helpers::{
    make_commands_keyrow, make_recipe_detail_keyboard, make_scan_keyboard, parse_login_args,
    parse_register_args, send_filter_panel, send_history, send_recipe_list, send_search_options,
};
use crate::constants::{
    EMPTY_HISTORY_MSG, FETCH_FAILED_MSG, LOGIN_REQUIRED_MSG, SEARCH_PROMPT_BEVERAGE,
    SEARCH_PROMPT_INGREDIENT,
};
use crate::data_backend::{
    bacco_api::BaccoApi,
    recipe_msg::{classification_msg, recipe_detail_msg},
};
use crate::data_types::{
    recipe_data_types::{Classification, Comment, NewComment},
    Command, DialogueState, DialogueType, HandlerResult, SearchDebouncer,
};
use crate::errors::ApiError;
use crate::recipe_engine::{match_annotator::annotate, ItemKind};
use crate::session::{with_session, ScannedPhoto, SessionStore};

pub fn search_prompt(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Beverage => SEARCH_PROMPT_BEVERAGE,
        ItemKind::Ingredient => SEARCH_PROMPT_INGREDIENT,
    }
}

pub async fn start(
    bot: Bot,
    msg: Message,
    sessions: SessionStore,
    dialogue: DialogueType,
) -> HandlerResult {
    with_session(&sessions, msg.chat.id.0, |session| session.restart()).await;
    dialogue.exit().await?;

    bot.send_message(
        msg.chat.id,
        format!(
            "¡Hola! Mandame una foto de una botella y te ayudo a armar un trago.\n\n{}",
            Command::descriptions()
        ),
    )
    .reply_markup(make_commands_keyrow())
    .await?;
    Ok(())
}

pub async fn search_cmd(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: DialogueType,
) -> HandlerResult {
    let kind = match cmd {
        Command::Bebida => ItemKind::Beverage,
        Command::Ingrediente => ItemKind::Ingredient,
        _ => return Ok(()),
    };

    dialogue
        .update(DialogueState::AwaitSearchTerm { kind })
        .await?;
    bot.send_message(msg.chat.id, search_prompt(kind)).await?;
    Ok(())
}

pub async fn history_cmd(bot: Bot, msg: Message, sessions: SessionStore) -> HandlerResult {
    send_history(&bot, msg.chat.id, &sessions).await
}

pub async fn recipes_cmd(
    bot: Bot,
    msg: Message,
    api: BaccoApi,
    sessions: SessionStore,
) -> HandlerResult {
    let (beverages, ingredients) = with_session(&sessions, msg.chat.id.0, |session| {
        (
            session.selection.entries(ItemKind::Beverage).to_vec(),
            session.selection.entries(ItemKind::Ingredient).to_vec(),
        )
    })
    .await;

    if beverages.is_empty() && ingredients.is_empty() {
        bot.send_message(msg.chat.id, EMPTY_HISTORY_MSG).await?;
        return Ok(());
    }

    let now = Instant::now();
    match api.recipes_for(&beverages, &ingredients).await {
        Ok(recipes) => {
            log::debug!("Fetched {} candidates: {:.2?}", recipes.len(), now.elapsed());
            with_session(&sessions, msg.chat.id.0, |session| {
                session.set_candidates(recipes)
            })
            .await;
            send_recipe_list(&bot, msg.chat.id, &sessions).await
        }
        Err(e) => {
            log::warn!("Recipe fetch failed: {}", e);
            bot.send_message(msg.chat.id, FETCH_FAILED_MSG).await?;
            Ok(())
        }
    }
}

pub async fn filter_cmd(bot: Bot, msg: Message, sessions: SessionStore) -> HandlerResult {
    send_filter_panel(&bot, msg.chat.id, &sessions).await
}

pub async fn login_cmd(
    bot: Bot,
    msg: Message,
    args: String,
    api: BaccoApi,
    sessions: SessionStore,
) -> HandlerResult {
    let (username, password) = match parse_login_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    match api.login(&username, &password).await {
        Ok(user) => {
            let greeting = format!("Sesión iniciada. ¡Hola, {}!", user.display_name());
            with_session(&sessions, msg.chat.id.0, |session| session.user = Some(user)).await;
            bot.send_message(msg.chat.id, greeting).await?;
        }
        Err(ApiError::Rejected(reason)) => {
            bot.send_message(msg.chat.id, reason).await?;
        }
        Err(e) => {
            log::warn!("Login failed: {}", e);
            bot.send_message(msg.chat.id, FETCH_FAILED_MSG).await?;
        }
    }
    Ok(())
}

pub async fn register_cmd(bot: Bot, msg: Message, args: String, api: BaccoApi) -> HandlerResult {
    let (name, email, password) = match parse_register_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    match api.register(&name, &email, &password).await {
        Ok(()) => {
            bot.send_message(
                msg.chat.id,
                "Cuenta creada. Ahora iniciá sesión con /login usuario clave",
            )
            .await?;
        }
        Err(ApiError::Rejected(reason)) => {
            bot.send_message(msg.chat.id, reason).await?;
        }
        Err(e) => {
            log::warn!("Registration failed: {}", e);
            bot.send_message(msg.chat.id, FETCH_FAILED_MSG).await?;
        }
    }
    Ok(())
}

pub async fn cancel_cmd(
    bot: Bot,
    msg: Message,
    dialogue: DialogueType,
    debouncer: SearchDebouncer,
) -> HandlerResult {
    debouncer.cancel(&(msg.chat.id.0, ItemKind::Beverage));
    debouncer.cancel(&(msg.chat.id.0, ItemKind::Ingredient));
    dialogue.exit().await?;

    bot.send_message(msg.chat.id, "Cancelado.")
        .reply_markup(make_commands_keyrow())
        .await?;
    Ok(())
}

/// Classifies the largest size of an incoming photo.
pub async fn photo_msg(
    bot: Bot,
    msg: Message,
    api: BaccoApi,
    sessions: SessionStore,
    dialogue: DialogueType,
) -> HandlerResult {
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    let now = Instant::now();
    let file = bot.get_file(photo.file.id.clone()).await?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes).await?;
    log::debug!("Photo download ({} bytes): {:.2?}", bytes.len(), now.elapsed());

    let file_name = file
        .path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("photo.jpg")
        .to_string();

    let classification = match api.classify_photo(bytes.clone(), &file_name).await {
        Ok(classification) => classification,
        Err(e) => {
            log::warn!("Classification failed: {}", e);
            bot.send_message(msg.chat.id, FETCH_FAILED_MSG).await?;
            return Ok(());
        }
    };
    log::info!("Photo classified as {:?}", classification);

    with_session(&sessions, msg.chat.id.0, |session| {
        session.last_photo = Some(ScannedPhoto {
            bytes,
            file_name,
            classification: classification.clone(),
        })
    })
    .await;

    let text = classification_msg(&classification);
    match classification {
        Classification::Recognized(name) => {
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(make_scan_keyboard(&name))
                .await?;
        }
        Classification::Unrecognized => {
            dialogue
                .update(DialogueState::AwaitSearchTerm {
                    kind: ItemKind::Beverage,
                })
                .await?;
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
    }
    Ok(())
}

/// Every keystroke-sized reply restarts the delay, only the last term is looked up.
pub async fn reply_search_term(
    bot: Bot,
    msg: Message,
    kind: ItemKind,
    api: BaccoApi,
    sessions: SessionStore,
    debouncer: SearchDebouncer,
) -> HandlerResult {
    let Some(term) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, search_prompt(kind)).await?;
        return Ok(());
    };

    let term = term.to_string();
    let chat_id = msg.chat.id;
    debouncer.schedule((chat_id.0, kind), async move {
        if let Err(e) = send_search_options(&bot, &api, &sessions, chat_id, kind, &term).await {
            log::error!("Sending search options failed: {}", e);
        }
    });
    Ok(())
}

pub async fn reply_recipe_search_text(
    bot: Bot,
    msg: Message,
    sessions: SessionStore,
    dialogue: DialogueType,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default().to_string();
    with_session(&sessions, msg.chat.id.0, |session| {
        session.criteria.set_search_text(&text)
    })
    .await;
    dialogue.exit().await?;

    send_filter_panel(&bot, msg.chat.id, &sessions).await
}

/// Shows the comment right away, then posts it.
pub async fn reply_comment(
    bot: Bot,
    msg: Message,
    recipe_id: i64,
    api: BaccoApi,
    sessions: SessionStore,
    dialogue: DialogueType,
) -> HandlerResult {
    let Some(content) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Escribí el comentario como texto:")
            .await?;
        return Ok(());
    };
    dialogue.exit().await?;

    let rendered = with_session(&sessions, msg.chat.id.0, |session| {
        let user_id = session.user.as_ref()?.id;
        session.prepend_local_comment(Comment::new_local(content.to_string(), user_id, recipe_id));

        let comments = session.merged_comments(recipe_id, Vec::new());
        let owned = session.selection.snapshot();
        let text = session
            .candidate(recipe_id)
            .map(|recipe| recipe_detail_msg(&annotate(recipe, &owned), &comments, Some(user_id)));
        Some((user_id, text))
    })
    .await;

    let Some((user_id, text)) = rendered else {
        bot.send_message(msg.chat.id, LOGIN_REQUIRED_MSG).await?;
        return Ok(());
    };

    if let Some(text) = text {
        bot.send_message(msg.chat.id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(make_recipe_detail_keyboard(recipe_id))
            .await?;
    }

    let comment = NewComment {
        content: content.to_string(),
        user_id,
        recipe_id,
    };
    if let Err(e) = api.post_comment(&comment).await {
        log::warn!("Posting comment on recipe {} failed: {}", recipe_id, e);
        bot.send_message(
            msg.chat.id,
            "El comentario se ve acá, pero no se pudo guardar en el servidor.",
        )
        .await?;
    }
    Ok(())
}

pub async fn invalid_cmd(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        format!(
            "No entendí eso. Mandame una foto o usá un comando:\n\n{}",
            Command::descriptions()
        ),
    )
    .reply_markup(make_commands_keyrow())
    .await?;
    Ok(())
}
