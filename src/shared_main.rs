use std::{env, time::Instant};

use teloxide::{prelude::*, types::ParseMode, utils::markdown};

use crate::bot_command_handlers::search_prompt;
use crate::bot_command_helpers::{
    add_to_history, make_filter_keyboard, make_history_keyboard, make_recipe_detail_keyboard,
    send_recipe_list,
};
use crate::constants::{
    EMPTY_HISTORY_MSG, LOGIN_REQUIRED_MSG, NO_CANDIDATES_MSG, STALE_BUTTON_MSG,
};
use crate::data_backend::{
    bacco_api::BaccoApi,
    recipe_msg::{filter_msg, history_msg, recipe_detail_msg},
};
use crate::data_types::{
    CallbackAction, DialogueState, DialogueType, HandlerResult, SearchDebouncer,
};
use crate::recipe_engine::{match_annotator::annotate, ItemKind};
use crate::session::{with_session, SessionStore};

pub fn logger_init(module_path: &str) {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module(
            module_path,
            if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default()
                == "debug"
            {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    api: BaccoApi,
    sessions: SessionStore,
    dialogue: DialogueType,
    debouncer: SearchDebouncer,
) -> HandlerResult {
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::warn!("Unknown callback data: {:?}", q.data);
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    // acknowledge callback query to remove the loading alert
    if action == CallbackAction::DisabledChip {
        bot.answer_callback_query(q.id)
            .text("Ninguna de las recetas usa ese elemento.")
            .await?;
        return Ok(());
    }
    bot.answer_callback_query(q.id).await?;

    let Some(Message { id, chat, .. }) = q.message else {
        return Ok(());
    };

    match action {
        CallbackAction::ConfirmScan(key) => {
            let Some(name) =
                with_session(&sessions, chat.id.0, |session| session.recognized_name(key)).await
            else {
                bot.edit_message_text(chat.id, id, STALE_BUTTON_MSG).await?;
                return Ok(());
            };
            let text = format!("✅ {}", markdown::bold(&markdown::escape(&name)));
            bot.edit_message_text(chat.id, id, text)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
            add_to_history(
                &bot,
                &api,
                &sessions,
                chat.id,
                ItemKind::Beverage,
                &name,
                false,
            )
            .await?;
        }
        CallbackAction::RejectScan => {
            dialogue
                .update(DialogueState::AwaitSearchTerm {
                    kind: ItemKind::Beverage,
                })
                .await?;
            bot.edit_message_text(chat.id, id, search_prompt(ItemKind::Beverage))
                .await?;
        }
        CallbackAction::Pick(kind, key) => {
            debouncer.cancel(&(chat.id.0, kind));
            let Some(name) = with_session(&sessions, chat.id.0, |session| {
                session.search_option(kind, key)
            })
            .await
            else {
                bot.edit_message_text(chat.id, id, STALE_BUTTON_MSG).await?;
                return Ok(());
            };
            dialogue.exit().await?;
            bot.edit_message_text(chat.id, id, format!("Elegiste: {}", name))
                .await?;
            add_to_history(&bot, &api, &sessions, chat.id, kind, &name, true).await?;
        }
        CallbackAction::Remove(kind, key) => {
            let rendered = with_session(&sessions, chat.id.0, |session| {
                if let Some(name) = session.history_entry(kind, key) {
                    session.remove_history_entry(kind, &name);
                }
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
                    bot.edit_message_text(chat.id, id, text)
                        .parse_mode(ParseMode::MarkdownV2)
                        .reply_markup(keyboard)
                        .await?;
                }
                None => {
                    bot.edit_message_text(chat.id, id, EMPTY_HISTORY_MSG)
                        .await?;
                }
            }
        }
        CallbackAction::ToggleChip(kind, key) => {
            let rendered = with_session(&sessions, chat.id.0, |session| {
                session.candidates.as_ref()?;
                // a chip removed from the history in the meantime is skipped
                if let Some(name) = session.history_entry(kind, key) {
                    session.criteria.toggle(kind, &name);
                }
                Some((filter_msg(&session.criteria), make_filter_keyboard(session)))
            })
            .await;

            match rendered {
                Some((text, keyboard)) => {
                    bot.edit_message_text(chat.id, id, text)
                        .parse_mode(ParseMode::MarkdownV2)
                        .reply_markup(keyboard)
                        .await?;
                }
                None => {
                    bot.edit_message_text(chat.id, id, NO_CANDIDATES_MSG)
                        .await?;
                }
            }
        }
        CallbackAction::DisabledChip => {}
        CallbackAction::EditSearchText => {
            dialogue.update(DialogueState::AwaitRecipeSearchText).await?;
            bot.send_message(chat.id, "Escribí parte del nombre de la receta:")
                .await?;
        }
        CallbackAction::ApplyFilters => {
            send_recipe_list(&bot, chat.id, &sessions).await?;
        }
        CallbackAction::ResetFilters => {
            let rendered = with_session(&sessions, chat.id.0, |session| {
                session.criteria.reset();
                session.candidates.as_ref()?;
                Some((filter_msg(&session.criteria), make_filter_keyboard(session)))
            })
            .await;

            if let Some((text, keyboard)) = rendered {
                bot.edit_message_text(chat.id, id, text)
                    .parse_mode(ParseMode::MarkdownV2)
                    .reply_markup(keyboard)
                    .await?;
            }
            send_recipe_list(&bot, chat.id, &sessions).await?;
        }
        CallbackAction::ShowRecipe(recipe_id) => {
            let now = Instant::now();
            let detail = api.recipe_detail(recipe_id).await;
            log::debug!("Recipe {} detail: {:.2?}", recipe_id, now.elapsed());

            let detail_failed = detail.is_err();
            let rendered = with_session(&sessions, chat.id.0, |session| {
                let (remote, fetched) = match detail {
                    Ok(recipe) => {
                        session.refresh_candidate(recipe.clone());
                        (recipe.comments.clone(), Some(recipe))
                    }
                    Err(e) => {
                        log::warn!("Recipe {} detail failed: {}", recipe_id, e);
                        (Vec::new(), None)
                    }
                };

                let comments = session.merged_comments(recipe_id, remote);
                let owned = session.selection.snapshot();
                let current_user = session.user.as_ref().map(|u| u.id);
                let recipe = session.candidate(recipe_id).or(fetched.as_ref())?;
                Some(recipe_detail_msg(
                    &annotate(recipe, &owned),
                    &comments,
                    current_user,
                ))
            })
            .await;

            match rendered {
                Some(text) => {
                    bot.send_message(chat.id, text)
                        .parse_mode(ParseMode::MarkdownV2)
                        .reply_markup(make_recipe_detail_keyboard(recipe_id))
                        .await?;
                    if detail_failed {
                        bot.send_message(chat.id, "No se pudieron cargar los comentarios.")
                            .await?;
                    }
                }
                None => {
                    bot.send_message(chat.id, NO_CANDIDATES_MSG).await?;
                }
            }
        }
        CallbackAction::WriteComment(recipe_id) => {
            let logged_in =
                with_session(&sessions, chat.id.0, |session| session.user.is_some()).await;
            if !logged_in {
                bot.send_message(chat.id, LOGIN_REQUIRED_MSG).await?;
                return Ok(());
            }

            dialogue
                .update(DialogueState::AwaitComment { recipe_id })
                .await?;
            bot.send_message(chat.id, "Escribí tu comentario:").await?;
        }
    }

    Ok(())
}
