use chrono::{DateTime, Local};
use rand::Rng;
use teloxide::utils::markdown;

use crate::constants::{beverage_emoji, HEADER_EMOJIS, NOT_RECOGNIZED_MSG};
use crate::data_backend::{bold, italic, session_time_fmt};
use crate::data_types::recipe_data_types::{Classification, Comment};
use crate::recipe_engine::{
    match_annotator::AnnotatedRecipe, recipe_filter::FilterCriteria,
    selection_store::SelectionStore, ItemKind,
};

fn count_badge(actual: usize, total: usize) -> String {
    let badge = format!("{}/{}", actual, total);
    if actual == total {
        bold(&badge)
    } else {
        markdown::escape(&badge)
    }
}

fn amount_plain(value: f64) -> String {
    format!("{}", value)
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

pub fn recipe_list_msg(
    visible: &[AnnotatedRecipe],
    criteria: &FilterCriteria,
    candidates_total: usize,
) -> String {
    let rand_emoji = HEADER_EMOJIS[rand::thread_rng().gen_range(0..HEADER_EMOJIS.len())];
    let mut msg = format!("{} {} {}\n", rand_emoji, bold("Recetas"), rand_emoji);

    if !criteria.is_empty() {
        msg += &format!(
            "{}\n",
            italic(&format!(
                "{} de {} con filtros",
                visible.len(),
                candidates_total
            ))
        );
    }

    if candidates_total == 0 {
        msg += &format!("\n{}\n", bold("No hay recetas para tu historial."));
        return msg;
    }
    if visible.is_empty() {
        msg += &format!("\n{}\n", bold("Ninguna receta coincide con los filtros."));
        return msg;
    }

    for (idx, recipe) in visible.iter().enumerate() {
        msg += &format!(
            "\n{} {}\n   🍸 {}   🍒 {}\n",
            markdown::escape(&format!("{}.", idx + 1)),
            markdown::underline(&markdown::escape(&recipe.recipe.name)),
            count_badge(recipe.beverages_actual, recipe.beverages_total),
            count_badge(recipe.ingredients_actual, recipe.ingredients_total),
        );
        if !recipe.recipe.description.is_empty() {
            msg += &format!("   {}\n", italic(&shorten(&recipe.recipe.description, 90)));
        }
    }

    msg
}

pub fn recipe_detail_msg(
    recipe: &AnnotatedRecipe,
    comments: &[Comment],
    current_user: Option<i64>,
) -> String {
    let mut msg = format!("{}\n", bold(&recipe.recipe.name));
    if !recipe.recipe.description.is_empty() {
        msg += &format!("{}\n", markdown::escape(&recipe.recipe.description));
    }

    msg += &format!(
        "\n{} {}\n",
        bold("Bebidas"),
        count_badge(recipe.beverages_actual, recipe.beverages_total)
    );
    for link in &recipe.beverages {
        msg += &format!(
            " {} {} {}\n",
            if link.matched { "✅" } else { "➖" },
            markdown::escape(&link.link.beverage.name),
            italic(&format!("({})", amount_plain(link.link.measure)))
        );
    }

    msg += &format!(
        "\n{} {}\n",
        bold("Ingredientes"),
        count_badge(recipe.ingredients_actual, recipe.ingredients_total)
    );
    for link in &recipe.ingredients {
        msg += &format!(
            " {} {} {}\n",
            if link.matched { "✅" } else { "➖" },
            markdown::escape(&link.link.ingredient.name),
            italic(&format!("({})", amount_plain(link.link.quantity)))
        );
    }

    msg += &format!("\n{}\n", bold("Comentarios"));
    if comments.is_empty() {
        msg += &format!("{}\n", italic("Todavía no hay comentarios."));
    }
    for comment in comments {
        let author = match (comment.user_id, current_user) {
            (Some(author), Some(me)) if author == me => "🙋 ",
            _ => "👤 ",
        };
        msg += &format!("{}{}\n", author, markdown::escape(&comment.content));
    }

    msg
}

pub fn history_msg(selection: &SelectionStore, started_at: DateTime<Local>) -> String {
    let mut msg = format!(
        "{}\n{}\n",
        bold("Historial"),
        italic(&format!("sesión desde {}", session_time_fmt(started_at)))
    );

    for (kind, title) in [
        (ItemKind::Beverage, "Bebidas"),
        (ItemKind::Ingredient, "Ingredientes"),
    ] {
        let entries = selection.entries(kind);
        msg += &format!("\n{}\n", markdown::underline(&markdown::escape(title)));
        if entries.is_empty() {
            msg += &format!(" {}\n", italic("nada todavía"));
        }
        for entry in entries {
            let icon = match kind {
                ItemKind::Beverage => beverage_emoji(entry),
                ItemKind::Ingredient => "🍒",
            };
            msg += &format!(" {} {}\n", icon, markdown::escape(entry));
        }
    }

    msg += &format!("\n{}", italic("Tocá un botón para quitarlo."));
    msg
}

pub fn filter_msg(criteria: &FilterCriteria) -> String {
    let mut msg = format!("{}\n", bold("Filtros"));

    if criteria.is_empty() {
        msg += &italic("Sin filtros: se muestran todas las recetas.");
        return msg;
    }
    if !criteria.search_text.is_empty() {
        msg += &format!("Nombre contiene: {}\n", bold(&criteria.search_text));
    }
    if criteria.has_selected_chips() {
        let chips: Vec<_> = criteria
            .selected_beverages
            .iter()
            .chain(criteria.selected_ingredients.iter())
            .map(|c| c.as_str())
            .collect();
        msg += &format!("Con alguno de: {}\n", markdown::escape(&chips.join(", ")));
    }
    msg
}

pub fn classification_msg(classification: &Classification) -> String {
    match classification {
        Classification::Recognized(name) => format!(
            "{} Se identificó la bebida: {}",
            beverage_emoji(name),
            bold(name)
        ),
        Classification::Unrecognized => format!(
            "{}\n{}",
            markdown::escape(NOT_RECOGNIZED_MSG),
            markdown::escape("Buscala a mano:")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_engine::{match_annotator::annotate, selection_store::OwnedSets};
    use crate::test_support::{owned, recipe};

    #[test]
    fn list_shows_badges_in_given_order() {
        let recipes = [
            recipe(2, "Fernet", &["Fernet"], &["Hielo"]),
            recipe(1, "Gin Tonic", &["Gin", "Tonica"], &["Hielo", "Pepino"]),
        ];
        let owned = owned(&["fernet"], &[]);
        let annotated: Vec<_> = recipes.iter().map(|r| annotate(r, &owned)).collect();

        let msg = recipe_list_msg(&annotated, &FilterCriteria::default(), 2);

        let fernet = msg.find("Fernet").unwrap();
        let gin = msg.find("Gin Tonic").unwrap();
        assert!(fernet < gin);
        assert!(msg.contains("*1/1*"));
        assert!(msg.contains("0/2"));
    }

    #[test]
    fn empty_candidates_and_empty_filter_result_read_differently() {
        let none = recipe_list_msg(&[], &FilterCriteria::default(), 0);
        let mut criteria = FilterCriteria::default();
        criteria.set_search_text("zzz");
        let filtered = recipe_list_msg(&[], &criteria, 3);

        assert!(none.contains("No hay recetas"));
        assert!(filtered.contains("Ninguna receta coincide"));
        assert!(filtered.contains("0 de 3"));
    }

    #[test]
    fn detail_lists_missing_before_owned() {
        let r = recipe(1, "Gin Tonic", &["Gin", "Tonica"], &["Hielo"]);
        let annotated = annotate(&r, &owned(&["gin"], &[]));

        let msg = recipe_detail_msg(&annotated, &[], None);

        let tonica = msg.find("➖ Tonica").unwrap();
        let gin = msg.find("✅ Gin").unwrap();
        assert!(tonica < gin);
        assert!(msg.contains("Todavía no hay comentarios"));
    }

    #[test]
    fn own_comments_are_marked() {
        let r = recipe(1, "Fernet", &[], &[]);
        let annotated = annotate(&r, &OwnedSets::default());
        let comments = [
            Comment::new_local("muy rico".into(), 5, 1),
            Comment::new_local("mucho hielo".into(), 6, 1),
        ];

        let msg = recipe_detail_msg(&annotated, &comments, Some(5));

        assert!(msg.contains("🙋 muy rico"));
        assert!(msg.contains("👤 mucho hielo"));
    }

    #[test]
    fn special_characters_are_escaped() {
        let r = recipe(1, "Cuba-Libre (clásico).", &[], &[]);
        let annotated = annotate(&r, &OwnedSets::default());

        let msg = recipe_list_msg(&[annotated], &FilterCriteria::default(), 1);

        assert!(msg.contains(r"Cuba\-Libre \(clásico\)\."));
    }

    #[test]
    fn history_keeps_insertion_order() {
        let mut selection = SelectionStore::default();
        selection.add(ItemKind::Beverage, "Vino");
        selection.add(ItemKind::Beverage, "Fernet");

        let msg = history_msg(&selection, Local::now());

        assert!(msg.find("Vino").unwrap() < msg.find("Fernet").unwrap());
        assert!(msg.contains("nada todavía"));
    }
}
