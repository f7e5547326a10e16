//! Matching, ranking and filtering of candidate recipes against what the user
//! already scanned in the current session.
//!
//! All functions here are synchronous and free of I/O, they run on whatever
//! the chat handlers hand them.

pub mod match_annotator;
pub mod recipe_filter;
pub mod recipe_ranker;
pub mod selection_store;

use crate::data_types::recipe_data_types::Recipe;
use match_annotator::{annotate, AnnotatedRecipe};
use recipe_filter::{filter_recipes, FilterCriteria};
use recipe_ranker::rank;
use selection_store::OwnedSets;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Beverage,
    Ingredient,
}

/// Every name comparison in the app goes through here.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Annotate every candidate, rank the whole list, then apply the filter criteria.
/// Filtering keeps relative order, so the result stays ranked.
pub fn visible_recipes<'a>(
    candidates: &'a [Recipe],
    owned: &OwnedSets,
    criteria: &FilterCriteria,
) -> Vec<AnnotatedRecipe<'a>> {
    let annotated = candidates
        .iter()
        .map(|recipe| annotate(recipe, owned))
        .collect();

    filter_recipes(rank(annotated), criteria)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_engine::recipe_filter::FilterCriteria;
    use crate::test_support::recipe;

    #[test]
    fn normalize_only_lowercases() {
        assert_eq!(normalize_name("GIN"), "gin");
        assert_eq!(normalize_name("Coca Cola"), "coca cola");
        assert_ne!(normalize_name(" Gin"), normalize_name("gin"));
    }

    #[test]
    fn pipeline_keeps_ranked_order_after_filtering() {
        let candidates = vec![
            recipe(1, "Gin Tonic", &["Gin", "Tonica"], &["Hielo", "Pepino"]),
            recipe(2, "Fernet", &["Fernet"], &["Hielo"]),
            recipe(3, "Fernet con limon", &["Fernet"], &["Hielo", "Limon"]),
        ];
        let mut owned = OwnedSets::default();
        owned.beverages.insert("fernet".into());

        let mut criteria = FilterCriteria::default();
        criteria.set_search_text("fernet");

        let names: Vec<_> = visible_recipes(&candidates, &owned, &criteria)
            .iter()
            .map(|r| r.recipe.name.as_str())
            .collect();

        assert_eq!(names, ["Fernet", "Fernet con limon"]);
    }
}
