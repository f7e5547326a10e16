use crate::recipe_engine::match_annotator::AnnotatedRecipe;

/// Orders the whole candidate list by completeness gap (`missing - have`),
/// smallest gap first. `sort_by_key` is stable, ties keep their input order.
pub fn rank(mut annotated: Vec<AnnotatedRecipe<'_>>) -> Vec<AnnotatedRecipe<'_>> {
    annotated.sort_by_key(|recipe| recipe.completeness_gap());
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_engine::match_annotator::annotate;
    use crate::test_support::{owned, recipe};

    #[test]
    fn recipe_with_more_owned_items_ranks_first() {
        let recipes = vec![
            recipe(1, "Gin Tonic", &["Gin", "Tonica"], &["Hielo", "Pepino"]),
            recipe(2, "Fernet", &["Fernet"], &["Hielo"]),
        ];
        let owned = owned(&["fernet"], &[]);

        let ranked = rank(recipes.iter().map(|r| annotate(r, &owned)).collect());

        assert_eq!(ranked[0].recipe.name, "Fernet");
        assert_eq!(ranked[1].recipe.name, "Gin Tonic");
    }

    #[test]
    fn equal_gaps_keep_input_order() {
        let recipes = vec![
            recipe(1, "Primero", &["Ron"], &[]),
            recipe(2, "Segundo", &["Vino"], &[]),
            recipe(3, "Tercero", &["Gancia"], &[]),
        ];
        let owned = owned(&[], &[]);

        let ranked = rank(recipes.iter().map(|r| annotate(r, &owned)).collect());
        let ids: Vec<_> = ranked.iter().map(|r| r.recipe.id).collect();

        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn gap_counts_both_categories() {
        // gaps: a = 2 - 0 = 2, b = 1 - 1 = 0, c = 0 - 0 = 0
        let recipes = vec![
            recipe(1, "a", &["Ron"], &["Menta"]),
            recipe(2, "b", &["Vino"], &["Hielo"]),
            recipe(3, "c", &[], &[]),
        ];
        let owned = owned(&[], &["hielo"]);

        let ranked = rank(recipes.iter().map(|r| annotate(r, &owned)).collect());
        let ids: Vec<_> = ranked.iter().map(|r| r.recipe.id).collect();

        assert_eq!(ids, [2, 3, 1]);
    }
}
