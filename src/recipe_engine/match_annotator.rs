use crate::data_types::recipe_data_types::{Recipe, RecipeBeverageLink, RecipeIngredientLink};
use crate::recipe_engine::normalize_name;
use crate::recipe_engine::selection_store::OwnedSets;

/// A recipe link plus whether the user already owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedLink<'a, L> {
    pub link: &'a L,
    pub matched: bool,
}

/// Derived view of a [`Recipe`] against the owned sets. Built fresh for every
/// render, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecipe<'a> {
    pub recipe: &'a Recipe,
    /// missing links first, then owned ones
    pub beverages: Vec<MatchedLink<'a, RecipeBeverageLink>>,
    pub ingredients: Vec<MatchedLink<'a, RecipeIngredientLink>>,
    pub beverages_total: usize,
    pub beverages_actual: usize,
    pub ingredients_total: usize,
    pub ingredients_actual: usize,
}

impl<'a> AnnotatedRecipe<'a> {
    pub fn have(&self) -> usize {
        self.beverages_actual + self.ingredients_actual
    }

    pub fn missing(&self) -> usize {
        (self.beverages_total - self.beverages_actual)
            + (self.ingredients_total - self.ingredients_actual)
    }

    /// Lower is better. Recipes without any links end up at 0.
    pub fn completeness_gap(&self) -> i64 {
        self.missing() as i64 - self.have() as i64
    }

    pub fn has_all_beverages(&self) -> bool {
        self.beverages_actual == self.beverages_total
    }

    pub fn has_all_ingredients(&self) -> bool {
        self.ingredients_actual == self.ingredients_total
    }
}

impl AsRef<Recipe> for AnnotatedRecipe<'_> {
    fn as_ref(&self) -> &Recipe {
        self.recipe
    }
}

pub fn annotate<'a>(recipe: &'a Recipe, owned: &OwnedSets) -> AnnotatedRecipe<'a> {
    let beverages = partition_matched(recipe.beverages.iter().map(|link| MatchedLink {
        link,
        matched: owned
            .beverages
            .contains(&normalize_name(&link.beverage.name)),
    }));
    let ingredients = partition_matched(recipe.ingredients.iter().map(|link| MatchedLink {
        link,
        matched: owned
            .ingredients
            .contains(&normalize_name(&link.ingredient.name)),
    }));

    AnnotatedRecipe {
        recipe,
        beverages_total: beverages.len(),
        beverages_actual: beverages.iter().filter(|b| b.matched).count(),
        ingredients_total: ingredients.len(),
        ingredients_actual: ingredients.iter().filter(|i| i.matched).count(),
        beverages,
        ingredients,
    }
}

// stable: unmatched in input order, then matched in input order
fn partition_matched<'a, L: 'a>(
    links: impl Iterator<Item = MatchedLink<'a, L>>,
) -> Vec<MatchedLink<'a, L>> {
    let (mut unmatched, matched): (Vec<_>, Vec<_>) = links.partition(|l| !l.matched);
    unmatched.extend(matched);
    unmatched
}
