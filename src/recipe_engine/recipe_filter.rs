use std::collections::BTreeSet;

use crate::data_types::recipe_data_types::Recipe;
use crate::recipe_engine::{normalize_name, ItemKind};

/// What the user picked in the filter keyboard. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub selected_ingredients: BTreeSet<String>,
    pub selected_beverages: BTreeSet<String>,
    pub search_text: String,
}

impl FilterCriteria {
    pub fn reset(&mut self) {
        *self = FilterCriteria::default();
    }

    pub fn is_empty(&self) -> bool {
        !self.has_selected_chips() && self.search_text.trim().is_empty()
    }

    pub fn has_selected_chips(&self) -> bool {
        !self.selected_ingredients.is_empty() || !self.selected_beverages.is_empty()
    }

    pub fn is_selected(&self, kind: ItemKind, name: &str) -> bool {
        self.selection(kind).contains(&normalize_name(name))
    }

    /// Flips a chip. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, kind: ItemKind, name: &str) -> bool {
        let name = normalize_name(name);
        let selection = self.selection_mut(kind);

        if selection.remove(&name) {
            false
        } else {
            selection.insert(name);
            true
        }
    }

    /// Drops a chip from the selection if it was selected.
    pub fn deselect(&mut self, kind: ItemKind, name: &str) -> bool {
        let name = normalize_name(name);
        self.selection_mut(kind).remove(&name)
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.trim().to_string();
    }

    /// Any selected chip on either axis admits the recipe, the name search always applies on top.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let passes_chips = !self.has_selected_chips()
            || recipe.ingredients.iter().any(|link| {
                self.selected_ingredients
                    .contains(&normalize_name(&link.ingredient.name))
            })
            || recipe.beverages.iter().any(|link| {
                self.selected_beverages
                    .contains(&normalize_name(&link.beverage.name))
            });

        passes_chips
            && recipe
                .name
                .to_lowercase()
                .contains(&self.search_text.to_lowercase())
    }

    fn selection_mut(&mut self, kind: ItemKind) -> &mut BTreeSet<String> {
        match kind {
            ItemKind::Beverage => &mut self.selected_beverages,
            ItemKind::Ingredient => &mut self.selected_ingredients,
        }
    }

    fn selection(&self, kind: ItemKind) -> &BTreeSet<String> {
        match kind {
            ItemKind::Beverage => &self.selected_beverages,
            ItemKind::Ingredient => &self.selected_ingredients,
        }
    }
}

/// Always evaluated against the full candidate list, never against a previous result.
pub fn filter_recipes<R, I>(recipes: I, criteria: &FilterCriteria) -> Vec<R>
where
    I: IntoIterator<Item = R>,
    R: AsRef<Recipe>,
{
    recipes
        .into_iter()
        .filter(|recipe| criteria.matches(recipe.as_ref()))
        .collect()
}

/// Names referenced anywhere in the candidate list. Chips for anything else are
/// shown disabled. Rebuilt whenever the candidate list changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipAvailability {
    beverages: BTreeSet<String>,
    ingredients: BTreeSet<String>,
}

impl ChipAvailability {
    pub fn from_candidates(recipes: &[Recipe]) -> Self {
        ChipAvailability {
            beverages: recipes
                .iter()
                .flat_map(|r| r.beverages.iter())
                .map(|link| normalize_name(&link.beverage.name))
                .collect(),
            ingredients: recipes
                .iter()
                .flat_map(|r| r.ingredients.iter())
                .map(|link| normalize_name(&link.ingredient.name))
                .collect(),
        }
    }

    pub fn is_enabled(&self, kind: ItemKind, name: &str) -> bool {
        let name = normalize_name(name);
        match kind {
            ItemKind::Beverage => self.beverages.contains(&name),
            ItemKind::Ingredient => self.ingredients.contains(&name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::recipe;

    fn candidates() -> Vec<Recipe> {
        vec![
            recipe(1, "Gin Tonic", &["Gin", "Tonica"], &["Hielo", "Pepino"]),
            recipe(2, "Fernet", &["Fernet"], &["Hielo"]),
            recipe(3, "Mojito", &["Ron"], &["Menta", "Lima"]),
        ]
    }

    fn ids(recipes: Vec<&Recipe>) -> Vec<i64> {
        recipes.iter().map(|r| r.id).collect()
    }

    #[test]
    fn default_criteria_keep_everything() {
        let recipes = candidates();
        assert_eq!(
            ids(filter_recipes(&recipes, &FilterCriteria::default())),
            [1, 2, 3]
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let recipes = candidates();
        let mut criteria = FilterCriteria::default();
        criteria.toggle(ItemKind::Beverage, "Ron");
        criteria.set_search_text("moj");

        criteria.reset();
        let once = ids(filter_recipes(&recipes, &criteria));
        criteria.reset();
        let twice = ids(filter_recipes(&recipes, &criteria));

        assert_eq!(once, [1, 2, 3]);
        assert_eq!(once, twice);
        assert!(criteria.is_empty());
    }

    #[test]
    fn chips_are_or_across_categories() {
        let recipes = candidates();
        let mut criteria = FilterCriteria::default();

        criteria.toggle(ItemKind::Ingredient, "menta");
        assert_eq!(ids(filter_recipes(&recipes, &criteria)), [3]);

        criteria.toggle(ItemKind::Beverage, "FERNET");
        assert_eq!(ids(filter_recipes(&recipes, &criteria)), [2, 3]);
    }

    #[test]
    fn unrelated_chip_excludes_recipe() {
        let recipes = vec![recipe(1, "Mojito", &[], &["Menta"])];
        let mut criteria = FilterCriteria::default();
        criteria.toggle(ItemKind::Beverage, "gin");

        assert!(filter_recipes(&recipes, &criteria).is_empty());
    }

    #[test]
    fn search_text_is_always_applied() {
        let recipes = candidates();
        let mut criteria = FilterCriteria::default();
        criteria.toggle(ItemKind::Ingredient, "hielo");
        criteria.set_search_text("tonic");

        assert_eq!(ids(filter_recipes(&recipes, &criteria)), [1]);

        criteria.set_search_text("daiquiri");
        assert!(filter_recipes(&recipes, &criteria).is_empty());
    }

    #[test]
    fn toggle_twice_deselects() {
        let mut criteria = FilterCriteria::default();

        assert!(criteria.toggle(ItemKind::Ingredient, "Hielo"));
        assert!(criteria.is_selected(ItemKind::Ingredient, "hielo"));
        assert!(!criteria.toggle(ItemKind::Ingredient, "hielo"));
        assert!(criteria.is_empty());
    }

    #[test]
    fn deselect_only_touches_its_own_axis() {
        let mut criteria = FilterCriteria::default();
        criteria.toggle(ItemKind::Beverage, "Limon");
        criteria.toggle(ItemKind::Ingredient, "Limon");

        assert!(criteria.deselect(ItemKind::Beverage, "LIMON"));
        assert!(!criteria.deselect(ItemKind::Beverage, "limon"));
        assert!(criteria.is_selected(ItemKind::Ingredient, "limon"));
    }

    #[test]
    fn chips_not_referenced_by_candidates_are_disabled() {
        let chips = ChipAvailability::from_candidates(&candidates());

        assert!(chips.is_enabled(ItemKind::Beverage, "Gin"));
        assert!(chips.is_enabled(ItemKind::Ingredient, "lima"));
        assert!(!chips.is_enabled(ItemKind::Beverage, "vino"));
        // ingredient and beverage axes are separate
        assert!(!chips.is_enabled(ItemKind::Ingredient, "gin"));
    }
}
