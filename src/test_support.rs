use crate::data_types::recipe_data_types::{
    Beverage, Ingredient, Recipe, RecipeBeverageLink, RecipeIngredientLink,
};
use crate::recipe_engine::selection_store::OwnedSets;

pub fn recipe(id: i64, name: &str, beverages: &[&str], ingredients: &[&str]) -> Recipe {
    Recipe {
        id,
        name: name.to_string(),
        description: String::new(),
        image_path: String::new(),
        beverages: beverages
            .iter()
            .enumerate()
            .map(|(idx, b)| RecipeBeverageLink {
                id: idx as i64,
                beverage: Beverage {
                    id: idx as i64,
                    name: b.to_string(),
                    description: String::new(),
                    image_path: String::new(),
                },
                measure: 1.0,
            })
            .collect(),
        ingredients: ingredients
            .iter()
            .enumerate()
            .map(|(idx, i)| RecipeIngredientLink {
                id: idx as i64,
                ingredient: Ingredient {
                    id: idx as i64,
                    name: i.to_string(),
                    description: String::new(),
                    image_path: String::new(),
                },
                quantity: 1.0,
            })
            .collect(),
        comments: Vec::new(),
    }
}

pub fn owned(beverages: &[&str], ingredients: &[&str]) -> OwnedSets {
    OwnedSets {
        beverages: beverages.iter().map(|b| b.to_string()).collect(),
        ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
    }
}
