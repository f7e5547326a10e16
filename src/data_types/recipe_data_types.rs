use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// the backend sends `null` for empty relations every now and then
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Beverage {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeBeverageLink {
    pub id: i64,
    pub beverage: Beverage,
    #[serde(default, deserialize_with = "null_as_default")]
    pub measure: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeIngredientLink {
    pub id: i64,
    pub ingredient: Ingredient,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub beverages: Vec<RecipeBeverageLink>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<RecipeIngredientLink>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
}

impl AsRef<Recipe> for Recipe {
    fn as_ref(&self) -> &Recipe {
        self
    }
}

/// Server comments carry numeric ids, comments created in the chat get a random uuid
/// until the next detail fetch replaces them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum CommentId {
    Remote(i64),
    Local(Uuid),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", from = "CommentWire")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub user_id: Option<i64>,
    pub recipe_id: Option<i64>,
}

impl Comment {
    pub fn new_local(content: String, user_id: i64, recipe_id: i64) -> Self {
        Comment {
            id: CommentId::Local(Uuid::new_v4()),
            content,
            user_id: Some(user_id),
            recipe_id: Some(recipe_id),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
struct CommentAuthor {
    id: i64,
}

// detail responses nest the author as `user: {id}`, the list endpoint sends `userId`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentWire {
    id: CommentId,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    user: Option<CommentAuthor>,
    #[serde(default)]
    recipe_id: Option<i64>,
}

impl From<CommentWire> for Comment {
    fn from(wire: CommentWire) -> Self {
        Comment {
            id: wire.id,
            content: wire.content,
            user_id: wire.user_id.or(wire.user.map(|u| u.id)),
            recipe_id: wire.recipe_id,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// Outcome of sending a photo to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Recognized(String),
    Unrecognized,
}

impl Classification {
    /// Legacy bodies only carry a `message`; a recognized label is a single word.
    pub fn from_legacy_message(message: &str) -> Self {
        let message = message.trim();
        if message.is_empty() || message.contains(char::is_whitespace) {
            Classification::Unrecognized
        } else {
            Classification::Recognized(message.to_string())
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ClassificationBody {
    Structured {
        recognized: bool,
        #[serde(default)]
        name: Option<String>,
    },
    Legacy {
        message: String,
    },
}

impl From<ClassificationBody> for Classification {
    fn from(body: ClassificationBody) -> Self {
        match body {
            ClassificationBody::Structured {
                recognized: true,
                name: Some(name),
            } if !name.trim().is_empty() => Classification::Recognized(name.trim().to_string()),
            ClassificationBody::Structured { .. } => Classification::Unrecognized,
            ClassificationBody::Legacy { message } => Classification::from_legacy_message(&message),
        }
    }
}
