pub mod recipe_data_types;

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

use teloxide::{
    dispatching::dialogue::InMemStorage, prelude::Dialogue, utils::command::BotCommands,
};

use crate::debounce::Debouncer;
use crate::recipe_engine::{normalize_name, ItemKind};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "nueva sesión de escaneo")]
    Start,
    #[command(description = "buscar y agregar una bebida")]
    Bebida,
    #[command(description = "buscar y agregar un ingrediente")]
    Ingrediente,
    #[command(description = "ver o quitar lo escaneado\n")]
    Historial,
    #[command(description = "recetas para tu historial")]
    Recetas,
    #[command(description = "filtrar las recetas\n")]
    Filtrar,
    #[command(description = "iniciar sesión: /login usuario clave")]
    Login(String),
    #[command(description = "crear cuenta: /registro nombre email clave")]
    Registro(String),
    #[command(description = "off")]
    Cancelar,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DialogueState {
    #[default]
    Default,
    AwaitSearchTerm {
        kind: ItemKind,
    },
    AwaitRecipeSearchText,
    AwaitComment {
        recipe_id: i64,
    },
}

pub type DialogueType = Dialogue<DialogueState, InMemStorage<DialogueState>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
/// Pending catalog lookups, one per chat and item kind.
pub type SearchDebouncer = Debouncer<(i64, ItemKind)>;

/// Fixed-size stand-in for an item name inside callback data, which Telegram
/// caps at 64 bytes. Resolved back against the names the session offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemKey(u64);

impl ItemKey {
    pub fn of(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        normalize_name(name).hash(&mut hasher);
        ItemKey(hasher.finish())
    }

    pub fn find<'a, I>(self, names: I) -> Option<&'a String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().find(|name| ItemKey::of(name) == self)
    }

    fn parse(arg: &str) -> Option<Self> {
        u64::from_str_radix(arg, 16).ok().map(ItemKey)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Everything an inline button can ask for. Encoded as `cmd:arg` in the callback data.
#[derive(Clone, Debug, PartialEq)]
pub enum CallbackAction {
    ConfirmScan(ItemKey),
    RejectScan,
    Pick(ItemKind, ItemKey),
    Remove(ItemKind, ItemKey),
    ToggleChip(ItemKind, ItemKey),
    DisabledChip,
    EditSearchText,
    ApplyFilters,
    ResetFilters,
    ShowRecipe(i64),
    WriteComment(i64),
}

fn kind_suffix(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Beverage => "b",
        ItemKind::Ingredient => "i",
    }
}

impl CallbackAction {
    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::ConfirmScan(key) => format!("scan_ok:{}", key),
            CallbackAction::RejectScan => "scan_no:".to_string(),
            CallbackAction::Pick(kind, key) => format!("pick_{}:{}", kind_suffix(*kind), key),
            CallbackAction::Remove(kind, key) => format!("rm_{}:{}", kind_suffix(*kind), key),
            CallbackAction::ToggleChip(kind, key) => {
                format!("chip_{}:{}", kind_suffix(*kind), key)
            }
            CallbackAction::DisabledChip => "chip_x:".to_string(),
            CallbackAction::EditSearchText => "f_text:".to_string(),
            CallbackAction::ApplyFilters => "f_apply:".to_string(),
            CallbackAction::ResetFilters => "f_reset:".to_string(),
            CallbackAction::ShowRecipe(id) => format!("rec:{}", id),
            CallbackAction::WriteComment(id) => format!("cmt:{}", id),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let (cmd, arg) = data.split_once(':')?;
        let key = || ItemKey::parse(arg);

        let action = match cmd {
            "scan_ok" => CallbackAction::ConfirmScan(key()?),
            "scan_no" => CallbackAction::RejectScan,
            "pick_b" => CallbackAction::Pick(ItemKind::Beverage, key()?),
            "pick_i" => CallbackAction::Pick(ItemKind::Ingredient, key()?),
            "rm_b" => CallbackAction::Remove(ItemKind::Beverage, key()?),
            "rm_i" => CallbackAction::Remove(ItemKind::Ingredient, key()?),
            "chip_b" => CallbackAction::ToggleChip(ItemKind::Beverage, key()?),
            "chip_i" => CallbackAction::ToggleChip(ItemKind::Ingredient, key()?),
            "chip_x" => CallbackAction::DisabledChip,
            "f_text" => CallbackAction::EditSearchText,
            "f_apply" => CallbackAction::ApplyFilters,
            "f_reset" => CallbackAction::ResetFilters,
            "rec" => CallbackAction::ShowRecipe(arg.parse().ok()?),
            "cmt" => CallbackAction::WriteComment(arg.parse().ok()?),
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_data_survives_the_button() {
        let actions = [
            CallbackAction::ConfirmScan(ItemKey::of("fernet")),
            CallbackAction::Pick(ItemKind::Ingredient, ItemKey::of("coca cola")),
            CallbackAction::Remove(ItemKind::Beverage, ItemKey::of("Ron")),
            CallbackAction::ToggleChip(ItemKind::Beverage, ItemKey::of("vino")),
            CallbackAction::ApplyFilters,
            CallbackAction::ShowRecipe(12),
            CallbackAction::WriteComment(3),
        ];

        for action in actions {
            assert_eq!(CallbackAction::parse(&action.to_data()), Some(action));
        }
    }

    #[test]
    fn long_names_fit_telegram_callback_limit() {
        let name = "licor de café artesanal añejado en barrica de roble francés";
        let actions = [
            CallbackAction::ConfirmScan(ItemKey::of(name)),
            CallbackAction::Pick(ItemKind::Ingredient, ItemKey::of(name)),
            CallbackAction::Remove(ItemKind::Ingredient, ItemKey::of(name)),
            CallbackAction::ToggleChip(ItemKind::Ingredient, ItemKey::of(name)),
            CallbackAction::ShowRecipe(i64::MAX),
        ];

        for action in actions {
            assert!(action.to_data().len() <= 64, "{}", action.to_data());
        }
    }

    #[test]
    fn keys_resolve_ignoring_case() {
        let names = vec!["Ron".to_string(), "Vino".to_string()];

        assert_eq!(ItemKey::of("vino").find(&names), Some(&names[1]));
        assert_eq!(ItemKey::of("gin").find(&names), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(CallbackAction::parse("nope"), None);
        assert_eq!(CallbackAction::parse("rec:abc"), None);
        assert_eq!(CallbackAction::parse("pick_b:ron"), None);
        assert_eq!(CallbackAction::parse("m_upd:x"), None);
    }

    #[test]
    fn cancel_is_parsed_but_not_listed() {
        assert!(matches!(
            Command::parse("/cancelar", "bacco_bot"),
            Ok(Command::Cancelar)
        ));
        assert!(!Command::descriptions().to_string().contains("cancelar"));
    }
}
