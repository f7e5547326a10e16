use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(350);

pub const NOT_RECOGNIZED_MSG: &str = "No se pudo identificar el producto.";
pub const EMPTY_HISTORY_MSG: &str =
    "Tu historial está vacío. Mandá una foto o usá /bebida o /ingrediente.";
pub const NO_CANDIDATES_MSG: &str = "Primero buscá recetas con /recetas.";
pub const FETCH_FAILED_MSG: &str = "No se pudo consultar el servidor, probá de nuevo.";
pub const STALE_BUTTON_MSG: &str = "Este botón ya no es válido.";
pub const LOGIN_REQUIRED_MSG: &str = "Para comentar primero iniciá sesión con /login.";
pub const DEFAULT_REJECTION_MSG: &str = "Usuario o contraseña incorrecta";
pub const SEARCH_PROMPT_BEVERAGE: &str = "Escribí el nombre de la bebida:";
pub const SEARCH_PROMPT_INGREDIENT: &str = "Escribí el nombre del ingrediente:";

pub const HEADER_EMOJIS: [&str; 6] = ["🍸", "🍹", "🥃", "🍷", "🧉", "🍾"];

/// Emoji for the beverages the classifier knows about.
pub fn beverage_emoji(name: &str) -> &'static str {
    match name.to_lowercase().as_str() {
        "fernet" => "🧉",
        "gancia" => "🍸",
        "licor" => "🥃",
        "ron" => "🍹",
        "vino" => "🍷",
        "whiskey" => "🥃",
        _ => "🍶",
    }
}
