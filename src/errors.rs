use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend no disponible: {0}")]
    Request(#[from] reqwest::Error),
    #[error("el backend respondió con estado {0}")]
    Status(u16),
    #[error("{0}")]
    Rejected(String),
    #[error("respuesta ilegible: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandArgsError {
    #[error("Uso: /login <usuario> <clave>")]
    Login,
    #[error("Uso: /registro <nombre> <email> <clave>")]
    Register,
}
