use std::sync::Arc;
use std::time::Instant;

use reqwest::{
    header::ACCEPT,
    multipart::{Form, Part},
    Response,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::constants::DEFAULT_REJECTION_MSG;
use crate::data_types::recipe_data_types::{
    Beverage, Classification, ClassificationBody, Ingredient, NewComment, Recipe, User,
};
use crate::errors::ApiError;

/// Client for the recognition/recipe backend.
#[derive(Clone, Debug)]
pub struct BaccoApi {
    client: reqwest::Client,
    base_url: Arc<str>,
}

impl BaccoApi {
    pub fn new(base_url: &str) -> Self {
        BaccoApi {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn classify_photo(
        &self,
        photo: Vec<u8>,
        file_name: &str,
    ) -> Result<Classification, ApiError> {
        let form = Form::new().part("file", jpeg_part(photo, file_name)?);

        let now = Instant::now();
        let resp = self
            .client
            .post(self.url("/imgs/upload"))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let body: ClassificationBody = read_json(resp).await?;
        log::debug!("Classification: {:.2?}", now.elapsed());

        Ok(body.into())
    }

    pub async fn retrain(
        &self,
        photo: Vec<u8>,
        file_name: &str,
        beverage: &str,
    ) -> Result<(), ApiError> {
        let form = Form::new()
            .part("file", jpeg_part(photo, file_name)?)
            .text("beverage", beverage.to_string());

        self.client
            .post(self.url("/beverages/retrain"))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    pub async fn search_beverages(&self, term: &str) -> Result<Vec<Beverage>, ApiError> {
        self.get_json("/beverages/search", &[("name", term)]).await
    }

    pub async fn search_ingredients(&self, term: &str) -> Result<Vec<Ingredient>, ApiError> {
        self.get_json("/ingredients/search", &[("name", term)]).await
    }

    /// Candidate recipes for everything in the history.
    pub async fn recipes_for(
        &self,
        beverage_names: &[String],
        ingredient_names: &[String],
    ) -> Result<Vec<Recipe>, ApiError> {
        // commas separate the values and must stay unencoded
        let url = format!(
            "{}?beverageNames={}&ingredientNames={}",
            self.url("/imgs/recipes"),
            join_query_values(beverage_names),
            join_query_values(ingredient_names)
        );

        let now = Instant::now();
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let recipes = read_json(resp).await?;
        log::debug!("Recipe query: {:.2?}", now.elapsed());

        Ok(recipes)
    }

    pub async fn recipe_detail(&self, recipe_id: i64) -> Result<Recipe, ApiError> {
        self.get_json(&format!("/imgs/recipe/{}", recipe_id), &[])
            .await
    }

    pub async fn post_comment(&self, comment: &NewComment) -> Result<(), ApiError> {
        self.client
            .post(self.url("/comments"))
            .header(ACCEPT, "application/json")
            .json(comment)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            user: User,
        }

        let resp = self
            .client
            .post(self.url("/users/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        let body = body_or_rejection(resp).await?;
        let login: LoginResponse = serde_json::from_str(&body)?;
        Ok(login.user)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("/users"))
            .header(ACCEPT, "application/json")
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;

        body_or_rejection(resp).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let now = Instant::now();
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let parsed = read_json(resp).await?;
        log::debug!("GET {}: {:.2?}", path, now.elapsed());

        Ok(parsed)
    }
}

fn jpeg_part(photo: Vec<u8>, file_name: &str) -> Result<Part, ApiError> {
    Ok(Part::bytes(photo)
        .file_name(file_name.to_string())
        .mime_str("image/jpeg")?)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        log::warn!("{} -> {}", resp.url(), status);
        return Err(ApiError::Status(status.as_u16()));
    }

    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

// auth endpoints explain failures in a `message` field
async fn body_or_rejection(resp: Response) -> Result<String, ApiError> {
    #[derive(serde::Deserialize)]
    struct Rejection {
        message: Option<String>,
    }

    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<Rejection>(&body)
        .ok()
        .and_then(|r| r.message)
        .unwrap_or_else(|| DEFAULT_REJECTION_MSG.to_string());
    Err(ApiError::Rejected(message))
}

/// Percent-encodes each value and joins them with bare commas.
pub fn join_query_values(values: &[String]) -> String {
    values
        .iter()
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Lower-cased, de-duplicated, alphabetically sorted names for the option keyboard.
pub fn option_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut options: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    options.sort();
    options.dedup();
    options
}
