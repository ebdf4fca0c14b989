use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::instrument;

use crate::{
    documents::{
        CatalogGame, ChatResponse, ClassifiedIntent, CollectionAction, CollectionEntry,
        GameDetails,
    },
    logging::{ChatEvent, CollectionEvent},
    traits::{CollectionBackend, Session},
    Status,
};

use super::models::{ChatRequest, GamesRequest, RemoveRequest, SearchRequest};

/// Typed client of the collection service REST endpoints.
#[derive(Clone)]
pub struct CollectionApi {
    url: String,
    client: reqwest::Client,
    session: Arc<dyn Session>,
}

impl CollectionApi {
    pub fn new(url: &str, session: Arc<dyn Session>, timeout: Duration) -> Result<Self, Status> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Status::new("Failed to build http client", e))?;

        Ok(CollectionApi {
            url: url.trim_end_matches('/').to_owned(),
            client,
            session,
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, Status> {
        let token = self
            .session
            .access_token()
            .ok_or_else(|| Status::unauthorized("No access token, user is not signed in"))?;

        Ok(self
            .client
            .request(method, format!("{}/api/{endpoint}", &self.url))
            .bearer_auth(token))
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, Status> {
        parse(self.request(Method::GET, endpoint)?).await
    }

    async fn send<B: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<R, Status> {
        parse(self.request(method, endpoint)?.json(body)).await
    }

    async fn ack<B: Serialize>(&self, method: Method, endpoint: &str, body: &B) -> Result<(), Status> {
        let resp = execute(self.request(method, endpoint)?.json(body)).await?;
        // Drain the body so the connection can be reused.
        resp.bytes().await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionBackend for CollectionApi {
    #[instrument(level = "trace", skip(self))]
    async fn classify_message(&self, text: &str) -> Result<ClassifiedIntent, Status> {
        let response = self
            .send::<_, ChatResponse>(
                Method::POST,
                "chat",
                &ChatRequest {
                    message: text.to_owned(),
                },
            )
            .await
            .map(ClassifiedIntent::from);

        ChatEvent::classify(text, &response);
        response
    }

    #[instrument(level = "trace", skip(self))]
    async fn search_catalog(&self, name: &str) -> Result<Vec<CatalogGame>, Status> {
        let response = self
            .send(
                Method::POST,
                "games/search",
                &SearchRequest {
                    name: name.to_owned(),
                },
            )
            .await;

        ChatEvent::search(name, &response);
        response
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_collection(&self) -> Result<Vec<CollectionEntry>, Status> {
        let response = self.get("collection").await;
        CollectionEvent::fetch(&response);
        response
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_catalog_by_ids(&self, ids: &[u64]) -> Result<Vec<CatalogGame>, Status> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .send(Method::POST, "games", &GamesRequest { id: ids.to_vec() })
            .await;

        CollectionEvent::catalog(ids, &response);
        response
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_game_details(&self, id: u64) -> Result<GameDetails, Status> {
        self.get(&format!("games/{id}")).await
    }

    #[instrument(level = "trace", skip(self))]
    async fn add_entry(&self, entry: &CollectionEntry) -> Result<(), Status> {
        let response = self.ack(Method::POST, "collection", entry).await;
        CollectionEvent::mutation(CollectionAction::Add, entry.game_id, &response);
        response
    }

    #[instrument(level = "trace", skip(self))]
    async fn update_entry(&self, entry: &CollectionEntry) -> Result<(), Status> {
        let response = self.ack(Method::PUT, "collection", entry).await;
        CollectionEvent::mutation(CollectionAction::Update, entry.game_id, &response);
        response
    }

    #[instrument(level = "trace", skip(self))]
    async fn remove_entry(&self, game_id: u64) -> Result<(), Status> {
        let response = self
            .ack(Method::DELETE, "collection", &RemoveRequest { game_id })
            .await;
        CollectionEvent::mutation(CollectionAction::Remove, game_id, &response);
        response
    }
}

/// Sends the request and maps non-2xx responses to errors. 401 maps to
/// `Status::Unauthorized`.
async fn execute(request: RequestBuilder) -> Result<reqwest::Response, Status> {
    let resp = match request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            let url = e.url().map(|url| url.to_string()).unwrap_or_default();
            return Err(Status::internal(format!("Request failed: {e}\nurl: {url}")));
        }
    };

    match resp.status() {
        status if status.is_success() => Ok(resp),
        StatusCode::UNAUTHORIZED => Err(Status::unauthorized(format!(
            "Session rejected\nurl: {}",
            resp.url()
        ))),
        status => {
            let url = resp.url().to_string();
            let text = resp.text().await.unwrap_or_default();
            Err(Status::internal(format!(
                "Request failed with {status}: {text}\nurl: {url}"
            )))
        }
    }
}

async fn parse<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, Status> {
    let resp = execute(request).await?;
    let url = resp.url().to_string();

    let text = resp.text().await?;
    match serde_json::from_str::<R>(&text) {
        Ok(resp) => Ok(resp),
        Err(_) => {
            let status = Status::internal(format!("Failed to parse response: {text}\nurl: {url}"));
            Err(status)
        }
    }
}
