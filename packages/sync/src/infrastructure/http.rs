//! REST snapshot fetching with reqwest.

use std::marker::PhantomData;

use async_trait::async_trait;
use geolive_shared::session::Session;
use reqwest::{Client, Url, header::AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::domain::{FeedEndpoint, FetchError, SnapshotFetcher};

/// Fetches a feed's snapshot with `GET <api>/<path>?<query>`.
///
/// Sends `Authorization: Bearer <token>` when the session has a token.
pub struct HttpSnapshotFetcher<T> {
    client: Client,
    session: Session,
    endpoint: FeedEndpoint,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpSnapshotFetcher<T> {
    pub fn new(session: Session, endpoint: FeedEndpoint) -> Self {
        Self::with_client(Client::new(), session, endpoint)
    }

    pub fn with_client(client: Client, session: Session, endpoint: FeedEndpoint) -> Self {
        Self {
            client,
            session,
            endpoint,
            _item: PhantomData,
        }
    }

    /// Absolute snapshot URL including the endpoint's query parameters
    pub fn url(&self) -> Result<Url, FetchError> {
        let mut url = self
            .session
            .api_url(&self.endpoint.path)
            .map_err(|e| FetchError::Request(e.to_string()))?;
        if !self.endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.endpoint.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl<T> SnapshotFetcher<T> for HttpSnapshotFetcher<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<Vec<T>, FetchError> {
        let url = self.url()?;
        tracing::debug!("Fetching snapshot from {}", url);

        let mut request = self.client.get(url);
        if let Some(header) = self.session.authorization_header() {
            request = request.header(AUTHORIZATION, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HeatPoint;

    #[test]
    fn test_url_carries_path_and_query() {
        // テスト項目: スナップショット URL にパスとクエリが付与される
        // given (前提条件):
        let session = Session::new("http://localhost:8000/api", None).unwrap();
        let endpoint = FeedEndpoint::new("visualization/heatmap").with_param("limit", "500");

        // when (操作):
        let fetcher = HttpSnapshotFetcher::<HeatPoint>::new(session, endpoint);

        // then (期待する結果):
        assert_eq!(
            fetcher.url().unwrap().as_str(),
            "http://localhost:8000/api/visualization/heatmap?limit=500"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_request_error() {
        // テスト項目: 接続できないサーバーへの取得は Request エラーになる
        // given (前提条件):
        let session = Session::new("http://127.0.0.1:1", None).unwrap();
        let fetcher = HttpSnapshotFetcher::<HeatPoint>::new(session, FeedEndpoint::new("alerts/"));

        // when (操作):
        let result = fetcher.fetch().await;

        // then (期待する結果):
        assert!(matches!(result, Err(FetchError::Request(_))));
    }
}
