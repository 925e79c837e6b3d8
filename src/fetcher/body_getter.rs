use std::future::Future;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unsuccessful status {0}")]
    Status(u16),
    #[error("unreadable body: {0}")]
    Body(String),
}

/// Retrieves the raw body of a page with a plain GET.
pub trait BodyGetter {
    fn get_body(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

impl BodyGetter for reqwest::Client {
    #[tracing::instrument(skip(self))]
    fn get_body(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        async move {
            // The response is owned by this future, so the connection goes back
            // to the pool on every return path below.
            let resp = match self.get(url).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::error!("{}", err.to_string());
                    return Err(FetchError::Transport(err.to_string()));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                tracing::error!("{} responded with {}", url, status);
                return Err(FetchError::Status(status.as_u16()));
            }

            match resp.text().await {
                Ok(content) => Ok(content),
                Err(err) => {
                    tracing::error!("{}", err.to_string());
                    Err(FetchError::Body(err.to_string()))
                }
            }
        }
    }
}
