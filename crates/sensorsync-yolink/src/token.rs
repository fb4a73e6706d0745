//! Bearer token lifecycle.
//!
//! [`TokenManager`] holds at most one token and decides, from the current
//! time, whether it can be reused, should be refreshed because it is inside
//! the refresh buffer, or must be reissued from the long-lived client
//! credentials because it is missing or already expired.
//!
//! The manager takes `&mut self`; callers sharing one manager serialise
//! access themselves (the connection keeps it behind a mutex).

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use sensorsync_core::{Timestamp, sensor::ConnectionStatus};

use crate::{Error, Result};

/// Default width of the window before expiry in which tokens are refreshed.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(30 * 60);

/// Body of a successful token endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
  pub access_token:  String,
  pub refresh_token: String,
  /// Lifetime in seconds.
  pub expires_in:    i64,
}

/// Where tokens come from.
pub trait TokenEndpoint: Send + Sync {
  /// Authenticate with the client credentials.
  fn issue(&self) -> impl Future<Output = Result<TokenGrant>> + Send + '_;

  /// Exchange a refresh token for a new pair.
  fn refresh<'a>(
    &'a self,
    refresh_token: &'a str,
  ) -> impl Future<Output = Result<TokenGrant>> + Send + 'a;
}

/// What [`TokenManager::ensure_valid_at`] will do at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
  Reuse,
  Refresh,
  Reissue,
}

#[derive(Debug, Clone)]
struct Token {
  access:     String,
  refresh:    String,
  expires_at: Timestamp,
}

pub struct TokenManager<T> {
  endpoint:       T,
  refresh_buffer: i64,
  token:          Option<Token>,
}

impl<T: TokenEndpoint> TokenManager<T> {
  pub fn new(endpoint: T, refresh_buffer: Duration) -> Self {
    Self {
      endpoint,
      refresh_buffer: refresh_buffer.as_secs() as i64,
      token: None,
    }
  }

  pub fn next_action(&self, now: Timestamp) -> TokenAction {
    match &self.token {
      None => TokenAction::Reissue,
      Some(token) if now > token.expires_at => TokenAction::Reissue,
      Some(token) if now.as_secs() > token.expires_at.as_secs() - self.refresh_buffer => {
        TokenAction::Refresh
      }
      Some(_) => TokenAction::Reuse,
    }
  }

  /// Bring the token up to date as of `now` and return the access token.
  pub async fn ensure_valid_at(&mut self, now: Timestamp) -> Result<&str> {
    match self.next_action(now) {
      TokenAction::Reuse => {}
      TokenAction::Refresh => {
        tracing::debug!("refreshing access token");
        self.refresh_at(now).await?;
      }
      TokenAction::Reissue => {
        tracing::info!("issuing access token from client credentials");
        let grant = self.endpoint.issue().await?;
        self.accept(grant, now);
      }
    }
    self.access_token().ok_or(Error::NoToken)
  }

  pub async fn ensure_valid(&mut self) -> Result<&str> {
    self.ensure_valid_at(Timestamp::now()).await
  }

  /// Probe the endpoint by refreshing the current token.
  pub async fn status(&mut self) -> ConnectionStatus {
    match self.refresh_at(Timestamp::now()).await {
      Ok(()) => ConnectionStatus::Good,
      Err(error) => ConnectionStatus::Bad(error.to_string()),
    }
  }

  pub fn access_token(&self) -> Option<&str> {
    self.token.as_ref().map(|token| token.access.as_str())
  }

  pub fn expires_at(&self) -> Option<Timestamp> {
    self.token.as_ref().map(|token| token.expires_at)
  }

  pub fn endpoint(&self) -> &T { &self.endpoint }

  async fn refresh_at(&mut self, now: Timestamp) -> Result<()> {
    let refresh = match &self.token {
      Some(token) => token.refresh.clone(),
      None => return Err(Error::NoToken),
    };
    let grant = self.endpoint.refresh(&refresh).await?;
    self.accept(grant, now);
    Ok(())
  }

  fn accept(&mut self, grant: TokenGrant, now: Timestamp) {
    self.token = Some(Token {
      access:     grant.access_token,
      refresh:    grant.refresh_token,
      expires_at: Timestamp::from_secs(now.as_secs() + grant.expires_in),
    });
  }
}

// ─── HTTP endpoint ───────────────────────────────────────────────────────────

/// The form-encoded OAuth-style token endpoint.
#[derive(Clone)]
pub struct HttpTokenEndpoint {
  client:        Client,
  url:           String,
  client_id:     String,
  client_secret: String,
}

impl HttpTokenEndpoint {
  pub fn new(client: Client, url: String, client_id: String, client_secret: String) -> Self {
    Self { client, url, client_id, client_secret }
  }

  async fn post(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
    let resp = self
      .client
      .post(&self.url)
      .form(form)
      .send()
      .await
      .map_err(|source| Error::Http { url: self.url.clone(), source })?;

    if !resp.status().is_success() {
      return Err(Error::Status { url: self.url.clone(), status: resp.status() });
    }
    let body = resp
      .bytes()
      .await
      .map_err(|source| Error::Http { url: self.url.clone(), source })?;
    serde_json::from_slice(&body).map_err(|source| Error::Decode { what: "token grant", source })
  }
}

impl TokenEndpoint for HttpTokenEndpoint {
  async fn issue(&self) -> Result<TokenGrant> {
    self
      .post(&[
        ("grant_type", "client_credentials"),
        ("client_id", self.client_id.as_str()),
        ("client_secret", self.client_secret.as_str()),
      ])
      .await
  }

  async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
    self
      .post(&[
        ("grant_type", "refresh_token"),
        ("client_id", self.client_id.as_str()),
        ("refresh_token", refresh_token),
      ])
      .await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  const ISSUED: i64 = 1_700_000_000;

  #[derive(Default)]
  struct FakeEndpoint {
    issued:    AtomicUsize,
    refreshed: AtomicUsize,
    fail:      bool,
  }

  impl FakeEndpoint {
    fn grant(&self, n: usize, kind: &str) -> Result<TokenGrant> {
      if self.fail {
        return Err(Error::Unhealthy("endpoint down".into()));
      }
      Ok(TokenGrant {
        access_token:  format!("{kind}-access-{n}"),
        refresh_token: format!("{kind}-refresh-{n}"),
        expires_in:    3600,
      })
    }
  }

  impl TokenEndpoint for FakeEndpoint {
    async fn issue(&self) -> Result<TokenGrant> {
      let n = self.issued.fetch_add(1, Ordering::SeqCst);
      self.grant(n, "issued")
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
      assert!(refresh_token.contains("-refresh-"));
      let n = self.refreshed.fetch_add(1, Ordering::SeqCst);
      self.grant(n, "refreshed")
    }
  }

  async fn issued_manager() -> TokenManager<FakeEndpoint> {
    let mut manager = TokenManager::new(FakeEndpoint::default(), DEFAULT_REFRESH_BUFFER);
    manager.ensure_valid_at(Timestamp::from_secs(ISSUED)).await.unwrap();
    manager
  }

  fn calls(manager: &TokenManager<FakeEndpoint>) -> (usize, usize) {
    (
      manager.endpoint().issued.load(Ordering::SeqCst),
      manager.endpoint().refreshed.load(Ordering::SeqCst),
    )
  }

  #[tokio::test]
  async fn first_call_issues() {
    let manager = issued_manager().await;
    assert_eq!(calls(&manager), (1, 0));
    assert_eq!(manager.access_token(), Some("issued-access-0"));
    assert_eq!(manager.expires_at(), Some(Timestamp::from_secs(ISSUED + 3600)));
  }

  #[tokio::test]
  async fn fresh_token_is_reused() {
    let mut manager = issued_manager().await;
    let token = manager.ensure_valid_at(Timestamp::from_secs(ISSUED + 10)).await.unwrap();
    assert_eq!(token, "issued-access-0");
    assert_eq!(calls(&manager), (1, 0));
  }

  #[tokio::test]
  async fn token_inside_buffer_is_refreshed() {
    let mut manager = issued_manager().await;
    let now = Timestamp::from_secs(ISSUED + 1900);
    assert_eq!(manager.next_action(now), TokenAction::Refresh);
    let token = manager.ensure_valid_at(now).await.unwrap();
    assert_eq!(token, "refreshed-access-0");
    assert_eq!(calls(&manager), (1, 1));
    assert_eq!(manager.expires_at(), Some(Timestamp::from_secs(ISSUED + 1900 + 3600)));
  }

  #[tokio::test]
  async fn expired_token_is_reissued() {
    let mut manager = issued_manager().await;
    let now = Timestamp::from_secs(ISSUED + 3700);
    assert_eq!(manager.next_action(now), TokenAction::Reissue);
    let token = manager.ensure_valid_at(now).await.unwrap();
    assert_eq!(token, "issued-access-1");
    assert_eq!(calls(&manager), (2, 0));
  }

  #[tokio::test]
  async fn buffer_edges_are_exclusive() {
    let manager = issued_manager().await;
    assert_eq!(manager.next_action(Timestamp::from_secs(ISSUED + 1800)), TokenAction::Reuse);
    assert_eq!(manager.next_action(Timestamp::from_secs(ISSUED + 3600)), TokenAction::Refresh);
  }

  #[tokio::test]
  async fn status_refreshes_and_reports_failures() {
    let mut manager = issued_manager().await;
    assert_eq!(manager.status().await, ConnectionStatus::Good);
    assert_eq!(calls(&manager), (1, 1));

    let mut empty = TokenManager::new(FakeEndpoint::default(), DEFAULT_REFRESH_BUFFER);
    assert_eq!(empty.status().await, ConnectionStatus::Bad("no token to refresh".into()));

    let mut failing = TokenManager::new(
      FakeEndpoint { fail: true, ..FakeEndpoint::default() },
      DEFAULT_REFRESH_BUFFER,
    );
    assert!(failing.ensure_valid().await.is_err());
    assert!(failing.access_token().is_none());
  }
}
