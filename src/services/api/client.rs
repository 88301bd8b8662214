use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::{
    ApiError, LoadEventsResponse, ResponseStatus, SaveResponse, ScheduleApi,
    StatusResponse, UsersResponse,
};
use crate::models::event::EventPayload;
use crate::models::settings::Settings;
use crate::models::user::{UserInfo, UserSelection};

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";
const CONNECTION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking HTTP client for the schedule endpoints.
pub struct ApiClient {
    client: Client,
    jar: Arc<Jar>,
    server_url: Url,
    api_root: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let server_url = Url::parse(&settings.server_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", settings.server_url, e)))?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = settings.session_cookie.as_deref() {
            jar.add_cookie_str(cookie, &server_url);
        }

        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(settings.request_timeout_secs.map(Duration::from_secs))
            .build()?;

        let api_root = format!(
            "{}/{}",
            settings.server_url.trim_end_matches('/'),
            settings.api_base.trim_matches('/')
        );

        Ok(Self {
            client,
            jar,
            server_url,
            api_root,
        })
    }

    /// Cookie jar shared with the HTTP client.
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/", self.api_root.trim_end_matches('/'), path)
    }

    /// Value of the `csrftoken` cookie, or empty when the server has not set one.
    pub fn csrf_token(&self) -> String {
        let token = self.jar.cookies(&self.server_url).and_then(|header| {
            header.to_str().ok().and_then(|cookies| {
                cookies
                    .split(';')
                    .map(str::trim)
                    .find_map(|pair| pair.strip_prefix("csrftoken="))
                    .map(str::to_string)
            })
        });

        token.unwrap_or_else(|| {
            log::warn!("CSRF token not found in cookies ({})", CSRF_COOKIE);
            String::new()
        })
    }

    fn with_csrf(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(CSRF_HEADER, self.csrf_token())
    }

    fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.with_csrf(self.client.post(self.endpoint(path)).json(body));
        Self::read_json(request)
    }

    fn try_load_events(&self, date_from: NaiveDate, date_to: NaiveDate) -> Result<Vec<Value>, ApiError> {
        let url = format!(
            "{}?date_from={}&date_to={}",
            self.endpoint("load-events"),
            urlencoding::encode(&date_from.format("%Y-%m-%d").to_string()),
            urlencoding::encode(&date_to.format("%Y-%m-%d").to_string())
        );

        let response: LoadEventsResponse = Self::read_json(self.with_csrf(self.client.get(url)))?;
        match response.status {
            ResponseStatus::Success => Ok(response.events),
            ResponseStatus::Error => Err(ApiError::Server(
                response
                    .message
                    .unwrap_or_else(|| "Failed to load events".to_string()),
            )),
        }
    }
}

impl ScheduleApi for ApiClient {
    fn save_event(&self, payload: &EventPayload) -> Result<SaveResponse, ApiError> {
        self.post_json("save-event", payload).map_err(|e| {
            log::error!("Failed to save event: {}", e);
            e
        })
    }

    fn delete_event(&self, id: Option<i64>, delete_recurring: bool) -> Result<StatusResponse, ApiError> {
        let id = id.ok_or(ApiError::MissingId)?;

        let body = json!({
            "id": id,
            "delete_recurring": delete_recurring,
        });
        self.post_json("delete-event", &body).map_err(|e| {
            log::error!("Failed to delete event {}: {}", id, e);
            e
        })
    }

    fn load_events(&self, date_from: NaiveDate, date_to: NaiveDate) -> Vec<Value> {
        match self.try_load_events(date_from, date_to) {
            Ok(events) => {
                log::info!("Loaded {} events for {} - {}", events.len(), date_from, date_to);
                events
            }
            Err(e) => {
                log::error!("Failed to load events for {} - {}: {}", date_from, date_to, e);
                Vec::new()
            }
        }
    }

    fn check_connection(&self) -> bool {
        let request = self
            .client
            .head(self.endpoint("load-events"))
            .timeout(CONNECTION_CHECK_TIMEOUT);

        match request.send() {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::warn!("Server is unreachable: {}", e);
                false
            }
        }
    }

    fn list_users(&self) -> Result<Vec<UserInfo>, ApiError> {
        let response: UsersResponse = Self::read_json(self.with_csrf(self.client.get(self.endpoint("users"))))?;
        match response.status {
            ResponseStatus::Success => Ok(response.users),
            ResponseStatus::Error => Err(ApiError::Server(
                response
                    .message
                    .unwrap_or_else(|| "Failed to load users".to_string()),
            )),
        }
    }

    fn switch_user(&self, selection: &UserSelection) -> Result<StatusResponse, ApiError> {
        let body = json!({ "user_id": selection.to_string() });
        self.post_json("switch-user", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server_url: &str, cookie: Option<&str>) -> ApiClient {
        let settings = Settings {
            server_url: server_url.to_string(),
            session_cookie: cookie.map(str::to_string),
            ..Settings::default()
        };
        ApiClient::new(&settings).unwrap()
    }

    #[test]
    fn test_endpoint_joins_api_base() {
        let client = client_for("http://localhost:8000/", None);
        assert_eq!(client.endpoint("save-event"), "http://localhost:8000/api/save-event/");
    }

    #[test]
    fn test_csrf_token_from_seeded_cookie() {
        let client = client_for("http://localhost:8000", Some("csrftoken=abc123"));
        assert_eq!(client.csrf_token(), "abc123");
    }

    #[test]
    fn test_missing_csrf_token_is_empty() {
        let client = client_for("http://localhost:8000", None);
        assert_eq!(client.csrf_token(), "");
    }

    #[test]
    fn test_invalid_server_url() {
        let settings = Settings {
            server_url: "not a url".to_string(),
            ..Settings::default()
        };
        assert!(matches!(ApiClient::new(&settings), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_delete_without_id_fails_before_request() {
        let client = client_for("http://localhost:8000", None);
        assert!(matches!(client.delete_event(None, false), Err(ApiError::MissingId)));
    }
}
