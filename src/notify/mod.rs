use crate::http::client::HttpClient;

/// Outbound push notifications. Delivery is best-effort by contract:
/// implementations must never surface a failure to the caller, because a
/// lost notification must not affect the conversation.
pub trait Notify {
    fn push(&self, message: &str) -> impl std::future::Future<Output = ()> + Send;
}

/// Pushover `messages.json` sender. Without both credentials configured it
/// is an inert no-op, matching the behavior when the owner has not set up
/// notifications yet.
#[derive(Debug, Clone)]
pub struct PushoverNotifier {
    http: HttpClient,
    token: Option<String>,
    user: Option<String>,
    base_url: String,
}

impl PushoverNotifier {
    pub fn new(
        http: HttpClient,
        token: Option<String>,
        user: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            http,
            token,
            user,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/1/messages.json", self.base_url)
    }
}

impl Notify for PushoverNotifier {
    async fn push(&self, message: &str) {
        let (Some(token), Some(user)) = (self.token.as_deref(), self.user.as_deref()) else {
            return;
        };

        // Errors are intentionally dropped; the HttpClient still records
        // them in the session trace for diagnosis.
        let _ = self
            .http
            .post_form(
                &self.endpoint(),
                &[("token", token), ("user", user), ("message", message)],
            )
            .await;
    }
}
