// src/auth.rs

use crate::{
    client::RobustClient,
    constants::portal,
    error::*,
};
use log::{debug, info};
use scraper::{Html, Selector};
use std::{fmt, sync::LazyLock};
use url::Url;

static LOGIN_TOKEN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="logintoken"]"#).unwrap());
static LOGIN_ERROR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("#{}", portal::LOGIN_ERROR_ID)).unwrap());

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn login_token(login_page: &str) -> Option<String> {
    Html::parse_document(login_page)
        .select(&LOGIN_TOKEN_SELECTOR)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

/// A response that still shows the login form (or its error box) means the portal refused us.
fn is_rejected(final_url: &Url, body: &str) -> bool {
    if final_url.path().ends_with("/login/index.php") {
        return true;
    }
    Html::parse_document(body)
        .select(&LOGIN_ERROR_SELECTOR)
        .next()
        .is_some()
}

/// Logs in through the portal's login form. On success the session cookie stays in `client`.
pub async fn login(client: &RobustClient, login_url: &Url, credentials: &Credentials) -> AppResult<()> {
    info!("Logging in as '{}' at {}", credentials.username, login_url);

    let token = {
        let page = client.get(login_url.clone()).await?.text().await?;
        login_token(&page)
    };
    debug!("Login token present: {}", token.is_some());

    let mut fields = vec![
        ("action", "login"),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
    ];
    if let Some(token) = token.as_deref() {
        fields.push(("logintoken", token));
    }

    let res = client
        .post_form(login_url.clone(), &fields)
        .await
        .map_err(|e| match e {
            AppError::Network(err) if err.is_status() => AppError::LoginFailed(err.to_string()),
            other => other,
        })?;
    let final_url = res.url().clone();
    let body = res.text().await?;

    if is_rejected(&final_url, &body) {
        return Err(AppError::LoginFailed(
            "the portal rejected the username or password".to_string(),
        ));
    }
    info!("Login succeeded, landed on {}", final_url);
    Ok(())
}
