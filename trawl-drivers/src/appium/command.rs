use fantoccini::wd::WebDriverCompatibleCommand;
use http::Method;
use serde_json::Value;

/// Session-scoped WebDriver request. Lets us use the Appium locator
/// strategies and endpoints (`accessibility id`, `/appium/device/...`) that
/// fantoccini's typed commands don't cover.
#[derive(Debug, Clone)]
pub struct AppiumCommand {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl AppiumCommand {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl WebDriverCompatibleCommand for AppiumCommand {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> Result<url::Url, url::ParseError> {
        let session = session_id.unwrap_or_default();
        base_url.join(&format!("session/{session}/{}", self.path))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (Method, Option<String>) {
        (
            self.method.clone(),
            self.body.as_ref().map(|body| body.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_is_session_scoped() {
        let base = url::Url::parse("http://localhost:4723/wd/hub/").unwrap();
        let cmd = AppiumCommand::get("appium/device/current_package");
        let url = cmd.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4723/wd/hub/session/abc/appium/device/current_package"
        );
    }

    #[test]
    fn post_carries_json_body() {
        let base = url::Url::parse("http://localhost:4723/").unwrap();
        let cmd = AppiumCommand::post("element", json!({ "using": "id", "value": "x" }));
        let url = cmd.endpoint(&base, Some("s1")).unwrap();
        let (method, body) = cmd.method_and_body(&url);
        assert_eq!(method, Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body, json!({ "using": "id", "value": "x" }));
    }
}
