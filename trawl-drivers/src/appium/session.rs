use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::Client;
use serde_json::{json, Value};
use tracing::debug;
use trawl_common::{Result, TrawlError};

use crate::appium::command::AppiumCommand;
use crate::gesture::TouchSequence;
use crate::locator::Locator;
use crate::session::{ElementId, MobileSession, WindowSize};

const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f741ba4ac54";
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// A live Appium session on top of a `fantoccini` WebDriver client.
pub struct AppiumSession {
    pub(crate) client: Client,
}

impl AppiumSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Delete the server-side session.
    pub async fn close(&self) -> Result<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| TrawlError::Command(format!("delete session: {e}")))
    }

    async fn call(&self, cmd: AppiumCommand) -> Result<Value> {
        let path = cmd.path().to_string();
        self.client
            .issue_cmd(cmd)
            .await
            .map_err(|e| map_cmd_error(&path, e))
    }
}

fn map_cmd_error(context: &str, err: CmdError) -> TrawlError {
    if err.is_no_such_element() {
        TrawlError::NoSuchElement(context.to_string())
    } else {
        TrawlError::Command(format!("{context}: {err}"))
    }
}

fn parse_element_ref(value: &Value) -> Result<ElementId> {
    value
        .get(W3C_ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementId::new)
        .ok_or_else(|| TrawlError::Protocol(format!("expected an element reference, got {value}")))
}

fn locator_body(locator: &Locator) -> Value {
    json!({ "using": locator.strategy.as_w3c(), "value": locator.value })
}

#[async_trait]
impl MobileSession for AppiumSession {
    async fn find_element(&self, locator: &Locator) -> Result<Option<ElementId>> {
        match self
            .call(AppiumCommand::post("element", locator_body(locator)))
            .await
        {
            Ok(value) => parse_element_ref(&value).map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_child_elements(
        &self,
        parent: &ElementId,
        locator: &Locator,
    ) -> Result<Vec<ElementId>> {
        let value = match self
            .call(AppiumCommand::post(
                format!("element/{parent}/elements"),
                locator_body(locator),
            ))
            .await
        {
            Ok(value) => value,
            Err(err) if err.is_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        value
            .as_array()
            .ok_or_else(|| TrawlError::Protocol(format!("expected an element list, got {value}")))?
            .iter()
            .map(parse_element_ref)
            .collect()
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        let value = self
            .call(AppiumCommand::get(format!("element/{element}/displayed")))
            .await?;
        value
            .as_bool()
            .ok_or_else(|| TrawlError::Protocol(format!("displayed: expected bool, got {value}")))
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let value = self
            .call(AppiumCommand::get(format!("element/{element}/text")))
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        let value = self
            .call(AppiumCommand::get(format!(
                "element/{element}/attribute/{name}"
            )))
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.call(AppiumCommand::post(
            format!("element/{element}/click"),
            json!({}),
        ))
        .await?;
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        self.call(AppiumCommand::post("back", json!({}))).await?;
        Ok(())
    }

    async fn window_size(&self) -> Result<WindowSize> {
        let value = self.call(AppiumCommand::get("window/rect")).await?;
        let dim = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_f64)
                .map(|v| v.round() as u32)
                .ok_or_else(|| TrawlError::Protocol(format!("window/rect: missing {key} in {value}")))
        };
        Ok(WindowSize {
            width: dim("width")?,
            height: dim("height")?,
        })
    }

    async fn perform_touch(&self, sequence: &TouchSequence) -> Result<()> {
        self.call(AppiumCommand::post("actions", sequence.to_w3c_actions()))
            .await?;
        Ok(())
    }

    async fn execute_mobile(&self, command: &str, args: Value) -> Result<Value> {
        debug!(target: "trawl.session", command, %args, "execute");
        self.client
            .execute(command, vec![args])
            .await
            .map_err(|e| map_cmd_error(command, e))
    }

    async fn current_package(&self) -> Result<String> {
        let value = self
            .call(AppiumCommand::get("appium/device/current_package"))
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TrawlError::Protocol(format!("current_package: got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_w3c_and_legacy_element_refs() {
        let w3c = json!({ W3C_ELEMENT_KEY: "00000000-0000-0001" });
        assert_eq!(
            parse_element_ref(&w3c).unwrap(),
            ElementId::new("00000000-0000-0001")
        );

        let legacy = json!({ "ELEMENT": "42" });
        assert_eq!(parse_element_ref(&legacy).unwrap(), ElementId::new("42"));

        let err = parse_element_ref(&json!({ "nope": 1 })).unwrap_err();
        assert!(matches!(err, TrawlError::Protocol(_)));
    }

    #[test]
    fn no_such_element_becomes_a_miss() {
        use fantoccini::error::{ErrorStatus, WebDriver};

        let miss = CmdError::Standard(WebDriver::new(
            ErrorStatus::NoSuchElement,
            "An element could not be located on the page using the given search parameters.",
        ));
        let err = map_cmd_error("element", miss);
        assert!(matches!(err, TrawlError::NoSuchElement(_)));
        assert!(err.is_not_found());

        let stale = CmdError::Standard(WebDriver::new(
            ErrorStatus::StaleElementReference,
            "stale element reference",
        ));
        assert!(matches!(
            map_cmd_error("element/1/click", stale),
            TrawlError::Command(_)
        ));
    }

    #[test]
    fn locator_body_uses_appium_strategy_names() {
        assert_eq!(
            locator_body(&Locator::accessibility_id("扫一扫")),
            json!({ "using": "accessibility id", "value": "扫一扫" })
        );
        assert_eq!(
            locator_body(&Locator::class_name("android.widget.TextView")),
            json!({ "using": "class name", "value": "android.widget.TextView" })
        );
    }
}
