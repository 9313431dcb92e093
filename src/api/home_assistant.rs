use std::time::Duration;

use reqwest::{
    Client,
    ClientBuilder,
    Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::Deserialize;
use serde_json::json;

use crate::prelude::*;

pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    pub fn try_new(access_token: &str, base_url: &Url) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {access_token}"))?,
        )]);
        let client =
            ClientBuilder::new().default_headers(headers).timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, base_url: base_url.clone() })
    }

    /// Fetch the current state of the entity.
    #[instrument(skip(self))]
    pub async fn get_state(&self, entity_id: &str) -> Result<EntityState> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .push("states")
            .push(entity_id);
        let state: EntityState =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        Ok(state)
    }

    /// Fetch the entity, degrading to `None` with a warning when it is unavailable.
    pub async fn try_get_state(&self, entity_id: &str) -> Option<EntityState> {
        match self.get_state(entity_id).await {
            Ok(state) => Some(state),
            Err(error) => {
                warn!(entity_id, error = %format!("{error:#}"), "failed to fetch the sensor");
                None
            }
        }
    }

    /// Run a `script.turn_on` service call for the given script entity.
    #[instrument(skip(self))]
    pub async fn turn_on_script(&self, entity_id: &str) -> Result {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .push("services")
            .push("script")
            .push("turn_on");
        self.client
            .post(url)
            .json(&json!({"entity_id": entity_id}))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[must_use]
#[derive(Debug, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,

    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl EntityState {
    /// Numeric reading of the state, if it parses.
    ///
    /// Home Assistant reports unavailable sensors as `"unknown"` or
    /// `"unavailable"`, which simply yield `None` here.
    #[must_use]
    pub fn numeric_state(&self) -> Option<f64> {
        self.state.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_entity_state() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "entity_id": "sensor.house_consumption",
                "state": "1528.4",
                "attributes": {
                    "unit_of_measurement": "W",
                    "friendly_name": "House consumption"
                },
                "last_changed": "2025-10-01T17:08:40.326747+00:00",
                "last_updated": "2025-10-01T17:08:40.326747+00:00"
            }
        "#;
        let state: EntityState = serde_json::from_str(RESPONSE)?;
        assert_eq!(state.entity_id, "sensor.house_consumption");
        assert_eq!(state.numeric_state(), Some(1528.4));
        Ok(())
    }

    #[test]
    fn test_non_numeric_state() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"{"entity_id": "sensor.soc", "state": "unavailable"}"#;
        let state: EntityState = serde_json::from_str(RESPONSE)?;
        assert_eq!(state.numeric_state(), None);
        Ok(())
    }
}
