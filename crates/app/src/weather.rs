use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

pub struct WeatherClient {
    client: Client,
    api_key: String,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "OpenWeatherMap API key not provided");
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build weather HTTP client")?;
        Ok(Self { client, api_key })
    }

    /// Current conditions for `city` in metric units, as returned by OpenWeatherMap.
    pub async fn current(&self, city: &str) -> Result<Value> {
        let response = self
            .client
            .get(OPENWEATHER_URL)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .with_context(|| format!("weather lookup for {city} was rejected"))?;

        response.json().await.context("failed to parse weather response")
    }
}

pub fn format_weather_summary(weather: &Value) -> String {
    let name = weather
        .pointer("/name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown location");
    let description = weather
        .pointer("/weather/0/description")
        .and_then(Value::as_str)
        .unwrap_or("N/A");
    let reading = |path: &str| {
        weather
            .pointer(path)
            .filter(|value| value.is_number())
            .map(Value::to_string)
            .unwrap_or_else(|| "N/A".to_string())
    };

    format!(
        "Weather in {name}: {description}. Temperature: {}°C (feels like {}°C). Humidity: {}%",
        reading("/main/temp"),
        reading("/main/feels_like"),
        reading("/main/humidity"),
    )
}

#[cfg(test)]
mod tests {
    use super::format_weather_summary;
    use serde_json::json;

    #[test]
    fn summary_reads_openweather_fields() {
        let weather = json!({
            "name": "London",
            "weather": [{"description": "light rain"}],
            "main": {"temp": 12.5, "feels_like": 11, "humidity": 81},
        });

        assert_eq!(
            format_weather_summary(&weather),
            "Weather in London: light rain. Temperature: 12.5°C (feels like 11°C). Humidity: 81%"
        );
    }

    #[test]
    fn summary_tolerates_missing_fields() {
        let summary = format_weather_summary(&json!({}));
        assert_eq!(
            summary,
            "Weather in Unknown location: N/A. Temperature: N/A°C (feels like N/A°C). Humidity: N/A%"
        );
    }

    #[test]
    fn client_requires_a_key() {
        assert!(super::WeatherClient::new(String::new()).is_err());
    }
}
