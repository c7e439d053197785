// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal-text carbon estimation via the Gemini API.
//!
//! Estimation is best effort. Any failure (no API key, network error,
//! non-2xx status, unparseable or implausible answer) is logged and
//! replaced by a fixed fallback estimate. Calls are never retried.

use crate::config::Config;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Estimate used whenever the service cannot produce one (kg CO₂e).
pub const FALLBACK_CARBON_KG: f64 = 3.0;
pub const FALLBACK_EXPLANATION: &str = "Unable to analyze meal. Using default values.";

const SYSTEM_INSTRUCTION: &str = "\
You are an expert environmental scientist specializing in carbon footprint analysis of food.
Analyze the provided meal description and estimate its carbon footprint in kg of CO2 equivalent.
Consider ingredients, portion sizes, and preparation methods.
Provide a brief explanation of your analysis.

Guidelines:
- Plant-based meals: 0.5-2.0 kg CO2e
- Vegetarian with dairy: 1.5-3.0 kg CO2e
- Meals with chicken/fish: 2.0-5.0 kg CO2e
- Meals with beef/lamb: 5.0-10.0 kg CO2e
- Consider portion size in your calculation";

/// Carbon estimate for a free-text meal description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MealEstimate {
    pub carbon_kg: f64,
    pub explanation: String,
}

impl MealEstimate {
    pub fn fallback() -> Self {
        Self {
            carbon_kg: FALLBACK_CARBON_KG,
            explanation: FALLBACK_EXPLANATION.to_string(),
        }
    }
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct MealAnalyzer {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl MealAnalyzer {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            model,
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Estimate a meal's footprint, substituting the fallback on any failure.
    pub async fn analyze(&self, meal_text: &str) -> MealEstimate {
        match self.request_estimate(meal_text).await {
            Ok(estimate) => {
                tracing::info!(carbon_kg = estimate.carbon_kg, "Meal analyzed");
                estimate
            }
            Err(e) => {
                tracing::warn!(error = %e, "Meal analysis failed, using fallback estimate");
                MealEstimate::fallback()
            }
        }
    }

    async fn request_estimate(&self, meal_text: &str) -> Result<MealEstimate, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::MealService("GEMINI_API_KEY not configured".to_string()))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&build_request_body(meal_text))
            .send()
            .await
            .map_err(|e| AppError::MealService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MealService(format!("HTTP {}: {}", status, body)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::MealService(format!("Invalid response body: {}", e)))?;

        parse_generation_response(&body)
    }
}

/// Request body: system instruction, user text, and a JSON response schema.
fn build_request_body(meal_text: &str) -> serde_json::Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": SYSTEM_INSTRUCTION }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": meal_text }]
        }],
        "generationConfig": {
            "temperature": 0.2,
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "carbon_kg": {
                        "type": "NUMBER",
                        "description": "Estimated carbon footprint in kg CO2e"
                    },
                    "explanation": {
                        "type": "STRING",
                        "description": "Brief explanation of the carbon footprint calculation"
                    }
                },
                "required": ["carbon_kg", "explanation"]
            }
        }
    })
}

/// Extract the structured estimate from a `generateContent` response.
fn parse_generation_response(body: &serde_json::Value) -> Result<MealEstimate, AppError> {
    let text = body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .ok_or_else(|| AppError::MealService("Response has no candidate text".to_string()))?;

    let estimate: MealEstimate = serde_json::from_str(text)
        .map_err(|e| AppError::MealService(format!("Candidate is not a valid estimate: {}", e)))?;

    if !estimate.carbon_kg.is_finite() || estimate.carbon_kg <= 0.0 {
        return Err(AppError::MealService(format!(
            "Implausible estimate: {} kg",
            estimate.carbon_kg
        )));
    }

    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn test_parse_valid_response() {
        let body = candidate(r#"{"carbon_kg": 6.5, "explanation": "Beef burger with fries"}"#);

        let estimate = parse_generation_response(&body).unwrap();

        assert_eq!(estimate.carbon_kg, 6.5);
        assert_eq!(estimate.explanation, "Beef burger with fries");
    }

    #[test]
    fn test_parse_rejects_missing_candidate() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(
            parse_generation_response(&body),
            Err(AppError::MealService(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_json_text() {
        let body = candidate("About three kilograms, I think.");
        assert!(parse_generation_response(&body).is_err());
    }

    #[test]
    fn test_parse_rejects_implausible_values() {
        let body = candidate(r#"{"carbon_kg": -1, "explanation": "negative"}"#);
        assert!(parse_generation_response(&body).is_err());

        let body = candidate(r#"{"carbon_kg": 0, "explanation": "zero"}"#);
        assert!(parse_generation_response(&body).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = build_request_body("lentil soup");

        assert_eq!(body["contents"][0]["parts"][0]["text"], "lentil soup");
        assert_eq!(body["generationConfig"]["temperature"], 0.2);
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["carbon_kg", "explanation"])
        );
    }

    #[tokio::test]
    async fn test_unconfigured_analyzer_falls_back() {
        let analyzer = MealAnalyzer::new(
            crate::config::DEFAULT_GEMINI_API_URL.to_string(),
            "gemini-2.5-flash".to_string(),
            None,
        );

        assert!(!analyzer.is_configured());
        assert_eq!(analyzer.analyze("steak").await, MealEstimate::fallback());
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        // Nothing listens on port 9 (discard) in the test environment.
        let analyzer = MealAnalyzer::new(
            "http://127.0.0.1:9/v1beta".to_string(),
            "gemini-2.5-flash".to_string(),
            Some("test-key".to_string()),
        );

        assert_eq!(analyzer.analyze("tofu stir fry").await, MealEstimate::fallback());
    }
}
