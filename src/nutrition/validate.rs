//! Strict validation of the estimation collaborator's reply. The raw text
//! is untyped; anything that parses and checks out becomes a typed
//! `Estimation`, everything else is a terminal error for the request —
//! missing keys are never defaulted to zero.

use serde_json::Value;

use super::profile::NutrientProfile;
use crate::errors::ApiError;

/// A validated estimation, ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimation {
    pub name: String,
    pub profile: NutrientProfile,
}

/// Parse and validate the raw reply. A caller-supplied `name_override`
/// takes precedence over the model's own `meal_name`.
pub fn parse_estimation(
    raw: &str,
    name_override: Option<&str>,
) -> Result<Estimation, ApiError> {
    let text = strip_json_fences(raw);
    let body: Value = serde_json::from_str(text)
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    let map = body
        .as_object()
        .ok_or_else(|| ApiError::MalformedResponse("expected a JSON object".into()))?;

    let mut missing: Vec<String> = Vec::new();

    let name = match name_override.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => match map.get("meal_name").and_then(Value::as_str).map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                missing.push("meal_name".to_string());
                String::new()
            }
        },
    };

    let mut take = |key: &str| -> f64 {
        match map.get(key).and_then(Value::as_f64) {
            Some(v) => v,
            None => {
                missing.push(key.to_string());
                0.0
            }
        }
    };

    let profile = NutrientProfile {
        calories_min: take("calories_min"),
        calories_max: take("calories_max"),
        protein_min: take("protein_min"),
        protein_max: take("protein_max"),
        total_fat_min: take("total_fat_min"),
        total_fat_max: take("total_fat_max"),
        saturated_fat_min: take("saturated_fat_min"),
        saturated_fat_max: take("saturated_fat_max"),
        carbohydrates_min: take("carbohydrates_min"),
        carbohydrates_max: take("carbohydrates_max"),
        sugar_min: take("sugar_min"),
        sugar_max: take("sugar_max"),
        fiber_min: take("fiber_min"),
        fiber_max: take("fiber_max"),
        cholesterol_min: take("cholesterol_min"),
        cholesterol_max: take("cholesterol_max"),
        sodium_grams_min: take("sodium_grams_min"),
        sodium_grams_max: take("sodium_grams_max"),
    };

    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let mut invalid: Vec<String> = Vec::new();
    for (nutrient, min, max) in profile.ranges() {
        if min < 0.0 || max < 0.0 {
            invalid.push(format!("{nutrient}: negative value"));
        } else if min > max {
            invalid.push(format!("{nutrient}: min exceeds max"));
        }
    }
    if !invalid.is_empty() {
        return Err(ApiError::Validation(invalid.join("; ")));
    }

    Ok(Estimation { name, profile })
}

/// Strips ```json ... ``` or ``` ... ``` code fences; models occasionally
/// wrap the payload despite the JSON-object response format.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::profile::estimation_keys;

    fn full_reply(name: &str) -> String {
        let mut body = serde_json::json!({ "meal_name": name });
        for key in estimation_keys() {
            // Distinct min/max so ordering mistakes would show up.
            body[&key] = if key.ends_with("_min") {
                serde_json::json!(10.0)
            } else {
                serde_json::json!(12.0)
            };
        }
        body.to_string()
    }

    #[test]
    fn accepts_a_complete_reply() {
        let est = parse_estimation(&full_reply("Grilled Chicken"), None).unwrap();
        assert_eq!(est.name, "Grilled Chicken");
        assert_eq!(est.profile.calories_min, 10.0);
        assert_eq!(est.profile.calories_max, 12.0);
        assert_eq!(est.profile.sodium_grams_max, 12.0);
    }

    #[test]
    fn caller_override_beats_model_name() {
        let est =
            parse_estimation(&full_reply("Model Name"), Some("Client Name")).unwrap();
        assert_eq!(est.name, "Client Name");
    }

    #[test]
    fn blank_override_falls_back_to_model_name() {
        let est = parse_estimation(&full_reply("Model Name"), Some("  ")).unwrap();
        assert_eq!(est.name, "Model Name");
    }

    #[test]
    fn missing_name_everywhere_is_a_validation_failure() {
        let mut body: serde_json::Value =
            serde_json::from_str(&full_reply("x")).unwrap();
        body.as_object_mut().unwrap().remove("meal_name");
        let err = parse_estimation(&body.to_string(), None).unwrap_err();
        match err {
            ApiError::MissingFields(fields) => {
                assert_eq!(fields, vec!["meal_name".to_string()]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn absent_nutrient_keys_are_a_hard_failure_listing_each_field() {
        let mut body: serde_json::Value =
            serde_json::from_str(&full_reply("x")).unwrap();
        let map = body.as_object_mut().unwrap();
        map.remove("protein_min");
        map.remove("fiber_max");
        let err = parse_estimation(&body.to_string(), None).unwrap_err();
        match err {
            ApiError::MissingFields(fields) => {
                assert!(fields.contains(&"protein_min".to_string()));
                assert!(fields.contains(&"fiber_max".to_string()));
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_value_counts_as_missing() {
        let mut body: serde_json::Value =
            serde_json::from_str(&full_reply("x")).unwrap();
        body["sugar_min"] = serde_json::json!("lots");
        let err = parse_estimation(&body.to_string(), None).unwrap_err();
        match err {
            ApiError::MissingFields(fields) => {
                assert_eq!(fields, vec!["sugar_min".to_string()]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn non_json_reply_is_malformed() {
        let err = parse_estimation("I'd estimate about 300 calories.", None).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn json_array_reply_is_malformed() {
        let err = parse_estimation("[1, 2, 3]", None).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn negative_values_are_rejected() {
        let mut body: serde_json::Value =
            serde_json::from_str(&full_reply("x")).unwrap();
        body["fiber_min"] = serde_json::json!(-1.0);
        let err = parse_estimation(&body.to_string(), None).unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("fiber: negative value")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut body: serde_json::Value =
            serde_json::from_str(&full_reply("x")).unwrap();
        body["calories_min"] = serde_json::json!(400.0);
        body["calories_max"] = serde_json::json!(300.0);
        let err = parse_estimation(&body.to_string(), None).unwrap_err();
        match err {
            ApiError::Validation(msg) => {
                assert!(msg.contains("calories: min exceeds max"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn fenced_reply_still_parses() {
        let fenced = format!("```json\n{}\n```", full_reply("Fenced"));
        let est = parse_estimation(&fenced, None).unwrap();
        assert_eq!(est.name, "Fenced");
    }

    #[test]
    fn strip_json_fences_leaves_bare_json_alone() {
        assert_eq!(strip_json_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
