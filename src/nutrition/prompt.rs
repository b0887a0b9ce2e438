//! Pure construction of the estimation request. No I/O happens here; the
//! caller hands the pair to an `EstimationClient`.

use super::profile::estimation_keys;

/// Build the `(system_prompt, user_message)` pair for a meal description.
pub fn build_messages(description: &str) -> (String, String) {
    (system_prompt(), description.trim().to_string())
}

/// The role statement, the exact JSON reply shape, and the symmetric
/// widening instruction: min = 90% and max = 110% of the point estimate,
/// so the midpoint stays put while the range absorbs estimation error.
pub fn system_prompt() -> String {
    format!(
        "You are a nutritionist who is helping a client track their food intake. \
         You are an expert at looking at a photo or description of a meal and \
         determining the nutritional content. All values are in grams. \
         Respond in JSON format: {shape}. \
         For each nutrient, settle on your best single estimate first, then report \
         the min as 90% of that estimate and the max as 110% of it, keeping the \
         midpoint unchanged.",
        shape = reply_shape()
    )
}

fn reply_shape() -> String {
    let mut fields = vec![r#""meal_name": "name of the meal""#.to_string()];
    fields.extend(
        estimation_keys()
            .iter()
            .map(|key| format!(r#""{key}": 0.0"#)),
    );
    format!("{{{}}}", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::profile::estimation_keys;

    #[test]
    fn system_prompt_declares_every_required_key() {
        let prompt = system_prompt();
        assert!(prompt.contains(r#""meal_name""#));
        for key in estimation_keys() {
            assert!(prompt.contains(&format!(r#""{key}""#)), "missing {key}");
        }
    }

    #[test]
    fn system_prompt_carries_the_widening_instruction() {
        let prompt = system_prompt();
        assert!(prompt.contains("90%"));
        assert!(prompt.contains("110%"));
        assert!(prompt.contains("midpoint unchanged"));
    }

    #[test]
    fn user_message_is_the_trimmed_description() {
        let (_, user) = build_messages("  grilled chicken breast, 200g \n");
        assert_eq!(user, "grilled chicken breast, 200g");
    }

    #[test]
    fn reply_shape_never_mentions_identity_fields() {
        let shape = reply_shape();
        assert!(!shape.contains(r#""id""#));
        assert!(!shape.contains(r#""meal_items""#));
    }
}
