use sqlx::{Postgres, Transaction};
use time::{macros::format_description, Date};
use uuid::Uuid;

use super::dto::MealTotalsResponse;
use super::repo::{self, Meal, MealType};
use crate::errors::ApiError;
use crate::nutrition::NutrientProfile;
use crate::state::AppState;

/// Strict YYYY-MM-DD parsing; anything else is a 400.
pub fn parse_date(raw: &str) -> Result<Date, ApiError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), format).map_err(|_| {
        ApiError::Validation("Invalid date format. Please use YYYY-MM-DD format.".into())
    })
}

/// Space-joined accumulation; the first entry gets no leading separator.
pub fn append_description(existing: &str, addition: &str) -> String {
    let addition = addition.trim();
    if addition.is_empty() {
        return existing.to_string();
    }
    if existing.is_empty() {
        addition.to_string()
    } else {
        format!("{existing} {addition}")
    }
}

/// The attach workflow, run inside the caller's logging transaction:
/// find-or-create the slot bucket, add the food (set semantics), apply
/// the optional rename, and accumulate the food's provenance text.
pub async fn attach_food_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    food_id: Uuid,
    provenance: &str,
    meal_type: MealType,
    date: Date,
    name: Option<&str>,
) -> anyhow::Result<Meal> {
    let meal = repo::find_or_create_tx(tx, user_id, date, meal_type).await?;
    let inserted = repo::attach_item_tx(tx, meal.id, food_id).await?;
    // Re-attaching an existing member keeps the accumulated description
    // as-is; only a genuinely new item contributes its provenance.
    let description = if inserted {
        append_description(&meal.description, provenance)
    } else {
        meal.description.clone()
    };
    let meal = repo::annotate_tx(tx, meal.id, name, &description).await?;
    Ok(meal)
}

/// Pure fold over the meal's current member set, computed on read.
pub async fn totals_for_meal(
    state: &AppState,
    user_id: Uuid,
    meal_id: Uuid,
) -> Result<MealTotalsResponse, ApiError> {
    let meal = repo::get_for_user(&state.db, user_id, meal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meal".into()))?;

    let foods = repo::member_foods(&state.db, meal.id).await?;
    let totals = NutrientProfile::sum(foods.iter().map(|f| &f.nutrition));

    Ok(MealTotalsResponse {
        meal_id: meal.id,
        name: meal.name,
        meal_type: meal.meal_type,
        date: meal.date,
        item_count: foods.len(),
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() {
        let date = parse_date("2024-05-12").unwrap();
        assert_eq!(date.to_string(), "2024-05-12");
    }

    #[test]
    fn parse_date_rejects_out_of_range_components() {
        assert!(matches!(
            parse_date("2024-13-40"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(matches!(
            parse_date("05/12/2024"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(parse_date(""), Err(ApiError::Validation(_))));
    }

    #[test]
    fn append_description_has_no_leading_separator() {
        assert_eq!(append_description("", "chicken and rice"), "chicken and rice");
    }

    #[test]
    fn append_description_space_joins_subsequent_entries() {
        let first = append_description("", "chicken and rice");
        let second = append_description(&first, "an apple");
        assert_eq!(second, "chicken and rice an apple");
    }

    #[test]
    fn append_description_ignores_blank_additions() {
        assert_eq!(append_description("chicken", "  "), "chicken");
    }
}
