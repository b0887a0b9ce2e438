use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The canonical list of tracked nutrients. Estimation keys and range
/// validation derive from this list, never from the storage schema, so
/// identity and relationship columns can never leak into an LLM request.
pub const NUTRIENTS: [&str; 9] = [
    "calories",
    "protein",
    "total_fat",
    "saturated_fat",
    "carbohydrates",
    "sugar",
    "fiber",
    "cholesterol",
    "sodium_grams",
];

/// The `_min`/`_max` key pairs the estimation collaborator must return,
/// in canonical order.
pub fn estimation_keys() -> Vec<String> {
    let mut keys = Vec::with_capacity(NUTRIENTS.len() * 2);
    for nutrient in NUTRIENTS {
        keys.push(format!("{nutrient}_min"));
        keys.push(format!("{nutrient}_max"));
    }
    keys
}

/// Per-food nutrient ranges. Values are unordered `(min, max)` pairs in
/// grams (calories included, per source convention), stored as flat
/// columns on the `foods` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NutrientProfile {
    pub calories_min: f64,
    pub calories_max: f64,
    pub protein_min: f64,
    pub protein_max: f64,
    pub total_fat_min: f64,
    pub total_fat_max: f64,
    pub saturated_fat_min: f64,
    pub saturated_fat_max: f64,
    pub carbohydrates_min: f64,
    pub carbohydrates_max: f64,
    pub sugar_min: f64,
    pub sugar_max: f64,
    pub fiber_min: f64,
    pub fiber_max: f64,
    pub cholesterol_min: f64,
    pub cholesterol_max: f64,
    pub sodium_grams_min: f64,
    pub sodium_grams_max: f64,
}

impl NutrientProfile {
    /// `(nutrient, min, max)` triples in canonical order.
    pub fn ranges(&self) -> [(&'static str, f64, f64); 9] {
        [
            ("calories", self.calories_min, self.calories_max),
            ("protein", self.protein_min, self.protein_max),
            ("total_fat", self.total_fat_min, self.total_fat_max),
            ("saturated_fat", self.saturated_fat_min, self.saturated_fat_max),
            ("carbohydrates", self.carbohydrates_min, self.carbohydrates_max),
            ("sugar", self.sugar_min, self.sugar_max),
            ("fiber", self.fiber_min, self.fiber_max),
            ("cholesterol", self.cholesterol_min, self.cholesterol_max),
            ("sodium_grams", self.sodium_grams_min, self.sodium_grams_max),
        ]
    }

    pub fn add(&mut self, other: &NutrientProfile) {
        self.calories_min += other.calories_min;
        self.calories_max += other.calories_max;
        self.protein_min += other.protein_min;
        self.protein_max += other.protein_max;
        self.total_fat_min += other.total_fat_min;
        self.total_fat_max += other.total_fat_max;
        self.saturated_fat_min += other.saturated_fat_min;
        self.saturated_fat_max += other.saturated_fat_max;
        self.carbohydrates_min += other.carbohydrates_min;
        self.carbohydrates_max += other.carbohydrates_max;
        self.sugar_min += other.sugar_min;
        self.sugar_max += other.sugar_max;
        self.fiber_min += other.fiber_min;
        self.fiber_max += other.fiber_max;
        self.cholesterol_min += other.cholesterol_min;
        self.cholesterol_max += other.cholesterol_max;
        self.sodium_grams_min += other.sodium_grams_min;
        self.sodium_grams_max += other.sodium_grams_max;
    }

    /// Element-wise sum over a set of profiles. Meal totals are this fold
    /// computed at read time over the current member set, so membership
    /// changes are reflected on the next read with no staleness window.
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a NutrientProfile>) -> NutrientProfile {
        let mut total = NutrientProfile::default();
        for item in items {
            total.add(item);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimation_keys_cover_every_nutrient_pair() {
        let keys = estimation_keys();
        assert_eq!(keys.len(), 18);
        for nutrient in NUTRIENTS {
            assert!(keys.contains(&format!("{nutrient}_min")), "{nutrient}_min");
            assert!(keys.contains(&format!("{nutrient}_max")), "{nutrient}_max");
        }
        // No identity or relationship fields in the request key list.
        for reserved in ["id", "name", "meal", "meal_name"] {
            assert!(!keys.iter().any(|k| k == reserved), "{reserved} leaked");
        }
    }

    #[test]
    fn sum_is_element_wise_over_members() {
        let a = NutrientProfile {
            calories_min: 280.0,
            calories_max: 340.0,
            protein_min: 45.0,
            protein_max: 55.0,
            ..Default::default()
        };
        let b = NutrientProfile {
            calories_min: 100.0,
            calories_max: 120.0,
            sugar_min: 10.0,
            sugar_max: 12.0,
            ..Default::default()
        };

        let total = NutrientProfile::sum([&a, &b]);
        assert_eq!(total.calories_min, 380.0);
        assert_eq!(total.calories_max, 460.0);
        assert_eq!(total.protein_min, 45.0);
        assert_eq!(total.protein_max, 55.0);
        assert_eq!(total.sugar_min, 10.0);
        assert_eq!(total.sugar_max, 12.0);
        assert_eq!(total.fiber_min, 0.0);
    }

    #[test]
    fn adding_a_member_raises_each_total_by_its_values() {
        let base = NutrientProfile {
            calories_min: 280.0,
            calories_max: 340.0,
            ..Default::default()
        };
        let before = NutrientProfile::sum([&base]);
        let after = NutrientProfile::sum([&base, &base]);
        assert_eq!(after.calories_min, before.calories_min + 280.0);
        assert_eq!(after.calories_max, before.calories_max + 340.0);
    }

    #[test]
    fn sum_of_empty_set_is_zero() {
        let total = NutrientProfile::sum(std::iter::empty());
        assert_eq!(total, NutrientProfile::default());
    }
}
