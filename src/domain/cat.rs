//! Cat profile submitted by the front-end.
//!
//! Enumerations serialize with the Japanese labels the form uses, so a
//! request body can be deserialized as-is and the same labels end up in the
//! prompt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a label enum: serde names, `as_str`, and `Display` all use the
/// same label.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Label shown to users and sent to the model.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum!(
    Gender {
        Male => "オス",
        Female => "メス",
    }
);

label_enum!(
    BodyType {
        TooThin => "痩せすぎ",
        SlightlyThin => "ちょい痩せ",
        Normal => "普通",
        SlightlyChubby => "ちょいおデブ",
        Chubby => "おデブちゃん",
    }
);

label_enum!(
    ActivityLevel {
        AlwaysSleeping => "ずっと寝てる",
        Normal => "普通",
        VeryActive => "よく飛ぶ",
    }
);

label_enum!(
    MainFood {
        Dry => "ドライフード",
        Wet => "ウェットフード",
        Other => "その他",
    }
);

label_enum!(
    /// How often treats are given.
    TreatsFrequency {
        Sometimes => "ときどき",
        Daily => "毎日",
        Never => "全くあげない",
    }
);

label_enum!(
    FavoriteFood {
        Chicken => "チキン",
        Beef => "ビーフ",
        Fish => "お魚",
        Anything => "なんでも好き",
    }
);

label_enum!(
    DislikedFoodStatus {
        Nothing => "ない",
        Unsure => "わからない",
        Present => "ある",
    }
);

label_enum!(
    DislikedFoodDetail {
        Chicken => "鶏肉",
        Salmon => "サーモン",
        Beef => "牛肉",
        Tuna => "マグロ",
        Bonito => "カツオ",
        Cod => "たら",
    }
);

label_enum!(
    HealthConcern {
        Overeating => "食べ過ぎ",
        SmallAppetite => "少食",
        PickyEating => "偏食・食べムラ",
        FoodAllergy => "食物アレルギー",
        OtherConcern => "その他のお悩み",
        Obesity => "肥満",
        Regurgitation => "吐き戻し",
        LowerUrinaryTract => "下部尿路疾患",
        Underweight => "痩身",
        Teeth => "歯",
        Kidney => "腎臓疾患",
        Vomiting => "嘔吐",
        Constipation => "便秘",
        TearStains => "涙やけ",
        Liver => "肝臓疾患",
        Diarrhea => "下痢",
        Joints => "関節",
        Diabetes => "糖尿",
        Skin => "皮膚",
    }
);

/// Meats or fish the cat refuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DislikedFood {
    pub status: DislikedFoodStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<DislikedFoodDetail>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthConcerns {
    pub has_issues: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concerns: Option<Vec<HealthConcern>>,
}

/// Profile of one cat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatInfo {
    pub name: String,
    pub gender: Gender,
    pub neutered: bool,
    /// Age in years.
    pub age: f64,
    pub breed: String,
    pub body_type: BodyType,
    /// Weight in kilograms.
    pub weight: f64,
    pub activity_level: ActivityLevel,
    pub main_food: MainFood,
    pub treats: TreatsFrequency,
    pub favorite_food: FavoriteFood,
    pub disliked_food: DislikedFood,
    pub health_concerns: HealthConcerns,
}

/// Value errors found in a well-formed [`CatInfo`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("; "))]
pub struct InvalidCatInfo {
    pub messages: Vec<String>,
}

impl CatInfo {
    /// Checks the values serde cannot: blank name, negative or non-finite
    /// age, and non-positive weight. All problems are reported at once.
    pub fn validate(&self) -> Result<(), InvalidCatInfo> {
        let mut messages = Vec::new();

        if self.name.trim().is_empty() {
            messages.push("name must not be empty".to_string());
        }
        if !self.age.is_finite() || self.age < 0.0 {
            messages.push(format!("age must be zero or greater, got {}", self.age));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            messages.push(format!("weight must be greater than zero, got {}", self.weight));
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(InvalidCatInfo { messages })
        }
    }

    /// Health concerns as listed for the model, `特になし` when none apply.
    pub fn health_concerns_text(&self) -> String {
        match &self.health_concerns.concerns {
            Some(concerns) if self.health_concerns.has_issues && !concerns.is_empty() => {
                join_labels(concerns.iter().map(HealthConcern::as_str))
            }
            _ => "特になし".to_string(),
        }
    }

    /// Disliked foods, e.g. `ある（鶏肉、マグロ）`, or the bare status.
    pub fn disliked_food_text(&self) -> String {
        match (&self.disliked_food.status, &self.disliked_food.details) {
            (DislikedFoodStatus::Present, Some(details)) if !details.is_empty() => format!(
                "{}（{}）",
                DislikedFoodStatus::Present,
                join_labels(details.iter().map(DislikedFoodDetail::as_str))
            ),
            (status, _) => status.to_string(),
        }
    }

    /// `済み` or `未実施`.
    pub fn neutered_text(&self) -> &'static str {
        if self.neutered {
            "済み"
        } else {
            "未実施"
        }
    }
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join("、")
}
