//! Domain types: the cat profile and what the service answers with.

pub mod cat;
pub mod recommendation;

pub use cat::{
    ActivityLevel, BodyType, CatInfo, DislikedFood, DislikedFoodDetail, DislikedFoodStatus,
    FavoriteFood, Gender, HealthConcern, HealthConcerns, InvalidCatInfo, MainFood,
    TreatsFrequency,
};
pub use recommendation::{
    DiagnosisResponse, RecommendationResponse, RecommendationResult, RecommendedProduct,
    MAX_RECOMMENDATIONS,
};
