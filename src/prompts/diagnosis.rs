//! Free-text health advice prompt.

use crate::domain::CatInfo;

/// Builds the veterinarian-assistant prompt for `cat`.
pub fn build_diagnosis_prompt(cat: &CatInfo) -> String {
    format!(
        "あなたは経験豊富な獣医師アシスタントです。以下の猫の情報に基づいて、健康アドバイスを提供してください。

{profile}

## 回答形式

以下の項目について、やさしく分かりやすい日本語でアドバイスをお願いします：

1. **総合評価**: {name}ちゃんの現在の健康状態の概要
2. **食事のアドバイス**: 体型、活動量、好みを考慮した食事の提案
3. **体重管理**: 現在の体重と体型に基づくアドバイス
4. **健康上の注意点**: 報告されたお悩みに対する具体的なケアのヒント
5. **生活習慣のヒント**: 活動量を考慮した日常のケアについて
6. **獣医師への相談推奨事項**: 専門家に相談すべき点があれば

**注意**: このアドバイスは一般的な情報提供を目的としており、専門的な獣医学的診断に代わるものではありません。具体的な健康問題については、必ず獣医師にご相談ください。",
        profile = cat_profile_section(cat),
        name = cat.name,
    )
}

/// The `## 猫の情報` block shared by both prompts.
pub(crate) fn cat_profile_section(cat: &CatInfo) -> String {
    format!(
        "## 猫の情報

- **名前**: {name}
- **性別**: {gender}
- **去勢・避妊**: {neutered}
- **年齢**: {age}歳
- **猫種**: {breed}
- **体型**: {body_type}
- **体重**: {weight}kg
- **活動量**: {activity}
- **主食**: {main_food}
- **おやつの頻度**: {treats}
- **好きな食べ物**: {favorite}
- **苦手な食べ物**: {disliked}
- **健康上のお悩み**: {health}",
        name = cat.name,
        gender = cat.gender,
        neutered = cat.neutered_text(),
        age = cat.age,
        breed = cat.breed,
        body_type = cat.body_type,
        weight = cat.weight,
        activity = cat.activity_level,
        main_food = cat.main_food,
        treats = cat.treats,
        favorite = cat.favorite_food,
        disliked = cat.disliked_food_text(),
        health = cat.health_concerns_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_cat;

    #[test]
    fn test_prompt_lists_profile() {
        let prompt = build_diagnosis_prompt(&sample_cat());

        assert!(prompt.starts_with("あなたは経験豊富な獣医師アシスタントです。"));
        assert!(prompt.contains("- **名前**: みーちゃん"));
        assert!(prompt.contains("- **去勢・避妊**: 済み"));
        assert!(prompt.contains("- **年齢**: 3歳"));
        assert!(prompt.contains("- **体重**: 4.2kg"));
        assert!(prompt.contains("1. **総合評価**: みーちゃんちゃんの現在の健康状態の概要"));
        assert!(prompt.contains("**注意**"));
    }

    #[test]
    fn test_prompt_without_concerns() {
        let mut cat = sample_cat();
        cat.health_concerns.has_issues = false;
        cat.neutered = false;

        let prompt = build_diagnosis_prompt(&cat);

        assert!(prompt.contains("- **健康上のお悩み**: 特になし"));
        assert!(prompt.contains("- **去勢・避妊**: 未実施"));
    }
}
