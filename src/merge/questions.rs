//! 审稿问题合并

use crate::merge::similarity::dedup_near_duplicates;
use crate::merge::MergeSettings;
use crate::models::QuestionSet;

/// 带来源位置的子问题
struct Candidate<'a> {
    segment: usize,
    position: usize,
    text: &'a str,
}

/// 合并所有分段的问题集合
///
/// - 主问题：按分段顺序取第一个；都没有时取第一个非空子问题
/// - 子问题：按分段顺序拼接、近似去重，超过上限时优先保留靠前分段、同一分段内更长的问题
/// - 已回应问题：按分段顺序拼接、近似去重
///
/// 没有任何内容时返回 `None`
pub fn merge_questions(sets: &[QuestionSet], settings: &MergeSettings) -> Option<QuestionSet> {
    if let [only] = sets {
        return (!only.is_empty()).then(|| only.clone());
    }

    let candidates: Vec<Candidate<'_>> = sets
        .iter()
        .enumerate()
        .flat_map(|(segment, set)| {
            set.sub_questions
                .iter()
                .filter(|q| !q.trim().is_empty())
                .map(move |q| (segment, q.trim()))
        })
        .enumerate()
        .map(|(position, (segment, text))| Candidate {
            segment,
            position,
            text,
        })
        .collect();

    let main_question = sets
        .iter()
        .filter_map(|s| s.main_question.as_deref())
        .map(str::trim)
        .find(|q| !q.is_empty())
        .or_else(|| candidates.first().map(|c| c.text))
        .map(String::from);

    let unique = dedup_near_duplicates(candidates, settings.similarity_threshold, |c| c.text);
    let sub_questions = cap_questions(unique, settings.max_sub_questions);

    let narratives: Vec<&str> = sets
        .iter()
        .filter_map(|s| s.addressed_questions.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();
    let narratives = dedup_near_duplicates(narratives, settings.similarity_threshold, |n| *n);
    let addressed_questions =
        (!narratives.is_empty()).then(|| narratives.join(&settings.field_delimiter));

    let merged = QuestionSet {
        main_question,
        sub_questions,
        addressed_questions,
    };
    (!merged.is_empty()).then_some(merged)
}

fn cap_questions(mut candidates: Vec<Candidate<'_>>, max: usize) -> Vec<String> {
    if candidates.len() > max {
        candidates.sort_by(|a, b| {
            a.segment
                .cmp(&b.segment)
                .then_with(|| b.text.chars().count().cmp(&a.text.chars().count()))
                .then_with(|| a.position.cmp(&b.position))
        });
        candidates.truncate(max);
        candidates.sort_by_key(|c| c.position);
    }
    candidates.into_iter().map(|c| c.text.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(main: Option<&str>, subs: &[&str], addressed: Option<&str>) -> QuestionSet {
        QuestionSet {
            main_question: main.map(String::from),
            sub_questions: subs.iter().map(|s| s.to_string()).collect(),
            addressed_questions: addressed.map(String::from),
        }
    }

    #[test]
    fn test_empty_input_is_absent() {
        assert!(merge_questions(&[], &MergeSettings::default()).is_none());
        let empty = vec![QuestionSet::default(), QuestionSet::default()];
        assert!(merge_questions(&empty, &MergeSettings::default()).is_none());
    }

    #[test]
    fn test_single_set_is_unchanged() {
        let only = set(
            Some("Does it generalize?"),
            &["Q1?", "q1?", "Q2?"],
            Some("The authors discuss Q2."),
        );
        let settings = MergeSettings {
            max_sub_questions: 1,
            ..Default::default()
        };
        assert_eq!(merge_questions(std::slice::from_ref(&only), &settings), Some(only));
    }

    #[test]
    fn test_main_question_is_first_present() {
        let merged = merge_questions(
            &[
                set(None, &["Why this dataset?"], None),
                set(Some("Is the effect causal?"), &[], None),
                set(Some("Is the effect real?"), &[], None),
            ],
            &MergeSettings::default(),
        )
        .unwrap();
        assert_eq!(merged.main_question.as_deref(), Some("Is the effect causal?"));
    }

    #[test]
    fn test_main_question_falls_back_to_first_sub_question() {
        let merged = merge_questions(
            &[
                set(None, &[], None),
                set(None, &["  ", "Why this dataset?", "How were labels collected?"], None),
            ],
            &MergeSettings::default(),
        )
        .unwrap();
        assert_eq!(merged.main_question.as_deref(), Some("Why this dataset?"));
    }

    #[test]
    fn test_near_duplicate_sub_questions_across_segments() {
        let merged = merge_questions(
            &[
                set(None, &["What is the sample size of the study?"], None),
                set(
                    None,
                    &[
                        "What is the sample size of this study?",
                        "How was the model evaluated?",
                    ],
                    None,
                ),
            ],
            &MergeSettings::default(),
        )
        .unwrap();
        assert_eq!(
            merged.sub_questions,
            vec![
                "What is the sample size of the study?".to_string(),
                "How was the model evaluated?".to_string(),
            ]
        );
    }

    #[test]
    fn test_cap_prefers_earlier_segments_then_longer_questions() {
        let settings = MergeSettings {
            max_sub_questions: 3,
            ..Default::default()
        };
        let merged = merge_questions(
            &[
                set(None, &["Short one?", "A considerably longer and more specific question?"], None),
                set(None, &["Tiny?", "Another rather detailed question about baselines?"], None),
                set(None, &["Late question from the final segment?"], None),
            ],
            &settings,
        )
        .unwrap();
        assert_eq!(
            merged.sub_questions,
            vec![
                "Short one?".to_string(),
                "A considerably longer and more specific question?".to_string(),
                "Another rather detailed question about baselines?".to_string(),
            ]
        );
    }

    #[test]
    fn test_addressed_narratives_are_joined_and_deduplicated() {
        let merged = merge_questions(
            &[
                set(Some("Main?"), &[], Some("Section 4 answers the robustness question.")),
                set(None, &[], Some("Section 4 answers the robustness questions.")),
                set(None, &[], Some("The appendix covers hyperparameters.")),
            ],
            &MergeSettings::default(),
        )
        .unwrap();
        assert_eq!(
            merged.addressed_questions.as_deref(),
            Some("Section 4 answers the robustness question.\n\nThe appendix covers hyperparameters.")
        );
    }

    #[test]
    fn test_similarity_threshold_is_configurable() {
        let sets = [
            set(None, &["What is the sample size of the study?"], None),
            set(None, &["What is the sample size of this study?"], None),
        ];
        let strict = MergeSettings {
            similarity_threshold: 0.99,
            ..Default::default()
        };
        let loose = MergeSettings {
            similarity_threshold: 0.8,
            ..Default::default()
        };

        let kept_apart = merge_questions(&sets, &strict).unwrap();
        assert_eq!(kept_apart.sub_questions.len(), 2);

        let merged = merge_questions(&sets, &loose).unwrap();
        assert_eq!(
            merged.sub_questions,
            vec!["What is the sample size of the study?".to_string()]
        );
    }
}
