use serde::{Deserialize, Serialize};

/// Content modality a token count refers to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    #[default]
    ModalityUnspecified,
    Text,
    Image,
    Video,
    Audio,
    Document,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModalityTokenCount {
    pub modality: Modality,
    pub token_count: u32,
}

/// Token accounting attached to a response.
///
/// Usage of a multi-turn function-calling exchange is the sum of the usage
/// of every response in it, so the type supports `+`, `+=` and `Iterator::sum`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content_token_count: Option<u32>,
    /// Total number of tokens across all the generated response candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u32>,
    /// Number of tokens present in tool-use prompt(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_prompt_token_count: Option<u32>,
    /// Number of tokens of thoughts for thinking models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<u32>,
    #[serde(default)]
    pub total_token_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens_details: Option<Vec<ModalityTokenCount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_tokens_details: Option<Vec<ModalityTokenCount>>,
}

fn sum_counts(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, y) => y,
    }
}

fn merge_details(
    a: &mut Option<Vec<ModalityTokenCount>>,
    b: Option<Vec<ModalityTokenCount>>,
) {
    if let Some(more) = b {
        a.get_or_insert_with(Vec::new).extend(more);
    }
}

impl std::ops::AddAssign for UsageMetadata {
    fn add_assign(&mut self, other: Self) {
        self.prompt_token_count += other.prompt_token_count;
        self.cached_content_token_count = sum_counts(
            self.cached_content_token_count,
            other.cached_content_token_count,
        );
        self.candidates_token_count =
            sum_counts(self.candidates_token_count, other.candidates_token_count);
        self.tool_use_prompt_token_count = sum_counts(
            self.tool_use_prompt_token_count,
            other.tool_use_prompt_token_count,
        );
        self.thoughts_token_count =
            sum_counts(self.thoughts_token_count, other.thoughts_token_count);
        self.total_token_count += other.total_token_count;
        merge_details(&mut self.prompt_tokens_details, other.prompt_tokens_details);
        merge_details(
            &mut self.candidates_tokens_details,
            other.candidates_tokens_details,
        );
    }
}

impl std::ops::Add for UsageMetadata {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl std::iter::Sum for UsageMetadata {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_sums_across_turns() {
        let first = UsageMetadata {
            prompt_token_count: 10,
            candidates_token_count: Some(4),
            total_token_count: 14,
            ..Default::default()
        };
        let second = UsageMetadata {
            prompt_token_count: 20,
            thoughts_token_count: Some(3),
            total_token_count: 23,
            ..Default::default()
        };

        let total: UsageMetadata = [first, second].into_iter().sum();
        assert_eq!(total.prompt_token_count, 30);
        assert_eq!(total.candidates_token_count, Some(4));
        assert_eq!(total.thoughts_token_count, Some(3));
        assert_eq!(total.total_token_count, 37);
        assert_eq!(total.cached_content_token_count, None);
    }
}
