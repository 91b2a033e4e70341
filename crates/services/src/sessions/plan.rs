use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use quiz_core::model::{Category, Question};

/// How a pass picks its questions from the pool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Equal share per category, shortfall backfilled from the rest of the pool.
    #[default]
    Balanced,
    /// Only questions from one category.
    Targeted(Category),
    /// Uniform draw from the whole pool, ignoring categories.
    Uniform,
}

/// Selection result for a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    pub questions: Vec<Question>,
    pub per_category: BTreeMap<Category, usize>,
    /// Questions drawn after every category had its equal share.
    pub backfilled: usize,
}

impl SamplePlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Draws a randomized question set from a pool.
///
/// Sampling is without replacement, so a plan never holds the same question
/// twice, and a `count` above what is eligible is clamped rather than rejected.
pub struct QuestionSampler<'a> {
    pool: &'a [Question],
    shuffle_options: bool,
}

impl<'a> QuestionSampler<'a> {
    #[must_use]
    pub fn new(pool: &'a [Question]) -> Self {
        Self {
            pool,
            shuffle_options: true,
        }
    }

    /// Enable or disable per-question option shuffling.
    #[must_use]
    pub fn with_shuffle_options(mut self, shuffle: bool) -> Self {
        self.shuffle_options = shuffle;
        self
    }

    pub fn build<R: Rng + ?Sized>(self, count: usize, mode: &SampleMode, rng: &mut R) -> SamplePlan {
        let (picked, backfilled) = match mode {
            SampleMode::Balanced => self.pick_balanced(count, rng),
            SampleMode::Targeted(category) => {
                let eligible = self
                    .pool
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| q.category() == category)
                    .map(|(i, _)| i)
                    .collect();
                (draw(eligible, count, rng), 0)
            }
            SampleMode::Uniform => (draw((0..self.pool.len()).collect(), count, rng), 0),
        };

        let mut per_category = BTreeMap::new();
        let questions: Vec<Question> = picked
            .into_iter()
            .map(|i| {
                let question = &self.pool[i];
                *per_category.entry(question.category().clone()).or_insert(0) += 1;
                if self.shuffle_options {
                    question.with_shuffled_options(rng)
                } else {
                    question.clone()
                }
            })
            .collect();

        SamplePlan {
            questions,
            per_category,
            backfilled,
        }
    }

    /// Take `count / k` from each of the `k` non-empty categories, then fill
    /// from whatever was not picked. Returns pool indices and the fill size.
    fn pick_balanced<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> (Vec<usize>, usize) {
        let count = count.min(self.pool.len());
        if count == 0 {
            return (Vec::new(), 0);
        }

        let mut groups: BTreeMap<&Category, Vec<usize>> = BTreeMap::new();
        for (i, question) in self.pool.iter().enumerate() {
            groups.entry(question.category()).or_default().push(i);
        }
        let share = count / groups.len();

        let mut taken = vec![false; self.pool.len()];
        let mut selected = Vec::with_capacity(count);
        for indices in groups.values_mut() {
            indices.shuffle(rng);
            for &i in indices.iter().take(share) {
                taken[i] = true;
                selected.push(i);
            }
        }
        let quota = selected.len();

        let mut rest: Vec<usize> = (0..self.pool.len()).filter(|i| !taken[*i]).collect();
        rest.shuffle(rng);
        let missing = count - quota;
        selected.extend(rest.into_iter().take(missing));

        selected.shuffle(rng);
        let backfilled = selected.len() - quota;
        (selected, backfilled)
    }
}

fn draw<R: Rng + ?Sized>(mut indices: Vec<usize>, count: usize, rng: &mut R) -> Vec<usize> {
    indices.shuffle(rng);
    indices.truncate(count);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{OptionLabel, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn build_question(id: u64, category: &str) -> Question {
        let a: OptionLabel = "a".parse().unwrap();
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            Category::new(category),
            vec!["one".into(), "two".into(), "three".into()],
            [a],
            "",
        )
        .unwrap()
    }

    /// `sizes[i]` questions in the i-th known category.
    fn build_pool(sizes: [usize; 6]) -> Vec<Question> {
        let mut id = 0;
        let mut pool = Vec::new();
        for (category, size) in Category::KNOWN.iter().zip(sizes) {
            for _ in 0..size {
                id += 1;
                pool.push(build_question(id, category));
            }
        }
        pool
    }

    fn ids(plan: &SamplePlan) -> HashSet<QuestionId> {
        plan.questions.iter().map(Question::id).collect()
    }

    #[test]
    fn balanced_takes_equal_share_per_category() {
        let pool = build_pool([10; 6]);
        let mut rng = StdRng::seed_from_u64(1);
        let plan = QuestionSampler::new(&pool).build(30, &SampleMode::Balanced, &mut rng);

        assert_eq!(plan.total(), 30);
        assert_eq!(ids(&plan).len(), 30);
        assert_eq!(plan.backfilled, 0);
        for category in Category::KNOWN {
            assert_eq!(plan.per_category[&Category::new(category)], 5);
        }
    }

    #[test]
    fn balanced_backfills_small_categories() {
        let pool = build_pool([2, 1, 10, 10, 10, 10]);
        let mut rng = StdRng::seed_from_u64(2);
        let plan = QuestionSampler::new(&pool).build(30, &SampleMode::Balanced, &mut rng);

        assert_eq!(plan.total(), 30);
        assert_eq!(ids(&plan).len(), 30);
        assert_eq!(plan.backfilled, 7);
        assert_eq!(plan.per_category[&Category::new("basic")], 2);
        assert_eq!(plan.per_category[&Category::new("clinical")], 1);
        for category in ["equipment", "pharmacology", "procedure", "management"] {
            assert!(plan.per_category[&Category::new(category)] >= 5);
        }
    }

    #[test]
    fn count_is_clamped_to_pool() {
        let pool = build_pool([1, 1, 1, 1, 0, 0]);
        let mut rng = StdRng::seed_from_u64(3);
        let plan = QuestionSampler::new(&pool).build(30, &SampleMode::Balanced, &mut rng);
        assert_eq!(plan.total(), 4);
        assert_eq!(ids(&plan).len(), 4);

        let uniform = QuestionSampler::new(&pool).build(50, &SampleMode::Uniform, &mut rng);
        assert_eq!(uniform.total(), 4);
    }

    #[test]
    fn sample_never_duplicates_for_any_count() {
        let pool = build_pool([3, 5, 0, 7, 2, 4]);
        let mut rng = StdRng::seed_from_u64(4);
        for count in 0..=pool.len() {
            for mode in [SampleMode::Balanced, SampleMode::Uniform] {
                let plan = QuestionSampler::new(&pool).build(count, &mode, &mut rng);
                assert_eq!(plan.total(), count);
                assert_eq!(ids(&plan).len(), count);
            }
        }
    }

    #[test]
    fn targeted_draws_from_one_category_only() {
        let pool = build_pool([4, 4, 4, 4, 4, 4]);
        let mut rng = StdRng::seed_from_u64(5);
        let target = Category::new("pharmacology");
        let plan = QuestionSampler::new(&pool).build(
            10,
            &SampleMode::Targeted(target.clone()),
            &mut rng,
        );

        assert_eq!(plan.total(), 4);
        assert!(plan.questions.iter().all(|q| q.category() == &target));

        let missing = QuestionSampler::new(&pool).build(
            10,
            &SampleMode::Targeted(Category::new("radiology")),
            &mut rng,
        );
        assert!(missing.is_empty());
    }

    #[test]
    fn options_are_shuffled_unless_disabled() {
        let pool = build_pool([0, 0, 0, 0, 0, 40]);
        let mut rng = StdRng::seed_from_u64(6);

        let kept = QuestionSampler::new(&pool)
            .with_shuffle_options(false)
            .build(40, &SampleMode::Uniform, &mut rng);
        assert!(kept.questions.iter().all(|q| q.options()[0].text() == "one"));

        let shuffled = QuestionSampler::new(&pool).build(40, &SampleMode::Uniform, &mut rng);
        assert!(shuffled.questions.iter().any(|q| q.options()[0].text() != "one"));
        assert!(
            shuffled
                .questions
                .iter()
                .all(|q| q.correct_texts() == vec!["one"])
        );
    }
}
