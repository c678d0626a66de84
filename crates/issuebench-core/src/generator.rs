//! Deterministic issue generation
//!
//! [`IssueGenerator`] owns its own seeded ChaCha stream, so two generators
//! built from the same seed and rule keys produce the same issues (apart from
//! ids, which come from UUID v4, and the creation base time, which is the wall
//! clock unless overridden).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Issue, IssueFlow, IssueLocation, QuickFix, Severity};

/// Seed used by the benchmark and crash scenarios
pub const DEFAULT_SEED: u64 = 42;

/// Rule keys used by the benchmark and crash scenarios
pub const DEFAULT_RULE_KEYS: [&str; 6] = [
    "java:S100",
    "java:S101",
    "java:S1854",
    "java:S106",
    "java:S1234",
    "java:S121",
];

const TAG_POOL: [&str; 8] = [
    "security",
    "bug",
    "vulnerability",
    "code-smell",
    "performance",
    "style",
    "unused",
    "nullability",
];

const YEAR_MILLIS: i64 = 365 * 24 * 60 * 60 * 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("rule key set must not be empty")]
    EmptyRuleKeys,
}

/// Seeded producer of [`Issue`] batches
#[derive(Debug, Clone)]
pub struct IssueGenerator {
    rng: ChaCha8Rng,
    rule_keys: Vec<String>,
    base_time: i64,
}

impl IssueGenerator {
    pub fn new<I, S>(seed: u64, rule_keys: I) -> Result<Self, GeneratorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule_keys: Vec<String> = rule_keys.into_iter().map(Into::into).collect();
        if rule_keys.is_empty() {
            return Err(GeneratorError::EmptyRuleKeys);
        }
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            rule_keys,
            base_time: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Generator over [`DEFAULT_RULE_KEYS`] seeded with [`DEFAULT_SEED`]
    pub fn with_defaults() -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_SEED),
            rule_keys: DEFAULT_RULE_KEYS.iter().map(|k| k.to_string()).collect(),
            base_time: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Builder-style: pin the creation base time (epoch millis)
    #[must_use]
    pub fn with_base_time(mut self, base_time: i64) -> Self {
        self.base_time = base_time;
        self
    }

    /// Materialize `count` issues
    pub fn generate(&mut self, count: usize) -> Vec<Issue> {
        self.iter(count).collect()
    }

    /// Lazily yield `count` issues, drawing from the same stream as
    /// [`generate`](Self::generate)
    pub fn iter(&mut self, count: usize) -> impl Iterator<Item = Issue> + '_ {
        (0..count).map(move |_| self.next_issue())
    }

    fn next_issue(&mut self) -> Issue {
        let id = Uuid::new_v4().to_string();
        let rule_idx = self.rng.random_range(0..self.rule_keys.len());
        let rule_key = self.rule_keys[rule_idx].clone();
        let severity = Severity::ALL[self.rng.random_range(0..Severity::ALL.len())];
        let file_path = format!(
            "/project/module/src/main/java/com/example/Foo{}.java",
            self.rng.random_range(0..1_000u32)
        );
        let line: u32 = self.rng.random_range(1..=500);
        let message = format!(
            "Issue on line {line} for rule {rule_key} lorem ipsum dolor sit amet {}",
            self.rng.random_range(0..1_000u32)
        );
        let assignee = if self.rng.random_bool(0.5) {
            Some(format!("user{}", self.rng.random_range(0..50u32)))
        } else {
            None
        };
        let tags = self.random_tags();
        let created = self.base_time - self.rng.random_range(0..YEAR_MILLIS);

        let mut issue = Issue::new(
            id,
            rule_key,
            severity,
            message,
            Some(file_path.clone()),
            Some(line),
            created,
        )
        .with_assignee(assignee)
        .with_tags(tags);

        if let Some(primary) = issue.primary_location.as_mut() {
            primary.start_offset = Some(0);
            primary.end_offset = Some(self.rng.random_range(20..100));
        }

        let flow_count = self.rng.random_range(0..=2usize);
        let flows = (0..flow_count)
            .map(|_| {
                let loc_count = self.rng.random_range(1..=3usize);
                let locations = (0..loc_count)
                    .map(|step| {
                        let lno: u32 = self.rng.random_range(1..=500);
                        IssueLocation::lines(
                            file_path.clone(),
                            lno,
                            lno,
                            format!("Flow step {}", step + 1),
                        )
                    })
                    .collect();
                IssueFlow::new(locations)
            })
            .collect();

        let fix_count = self.rng.random_range(0..=2usize);
        let quick_fixes = (0..fix_count)
            .map(|n| {
                let location = IssueLocation::lines(
                    file_path.clone(),
                    line,
                    line,
                    format!("Apply fix {}", n + 1),
                )
                .with_offsets(0, self.rng.random_range(10..40));
                QuickFix::new(format!("Quick fix suggestion {}", n + 1), vec![location])
            })
            .collect();

        issue.with_flows(flows).with_quick_fixes(quick_fixes)
    }

    fn random_tags(&mut self) -> Vec<String> {
        let n = self.rng.random_range(1..=4usize);
        (0..n)
            .map(|_| TAG_POOL[self.rng.random_range(0..TAG_POOL.len())].to_string())
            .collect()
    }
}

/// Generate `count` issues from a fresh generator
pub fn generate<S: AsRef<str>>(
    count: usize,
    seed: u64,
    rule_keys: &[S],
) -> Result<Vec<Issue>, GeneratorError> {
    let mut generator = IssueGenerator::new(seed, rule_keys.iter().map(|k| k.as_ref().to_string()))?;
    Ok(generator.generate(count))
}
