use crate::error::RequestError;

/// What a job asks for when it acquires targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionRequest {
    /// Fewest targets the job can run with (inclusive, may be 0).
    pub min_count: usize,
    /// Most targets to lock, even if more match.
    pub max_count: usize,
    /// When non-empty, only targets whose first name label starts with one of
    /// these prefixes are considered.
    pub name_prefixes: Vec<String>,
    /// Randomize the candidate order before locking.
    pub shuffle: bool,
}

impl AcquisitionRequest {
    pub fn new(min_count: usize, max_count: usize) -> Self {
        Self {
            min_count,
            max_count,
            ..Self::default()
        }
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn shuffled(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Normalizes a request received from the outside.
    ///
    /// Prefixes are trimmed; a prefix that is empty after trimming is rejected,
    /// as is a minimum larger than the maximum.
    pub fn validate(mut self) -> Result<Self, RequestError> {
        for (index, prefix) in self.name_prefixes.iter_mut().enumerate() {
            let trimmed = prefix.trim();
            if trimmed.is_empty() {
                return Err(RequestError::EmptyPrefix { index });
            }
            *prefix = trimmed.to_string();
        }

        if self.min_count > self.max_count {
            return Err(RequestError::InvertedBounds {
                min: self.min_count,
                max: self.max_count,
            });
        }

        Ok(self)
    }
}
