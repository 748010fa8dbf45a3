use crate::constants::{ENV_CHUNK_BYTES, ENV_SKIP_MALFORMED, ENV_THREADS};
use crate::error::{CalcError, Result};
use crate::reduce::ReduceStrategy;
use crate::utils::{default_threads, env_parse, env_var_truthy};
use serde::Serialize;

/// What a worker does with a line that is not `key;value`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    #[default]
    Fail,
    Skip,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunConfig {
    /// Target range size in bytes; derived from the input length when unset.
    pub chunk_bytes: Option<usize>,
    /// Worker pool size; logical CPUs when unset.
    pub threads: Option<usize>,
    pub malformed: MalformedPolicy,
    /// Forces a merge strategy; chosen from the number of partial maps when unset.
    pub reduce: Option<ReduceStrategy>,
}

impl RunConfig {
    pub fn new() -> Self { Self::default() }

    pub fn from_env() -> Self {
        let malformed = if env_var_truthy(ENV_SKIP_MALFORMED) { MalformedPolicy::Skip } else { MalformedPolicy::Fail };
        Self { chunk_bytes: env_parse(ENV_CHUNK_BYTES), threads: env_parse(ENV_THREADS), malformed, reduce: None }
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self { self.chunk_bytes = Some(chunk_bytes); self }

    pub fn with_threads(mut self, threads: usize) -> Self { self.threads = Some(threads); self }

    pub fn with_malformed(mut self, policy: MalformedPolicy) -> Self { self.malformed = policy; self }

    pub fn with_reduce(mut self, strategy: ReduceStrategy) -> Self { self.reduce = Some(strategy); self }

    pub fn effective_threads(&self) -> usize { self.threads.unwrap_or_else(default_threads).max(1) }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_bytes == Some(0) { return Err(CalcError::Config("chunk size must be at least one byte".into())); }
        if self.threads == Some(0) { return Err(CalcError::Config("thread count must be at least one".into())); }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(RunConfig::new().with_chunk_bytes(0).validate(), Err(CalcError::Config(_))));
        assert!(matches!(RunConfig::new().with_threads(0).validate(), Err(CalcError::Config(_))));
        assert!(RunConfig::new().with_chunk_bytes(1).with_threads(3).validate().is_ok());
    }

    #[test]
    fn unset_threads_fall_back_to_cpus() {
        assert!(RunConfig::new().effective_threads() >= 1);
        assert_eq!(RunConfig::new().with_threads(5).effective_threads(), 5);
    }
}
