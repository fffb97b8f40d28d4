use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// How long a granted lock stays valid before a locker may hand the
    /// target to another job.
    pub lock_timeout: Duration,

    /// Upper bound for one acquisition, measured from the moment the catalog
    /// has been loaded.
    pub acquire_timeout: Duration,

    /// Extra time granted to a locker that has not answered by the deadline.
    ///
    /// Once it runs out, the coordinator stops waiting and releases every
    /// candidate on behalf of the job.
    pub deadline_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
            deadline_grace: Duration::from_secs(1),
        }
    }
}
