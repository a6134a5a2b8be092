//! Utils is shared types and functions for the controllers
use std::{sync::Mutex, time::Duration};


use anyhow::Result;
use clap::Args;
use k8s_openapi::chrono::{DateTime, Utc};
use rand::{rngs::StdRng, thread_rng, Rng, RngCore, SeedableRng};

use crate::{store::ResourceStore, workload::WorkloadProbe};

/// Operator Context
pub struct Context<S, W, R, C> {
    /// Store of the custom resources
    pub store: S,
    /// Probe of the workloads backing the resources
    pub probe: W,
    /// Random number generator
    pub rng: Mutex<R>,
    /// Clock that provide the current time
    pub clock: C,
    /// Controller settings
    pub config: ControllerConfig,
}

impl<S, W> Context<S, W, StdRng, UtcClock> {
    /// Create new context
    pub fn new(store: S, probe: W, config: ControllerConfig) -> Result<Self>
    where
        S: ResourceStore,
        W: WorkloadProbe,
    {
        Ok(Context {
            store,
            probe,
            rng: Mutex::new(StdRng::from_rng(thread_rng())?),
            clock: UtcClock,
            config,
        })
    }
}

impl<S, W, R, C> Context<S, W, R, C>
where
    R: RngCore,
{
    /// Delay until the next periodic resync, jittered so resources do not resync in lockstep.
    pub fn resync_delay(&self) -> Duration {
        let jitter = self.config.resync_jitter_secs;
        let jitter = if jitter == 0 {
            0
        } else {
            // Only hold the lock for a single draw.
            match self.rng.lock() {
                Ok(mut rng) => rng.gen_range(0..=jitter),
                Err(poisoned) => poisoned.into_inner().gen_range(0..=jitter),
            }
        };
        Duration::from_secs(self.config.resync_interval_secs.saturating_add(jitter))
    }
}

/// Provides the current time.
pub trait Clock {
    /// Report the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Provides the current time using real time.
pub struct UtcClock;
impl Clock for UtcClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settings of the controllers.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Only watch resources of this namespace, all namespaces if unset.
    #[arg(long, env = "OPERATOR_WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Seconds between two reconciles of an unchanged resource.
    #[arg(long, env = "OPERATOR_RESYNC_INTERVAL_SECS", default_value_t = 120)]
    pub resync_interval_secs: u64,

    /// Upper bound of the random delay added to the resync interval.
    #[arg(long, env = "OPERATOR_RESYNC_JITTER_SECS", default_value_t = 10)]
    pub resync_jitter_secs: u64,

    /// Seconds a workload probe may take before the resource is reported as not ready.
    #[arg(long, env = "OPERATOR_PROBE_TIMEOUT_SECS", default_value_t = 10)]
    pub probe_timeout_secs: u64,

    /// URL template of the HTTP API used to describe topics.
    /// `{cluster}` and `{namespace}` are replaced by the Kafka cluster of the topic.
    #[arg(
        long,
        env = "OPERATOR_TOPIC_ADMIN_URL",
        default_value = "http://{cluster}-bridge-service.{namespace}.svc:8080"
    )]
    pub topic_admin_url: String,

    /// Reconcile KafkaConnectS2I resources.
    #[arg(long, env = "OPERATOR_ENABLE_CONNECT_S2I", default_value_t = false)]
    pub enable_connect_s2i: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            resync_interval_secs: 120,
            resync_jitter_secs: 10,
            probe_timeout_secs: 10,
            topic_admin_url: "http://{cluster}-bridge-service.{namespace}.svc:8080".to_owned(),
            enable_connect_s2i: false,
        }
    }
}

impl ControllerConfig {
    /// Bound on a single workload probe.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Topic admin URL of a Kafka cluster.
    pub fn topic_admin_url(&self, cluster: &str, namespace: &str) -> String {
        self.topic_admin_url
            .replace("{cluster}", cluster)
            .replace("{namespace}", namespace)
    }
}
