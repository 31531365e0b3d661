//! Cooperative wait for host subsystems to become active.
//!
//! The gate is polled once per frame and never blocks; while it is waiting
//! the owning override simply skips its tick.

use tracing::{info, warn};

use crate::live::LiveTargetResolver;
use crate::tuner_config::ReadinessConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Waiting,
    /// Still waiting and the configured timeout has elapsed.
    Overdue,
    Ready,
}

#[derive(Debug, Clone)]
pub struct ReadinessGate {
    owner: String,
    subsystems: Vec<String>,
    poll_interval_ticks: u64,
    timeout_ticks: Option<u64>,
    waited_ticks: u64,
    ready: bool,
    overdue_reported: bool,
}

impl ReadinessGate {
    pub fn new(owner: impl Into<String>, subsystems: Vec<String>, config: &ReadinessConfig) -> Self {
        Self {
            owner: owner.into(),
            subsystems,
            poll_interval_ticks: config.poll_interval_ticks().max(1),
            timeout_ticks: config.timeout_ticks(),
            waited_ticks: 0,
            ready: false,
            overdue_reported: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Frames spent polling so far; frozen once ready.
    pub fn waited_ticks(&self) -> u64 {
        self.waited_ticks
    }

    /// Whether every watched subsystem reports active right now.
    pub fn subsystems_active(&self, host: &dyn LiveTargetResolver) -> bool {
        self.subsystems.iter().all(|name| host.is_ready(name))
    }

    /// Advances the wait by one frame. Once `Ready` is observed it latches.
    pub fn poll(&mut self, host: &dyn LiveTargetResolver) -> GateStatus {
        if self.ready {
            return GateStatus::Ready;
        }

        self.waited_ticks += 1;
        if self.waited_ticks % self.poll_interval_ticks == 0 && self.subsystems_active(host) {
            self.ready = true;
            info!(
                target: "tuner::readiness",
                owner = %self.owner,
                waited_ticks = self.waited_ticks,
                "readiness.observed"
            );
            return GateStatus::Ready;
        }

        match self.timeout_ticks {
            Some(limit) if self.waited_ticks >= limit => {
                if !self.overdue_reported {
                    self.overdue_reported = true;
                    warn!(
                        target: "tuner::readiness",
                        owner = %self.owner,
                        subsystems = ?self.subsystems,
                        waited_ticks = self.waited_ticks,
                        "readiness.never_became_ready"
                    );
                }
                GateStatus::Overdue
            }
            _ => GateStatus::Waiting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    fn config(poll_interval_ticks: u64, timeout_ticks: Option<u64>) -> ReadinessConfig {
        ReadinessConfig::new(poll_interval_ticks, timeout_ticks)
    }

    fn gate(config: &ReadinessConfig) -> ReadinessGate {
        ReadinessGate::new(
            "power_multiplier_override_enabled",
            vec!["engine/n2o".into(), "engine/rev_limiter".into()],
            config,
        )
    }

    #[test]
    fn waits_until_every_subsystem_is_active() {
        let host = InMemoryHost::new();
        let mut gate = gate(&config(1, None));

        assert_eq!(gate.poll(&host), GateStatus::Waiting);
        host.set_ready("engine/n2o", true);
        assert_eq!(gate.poll(&host), GateStatus::Waiting);
        host.set_ready("engine/rev_limiter", true);
        assert_eq!(gate.poll(&host), GateStatus::Ready);
        assert!(gate.is_ready());
    }

    #[test]
    fn ready_latches_even_if_host_goes_inactive() {
        let host = InMemoryHost::new();
        host.set_ready("engine/n2o", true);
        host.set_ready("engine/rev_limiter", true);
        let mut gate = gate(&config(1, None));
        assert_eq!(gate.poll(&host), GateStatus::Ready);

        host.set_ready("engine/n2o", false);
        assert_eq!(gate.poll(&host), GateStatus::Ready);
        assert!(!gate.subsystems_active(&host));
    }

    #[test]
    fn only_checks_on_poll_interval() {
        let host = InMemoryHost::new();
        host.set_ready("engine/n2o", true);
        host.set_ready("engine/rev_limiter", true);
        let mut gate = gate(&config(3, None));

        assert_eq!(gate.poll(&host), GateStatus::Waiting);
        assert_eq!(gate.poll(&host), GateStatus::Waiting);
        assert_eq!(gate.poll(&host), GateStatus::Ready);
        assert_eq!(gate.waited_ticks(), 3);
    }

    #[test]
    fn unbounded_wait_never_turns_overdue() {
        let host = InMemoryHost::new();
        let mut gate = gate(&config(1, None));
        for _ in 0..500 {
            assert_eq!(gate.poll(&host), GateStatus::Waiting);
        }
    }

    #[test]
    fn timeout_reports_overdue_but_keeps_polling() {
        let host = InMemoryHost::new();
        let mut gate = gate(&config(1, Some(4)));

        for _ in 0..3 {
            assert_eq!(gate.poll(&host), GateStatus::Waiting);
        }
        assert_eq!(gate.poll(&host), GateStatus::Overdue);
        assert_eq!(gate.poll(&host), GateStatus::Overdue);

        host.set_ready("engine/n2o", true);
        host.set_ready("engine/rev_limiter", true);
        assert_eq!(gate.poll(&host), GateStatus::Ready);
    }
}
