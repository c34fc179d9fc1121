// ABOUTME: Scoped request throttling with per-identity fixed windows
// ABOUTME: Implements anon, user, login, registration, and order creation rate policies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! # Request throttling
//!
//! Each throttle scope has a rate such as `100/day`. Counters live in a sharded
//! concurrent map keyed by `scope:identity`, where the identity is the account id of an
//! authenticated caller or the client address of an anonymous one.
//!
//! Endpoints use either the default pair of throttles (`anon` for anonymous callers and
//! `user` for everyone) or exactly one scoped throttle (`login`, `registration`,
//! `order_create`).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tracing::warn;

use crate::constants::throttle;
use crate::errors::{AppError, AppResult};
use crate::permissions::Principal;

/// Map size above which stale windows are evicted
const CLEANUP_THRESHOLD: usize = 10_000;

/// Named throttle policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleScope {
    /// Anonymous callers, all endpoints without a scoped throttle
    Anon,
    /// Every caller, all endpoints without a scoped throttle
    User,
    /// `POST /api/login/`
    Login,
    /// `POST /api/registration/`
    Registration,
    /// `POST /api/orders/`
    OrderCreate,
}

impl ThrottleScope {
    /// Scope name used in cache keys and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anon => "anon",
            Self::User => "user",
            Self::Login => "login",
            Self::Registration => "registration",
            Self::OrderCreate => "order_create",
        }
    }
}

/// Invalid rate string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid throttle rate '{0}', expected <requests>/<s|m|h|d>")]
pub struct InvalidRate(String);

/// Allowed number of requests per period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRate {
    /// Requests allowed per window
    pub requests: u32,
    /// Window length
    pub period: Duration,
}

impl ThrottleRate {
    /// Build a rate from parts
    #[must_use]
    pub const fn new(requests: u32, period: Duration) -> Self {
        Self { requests, period }
    }
}

impl FromStr for ThrottleRate {
    type Err = InvalidRate;

    /// Parses `<n>/<period>` where only the first letter of the period matters
    /// (`s`, `m`, `h`, `d`), so `5/min` and `100/day` are both accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRate(s.to_owned());
        let (count, period) = s.trim().split_once('/').ok_or_else(invalid)?;
        let requests: u32 = count.trim().parse().map_err(|_| invalid())?;
        let seconds = match period.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 3_600,
            Some('d') => 86_400,
            _ => return Err(invalid()),
        };
        Ok(Self::new(requests, Duration::from_secs(seconds)))
    }
}

impl Display for ThrottleRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.requests, self.period.as_secs())
    }
}

/// Rates for every throttle scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Master switch
    pub enabled: bool,
    /// Anonymous rate
    pub anon: ThrottleRate,
    /// Per-caller rate
    pub user: ThrottleRate,
    /// Login rate
    pub login: ThrottleRate,
    /// Registration rate
    pub registration: ThrottleRate,
    /// Order placement rate
    pub order_create: ThrottleRate,
}

impl ThrottleConfig {
    /// Rate configured for `scope`
    #[must_use]
    pub const fn rate_for(&self, scope: ThrottleScope) -> ThrottleRate {
        match scope {
            ThrottleScope::Anon => self.anon,
            ThrottleScope::User => self.user,
            ThrottleScope::Login => self.login,
            ThrottleScope::Registration => self.registration,
            ThrottleScope::OrderCreate => self.order_create,
        }
    }

    /// Same rates with throttling switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        let parse = |rate: &str| rate.parse().unwrap_or(ThrottleRate::new(0, Duration::ZERO));
        Self {
            enabled: true,
            anon: parse(throttle::ANON),
            user: parse(throttle::USER),
            login: parse(throttle::LOGIN),
            registration: parse(throttle::REGISTRATION),
            order_create: parse(throttle::ORDER_CREATE),
        }
    }
}

/// Who is being counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleIdentity<'a> {
    /// Authenticated account id
    User(i64),
    /// Client address of an anonymous caller
    Client(&'a str),
}

impl<'a> ThrottleIdentity<'a> {
    /// Identity for a caller: account id when authenticated, else client address
    #[must_use]
    pub fn of(principal: Option<&Principal>, client_ip: &'a str) -> Self {
        principal.map_or(Self::Client(client_ip), |p| Self::User(p.user_id))
    }

    fn key(&self, scope: ThrottleScope) -> String {
        match self {
            Self::User(id) => format!("{}:user:{id}", scope.as_str()),
            Self::Client(ip) => format!("{}:ip:{ip}", scope.as_str()),
        }
    }
}

/// Outcome of a throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleStatus {
    /// Whether the request must be rejected
    pub is_limited: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// Unix timestamp at which the window resets
    pub reset_at: i64,
    /// Seconds until a rejected caller may retry
    pub retry_after_seconds: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
    period: Duration,
}

/// Fixed-window throttler shared by all handlers
#[derive(Clone)]
pub struct Throttler {
    state: Arc<DashMap<String, Window>>,
    config: ThrottleConfig,
}

impl Throttler {
    /// Create a throttler for the given rates
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            state: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Configured rates
    #[must_use]
    pub const fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Count a request against `scope` for `identity`
    #[must_use]
    pub fn check(&self, scope: ThrottleScope, identity: ThrottleIdentity<'_>) -> ThrottleStatus {
        let rate = self.config.rate_for(scope);
        let now = Instant::now();

        let mut entry = self.state.entry(identity.key(scope)).or_insert(Window {
            count: 0,
            started: now,
            period: rate.period,
        });
        let window = entry.value_mut();

        if now.duration_since(window.started) >= window.period {
            window.count = 0;
            window.started = now;
            window.period = rate.period;
        }

        let is_limited = window.count >= rate.requests;
        if !is_limited {
            window.count += 1;
        }
        let remaining = rate.requests.saturating_sub(window.count);
        let until_reset = window
            .period
            .saturating_sub(now.duration_since(window.started));
        drop(entry);

        if self.state.len() > CLEANUP_THRESHOLD {
            self.cleanup_old_entries(now);
        }

        let reset_at = SystemTime::now()
            .checked_add(until_reset)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

        ThrottleStatus {
            is_limited,
            limit: rate.requests,
            remaining,
            reset_at,
            retry_after_seconds: until_reset.as_secs_f64().ceil() as u64,
        }
    }

    /// Enforce a single scoped throttle
    ///
    /// # Errors
    ///
    /// Returns a 429 error when the scope's window is exhausted
    pub fn enforce_scope(
        &self,
        scope: ThrottleScope,
        principal: Option<&Principal>,
        client_ip: &str,
    ) -> AppResult<()> {
        self.enforce_all(&[scope], principal, client_ip)
    }

    /// Enforce the default throttles: `anon` for anonymous callers, `user` for everyone
    ///
    /// # Errors
    ///
    /// Returns a 429 error when any applicable window is exhausted
    pub fn enforce_default(&self, principal: Option<&Principal>, client_ip: &str) -> AppResult<()> {
        if principal.is_some() {
            self.enforce_all(&[ThrottleScope::User], principal, client_ip)
        } else {
            self.enforce_all(
                &[ThrottleScope::Anon, ThrottleScope::User],
                principal,
                client_ip,
            )
        }
    }

    fn enforce_all(
        &self,
        scopes: &[ThrottleScope],
        principal: Option<&Principal>,
        client_ip: &str,
    ) -> AppResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let identity = ThrottleIdentity::of(principal, client_ip);

        let rejected = scopes
            .iter()
            .map(|scope| (*scope, self.check(*scope, identity)))
            .filter(|(_, status)| status.is_limited)
            .max_by_key(|(_, status)| status.retry_after_seconds);

        match rejected {
            None => Ok(()),
            Some((scope, status)) => {
                warn!(
                    throttle.scope = scope.as_str(),
                    throttle.identity = ?identity,
                    retry_after = status.retry_after_seconds,
                    "Request throttled"
                );
                Err(AppError::throttled(
                    status.limit,
                    status.retry_after_seconds,
                    status.reset_at,
                ))
            }
        }
    }

    /// Remove windows that have already expired
    fn cleanup_old_entries(&self, now: Instant) {
        self.state
            .retain(|_key, window| now.duration_since(window.started) < window.period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_config() -> ThrottleConfig {
        ThrottleConfig {
            login: ThrottleRate::new(2, Duration::from_secs(60)),
            anon: ThrottleRate::new(3, Duration::from_secs(86_400)),
            ..ThrottleConfig::default()
        }
    }

    #[test]
    fn test_rate_parsing_uses_first_letter_of_period() {
        let rate: ThrottleRate = "5/min".parse().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(rate, ThrottleRate::new(5, Duration::from_secs(60)));
        let rate: ThrottleRate = "100/day".parse().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(rate.period, Duration::from_secs(86_400));
        let rate: ThrottleRate = "20/hour".parse().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(rate.period, Duration::from_secs(3_600));
        assert!("ten/min".parse::<ThrottleRate>().is_err());
        assert!("10/week".parse::<ThrottleRate>().is_err());
        assert!("10".parse::<ThrottleRate>().is_err());
    }

    #[test]
    fn test_defaults_match_policy_table() {
        let config = ThrottleConfig::default();
        assert_eq!(config.anon.requests, 100);
        assert_eq!(config.user.requests, 1000);
        assert_eq!(config.login, ThrottleRate::new(5, Duration::from_secs(60)));
        assert_eq!(config.registration.requests, 3);
        assert_eq!(config.order_create, ThrottleRate::new(20, Duration::from_secs(3_600)));
    }

    #[test]
    fn test_scope_rejects_after_limit() {
        let throttler = Throttler::new(tight_config());
        assert!(throttler.enforce_scope(ThrottleScope::Login, None, "10.0.0.1").is_ok());
        assert!(throttler.enforce_scope(ThrottleScope::Login, None, "10.0.0.1").is_ok());
        let err = throttler
            .enforce_scope(ThrottleScope::Login, None, "10.0.0.1")
            .err()
            .map(|e| e.http_status());
        assert_eq!(err, Some(429));

        // Other clients keep their own window
        assert!(throttler.enforce_scope(ThrottleScope::Login, None, "10.0.0.2").is_ok());
    }

    #[test]
    fn test_rejected_requests_are_not_counted() {
        let throttler = Throttler::new(tight_config());
        for _ in 0..5 {
            let _ = throttler.check(ThrottleScope::Login, ThrottleIdentity::Client("ip"));
        }
        let status = throttler.check(ThrottleScope::Login, ThrottleIdentity::Client("ip"));
        assert!(status.is_limited);
        assert_eq!(status.remaining, 0);
        assert!(status.retry_after_seconds <= 60);
    }

    #[test]
    fn test_disabled_throttler_allows_everything() {
        let config = ThrottleConfig {
            login: ThrottleRate::new(0, Duration::from_secs(60)),
            ..ThrottleConfig::disabled()
        };
        let throttler = Throttler::new(config);
        assert!(throttler.enforce_scope(ThrottleScope::Login, None, "ip").is_ok());
    }

    #[test]
    fn test_default_throttles_apply_anon_rate_to_anonymous_only() {
        let throttler = Throttler::new(tight_config());
        for _ in 0..3 {
            assert!(throttler.enforce_default(None, "1.1.1.1").is_ok());
        }
        assert!(throttler.enforce_default(None, "1.1.1.1").is_err());

        let principal = Principal {
            user_id: 7,
            username: "anna".to_owned(),
            is_staff: false,
            profile: None,
        };
        for _ in 0..5 {
            assert!(throttler.enforce_default(Some(&principal), "1.1.1.1").is_ok());
        }
    }
}
