// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Submission of a contract invocation and observation of its outcome.
//!
//! A submission goes through the following stages:
//!
//! ```text
//! Built -> Prepared -> Signed -> Submitted -> Pending* -> Success
//!                                                      -> Failed
//!                                                      -> TimedOut
//!                                                      -> Cancelled
//! ```
//!
//! The envelope is sent exactly once. Only the status queries of the
//! pending stage are repeated, as dictated by a [`PollPolicy`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::ConfigError;
use crate::envelope::{Envelope, Invocation, TimeBounds};
use crate::error::Error;
use crate::native::{decode, NativeValue};
use crate::signer::Signer;
use crate::transport::{Transport, TransportError, TxStatus};

const fn default_interval() -> Duration {
    Duration::from_secs(1)
}
const fn default_multiplier() -> u32 {
    1
}
const fn default_max_interval() -> Duration {
    Duration::from_secs(10)
}
const fn default_max_attempts() -> u32 {
    60
}

/// How the status of a submitted transaction is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollPolicy {
    /// Delay after the first unobserved status
    #[serde(with = "humantime_serde")]
    #[serde(default = "default_interval")]
    pub interval: Duration,

    /// Growth factor of the delay between two queries
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,

    /// Upper bound of the delay between two queries
    #[serde(with = "humantime_serde")]
    #[serde(default = "default_max_interval")]
    pub max_interval: Duration,

    /// Number of status queries before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            multiplier: default_multiplier(),
            max_interval: default_max_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollPolicy {
    /// Query every `interval`, at most `max_attempts` times.
    pub const fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            multiplier: 1,
            max_interval: interval,
            max_attempts,
        }
    }

    /// Set the growth factor of the delay.
    pub const fn with_backoff(
        mut self,
        multiplier: u32,
        max_interval: Duration,
    ) -> Self {
        self.multiplier = multiplier;
        self.max_interval = max_interval;
        self
    }

    /// Delay following the given zero-based attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.interval.saturating_mul(factor).min(self.max_interval)
    }

    /// Reject policies that never query or never grow.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidPollPolicy(
                "max_attempts must be positive",
            ));
        }
        if self.multiplier == 0 {
            return Err(ConfigError::InvalidPollPolicy(
                "multiplier must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Stage reached by a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Envelope built against the account sequence
    Built,
    /// Resources and fee computed by simulation
    Prepared,
    /// Signature attached
    Signed,
    /// Accepted by the network
    Submitted,
    /// Not yet observed
    Pending,
    /// Applied successfully
    Success,
    /// Applied and failed
    Failed,
    /// Not observed within the poll policy
    TimedOut,
    /// Abandoned by the caller
    Cancelled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stage = match self {
            Self::Built => "built",
            Self::Prepared => "prepared",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        };
        f.write_str(stage)
    }
}

/// Drives invocations through a [`Transport`]
#[derive(Debug, Clone)]
pub struct Submitter<T> {
    transport: T,
    network_passphrase: String,
    base_fee: u32,
    tx_timeout: Duration,
    poll: PollPolicy,
}

impl<T: Transport> Submitter<T> {
    /// Create a submitter for the given network.
    pub fn new(
        transport: T,
        network_passphrase: impl Into<String>,
        base_fee: u32,
        tx_timeout: Duration,
        poll: PollPolicy,
    ) -> Self {
        Self {
            transport,
            network_passphrase: network_passphrase.into(),
            base_fee,
            tx_timeout,
            poll,
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The poll policy in use
    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Submit an invocation signed by `signer` and wait for its outcome.
    ///
    /// # Errors
    /// - [`Error::Transport`] if the account state cannot be fetched
    /// - [`Error::PreparationFailed`] if the simulation fails
    /// - [`Error::SubmissionRejected`] if the network refuses the envelope
    /// - any error of [`Submitter::wait_for`]
    pub async fn submit(
        &self,
        invocation: Invocation,
        signer: &dyn Signer,
        cancel: &CancellationToken,
    ) -> Result<NativeValue, Error> {
        let method = invocation.function.clone();

        let account = self
            .transport
            .fetch_account(&signer.public_key())
            .await?;
        let envelope = Envelope::build(
            account.public_key,
            account.sequence,
            self.base_fee,
            self.network_passphrase.clone(),
            TimeBounds::expiring_in(self.tx_timeout),
            invocation,
        )?;
        debug!(%method, sequence = envelope.sequence, stage = %Stage::Built);

        let mut envelope = self
            .transport
            .prepare(envelope)
            .await
            .map_err(Error::PreparationFailed)?;
        debug!(%method, fee = envelope.fee, stage = %Stage::Prepared);

        envelope.sign(signer)?;
        let hash = envelope.hash_hex()?;
        debug!(%method, %hash, stage = %Stage::Signed);

        if cancel.is_cancelled() {
            debug!(%method, %hash, stage = %Stage::Cancelled);
            return Err(Error::Cancelled { hash });
        }

        let response = self
            .transport
            .submit(&envelope)
            .await
            .map_err(Error::SubmissionRejected)?;
        if !response.status.is_accepted() {
            warn!(
                %method,
                hash = %response.hash,
                status = %response.status,
                "submission rejected"
            );
            return Err(Error::SubmissionRejected(TransportError::Rejected {
                status: response.status,
                raw: response.raw,
            }));
        }
        debug!(%method, hash = %response.hash, stage = %Stage::Submitted);

        self.wait_for(&response.hash, cancel).await
    }

    /// Wait for the outcome of an already submitted transaction.
    ///
    /// Nothing is sent to the network but status queries, so this can be
    /// called any number of times for the same hash.
    ///
    /// # Errors
    /// - [`Error::TransactionFailed`] with the raw response on any terminal
    ///   status but success
    /// - [`Error::TimedOut`] once the poll policy is exhausted
    /// - [`Error::Cancelled`] when `cancel` fires
    /// - decoding errors of the return value
    pub async fn wait_for(
        &self,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<NativeValue, Error> {
        let cancelled = || {
            debug!(%hash, stage = %Stage::Cancelled);
            Error::Cancelled {
                hash: hash.to_string(),
            }
        };

        let mut attempts = 0;
        while attempts < self.poll.max_attempts {
            attempts += 1;

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                status = self.transport.transaction_status(hash) => status,
            };

            match status {
                Ok(response) if !response.status.is_terminal() => {
                    trace!(%hash, attempt = attempts, stage = %Stage::Pending);
                }
                Ok(response) if response.status == TxStatus::Success => {
                    debug!(%hash, attempt = attempts, stage = %Stage::Success);
                    return match response.return_value()? {
                        Some(value) => decode(&value),
                        None => Ok(NativeValue::Null),
                    };
                }
                Ok(response) => {
                    warn!(
                        %hash,
                        status = %response.status,
                        stage = %Stage::Failed,
                        "transaction failed"
                    );
                    return Err(Error::TransactionFailed(Box::new(response)));
                }
                Err(err) => {
                    warn!(
                        %hash,
                        attempt = attempts,
                        "status query failed: {err}"
                    );
                }
            }

            if attempts == self.poll.max_attempts {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(self.poll.delay(attempts - 1)) => {}
            }
        }

        warn!(%hash, attempts, stage = %Stage::TimedOut);
        Err(Error::TimedOut {
            hash: hash.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(30), Duration::from_secs(1));

        let policy = PollPolicy::fixed(Duration::from_millis(100), 10)
            .with_backoff(2, Duration::from_millis(500));
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(500));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(500));
    }

    #[test]
    fn policy_validation() {
        assert!(PollPolicy::default().validate().is_ok());
        assert!(PollPolicy::fixed(Duration::ZERO, 0).validate().is_err());
        assert!(PollPolicy::default()
            .with_backoff(0, Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn policy_from_toml() {
        let policy: PollPolicy =
            toml::from_str("interval = \"250ms\"\nmax_attempts = 5\n")
                .unwrap();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.multiplier, 1);
        assert_eq!(policy.max_interval, Duration::from_secs(10));
    }
}
