//! MQTT listener with auto-reconnect.
//!
//! Subscribes to one device topic and hands every payload to a blocking
//! handler, one message at a time. Connection failures back off
//! exponentially with jitter; the subscription is renewed on every
//! `CONNACK` since sessions are clean.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::CliError;

// ── Constants ────────────────────────────────────────────────────────

const REQUEST_CHANNEL_CAPACITY: usize = 10;
const MIN_KEEP_ALIVE: Duration = Duration::from_secs(5);
const DISCONNECT_FLUSH: Duration = Duration::from_secs(2);

// ── Options ──────────────────────────────────────────────────────────

/// Backoff applied between reconnection attempts.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ListenerOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub keep_alive: Duration,
    pub client_id: String,
    pub topic: String,
    pub reconnect: ReconnectPolicy,
}

impl ListenerOptions {
    /// Broker settings from the resolved config, subscribing to `topic`.
    pub fn from_config(cfg: &Config, topic: String) -> Self {
        Self {
            host: cfg.broker.host.clone(),
            port: cfg.broker.port,
            username: cfg.broker.username.clone(),
            password: cfg.broker.password(),
            keep_alive: cfg.broker.keep_alive(),
            client_id: format!("adoptly{}", std::process::id()),
            topic,
            reconnect: ReconnectPolicy {
                initial_delay: cfg.reconnect.initial_delay(),
                max_delay: cfg.reconnect.max_delay(),
                max_retries: cfg.reconnect.retry_limit(),
            },
        }
    }

    pub fn broker(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut opts = MqttOptions::new(&self.client_id, &self.host, self.port);
        opts.set_credentials(&self.username, self.password.expose_secret())
            .set_keep_alive(self.keep_alive.max(MIN_KEEP_ALIVE))
            .set_clean_session(true);
        opts
    }
}

// ── Summary ──────────────────────────────────────────────────────────

/// Counters reported when the listener stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListenSummary {
    pub received: u64,
    pub applied: u64,
    pub failed: u64,
    pub reconnects: u64,
}

// ── Listener loop ────────────────────────────────────────────────────

/// Run until `cancel` fires or the retry limit is exhausted.
///
/// `handler` returns whether the payload was applied; a `false` is
/// counted and the loop keeps going.
pub async fn listen<H>(
    opts: &ListenerOptions,
    cancel: &CancellationToken,
    handler: Arc<H>,
) -> Result<ListenSummary, CliError>
where
    H: Fn(&[u8]) -> bool + Send + Sync + 'static,
{
    let (client, mut eventloop) = AsyncClient::new(opts.mqtt_options(), REQUEST_CHANNEL_CAPACITY);
    let mut summary = ListenSummary::default();
    let mut failures: u32 = 0;

    tracing::info!(broker = %opts.broker(), client_id = %opts.client_id, "connecting to broker");

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if failures > 0 {
                    summary.reconnects += 1;
                }
                failures = 0;
                tracing::info!(session_present = ack.session_present, topic = %opts.topic, "connected, subscribing");
                if let Err(e) = client.try_subscribe(&opts.topic, QoS::AtMostOnce) {
                    tracing::warn!(error = %e, "failed to queue subscription");
                }
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                tracing::debug!(topic = %opts.topic, "subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic != opts.topic {
                    tracing::debug!(topic = %publish.topic, "ignoring message on foreign topic");
                    continue;
                }
                summary.received += 1;
                tracing::info!(bytes = publish.payload.len(), "payload received");

                let payload = publish.payload.to_vec();
                let handler = Arc::clone(&handler);
                match tokio::task::spawn_blocking(move || handler(&payload)).await {
                    Ok(true) => summary.applied += 1,
                    Ok(false) => summary.failed += 1,
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!(error = %e, "payload handler panicked");
                    }
                }
            }
            Ok(event) => tracing::trace!(?event, "mqtt event"),
            Err(e) => {
                tracing::warn!(error = %e, attempt = failures, "broker connection error");

                if let Some(max) = opts.reconnect.max_retries {
                    if failures >= max {
                        tracing::error!(max_retries = max, "reconnection limit reached, giving up");
                        return Err(CliError::TransportFailed {
                            broker: opts.broker(),
                            reason: e.to_string(),
                        });
                    }
                }

                let delay = calculate_backoff(failures, &opts.reconnect);
                tracing::info!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt = failures,
                    "waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
                failures += 1;
            }
        }
    }

    shutdown(&client, &mut eventloop, &opts.topic).await;
    Ok(summary)
}

/// Unsubscribe and disconnect, flushing both requests briefly.
async fn shutdown(client: &AsyncClient, eventloop: &mut EventLoop, topic: &str) {
    tracing::info!("unsubscribing and disconnecting");
    if client.try_unsubscribe(topic).is_err() || client.try_disconnect().is_err() {
        tracing::debug!("request queue closed, skipping graceful disconnect");
        return;
    }

    let flush = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(DISCONNECT_FLUSH, flush).await.is_err() {
        tracing::debug!("broker did not drain within the flush window");
    }
}

// ── Signals ──────────────────────────────────────────────────────────

/// Cancel `token` on Ctrl-C or SIGTERM.
pub fn cancel_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::warn!("received Ctrl-C, shutting down"),
            () = terminate => tracing::warn!("received terminate signal, shutting down"),
            () = token.cancelled() => return,
        }
        token.cancel();
    });
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 25%)`
fn calculate_backoff(attempt: u32, policy: &ReconnectPolicy) -> Duration {
    let base = policy.initial_delay.as_secs_f64() * 2.0_f64.powf(f64::from(attempt.min(32)));
    let capped = base.min(policy.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
