//! Signals dependent containers after a render has committed.
//!
//! Delivery failures are isolated: one bad target is logged and skipped,
//! the rest of the list still gets its signals, and the build cycle as a
//! whole stays successful.

use std::fmt;
use std::str::FromStr;

use log::{info, warn};

use crate::error::Error;
use crate::runtime::ContainerRuntime;

/// A signal to deliver, either symbolic (`HUP`) or numeric (`1`).
///
/// Numeric strings are parsed as integers; anything else passes through
/// literally for the runtime to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSpec {
    Numeric(i64),
    Named(String),
}

impl fmt::Display for SignalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSpec::Numeric(n) => write!(f, "{}", n),
            SignalSpec::Named(name) => f.write_str(name),
        }
    }
}

/// One `SIGNAL:TARGET` pair from the command line, e.g. `HUP:nginx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub signal: SignalSpec,
    pub target: String,
}

impl FromStr for Notification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (signal, target) = s
            .split_once(':')
            .ok_or_else(|| format!("expected SIGNAL:TARGET, got {:?}", s))?;
        if signal.is_empty() || target.is_empty() {
            return Err(format!("expected SIGNAL:TARGET, got {:?}", s));
        }
        let signal = match signal.parse::<i64>() {
            Ok(n) => SignalSpec::Numeric(n),
            Err(_) => SignalSpec::Named(signal.to_string()),
        };
        Ok(Notification {
            signal,
            target: target.to_string(),
        })
    }
}

/// Deliver every configured notification, in order. Never fails the
/// cycle; per-target errors are logged and dropped, not retried.
pub async fn dispatch(runtime: &dyn ContainerRuntime, notifications: &[Notification]) {
    for n in notifications {
        let signal = n.signal.to_string();
        info!("Sending {} to {}", signal, n.target);
        if let Err(e) = runtime.kill(&n.target, &signal).await {
            let err = Error::Notification {
                signal,
                target: n.target.clone(),
                reason: e.to_string(),
            };
            warn!("Error ignored: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::mock::MockRuntime;

    #[test]
    fn parses_symbolic_and_numeric_signals() {
        let n: Notification = "HUP:nginx".parse().unwrap();
        assert_eq!(n.signal, SignalSpec::Named("HUP".into()));
        assert_eq!(n.target, "nginx");

        let n: Notification = "9:stubborn".parse().unwrap();
        assert_eq!(n.signal, SignalSpec::Numeric(9));
        assert_eq!(n.signal.to_string(), "9");
    }

    #[test]
    fn target_may_contain_colons() {
        // Only the first colon separates signal from target.
        let n: Notification = "HUP:compose_nginx:1".parse().unwrap();
        assert_eq!(n.target, "compose_nginx:1");
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("nginx".parse::<Notification>().is_err());
        assert!(":nginx".parse::<Notification>().is_err());
        assert!("HUP:".parse::<Notification>().is_err());
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_block_the_rest() {
        let rt = MockRuntime {
            failing_kills: vec!["broken".into()],
            ..Default::default()
        };
        let notifications = vec![
            "HUP:broken".parse().unwrap(),
            "HUP:nginx".parse().unwrap(),
            "USR1:haproxy".parse().unwrap(),
        ];

        dispatch(&rt, &notifications).await;

        let delivered = rt.delivered.lock().unwrap().clone();
        assert_eq!(
            delivered,
            vec![
                ("HUP".to_string(), "nginx".to_string()),
                ("USR1".to_string(), "haproxy".to_string()),
            ]
        );
    }
}
