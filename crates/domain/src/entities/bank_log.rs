//! Guild bank history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankLogKind {
    Deposit,
    Withdraw,
}

impl fmt::Display for BankLogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankLogKind::Deposit => write!(f, "deposited"),
            BankLogKind::Withdraw => write!(f, "withdrew"),
        }
    }
}

/// One member-initiated bank movement, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankLogEntry {
    kind: BankLogKind,
    player: PlayerId,
    amount: f64,
    at: DateTime<Utc>,
}

impl BankLogEntry {
    pub fn new(kind: BankLogKind, player: PlayerId, amount: f64, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            player,
            amount,
            at,
        }
    }

    #[inline]
    pub fn kind(&self) -> BankLogKind {
        self.kind
    }

    #[inline]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    #[inline]
    pub fn amount(&self) -> f64 {
        self.amount
    }

    #[inline]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl fmt::Display for BankLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.2} at {}",
            self.player,
            self.kind,
            self.amount,
            self.at.to_rfc3339()
        )
    }
}
