// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} tag '{value}'")]
pub struct ParseTagError {
    kind: &'static str,
    value: String,
}

macro_rules! string_tagged {
    ($name:ident, $label:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseTagError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(ParseTagError { kind: $label, value: s.to_string() }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_tagged!(AccountKind, "account kind", {
    Bank => "bank",
    Cash => "cash",
    Ewallet => "ewallet",
});

string_tagged!(CategoryKind, "category kind", {
    Income => "income",
    Expense => "expense",
});

string_tagged!(TransactionKind, "transaction kind", {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
});

string_tagged!(Period, "period", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

string_tagged!(DayConstraint, "day constraint", {
    All => "all",
    Workdays => "workdays",
    Weekends => "weekends",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub bucket_id: Option<i64>,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub date: NaiveDateTime,
    pub note: Option<String>,
}

/// Rollover balance frozen at `date` because the daily rate changed.
/// Value and date travel together; a stored row carrying only one of the
/// two columns is loaded as no snapshot at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RolloverSnapshot {
    pub value: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketKind {
    Standard {
        period: Period,
        constraint: DayConstraint,
        limit: Decimal,
    },
    MealTracker {
        daily_allowance: Decimal,
        snapshot: Option<RolloverSnapshot>,
    },
}

impl BucketKind {
    pub fn is_meal_tracker(&self) -> bool {
        matches!(self, Self::MealTracker { .. })
    }

    /// The stored limit column: period total for standard buckets, daily
    /// allowance for meal trackers.
    pub fn limit(&self) -> Decimal {
        match self {
            Self::Standard { limit, .. } => *limit,
            Self::MealTracker { daily_allowance, .. } => *daily_allowance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub id: i64,
    pub name: String,
    pub kind: BucketKind,
    pub category_ids: Vec<i64>,
    pub color: String,
    pub rollover: bool,
    pub created_at: Option<NaiveDate>,
    pub target_account_id: Option<i64>,
}
