//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// One movement of a transaction being created or replaced.
///
/// `account_id` may be empty: the movement is then *unprocessed* and awaits
/// categorization.
#[derive(Clone, Debug)]
pub struct MovementDraft {
    pub account_id: Option<Uuid>,
    pub currency_id: Uuid,
    pub amount: Decimal,
}

impl MovementDraft {
    #[must_use]
    pub fn new(currency_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id: None,
            currency_id,
            amount,
        }
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// Create a transaction.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub place: Option<String>,
    pub partner: Option<String>,
    pub notes: Option<String>,
    /// Import identifiers; non-empty lists make the row undeletable by users.
    pub external_ids: Vec<String>,
    pub movements: Vec<MovementDraft>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        date: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            description: description.into(),
            place: None,
            partner: None,
            notes: None,
            external_ids: Vec::new(),
            movements: Vec::new(),
        }
    }

    #[must_use]
    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    #[must_use]
    pub fn partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = Some(partner.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn external_id(mut self, id: impl Into<String>) -> Self {
        self.external_ids.push(id.into());
        self
    }

    #[must_use]
    pub fn movement(mut self, movement: MovementDraft) -> Self {
        self.movements.push(movement);
        self
    }
}

/// Update an existing transaction (user path).
///
/// `None` fields are left unchanged. `external_ids`, suspicion state and the
/// dismissed flag are always preserved from the stored row; only the
/// privileged internal path used by merge and dismissal may rewrite those.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub place: Option<String>,
    pub partner: Option<String>,
    pub notes: Option<String>,
    /// When present, replaces the movement list wholesale.
    pub movements: Option<Vec<MovementDraft>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
            date: None,
            description: None,
            place: None,
            partner: None,
            notes: None,
            movements: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    #[must_use]
    pub fn partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = Some(partner.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn movements(mut self, movements: Vec<MovementDraft>) -> Self {
        self.movements = Some(movements);
        self
    }
}

/// Create a reconciliation checkpoint.
///
/// The certified balance is computed by the engine as of `checkpoint_at`;
/// `expected_balance` is the statement figure the user reconciled against.
#[derive(Clone, Debug)]
pub struct CreateCheckpointCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub currency_id: Uuid,
    pub checkpoint_at: DateTime<Utc>,
    pub expected_balance: Option<Decimal>,
    pub manual: bool,
}

impl CreateCheckpointCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        account_id: Uuid,
        currency_id: Uuid,
        checkpoint_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_id,
            currency_id,
            checkpoint_at,
            expected_balance: None,
            manual: true,
        }
    }

    #[must_use]
    pub fn expected_balance(mut self, balance: Decimal) -> Self {
        self.expected_balance = Some(balance);
        self
    }

    #[must_use]
    pub fn manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }
}

/// Create an account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub user_id: String,
    pub name: String,
    pub currency_id: Uuid,
    pub opening_balance: Decimal,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, currency_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            currency_id,
            opening_balance: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, balance: Decimal) -> Self {
        self.opening_balance = balance;
        self
    }
}

/// Create a currency.
#[derive(Clone, Debug)]
pub struct CreateCurrencyCmd {
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub decimal_places: i32,
}

impl CreateCurrencyCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            code: code.into(),
            name: name.into(),
            decimal_places: 2,
        }
    }

    #[must_use]
    pub fn decimal_places(mut self, places: i32) -> Self {
        self.decimal_places = places;
        self
    }
}
