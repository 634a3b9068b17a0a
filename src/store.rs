//! Search and savings context shared by the calculator pages.
//!
//! State changes go through [`SearchContext::dispatch`] with a typed action;
//! components receive the context by reference.

use serde::{Deserialize, Serialize};

use crate::search::ProductItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub term: String,
    pub product: Option<ProductItem>,
    pub saving_amount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    AddSearchTerm(String),
    AddProduct(ProductItem),
    AddSavingAmount(u64),
    Reset,
}

#[derive(Debug, Default)]
pub struct SearchContext {
    state: SearchState,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn dispatch(&mut self, action: SearchAction) {
        log::trace!("dispatch {:?}", action);
        match action {
            SearchAction::AddSearchTerm(term) => self.state.term = term,
            SearchAction::AddProduct(product) => {
                // a new product invalidates the amount chosen for the old one
                self.state.product = Some(product);
                self.state.saving_amount = None;
            }
            SearchAction::AddSavingAmount(amount) => self.state.saving_amount = Some(amount),
            SearchAction::Reset => self.state = SearchState::default(),
        }
    }

    /// The plan for the selected product and amount, if both are set
    pub fn plan(&self) -> Option<SavingsPlan> {
        let product = self.state.product.as_ref()?;
        SavingsPlan::new(product.price, self.state.saving_amount?)
    }
}

/// Months needed to save `price` at `monthly` per month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsPlan {
    pub price: u64,
    pub monthly: u64,
    pub months: u64,
}

impl SavingsPlan {
    /// `None` when `monthly` is zero
    pub fn new(price: u64, monthly: u64) -> Option<Self> {
        if monthly == 0 {
            return None;
        }
        Some(Self { price, monthly, months: price.div_ceil(monthly) })
    }
}

/// Parse an amount typed with optional thousands separators ("12,000").
/// Only digits and commas are accepted.
pub fn parse_amount(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }
    trimmed.replace(',', "").parse().ok()
}
