// src/domain/property.rs

use serde::{Deserialize, Serialize};

use crate::domain::filters::{IncomeType, RentCategory, TenancyType, VacancyStatus};

/// A listed income property as stored in the `properties` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub address_line: String,
    pub city: String,
    pub province: String,
    pub price: f64,
    pub units: u32,
    pub year_built: Option<u32>,
    pub gross_monthly_rent: f64,
    pub monthly_expenses: f64,
    pub income_type: IncomeType,
    pub tenancy_type: TenancyType,
    pub rent_category: RentCategory,
    pub vacancy_status: VacancyStatus,
    pub listed_at: i64,
}

/// Fields accepted when creating a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    pub address_line: String,
    pub city: String,
    pub province: String,
    pub price: f64,
    pub units: u32,
    pub year_built: Option<u32>,
    pub gross_monthly_rent: f64,
    pub monthly_expenses: f64,
    pub income_type: IncomeType,
    pub tenancy_type: TenancyType,
    pub rent_category: RentCategory,
    pub vacancy_status: VacancyStatus,
}

impl NewProperty {
    /// Reject listings the search could not rank. `All` is a filter
    /// sentinel, never a property's own value.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("title", &self.title),
            ("addressLine", &self.address_line),
            ("city", &self.city),
            ("province", &self.province),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} is required"));
            }
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err("price must be positive".into());
        }
        if self.units == 0 {
            return Err("units must be at least 1".into());
        }
        for (name, value) in [
            ("grossMonthlyRent", self.gross_monthly_rent),
            ("monthlyExpenses", self.monthly_expenses),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} cannot be negative"));
            }
        }
        if self.income_type.is_default()
            || self.tenancy_type.is_default()
            || self.rent_category.is_default()
            || self.vacancy_status.is_default()
        {
            return Err("income, tenancy, rent and vacancy must be specific values".into());
        }
        Ok(())
    }
}
