// src/domain/metrics.rs

use serde::Serialize;

use crate::domain::filters::{DownPaymentType, FilterSpec};
use crate::domain::property::Property;

pub const DEFAULT_RATE_PCT: f64 = 5.0;
pub const DEFAULT_AMORTIZATION_YEARS: f64 = 25.0;
pub const DEFAULT_DOWN_PAYMENT_PCT: f64 = 20.0;

/// Financing assumptions taken from the mortgage section of a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MortgageTerms {
    pub rate_pct: f64,
    pub amortization_years: f64,
    pub down_payment: DownPayment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DownPayment {
    Percent(f64),
    Fixed(f64),
}

impl Default for MortgageTerms {
    fn default() -> Self {
        Self {
            rate_pct: DEFAULT_RATE_PCT,
            amortization_years: DEFAULT_AMORTIZATION_YEARS,
            down_payment: DownPayment::Percent(DEFAULT_DOWN_PAYMENT_PCT),
        }
    }
}

impl MortgageTerms {
    /// Absent or nonsensical values fall back to the defaults.
    pub fn from_filters(spec: &FilterSpec) -> Self {
        let defaults = MortgageTerms::default();
        let rate_pct = spec.rate.filter(|r| *r >= 0.0).unwrap_or(defaults.rate_pct);
        let amortization_years = spec
            .amortization
            .filter(|y| *y > 0.0)
            .unwrap_or(defaults.amortization_years);
        let value = spec.down_payment_value.filter(|v| *v >= 0.0);
        let down_payment = match (spec.down_payment_type, value) {
            (DownPaymentType::Fixed, Some(v)) => DownPayment::Fixed(v),
            (DownPaymentType::Percent, Some(v)) => DownPayment::Percent(v.min(100.0)),
            _ => defaults.down_payment,
        };
        Self {
            rate_pct,
            amortization_years,
            down_payment,
        }
    }

    pub fn down_payment_for(&self, price: f64) -> f64 {
        match self.down_payment {
            DownPayment::Percent(pct) => price * pct / 100.0,
            DownPayment::Fixed(amount) => amount.min(price),
        }
    }
}

/// Derived investment figures for one property under one set of terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentMetrics {
    pub down_payment: f64,
    pub loan_amount: f64,
    pub monthly_mortgage: f64,
    pub monthly_cash_flow: f64,
    pub annual_noi: f64,
    pub cap_rate: f64,
    pub roi: f64,
    pub yearly_roi: f64,
    /// Annual debt service over annual NOI. `None` when NOI is not positive.
    pub debt_service_ratio: Option<f64>,
}

/// Level monthly payment for a fully amortizing loan.
pub fn monthly_payment(principal: f64, rate_pct: f64, years: f64) -> f64 {
    if principal <= 0.0 {
        return 0.0;
    }
    let n = (years * 12.0).round().max(1.0);
    let r = rate_pct / 100.0 / 12.0;
    if r == 0.0 {
        return principal / n;
    }
    principal * r / (1.0 - (1.0 + r).powf(-n))
}

/// Principal repaid during the first twelve payments.
fn first_year_principal(principal: f64, rate_pct: f64, payment: f64) -> f64 {
    let r = rate_pct / 100.0 / 12.0;
    let mut balance = principal;
    for _ in 0..12 {
        if balance <= 0.0 {
            break;
        }
        let interest = balance * r;
        balance -= (payment - interest).min(balance);
    }
    principal - balance
}

pub fn compute(property: &Property, terms: &MortgageTerms) -> InvestmentMetrics {
    let down_payment = terms.down_payment_for(property.price);
    let loan_amount = (property.price - down_payment).max(0.0);
    let monthly_mortgage = monthly_payment(loan_amount, terms.rate_pct, terms.amortization_years);

    let monthly_noi = property.gross_monthly_rent - property.monthly_expenses;
    let annual_noi = monthly_noi * 12.0;
    let monthly_cash_flow = monthly_noi - monthly_mortgage;
    let annual_cash_flow = monthly_cash_flow * 12.0;

    let cap_rate = if property.price > 0.0 {
        annual_noi / property.price * 100.0
    } else {
        0.0
    };

    let principal_paydown = first_year_principal(loan_amount, terms.rate_pct, monthly_mortgage);
    let (roi, yearly_roi) = if down_payment > 0.0 {
        (
            annual_cash_flow / down_payment * 100.0,
            (annual_cash_flow + principal_paydown) / down_payment * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    let debt_service_ratio = (annual_noi > 0.0).then(|| monthly_mortgage * 12.0 / annual_noi);

    InvestmentMetrics {
        down_payment,
        loan_amount,
        monthly_mortgage,
        monthly_cash_flow,
        annual_noi,
        cap_rate,
        roi,
        yearly_roi,
        debt_service_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::{
        FilterField, IncomeType, RentCategory, TenancyType, VacancyStatus,
    };

    fn duplex() -> Property {
        Property {
            id: 1,
            title: "Duplex".into(),
            address_line: "1 Main St".into(),
            city: "Halifax".into(),
            province: "NS".into(),
            price: 400_000.0,
            units: 2,
            year_built: Some(1990),
            gross_monthly_rent: 4_000.0,
            monthly_expenses: 1_000.0,
            income_type: IncomeType::Actual,
            tenancy_type: TenancyType::OnLeases,
            rent_category: RentCategory::MarketValue,
            vacancy_status: VacancyStatus::Occupied,
            listed_at: 0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn monthly_payment_matches_amortization_formula() {
        // 320k over 25 years at 5%: about 1870.70/month
        let p = monthly_payment(320_000.0, 5.0, 25.0);
        assert!((p - 1870.70).abs() < 0.5, "payment was {p}");
        assert!(close(monthly_payment(120_000.0, 0.0, 10.0), 1000.0));
        assert_eq!(monthly_payment(0.0, 5.0, 25.0), 0.0);
    }

    #[test]
    fn default_terms_apply_when_filters_are_absent() {
        let terms = MortgageTerms::from_filters(&FilterSpec::default());
        assert_eq!(terms, MortgageTerms::default());
    }

    #[test]
    fn fixed_down_payment_is_capped_at_price() {
        let spec = FilterSpec::default()
            .with(FilterField::DownPaymentType(DownPaymentType::Fixed))
            .with(FilterField::DownPaymentValue(Some(1_000_000.0)));
        let terms = MortgageTerms::from_filters(&spec);
        assert!(close(terms.down_payment_for(400_000.0), 400_000.0));
    }

    #[test]
    fn compute_derives_consistent_metrics() {
        let m = compute(&duplex(), &MortgageTerms::default());

        assert!(close(m.down_payment, 80_000.0));
        assert!(close(m.loan_amount, 320_000.0));
        assert!(close(m.annual_noi, 36_000.0));
        assert!(close(m.cap_rate, 9.0));
        assert!(close(m.monthly_cash_flow, 3_000.0 - m.monthly_mortgage));
        assert!(close(m.roi, m.monthly_cash_flow * 12.0 / 80_000.0 * 100.0));
        assert!(m.yearly_roi > m.roi);
        let dsr = m.debt_service_ratio.unwrap();
        assert!(close(dsr, m.monthly_mortgage * 12.0 / 36_000.0));
    }

    #[test]
    fn all_cash_purchase_has_no_debt_service() {
        let spec = FilterSpec::default()
            .with(FilterField::DownPaymentType(DownPaymentType::Percent))
            .with(FilterField::DownPaymentValue(Some(100.0)));
        let m = compute(&duplex(), &MortgageTerms::from_filters(&spec));

        assert_eq!(m.monthly_mortgage, 0.0);
        assert!(close(m.roi, m.cap_rate));
        assert_eq!(m.debt_service_ratio, Some(0.0));
    }
}
