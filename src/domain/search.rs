// src/domain/search.rs

use serde::Serialize;
use std::cmp::Ordering;

use crate::domain::filters::{FilterSpec, SortBy, SortOrder};
use crate::domain::metrics::{compute, InvestmentMetrics, MortgageTerms};
use crate::domain::property::Property;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub property: Property,
    pub metrics: InvestmentMetrics,
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// Keep only results that satisfy the financial range filters.
pub fn passes_financials(spec: &FilterSpec, metrics: &InvestmentMetrics) -> bool {
    within(metrics.monthly_cash_flow, spec.cash_flow_min, spec.cash_flow_max)
        && within(metrics.roi, spec.roi_min, spec.roi_max)
        && within(metrics.cap_rate, spec.cap_rate_min, spec.cap_rate_max)
        && match (spec.max_debt_service_ratio, metrics.debt_service_ratio) {
            (None, _) => true,
            (Some(max), Some(ratio)) => ratio <= max,
            // Non-positive NOI cannot service any debt.
            (Some(_), None) => false,
        }
}

fn sort_value(result: &SearchResult, sort_by: SortBy) -> f64 {
    match sort_by {
        SortBy::CashFlow => result.metrics.monthly_cash_flow,
        SortBy::CapRate => result.metrics.cap_rate,
        SortBy::Price => result.property.price,
        SortBy::Roi => result.metrics.roi,
        SortBy::YearlyRoi => result.metrics.yearly_roi,
    }
}

/// Compute metrics for each candidate, apply the financial filters and sort.
///
/// Candidates are expected to be pre-narrowed on property characteristics by
/// the store. Ties keep the candidates' incoming order.
pub fn rank(spec: &FilterSpec, candidates: Vec<Property>) -> Vec<SearchResult> {
    let terms = MortgageTerms::from_filters(spec);

    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .map(|property| {
            let metrics = compute(&property, &terms);
            SearchResult { property, metrics }
        })
        .filter(|r| passes_financials(spec, &r.metrics))
        .collect();

    results.sort_by(|a, b| {
        let ord = sort_value(a, spec.sort_by)
            .partial_cmp(&sort_value(b, spec.sort_by))
            .unwrap_or(Ordering::Equal);
        match spec.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::{
        FilterField, IncomeType, RentCategory, TenancyType, VacancyStatus,
    };

    fn listing(id: i64, price: f64, rent: f64, expenses: f64) -> Property {
        Property {
            id,
            title: format!("Listing {id}"),
            address_line: format!("{id} Main St"),
            city: "Halifax".into(),
            province: "NS".into(),
            price,
            units: 2,
            year_built: None,
            gross_monthly_rent: rent,
            monthly_expenses: expenses,
            income_type: IncomeType::Actual,
            tenancy_type: TenancyType::OnLeases,
            rent_category: RentCategory::MarketValue,
            vacancy_status: VacancyStatus::Occupied,
            listed_at: 0,
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<i64> {
        results.iter().map(|r| r.property.id).collect()
    }

    fn sample() -> Vec<Property> {
        vec![
            listing(1, 300_000.0, 2_500.0, 800.0),
            listing(2, 500_000.0, 5_000.0, 1_200.0),
            listing(3, 200_000.0, 1_200.0, 900.0),
        ]
    }

    #[test]
    fn default_sort_is_cash_flow_descending() {
        let results = rank(&FilterSpec::default(), sample());
        assert_eq!(ids(&results), vec![2, 1, 3]);
    }

    #[test]
    fn price_sort_ascending() {
        let spec = FilterSpec::default().select_sort(SortBy::Price);
        assert_eq!(ids(&rank(&spec, sample())), vec![3, 1, 2]);
    }

    #[test]
    fn cash_flow_floor_excludes_losers() {
        let spec = FilterSpec::default().with(FilterField::CashFlowMin(Some(0.0)));
        let results = rank(&spec, sample());
        assert!(results.iter().all(|r| r.metrics.monthly_cash_flow >= 0.0));
        assert!(!ids(&results).contains(&3));
    }

    #[test]
    fn debt_service_cap_drops_negative_noi() {
        let mut props = sample();
        props.push(listing(4, 250_000.0, 500.0, 900.0));
        let spec = FilterSpec::default().with(FilterField::MaxDebtServiceRatio(Some(10.0)));
        assert!(!ids(&rank(&spec, props)).contains(&4));
    }
}
