// src/domain/filters.rs

//! Property filter/sort specification.
//!
//! A [`FilterSpec`] is a flat record of optional predicates plus a sort
//! directive. Every change produces a new record via [`FilterSpec::with`] or
//! [`FilterSpec::without`]; nothing is mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

/// Declares an enumerated filter value with its wire label and default.
macro_rules! wire_enum {
    ($name:ident, default = $default:ident, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw.trim() {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn is_default(&self) -> bool {
                *self == $name::$default
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(DownPaymentType, default = All, {
    Percent => "Percent",
    Fixed => "Fixed",
    All => "All",
});

wire_enum!(IncomeType, default = All, {
    Actual => "Actual",
    Estimated => "Estimated",
    Mixed => "Mixed",
    All => "All",
});

wire_enum!(TenancyType, default = All, {
    OnLeases => "On Leases",
    MonthToMonth => "Month to Month",
    Mixed => "Mixed",
    All => "All",
});

wire_enum!(RentCategory, default = All, {
    MarketValue => "Market Value",
    UnderMarketValue => "Under Market Value",
    All => "All",
});

wire_enum!(VacancyStatus, default = All, {
    Occupied => "Occupied",
    Vacant => "Vacant",
    All => "All",
});

wire_enum!(SortBy, default = CashFlow, {
    CashFlow => "cashFlow",
    CapRate => "capRate",
    Price => "price",
    Roi => "roi",
    YearlyRoi => "yearlyRoi",
});

wire_enum!(SortOrder, default = Desc, {
    Asc => "asc",
    Desc => "desc",
});

impl SortBy {
    /// Order applied when this key is newly selected: cheapest first for
    /// price, best first for every performance metric.
    pub fn default_order(self) -> SortOrder {
        match self {
            SortBy::Price => SortOrder::Asc,
            SortBy::CashFlow | SortBy::CapRate | SortBy::Roi | SortBy::YearlyRoi => SortOrder::Desc,
        }
    }
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    // Mortgage parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amortization: Option<f64>,
    #[serde(skip_serializing_if = "DownPaymentType::is_default")]
    pub down_payment_type: DownPaymentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment_value: Option<f64>,

    // Financial ranges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_flow_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_flow_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_rate_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_rate_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_debt_service_ratio: Option<f64>,

    // Property characteristics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,

    // Income / occupancy
    #[serde(skip_serializing_if = "IncomeType::is_default")]
    pub income_type: IncomeType,
    #[serde(skip_serializing_if = "TenancyType::is_default")]
    pub tenancy_type: TenancyType,
    #[serde(skip_serializing_if = "RentCategory::is_default")]
    pub rent_category: RentCategory,
    #[serde(skip_serializing_if = "VacancyStatus::is_default")]
    pub vacancy_status: VacancyStatus,

    // Sort
    #[serde(skip_serializing_if = "SortBy::is_default")]
    pub sort_by: SortBy,
    #[serde(skip_serializing_if = "SortOrder::is_default")]
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Rate,
    Amortization,
    DownPaymentType,
    DownPaymentValue,
    CashFlowMin,
    CashFlowMax,
    RoiMin,
    RoiMax,
    CapRateMin,
    CapRateMax,
    MaxDebtServiceRatio,
    PriceMin,
    PriceMax,
    UnitsMin,
    UnitsMax,
    City,
    Province,
    YearBuiltMin,
    YearBuiltMax,
    Radius,
    IncomeType,
    TenancyType,
    RentCategory,
    VacancyStatus,
    SortBy,
    SortOrder,
}

impl FilterKey {
    pub const ALL: [FilterKey; 26] = [
        FilterKey::Rate,
        FilterKey::Amortization,
        FilterKey::DownPaymentType,
        FilterKey::DownPaymentValue,
        FilterKey::CashFlowMin,
        FilterKey::CashFlowMax,
        FilterKey::RoiMin,
        FilterKey::RoiMax,
        FilterKey::CapRateMin,
        FilterKey::CapRateMax,
        FilterKey::MaxDebtServiceRatio,
        FilterKey::PriceMin,
        FilterKey::PriceMax,
        FilterKey::UnitsMin,
        FilterKey::UnitsMax,
        FilterKey::City,
        FilterKey::Province,
        FilterKey::YearBuiltMin,
        FilterKey::YearBuiltMax,
        FilterKey::Radius,
        FilterKey::IncomeType,
        FilterKey::TenancyType,
        FilterKey::RentCategory,
        FilterKey::VacancyStatus,
        FilterKey::SortBy,
        FilterKey::SortOrder,
    ];

    /// Flat wire/query name.
    pub fn param(self) -> &'static str {
        match self {
            FilterKey::Rate => "rate",
            FilterKey::Amortization => "amortization",
            FilterKey::DownPaymentType => "downPaymentType",
            FilterKey::DownPaymentValue => "downPaymentValue",
            FilterKey::CashFlowMin => "cashFlowMin",
            FilterKey::CashFlowMax => "cashFlowMax",
            FilterKey::RoiMin => "roiMin",
            FilterKey::RoiMax => "roiMax",
            FilterKey::CapRateMin => "capRateMin",
            FilterKey::CapRateMax => "capRateMax",
            FilterKey::MaxDebtServiceRatio => "maxDebtServiceRatio",
            FilterKey::PriceMin => "priceMin",
            FilterKey::PriceMax => "priceMax",
            FilterKey::UnitsMin => "unitsMin",
            FilterKey::UnitsMax => "unitsMax",
            FilterKey::City => "city",
            FilterKey::Province => "province",
            FilterKey::YearBuiltMin => "yearBuiltMin",
            FilterKey::YearBuiltMax => "yearBuiltMax",
            FilterKey::Radius => "radius",
            FilterKey::IncomeType => "incomeType",
            FilterKey::TenancyType => "tenancyType",
            FilterKey::RentCategory => "rentCategory",
            FilterKey::VacancyStatus => "vacancyStatus",
            FilterKey::SortBy => "sortBy",
            FilterKey::SortOrder => "sortOrder",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        FilterKey::ALL.into_iter().find(|k| k.param() == param)
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterKey::Rate => "Interest rate (%)",
            FilterKey::Amortization => "Amortization (years)",
            FilterKey::DownPaymentType => "Down payment type",
            FilterKey::DownPaymentValue => "Down payment",
            FilterKey::CashFlowMin => "Min cash flow",
            FilterKey::CashFlowMax => "Max cash flow",
            FilterKey::RoiMin => "Min ROI (%)",
            FilterKey::RoiMax => "Max ROI (%)",
            FilterKey::CapRateMin => "Min cap rate (%)",
            FilterKey::CapRateMax => "Max cap rate (%)",
            FilterKey::MaxDebtServiceRatio => "Max debt service ratio",
            FilterKey::PriceMin => "Min price",
            FilterKey::PriceMax => "Max price",
            FilterKey::UnitsMin => "Min units",
            FilterKey::UnitsMax => "Max units",
            FilterKey::City => "City",
            FilterKey::Province => "Province",
            FilterKey::YearBuiltMin => "Built after",
            FilterKey::YearBuiltMax => "Built before",
            FilterKey::Radius => "Radius (km)",
            FilterKey::IncomeType => "Income",
            FilterKey::TenancyType => "Tenancy",
            FilterKey::RentCategory => "Rent",
            FilterKey::VacancyStatus => "Vacancy",
            FilterKey::SortBy => "Sort by",
            FilterKey::SortOrder => "Order",
        }
    }

    /// Fields whose values come from a fixed set of choices.
    pub fn is_enumerated(self) -> bool {
        matches!(
            self,
            FilterKey::DownPaymentType
                | FilterKey::IncomeType
                | FilterKey::TenancyType
                | FilterKey::RentCategory
                | FilterKey::VacancyStatus
                | FilterKey::SortBy
                | FilterKey::SortOrder
        )
    }

    /// Wire labels an enumerated field accepts; empty for free-form fields.
    pub fn choices(self) -> Vec<&'static str> {
        fn labels<T: Copy>(variants: &[T], as_str: fn(T) -> &'static str) -> Vec<&'static str> {
            variants.iter().map(|v| as_str(*v)).collect()
        }
        match self {
            FilterKey::DownPaymentType => labels(DownPaymentType::VARIANTS, DownPaymentType::as_str),
            FilterKey::IncomeType => labels(IncomeType::VARIANTS, IncomeType::as_str),
            FilterKey::TenancyType => labels(TenancyType::VARIANTS, TenancyType::as_str),
            FilterKey::RentCategory => labels(RentCategory::VARIANTS, RentCategory::as_str),
            FilterKey::VacancyStatus => labels(VacancyStatus::VARIANTS, VacancyStatus::as_str),
            FilterKey::SortBy => labels(SortBy::VARIANTS, SortBy::as_str),
            FilterKey::SortOrder => labels(SortOrder::VARIANTS, SortOrder::as_str),
            _ => Vec::new(),
        }
    }
}

/// A single field paired with its value; the unit of replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterField {
    Rate(Option<f64>),
    Amortization(Option<f64>),
    DownPaymentType(DownPaymentType),
    DownPaymentValue(Option<f64>),
    CashFlowMin(Option<f64>),
    CashFlowMax(Option<f64>),
    RoiMin(Option<f64>),
    RoiMax(Option<f64>),
    CapRateMin(Option<f64>),
    CapRateMax(Option<f64>),
    MaxDebtServiceRatio(Option<f64>),
    PriceMin(Option<f64>),
    PriceMax(Option<f64>),
    UnitsMin(Option<u32>),
    UnitsMax(Option<u32>),
    City(Option<String>),
    Province(Option<String>),
    YearBuiltMin(Option<u32>),
    YearBuiltMax(Option<u32>),
    Radius(Option<f64>),
    IncomeType(IncomeType),
    TenancyType(TenancyType),
    RentCategory(RentCategory),
    VacancyStatus(VacancyStatus),
    SortBy(SortBy),
    SortOrder(SortOrder),
}

impl FilterField {
    pub fn key(&self) -> FilterKey {
        match self {
            FilterField::Rate(_) => FilterKey::Rate,
            FilterField::Amortization(_) => FilterKey::Amortization,
            FilterField::DownPaymentType(_) => FilterKey::DownPaymentType,
            FilterField::DownPaymentValue(_) => FilterKey::DownPaymentValue,
            FilterField::CashFlowMin(_) => FilterKey::CashFlowMin,
            FilterField::CashFlowMax(_) => FilterKey::CashFlowMax,
            FilterField::RoiMin(_) => FilterKey::RoiMin,
            FilterField::RoiMax(_) => FilterKey::RoiMax,
            FilterField::CapRateMin(_) => FilterKey::CapRateMin,
            FilterField::CapRateMax(_) => FilterKey::CapRateMax,
            FilterField::MaxDebtServiceRatio(_) => FilterKey::MaxDebtServiceRatio,
            FilterField::PriceMin(_) => FilterKey::PriceMin,
            FilterField::PriceMax(_) => FilterKey::PriceMax,
            FilterField::UnitsMin(_) => FilterKey::UnitsMin,
            FilterField::UnitsMax(_) => FilterKey::UnitsMax,
            FilterField::City(_) => FilterKey::City,
            FilterField::Province(_) => FilterKey::Province,
            FilterField::YearBuiltMin(_) => FilterKey::YearBuiltMin,
            FilterField::YearBuiltMax(_) => FilterKey::YearBuiltMax,
            FilterField::Radius(_) => FilterKey::Radius,
            FilterField::IncomeType(_) => FilterKey::IncomeType,
            FilterField::TenancyType(_) => FilterKey::TenancyType,
            FilterField::RentCategory(_) => FilterKey::RentCategory,
            FilterField::VacancyStatus(_) => FilterKey::VacancyStatus,
            FilterField::SortBy(_) => FilterKey::SortBy,
            FilterField::SortOrder(_) => FilterKey::SortOrder,
        }
    }

    /// The type-appropriate "no constraint" value for `key`.
    pub fn cleared(key: FilterKey) -> Self {
        FilterField::parse(key, "")
    }

    /// Build a field from raw user text. Malformed numbers and unknown
    /// choices become the cleared value rather than an error.
    pub fn parse(key: FilterKey, raw: &str) -> Self {
        match key {
            FilterKey::Rate => FilterField::Rate(parse_numeric(raw)),
            FilterKey::Amortization => FilterField::Amortization(parse_numeric(raw)),
            FilterKey::DownPaymentType => {
                FilterField::DownPaymentType(DownPaymentType::parse(raw).unwrap_or_default())
            }
            FilterKey::DownPaymentValue => FilterField::DownPaymentValue(parse_numeric(raw)),
            FilterKey::CashFlowMin => FilterField::CashFlowMin(parse_numeric(raw)),
            FilterKey::CashFlowMax => FilterField::CashFlowMax(parse_numeric(raw)),
            FilterKey::RoiMin => FilterField::RoiMin(parse_numeric(raw)),
            FilterKey::RoiMax => FilterField::RoiMax(parse_numeric(raw)),
            FilterKey::CapRateMin => FilterField::CapRateMin(parse_numeric(raw)),
            FilterKey::CapRateMax => FilterField::CapRateMax(parse_numeric(raw)),
            FilterKey::MaxDebtServiceRatio => FilterField::MaxDebtServiceRatio(parse_numeric(raw)),
            FilterKey::PriceMin => FilterField::PriceMin(parse_numeric(raw)),
            FilterKey::PriceMax => FilterField::PriceMax(parse_numeric(raw)),
            FilterKey::UnitsMin => FilterField::UnitsMin(parse_whole(raw)),
            FilterKey::UnitsMax => FilterField::UnitsMax(parse_whole(raw)),
            FilterKey::City => FilterField::City(parse_text(raw)),
            FilterKey::Province => FilterField::Province(parse_text(raw)),
            FilterKey::YearBuiltMin => FilterField::YearBuiltMin(parse_whole(raw)),
            FilterKey::YearBuiltMax => FilterField::YearBuiltMax(parse_whole(raw)),
            FilterKey::Radius => FilterField::Radius(parse_numeric(raw)),
            FilterKey::IncomeType => FilterField::IncomeType(IncomeType::parse(raw).unwrap_or_default()),
            FilterKey::TenancyType => {
                FilterField::TenancyType(TenancyType::parse(raw).unwrap_or_default())
            }
            FilterKey::RentCategory => {
                FilterField::RentCategory(RentCategory::parse(raw).unwrap_or_default())
            }
            FilterKey::VacancyStatus => {
                FilterField::VacancyStatus(VacancyStatus::parse(raw).unwrap_or_default())
            }
            FilterKey::SortBy => FilterField::SortBy(SortBy::parse(raw).unwrap_or_default()),
            FilterKey::SortOrder => FilterField::SortOrder(SortOrder::parse(raw).unwrap_or_default()),
        }
    }

    /// Wire representation, or `None` when the field carries no constraint.
    pub fn wire_value(&self) -> Option<String> {
        fn num(v: &Option<f64>) -> Option<String> {
            v.map(|n| n.to_string())
        }
        fn whole(v: &Option<u32>) -> Option<String> {
            v.map(|n| n.to_string())
        }
        fn text(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        fn choice<T: fmt::Display>(v: T, is_default: bool) -> Option<String> {
            (!is_default).then(|| v.to_string())
        }

        match self {
            FilterField::Rate(v)
            | FilterField::Amortization(v)
            | FilterField::DownPaymentValue(v)
            | FilterField::CashFlowMin(v)
            | FilterField::CashFlowMax(v)
            | FilterField::RoiMin(v)
            | FilterField::RoiMax(v)
            | FilterField::CapRateMin(v)
            | FilterField::CapRateMax(v)
            | FilterField::MaxDebtServiceRatio(v)
            | FilterField::PriceMin(v)
            | FilterField::PriceMax(v)
            | FilterField::Radius(v) => num(v),
            FilterField::UnitsMin(v)
            | FilterField::UnitsMax(v)
            | FilterField::YearBuiltMin(v)
            | FilterField::YearBuiltMax(v) => whole(v),
            FilterField::City(v) | FilterField::Province(v) => text(v),
            FilterField::DownPaymentType(v) => choice(v, v.is_default()),
            FilterField::IncomeType(v) => choice(v, v.is_default()),
            FilterField::TenancyType(v) => choice(v, v.is_default()),
            FilterField::RentCategory(v) => choice(v, v.is_default()),
            FilterField::VacancyStatus(v) => choice(v, v.is_default()),
            FilterField::SortBy(v) => choice(v, v.is_default()),
            FilterField::SortOrder(v) => choice(v, v.is_default()),
        }
    }

    /// Label of an enumerated value, defaults included.
    pub fn choice_label(&self) -> Option<&'static str> {
        match self {
            FilterField::DownPaymentType(v) => Some(v.as_str()),
            FilterField::IncomeType(v) => Some(v.as_str()),
            FilterField::TenancyType(v) => Some(v.as_str()),
            FilterField::RentCategory(v) => Some(v.as_str()),
            FilterField::VacancyStatus(v) => Some(v.as_str()),
            FilterField::SortBy(v) => Some(v.as_str()),
            FilterField::SortOrder(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Present, non-empty, and not the `All` sentinel (or, for the sort
    /// directive, different from `cashFlow`/`desc`).
    pub fn is_active(&self) -> bool {
        self.wire_value().is_some()
    }
}

impl FilterSpec {
    pub fn get(&self, key: FilterKey) -> FilterField {
        match key {
            FilterKey::Rate => FilterField::Rate(self.rate),
            FilterKey::Amortization => FilterField::Amortization(self.amortization),
            FilterKey::DownPaymentType => FilterField::DownPaymentType(self.down_payment_type),
            FilterKey::DownPaymentValue => FilterField::DownPaymentValue(self.down_payment_value),
            FilterKey::CashFlowMin => FilterField::CashFlowMin(self.cash_flow_min),
            FilterKey::CashFlowMax => FilterField::CashFlowMax(self.cash_flow_max),
            FilterKey::RoiMin => FilterField::RoiMin(self.roi_min),
            FilterKey::RoiMax => FilterField::RoiMax(self.roi_max),
            FilterKey::CapRateMin => FilterField::CapRateMin(self.cap_rate_min),
            FilterKey::CapRateMax => FilterField::CapRateMax(self.cap_rate_max),
            FilterKey::MaxDebtServiceRatio => {
                FilterField::MaxDebtServiceRatio(self.max_debt_service_ratio)
            }
            FilterKey::PriceMin => FilterField::PriceMin(self.price_min),
            FilterKey::PriceMax => FilterField::PriceMax(self.price_max),
            FilterKey::UnitsMin => FilterField::UnitsMin(self.units_min),
            FilterKey::UnitsMax => FilterField::UnitsMax(self.units_max),
            FilterKey::City => FilterField::City(self.city.clone()),
            FilterKey::Province => FilterField::Province(self.province.clone()),
            FilterKey::YearBuiltMin => FilterField::YearBuiltMin(self.year_built_min),
            FilterKey::YearBuiltMax => FilterField::YearBuiltMax(self.year_built_max),
            FilterKey::Radius => FilterField::Radius(self.radius),
            FilterKey::IncomeType => FilterField::IncomeType(self.income_type),
            FilterKey::TenancyType => FilterField::TenancyType(self.tenancy_type),
            FilterKey::RentCategory => FilterField::RentCategory(self.rent_category),
            FilterKey::VacancyStatus => FilterField::VacancyStatus(self.vacancy_status),
            FilterKey::SortBy => FilterField::SortBy(self.sort_by),
            FilterKey::SortOrder => FilterField::SortOrder(self.sort_order),
        }
    }

    /// Returns a new specification with exactly one field replaced.
    pub fn with(&self, field: FilterField) -> FilterSpec {
        let mut next = self.clone();
        match field {
            FilterField::Rate(v) => next.rate = v,
            FilterField::Amortization(v) => next.amortization = v,
            FilterField::DownPaymentType(v) => next.down_payment_type = v,
            FilterField::DownPaymentValue(v) => next.down_payment_value = v,
            FilterField::CashFlowMin(v) => next.cash_flow_min = v,
            FilterField::CashFlowMax(v) => next.cash_flow_max = v,
            FilterField::RoiMin(v) => next.roi_min = v,
            FilterField::RoiMax(v) => next.roi_max = v,
            FilterField::CapRateMin(v) => next.cap_rate_min = v,
            FilterField::CapRateMax(v) => next.cap_rate_max = v,
            FilterField::MaxDebtServiceRatio(v) => next.max_debt_service_ratio = v,
            FilterField::PriceMin(v) => next.price_min = v,
            FilterField::PriceMax(v) => next.price_max = v,
            FilterField::UnitsMin(v) => next.units_min = v,
            FilterField::UnitsMax(v) => next.units_max = v,
            FilterField::City(v) => next.city = v,
            FilterField::Province(v) => next.province = v,
            FilterField::YearBuiltMin(v) => next.year_built_min = v,
            FilterField::YearBuiltMax(v) => next.year_built_max = v,
            FilterField::Radius(v) => next.radius = v,
            FilterField::IncomeType(v) => next.income_type = v,
            FilterField::TenancyType(v) => next.tenancy_type = v,
            FilterField::RentCategory(v) => next.rent_category = v,
            FilterField::VacancyStatus(v) => next.vacancy_status = v,
            FilterField::SortBy(v) => next.sort_by = v,
            FilterField::SortOrder(v) => next.sort_order = v,
        }
        next
    }

    /// Remove a single filter: enumerated fields go back to `All`, the sort
    /// directive to `cashFlow`/`desc`, everything else to absent.
    pub fn without(&self, key: FilterKey) -> FilterSpec {
        self.with(FilterField::cleared(key))
    }

    /// Picking the current sort key flips the order; picking a new key
    /// applies that key's default order.
    pub fn select_sort(&self, sort_by: SortBy) -> FilterSpec {
        let mut next = self.clone();
        if self.sort_by == sort_by {
            next.sort_order = self.sort_order.flipped();
        } else {
            next.sort_by = sort_by;
            next.sort_order = sort_by.default_order();
        }
        next
    }

    /// Number of active fields, used for the filter badge. `city` never
    /// counts; it is shown in the search bar instead.
    pub fn active_filter_count(&self) -> usize {
        FilterKey::ALL
            .iter()
            .filter(|key| **key != FilterKey::City && self.get(**key).is_active())
            .count()
    }

    /// Active fields in display order, `city` excluded.
    pub fn active_filters(&self) -> Vec<FilterField> {
        FilterKey::ALL
            .iter()
            .filter(|key| **key != FilterKey::City)
            .map(|key| self.get(*key))
            .filter(FilterField::is_active)
            .collect()
    }

    /// Flat `(name, value)` pairs with absent fields omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        FilterKey::ALL
            .iter()
            .filter_map(|key| self.get(*key).wire_value().map(|v| (key.param(), v)))
            .collect()
    }

    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.to_query_pairs() {
            ser.append_pair(name, &value);
        }
        ser.finish()
    }

    /// `path` with this specification's query appended, if it has one.
    pub fn to_href(&self, path: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }

    /// Build from flat pairs, ignoring unknown names.
    pub fn from_pairs<I, K, V>(pairs: I) -> FilterSpec
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .fold(FilterSpec::default(), |spec, (name, value)| {
                match FilterKey::from_param(name.as_ref()) {
                    Some(key) => spec.with(FilterField::parse(key, value.as_ref())),
                    None => spec,
                }
            })
    }

    pub fn from_query(query: &str) -> FilterSpec {
        FilterSpec::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }
}

/// Parse user-entered numeric text. Anything unparseable is absence, never
/// zero. Thousands separators, `$` and `%` are tolerated.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_whole(raw: &str) -> Option<u32> {
    parse_numeric(raw)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

fn parse_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
