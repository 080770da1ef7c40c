// src/db/properties.rs
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::db::connection::Database;
use crate::domain::filters::{FilterSpec, IncomeType, RentCategory, TenancyType, VacancyStatus};
use crate::domain::property::{NewProperty, Property};
use crate::domain::search::{rank, SearchResult};
use crate::errors::ServerError;

const PROPERTY_COLUMNS: &str = "id, title, address_line, city, province, price, units, year_built,
     gross_monthly_rent, monthly_expenses, income_type, tenancy_type, rent_category,
     vacancy_status, listed_at";

fn map_property(r: &Row<'_>) -> rusqlite::Result<Property> {
    let income: String = r.get(10)?;
    let tenancy: String = r.get(11)?;
    let rent: String = r.get(12)?;
    let vacancy: String = r.get(13)?;
    Ok(Property {
        id: r.get(0)?,
        title: r.get(1)?,
        address_line: r.get(2)?,
        city: r.get(3)?,
        province: r.get(4)?,
        price: r.get(5)?,
        units: r.get(6)?,
        year_built: r.get(7)?,
        gross_monthly_rent: r.get(8)?,
        monthly_expenses: r.get(9)?,
        income_type: IncomeType::parse(&income).unwrap_or_default(),
        tenancy_type: TenancyType::parse(&tenancy).unwrap_or_default(),
        rent_category: RentCategory::parse(&rent).unwrap_or_default(),
        vacancy_status: VacancyStatus::parse(&vacancy).unwrap_or_default(),
        listed_at: r.get(14)?,
    })
}

pub fn insert_property(conn: &Connection, p: &NewProperty, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        INSERT INTO properties (
            title, address_line, city, province, price, units, year_built,
            gross_monthly_rent, monthly_expenses, income_type, tenancy_type,
            rent_category, vacancy_status, listed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            &p.title,
            &p.address_line,
            &p.city,
            &p.province,
            p.price,
            p.units,
            p.year_built,
            p.gross_monthly_rent,
            p.monthly_expenses,
            p.income_type.as_str(),
            p.tenancy_type.as_str(),
            p.rent_category.as_str(),
            p.vacancy_status.as_str(),
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert property failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

/// Make `%`, `_` and the escape character match themselves in a `like` pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Builds the WHERE clause for the characteristic and enumerated filters.
/// Financial filters depend on computed metrics and are applied afterwards.
fn candidate_query(spec: &FilterSpec) -> (String, Vec<Value>) {
    let mut clauses: Vec<&'static str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(v) = spec.price_min {
        clauses.push("price >= ?");
        args.push(Value::Real(v));
    }
    if let Some(v) = spec.price_max {
        clauses.push("price <= ?");
        args.push(Value::Real(v));
    }
    if let Some(v) = spec.units_min {
        clauses.push("units >= ?");
        args.push(Value::Integer(i64::from(v)));
    }
    if let Some(v) = spec.units_max {
        clauses.push("units <= ?");
        args.push(Value::Integer(i64::from(v)));
    }
    if let Some(city) = spec.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        clauses.push("lower(city) like ? escape '\\'");
        args.push(Value::Text(format!("%{}%", escape_like(&city.to_lowercase()))));
    }
    if let Some(prov) = spec.province.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        clauses.push("lower(province) = ?");
        args.push(Value::Text(prov.to_lowercase()));
    }
    if let Some(v) = spec.year_built_min {
        clauses.push("year_built >= ?");
        args.push(Value::Integer(i64::from(v)));
    }
    if let Some(v) = spec.year_built_max {
        clauses.push("year_built <= ?");
        args.push(Value::Integer(i64::from(v)));
    }
    if !spec.income_type.is_default() {
        clauses.push("income_type = ?");
        args.push(Value::Text(spec.income_type.as_str().to_string()));
    }
    if !spec.tenancy_type.is_default() {
        clauses.push("tenancy_type = ?");
        args.push(Value::Text(spec.tenancy_type.as_str().to_string()));
    }
    if !spec.rent_category.is_default() {
        clauses.push("rent_category = ?");
        args.push(Value::Text(spec.rent_category.as_str().to_string()));
    }
    if !spec.vacancy_status.is_default() {
        clauses.push("vacancy_status = ?");
        args.push(Value::Text(spec.vacancy_status.as_str().to_string()));
    }

    let mut sql = format!("SELECT {PROPERTY_COLUMNS} FROM properties");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY listed_at DESC, id");
    (sql, args)
}

pub fn find_candidates(conn: &Connection, spec: &FilterSpec) -> Result<Vec<Property>, ServerError> {
    let (sql, args) = candidate_query(spec);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(format!("prepare property search failed: {e}")))?;
    let rows = stmt
        .query_map(params_from_iter(args), map_property)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Main entry point for the property search: narrow in SQL, then rank.
pub fn search_properties(db: &Database, spec: &FilterSpec) -> Result<Vec<SearchResult>, ServerError> {
    let candidates = db.with_conn(|conn| find_candidates(conn, spec))?;
    Ok(rank(spec, candidates))
}
