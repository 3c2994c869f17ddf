use chrono::NaiveDate;
use diesel::dsl::max;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

use crate::models::{AnnualPrice, MonthlyRevenue};
use crate::schema::{monthly_revenue, stock_annual_k, stock_prices};

pub type PgPoolConn = PooledConnection<ConnectionManager<PgConnection>>;

/// 行情资料的最新日期
pub fn latest_price_date(conn: &mut PgPoolConn) -> Result<Option<NaiveDate>, diesel::result::Error> {
    stock_prices::table
        .select(max(stock_prices::date))
        .first::<Option<NaiveDate>>(conn)
}

pub fn revenue_history(
    conn: &mut PgPoolConn,
    stock_id: &str,
) -> Result<Vec<MonthlyRevenue>, diesel::result::Error> {
    monthly_revenue::table
        .filter(monthly_revenue::stock_id.eq(stock_id))
        .order(monthly_revenue::report_month.asc())
        .load::<MonthlyRevenue>(conn)
}

/// 年K 的 symbol 可能带交易所后缀（`2330.TW`），也可能没有
pub fn annual_history(
    conn: &mut PgPoolConn,
    stock_id: &str,
) -> Result<Vec<AnnualPrice>, diesel::result::Error> {
    stock_annual_k::table
        .filter(
            stock_annual_k::symbol
                .like(format!("{stock_id}.%"))
                .or(stock_annual_k::symbol.eq(stock_id)),
        )
        .order(stock_annual_k::year.asc())
        .load::<AnnualPrice>(conn)
}
