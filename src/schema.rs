// Read-only view of the tables populated by the crawler jobs.
diesel::table! {
    stock_annual_k (symbol, year) {
        symbol -> Varchar,
        year -> Varchar,
        year_open -> Nullable<Numeric>,
        year_high -> Nullable<Numeric>,
        year_close -> Nullable<Numeric>,
    }
}

diesel::table! {
    monthly_revenue (stock_id, report_month) {
        stock_id -> Varchar,
        stock_name -> Nullable<Varchar>,
        report_month -> Varchar,
        yoy_pct -> Nullable<Numeric>,
        mom_pct -> Nullable<Numeric>,
        remark -> Nullable<Text>,
    }
}

diesel::table! {
    stock_prices (symbol, date) {
        symbol -> Varchar,
        date -> Date,
    }
}

diesel::table! {
    stock_weekly_k (symbol, date) {
        symbol -> Varchar,
        date -> Date,
        w_close -> Nullable<Numeric>,
    }
}
