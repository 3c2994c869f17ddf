pub mod annual_price;
pub mod monthly_revenue;
pub mod research;

pub use annual_price::AnnualPrice;
pub use monthly_revenue::MonthlyRevenue;
