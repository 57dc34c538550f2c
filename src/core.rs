pub mod cache;
pub mod clock;
pub mod comparison;
pub mod engine;
pub mod granularity;
pub mod interval;
pub mod metrics;
pub mod proration;
pub mod provider;
pub mod series;
pub mod tariff;
