pub mod forecast;
pub mod projector;

pub use forecast::{
    ConstantGrowthForecaster, ForecastConfig, ForecastMethod, Forecaster, LinearTrendForecaster,
    MAX_FORECAST_PERIODS,
};
pub use projector::{project, project_band, ScenarioProjection, ScenarioRates};
