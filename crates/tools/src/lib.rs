//! External data adapters for the travel agent
//!
//! Two adapters back every grounded numeric claim the assistant makes:
//! - `WeatherTool` - Open-Meteo geocoding + daily forecast
//! - `CurrencyTool` - Frankfurter exchange rates
//!
//! Both implement the core `Tool` trait and run through `ToolRegistry`,
//! which enforces a per-tool deadline.

pub mod currency;
pub mod registry;
pub mod weather;

pub use currency::{CurrencyConversion, CurrencyTool};
pub use registry::{ToolExecutor, ToolRegistry};
pub use weather::{WeatherForecast, WeatherTool};
