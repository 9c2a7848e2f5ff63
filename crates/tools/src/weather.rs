//! Synthetic weather readings.

use rand::Rng;

use ragdesk_core::WeatherReport;

pub const CONDITIONS: [&str; 4] = ["Sunny", "Cloudy", "Rainy", "Snowy"];

/// Uniform integer source, injectable for tests
pub trait RandomSource: Send + Sync {
    /// Value in `0..upper`
    fn next_below(&self, upper: u32) -> u32;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_below(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Temperature in [-10, 29], humidity in [0, 99], one of `CONDITIONS`.
pub fn synthesize_weather(location: &str, rng: &dyn RandomSource) -> WeatherReport {
    let temperature = (rng.next_below(40) % 40) as i32 - 10;
    let condition = CONDITIONS[(rng.next_below(CONDITIONS.len() as u32) as usize) % CONDITIONS.len()];
    let humidity = rng.next_below(100) % 100;

    WeatherReport {
        location: location.to_string(),
        temperature,
        condition: condition.to_string(),
        humidity,
    }
}
