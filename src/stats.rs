/// Mean and sample standard deviation over a sample window
use crate::errors::EngineError;
use crate::series::WindowedSeries;

/// Arithmetic mean of the window, `None` when it is empty
pub fn mean(series: &WindowedSeries) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    Some(series.values().sum::<f64>() / series.len() as f64)
}

/// Sample standard deviation of the window (divides by `n - 1`)
///
/// Bessel's correction leaves the statistic undefined below two samples,
/// which is reported as `InsufficientSamples` instead of a NaN.
pub fn stddev(series: &WindowedSeries) -> Result<f64, EngineError> {
    let n = series.len();
    if n < 2 {
        return Err(EngineError::InsufficientSamples {
            required: 2,
            available: n,
        });
    }

    // n >= 2 so the mean exists
    let m = series.values().sum::<f64>() / n as f64;
    let squares: f64 = series.values().map(|x| (x - m).powi(2)).sum();
    Ok((squares / (n - 1) as f64).sqrt())
}
