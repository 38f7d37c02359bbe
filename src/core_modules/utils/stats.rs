// Small order-free statistics shared by the analyzers. Every helper returns `None`
// for an empty input instead of a NaN, so callers have to decide what an empty
// population means for them.

pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Unbiased (n - 1) sample variance. A single value has variance 0.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values.iter().copied())?;
    if values.len() == 1 {
        return Some(0.0);
    }
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(squares / (values.len() - 1) as f64)
}

/// Sample standard deviation divided by the mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let mean = mean(values.iter().copied())?;
    let std_dev = sample_variance(values)?.sqrt();
    let cv = std_dev / mean;
    cv.is_finite().then_some(cv)
}
