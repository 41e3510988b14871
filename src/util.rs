pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

/// Population variance
pub fn variance(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let squared = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>();

    Some(squared / data.len() as f64)
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}
